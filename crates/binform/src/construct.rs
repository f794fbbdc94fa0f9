// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Construction strategy selection.

use crate::error::{Error, Result};
use std::fmt;

/// How a decoded instance comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionStrategy {
    /// Field values are read in declaration order and passed to a constructor.
    PositionalConstructor,
    /// A registered zero-argument function creates the instance, then
    /// fields are assigned.
    FactoryMethod,
    /// The default value is created, then fields are assigned.
    PropertyAssignment,
}

impl fmt::Display for ConstructionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionStrategy::PositionalConstructor => write!(f, "positional constructor"),
            ConstructionStrategy::FactoryMethod => write!(f, "factory method"),
            ConstructionStrategy::PropertyAssignment => write!(f, "property assignment"),
        }
    }
}

/// Construction paths a structure offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constructors {
    pub positional: bool,
    pub factory: bool,
    pub default: bool,
}

impl Default for Constructors {
    fn default() -> Self {
        Self {
            positional: false,
            factory: false,
            default: true,
        }
    }
}

impl Constructors {
    /// Highest-priority available strategy.
    pub fn select(&self, structure: &str) -> Result<ConstructionStrategy> {
        if self.positional {
            Ok(ConstructionStrategy::PositionalConstructor)
        } else if self.factory {
            Ok(ConstructionStrategy::FactoryMethod)
        } else if self.default {
            Ok(ConstructionStrategy::PropertyAssignment)
        } else {
            Err(Error::NoConstructionStrategy {
                structure: structure.to_string(),
            })
        }
    }
}
