// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call decoding context.
//!
//! A [`Context`] travels with every field decode and encode of one top-level
//! call. It carries the effective format version and an [`AmbientContext`]:
//! a map from type to an instance the caller already holds (a parent cache,
//! a string table) that nested field codecs may look up. Nothing in it
//! outlives the call.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Type-keyed registry of caller-provided instances.
#[derive(Default)]
pub struct AmbientContext<'a> {
    entries: HashMap<TypeId, &'a dyn Any>,
}

impl<'a> AmbientContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value`, replacing any previous instance of the same type.
    pub fn insert<T: Any>(&mut self, value: &'a T) -> &mut Self {
        self.entries.insert(TypeId::of::<T>(), value);
        self
    }

    pub fn get<T: Any>(&self) -> Option<&'a T> {
        self.entries
            .get(&TypeId::of::<T>())
            .copied()
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AmbientContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientContext")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Version and ambient registry of the current call.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// Effective version; `None` is the implicit (unversioned) context.
    pub version: Option<f64>,
    pub ambient: &'a AmbientContext<'a>,
}

impl<'a> Context<'a> {
    pub fn new(version: Option<f64>, ambient: &'a AmbientContext<'a>) -> Self {
        Self { version, ambient }
    }

    /// Same ambient registry, different version.
    #[must_use]
    pub fn with_version(self, version: Option<f64>) -> Self {
        Self { version, ..self }
    }

    /// Shorthand for `self.ambient.get::<T>()`.
    pub fn ambient<T: Any>(&self) -> Option<&'a T> {
        self.ambient.get::<T>()
    }
}
