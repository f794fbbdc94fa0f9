// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime records.
//!
//! [`DynamicObject`] makes the builder API usable without a Rust type: it
//! pairs a shared [`StructureLayout`](crate::layout::StructureLayout) with one
//! [`Value`] per declared field.

mod object;
mod value;

pub use object::DynamicObject;
pub use value::Value;
