// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout descriptors and their resolution against a format version.
//!
//! # Features
//!
//! - **StructureLayout**: named field list, version-scoped total sizes and
//!   byte orders, construction paths
//! - **FieldLayout**: version-scoped offsets, byte orders, store types and
//!   size-cursor flag, plus an applicability range
//! - **ResolvedLayout**: the concrete field set for one version, in
//!   ascending-offset order
//! - **Builder API**: [`LayoutBuilder`] / [`FieldBuilder`], also the target
//!   of `#[derive(BinaryObject)]`
//!
//! # Example
//!
//! ```rust
//! use binform::layout::{FieldBuilder, LayoutBuilder};
//! use binform::{VersionRange, WireType};
//!
//! let layout = LayoutBuilder::new("Header")
//!     .field(FieldBuilder::of::<u32>("magic").offset(0))
//!     .field(FieldBuilder::of::<u16>("flags").offset_for(4, VersionRange::since(2.0)))
//!     .field(FieldBuilder::of::<u8>("kind").offset(6).store_type(WireType::U16))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(layout.resolve(Some(1.0)).unwrap().fields.len(), 2);
//! assert_eq!(layout.resolve(Some(2.0)).unwrap().fields.len(), 3);
//! ```

mod builder;
mod field;
mod resolve;
mod structure;

pub use builder::{FieldBuilder, LayoutBuilder};
pub use field::{CollectionCount, FieldKind, FieldLayout};
pub use resolve::{ResolvedField, ResolvedLayout};
pub use structure::{ResolveStats, StructureLayout};
