// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # binform - declarative binary object mapping
//!
//! Maps Rust types onto binary records whose layout changes between format
//! versions. A structure declares, per field, an absolute offset (or a
//! positional constructor), a byte order, an on-wire store type and a string
//! encoding, each of which may be restricted to a version range. The engine
//! resolves the declarations against the active version, visits the present
//! fields in ascending offset order and leaves the stream at the structure's
//! final position.
//!
//! ## Quick Start
//!
//! ```rust
//! use binform::{BinaryObject, ByteOrder, EndianReader, EndianWriter};
//! use std::io::Cursor;
//!
//! #[derive(BinaryObject, Debug, Default, PartialEq)]
//! #[binform(byte_order = "big")]
//! struct Header {
//!     #[binform(offset = 0)]
//!     magic: u32,
//!     #[binform(offset = 4, version_number)]
//!     version: u16,
//!     #[binform(offset = 6, min_version = 2)]
//!     flags: u16,
//! }
//!
//! let header = Header { magic: 0xCAFE_F00D, version: 2, flags: 1 };
//! let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
//! writer.write_object(&header).unwrap();
//!
//! let bytes = writer.into_inner().into_inner();
//! let mut reader = EndianReader::new(Cursor::new(bytes), ByteOrder::LittleEndian);
//! assert_eq!(reader.read_object::<Header>().unwrap(), header);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  #[derive(BinaryObject)]  |  LayoutBuilder  |  DynamicObject         |
//! +---------------------------------------------------------------------+
//! |  walker: version -> resolve -> visit fields -> final cursor          |
//! |          (flat fast path for fixed, contiguous structures)          |
//! +---------------------------------------------------------------------+
//! |  layout: StructureLayout / FieldLayout / ResolvedLayout (LRU cache)  |
//! +---------------------------------------------------------------------+
//! |  codec: primitives, store types, strings, enums, buffers             |
//! +---------------------------------------------------------------------+
//! |  io: EndianReader / EndianWriter over any Read/Write + Seek stream   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`layout`] - layout descriptors, builder API and version resolution
//! - [`walker`] - decode/encode of whole structures
//! - [`codec`] - value codecs and the [`FieldCodec`] trait
//! - [`io`] - byte-order aware stream wrappers
//! - [`dynamic`] - runtime records without a Rust type
//! - [`registry`] - concurrent map of named layouts

// Allow the derive macro to work inside this crate's tests
extern crate self as binform;

/// Value codecs: primitives, store types, strings, enums and buffers.
pub mod codec;
/// Codec constants and stream configuration.
pub mod config;
/// Construction strategies.
pub mod construct;
/// Per-call version and ambient registry.
pub mod context;
mod cursor;
/// Runtime records.
pub mod dynamic;
/// Error types.
pub mod error;
mod flat;
/// Byte-order aware readers and writers.
pub mod io;
/// Layout descriptors and version resolution.
pub mod layout;
/// Byte order.
pub mod order;
/// Named layout registry.
pub mod registry;
/// Version ranges and version-scoped alternatives.
pub mod version;
/// Whole-structure decode and encode.
pub mod walker;

pub use codec::{Bufferable, FieldCodec, Guid, Scalar, StringEncoding, WireType, F16};
pub use config::CodecConfig;
pub use construct::ConstructionStrategy;
pub use context::{AmbientContext, Context};
pub use dynamic::{DynamicObject, Value};
pub use error::{Error, FieldContext, Result};
pub use io::{EndianReader, EndianWriter, TransactionStream};
pub use layout::{
    CollectionCount, FieldBuilder, FieldKind, LayoutBuilder, ResolvedField, ResolvedLayout,
    StructureLayout,
};
pub use order::ByteOrder;
pub use registry::{LayoutRegistry, RegistryStats};
pub use version::{VersionRange, Versioned};
pub use walker::{from_bytes, to_bytes, BinaryObject, FieldAccess};

// Derive macros (for #[derive(binform::BinaryObject)])
pub use binform_codegen::{BinaryEnum, BinaryObject};

/// binform version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
