// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for StructureLayout.
//!
//! The derive macro expands to exactly these calls, so a hand-built layout
//! and a derived one with the same declarations produce the same bytes.

use super::{CollectionCount, FieldKind, FieldLayout, StructureLayout};
use crate::codec::{FieldCodec, StringEncoding, WireType};
use crate::config::DEFAULT_STRING_PADDING;
use crate::construct::Constructors;
use crate::error::{Error, Result};
use crate::order::ByteOrder;
use crate::version::{VersionRange, Versioned};

/// Builder for creating StructureLayout instances.
#[derive(Debug)]
pub struct LayoutBuilder {
    name: String,
    fields: Vec<FieldBuilder>,
    sizes: Versioned<u64>,
    byte_orders: Versioned<ByteOrder>,
    constructors: Constructors,
    positional: bool,
}

impl LayoutBuilder {
    /// Create a new builder for a named structure.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            sizes: Versioned::new(),
            byte_orders: Versioned::new(),
            constructors: Constructors::default(),
            positional: false,
        }
    }

    /// Declare the total size for every version.
    pub fn size(self, size: u64) -> Self {
        self.size_for(size, VersionRange::any())
    }

    /// Declare the total size for the versions in `range`.
    pub fn size_for(mut self, size: u64, range: VersionRange) -> Self {
        self.sizes.push(size, range);
        self
    }

    /// Default byte order of the structure's fields.
    pub fn byte_order(self, order: ByteOrder) -> Self {
        self.byte_order_for(order, VersionRange::any())
    }

    pub fn byte_order_for(mut self, order: ByteOrder, range: VersionRange) -> Self {
        self.byte_orders.push(order, range);
        self
    }

    /// Fields are read in declaration order without offsets and handed to a
    /// positional constructor.
    pub fn positional(mut self) -> Self {
        self.positional = true;
        self.constructors.positional = true;
        self
    }

    /// Instances come from a registered factory function.
    pub fn factory(mut self) -> Self {
        self.constructors.factory = true;
        self
    }

    /// The type has no default construction path.
    pub fn without_default(mut self) -> Self {
        self.constructors.default = false;
        self
    }

    /// Append a field. Declaration order is the order of calls.
    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate and build the layout.
    pub fn build(self) -> Result<StructureLayout> {
        let fields = self
            .fields
            .into_iter()
            .enumerate()
            .map(|(index, field)| field.finish(&self.name, index))
            .collect::<Result<Vec<_>>>()?;
        StructureLayout::new(
            self.name,
            fields,
            self.sizes,
            self.byte_orders,
            self.constructors,
            self.positional,
        )
    }
}

/// Builder for one field of a [`LayoutBuilder`].
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    kind: FieldKind,
    offsets: Versioned<u64>,
    byte_orders: Versioned<ByteOrder>,
    store_types: Versioned<WireType>,
    applicability: VersionRange,
    size_cursor: Versioned<()>,
    version_number: bool,
    nullable: bool,
    encodings: Vec<StringEncoding>,
    kind_has_encoding: bool,
    trim: bool,
    padding: Option<u8>,
    count: Option<CollectionCount>,
}

impl FieldBuilder {
    /// Field with an explicit kind. A string kind carries its encoding.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let kind_has_encoding = kind.leaf().is_string();
        Self {
            name: name.into(),
            kind,
            offsets: Versioned::new(),
            byte_orders: Versioned::new(),
            store_types: Versioned::new(),
            applicability: VersionRange::any(),
            size_cursor: Versioned::new(),
            version_number: false,
            nullable: false,
            encodings: Vec::new(),
            kind_has_encoding,
            trim: false,
            padding: None,
            count: None,
        }
    }

    /// Field whose kind comes from the Rust type `T`.
    ///
    /// String fields created this way must declare exactly one encoding.
    pub fn of<T: FieldCodec>(name: impl Into<String>) -> Self {
        let mut field = Self::new(name, T::field_kind());
        field.kind_has_encoding = false;
        field.nullable = T::NULLABLE;
        field
    }

    pub fn offset(self, offset: u64) -> Self {
        self.offset_for(offset, VersionRange::any())
    }

    pub fn offset_for(mut self, offset: u64, range: VersionRange) -> Self {
        self.offsets.push(offset, range);
        self
    }

    pub fn byte_order(self, order: ByteOrder) -> Self {
        self.byte_order_for(order, VersionRange::any())
    }

    pub fn byte_order_for(mut self, order: ByteOrder, range: VersionRange) -> Self {
        self.byte_orders.push(order, range);
        self
    }

    /// Store the value on the wire as `wire` instead of its natural type.
    pub fn store_type(self, wire: WireType) -> Self {
        self.store_type_for(wire, VersionRange::any())
    }

    pub fn store_type_for(mut self, wire: WireType, range: VersionRange) -> Self {
        self.store_types.push(wire, range);
        self
    }

    /// Restrict the field to the versions in `range`.
    pub fn applies(mut self, range: VersionRange) -> Self {
        self.applicability = range;
        self
    }

    /// The field's value is the structure's size.
    pub fn size_cursor(self) -> Self {
        self.size_cursor_for(VersionRange::any())
    }

    pub fn size_cursor_for(mut self, range: VersionRange) -> Self {
        self.size_cursor.push((), range);
        self
    }

    /// The field holds the structure's format version.
    pub fn version_number(mut self) -> Self {
        self.version_number = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Element count rule of a collection field.
    pub fn count(mut self, count: CollectionCount) -> Self {
        self.count = Some(count);
        self
    }

    pub fn length_prefixed(mut self) -> Self {
        self.encodings.push(StringEncoding::LengthPrefixed);
        self
    }

    pub fn fixed_length(mut self, length: usize) -> Self {
        self.encodings.push(StringEncoding::fixed(length));
        self
    }

    /// Trim trailing padding and whitespace when reading a fixed-length string.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Fill byte of a fixed-length string.
    pub fn padding(mut self, padding: u8) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn null_terminated(mut self, max_length: Option<usize>) -> Self {
        self.encodings
            .push(StringEncoding::NullTerminated { max_length });
        self
    }

    fn finish(self, structure: &str, index: usize) -> Result<FieldLayout> {
        let conflicting = || Error::ConflictingEncoding {
            structure: structure.to_string(),
            field: self.name.clone(),
        };

        let mut kind = self.kind.clone();

        if let Some(count) = self.count {
            match &mut kind {
                FieldKind::Collection { count: slot, .. } => *slot = count,
                _ => {
                    return Err(Error::invalid_layout(
                        structure,
                        format!("count on non-collection field '{}'", self.name),
                    ))
                }
            }
        }

        let leaf = kind.leaf_mut();
        if leaf.is_string() {
            let declared = self.encodings.len() + usize::from(self.kind_has_encoding);
            if declared != 1 {
                return Err(conflicting());
            }
            if let Some(encoding) = self.encodings.first() {
                *leaf = FieldKind::String(*encoding);
            }
        } else if !self.encodings.is_empty() {
            return Err(conflicting());
        }

        if self.trim || self.padding.is_some() {
            match kind.leaf_mut() {
                FieldKind::String(StringEncoding::FixedLength { trim, padding, .. }) => {
                    *trim |= self.trim;
                    *padding = self.padding.unwrap_or(DEFAULT_STRING_PADDING);
                }
                _ => return Err(conflicting()),
            }
        }

        Ok(FieldLayout {
            name: self.name,
            index,
            kind,
            offsets: self.offsets,
            byte_orders: self.byte_orders,
            store_types: self.store_types,
            applicability: self.applicability,
            size_cursor: self.size_cursor,
            version_number: self.version_number,
            nullable: self.nullable,
        })
    }
}
