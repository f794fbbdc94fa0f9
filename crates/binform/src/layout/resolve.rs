// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version resolution of a [`StructureLayout`].
//!
//! Every version-scoped property is resolved independently: zero matches
//! means "absent" (no offset: field skipped; no byte order: inherit; no size:
//! fall back to the extent rule), more than one match is a configuration
//! error.

use super::{FieldKind, StructureLayout};
use crate::codec::WireType;
use crate::cursor::order_by_offset;
use crate::error::{Error, Result};
use crate::order::ByteOrder;
use crate::version::Versioned;

/// A field as it applies to one version.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// Declaration index.
    pub index: usize,
    pub name: String,
    pub kind: FieldKind,
    /// Offset from the structure start; `None` for positional layouts.
    pub offset: Option<u64>,
    /// Field override, else the structure byte order. `None` inherits the
    /// stream default.
    pub byte_order: Option<ByteOrder>,
    pub store_type: Option<WireType>,
    pub size_cursor: bool,
    pub version_number: bool,
}

impl ResolvedField {
    pub fn byte_order_or(&self, default: ByteOrder) -> ByteOrder {
        self.byte_order.unwrap_or(default)
    }

    /// Wire type of primitive-like fields after the store-type override.
    pub fn wire_type(&self) -> Option<WireType> {
        self.store_type.or_else(|| self.kind.wire_type())
    }

    /// Field describing one element of a collection field.
    ///
    /// Byte order and store type carry over to the elements. Non-collection
    /// fields are returned unchanged.
    pub fn element(&self) -> ResolvedField {
        let kind = match &self.kind {
            FieldKind::Collection { element, .. } => element.as_ref().clone(),
            other => other.clone(),
        };
        ResolvedField {
            kind,
            offset: None,
            size_cursor: false,
            version_number: false,
            ..self.clone()
        }
    }
}

/// Field set of a structure at one version, in visitation order.
#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    pub structure: String,
    pub version: Option<f64>,
    pub fields: Vec<ResolvedField>,
    pub total_size: Option<u64>,
    pub byte_order: Option<ByteOrder>,
    pub positional: bool,
    /// Block size when the structure qualifies for the flat path.
    pub flat_size: Option<u64>,
}

impl ResolvedLayout {
    /// Field by declaration index, if present at this version.
    pub fn field(&self, index: usize) -> Option<&ResolvedField> {
        self.fields.iter().find(|field| field.index == index)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn size_cursor(&self) -> Option<&ResolvedField> {
        self.fields.iter().find(|field| field.size_cursor)
    }

    pub fn is_flat(&self) -> bool {
        self.flat_size.is_some()
    }
}

fn pick<'v, T>(
    alternatives: &'v Versioned<T>,
    version: Option<f64>,
    structure: &str,
    property: impl FnOnce() -> String,
) -> Result<Option<&'v T>> {
    alternatives
        .resolve(version)
        .map_err(|_| Error::AmbiguousVersion {
            structure: structure.to_string(),
            property: property(),
            version,
        })
}

pub(crate) fn resolve_layout(layout: &StructureLayout, version: Option<f64>) -> Result<ResolvedLayout> {
    let structure = layout.name();

    if version.is_none() && !layout.sizes().supports_implicit() {
        return Err(Error::VersionRequired {
            structure: structure.to_string(),
        });
    }

    let total_size = pick(layout.sizes(), version, structure, || "size".into())?.copied();
    let structure_order =
        pick(layout.byte_orders(), version, structure, || "byte order".into())?.copied();

    let mut fields = Vec::with_capacity(layout.fields().len());
    for field in layout.fields() {
        if !field.applicability.contains(version) {
            continue;
        }

        let offset = if layout.is_positional() {
            None
        } else {
            match pick(&field.offsets, version, structure, || format!("{}.offset", field.name))? {
                Some(offset) => Some(*offset),
                None => continue,
            }
        };

        let byte_order = pick(&field.byte_orders, version, structure, || {
            format!("{}.byte_order", field.name)
        })?
        .copied();
        let store_type = pick(&field.store_types, version, structure, || {
            format!("{}.store_type", field.name)
        })?
        .copied();
        let size_cursor = pick(&field.size_cursor, version, structure, || {
            format!("{}.size_cursor", field.name)
        })?
        .is_some();

        fields.push(ResolvedField {
            index: field.index,
            name: field.name.clone(),
            kind: field.kind.clone(),
            offset,
            byte_order: byte_order.or(structure_order),
            store_type,
            size_cursor,
            version_number: field.version_number,
        });
    }

    if !layout.is_positional() {
        order_by_offset(&mut fields);
    }

    if fields.iter().filter(|field| field.size_cursor).count() > 1 {
        return Err(Error::AmbiguousVersion {
            structure: structure.to_string(),
            property: "size cursor".into(),
            version,
        });
    }

    log::debug!(
        "[resolve] {} @ {:?}: {} of {} fields, size {:?}",
        structure,
        version,
        fields.len(),
        layout.fields().len(),
        total_size
    );

    Ok(ResolvedLayout {
        structure: structure.to_string(),
        version,
        fields,
        total_size,
        byte_order: structure_order,
        positional: layout.is_positional(),
        flat_size: layout.flat_size(),
    })
}
