// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field descriptors.

use super::StructureLayout;
use crate::codec::{StringEncoding, WireType};
use crate::order::ByteOrder;
use crate::version::{VersionRange, Versioned};
use std::fmt;
use std::sync::Arc;

/// How a collection finds its element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionCount {
    /// Count stored immediately before the elements.
    Prefixed(WireType),
    /// Count fixed by the layout.
    Fixed(usize),
}

impl Default for CollectionCount {
    fn default() -> Self {
        CollectionCount::Prefixed(WireType::I32)
    }
}

/// What a field holds, closed over every kind the walker dispatches on.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Primitive(WireType),
    /// Enumeration stored as its underlying integer.
    Enum {
        type_name: &'static str,
        underlying: WireType,
    },
    String(StringEncoding),
    /// Compact value transferred as one block (see [`Bufferable`](crate::Bufferable)).
    Buffer {
        type_name: &'static str,
        size: usize,
        pack_size: usize,
    },
    /// Nested structure. Runtime layouts carry their description; derived
    /// types resolve it through their own `BinaryObject` impl.
    Object {
        type_name: String,
        layout: Option<Arc<StructureLayout>>,
    },
    Collection {
        element: Box<FieldKind>,
        count: CollectionCount,
    },
}

impl FieldKind {
    pub fn object(layout: Arc<StructureLayout>) -> Self {
        FieldKind::Object {
            type_name: layout.name().to_string(),
            layout: Some(layout),
        }
    }

    pub fn collection(element: FieldKind, count: CollectionCount) -> Self {
        FieldKind::Collection {
            element: Box::new(element),
            count,
        }
    }

    /// Wire width when it does not depend on the value.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            FieldKind::Primitive(wire) => Some(wire.size()),
            FieldKind::Enum { underlying, .. } => Some(underlying.size()),
            FieldKind::Buffer { size, .. } => Some(*size),
            FieldKind::String(encoding) => encoding.fixed_size(),
            FieldKind::Object { .. } | FieldKind::Collection { .. } => None,
        }
    }

    /// Default wire type of primitive-like kinds.
    pub fn wire_type(&self) -> Option<WireType> {
        match self {
            FieldKind::Primitive(wire) => Some(*wire),
            FieldKind::Enum { underlying, .. } => Some(*underlying),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, FieldKind::String(_))
    }

    /// Innermost non-collection kind.
    pub fn leaf(&self) -> &FieldKind {
        match self {
            FieldKind::Collection { element, .. } => element.leaf(),
            other => other,
        }
    }

    pub(crate) fn leaf_mut(&mut self) -> &mut FieldKind {
        match self {
            FieldKind::Collection { element, .. } => element.leaf_mut(),
            other => other,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Primitive(wire) => write!(f, "{}", wire),
            FieldKind::Enum {
                type_name,
                underlying,
            } => write!(f, "enum {}({})", type_name, underlying),
            FieldKind::String(encoding) => write!(f, "string {}", encoding),
            FieldKind::Buffer { type_name, size, .. } => {
                write!(f, "buffer {}[{}]", type_name, size)
            }
            FieldKind::Object { type_name, .. } => write!(f, "object {}", type_name),
            FieldKind::Collection { element, count } => match count {
                CollectionCount::Prefixed(wire) => write!(f, "[{}; {} prefix]", element, wire),
                CollectionCount::Fixed(n) => write!(f, "[{}; {}]", element, n),
            },
        }
    }
}

/// One field of a [`StructureLayout`] with every version-scoped property.
#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) kind: FieldKind,
    pub(crate) offsets: Versioned<u64>,
    pub(crate) byte_orders: Versioned<ByteOrder>,
    pub(crate) store_types: Versioned<WireType>,
    pub(crate) applicability: VersionRange,
    pub(crate) size_cursor: Versioned<()>,
    pub(crate) version_number: bool,
    pub(crate) nullable: bool,
}

impl FieldLayout {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration index, as used by `FieldAccess`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn offsets(&self) -> &Versioned<u64> {
        &self.offsets
    }

    pub fn byte_orders(&self) -> &Versioned<ByteOrder> {
        &self.byte_orders
    }

    pub fn store_types(&self) -> &Versioned<WireType> {
        &self.store_types
    }

    pub fn applicability(&self) -> VersionRange {
        self.applicability
    }

    pub fn is_version_number(&self) -> bool {
        self.version_number
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// `true` when any alternative marks this field as the size cursor.
    pub fn may_be_size_cursor(&self) -> bool {
        !self.size_cursor.is_empty()
    }

    /// Wire width at every version, if independent of the value.
    pub(crate) fn effective_fixed_size(&self) -> Option<usize> {
        match (self.store_types.iter().next(), &self.kind) {
            (Some((wire, _)), FieldKind::Primitive(_) | FieldKind::Enum { .. }) => {
                Some(wire.size())
            }
            _ => self.kind.fixed_size(),
        }
    }

    /// `true` when nothing about the field depends on the version.
    pub(crate) fn is_unconditional(&self) -> bool {
        self.applicability.is_unbounded()
            && !self.offsets.is_conditional()
            && !self.byte_orders.is_conditional()
            && !self.store_types.is_conditional()
            && !self.size_cursor.is_conditional()
            && self.offsets.len() <= 1
            && self.byte_orders.len() <= 1
            && self.store_types.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(FieldKind::Primitive(WireType::U16).fixed_size(), Some(2));
        assert_eq!(
            FieldKind::Enum {
                type_name: "Mode",
                underlying: WireType::U8
            }
            .fixed_size(),
            Some(1)
        );
        assert_eq!(FieldKind::String(StringEncoding::fixed(12)).fixed_size(), Some(12));
        assert_eq!(FieldKind::String(StringEncoding::LengthPrefixed).fixed_size(), None);
        let list = FieldKind::collection(FieldKind::Primitive(WireType::U8), CollectionCount::Fixed(4));
        assert_eq!(list.fixed_size(), None);
    }

    #[test]
    fn test_leaf_and_display() {
        let list = FieldKind::collection(
            FieldKind::String(StringEncoding::LengthPrefixed),
            CollectionCount::default(),
        );
        assert!(list.leaf().is_string());
        assert_eq!(list.to_string(), "[string length-prefixed; i32 prefix]");
        assert_eq!(FieldKind::Primitive(WireType::F32).to_string(), "f32");
    }
}
