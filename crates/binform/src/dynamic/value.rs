// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Untyped field values.

use super::DynamicObject;
use crate::codec::{Guid, Scalar, WireType};
use crate::layout::{CollectionCount, FieldKind};
use std::fmt;

/// Value of one field of a [`DynamicObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Written as the default bit pattern of the field kind.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Guid(Guid),
    String(String),
    /// Buffer contents in little-endian pack order.
    Bytes(Vec<u8>),
    Object(DynamicObject),
    List(Vec<Value>),
}

impl Value {
    /// Zero value of a field kind.
    pub fn default_for(kind: &FieldKind) -> Value {
        match kind {
            FieldKind::Primitive(wire) => Value::from_scalar(*wire, zero_scalar(*wire)),
            FieldKind::Enum { .. } => Value::Int(0),
            FieldKind::String(_) => Value::String(String::new()),
            FieldKind::Buffer { size, .. } => Value::Bytes(vec![0; *size]),
            FieldKind::Object {
                layout: Some(layout),
                ..
            } => Value::Object(DynamicObject::new(layout.clone())),
            FieldKind::Object { layout: None, .. } => Value::Null,
            FieldKind::Collection { element, count } => match count {
                CollectionCount::Fixed(n) => {
                    Value::List((0..*n).map(|_| Value::default_for(element)).collect())
                }
                CollectionCount::Prefixed(_) => Value::List(Vec::new()),
            },
        }
    }

    /// Value of `scalar` in the shape natural for `wire`.
    pub fn from_scalar(wire: WireType, scalar: Scalar) -> Value {
        match (wire, scalar) {
            (_, Scalar::Guid(guid)) => Value::Guid(guid),
            (WireType::Bool, scalar) => Value::Bool(scalar.to_bool().unwrap_or(false)),
            (wire, Scalar::Signed(v)) if wire.is_integer() => Value::Int(v),
            (wire, Scalar::Unsigned(v)) if wire.is_integer() => Value::UInt(v),
            (_, Scalar::Bool(v)) => Value::Bool(v),
            (_, Scalar::Signed(v)) => Value::Int(v),
            (_, Scalar::Unsigned(v)) => Value::UInt(v),
            (_, Scalar::Float(v)) => Value::Float(v),
        }
    }

    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Bool(v) => Some(Scalar::Bool(*v)),
            Value::Int(v) => Some(Scalar::Signed(*v)),
            Value::UInt(v) => Some(Scalar::Unsigned(*v)),
            Value::Float(v) => Some(Scalar::Float(*v)),
            Value::Guid(v) => Some(Scalar::Guid(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DynamicObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut DynamicObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Guid(_) => "guid",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }
}

fn zero_scalar(wire: WireType) -> Scalar {
    match wire {
        WireType::Bool => Scalar::Bool(false),
        WireType::Guid => Scalar::Guid(Guid::nil()),
        wire if wire.is_float() => Scalar::Float(0.0),
        WireType::I8 | WireType::I16 | WireType::I32 | WireType::I64 => Scalar::Signed(0),
        _ => Scalar::Unsigned(0),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Guid(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Object(v) => write!(f, "{} {{..}}", v.layout().name()),
            Value::List(v) => write!(f, "[{} items]", v.len()),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident, $target:ty; $($type:ty),*) => {
        $(
            impl From<$type> for Value {
                fn from(value: $type) -> Self {
                    Value::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

impl_from!(Int, i64; i8, i16, i32, i64);
impl_from!(UInt, u64; u8, u16, u32, u64);
impl_from!(Float, f64; f32, f64);
impl_from!(Bool, bool; bool);
impl_from!(Guid, Guid; Guid);
impl_from!(String, String; String, &str);
impl_from!(Object, DynamicObject; DynamicObject);
impl_from!(List, Vec<Value>; Vec<Value>);

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringEncoding;

    #[test]
    fn test_defaults_follow_kind() {
        assert_eq!(Value::default_for(&FieldKind::Primitive(WireType::I16)), Value::Int(0));
        assert_eq!(Value::default_for(&FieldKind::Primitive(WireType::U32)), Value::UInt(0));
        assert_eq!(Value::default_for(&FieldKind::Primitive(WireType::F16)), Value::Float(0.0));
        assert_eq!(
            Value::default_for(&FieldKind::Primitive(WireType::Guid)),
            Value::Guid(Guid::nil())
        );
        assert_eq!(
            Value::default_for(&FieldKind::String(StringEncoding::fixed(4))),
            Value::String(String::new())
        );
        let list = FieldKind::collection(
            FieldKind::Primitive(WireType::U8),
            CollectionCount::Fixed(3),
        );
        assert_eq!(
            Value::default_for(&list),
            Value::List(vec![Value::UInt(0), Value::UInt(0), Value::UInt(0)])
        );
    }

    #[test]
    fn test_scalar_views() {
        assert_eq!(Value::from(-3i8).to_scalar(), Some(Scalar::Signed(-3)));
        assert_eq!(Value::from(7u16).to_scalar(), Some(Scalar::Unsigned(7)));
        assert_eq!(Value::from("name").to_scalar(), None);
        assert_eq!(
            Value::from_scalar(WireType::F32, Scalar::Float(1.5)),
            Value::Float(1.5)
        );
    }
}
