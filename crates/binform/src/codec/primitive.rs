// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire types, in-memory scalars and store-type coercion.
//!
//! A field's in-memory type and its on-wire type may differ (a `u8` stored as
//! a 32-bit integer, an `f32` stored as binary16). Values travel between the
//! two as a [`Scalar`]; a conversion that would change the value is a data
//! error, never a silent truncation.

use super::{Guid, F16};
use crate::config::GUID_SIZE;
use crate::error::{Error, Result};
use crate::io::{EndianReader, EndianWriter};
use crate::order::ByteOrder;
use std::fmt;
use std::io::{Read, Seek, Write};

/// On-wire representation of a primitive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F16,
    F32,
    F64,
    Guid,
}

impl WireType {
    /// Width in bytes.
    pub const fn size(self) -> usize {
        match self {
            WireType::Bool | WireType::I8 | WireType::U8 => 1,
            WireType::I16 | WireType::U16 | WireType::F16 => 2,
            WireType::I32 | WireType::U32 | WireType::F32 => 4,
            WireType::I64 | WireType::U64 | WireType::F64 => 8,
            WireType::Guid => GUID_SIZE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            WireType::Bool => "bool",
            WireType::I8 => "i8",
            WireType::U8 => "u8",
            WireType::I16 => "i16",
            WireType::U16 => "u16",
            WireType::I32 => "i32",
            WireType::U32 => "u32",
            WireType::I64 => "i64",
            WireType::U64 => "u64",
            WireType::F16 => "f16",
            WireType::F32 => "f32",
            WireType::F64 => "f64",
            WireType::Guid => "guid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "bool" => WireType::Bool,
            "i8" => WireType::I8,
            "u8" => WireType::U8,
            "i16" => WireType::I16,
            "u16" => WireType::U16,
            "i32" => WireType::I32,
            "u32" => WireType::U32,
            "i64" => WireType::I64,
            "u64" => WireType::U64,
            "f16" => WireType::F16,
            "f32" => WireType::F32,
            "f64" => WireType::F64,
            "guid" | "Guid" => WireType::Guid,
            _ => return None,
        })
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            WireType::I8
                | WireType::U8
                | WireType::I16
                | WireType::U16
                | WireType::I32
                | WireType::U32
                | WireType::I64
                | WireType::U64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, WireType::F16 | WireType::F32 | WireType::F64)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A primitive value independent of its wire width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Guid(Guid),
}

impl Scalar {
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Scalar::Bool(b) => Some(i64::from(b)),
            Scalar::Signed(v) => Some(v),
            Scalar::Unsigned(v) => i64::try_from(v).ok(),
            Scalar::Float(v) => float_to_integral(v)
                .filter(|v| *v >= i64::MIN as f64 && *v < i64::MAX as f64)
                .map(|v| v as i64),
            Scalar::Guid(_) => None,
        }
    }

    pub fn to_u64(self) -> Option<u64> {
        match self {
            Scalar::Bool(b) => Some(u64::from(b)),
            Scalar::Signed(v) => u64::try_from(v).ok(),
            Scalar::Unsigned(v) => Some(v),
            Scalar::Float(v) => float_to_integral(v)
                .filter(|v| *v >= 0.0 && *v < u64::MAX as f64)
                .map(|v| v as u64),
            Scalar::Guid(_) => None,
        }
    }

    pub fn to_f64(self) -> Option<f64> {
        match self {
            Scalar::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Scalar::Signed(v) => Some(v as f64),
            Scalar::Unsigned(v) => Some(v as f64),
            Scalar::Float(v) => Some(v),
            Scalar::Guid(_) => None,
        }
    }

    pub fn to_bool(self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(b),
            Scalar::Signed(v) => Some(v != 0),
            Scalar::Unsigned(v) => Some(v != 0),
            Scalar::Float(v) => Some(v != 0.0),
            Scalar::Guid(_) => None,
        }
    }

    pub fn to_guid(self) -> Option<Guid> {
        match self {
            Scalar::Guid(g) => Some(g),
            _ => None,
        }
    }
}

fn float_to_integral(v: f64) -> Option<f64> {
    (v.is_finite() && v.fract() == 0.0).then_some(v)
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Signed(v) => write!(f, "{}", v),
            Scalar::Unsigned(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Guid(v) => write!(f, "{}", v),
        }
    }
}

/// In-memory primitive with a natural wire type.
pub trait Primitive: Copy + Default + 'static {
    /// Wire type used when the field declares no store type.
    const WIRE: WireType;

    fn into_scalar(self) -> Scalar;

    /// `None` when the value does not fit `Self`.
    fn from_scalar(scalar: Scalar) -> Option<Self>;
}

macro_rules! impl_primitive_int {
    ($type:ty, $wire:ident, $variant:ident, $to:ident, $wide:ty) => {
        impl Primitive for $type {
            const WIRE: WireType = WireType::$wire;

            fn into_scalar(self) -> Scalar {
                Scalar::$variant(<$wide>::from(self))
            }

            fn from_scalar(scalar: Scalar) -> Option<Self> {
                scalar.$to().and_then(|v| <$type>::try_from(v).ok())
            }
        }
    };
}

impl_primitive_int!(i8, I8, Signed, to_i64, i64);
impl_primitive_int!(i16, I16, Signed, to_i64, i64);
impl_primitive_int!(i32, I32, Signed, to_i64, i64);
impl_primitive_int!(i64, I64, Signed, to_i64, i64);
impl_primitive_int!(u8, U8, Unsigned, to_u64, u64);
impl_primitive_int!(u16, U16, Unsigned, to_u64, u64);
impl_primitive_int!(u32, U32, Unsigned, to_u64, u64);
impl_primitive_int!(u64, U64, Unsigned, to_u64, u64);

impl Primitive for bool {
    const WIRE: WireType = WireType::Bool;

    fn into_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        scalar.to_bool()
    }
}

impl Primitive for f32 {
    const WIRE: WireType = WireType::F32;

    fn into_scalar(self) -> Scalar {
        Scalar::Float(f64::from(self))
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        scalar.to_f64().map(|v| v as f32)
    }
}

impl Primitive for f64 {
    const WIRE: WireType = WireType::F64;

    fn into_scalar(self) -> Scalar {
        Scalar::Float(self)
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        scalar.to_f64()
    }
}

impl Primitive for F16 {
    const WIRE: WireType = WireType::F16;

    fn into_scalar(self) -> Scalar {
        Scalar::Float(self.to_f64())
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        scalar.to_f64().map(F16::from_f64)
    }
}

impl Primitive for Guid {
    const WIRE: WireType = WireType::Guid;

    fn into_scalar(self) -> Scalar {
        Scalar::Guid(self)
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        scalar.to_guid()
    }
}

/// Read one value of `wire` type in `order`.
pub fn read_scalar<R: Read + Seek>(
    reader: &mut EndianReader<R>,
    wire: WireType,
    order: ByteOrder,
) -> Result<Scalar> {
    Ok(match wire {
        WireType::Bool => Scalar::Bool(reader.read_bool()?),
        WireType::I8 => Scalar::Signed(i64::from(reader.read_i8()?)),
        WireType::U8 => Scalar::Unsigned(u64::from(reader.read_u8()?)),
        WireType::I16 => Scalar::Signed(i64::from(reader.read_i16_with(order)?)),
        WireType::U16 => Scalar::Unsigned(u64::from(reader.read_u16_with(order)?)),
        WireType::I32 => Scalar::Signed(i64::from(reader.read_i32_with(order)?)),
        WireType::U32 => Scalar::Unsigned(u64::from(reader.read_u32_with(order)?)),
        WireType::I64 => Scalar::Signed(reader.read_i64_with(order)?),
        WireType::U64 => Scalar::Unsigned(reader.read_u64_with(order)?),
        WireType::F16 => Scalar::Float(reader.read_f16_with(order)?.to_f64()),
        WireType::F32 => Scalar::Float(f64::from(reader.read_f32_with(order)?)),
        WireType::F64 => Scalar::Float(reader.read_f64_with(order)?),
        WireType::Guid => Scalar::Guid(reader.read_guid_with(order)?),
    })
}

/// Write `value` as `wire` type in `order`.
///
/// Fails with a data error, before any byte is written, if the value cannot be
/// represented by the wire type.
pub fn write_scalar<W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    wire: WireType,
    order: ByteOrder,
    value: Scalar,
) -> Result<()> {
    let offset = writer.absolute_position()?;
    let misfit = || Error::malformed(offset, format!("value {} does not fit {}", value, wire));

    macro_rules! narrow {
        ($to:ident, $type:ty) => {
            value
                .$to()
                .and_then(|v| <$type>::try_from(v).ok())
                .ok_or_else(misfit)?
        };
    }

    match wire {
        WireType::Bool => writer.write_bool(value.to_bool().ok_or_else(misfit)?),
        WireType::I8 => writer.write_i8(narrow!(to_i64, i8)),
        WireType::U8 => writer.write_u8(narrow!(to_u64, u8)),
        WireType::I16 => writer.write_i16_with(narrow!(to_i64, i16), order),
        WireType::U16 => writer.write_u16_with(narrow!(to_u64, u16), order),
        WireType::I32 => writer.write_i32_with(narrow!(to_i64, i32), order),
        WireType::U32 => writer.write_u32_with(narrow!(to_u64, u32), order),
        WireType::I64 => writer.write_i64_with(value.to_i64().ok_or_else(misfit)?, order),
        WireType::U64 => writer.write_u64_with(value.to_u64().ok_or_else(misfit)?, order),
        WireType::F16 => {
            writer.write_f16_with(F16::from_f64(value.to_f64().ok_or_else(misfit)?), order)
        }
        WireType::F32 => writer.write_f32_with(value.to_f64().ok_or_else(misfit)? as f32, order),
        WireType::F64 => writer.write_f64_with(value.to_f64().ok_or_else(misfit)?, order),
        WireType::Guid => writer.write_guid_with(value.to_guid().ok_or_else(misfit)?, order),
    }
}

/// Read a `wire` value and coerce it into `T`.
pub fn read_primitive<T: Primitive, R: Read + Seek>(
    reader: &mut EndianReader<R>,
    wire: WireType,
    order: ByteOrder,
) -> Result<T> {
    let offset = reader.absolute_position()?;
    let scalar = read_scalar(reader, wire, order)?;
    T::from_scalar(scalar).ok_or_else(|| {
        Error::malformed(
            offset,
            format!(
                "stored {} value {} does not fit {}",
                wire,
                scalar,
                T::WIRE.name()
            ),
        )
    })
}

pub fn write_primitive<T: Primitive, W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    value: T,
    wire: WireType,
    order: ByteOrder,
) -> Result<()> {
    write_scalar(writer, wire, order, value.into_scalar())
}
