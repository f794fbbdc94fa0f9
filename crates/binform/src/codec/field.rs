// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type field codecs.
//!
//! [`FieldCodec`] connects a Rust type to a [`FieldKind`] and knows how to
//! move one value of that type through a stream given the resolved field
//! (byte order, store type, string encoding, collection count). It is
//! implemented here for primitives, `String`, `Option<T>` and `Vec<T>`; the
//! derive macros implement it for structures and enums, and
//! [`bufferable_field!`](crate::bufferable_field) for [`Bufferable`] types.

use super::primitive::{read_primitive, read_scalar, write_primitive, write_scalar};
use super::{read_string, write_string, Guid, Primitive, Scalar, WireType, F16};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::io::{EndianReader, EndianWriter};
use crate::layout::{CollectionCount, FieldKind, ResolvedField};
use crate::order::ByteOrder;
use std::io::{Read, Seek, Write};

/// Encoding and decoding of one field value.
pub trait FieldCodec: Sized {
    /// Whether the type is an optional wrapper.
    const NULLABLE: bool = false;

    /// Kind recorded in the layout for fields of this type.
    fn field_kind() -> FieldKind;

    fn decode<R: Read + Seek>(
        reader: &mut EndianReader<R>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<Self>;

    fn encode<W: Write + Seek>(
        &self,
        writer: &mut EndianWriter<W>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<()>;

    /// Numeric view of the value, used for version and size-cursor fields.
    fn as_scalar(&self) -> Option<Scalar> {
        None
    }
}

fn kind_mismatch<T>(field: &ResolvedField) -> Error {
    Error::invalid_layout(
        std::any::type_name::<T>(),
        format!("field '{}' has kind {}", field.name, field.kind),
    )
}

macro_rules! impl_primitive_field {
    ($($type:ty),* $(,)?) => {
        $(
            impl FieldCodec for $type {
                fn field_kind() -> FieldKind {
                    FieldKind::Primitive(<$type as Primitive>::WIRE)
                }

                fn decode<R: Read + Seek>(
                    reader: &mut EndianReader<R>,
                    field: &ResolvedField,
                    _ctx: &Context<'_>,
                ) -> Result<Self> {
                    let wire = field.store_type.unwrap_or(<$type as Primitive>::WIRE);
                    let order = field.byte_order_or(reader.byte_order());
                    read_primitive(reader, wire, order)
                }

                fn encode<W: Write + Seek>(
                    &self,
                    writer: &mut EndianWriter<W>,
                    field: &ResolvedField,
                    _ctx: &Context<'_>,
                ) -> Result<()> {
                    let wire = field.store_type.unwrap_or(<$type as Primitive>::WIRE);
                    let order = field.byte_order_or(writer.byte_order());
                    write_primitive(writer, *self, wire, order)
                }

                fn as_scalar(&self) -> Option<Scalar> {
                    Some(self.into_scalar())
                }
            }
        )*
    };
}

impl_primitive_field!(bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, F16, Guid);

impl FieldCodec for String {
    /// The encoding is a placeholder; layouts must declare one.
    fn field_kind() -> FieldKind {
        FieldKind::String(super::StringEncoding::LengthPrefixed)
    }

    fn decode<R: Read + Seek>(
        reader: &mut EndianReader<R>,
        field: &ResolvedField,
        _ctx: &Context<'_>,
    ) -> Result<Self> {
        match &field.kind {
            FieldKind::String(encoding) => {
                let order = field.byte_order_or(reader.byte_order());
                read_string(reader, encoding, order)
            }
            _ => Err(kind_mismatch::<Self>(field)),
        }
    }

    fn encode<W: Write + Seek>(
        &self,
        writer: &mut EndianWriter<W>,
        field: &ResolvedField,
        _ctx: &Context<'_>,
    ) -> Result<()> {
        match &field.kind {
            FieldKind::String(encoding) => {
                let order = field.byte_order_or(writer.byte_order());
                write_string(writer, self, encoding, order)
            }
            _ => Err(kind_mismatch::<Self>(field)),
        }
    }
}

/// Optional wrappers are transparent: `None` is written as the default value
/// of `T` and decoding always yields `Some`.
impl<T: FieldCodec + Default> FieldCodec for Option<T> {
    const NULLABLE: bool = true;

    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn decode<R: Read + Seek>(
        reader: &mut EndianReader<R>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<Self> {
        T::decode(reader, field, ctx).map(Some)
    }

    fn encode<W: Write + Seek>(
        &self,
        writer: &mut EndianWriter<W>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<()> {
        match self {
            Some(value) => value.encode(writer, field, ctx),
            None => T::default().encode(writer, field, ctx),
        }
    }

    fn as_scalar(&self) -> Option<Scalar> {
        self.as_ref().and_then(T::as_scalar)
    }
}

impl<T: FieldCodec> FieldCodec for Vec<T> {
    fn field_kind() -> FieldKind {
        FieldKind::collection(T::field_kind(), CollectionCount::default())
    }

    fn decode<R: Read + Seek>(
        reader: &mut EndianReader<R>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<Self> {
        let count = read_collection_count(reader, field)?;
        let element = field.element();
        // Capacity is bounded by the remaining stream, not by the declared count.
        let mut items = Vec::with_capacity(count.min(reader.remaining()? as usize));
        for _ in 0..count {
            items.push(T::decode(reader, &element, ctx)?);
        }
        Ok(items)
    }

    fn encode<W: Write + Seek>(
        &self,
        writer: &mut EndianWriter<W>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<()> {
        write_collection_count(writer, field, self.len())?;
        let element = field.element();
        for item in self {
            item.encode(writer, &element, ctx)?;
        }
        Ok(())
    }
}

/// Read the element count of a collection field.
pub(crate) fn read_collection_count<R: Read + Seek>(
    reader: &mut EndianReader<R>,
    field: &ResolvedField,
) -> Result<usize> {
    let count = match &field.kind {
        FieldKind::Collection { count, .. } => *count,
        _ => return Err(kind_mismatch::<Vec<()>>(field)),
    };
    match count {
        CollectionCount::Fixed(n) => Ok(n),
        CollectionCount::Prefixed(wire) => {
            let offset = reader.absolute_position()?;
            let order = field.byte_order_or(reader.byte_order());
            let raw = read_scalar(reader, wire, order)?;
            let n = match raw {
                Scalar::Signed(v) if v < 0 => {
                    return Err(Error::malformed(offset, format!("negative element count {}", v)))
                }
                other => other
                    .to_u64()
                    .ok_or_else(|| Error::malformed(offset, format!("invalid element count {}", other)))?,
            };
            let limit = reader.config().max_collection_count;
            if n > limit as u64 {
                return Err(Error::malformed(
                    offset,
                    format!("element count {} exceeds limit {}", n, limit),
                ));
            }
            Ok(n as usize)
        }
    }
}

/// Write the element count of a collection field (or check it against a
/// fixed count).
pub(crate) fn write_collection_count<W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    field: &ResolvedField,
    len: usize,
) -> Result<()> {
    let count = match &field.kind {
        FieldKind::Collection { count, .. } => *count,
        _ => return Err(kind_mismatch::<Vec<()>>(field)),
    };
    match count {
        CollectionCount::Fixed(n) if n == len => Ok(()),
        CollectionCount::Fixed(n) => Err(Error::malformed(
            writer.absolute_position()?,
            format!("collection holds {} elements, layout expects {}", len, n),
        )),
        CollectionCount::Prefixed(wire) => {
            let order = field.byte_order_or(writer.byte_order());
            write_scalar(writer, wire, order, Scalar::Unsigned(len as u64))
        }
    }
}

/// Decode an enumeration through its discriminant.
///
/// `from_discriminant` maps a discriminant to a variant; unknown values are
/// a data error.
pub fn read_enum<T, R: Read + Seek>(
    reader: &mut EndianReader<R>,
    field: &ResolvedField,
    underlying: WireType,
    type_name: &str,
    from_discriminant: impl FnOnce(i64) -> Option<T>,
) -> Result<T> {
    let offset = reader.absolute_position()?;
    let wire = field.store_type.unwrap_or(underlying);
    let order = field.byte_order_or(reader.byte_order());
    let raw = read_scalar(reader, wire, order)?;
    let discriminant = raw
        .to_i64()
        .ok_or_else(|| Error::malformed(offset, format!("invalid {} discriminant {}", type_name, raw)))?;
    from_discriminant(discriminant).ok_or_else(|| {
        Error::malformed(
            offset,
            format!("unknown {} discriminant {}", type_name, discriminant),
        )
    })
}

pub fn write_enum<W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    field: &ResolvedField,
    underlying: WireType,
    discriminant: i64,
) -> Result<()> {
    let wire = field.store_type.unwrap_or(underlying);
    let order = field.byte_order_or(writer.byte_order());
    write_scalar(writer, wire, order, Scalar::Signed(discriminant))
}

/// Compact value type moved as one contiguous block.
///
/// The block handed to [`Bufferable::read_from_buffer`] and filled by
/// [`Bufferable::write_to_buffer`] is always little-endian; for big-endian
/// streams every `PACK_SIZE`-byte chunk is reversed on the way in and out.
pub trait Bufferable: Sized {
    /// Size of one value in bytes.
    const SIZE_OF: usize;
    /// Width of the scalar components (1 for byte-packed types).
    const PACK_SIZE: usize;

    fn read_from_buffer(buffer: &[u8]) -> Self;

    fn write_to_buffer(&self, buffer: &mut [u8]);
}

/// Reverse every `pack`-byte chunk of `buffer` in place.
pub(crate) fn reverse_packs(buffer: &mut [u8], pack: usize) {
    if pack > 1 {
        for chunk in buffer.chunks_exact_mut(pack) {
            chunk.reverse();
        }
    }
}

/// Decode `count` bufferable values from one block read.
pub fn read_bufferable_array<T: Bufferable, R: Read + Seek>(
    reader: &mut EndianReader<R>,
    count: usize,
    order: ByteOrder,
) -> Result<Vec<T>> {
    let offset = reader.absolute_position()?;
    let total = T::SIZE_OF.checked_mul(count).ok_or_else(|| {
        Error::malformed(offset, format!("{} values of {} bytes overflow", count, T::SIZE_OF))
    })?;
    let mut block = reader.read_bytes(total)?;
    if order == ByteOrder::BigEndian {
        reverse_packs(&mut block, T::PACK_SIZE);
    }
    Ok(block
        .chunks_exact(T::SIZE_OF.max(1))
        .take(count)
        .map(T::read_from_buffer)
        .collect())
}

/// Encode bufferable values with one block write.
pub fn write_bufferable_array<T: Bufferable, W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    values: &[T],
    order: ByteOrder,
) -> Result<()> {
    let mut block = vec![0u8; T::SIZE_OF * values.len()];
    for (value, chunk) in values.iter().zip(block.chunks_exact_mut(T::SIZE_OF.max(1))) {
        value.write_to_buffer(chunk);
    }
    if order == ByteOrder::BigEndian {
        reverse_packs(&mut block, T::PACK_SIZE);
    }
    writer.write_bytes(&block)
}

pub fn read_bufferable<T: Bufferable, R: Read + Seek>(
    reader: &mut EndianReader<R>,
    order: ByteOrder,
) -> Result<T> {
    let mut block = reader.read_bytes(T::SIZE_OF)?;
    if order == ByteOrder::BigEndian {
        reverse_packs(&mut block, T::PACK_SIZE);
    }
    Ok(T::read_from_buffer(&block))
}

pub fn write_bufferable<T: Bufferable, W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    value: &T,
    order: ByteOrder,
) -> Result<()> {
    let mut block = vec![0u8; T::SIZE_OF];
    value.write_to_buffer(&mut block);
    if order == ByteOrder::BigEndian {
        reverse_packs(&mut block, T::PACK_SIZE);
    }
    writer.write_bytes(&block)
}

/// Implement [`FieldCodec`] for [`Bufferable`] types.
///
/// ```ignore
/// binform::bufferable_field!(Vector3, Rgba8);
/// ```
#[macro_export]
macro_rules! bufferable_field {
    ($($type:ty),* $(,)?) => {
        $(
            impl $crate::codec::FieldCodec for $type {
                fn field_kind() -> $crate::layout::FieldKind {
                    $crate::layout::FieldKind::Buffer {
                        type_name: stringify!($type),
                        size: <$type as $crate::codec::Bufferable>::SIZE_OF,
                        pack_size: <$type as $crate::codec::Bufferable>::PACK_SIZE,
                    }
                }

                fn decode<R: ::std::io::Read + ::std::io::Seek>(
                    reader: &mut $crate::io::EndianReader<R>,
                    field: &$crate::layout::ResolvedField,
                    _ctx: &$crate::context::Context<'_>,
                ) -> $crate::error::Result<Self> {
                    let order = field.byte_order_or(reader.byte_order());
                    $crate::codec::read_bufferable(reader, order)
                }

                fn encode<W: ::std::io::Write + ::std::io::Seek>(
                    &self,
                    writer: &mut $crate::io::EndianWriter<W>,
                    field: &$crate::layout::ResolvedField,
                    _ctx: &$crate::context::Context<'_>,
                ) -> $crate::error::Result<()> {
                    let order = field.byte_order_or(writer.byte_order());
                    $crate::codec::write_bufferable(writer, self, order)
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringEncoding;
    use crate::config::CodecConfig;
    use crate::context::AmbientContext;
    use std::io::Cursor;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Rgb16 {
        r: u16,
        g: u16,
        b: u16,
    }

    impl Bufferable for Rgb16 {
        const SIZE_OF: usize = 6;
        const PACK_SIZE: usize = 2;

        fn read_from_buffer(buffer: &[u8]) -> Self {
            let at = |i: usize| u16::from_le_bytes([buffer[i], buffer[i + 1]]);
            Self {
                r: at(0),
                g: at(2),
                b: at(4),
            }
        }

        fn write_to_buffer(&self, buffer: &mut [u8]) {
            buffer[0..2].copy_from_slice(&self.r.to_le_bytes());
            buffer[2..4].copy_from_slice(&self.g.to_le_bytes());
            buffer[4..6].copy_from_slice(&self.b.to_le_bytes());
        }
    }

    crate::bufferable_field!(Rgb16);

    fn field(kind: FieldKind) -> ResolvedField {
        ResolvedField {
            index: 0,
            name: "value".into(),
            kind,
            offset: Some(0),
            byte_order: None,
            store_type: None,
            size_cursor: false,
            version_number: false,
        }
    }

    fn encode<T: FieldCodec>(value: &T, field: &ResolvedField) -> Vec<u8> {
        let ambient = AmbientContext::new();
        let ctx = Context::new(None, &ambient);
        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
        value.encode(&mut writer, field, &ctx).expect("encode");
        writer.into_inner().into_inner()
    }

    fn decode<T: FieldCodec>(bytes: Vec<u8>, field: &ResolvedField) -> Result<T> {
        let ambient = AmbientContext::new();
        let ctx = Context::new(None, &ambient);
        let mut reader = EndianReader::new(Cursor::new(bytes), ByteOrder::LittleEndian);
        T::decode(&mut reader, field, &ctx)
    }

    #[test]
    fn test_field_byte_order_and_store_type() {
        let mut f = field(u16::field_kind());
        f.byte_order = Some(ByteOrder::BigEndian);
        f.store_type = Some(WireType::U32);
        let bytes = encode(&0x0102u16, &f);
        assert_eq!(bytes, vec![0, 0, 1, 2]);
        assert_eq!(decode::<u16>(bytes, &f).expect("decode"), 0x0102);
    }

    #[test]
    fn test_none_guid_writes_zero_bytes() {
        let f = field(<Option<Guid>>::field_kind());
        let bytes = encode(&None::<Guid>, &f);
        assert_eq!(bytes, vec![0u8; 16]);
        assert_eq!(decode::<Option<Guid>>(bytes, &f).expect("decode"), Some(Guid::nil()));
    }

    #[test]
    fn test_prefixed_collection() {
        let f = field(FieldKind::collection(
            FieldKind::Primitive(WireType::U16),
            CollectionCount::Prefixed(WireType::U8),
        ));
        let bytes = encode(&vec![1u16, 2, 3], &f);
        assert_eq!(bytes, vec![3, 1, 0, 2, 0, 3, 0]);
        assert_eq!(decode::<Vec<u16>>(bytes, &f).expect("decode"), vec![1, 2, 3]);
    }

    #[test]
    fn test_collection_count_guards() {
        let f = field(<Vec<u8>>::field_kind());
        let err = decode::<Vec<u8>>((-1i32).to_le_bytes().to_vec(), &f).unwrap_err();
        assert!(matches!(err, Error::MalformedData { .. }));

        let config = CodecConfig::new().max_collection_count(2);
        let ambient = AmbientContext::new();
        let ctx = Context::new(None, &ambient);
        let mut reader = EndianReader::with_config(Cursor::new(vec![3, 0, 0, 0, 1, 2, 3]), config);
        assert!(<Vec<u8>>::decode(&mut reader, &f, &ctx).unwrap_err().is_data());

        let fixed = field(FieldKind::collection(
            FieldKind::Primitive(WireType::U8),
            CollectionCount::Fixed(2),
        ));
        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
        assert!(vec![1u8].encode(&mut writer, &fixed, &ctx).is_err());
    }

    #[test]
    fn test_string_list_uses_element_encoding() {
        let f = field(FieldKind::collection(
            FieldKind::String(StringEncoding::NullTerminated { max_length: None }),
            CollectionCount::Fixed(2),
        ));
        let bytes = encode(&vec!["ab".to_string(), "c".to_string()], &f);
        assert_eq!(bytes, b"ab\0c\0".to_vec());
        assert_eq!(
            decode::<Vec<String>>(bytes, &f).expect("decode"),
            vec!["ab".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_bufferable_big_endian_reverses_packs() {
        let mut f = field(Rgb16::field_kind());
        f.byte_order = Some(ByteOrder::BigEndian);
        let value = Rgb16 {
            r: 0x0102,
            g: 0x0304,
            b: 0x0506,
        };
        let bytes = encode(&value, &f);
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(decode::<Rgb16>(bytes, &f).expect("decode"), value);
    }

    #[test]
    fn test_bufferable_array_single_block() {
        let values = vec![Rgb16 { r: 1, g: 2, b: 3 }, Rgb16 { r: 4, g: 5, b: 6 }];
        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
        write_bufferable_array(&mut writer, &values, ByteOrder::LittleEndian).expect("write");
        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len(), 12);

        let mut reader = EndianReader::new(Cursor::new(bytes), ByteOrder::LittleEndian);
        let back: Vec<Rgb16> =
            read_bufferable_array(&mut reader, 2, ByteOrder::LittleEndian).expect("read");
        assert_eq!(back, values);
    }
}
