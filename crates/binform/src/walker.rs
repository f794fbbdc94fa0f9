// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object graph walker.
//!
//! Drives one structure through a stream: establishes the effective version,
//! resolves the layout, visits the present fields in ascending offset order
//! (or declaration order for positional layouts) and leaves the cursor at the
//! structure's final position.
//!
//! # Architecture
//!
//! - [`FieldAccess`]: index-based access to the fields of one value. The
//!   derive macro implements it for structs; [`DynamicObject`] implements it
//!   over a runtime layout.
//! - [`BinaryObject`]: a [`FieldAccess`] type with a static layout and a
//!   construction path.
//! - [`decode_into`] / [`encode_from`]: the per-field loop shared by both.
//!
//! Nested structures run on the same reader. Their byte order is applied by
//! swapping the reader's default for the duration of the nested call; offsets
//! are taken from the absolute stream position where the nested structure
//! starts.
//!
//! [`DynamicObject`]: crate::dynamic::DynamicObject

use crate::codec::{read_scalar, write_scalar, FieldCodec, Scalar, WireType};
use crate::construct::ConstructionStrategy;
use crate::context::{AmbientContext, Context};
use crate::cursor::CursorTracker;
use crate::error::{Error, FieldContext, Result};
use crate::flat;
use crate::io::{EndianReader, EndianWriter};
use crate::layout::{ResolvedField, ResolvedLayout, StructureLayout};
use crate::order::ByteOrder;
use std::io::{Cursor, Read, Seek, Write};

/// Index-based access to the fields of one value.
///
/// `index` is the declaration index of the field in the value's
/// [`StructureLayout`].
pub trait FieldAccess {
    fn read_field<R: Read + Seek>(
        &mut self,
        index: usize,
        reader: &mut EndianReader<R>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<()>;

    fn write_field<W: Write + Seek>(
        &self,
        index: usize,
        writer: &mut EndianWriter<W>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<()>;

    /// Numeric value of a field (version number, size cursor).
    fn field_scalar(&self, index: usize) -> Option<Scalar>;
}

/// A Rust type with a static binary layout.
pub trait BinaryObject: FieldAccess + Sized {
    /// The type's layout, built once on first use.
    fn layout() -> Result<&'static StructureLayout>;

    /// Produce an empty instance through `strategy`, if the type supports it.
    fn instantiate(strategy: ConstructionStrategy) -> Option<Self>;

    /// Build an instance by reading the constructor parameters in order.
    fn read_positional<R: Read + Seek>(
        layout: &ResolvedLayout,
        reader: &mut EndianReader<R>,
        ctx: &Context<'_>,
    ) -> Result<Self> {
        let _ = (reader, ctx);
        Err(Error::NoConstructionStrategy {
            structure: layout.structure.clone(),
        })
    }
}

fn field_context(resolved: &ResolvedLayout, field: &ResolvedField, start: u64) -> FieldContext {
    FieldContext::new(&resolved.structure, &field.name, field.kind.to_string(), start)
}

fn size_cursor_value(
    scalar: Option<Scalar>,
    resolved: &ResolvedLayout,
    field: &ResolvedField,
    start: u64,
) -> Result<u64> {
    let value = scalar.and_then(Scalar::to_u64).ok_or_else(|| {
        Error::malformed(start, "size cursor does not hold a valid size")
            .in_field(|| field_context(resolved, field, start))
    })?;
    log::trace!("[walker] {}.{} size cursor = {}", resolved.structure, field.name, value);
    Ok(value)
}

/// Byte order the version field is read with before the version is known.
fn version_field_order(layout: &StructureLayout, default: ByteOrder) -> ByteOrder {
    let field_order = layout
        .version_field()
        .and_then(|field| field.byte_orders().iter().next().map(|(order, _)| *order));
    let structure_order = layout
        .byte_orders()
        .iter()
        .find(|(_, range)| range.is_unbounded())
        .map(|(order, _)| *order);
    field_order.or(structure_order).unwrap_or(default)
}

/// Read the self-described version of the structure starting at `origin`.
///
/// The stream is returned to `origin` afterwards.
fn read_version<R: Read + Seek>(
    layout: &StructureLayout,
    reader: &mut EndianReader<R>,
    origin: u64,
) -> Result<Option<f64>> {
    let Some(field) = layout.version_field() else {
        return Ok(None);
    };
    let Some((offset, _)) = field.offsets().iter().next() else {
        return Ok(None);
    };
    let wire = field
        .store_types()
        .iter()
        .next()
        .map(|(wire, _)| *wire)
        .or_else(|| field.kind().wire_type())
        .unwrap_or(WireType::I32);
    let order = version_field_order(layout, reader.byte_order());
    let start = origin + offset;
    let context = || {
        FieldContext::new(layout.name(), field.name(), field.kind().to_string(), start)
    };

    reader.seek_absolute(start)?;
    let raw = read_scalar(reader, wire, order).map_err(|e| e.in_field(context))?;
    let version = raw
        .to_f64()
        .ok_or_else(|| Error::malformed(start, format!("invalid version {}", raw)).in_field(context))?;
    reader.seek_absolute(origin)?;

    log::debug!("[walker] {} self-describes version {}", layout.name(), version);
    Ok(Some(version))
}

/// Decode the present fields of `layout` into `target`.
///
/// The explicit version in `ctx` wins; otherwise the layout's version field
/// is read first. On return the reader sits at the structure's final
/// position.
pub fn decode_into<T: FieldAccess, R: Read + Seek>(
    target: &mut T,
    layout: &StructureLayout,
    reader: &mut EndianReader<R>,
    ctx: &Context<'_>,
) -> Result<()> {
    let origin = reader.absolute_position()?;
    let version = match ctx.version {
        Some(version) => Some(version),
        None => read_version(layout, reader, origin)?,
    };
    let resolved = layout.resolve(version)?;
    let ctx = ctx.with_version(version);

    if let Some(size) = resolved.flat_size {
        return flat::decode_flat(target, &resolved, size, reader, &ctx);
    }

    let mut tracker = CursorTracker::new(origin);
    for field in &resolved.fields {
        let start = match field.offset {
            Some(offset) => {
                reader.seek_absolute(origin + offset)?;
                origin + offset
            }
            None => reader.absolute_position()?,
        };
        log::trace!("[walker] read {}.{} @ 0x{:X}", resolved.structure, field.name, start);

        target
            .read_field(field.index, reader, field, &ctx)
            .map_err(|e| e.in_field(|| field_context(&resolved, field, start)))?;
        tracker.record(reader.absolute_position()?);

        if field.size_cursor {
            let size = size_cursor_value(target.field_scalar(field.index), &resolved, field, start)?;
            tracker.set_size_cursor(size);
        }
    }

    let end = tracker.finish(resolved.total_size, reader.absolute_position()?);
    reader.seek_absolute(end)
}

/// Encode the present fields of `layout` from `source`.
///
/// The version field, when present, receives the effective version. Bytes of
/// absent fields are left untouched; the stream is zero-extended when the
/// final position lies past its end.
pub fn encode_from<T: FieldAccess, W: Write + Seek>(
    source: &T,
    layout: &StructureLayout,
    writer: &mut EndianWriter<W>,
    ctx: &Context<'_>,
) -> Result<()> {
    let origin = writer.absolute_position()?;
    let version = match ctx.version {
        Some(version) => Some(version),
        None => layout
            .version_field()
            .and_then(|field| source.field_scalar(field.index()))
            .and_then(Scalar::to_f64),
    };
    let resolved = layout.resolve(version)?;
    let ctx = ctx.with_version(version);

    if let Some(size) = resolved.flat_size {
        return flat::encode_flat(source, &resolved, size, writer, &ctx);
    }

    let mut tracker = CursorTracker::new(origin);
    for field in &resolved.fields {
        let start = match field.offset {
            Some(offset) => {
                writer.seek_absolute(origin + offset)?;
                origin + offset
            }
            None => writer.absolute_position()?,
        };
        log::trace!("[walker] write {}.{} @ 0x{:X}", resolved.structure, field.name, start);

        let written = match (field.version_number, version) {
            (true, Some(version)) => {
                let wire = field.wire_type().unwrap_or(WireType::F64);
                let order = field.byte_order_or(writer.byte_order());
                write_scalar(writer, wire, order, Scalar::Float(version))
            }
            _ => source.write_field(field.index, writer, field, &ctx),
        };
        written.map_err(|e| e.in_field(|| field_context(&resolved, field, start)))?;
        tracker.record(writer.absolute_position()?);

        if field.size_cursor {
            let size = size_cursor_value(source.field_scalar(field.index), &resolved, field, start)?;
            tracker.set_size_cursor(size);
        }
    }

    let end = tracker.finish(resolved.total_size, writer.absolute_position()?);
    let len = writer.stream_len()?;
    if end > len {
        writer.seek_absolute(len)?;
        writer.fill(0, (end - len) as usize)?;
    }
    writer.seek_absolute(end)
}

/// Decode a `T` at the current position.
pub fn decode<T: BinaryObject, R: Read + Seek>(
    reader: &mut EndianReader<R>,
    ctx: &Context<'_>,
) -> Result<T> {
    let layout = T::layout()?;
    match layout.strategy()? {
        ConstructionStrategy::PositionalConstructor => {
            let origin = reader.absolute_position()?;
            let resolved = layout.resolve(ctx.version)?;
            let value = T::read_positional(&resolved, reader, ctx)?;

            let mut tracker = CursorTracker::new(origin);
            if let Some(cursor) = resolved.size_cursor() {
                let size =
                    size_cursor_value(value.field_scalar(cursor.index), &resolved, cursor, origin)?;
                tracker.set_size_cursor(size);
            }
            let end = tracker.finish(resolved.total_size, reader.absolute_position()?);
            reader.seek_absolute(end)?;
            Ok(value)
        }
        strategy => {
            let mut value = T::instantiate(strategy).ok_or_else(|| Error::NoConstructionStrategy {
                structure: layout.name().to_string(),
            })?;
            decode_into(&mut value, layout, reader, ctx)?;
            Ok(value)
        }
    }
}

/// Encode `value` at the current position.
pub fn encode<T: BinaryObject, W: Write + Seek>(
    value: &T,
    writer: &mut EndianWriter<W>,
    ctx: &Context<'_>,
) -> Result<()> {
    encode_from(value, T::layout()?, writer, ctx)
}

/// Run `f` with the reader's default byte order replaced by `order`.
pub fn with_reader_order<R: Read + Seek, T>(
    reader: &mut EndianReader<R>,
    order: Option<ByteOrder>,
    f: impl FnOnce(&mut EndianReader<R>) -> Result<T>,
) -> Result<T> {
    let Some(order) = order else {
        return f(reader);
    };
    let saved = reader.byte_order();
    reader.set_byte_order(order);
    let result = f(reader);
    reader.set_byte_order(saved);
    result
}

/// Run `f` with the writer's default byte order replaced by `order`.
pub fn with_writer_order<W: Write + Seek, T>(
    writer: &mut EndianWriter<W>,
    order: Option<ByteOrder>,
    f: impl FnOnce(&mut EndianWriter<W>) -> Result<T>,
) -> Result<T> {
    let Some(order) = order else {
        return f(writer);
    };
    let saved = writer.byte_order();
    writer.set_byte_order(order);
    let result = f(writer);
    writer.set_byte_order(saved);
    result
}

/// Decode a nested structure held by `field`.
///
/// The field's byte order becomes the nested structure's stream default.
pub fn decode_nested<T: BinaryObject, R: Read + Seek>(
    reader: &mut EndianReader<R>,
    field: &ResolvedField,
    ctx: &Context<'_>,
) -> Result<T> {
    with_reader_order(reader, field.byte_order, |reader| decode::<T, R>(reader, ctx))
}

pub fn encode_nested<T: BinaryObject, W: Write + Seek>(
    value: &T,
    writer: &mut EndianWriter<W>,
    field: &ResolvedField,
    ctx: &Context<'_>,
) -> Result<()> {
    with_writer_order(writer, field.byte_order, |writer| encode(value, writer, ctx))
}

/// Read one constructor parameter of a positional layout.
pub fn read_positional_field<F: FieldCodec, R: Read + Seek>(
    reader: &mut EndianReader<R>,
    layout: &ResolvedLayout,
    field: &ResolvedField,
    ctx: &Context<'_>,
) -> Result<F> {
    let start = reader.absolute_position()?;
    log::trace!("[walker] read {}.{} @ 0x{:X}", layout.structure, field.name, start);
    F::decode(reader, field, ctx).map_err(|e| e.in_field(|| field_context(layout, field, start)))
}

impl<R: Read + Seek> EndianReader<R> {
    /// Decode a `T`, taking the version from its version field if it has one.
    pub fn read_object<T: BinaryObject>(&mut self) -> Result<T> {
        self.read_object_with(None, &AmbientContext::new())
    }

    /// Decode a `T` at an explicit version.
    pub fn read_object_versioned<T: BinaryObject>(&mut self, version: f64) -> Result<T> {
        self.read_object_with(Some(version), &AmbientContext::new())
    }

    pub fn read_object_with<T: BinaryObject>(
        &mut self,
        version: Option<f64>,
        ambient: &AmbientContext<'_>,
    ) -> Result<T> {
        decode::<T, R>(self, &Context::new(version, ambient))
    }

    /// Populate an existing instance.
    pub fn read_object_into<T: BinaryObject>(
        &mut self,
        target: &mut T,
        version: Option<f64>,
    ) -> Result<()> {
        let ambient = AmbientContext::new();
        decode_into(target, T::layout()?, self, &Context::new(version, &ambient))
    }

    /// Decode `count` consecutive objects.
    pub fn read_array<T: BinaryObject>(
        &mut self,
        count: usize,
        version: Option<f64>,
    ) -> Result<Vec<T>> {
        let ambient = AmbientContext::new();
        let ctx = Context::new(version, &ambient);
        let mut items = Vec::with_capacity(count.min(self.remaining()? as usize));
        for _ in 0..count {
            items.push(decode::<T, R>(self, &ctx)?);
        }
        Ok(items)
    }
}

impl<W: Write + Seek> EndianWriter<W> {
    pub fn write_object<T: BinaryObject>(&mut self, value: &T) -> Result<()> {
        self.write_object_with(value, None, &AmbientContext::new())
    }

    /// Encode at an explicit version; the version field receives `version`.
    pub fn write_object_versioned<T: BinaryObject>(&mut self, value: &T, version: f64) -> Result<()> {
        self.write_object_with(value, Some(version), &AmbientContext::new())
    }

    pub fn write_object_with<T: BinaryObject>(
        &mut self,
        value: &T,
        version: Option<f64>,
        ambient: &AmbientContext<'_>,
    ) -> Result<()> {
        encode(value, self, &Context::new(version, ambient))
    }

    /// Encode consecutive objects without a count prefix.
    pub fn write_array<T: BinaryObject>(&mut self, values: &[T], version: Option<f64>) -> Result<()> {
        let ambient = AmbientContext::new();
        let ctx = Context::new(version, &ambient);
        for value in values {
            encode(value, self, &ctx)?;
        }
        Ok(())
    }
}

/// Decode a `T` from the start of `bytes`.
pub fn from_bytes<T: BinaryObject>(bytes: &[u8], byte_order: ByteOrder) -> Result<T> {
    EndianReader::new(Cursor::new(bytes), byte_order).read_object()
}

/// Encode `value` into a fresh buffer.
pub fn to_bytes<T: BinaryObject>(value: &T, byte_order: ByteOrder) -> Result<Vec<u8>> {
    let mut writer = EndianWriter::new(Cursor::new(Vec::new()), byte_order);
    writer.write_object(value)?;
    Ok(writer.into_inner().into_inner())
}
