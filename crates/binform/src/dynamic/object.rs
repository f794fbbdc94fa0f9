// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Records described only by a runtime [`StructureLayout`].

use super::Value;
use crate::codec::{
    read_collection_count, read_scalar, read_string, reverse_packs, write_collection_count,
    write_scalar, write_string, Scalar,
};
use crate::context::{AmbientContext, Context};
use crate::error::{Error, Result};
use crate::io::{EndianReader, EndianWriter};
use crate::layout::{FieldKind, ResolvedField, StructureLayout};
use crate::order::ByteOrder;
use crate::walker::{decode_into, encode_from, with_reader_order, with_writer_order, FieldAccess};
use std::io::{Read, Seek, Write};
use std::sync::Arc;

/// A record whose shape is a [`StructureLayout`] built at runtime.
///
/// Values are stored by declaration index and start as the zero value of
/// each field kind. Decoding and encoding go through the same walker as
/// derived types, so both produce identical bytes for equivalent layouts.
#[derive(Debug, Clone)]
pub struct DynamicObject {
    layout: Arc<StructureLayout>,
    values: Vec<Value>,
}

impl DynamicObject {
    pub fn new(layout: Arc<StructureLayout>) -> Self {
        let values = layout
            .fields()
            .iter()
            .map(|field| Value::default_for(field.kind()))
            .collect();
        Self { layout, values }
    }

    pub fn layout(&self) -> &Arc<StructureLayout> {
        &self.layout
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.layout.field(name)?.index();
        self.values.get(index)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let index = self.layout.field(name)?.index();
        self.values.get_mut(index)
    }

    /// Replace the value of field `name`.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = match self.layout.field(name) {
            Some(field) => field.index(),
            None => {
                return Err(Error::invalid_layout(
                    self.layout.name(),
                    format!("no field named '{}'", name),
                ))
            }
        };
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.into();
        }
        Ok(())
    }

    /// Fields in declaration order with their current values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.layout
            .fields()
            .iter()
            .map(|field| field.name())
            .zip(self.values.iter())
    }

    /// Decode a record of `layout` at the reader's position.
    pub fn decode<R: Read + Seek>(
        layout: Arc<StructureLayout>,
        reader: &mut EndianReader<R>,
        ctx: &Context<'_>,
    ) -> Result<Self> {
        let mut object = Self::new(layout);
        let layout = Arc::clone(&object.layout);
        decode_into(&mut object, &layout, reader, ctx)?;
        Ok(object)
    }

    pub fn encode<W: Write + Seek>(&self, writer: &mut EndianWriter<W>, ctx: &Context<'_>) -> Result<()> {
        encode_from(self, &self.layout, writer, ctx)
    }
}

impl PartialEq for DynamicObject {
    fn eq(&self, other: &Self) -> bool {
        self.layout.name() == other.layout.name() && self.values == other.values
    }
}

fn mismatch(offset: u64, value: &Value, kind: &FieldKind) -> Error {
    Error::malformed(
        offset,
        format!("{} value does not match field kind {}", value.type_name(), kind),
    )
}

fn nested_layout<'k>(kind: &'k FieldKind) -> Result<&'k Arc<StructureLayout>> {
    match kind {
        FieldKind::Object {
            layout: Some(layout),
            ..
        } => Ok(layout),
        FieldKind::Object { type_name, .. } => Err(Error::invalid_layout(
            type_name.clone(),
            "runtime records need the nested structure's layout",
        )),
        other => Err(Error::invalid_layout(
            other.to_string(),
            "not a structure kind",
        )),
    }
}

fn read_value<R: Read + Seek>(
    reader: &mut EndianReader<R>,
    field: &ResolvedField,
    ctx: &Context<'_>,
) -> Result<Value> {
    let order = field.byte_order_or(reader.byte_order());
    match &field.kind {
        FieldKind::Primitive(wire) => {
            let raw = read_scalar(reader, field.store_type.unwrap_or(*wire), order)?;
            Ok(Value::from_scalar(*wire, raw))
        }
        FieldKind::Enum { underlying, .. } => {
            let offset = reader.absolute_position()?;
            let raw = read_scalar(reader, field.store_type.unwrap_or(*underlying), order)?;
            raw.to_i64()
                .map(Value::Int)
                .ok_or_else(|| Error::malformed(offset, format!("invalid discriminant {}", raw)))
        }
        FieldKind::String(encoding) => Ok(Value::String(read_string(reader, encoding, order)?)),
        FieldKind::Buffer { size, pack_size, .. } => {
            let mut bytes = reader.read_bytes(*size)?;
            if order == ByteOrder::BigEndian {
                reverse_packs(&mut bytes, *pack_size);
            }
            Ok(Value::Bytes(bytes))
        }
        FieldKind::Object { .. } => {
            let layout = Arc::clone(nested_layout(&field.kind)?);
            with_reader_order(reader, field.byte_order, |reader| {
                DynamicObject::decode(layout, reader, ctx).map(Value::Object)
            })
        }
        FieldKind::Collection { .. } => {
            let count = read_collection_count(reader, field)?;
            let element = field.element();
            let mut items = Vec::with_capacity(count.min(reader.remaining()? as usize));
            for _ in 0..count {
                items.push(read_value(reader, &element, ctx)?);
            }
            Ok(Value::List(items))
        }
    }
}

fn write_value<W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    value: &Value,
    field: &ResolvedField,
    ctx: &Context<'_>,
) -> Result<()> {
    if value.is_null() {
        let default = Value::default_for(&field.kind);
        if default.is_null() {
            return Err(Error::invalid_layout(
                field.kind.to_string(),
                format!("field '{}' has no default value", field.name),
            ));
        }
        return write_value(writer, &default, field, ctx);
    }

    let order = field.byte_order_or(writer.byte_order());
    let offset = writer.absolute_position()?;
    match (&field.kind, value) {
        (FieldKind::Primitive(wire), value) => {
            let scalar = value
                .to_scalar()
                .ok_or_else(|| mismatch(offset, value, &field.kind))?;
            write_scalar(writer, field.store_type.unwrap_or(*wire), order, scalar)
        }
        (FieldKind::Enum { underlying, .. }, value) => {
            let scalar = value
                .to_scalar()
                .filter(|s| !matches!(s, Scalar::Guid(_)))
                .ok_or_else(|| mismatch(offset, value, &field.kind))?;
            write_scalar(writer, field.store_type.unwrap_or(*underlying), order, scalar)
        }
        (FieldKind::String(encoding), Value::String(s)) => write_string(writer, s, encoding, order),
        (FieldKind::Buffer { size, pack_size, .. }, Value::Bytes(bytes)) => {
            if bytes.len() != *size {
                return Err(Error::malformed(
                    offset,
                    format!("buffer holds {} bytes, layout expects {}", bytes.len(), size),
                ));
            }
            let mut block = bytes.clone();
            if order == ByteOrder::BigEndian {
                reverse_packs(&mut block, *pack_size);
            }
            writer.write_bytes(&block)
        }
        (FieldKind::Object { .. }, Value::Object(object)) => {
            with_writer_order(writer, field.byte_order, |writer| object.encode(writer, ctx))
        }
        (FieldKind::Collection { .. }, Value::List(items)) => {
            write_collection_count(writer, field, items.len())?;
            let element = field.element();
            for item in items {
                write_value(writer, item, &element, ctx)?;
            }
            Ok(())
        }
        (kind, value) => Err(mismatch(offset, value, kind)),
    }
}

impl FieldAccess for DynamicObject {
    fn read_field<R: Read + Seek>(
        &mut self,
        index: usize,
        reader: &mut EndianReader<R>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<()> {
        let value = read_value(reader, field, ctx)?;
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
        Ok(())
    }

    fn write_field<W: Write + Seek>(
        &self,
        index: usize,
        writer: &mut EndianWriter<W>,
        field: &ResolvedField,
        ctx: &Context<'_>,
    ) -> Result<()> {
        match self.values.get(index) {
            Some(value) => write_value(writer, value, field, ctx),
            None => write_value(writer, &Value::Null, field, ctx),
        }
    }

    fn field_scalar(&self, index: usize) -> Option<Scalar> {
        self.values.get(index).and_then(Value::to_scalar)
    }
}

impl<R: Read + Seek> EndianReader<R> {
    /// Decode a record of a runtime layout.
    pub fn read_dynamic(
        &mut self,
        layout: &Arc<StructureLayout>,
        version: Option<f64>,
    ) -> Result<DynamicObject> {
        let ambient = AmbientContext::new();
        DynamicObject::decode(Arc::clone(layout), self, &Context::new(version, &ambient))
    }
}

impl<W: Write + Seek> EndianWriter<W> {
    pub fn write_dynamic(&mut self, object: &DynamicObject, version: Option<f64>) -> Result<()> {
        let ambient = AmbientContext::new();
        object.encode(self, &Context::new(version, &ambient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{StringEncoding, WireType};
    use crate::layout::{CollectionCount, FieldBuilder, LayoutBuilder};
    use crate::version::VersionRange;
    use std::io::Cursor;

    fn point() -> Arc<StructureLayout> {
        Arc::new(
            LayoutBuilder::new("Point")
                .field(FieldBuilder::new("x", FieldKind::Primitive(WireType::I16)).offset(0))
                .field(FieldBuilder::new("y", FieldKind::Primitive(WireType::I16)).offset(2))
                .build()
                .expect("point"),
        )
    }

    fn shape() -> Arc<StructureLayout> {
        Arc::new(
            LayoutBuilder::new("Shape")
                .field(
                    FieldBuilder::new(
                        "name",
                        FieldKind::String(StringEncoding::FixedLength {
                            length: 8,
                            trim: true,
                            padding: 0,
                        }),
                    )
                    .offset(0),
                )
                .field(FieldBuilder::new("origin", FieldKind::object(point())).offset(8))
                .field(
                    FieldBuilder::new(
                        "points",
                        FieldKind::collection(
                            FieldKind::object(point()),
                            CollectionCount::Prefixed(WireType::U16),
                        ),
                    )
                    .offset(12),
                )
                .field(
                    FieldBuilder::new("tag", FieldKind::Primitive(WireType::U32))
                        .offset_for(0x40, VersionRange::since(2.0)),
                )
                .build()
                .expect("shape"),
        )
    }

    fn at(layout: &Arc<StructureLayout>, x: i16, y: i16) -> DynamicObject {
        let mut p = DynamicObject::new(Arc::clone(layout));
        p.set("x", x).expect("x");
        p.set("y", y).expect("y");
        p
    }

    #[test]
    fn test_nested_round_trip() {
        let layout = shape();
        let point_layout = point();
        let mut object = DynamicObject::new(Arc::clone(&layout));
        object.set("name", "square").expect("name");
        object.set("origin", at(&point_layout, -1, 1)).expect("origin");
        object
            .set(
                "points",
                vec![
                    Value::Object(at(&point_layout, 0, 0)),
                    Value::Object(at(&point_layout, 4, 4)),
                ],
            )
            .expect("points");

        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::BigEndian);
        writer.write_dynamic(&object, Some(1.0)).expect("encode");
        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len(), 12 + 2 + 8);
        assert_eq!(&bytes[8..10], &(-1i16).to_be_bytes());

        let mut reader = EndianReader::new(Cursor::new(bytes), ByteOrder::BigEndian);
        let decoded = reader.read_dynamic(&layout, Some(1.0)).expect("decode");
        assert_eq!(decoded, object);
        assert_eq!(decoded.get("name").and_then(Value::as_str), Some("square"));
    }

    #[test]
    fn test_version_scoped_field_extends_record() {
        let layout = shape();
        let mut object = DynamicObject::new(Arc::clone(&layout));
        object.set("tag", 0xABCDu32).expect("tag");

        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
        writer.write_dynamic(&object, Some(2.0)).expect("encode");
        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len(), 0x44);
        assert_eq!(&bytes[0x40..], &0xABCDu32.to_le_bytes());
    }

    #[test]
    fn test_kind_mismatch_is_data_error() {
        let layout = point();
        let mut object = DynamicObject::new(layout);
        object.set("x", "text").expect("set");
        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
        let err = writer.write_dynamic(&object, None).unwrap_err();
        assert!(err.is_data());
        assert_eq!(err.field_context().map(|c| c.field.as_str()), Some("x"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut object = DynamicObject::new(point());
        let err = object.set("z", 1i16).unwrap_err();
        assert!(matches!(err, Error::InvalidLayout { ref structure, .. } if structure == "Point"));

        object.set("y", 5i16).expect("known field");
        assert_eq!(object.get("y"), Some(&Value::Int(5)));
    }
}
