// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::unreadable_literal)] // Large test constants
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! Runtime records and derived types share one walker: equal layouts give
//! equal bytes.

use binform::{
    BinaryEnum, BinaryObject, ByteOrder, DynamicObject, EndianReader, EndianWriter, FieldBuilder,
    FieldKind, LayoutBuilder, LayoutRegistry, Value,
};
use std::io::Cursor;
use std::sync::Arc;

#[derive(BinaryEnum, Debug, Clone, Copy, Default, PartialEq)]
#[repr(u16)]
enum Kind {
    #[default]
    Idle = 0,
    Active = 1,
}

#[derive(BinaryObject, Debug, Default, PartialEq)]
struct Entry {
    #[binform(offset = 0, version_number)]
    version: u16,
    #[binform(offset = 2)]
    kind: Kind,
    #[binform(offset = 4, fixed_length = 12, trim)]
    name: String,
    #[binform(offset = 16, count_type = "u8")]
    samples: Vec<u16>,
    #[binform(offset(value = 0x30, min_version = 2), store_type = "u16")]
    checksum: u32,
}

#[derive(BinaryObject, Debug, Default, PartialEq)]
#[binform(byte_order = "big")]
struct Vec2 {
    #[binform(offset = 0)]
    x: i16,
    #[binform(offset = 2)]
    y: i16,
}

#[derive(BinaryObject, Debug, Default, PartialEq)]
struct Marker {
    #[binform(offset = 0)]
    id: u8,
    #[binform(offset = 1)]
    at: Vec2,
}

fn entry() -> Entry {
    Entry {
        version: 3,
        kind: Kind::Active,
        name: "sensor".into(),
        samples: vec![10, 20, 65535],
        checksum: 0xBEEF,
    }
}

fn to_vec<F>(write: F) -> Vec<u8>
where
    F: FnOnce(&mut EndianWriter<Cursor<Vec<u8>>>) -> binform::Result<()>,
{
    let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
    write(&mut writer).expect("encode");
    writer.into_inner().into_inner()
}

#[test]
fn test_registered_layout_matches_derived_bytes() {
    let registry = LayoutRegistry::new();
    registry.register_type::<Entry>().expect("register");
    let layout = registry.get("Entry").expect("registered");

    let mut dynamic = DynamicObject::new(Arc::clone(&layout));
    dynamic.set("version", 3u16).expect("version");
    dynamic.set("kind", 1i64).expect("kind");
    dynamic.set("name", "sensor").expect("name");
    dynamic
        .set("samples", vec![Value::UInt(10), Value::UInt(20), Value::UInt(65535)])
        .expect("samples");
    dynamic.set("checksum", 0xBEEFu32).expect("checksum");

    let derived_bytes = to_vec(|w| w.write_object(&entry()));
    let dynamic_bytes = to_vec(|w| w.write_dynamic(&dynamic, None));
    assert_eq!(derived_bytes, dynamic_bytes);
    assert_eq!(derived_bytes.len(), 0x32);

    let mut reader = EndianReader::new(Cursor::new(derived_bytes), ByteOrder::LittleEndian);
    let decoded = reader.read_dynamic(&layout, None).expect("decode");
    assert_eq!(decoded, dynamic);
    assert_eq!(decoded.get("name").and_then(Value::as_str), Some("sensor"));
}

#[test]
fn test_old_version_drops_scoped_field_on_both_sides() {
    let layout = Arc::new(<Entry as BinaryObject>::layout().expect("layout").clone());
    let mut dynamic = DynamicObject::new(Arc::clone(&layout));
    dynamic.set("version", 1u16).expect("version");
    dynamic.set("name", "old").expect("name");
    dynamic.set("checksum", 0xFFFFu32).expect("checksum");

    let derived = Entry {
        version: 1,
        name: "old".into(),
        checksum: 0xFFFF,
        ..Entry::default()
    };

    let derived_bytes = to_vec(|w| w.write_object(&derived));
    let dynamic_bytes = to_vec(|w| w.write_dynamic(&dynamic, None));
    assert_eq!(derived_bytes, dynamic_bytes);
    // Count prefix of the empty sample list is the last byte written.
    assert_eq!(derived_bytes.len(), 17);
}

#[test]
fn test_nested_runtime_layout_matches_derived() {
    let registry = LayoutRegistry::new();
    let vec2 = registry.register_type::<Vec2>().expect("vec2");

    let marker = Arc::new(
        LayoutBuilder::new("Marker")
            .field(FieldBuilder::of::<u8>("id").offset(0))
            .field(FieldBuilder::new("at", FieldKind::object(Arc::clone(&vec2))).offset(1))
            .build()
            .expect("marker"),
    );

    let mut at = DynamicObject::new(Arc::clone(&vec2));
    at.set("x", 258i16).expect("x");
    at.set("y", -1i16).expect("y");
    let mut dynamic = DynamicObject::new(Arc::clone(&marker));
    dynamic.set("id", 9u8).expect("id");
    dynamic.set("at", at).expect("at");

    let derived = Marker { id: 9, at: Vec2 { x: 258, y: -1 } };

    let derived_bytes = to_vec(|w| w.write_object(&derived));
    let dynamic_bytes = to_vec(|w| w.write_dynamic(&dynamic, None));
    assert_eq!(derived_bytes, vec![9, 1, 2, 0xFF, 0xFF]);
    assert_eq!(derived_bytes, dynamic_bytes);

    let mut reader = EndianReader::new(Cursor::new(dynamic_bytes), ByteOrder::LittleEndian);
    assert_eq!(reader.read_object::<Marker>().expect("decode"), derived);
}

#[test]
fn test_null_writes_zero_value() {
    let layout = Arc::new(<Vec2 as BinaryObject>::layout().expect("layout").clone());
    let mut dynamic = DynamicObject::new(layout);
    dynamic.set("x", Value::Null).expect("x");
    dynamic.set("y", 7i16).expect("y");

    let bytes = to_vec(|w| w.write_dynamic(&dynamic, None));
    assert_eq!(bytes, vec![0, 0, 0, 7]);
}

#[test]
fn test_derived_nested_kind_needs_runtime_layout() {
    let layout = Arc::new(<Marker as BinaryObject>::layout().expect("layout").clone());
    let dynamic = DynamicObject::new(layout);

    let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
    let err = writer.write_dynamic(&dynamic, None).unwrap_err();
    assert!(err.is_configuration(), "{err}");
}
