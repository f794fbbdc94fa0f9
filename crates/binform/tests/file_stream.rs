// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::cast_possible_truncation)] // Test parameters

//! File-backed streams: records at arbitrary stream positions, virtual
//! origins and in-place insertion.

use binform::{BinaryObject, ByteOrder, CodecConfig, EndianReader, EndianWriter};
use std::io::{Seek, SeekFrom};

#[derive(BinaryObject, Debug, Default, Clone, PartialEq)]
#[binform(byte_order = "big")]
struct FileHeader {
    #[binform(offset = 0, fixed_length = 4)]
    magic: String,
    #[binform(offset = 4, version_number)]
    version: u16,
    #[binform(offset = 6)]
    count: u16,
}

#[derive(BinaryObject, Debug, Default, Clone, PartialEq)]
struct Item {
    #[binform(offset = 0, size_cursor)]
    size: u16,
    #[binform(offset = 2, length_prefixed)]
    label: String,
}

fn item(label: &str) -> Item {
    Item {
        size: (2 + 4 + label.len()) as u16,
        label: label.into(),
    }
}

#[test]
fn test_tempfile_round_trip() {
    let file = tempfile::tempfile().expect("tempfile");
    let header = FileHeader { magic: "BNFM".into(), version: 1, count: 3 };
    let items = vec![item("alpha"), item("b"), item("")];

    let mut writer = EndianWriter::new(file, ByteOrder::LittleEndian);
    writer.write_object(&header).expect("header");
    writer.write_array(&items, None).expect("items");
    assert_eq!(writer.position().expect("position"), 8 + 11 + 7 + 6);
    writer.flush().expect("flush");

    let mut file = writer.into_inner();
    file.seek(SeekFrom::Start(0)).expect("rewind");

    let mut reader = EndianReader::new(file, ByteOrder::LittleEndian);
    let decoded: FileHeader = reader.read_object().expect("header");
    assert_eq!(decoded, header);
    let decoded_items: Vec<Item> = reader
        .read_array(usize::from(decoded.count), None)
        .expect("items");
    assert_eq!(decoded_items, items);
    assert_eq!(reader.remaining().expect("remaining"), 0);
}

#[test]
fn test_virtual_reader_offsets_are_relative() {
    let file = tempfile::tempfile().expect("tempfile");
    let mut writer = EndianWriter::new(file, ByteOrder::LittleEndian);
    writer.fill(0xCC, 10).expect("preamble");
    writer.write_object(&item("nested")).expect("item");

    let mut file = writer.into_inner();
    file.seek(SeekFrom::Start(10)).expect("seek");
    let mut reader = EndianReader::new(file, ByteOrder::LittleEndian);
    let mut sub = reader.virtual_reader().expect("virtual");
    assert_eq!(sub.position().expect("position"), 0);
    assert_eq!(sub.read_object::<Item>().expect("item"), item("nested"));
    assert_eq!(sub.position().expect("position"), 12);
    assert_eq!(sub.absolute_position().expect("absolute"), 22);
}

#[test]
fn test_insert_record_shifts_tail() {
    let file = tempfile::tempfile().expect("tempfile");
    let mut writer = EndianWriter::new(file, ByteOrder::LittleEndian);
    writer.write_object(&item("first")).expect("first");
    let split = writer.position().expect("split");
    writer.write_object(&item("third")).expect("third");

    // Serialize the middle record, then splice it in.
    let middle = binform::to_bytes(&item("second"), ByteOrder::LittleEndian).expect("middle");
    writer.seek_to(split).expect("seek");
    writer.insert(&middle).expect("insert");
    assert_eq!(writer.position().expect("position"), split + middle.len() as u64);

    let mut file = writer.into_inner();
    file.seek(SeekFrom::Start(0)).expect("rewind");
    let mut reader = EndianReader::new(file, ByteOrder::LittleEndian);
    let records: Vec<Item> = reader.read_array(3, None).expect("records");
    assert_eq!(records, vec![item("first"), item("second"), item("third")]);
}

#[test]
fn test_config_bounds_apply_to_file_streams() {
    let file = tempfile::tempfile().expect("tempfile");
    let mut writer = EndianWriter::new(file, ByteOrder::LittleEndian);
    writer.write_object(&item("too long for the limit")).expect("item");

    let mut file = writer.into_inner();
    file.seek(SeekFrom::Start(0)).expect("rewind");
    let config = CodecConfig::new().max_string_length(8);
    let mut reader = EndianReader::with_config(file, config);
    let err = reader.read_object::<Item>().unwrap_err();
    assert!(err.is_data(), "{err}");
    assert_eq!(err.field_context().map(|c| c.offset), Some(2));
}

#[cfg(feature = "config-loaders")]
#[test]
fn test_config_from_yaml_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "byte_order: big_endian").expect("write");
    writeln!(file, "max_collection_count: 16").expect("write");

    let config = CodecConfig::from_yaml_file(file.path()).expect("config");
    assert_eq!(config.byte_order, ByteOrder::BigEndian);
    assert_eq!(config.max_collection_count, 16);
}
