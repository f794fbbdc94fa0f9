// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! String encodings.
//!
//! Text is UTF-8 on the wire. Invalid UTF-8 is a data error.
//!
//! | Encoding        | Read                                     | Write                                   |
//! |-----------------|------------------------------------------|-----------------------------------------|
//! | Length-prefixed | i32 length, then bytes                   | i32 length, then bytes                  |
//! | Fixed-length    | exactly N bytes, optional trim           | truncate or pad to N bytes              |
//! | Null-terminated | up to `\0` or max bytes, whichever first | bytes + `\0`, padded to max if declared |

use crate::config::DEFAULT_STRING_PADDING;
use crate::error::{Error, Result};
use crate::io::{EndianReader, EndianWriter};
use crate::order::ByteOrder;
use std::fmt;
use std::io::{Read, Seek, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringEncoding {
    /// Signed 32-bit byte count followed by the bytes.
    LengthPrefixed,
    /// Exactly `length` bytes.
    FixedLength { length: usize, trim: bool, padding: u8 },
    /// Bytes up to a `\0` terminator, optionally occupying exactly
    /// `max_length` bytes.
    NullTerminated { max_length: Option<usize> },
}

impl StringEncoding {
    pub const fn fixed(length: usize) -> Self {
        StringEncoding::FixedLength {
            length,
            trim: false,
            padding: DEFAULT_STRING_PADDING,
        }
    }

    /// Bytes occupied on the wire when that does not depend on the value.
    pub const fn fixed_size(&self) -> Option<usize> {
        match self {
            StringEncoding::FixedLength { length, .. } => Some(*length),
            StringEncoding::NullTerminated {
                max_length: Some(max),
            } => Some(*max),
            _ => None,
        }
    }
}

impl fmt::Display for StringEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringEncoding::LengthPrefixed => write!(f, "length-prefixed"),
            StringEncoding::FixedLength { length, .. } => write!(f, "fixed-length({})", length),
            StringEncoding::NullTerminated { max_length: None } => write!(f, "null-terminated"),
            StringEncoding::NullTerminated {
                max_length: Some(max),
            } => write!(f, "null-terminated({})", max),
        }
    }
}

fn decode_utf8(bytes: Vec<u8>, offset: u64) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        Error::malformed(
            offset + e.utf8_error().valid_up_to() as u64,
            "invalid UTF-8 in string",
        )
    })
}

/// Largest prefix of `value` no longer than `max` bytes that ends on a char boundary.
fn truncate_at_boundary(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

pub fn read_string<R: Read + Seek>(
    reader: &mut EndianReader<R>,
    encoding: &StringEncoding,
    order: ByteOrder,
) -> Result<String> {
    match *encoding {
        StringEncoding::LengthPrefixed => {
            let prefix_at = reader.absolute_position()?;
            let length = reader.read_i32_with(order)?;
            if length < 0 {
                return Err(Error::malformed(
                    prefix_at,
                    format!("negative string length {}", length),
                ));
            }
            let length = length as usize;
            if length > reader.config().max_string_length {
                return Err(Error::malformed(
                    prefix_at,
                    format!(
                        "string length {} exceeds limit {}",
                        length,
                        reader.config().max_string_length
                    ),
                ));
            }
            let start = reader.absolute_position()?;
            decode_utf8(reader.read_bytes(length)?, start)
        }
        StringEncoding::FixedLength {
            length,
            trim,
            padding,
        } => {
            let start = reader.absolute_position()?;
            let mut bytes = reader.read_bytes(length)?;
            if trim {
                while let Some(&last) = bytes.last() {
                    if last == padding || last.is_ascii_whitespace() {
                        bytes.pop();
                    } else {
                        break;
                    }
                }
            }
            decode_utf8(bytes, start)
        }
        StringEncoding::NullTerminated { max_length: None } => {
            let start = reader.absolute_position()?;
            let mut bytes = Vec::new();
            loop {
                match reader.read_u8() {
                    Ok(0) => break,
                    Ok(b) => bytes.push(b),
                    // End of stream terminates the string as well.
                    Err(Error::EndOfStream { .. }) => break,
                    Err(e) => return Err(e),
                }
            }
            decode_utf8(bytes, start)
        }
        StringEncoding::NullTerminated {
            max_length: Some(max),
        } => {
            let start = reader.absolute_position()?;
            let available = reader.remaining()?.min(max as u64) as usize;
            let mut bytes = reader.read_bytes(available)?;
            match bytes.iter().position(|&b| b == 0) {
                Some(nul) => bytes.truncate(nul),
                None if available < max => {
                    return Err(Error::EndOfStream {
                        offset: start,
                        needed: max,
                        field: None,
                    })
                }
                None => {}
            }
            decode_utf8(bytes, start)
        }
    }
}

pub fn write_string<W: Write + Seek>(
    writer: &mut EndianWriter<W>,
    value: &str,
    encoding: &StringEncoding,
    order: ByteOrder,
) -> Result<()> {
    match *encoding {
        StringEncoding::LengthPrefixed => {
            let offset = writer.absolute_position()?;
            let length = i32::try_from(value.len()).map_err(|_| {
                Error::malformed(
                    offset,
                    format!("string of {} bytes exceeds the 32-bit length prefix", value.len()),
                )
            })?;
            writer.write_i32_with(length, order)?;
            writer.write_bytes(value.as_bytes())
        }
        StringEncoding::FixedLength {
            length, padding, ..
        } => {
            let text = truncate_at_boundary(value, length);
            writer.write_bytes(text.as_bytes())?;
            writer.fill(padding, length - text.len())
        }
        StringEncoding::NullTerminated { max_length: None } => {
            writer.write_bytes(value.as_bytes())?;
            writer.write_u8(0)
        }
        StringEncoding::NullTerminated {
            max_length: Some(max),
        } => {
            if max == 0 {
                return Ok(());
            }
            // Always leave room for the terminator.
            let text = truncate_at_boundary(value, max - 1);
            writer.write_bytes(text.as_bytes())?;
            writer.fill(0, max - text.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use std::io::Cursor;

    fn encode(value: &str, encoding: StringEncoding) -> Vec<u8> {
        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
        write_string(&mut writer, value, &encoding, ByteOrder::LittleEndian).expect("write");
        writer.into_inner().into_inner()
    }

    fn decode(bytes: Vec<u8>, encoding: StringEncoding) -> Result<String> {
        let mut reader = EndianReader::new(Cursor::new(bytes), ByteOrder::LittleEndian);
        read_string(&mut reader, &encoding, ByteOrder::LittleEndian)
    }

    #[test]
    fn test_length_prefixed_big_endian_prefix() {
        let mut writer = EndianWriter::new(Cursor::new(Vec::new()), ByteOrder::LittleEndian);
        write_string(&mut writer, "abc", &StringEncoding::LengthPrefixed, ByteOrder::BigEndian)
            .expect("write");
        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes, vec![0, 0, 0, 3, b'a', b'b', b'c']);

        let mut reader = EndianReader::new(Cursor::new(bytes), ByteOrder::LittleEndian);
        let text = read_string(&mut reader, &StringEncoding::LengthPrefixed, ByteOrder::BigEndian)
            .expect("read");
        assert_eq!(text, "abc");
    }

    #[test]
    fn test_length_prefixed_rejects_negative_and_overlong() {
        let err = decode((-5i32).to_le_bytes().to_vec(), StringEncoding::LengthPrefixed).unwrap_err();
        assert!(matches!(err, Error::MalformedData { offset: 0, .. }));

        let mut bytes = 10i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"short");
        let err = decode(bytes, StringEncoding::LengthPrefixed).unwrap_err();
        assert!(matches!(err, Error::EndOfStream { offset: 4, needed: 10, .. }));
    }

    #[test]
    fn test_length_prefixed_respects_configured_limit() {
        let mut bytes = 8i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"12345678");
        let config = CodecConfig::new().max_string_length(4);
        let mut reader = EndianReader::with_config(Cursor::new(bytes), config);
        let err = read_string(&mut reader, &StringEncoding::LengthPrefixed, ByteOrder::LittleEndian)
            .unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn test_fixed_length_pad_truncate_trim() {
        let padded = StringEncoding::FixedLength {
            length: 6,
            trim: true,
            padding: b'*',
        };
        let bytes = encode("abc", padded);
        assert_eq!(bytes, b"abc***".to_vec());
        assert_eq!(decode(bytes.clone(), padded).expect("read"), "abc");
        assert_eq!(
            decode(bytes, StringEncoding::fixed(6)).expect("read untrimmed"),
            "abc***"
        );

        assert_eq!(encode("abcdefgh", StringEncoding::fixed(4)), b"abcd".to_vec());
    }

    #[test]
    fn test_fixed_length_truncates_on_char_boundary() {
        // 'é' is two bytes; a 2-byte field cannot hold "aé".
        let bytes = encode("a\u{e9}", StringEncoding::fixed(2));
        assert_eq!(bytes, vec![b'a', 0]);
    }

    #[test]
    fn test_null_terminated_unbounded() {
        let bytes = encode("hello", StringEncoding::NullTerminated { max_length: None });
        assert_eq!(bytes, b"hello\0".to_vec());

        let mut reader = EndianReader::new(
            Cursor::new(b"hi\0rest".to_vec()),
            ByteOrder::LittleEndian,
        );
        let enc = StringEncoding::NullTerminated { max_length: None };
        assert_eq!(read_string(&mut reader, &enc, ByteOrder::LittleEndian).expect("read"), "hi");
        assert_eq!(reader.position().expect("position"), 3);
        // Missing terminator: stop at end of stream.
        assert_eq!(read_string(&mut reader, &enc, ByteOrder::LittleEndian).expect("read"), "rest");
    }

    /// Cursor that counts seek calls.
    struct CountingSeeks {
        inner: Cursor<Vec<u8>>,
        seeks: usize,
    }

    impl std::io::Read for CountingSeeks {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl std::io::Seek for CountingSeeks {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.seeks += 1;
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_null_terminated_scan_does_not_seek_per_byte() {
        let mut data = vec![b'x'; 1000];
        data.push(0);
        let stream = CountingSeeks {
            inner: Cursor::new(data),
            seeks: 0,
        };
        let mut reader = EndianReader::new(stream, ByteOrder::LittleEndian);
        let enc = StringEncoding::NullTerminated { max_length: None };
        let text = read_string(&mut reader, &enc, ByteOrder::LittleEndian).expect("read");
        assert_eq!(text.len(), 1000);
        assert!(reader.get_ref().seeks < 1000, "seeks: {}", reader.get_ref().seeks);
    }

    #[test]
    fn test_null_terminated_with_max_advances_fully() {
        let enc = StringEncoding::NullTerminated {
            max_length: Some(8),
        };
        let bytes = encode("abc", enc);
        assert_eq!(bytes, b"abc\0\0\0\0\0".to_vec());

        let mut data = b"ab\0zzzzz".to_vec();
        data.push(0x7F);
        let mut reader = EndianReader::new(Cursor::new(data), ByteOrder::LittleEndian);
        assert_eq!(read_string(&mut reader, &enc, ByteOrder::LittleEndian).expect("read"), "ab");
        assert_eq!(reader.position().expect("position"), 8);

        assert_eq!(encode("abcdefghijk", enc), b"abcdefg\0".to_vec());
    }

    #[test]
    fn test_null_terminated_with_max_stops_at_short_stream() {
        let enc = StringEncoding::NullTerminated {
            max_length: Some(8),
        };
        let mut reader = EndianReader::new(Cursor::new(b"ab\0".to_vec()), ByteOrder::LittleEndian);
        assert_eq!(read_string(&mut reader, &enc, ByteOrder::LittleEndian).expect("read"), "ab");
        assert_eq!(reader.position().expect("position"), 3);

        let err = decode(b"abc".to_vec(), enc).unwrap_err();
        assert!(matches!(err, Error::EndOfStream { offset: 0, needed: 8, .. }));
    }

    #[test]
    fn test_invalid_utf8_is_data_error() {
        let err = decode(vec![b'o', b'k', 0xFF, 0xFE], StringEncoding::fixed(4)).unwrap_err();
        assert!(matches!(err, Error::MalformedData { offset: 2, .. }));
    }
}
