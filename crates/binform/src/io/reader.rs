// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-order aware reader over any seekable stream.

use crate::codec::{Guid, F16};
use crate::config::{CodecConfig, GUID_SIZE};
use crate::error::{Error, Result};
use crate::order::ByteOrder;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

/// Generate read methods for multi-byte primitives.
///
/// Each invocation produces two methods:
/// 1. `$with(order)` reads one value through `byteorder` in `order`
/// 2. `$name()` does the same using the reader's default byte order
///
/// Short reads are reported as `Error::EndOfStream` with the offset where the
/// value started.
macro_rules! impl_read_endian {
    ($name:ident, $with:ident, $type:ty) => {
        pub fn $with(&mut self, order: ByteOrder) -> Result<$type> {
            let offset = self.inner.stream_position()?;
            let value = match order {
                ByteOrder::LittleEndian => self.inner.$name::<LittleEndian>(),
                ByteOrder::BigEndian => self.inner.$name::<BigEndian>(),
            };
            value.map_err(|e| end_of_stream(e, offset, std::mem::size_of::<$type>()))
        }

        pub fn $name(&mut self) -> Result<$type> {
            self.$with(self.config.byte_order)
        }
    };
}

/// Map a short read to `Error::EndOfStream`; other I/O errors pass through.
fn end_of_stream(e: io::Error, offset: u64, needed: usize) -> Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::EndOfStream {
            offset,
            needed,
            field: None,
        },
        _ => Error::Io(e),
    }
}

/// Generate `peek_*` methods that restore the stream position afterwards.
macro_rules! impl_peek {
    ($name:ident, $read:ident, $type:ty) => {
        pub fn $name(&mut self, order: ByteOrder) -> Result<$type> {
            let start = self.inner.stream_position()?;
            let value = self.$read(order);
            self.inner.seek(SeekFrom::Start(start))?;
            value
        }
    };
}

/// Reader with a default byte order and a virtual origin.
///
/// Positions reported and accepted by [`EndianReader::position`] and
/// [`EndianReader::seek_to`] are relative to the origin, so a nested reader
/// created with [`EndianReader::virtual_reader`] sees its own start as 0.
#[derive(Debug)]
pub struct EndianReader<R> {
    inner: R,
    origin: u64,
    config: CodecConfig,
}

impl<R: Read + Seek> EndianReader<R> {
    pub fn new(inner: R, byte_order: ByteOrder) -> Self {
        Self::with_config(inner, CodecConfig::new().byte_order(byte_order))
    }

    pub fn with_config(inner: R, config: CodecConfig) -> Self {
        Self {
            inner,
            origin: 0,
            config,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.config.byte_order
    }

    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.config.byte_order = byte_order;
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Position relative to the virtual origin.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?.saturating_sub(self.origin))
    }

    /// Absolute position in the underlying stream.
    pub fn absolute_position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek relative to the virtual origin.
    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        self.seek_absolute(self.origin + position)
    }

    pub fn seek_absolute(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    pub fn skip(&mut self, count: i64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(count))?;
        Ok(())
    }

    /// Total length of the underlying stream.
    pub fn stream_len(&mut self) -> Result<u64> {
        let current = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        if current != end {
            self.inner.seek(SeekFrom::Start(current))?;
        }
        Ok(end)
    }

    /// Bytes left between the current position and the end of the stream.
    pub fn remaining(&mut self) -> Result<u64> {
        let current = self.inner.stream_position()?;
        Ok(self.stream_len()?.saturating_sub(current))
    }

    /// Reader sharing this stream whose origin is the current position.
    pub fn virtual_reader(&mut self) -> Result<EndianReader<&mut R>> {
        let origin = self.inner.stream_position()?;
        Ok(self.virtual_reader_at(origin))
    }

    /// Reader sharing this stream with an explicit absolute origin.
    pub fn virtual_reader_at(&mut self, origin: u64) -> EndianReader<&mut R> {
        EndianReader {
            inner: &mut self.inner,
            origin,
            config: self.config.clone(),
        }
    }

    /// Fill `buf` completely or fail with `Error::EndOfStream`.
    pub fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.inner.stream_position()?;
        let needed = buf.len();
        self.inner
            .read_exact(buf)
            .map_err(|e| end_of_stream(e, offset, needed))
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_exact_into(&mut bytes)?;
        Ok(bytes)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let remaining = self.remaining()?;
        if len as u64 > remaining {
            return Err(Error::EndOfStream {
                offset: self.inner.stream_position()?,
                needed: len,
                field: None,
            });
        }
        let mut bytes = vec![0u8; len];
        self.read_exact_into(&mut bytes)?;
        Ok(bytes)
    }

    // A failed single-byte read consumes nothing, so the offset is taken
    // only on the error path.
    pub fn read_u8(&mut self) -> Result<u8> {
        match self.inner.read_u8() {
            Ok(value) => Ok(value),
            Err(e) => Err(end_of_stream(e, self.inner.stream_position()?, 1)),
        }
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        match self.inner.read_i8() {
            Ok(value) => Ok(value),
            Err(e) => Err(end_of_stream(e, self.inner.stream_position()?, 1)),
        }
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    // Generate multi-byte read methods via macro
    impl_read_endian!(read_i16, read_i16_with, i16);
    impl_read_endian!(read_u16, read_u16_with, u16);
    impl_read_endian!(read_i32, read_i32_with, i32);
    impl_read_endian!(read_u32, read_u32_with, u32);
    impl_read_endian!(read_i64, read_i64_with, i64);
    impl_read_endian!(read_u64, read_u64_with, u64);
    impl_read_endian!(read_f32, read_f32_with, f32);
    impl_read_endian!(read_f64, read_f64_with, f64);

    pub fn read_f16_with(&mut self, order: ByteOrder) -> Result<F16> {
        Ok(F16::from_bits(self.read_u16_with(order)?))
    }

    pub fn read_f16(&mut self) -> Result<F16> {
        self.read_f16_with(self.byte_order())
    }

    pub fn read_guid_with(&mut self, order: ByteOrder) -> Result<Guid> {
        let bytes = self.read_fixed::<GUID_SIZE>()?;
        Ok(Guid::from_bytes(bytes, order))
    }

    pub fn read_guid(&mut self) -> Result<Guid> {
        self.read_guid_with(self.byte_order())
    }

    impl_peek!(peek_i16, read_i16_with, i16);
    impl_peek!(peek_u16, read_u16_with, u16);
    impl_peek!(peek_i32, read_i32_with, i32);
    impl_peek!(peek_u32, read_u32_with, u32);
    impl_peek!(peek_i64, read_i64_with, i64);
    impl_peek!(peek_u64, read_u64_with, u64);
    impl_peek!(peek_f32, read_f32_with, f32);
    impl_peek!(peek_f64, read_f64_with, f64);
    impl_peek!(peek_guid, read_guid_with, Guid);

    pub fn peek_u8(&mut self) -> Result<u8> {
        let start = self.inner.stream_position()?;
        let value = self.read_u8();
        self.inner.seek(SeekFrom::Start(start))?;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEST_U16: u16 = 0xCDEF;
    const TEST_U32: u32 = 0x1234_5678;
    const TEST_U64: u64 = 0x1122_3344_5566_7788;

    fn reader(bytes: Vec<u8>) -> EndianReader<Cursor<Vec<u8>>> {
        EndianReader::new(Cursor::new(bytes), ByteOrder::LittleEndian)
    }

    #[test]
    fn test_read_both_orders() {
        let mut data = Vec::new();
        data.extend_from_slice(&TEST_U16.to_le_bytes());
        data.extend_from_slice(&TEST_U32.to_be_bytes());
        data.extend_from_slice(&TEST_U64.to_le_bytes());
        let mut r = reader(data);

        assert_eq!(r.read_u16().expect("read u16"), TEST_U16);
        assert_eq!(r.read_u32_with(ByteOrder::BigEndian).expect("read u32"), TEST_U32);
        assert_eq!(r.read_u64().expect("read u64"), TEST_U64);
        assert_eq!(r.remaining().expect("remaining"), 0);
    }

    #[test]
    fn test_short_read_reports_offset() {
        let mut r = reader(vec![0u8; 3]);
        r.read_u8().expect("read u8");
        match r.read_u32().unwrap_err() {
            Error::EndOfStream { offset, needed, field } => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert!(field.is_none());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_float_orders_and_short_float() {
        let mut data = 1.5f32.to_be_bytes().to_vec();
        data.extend_from_slice(&(-2.25f64).to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        let mut r = reader(data);

        assert_eq!(r.read_f32_with(ByteOrder::BigEndian).expect("read f32"), 1.5);
        assert_eq!(r.read_f64().expect("read f64"), -2.25);
        assert!(matches!(
            r.read_f64_with(ByteOrder::BigEndian),
            Err(Error::EndOfStream { offset: 12, needed: 8, .. })
        ));
    }

    #[test]
    fn test_read_bytes_checks_bounds_before_allocating() {
        let mut r = reader(vec![1, 2, 3]);
        assert!(matches!(
            r.read_bytes(1 << 30),
            Err(Error::EndOfStream { needed, .. }) if needed == 1 << 30
        ));
        assert_eq!(r.read_bytes(3).expect("read bytes"), vec![1, 2, 3]);
    }

    #[test]
    fn test_peek_keeps_position() {
        let mut r = reader(TEST_U32.to_le_bytes().to_vec());
        assert_eq!(r.peek_u32(ByteOrder::LittleEndian).expect("peek"), TEST_U32);
        assert_eq!(r.position().expect("position"), 0);
        assert_eq!(r.peek_u8().expect("peek u8"), 0x78);
        assert_eq!(r.read_u32().expect("read"), TEST_U32);
    }

    #[test]
    fn test_virtual_reader_positions() {
        let mut data = vec![0xAAu8; 8];
        data.extend_from_slice(&TEST_U16.to_be_bytes());
        let mut r = EndianReader::new(Cursor::new(data), ByteOrder::BigEndian);
        r.seek_to(8).expect("seek");

        let mut nested = r.virtual_reader().expect("virtual reader");
        assert_eq!(nested.origin(), 8);
        assert_eq!(nested.position().expect("position"), 0);
        assert_eq!(nested.read_u16().expect("read"), TEST_U16);
        assert_eq!(nested.position().expect("position"), 2);
        nested.seek_to(0).expect("seek");
        assert_eq!(nested.absolute_position().expect("absolute"), 8);
    }

    #[test]
    fn test_read_guid_and_half() {
        let guid: Guid = "00112233-4455-6677-8899-aabbccddeeff".parse().expect("guid");
        let mut data = guid.to_bytes(ByteOrder::BigEndian).to_vec();
        data.extend_from_slice(&F16::ONE.to_bits().to_be_bytes());
        let mut r = EndianReader::new(Cursor::new(data), ByteOrder::BigEndian);
        assert_eq!(r.read_guid().expect("guid"), guid);
        assert_eq!(r.read_f16().expect("half"), F16::ONE);
    }
}
