// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-order aware writer over any seekable stream.

use crate::codec::{Guid, F16};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::order::ByteOrder;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

/// Block size used when moving stream contents in [`EndianWriter::copy`].
const COPY_BLOCK_SIZE: usize = 0x10000;

/// Generate write methods for multi-byte primitives.
///
/// Each invocation produces `$with(value, order)`, which writes through
/// `byteorder`, and `$name(value)`, which uses the writer's default byte order.
macro_rules! impl_write_endian {
    ($name:ident, $with:ident, $type:ty) => {
        pub fn $with(&mut self, value: $type, order: ByteOrder) -> Result<()> {
            match order {
                ByteOrder::LittleEndian => self.inner.$name::<LittleEndian>(value)?,
                ByteOrder::BigEndian => self.inner.$name::<BigEndian>(value)?,
            }
            Ok(())
        }

        pub fn $name(&mut self, value: $type) -> Result<()> {
            self.$with(value, self.config.byte_order)
        }
    };
}

/// Writer with a default byte order and a virtual origin.
#[derive(Debug)]
pub struct EndianWriter<W> {
    inner: W,
    origin: u64,
    config: CodecConfig,
}

impl<W: Write + Seek> EndianWriter<W> {
    pub fn new(inner: W, byte_order: ByteOrder) -> Self {
        Self::with_config(inner, CodecConfig::new().byte_order(byte_order))
    }

    pub fn with_config(inner: W, config: CodecConfig) -> Self {
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

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Position relative to the virtual origin.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?.saturating_sub(self.origin))
    }

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

    pub fn stream_len(&mut self) -> Result<u64> {
        let current = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        if current != end {
            self.inner.seek(SeekFrom::Start(current))?;
        }
        Ok(end)
    }

    /// Writer sharing this stream whose origin is the current position.
    pub fn virtual_writer(&mut self) -> Result<EndianWriter<&mut W>> {
        let origin = self.inner.stream_position()?;
        Ok(self.virtual_writer_at(origin))
    }

    pub fn virtual_writer_at(&mut self, origin: u64) -> EndianWriter<&mut W> {
        EndianWriter {
            inner: &mut self.inner,
            origin,
            config: self.config.clone(),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.inner.write_i8(value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    // Generate multi-byte write methods via macro
    impl_write_endian!(write_i16, write_i16_with, i16);
    impl_write_endian!(write_u16, write_u16_with, u16);
    impl_write_endian!(write_i32, write_i32_with, i32);
    impl_write_endian!(write_u32, write_u32_with, u32);
    impl_write_endian!(write_i64, write_i64_with, i64);
    impl_write_endian!(write_u64, write_u64_with, u64);
    impl_write_endian!(write_f32, write_f32_with, f32);
    impl_write_endian!(write_f64, write_f64_with, f64);

    pub fn write_f16_with(&mut self, value: F16, order: ByteOrder) -> Result<()> {
        self.write_u16_with(value.to_bits(), order)
    }

    pub fn write_f16(&mut self, value: F16) -> Result<()> {
        self.write_f16_with(value, self.config.byte_order)
    }

    pub fn write_guid_with(&mut self, value: Guid, order: ByteOrder) -> Result<()> {
        self.write_bytes(&value.to_bytes(order))
    }

    pub fn write_guid(&mut self, value: Guid) -> Result<()> {
        self.write_guid_with(value, self.config.byte_order)
    }

    /// Write `length` copies of `pad` at the current position.
    pub fn fill(&mut self, pad: u8, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        self.write_bytes(&vec![pad; length])
    }
}

impl<W: Read + Write + Seek> EndianWriter<W> {
    /// Move `length` bytes from `source` to `destination` (absolute offsets).
    ///
    /// Overlapping ranges are handled; the stream position is restored.
    pub fn copy(&mut self, source: u64, destination: u64, length: u64) -> Result<()> {
        if length == 0 || source == destination {
            return Ok(());
        }
        let start = self.inner.stream_position()?;
        let mut buffer = vec![0u8; COPY_BLOCK_SIZE.min(length as usize)];

        let mut remaining = length;
        while remaining > 0 {
            let chunk = remaining.min(buffer.len() as u64);
            // Copy front-to-back when moving left, back-to-front when moving right.
            let offset = if source > destination {
                length - remaining
            } else {
                remaining - chunk
            };

            let block = &mut buffer[..chunk as usize];
            self.inner.seek(SeekFrom::Start(source + offset))?;
            self.inner.read_exact(block).map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => Error::EndOfStream {
                    offset: source + offset,
                    needed: chunk as usize,
                    field: None,
                },
                _ => Error::Io(e),
            })?;
            self.inner.seek(SeekFrom::Start(destination + offset))?;
            self.inner.write_all(block)?;
            remaining -= chunk;
        }

        self.inner.seek(SeekFrom::Start(start))?;
        Ok(())
    }

    /// Insert `data` at the current position, shifting the tail right.
    pub fn insert(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.open_gap(data.len() as u64)?;
        self.write_bytes(data)
    }

    /// Insert `length` copies of `pad`, shifting the tail right.
    pub fn insert_fill(&mut self, pad: u8, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        self.open_gap(length as u64)?;
        self.fill(pad, length)
    }

    fn open_gap(&mut self, length: u64) -> Result<()> {
        let source = self.inner.stream_position()?;
        let end = self.stream_len()?;
        if source < end {
            self.copy(source, source + length, end - source)?;
        }
        Ok(())
    }
}
