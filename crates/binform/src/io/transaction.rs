// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Copy-on-write overlay over a read-only seekable source.
//!
//! Writes land in an ordered map of patches keyed by absolute offset and never
//! touch the source. Reads merge the patches over the source bytes. Pending
//! patches are either committed to a writable target or discarded.

use std::collections::BTreeMap;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Read/write view of `S` whose writes stay pending until committed.
#[derive(Debug)]
pub struct TransactionStream<S> {
    source: S,
    source_len: u64,
    changes: BTreeMap<u64, Vec<u8>>,
    position: u64,
    length: u64,
}

impl<S: Read + Seek> TransactionStream<S> {
    /// Wrap `source`. The initial position is the source's current position.
    pub fn new(mut source: S) -> io::Result<Self> {
        let position = source.stream_position()?;
        let source_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(position))?;
        Ok(Self {
            source,
            source_len,
            changes: BTreeMap::new(),
            position,
            length: source_len,
        })
    }

    /// Logical length: the source length, extended by writes past the end
    /// or changed by [`set_len`](Self::set_len).
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn set_len(&mut self, length: u64) {
        self.length = length;
    }

    /// Whether any write is pending.
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Number of disjoint patches pending.
    pub fn patch_count(&self) -> usize {
        self.changes.len()
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Drop pending writes. The stream returns to the source contents,
    /// length and offset 0.
    pub fn discard(&mut self) {
        log::debug!("[transaction] discard {} patches", self.changes.len());
        self.changes.clear();
        self.length = self.source_len;
        self.position = 0;
    }

    /// Write pending patches into `target` and clear them. The target's
    /// position is restored afterwards.
    pub fn commit_to<W: Write + Seek>(&mut self, target: &mut W) -> io::Result<()> {
        apply_changes(&self.changes, target)?;
        self.changes.clear();
        Ok(())
    }

    /// Replay pending patches onto another transaction, overwriting overlaps
    /// there. This stream keeps its own patches.
    pub fn copy_changes_to<T: Read + Seek>(&self, target: &mut TransactionStream<T>) {
        for (offset, patch) in &self.changes {
            target.patch(*offset, patch);
        }
    }

    /// Unwrap the source, dropping pending writes.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Merge `data` at `offset` into the patch map. Patches that overlap or
    /// touch the new range are folded into a single patch.
    fn patch(&mut self, offset: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let end = offset + data.len() as u64;

        let mut begin = offset;
        let mut merged_end = end;
        let first = self
            .changes
            .range(..=offset)
            .next_back()
            .filter(|(key, patch)| *key + patch.len() as u64 >= offset)
            .map_or(offset, |(key, _)| *key);
        let touched: Vec<u64> = self.changes.range(first..=end).map(|(key, _)| *key).collect();
        for key in &touched {
            if let Some(patch) = self.changes.get(key) {
                begin = begin.min(*key);
                merged_end = merged_end.max(*key + patch.len() as u64);
            }
        }

        let mut merged = vec![0u8; (merged_end - begin) as usize];
        for key in touched {
            if let Some(patch) = self.changes.remove(&key) {
                let at = (key - begin) as usize;
                merged[at..at + patch.len()].copy_from_slice(&patch);
            }
        }
        let at = (offset - begin) as usize;
        merged[at..at + data.len()].copy_from_slice(data);
        self.changes.insert(begin, merged);

        self.length = self.length.max(end);
    }
}

impl<S: Read + Write + Seek> TransactionStream<S> {
    /// Write pending patches into the source itself.
    pub fn commit(&mut self) -> io::Result<()> {
        apply_changes(&self.changes, &mut self.source)?;
        self.changes.clear();
        self.source_len = self.source.seek(SeekFrom::End(0))?;
        self.source.seek(SeekFrom::Start(self.position))?;
        Ok(())
    }
}

fn apply_changes<W: Write + Seek>(
    changes: &BTreeMap<u64, Vec<u8>>,
    target: &mut W,
) -> io::Result<()> {
    log::debug!("[transaction] commit {} patches", changes.len());
    let original = target.stream_position()?;
    for (offset, patch) in changes {
        target.seek(SeekFrom::Start(*offset))?;
        target.write_all(patch)?;
    }
    target.seek(SeekFrom::Start(original))?;
    Ok(())
}

impl<S: Read + Seek> Read for TransactionStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.position;
        let count = buf.len().min(self.length.saturating_sub(start) as usize);
        if count == 0 {
            return Ok(0);
        }
        let end = start + count as u64;
        let buf = &mut buf[..count];

        // Bytes past the source end and not covered by a patch read as zero.
        let from_source = count.min(self.source_len.saturating_sub(start) as usize);
        if from_source > 0 {
            self.source.seek(SeekFrom::Start(start))?;
            self.source.read_exact(&mut buf[..from_source])?;
        }
        buf[from_source..].fill(0);

        let first = self
            .changes
            .range(..=start)
            .next_back()
            .map_or(start, |(key, _)| *key);
        for (key, patch) in self.changes.range(first..end) {
            let patch_end = key + patch.len() as u64;
            if patch_end <= start {
                continue;
            }
            let from = start.max(*key);
            let to = end.min(patch_end);
            let dest = (from - start) as usize;
            let src = (from - key) as usize;
            let len = (to - from) as usize;
            buf[dest..dest + len].copy_from_slice(&patch[src..src + len]);
        }

        self.position = end;
        Ok(count)
    }
}

impl<S: Read + Seek> Write for TransactionStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.patch(self.position, buf);
        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Read + Seek> Seek for TransactionStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        match target {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the stream",
            )),
        }
    }
}
