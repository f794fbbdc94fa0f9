// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field visitation order and final cursor computation.
//!
//! Fields are visited by ascending offset (ties keep declaration order).
//! After the last field the stream is left at, in priority order:
//!
//! 1. structure start + value of the processed size-cursor field
//! 2. structure start + declared total size for the active version
//! 3. the furthest byte touched by any processed field
//! 4. wherever the last sequential access ended (positional layouts)

use crate::layout::ResolvedField;

/// Sort `fields` by offset, keeping declaration order for equal offsets.
pub(crate) fn order_by_offset(fields: &mut [ResolvedField]) {
    // `sort_by_key` is stable.
    fields.sort_by_key(|field| field.offset.unwrap_or(0));
}

/// Tracks the extent of one structure while its fields are processed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CursorTracker {
    origin: u64,
    extent: Option<u64>,
    size_cursor: Option<u64>,
}

impl CursorTracker {
    pub(crate) fn new(origin: u64) -> Self {
        Self {
            origin,
            extent: None,
            size_cursor: None,
        }
    }

    /// Record that a field ended at absolute position `end`.
    pub(crate) fn record(&mut self, end: u64) {
        self.extent = Some(self.extent.map_or(end, |current| current.max(end)));
    }

    /// Record the value of the size-cursor field, relative to the origin.
    pub(crate) fn set_size_cursor(&mut self, size: u64) {
        self.size_cursor = Some(size);
    }

    /// Absolute position the stream is left at.
    pub(crate) fn finish(&self, declared_size: Option<u64>, sequential_end: u64) -> u64 {
        if let Some(size) = self.size_cursor {
            return self.origin + size;
        }
        if let Some(size) = declared_size {
            return self.origin + size;
        }
        self.extent.unwrap_or(sequential_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_is_maximum_end() {
        let mut tracker = CursorTracker::new(100);
        tracker.record(134);
        tracker.record(102);
        tracker.record(117);
        assert_eq!(tracker.finish(None, 117), 134);
    }

    #[test]
    fn test_size_cursor_wins_over_declared_size() {
        let mut tracker = CursorTracker::new(8);
        tracker.record(20);
        tracker.set_size_cursor(45);
        assert_eq!(tracker.finish(Some(0xFF), 20), 53);
    }

    #[test]
    fn test_declared_size_wins_over_extent() {
        let mut tracker = CursorTracker::new(0);
        tracker.record(0x10);
        assert_eq!(tracker.finish(Some(0xFF), 0x10), 0xFF);
    }

    #[test]
    fn test_sequential_end_when_nothing_recorded() {
        let tracker = CursorTracker::new(4);
        assert_eq!(tracker.finish(None, 12), 12);
    }
}
