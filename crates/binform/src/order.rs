// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte order selection.

use std::fmt;

/// Byte order of multi-byte values on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "snake_case"))]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" | "little_endian" | "littleendian" => Some(ByteOrder::LittleEndian),
            "big" | "be" | "big_endian" | "bigendian" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    pub const fn is_native(self) -> bool {
        matches!(
            (self, Self::native()),
            (ByteOrder::LittleEndian, ByteOrder::LittleEndian)
                | (ByteOrder::BigEndian, ByteOrder::BigEndian)
        )
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::LittleEndian => write!(f, "little-endian"),
            ByteOrder::BigEndian => write!(f, "big-endian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(ByteOrder::parse("big"), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::parse("BE"), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::parse("LittleEndian"), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::parse("middle"), None);
    }

    #[test]
    fn test_native_is_native() {
        assert!(ByteOrder::native().is_native());
    }
}
