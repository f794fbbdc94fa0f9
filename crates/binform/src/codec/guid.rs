// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! 128-bit GUID value backed by [`uuid::Uuid`].
//!
//! Wire form: `data1` (32-bit), `data2` (16-bit), `data3` (16-bit) in the
//! effective byte order, followed by the 8 bytes of `data4` verbatim.
//! Big-endian is the RFC 4122 byte layout; little-endian is the mixed-endian
//! layout of Windows GUIDs.

use crate::order::ByteOrder;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(Uuid);

impl Guid {
    /// `00000000-0000-0000-0000-000000000000`
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self(Uuid::from_fields(data1, data2, data3, &data4))
    }

    pub fn fields(&self) -> (u32, u16, u16, [u8; 8]) {
        let (data1, data2, data3, data4) = self.0.as_fields();
        (data1, data2, data3, *data4)
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_bytes(&self, order: ByteOrder) -> [u8; 16] {
        match order {
            ByteOrder::LittleEndian => self.0.to_bytes_le(),
            ByteOrder::BigEndian => *self.0.as_bytes(),
        }
    }

    pub fn from_bytes(bytes: [u8; 16], order: ByteOrder) -> Self {
        match order {
            ByteOrder::LittleEndian => Self(Uuid::from_bytes_le(bytes)),
            ByteOrder::BigEndian => Self(Uuid::from_bytes(bytes)),
        }
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::nil()
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Guid> for Uuid {
    fn from(guid: Guid) -> Self {
        guid.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9";

    #[test]
    fn test_display_and_parse() {
        let guid: Guid = SAMPLE.parse().expect("parse should succeed");
        assert_eq!(guid.to_string(), SAMPLE);
        assert_eq!(
            guid.fields(),
            (
                0x0a1b_2c3d,
                0x4e5f,
                0x6071,
                [0x82, 0x93, 0xa4, 0xb5, 0xc6, 0xd7, 0xe8, 0xf9]
            )
        );
    }

    #[test]
    fn test_nil_text() {
        assert_eq!(Guid::nil().to_string(), "00000000-0000-0000-0000-000000000000");
        assert!(Guid::default().is_nil());
    }

    #[test]
    fn test_wire_layout_little_endian() {
        let guid: Guid = SAMPLE.parse().expect("parse should succeed");
        let bytes = guid.to_bytes(ByteOrder::LittleEndian);
        assert_eq!(&bytes[0..4], &[0x3d, 0x2c, 0x1b, 0x0a]);
        assert_eq!(&bytes[4..6], &[0x5f, 0x4e]);
        assert_eq!(&bytes[8..16], &[0x82, 0x93, 0xa4, 0xb5, 0xc6, 0xd7, 0xe8, 0xf9]);
        assert_eq!(Guid::from_bytes(bytes, ByteOrder::LittleEndian), guid);
    }

    #[test]
    fn test_wire_layout_big_endian() {
        let guid: Guid = SAMPLE.parse().expect("parse should succeed");
        let bytes = guid.to_bytes(ByteOrder::BigEndian);
        assert_eq!(&bytes[0..4], &[0x0a, 0x1b, 0x2c, 0x3d]);
        assert_eq!(&bytes[6..8], &[0x60, 0x71]);
        assert_eq!(Guid::from_bytes(bytes, ByteOrder::BigEndian), guid);
    }

    #[test]
    fn test_from_fields_matches_text() {
        let guid = Guid::from_fields(
            0x0a1b_2c3d,
            0x4e5f,
            0x6071,
            [0x82, 0x93, 0xa4, 0xb5, 0xc6, 0xd7, 0xe8, 0xf9],
        );
        assert_eq!(guid.to_string(), SAMPLE);
        assert_eq!(Uuid::from(guid), *guid.as_uuid());
    }

    #[test]
    fn test_parse_rejects_bad_groups() {
        assert!("0a1b2c3d-4e5f-6071-8293".parse::<Guid>().is_err());
        assert!("0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8fz".parse::<Guid>().is_err());
        assert!("+a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9".parse::<Guid>().is_err());
        assert!("{0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9}".parse::<Guid>().is_ok());
    }
}
