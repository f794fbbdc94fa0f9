// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec constants and stream-level configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: wire constants shared by every codec (GUID width,
//!   length prefix width, default padding).
//! - **Level 2 (Per stream)**: [`CodecConfig`], owned by each `EndianReader` /
//!   `EndianWriter`. It supplies the ambient byte order (last step of the
//!   field -> structure -> stream chain) and the bounds applied to
//!   variable-length reads.
//!
//! With the `config-loaders` feature a `CodecConfig` can be loaded from YAML:
//!
//! ```ignore
//! let config = CodecConfig::from_yaml_str("byte_order: big_endian\nmax_collection_count: 4096\n")?;
//! let reader = EndianReader::with_config(file, config);
//! ```

use crate::error::{Error, Result};
use crate::order::ByteOrder;

/// Width of a GUID on the wire.
pub const GUID_SIZE: usize = 16;

/// Width of the length prefix of a length-prefixed string (signed 32-bit).
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Fill byte for fixed-length strings when none is declared.
pub const DEFAULT_STRING_PADDING: u8 = 0;

/// Largest length-prefixed string accepted by default (16 MiB).
pub const DEFAULT_MAX_STRING_LENGTH: usize = 16 * 1024 * 1024;

/// Largest collection element count accepted by default.
pub const DEFAULT_MAX_COLLECTION_COUNT: usize = 1 << 24;

/// Resolved layouts memoized per structure (one slot per distinct version).
pub const RESOLVED_CACHE_CAPACITY: usize = 32;

/// Stream-level codec settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default, deny_unknown_fields))]
pub struct CodecConfig {
    /// Byte order used when neither the field nor the structure overrides it.
    pub byte_order: ByteOrder,
    /// Upper bound for length-prefixed strings, in bytes.
    pub max_string_length: usize,
    /// Upper bound for prefixed collection counts.
    pub max_collection_count: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::LittleEndian,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            max_collection_count: DEFAULT_MAX_COLLECTION_COUNT,
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    #[must_use]
    pub fn max_string_length(mut self, max: usize) -> Self {
        self.max_string_length = max;
        self
    }

    #[must_use]
    pub fn max_collection_count(mut self, max: usize) -> Self {
        self.max_collection_count = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_string_length > i32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "max_string_length {} exceeds the 32-bit length prefix",
                self.max_string_length
            )));
        }
        Ok(())
    }

    /// Parse a configuration from YAML. Missing keys keep their defaults.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: CodecConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        log::debug!("[config] loaded codec config: {:?}", config);
        Ok(config)
    }

    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.byte_order, ByteOrder::LittleEndian);
        assert_eq!(config.max_string_length, DEFAULT_MAX_STRING_LENGTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = CodecConfig::new()
            .byte_order(ByteOrder::BigEndian)
            .max_collection_count(8);
        assert_eq!(config.byte_order, ByteOrder::BigEndian);
        assert_eq!(config.max_collection_count, 8);
    }

    #[test]
    fn test_validate_rejects_oversized_string_bound() {
        let config = CodecConfig::new().max_string_length(i32::MAX as usize + 1);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_from_yaml_partial() {
        let config = CodecConfig::from_yaml_str("byte_order: big_endian\nmax_collection_count: 64\n")
            .expect("yaml should parse");
        assert_eq!(config.byte_order, ByteOrder::BigEndian);
        assert_eq!(config.max_collection_count, 64);
        assert_eq!(config.max_string_length, DEFAULT_MAX_STRING_LENGTH);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("codec.yaml");
        std::fs::write(&path, "max_string_length: 256\n").expect("write config");
        let config = CodecConfig::from_yaml_file(&path).expect("file should load");
        assert_eq!(config.max_string_length, 256);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_from_yaml_unknown_key() {
        let err = CodecConfig::from_yaml_str("bogus: 1\n").unwrap_err();
        assert!(err.is_configuration());
    }
}
