// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for layout configuration, malformed data and stream I/O.
//!
//! Configuration errors describe a bug in a layout description and are raised
//! before any byte of the affected field is touched. Data errors describe input
//! that does not match the layout and carry a [`FieldContext`] once the walker
//! knows which field was being processed. I/O errors from the underlying stream
//! are passed through unchanged.

use std::fmt;
use std::io;

/// Location of a failure inside a structure: structure, field, field kind and
/// absolute stream offset of the field start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldContext {
    pub structure: String,
    pub field: String,
    pub kind: String,
    pub offset: u64,
}

impl FieldContext {
    pub fn new(
        structure: impl Into<String>,
        field: impl Into<String>,
        kind: impl Into<String>,
        offset: u64,
    ) -> Self {
        Self {
            structure: structure.into(),
            field: field.into(),
            kind: kind.into(),
            offset,
        }
    }
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} ({}) at 0x{:X}",
            self.structure, self.field, self.kind, self.offset
        )
    }
}

/// Engine error.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Two alternatives of the same property have overlapping version ranges.
    VersionOverlap { structure: String, property: String },
    /// More than one alternative matched the active version.
    AmbiguousVersion {
        structure: String,
        property: String,
        version: Option<f64>,
    },
    /// A string field declares zero or several encodings, or an encoding was
    /// attached to a non-string field.
    ConflictingEncoding { structure: String, field: String },
    /// No positional constructor, factory or default construction path.
    NoConstructionStrategy { structure: String },
    /// The layout only declares versioned sizes but no version is available.
    VersionRequired { structure: String },
    /// Any other inconsistency in a layout description.
    InvalidLayout { structure: String, reason: String },
    /// Codec configuration rejected by `CodecConfig::validate` or a loader.
    InvalidConfig(String),

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// The stream ended before the expected number of bytes was available.
    EndOfStream {
        offset: u64,
        needed: usize,
        field: Option<FieldContext>,
    },
    /// Bytes were available but do not form a valid value for the field.
    MalformedData {
        offset: u64,
        reason: String,
        field: Option<FieldContext>,
    },

    // ========================================================================
    // Stream Errors
    // ========================================================================
    /// I/O error raised by the underlying stream.
    Io(io::Error),
}

impl Error {
    pub(crate) fn invalid_layout(structure: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidLayout {
            structure: structure.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Error::MalformedData {
            offset,
            reason: reason.into(),
            field: None,
        }
    }

    /// Attach field context to a data error that does not carry one yet.
    ///
    /// The innermost field wins: nested structures attach their own context
    /// first and the enclosing field leaves it untouched.
    #[must_use]
    pub fn in_field(self, context: impl FnOnce() -> FieldContext) -> Self {
        match self {
            Error::EndOfStream {
                offset,
                needed,
                field: None,
            } => Error::EndOfStream {
                offset,
                needed,
                field: Some(context()),
            },
            Error::MalformedData {
                offset,
                reason,
                field: None,
            } => Error::MalformedData {
                offset,
                reason,
                field: Some(context()),
            },
            other => other,
        }
    }

    /// Shift the offset of a data error raised against a detached buffer
    /// back into stream coordinates.
    #[must_use]
    pub(crate) fn rebased(self, base: u64) -> Self {
        match self {
            Error::EndOfStream {
                offset,
                needed,
                field,
            } => Error::EndOfStream {
                offset: base + offset,
                needed,
                field,
            },
            Error::MalformedData {
                offset,
                reason,
                field,
            } => Error::MalformedData {
                offset: base + offset,
                reason,
                field,
            },
            other => other,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::VersionOverlap { .. }
                | Error::AmbiguousVersion { .. }
                | Error::ConflictingEncoding { .. }
                | Error::NoConstructionStrategy { .. }
                | Error::VersionRequired { .. }
                | Error::InvalidLayout { .. }
                | Error::InvalidConfig(_)
        )
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Error::EndOfStream { .. } | Error::MalformedData { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Field context of a data error, if the walker attached one.
    pub fn field_context(&self) -> Option<&FieldContext> {
        match self {
            Error::EndOfStream { field, .. } | Error::MalformedData { field, .. } => field.as_ref(),
            _ => None,
        }
    }
}

// Layouts cache their construction result, so configuration errors must be
// reproducible on every lookup.
impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Error::VersionOverlap {
                structure,
                property,
            } => Error::VersionOverlap {
                structure: structure.clone(),
                property: property.clone(),
            },
            Error::AmbiguousVersion {
                structure,
                property,
                version,
            } => Error::AmbiguousVersion {
                structure: structure.clone(),
                property: property.clone(),
                version: *version,
            },
            Error::ConflictingEncoding { structure, field } => Error::ConflictingEncoding {
                structure: structure.clone(),
                field: field.clone(),
            },
            Error::NoConstructionStrategy { structure } => Error::NoConstructionStrategy {
                structure: structure.clone(),
            },
            Error::VersionRequired { structure } => Error::VersionRequired {
                structure: structure.clone(),
            },
            Error::InvalidLayout { structure, reason } => Error::InvalidLayout {
                structure: structure.clone(),
                reason: reason.clone(),
            },
            Error::InvalidConfig(reason) => Error::InvalidConfig(reason.clone()),
            Error::EndOfStream {
                offset,
                needed,
                field,
            } => Error::EndOfStream {
                offset: *offset,
                needed: *needed,
                field: field.clone(),
            },
            Error::MalformedData {
                offset,
                reason,
                field,
            } => Error::MalformedData {
                offset: *offset,
                reason: reason.clone(),
                field: field.clone(),
            },
            Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

fn fmt_version(version: Option<f64>) -> String {
    match version {
        Some(v) => format!("v{}", v),
        None => "unversioned".to_string(),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Configuration
            Error::VersionOverlap {
                structure,
                property,
            } => write!(
                f,
                "{}: version ranges of {} overlap",
                structure, property
            ),
            Error::AmbiguousVersion {
                structure,
                property,
                version,
            } => write!(
                f,
                "{}: more than one {} alternative matches {}",
                structure,
                property,
                fmt_version(*version)
            ),
            Error::ConflictingEncoding { structure, field } => write!(
                f,
                "{}.{}: string fields need exactly one string encoding",
                structure, field
            ),
            Error::NoConstructionStrategy { structure } => {
                write!(f, "{}: no usable construction strategy", structure)
            }
            Error::VersionRequired { structure } => write!(
                f,
                "{}: layout is versioned but no version was supplied or read",
                structure
            ),
            Error::InvalidLayout { structure, reason } => {
                write!(f, "{}: invalid layout: {}", structure, reason)
            }
            Error::InvalidConfig(reason) => write!(f, "invalid codec configuration: {}", reason),
            // Data
            Error::EndOfStream {
                offset,
                needed,
                field,
            } => {
                write!(
                    f,
                    "unexpected end of stream at 0x{:X} ({} bytes needed)",
                    offset, needed
                )?;
                if let Some(ctx) = field {
                    write!(f, " while reading {}", ctx)?;
                }
                Ok(())
            }
            Error::MalformedData {
                offset,
                reason,
                field,
            } => {
                write!(f, "malformed data at 0x{:X}: {}", offset, reason)?;
                if let Some(ctx) = field {
                    write!(f, " in {}", ctx)?;
                }
                Ok(())
            }
            // Stream
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenient alias for engine results.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_field_attaches_once() {
        let err = Error::malformed(0x10, "bad value")
            .in_field(|| FieldContext::new("Inner", "value", "u32", 0x10))
            .in_field(|| FieldContext::new("Outer", "inner", "Inner", 0x08));

        let ctx = err.field_context().expect("context should be attached");
        assert_eq!(ctx.structure, "Inner");
        assert_eq!(ctx.field, "value");
        assert!(err.is_data());
    }

    #[test]
    fn test_in_field_ignores_configuration_errors() {
        let err = Error::VersionRequired {
            structure: "Header".into(),
        }
        .in_field(|| FieldContext::new("Header", "size", "i32", 0));
        assert!(err.field_context().is_none());
        assert!(err.is_configuration());
    }

    #[test]
    fn test_display_variants() {
        let err = Error::EndOfStream {
            offset: 0x20,
            needed: 4,
            field: Some(FieldContext::new("Header", "count", "i32", 0x20)),
        };
        assert_eq!(
            err.to_string(),
            "unexpected end of stream at 0x20 (4 bytes needed) while reading Header.count (i32) at 0x20"
        );

        let err = Error::AmbiguousVersion {
            structure: "Mesh".into(),
            property: "field `flags` offset".into(),
            version: Some(2.0),
        };
        assert_eq!(
            err.to_string(),
            "Mesh: more than one field `flags` offset alternative matches v2"
        );

        let err = Error::VersionRequired {
            structure: "Mesh".into(),
        };
        assert_eq!(
            err.to_string(),
            "Mesh: layout is versioned but no version was supplied or read"
        );
    }

    #[test]
    fn test_io_error_passes_through() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(err.is_io());
        match &err {
            Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(std::error::Error::source(&err).is_some());

        let cloned = err.clone();
        assert!(cloned.is_io());
    }
}
