// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version ranges and version-scoped alternatives.
//!
//! Every layout-affecting property (offset, total size, byte order, store type,
//! size cursor) is stored as a [`Versioned`] set of alternatives. Resolution
//! against an active version yields exactly one alternative, none (the property
//! does not exist for that version), or an ambiguity error.
//!
//! Range semantics:
//! - `min` is inclusive, `max` is exclusive;
//! - `min == max` selects exactly that version;
//! - an unbounded range also matches the implicit (unversioned) context, a
//!   bounded range never does.

use std::fmt;

/// Half-open version interval `[min, max)`, or a single version when
/// `min == max`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VersionRange {
    min: Option<f64>,
    max: Option<f64>,
}

impl VersionRange {
    /// Range matching every version, including the unversioned context.
    pub const fn any() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    pub const fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// `version >= min`
    pub const fn since(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    /// `version < max`
    pub const fn until(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    /// `min <= version < max`
    pub const fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    /// Exactly `version`.
    pub const fn exact(version: f64) -> Self {
        Self::new(Some(version), Some(version))
    }

    pub const fn min(&self) -> Option<f64> {
        self.min
    }

    pub const fn max(&self) -> Option<f64> {
        self.max
    }

    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn is_exact(&self) -> bool {
        matches!((self.min, self.max), (Some(a), Some(b)) if a == b)
    }

    pub fn contains(&self, version: Option<f64>) -> bool {
        let Some(v) = version else {
            return self.is_unbounded();
        };
        if let (Some(a), Some(b)) = (self.min, self.max) {
            if a == b {
                return v == a;
            }
        }
        self.min.map_or(true, |min| v >= min) && self.max.map_or(true, |max| v < max)
    }

    /// Whether some version (or the unversioned context) matches both ranges.
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        if self.is_unbounded() && other.is_unbounded() {
            return true;
        }
        if self.is_exact() {
            return other.contains(self.min);
        }
        if other.is_exact() {
            return self.contains(other.min);
        }

        let lo = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let hi = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        match (lo, hi) {
            (Some(lo), Some(hi)) => lo < hi,
            _ => true,
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => write!(f, "any"),
            (Some(a), Some(b)) if a == b => write!(f, "={}", a),
            (Some(a), None) => write!(f, ">={}", a),
            (None, Some(b)) => write!(f, "<{}", b),
            (Some(a), Some(b)) => write!(f, "[{}, {})", a, b),
        }
    }
}

/// Resolution matched more than one alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub matches: usize,
}

/// A set of `(value, range)` alternatives for one property.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    alternatives: Vec<(T, VersionRange)>,
}

impl<T> Default for Versioned<T> {
    fn default() -> Self {
        Self {
            alternatives: Vec::new(),
        }
    }
}

impl<T> Versioned<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// One alternative valid for every version.
    pub fn single(value: T) -> Self {
        Self {
            alternatives: vec![(value, VersionRange::any())],
        }
    }

    pub fn push(&mut self, value: T, range: VersionRange) {
        self.alternatives.push((value, range));
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &VersionRange)> {
        self.alternatives.iter().map(|(value, range)| (value, range))
    }

    /// Select the alternative applicable to `version`.
    pub fn resolve(&self, version: Option<f64>) -> Result<Option<&T>, AmbiguousMatch> {
        let mut found = None;
        let mut matches = 0usize;
        for (value, range) in &self.alternatives {
            if range.contains(version) {
                matches += 1;
                if found.is_none() {
                    found = Some(value);
                }
            }
        }
        if matches > 1 {
            return Err(AmbiguousMatch { matches });
        }
        Ok(found)
    }

    /// `true` when no two alternatives share a version.
    pub fn validate_overlap(&self) -> bool {
        for (i, (_, a)) in self.alternatives.iter().enumerate() {
            for (_, b) in &self.alternatives[i + 1..] {
                if a.overlaps(b) {
                    return false;
                }
            }
        }
        true
    }

    /// Whether resolution can succeed without a version.
    pub fn supports_implicit(&self) -> bool {
        self.alternatives.is_empty() || self.alternatives.iter().any(|(_, r)| r.is_unbounded())
    }

    /// `true` when any alternative is restricted to some versions.
    pub fn is_conditional(&self) -> bool {
        self.alternatives.iter().any(|(_, r)| !r.is_unbounded())
    }
}

/// Hashable form of an optional version, used to key resolution caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionKey(Option<u64>);

impl VersionKey {
    pub fn new(version: Option<f64>) -> Self {
        // Normalize -0.0 so both zeros share a cache slot.
        Self(version.map(|v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }))
    }
}
