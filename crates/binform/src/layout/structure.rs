// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structure layouts and their per-version resolution cache.

use super::resolve::resolve_layout;
use super::{FieldKind, FieldLayout, ResolvedLayout};
use crate::config::RESOLVED_CACHE_CAPACITY;
use crate::construct::{ConstructionStrategy, Constructors};
use crate::error::{Error, Result};
use crate::flat;
use crate::order::ByteOrder;
use crate::version::{VersionKey, Versioned};
use lru::LruCache;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hit/miss counters of the resolved-layout cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    pub hits: u64,
    pub misses: u64,
}

/// Complete, validated description of a binary structure.
///
/// Built once per type (by the derive macro or a [`LayoutBuilder`]) and
/// shared read-only afterwards. Resolution per version is memoized in a
/// small LRU cache.
///
/// [`LayoutBuilder`]: super::LayoutBuilder
pub struct StructureLayout {
    name: String,
    fields: Vec<FieldLayout>,
    sizes: Versioned<u64>,
    byte_orders: Versioned<ByteOrder>,
    constructors: Constructors,
    positional: bool,
    flat: Option<u64>,
    resolved: RwLock<LruCache<VersionKey, Arc<ResolvedLayout>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

fn new_cache() -> RwLock<LruCache<VersionKey, Arc<ResolvedLayout>>> {
    let capacity = NonZeroUsize::new(RESOLVED_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
    RwLock::new(LruCache::new(capacity))
}

impl StructureLayout {
    pub(crate) fn new(
        name: String,
        fields: Vec<FieldLayout>,
        sizes: Versioned<u64>,
        byte_orders: Versioned<ByteOrder>,
        constructors: Constructors,
        positional: bool,
    ) -> Result<Self> {
        let mut layout = Self {
            name,
            fields,
            sizes,
            byte_orders,
            constructors,
            positional,
            flat: None,
            resolved: new_cache(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        };
        layout.validate()?;
        layout.flat = flat::qualifies(&layout);
        log::debug!(
            "[layout] {}: {} fields, positional={}, flat={:?}",
            layout.name,
            layout.fields.len(),
            layout.positional,
            layout.flat
        );
        Ok(layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn sizes(&self) -> &Versioned<u64> {
        &self.sizes
    }

    pub fn byte_orders(&self) -> &Versioned<ByteOrder> {
        &self.byte_orders
    }

    pub fn constructors(&self) -> Constructors {
        self.constructors
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Block size if the structure qualifies for the flat path.
    pub fn flat_size(&self) -> Option<u64> {
        self.flat
    }

    /// The field holding the self-described version, if any.
    pub fn version_field(&self) -> Option<&FieldLayout> {
        self.fields.iter().find(|field| field.version_number)
    }

    pub fn strategy(&self) -> Result<ConstructionStrategy> {
        self.constructors.select(&self.name)
    }

    /// Field set for `version`, memoized per distinct version.
    pub fn resolve(&self, version: Option<f64>) -> Result<Arc<ResolvedLayout>> {
        let key = VersionKey::new(version);

        if let Some(hit) = self.resolved.read().peek(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(hit));
        }

        let mut cache = self.resolved.write();
        if let Some(hit) = cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(hit));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolved = Arc::new(resolve_layout(self, version)?);
        cache.put(key, Arc::clone(&resolved));
        Ok(resolved)
    }

    pub fn resolve_stats(&self) -> ResolveStats {
        ResolveStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn validate(&self) -> Result<()> {
        let overlap = |property: String| Error::VersionOverlap {
            structure: self.name.clone(),
            property,
        };

        if !self.sizes.validate_overlap() {
            return Err(overlap("size".into()));
        }
        if !self.byte_orders.validate_overlap() {
            return Err(overlap("byte order".into()));
        }

        let mut names = HashSet::new();
        let mut version_fields = 0usize;
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(Error::invalid_layout(
                    &self.name,
                    format!("duplicate field '{}'", field.name),
                ));
            }

            if !field.offsets.validate_overlap() {
                return Err(overlap(format!("{}.offset", field.name)));
            }
            if !field.byte_orders.validate_overlap() {
                return Err(overlap(format!("{}.byte_order", field.name)));
            }
            if !field.store_types.validate_overlap() {
                return Err(overlap(format!("{}.store_type", field.name)));
            }
            if !field.size_cursor.validate_overlap() {
                return Err(overlap(format!("{}.size_cursor", field.name)));
            }

            match (self.positional, field.offsets.is_empty()) {
                (true, false) => {
                    return Err(Error::invalid_layout(
                        &self.name,
                        format!("positional field '{}' declares an offset", field.name),
                    ))
                }
                (false, true) => {
                    return Err(Error::invalid_layout(
                        &self.name,
                        format!("field '{}' has no offset", field.name),
                    ))
                }
                _ => {}
            }

            if !field.store_types.is_empty() && field.kind.leaf().wire_type().is_none() {
                return Err(Error::invalid_layout(
                    &self.name,
                    format!("store type on non-primitive field '{}'", field.name),
                ));
            }

            if field.may_be_size_cursor() {
                let integral = field.kind.wire_type().is_some_and(|w| w.is_integer())
                    && field.store_types.iter().all(|(w, _)| w.is_integer());
                if !integral {
                    return Err(Error::invalid_layout(
                        &self.name,
                        format!("size cursor '{}' must be an integer", field.name),
                    ));
                }
            }

            if field.version_number {
                version_fields += 1;
                self.validate_version_field(field)?;
            }
        }

        if version_fields > 1 {
            return Err(Error::invalid_layout(
                &self.name,
                "more than one version number field",
            ));
        }
        Ok(())
    }

    fn validate_version_field(&self, field: &FieldLayout) -> Result<()> {
        let reject = |reason: &str| {
            Err(Error::invalid_layout(
                &self.name,
                format!("version field '{}' {}", field.name, reason),
            ))
        };
        if self.positional {
            return reject("cannot be read from a positional layout");
        }
        if !matches!(field.kind, FieldKind::Primitive(wire) if wire.is_integer() || wire.is_float())
        {
            return reject("must be numeric");
        }
        if field.offsets.is_conditional() || field.offsets.len() != 1 {
            return reject("needs one unconditional offset");
        }
        if !field.applicability.is_unbounded()
            || field.byte_orders.is_conditional()
            || field.store_types.is_conditional()
        {
            return reject("cannot depend on the version");
        }
        Ok(())
    }
}

impl Clone for StructureLayout {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
            sizes: self.sizes.clone(),
            byte_orders: self.byte_orders.clone(),
            constructors: self.constructors,
            positional: self.positional,
            flat: self.flat,
            resolved: new_cache(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl fmt::Debug for StructureLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureLayout")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(|field| field.name.as_str()).collect::<Vec<_>>(),
            )
            .field("sizes", &self.sizes)
            .field("positional", &self.positional)
            .field("flat", &self.flat)
            .finish()
    }
}
