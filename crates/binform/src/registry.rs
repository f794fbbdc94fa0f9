// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent registry of structure layouts.
//!
//! Maps a type identifier to a shared [`StructureLayout`], whether built by
//! hand with the builder API or taken from a derived type. Lookups go
//! through a sharded `DashMap`; statistics sit behind a `parking_lot` lock.

use crate::error::Result;
use crate::layout::StructureLayout;
use crate::walker::BinaryObject;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Registry hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
    pub registered: u64,
}

#[derive(Debug, Default)]
pub struct LayoutRegistry {
    layouts: DashMap<String, Arc<StructureLayout>>,
    stats: RwLock<RegistryStats>,
}

impl LayoutRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `layout` under its structure name, replacing any previous
    /// entry. Returns the replaced layout.
    pub fn register(&self, layout: StructureLayout) -> Option<Arc<StructureLayout>> {
        self.register_as(layout.name().to_string(), Arc::new(layout))
    }

    pub fn register_as(
        &self,
        id: impl Into<String>,
        layout: Arc<StructureLayout>,
    ) -> Option<Arc<StructureLayout>> {
        let id = id.into();
        log::debug!("[registry] register {} ({} fields)", id, layout.fields().len());
        self.stats.write().registered += 1;
        self.layouts.insert(id, layout)
    }

    /// Register the layout of a derived type under its structure name.
    pub fn register_type<T: BinaryObject>(&self) -> Result<Arc<StructureLayout>> {
        let layout = Arc::new(T::layout()?.clone());
        self.register_as(layout.name().to_string(), Arc::clone(&layout));
        Ok(layout)
    }

    pub fn get(&self, id: &str) -> Option<Arc<StructureLayout>> {
        match self.layouts.get(id) {
            Some(entry) => {
                self.stats.write().hits += 1;
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.stats.write().misses += 1;
                log::trace!("[registry] miss {}", id);
                None
            }
        }
    }

    /// Return the layout registered as `id`, building and registering it on
    /// first use. A failed build registers nothing.
    pub fn get_or_try_insert_with<F>(&self, id: &str, build: F) -> Result<Arc<StructureLayout>>
    where
        F: FnOnce() -> Result<StructureLayout>,
    {
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }
        let entry = self
            .layouts
            .entry(id.to_string())
            .or_try_insert_with(|| build().map(Arc::new))?;
        Ok(Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<StructureLayout>> {
        self.layouts.remove(id).map(|(_, layout)| layout)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layouts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Registered identifiers, in no particular order.
    pub fn ids(&self) -> Vec<String> {
        self.layouts.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn stats(&self) -> RegistryStats {
        *self.stats.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::layout::{FieldBuilder, LayoutBuilder};
    use std::thread;

    fn header() -> StructureLayout {
        LayoutBuilder::new("Header")
            .field(FieldBuilder::of::<u32>("magic").offset(0))
            .build()
            .expect("layout")
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = LayoutRegistry::new();
        assert!(registry.register(header()).is_none());
        assert!(registry.contains("Header"));
        assert!(registry.get("Header").is_some());
        assert!(registry.get("Missing").is_none());

        let stats = registry.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.registered, 1);
    }

    #[test]
    fn test_failed_build_registers_nothing() {
        let registry = LayoutRegistry::new();
        let result = registry.get_or_try_insert_with("Broken", || {
            Err(Error::InvalidConfig("nope".into()))
        });
        assert!(result.is_err());
        assert!(registry.is_empty());

        let built = registry
            .get_or_try_insert_with("Header", || Ok(header()))
            .expect("build");
        let again = registry
            .get_or_try_insert_with("Header", || panic!("built twice"))
            .expect("cached");
        assert!(Arc::ptr_eq(&built, &again));
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = Arc::new(LayoutRegistry::new());
        registry.register(header());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let layout = registry.get("Header").expect("layout");
                    layout.resolve(None).expect("resolve").fields.len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread"), 1);
        }
        assert_eq!(registry.stats().hits, 4);
    }
}
