//! Session memoization.
//!
//! egui repaints many times per second; nothing below is recomputed unless
//! its key changes or the caches are cleared (Reload data / new data root).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use super::crs::Crs;
use super::loader::{load_table, load_vector};
use super::model::{FeatureLayer, RawTable};

// ---------------------------------------------------------------------------
// LayerCache – loaded files by path
// ---------------------------------------------------------------------------

/// Path-keyed store of parsed input files. Vector layers are keyed together
/// with the source-reference override they were loaded under.
#[derive(Default)]
pub struct LayerCache {
    vectors: HashMap<(PathBuf, Option<Crs>), Arc<FeatureLayer>>,
    tables: HashMap<PathBuf, Arc<RawTable>>,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load, null-filter and reproject once per path.
    pub fn vector(&mut self, path: &Path, crs_override: Option<Crs>) -> Result<Arc<FeatureLayer>> {
        let key = (path.to_path_buf(), crs_override);
        if let Some(layer) = self.vectors.get(&key) {
            log::debug!("cache hit: {}", path.display());
            return Ok(Arc::clone(layer));
        }
        let layer = Arc::new(load_vector(path, crs_override)?);
        self.vectors.insert(key, Arc::clone(&layer));
        Ok(layer)
    }

    pub fn table(&mut self, path: &Path) -> Result<Arc<RawTable>> {
        if let Some(table) = self.tables.get(path) {
            log::debug!("cache hit: {}", path.display());
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load_table(path)?);
        self.tables.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.vectors.len() + self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
        self.tables.clear();
    }
}

// ---------------------------------------------------------------------------
// Memo – one computed panel model per selection key
// ---------------------------------------------------------------------------

/// Remembers the last value computed for a key. A different key (or a
/// [`Memo::clear`]) triggers recomputation on the next [`Memo::get_or_compute`].
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
        if !self.is_cached(&key) {
            self.slot = None;
        }
        &self.slot.get_or_insert_with(|| (key, compute())).1
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_cached(&self, key: &K) -> bool {
        self.slot.as_ref().is_some_and(|(k, _)| k == key)
    }
}
