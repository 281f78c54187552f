use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use foundation::canonical_key;
use foundation::math::StableF64;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::hierarchy::HierarchyIndex;
use crate::store::{Exclusion, GeometryStore};

/// Everything that determines the content of a [`GeometryStore`].
///
/// Exclusions are canonicalized, sorted and de-duplicated, so two keys built
/// from the same pairs in a different order or casing compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreKey {
    pub path: PathBuf,
    pub adm2_column: String,
    pub adm3_column: String,
    pub simplify_tolerance: Option<StableF64>,
    pub exclusions: Vec<Exclusion>,
}

impl StoreKey {
    pub fn new(
        path: impl Into<PathBuf>,
        adm2_column: impl Into<String>,
        adm3_column: impl Into<String>,
        exclusions: &[Exclusion],
        simplify_tolerance: Option<f64>,
    ) -> Self {
        let mut exclusions: Vec<Exclusion> = exclusions
            .iter()
            .map(|(d, c)| (canonical_key(d), canonical_key(c)))
            .collect();
        exclusions.sort();
        exclusions.dedup();
        Self {
            path: path.into(),
            adm2_column: adm2_column.into(),
            adm3_column: adm3_column.into(),
            simplify_tolerance: simplify_tolerance.map(StableF64),
            exclusions,
        }
    }

    pub fn load(&self) -> Result<GeometryStore, StoreError> {
        GeometryStore::load(
            &self.path,
            &self.adm2_column,
            &self.adm3_column,
            &self.exclusions,
            self.simplify_tolerance.map(|t| t.0),
        )
    }
}

/// A store together with the index derived from it.
#[derive(Debug)]
pub struct LoadedBoundaries {
    pub store: GeometryStore,
    pub index: HierarchyIndex,
}

impl LoadedBoundaries {
    pub fn new(store: GeometryStore) -> Self {
        let index = HierarchyIndex::build(&store);
        Self { store, index }
    }
}

/// Construct-once cache of loaded boundary datasets.
///
/// Each key owns a `OnceCell`; concurrent first accesses for the same key
/// block on that cell, so a dataset is loaded at most once per key until it
/// is invalidated. Failed loads leave the cell empty and are retried on the
/// next access.
#[derive(Debug, Default)]
pub struct StoreCache {
    entries: Mutex<BTreeMap<StoreKey, Arc<OnceCell<Arc<LoadedBoundaries>>>>>,
    loads: AtomicU64,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, key: &StoreKey) -> Result<Arc<LoadedBoundaries>, StoreError> {
        self.get_or_load_with(key, StoreKey::load)
    }

    /// Same as [`StoreCache::get_or_load`] with a caller-supplied loader.
    pub fn get_or_load_with<F>(
        &self,
        key: &StoreKey,
        loader: F,
    ) -> Result<Arc<LoadedBoundaries>, StoreError>
    where
        F: FnOnce(&StoreKey) -> Result<GeometryStore, StoreError>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            entries.entry(key.clone()).or_default().clone()
        };

        cell.get_or_try_init(|| {
            self.loads.fetch_add(1, Ordering::Relaxed);
            debug!(path = %key.path.display(), "loading boundary dataset");
            loader(key).map(|store| Arc::new(LoadedBoundaries::new(store)))
        })
        .cloned()
    }

    /// Returns the cached entry without loading.
    pub fn get(&self, key: &StoreKey) -> Option<Arc<LoadedBoundaries>> {
        let entries = self.entries.lock();
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    pub fn invalidate(&self, key: &StoreKey) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Drops every entry built from `path`, whatever its tolerance or
    /// exclusions. Returns the number of entries removed.
    pub fn invalidate_path(&self, path: &Path) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|k, _| k.path != path);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of loader invocations since construction.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}
