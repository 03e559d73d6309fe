// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory offset backend fake for testing without filesystem I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use wcs_core::{OffsetBackend, StoreError};

/// In-memory implementation of [`OffsetBackend`] for testing.
///
/// Clones share state, so a test can hand one clone to an
/// [`OffsetTable`](wcs_core::OffsetTable) and inspect the other. Load/save
/// attempts are counted and either direction can be made to fail.
///
/// # Example
///
/// ```
/// use wcs_dry_tests::InMemoryOffsetBackend;
/// use wcs_core::{OffsetTable, STATE_KEY};
///
/// let backend = InMemoryOffsetBackend::new();
/// let _table = OffsetTable::load(backend.clone()).unwrap();
///
/// assert_eq!(backend.load_count(), 1);
/// assert_eq!(backend.save_count(), 1);
/// assert!(backend.contains_key(STATE_KEY));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryOffsetBackend {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryOffsetBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend whose `key` already holds `data`.
    pub fn with_blob(key: &str, data: impl Into<Vec<u8>>) -> Self {
        let backend = Self::new();
        backend.put(key, data);
        backend
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the blob for `key` without counting a save.
    pub fn put(&self, key: &str, data: impl Into<Vec<u8>>) {
        self.lock().data.insert(key.to_owned(), data.into());
    }

    /// Current blob for `key`, without counting a load.
    pub fn blob(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().data.get(key).cloned()
    }

    /// Configure the backend to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Configure the backend to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Number of `load_raw` attempts, including failed ones.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Number of `save_raw` attempts, including failed ones.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Check if a key exists in the backend.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }
}

impl OffsetBackend for InMemoryOffsetBackend {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let mut inner = self.lock();
        inner.load_count += 1;

        if inner.fail_on_load {
            return Err(StoreError::Other("simulated load failure".into()));
        }

        inner.data.get(key).cloned().ok_or(StoreError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.save_count += 1;

        if inner.fail_on_save {
            return Err(StoreError::Other("simulated save failure".into()));
        }

        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
