//! VIS path store.
//!
//! The store keeps the current value of every path an adapter exposes,
//! together with the set of paths the consumer has subscribed to. Both live
//! behind one mutex so a write and the subscription check that follows it
//! observe the same state.
//!
//! No method awaits or performs I/O; callers do upstream work before or
//! after, never while the lock is held.

use crate::error::{AdapterError, Result};
use crate::model::{DataEntry, DataMap, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, DataEntry>,
    subscriptions: HashSet<String>,
}

impl Inner {
    fn check_known<'a, I>(&self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for path in paths {
            if !self.entries.contains_key(path) {
                return Err(AdapterError::PathNotFound(path.clone()));
            }
        }
        Ok(())
    }

    /// Validate every path, then overwrite. Returns the changed subset.
    fn apply(&mut self, updates: DataMap) -> Result<DataMap> {
        self.check_known(updates.keys())?;

        let mut changed = DataMap::new();
        for (path, value) in updates {
            if let Some(entry) = self.entries.get_mut(&path) {
                if entry.value != value {
                    entry.value = value.clone();
                    changed.insert(path, value);
                }
            }
        }
        Ok(changed)
    }
}

/// In-memory path store with subscription tracking.
///
/// Paths are registered while the adapter is being built and are never
/// removed afterwards; only their values change.
#[derive(Debug, Default)]
pub struct PathStore {
    inner: Mutex<Inner>,
}

impl PathStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, DataEntry)>,
        K: Into<String>,
    {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for (path, entry) in entries {
                inner.entries.insert(path.into(), entry);
            }
        }
        store
    }

    // Data stays consistent across a panic: every mutation happens after
    // validation, so a poisoned guard is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a path. Returns false if it already existed (entry replaced).
    pub fn insert(&self, path: impl Into<String>, entry: DataEntry) -> bool {
        self.lock().entries.insert(path.into(), entry).is_none()
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True until the adapter registers its first path.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Check whether a path is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.lock().entries.contains_key(path)
    }

    /// All registered paths, in no particular order.
    pub fn path_list(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    /// Whether the path can be accessed without authorization.
    pub fn is_path_public(&self, path: &str) -> Result<bool> {
        self.lock()
            .entries
            .get(path)
            .map(|entry| entry.is_public)
            .ok_or_else(|| AdapterError::PathNotFound(path.to_string()))
    }

    /// Read the current values of `paths` as one consistent snapshot.
    pub fn get_data(&self, paths: &[String]) -> Result<DataMap> {
        let inner = self.lock();
        let mut out = DataMap::with_capacity(paths.len());

        for path in paths {
            let entry = inner
                .entries
                .get(path)
                .ok_or_else(|| AdapterError::PathNotFound(path.clone()))?;
            out.insert(path.clone(), entry.value.clone());
        }

        Ok(out)
    }

    /// Read a single value.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.lock().entries.get(path).map(|e| e.value.clone())
    }

    /// Overwrite values, all or nothing.
    ///
    /// Fails with `PathNotFound` if any path is unknown, in which case no
    /// value is touched. On success returns the paths whose value actually
    /// changed, mapped to their new values.
    pub fn set_data(&self, updates: DataMap) -> Result<DataMap> {
        self.lock().apply(updates)
    }

    /// Overwrite values and report the changes the consumer subscribed to.
    ///
    /// Returns `Some` only when at least one subscribed path changed. The
    /// write and the subscription lookup happen under a single lock.
    pub fn update(&self, updates: DataMap) -> Result<Option<DataMap>> {
        let mut inner = self.lock();
        let changed = inner.apply(updates)?;

        let notify: DataMap = changed
            .into_iter()
            .filter(|(path, _)| inner.subscriptions.contains(path))
            .collect();

        Ok(if notify.is_empty() { None } else { Some(notify) })
    }

    /// Subscribe to changes of `paths`.
    ///
    /// Fails with `PathNotFound` without subscribing anything if a path is
    /// unknown. Subscribing twice is harmless.
    pub fn subscribe(&self, paths: &[String]) -> Result<()> {
        let mut inner = self.lock();
        inner.check_known(paths)?;
        inner.subscriptions.extend(paths.iter().cloned());
        Ok(())
    }

    /// Stop reporting changes of `paths`. Unknown or unsubscribed paths are ignored.
    pub fn unsubscribe(&self, paths: &[String]) {
        let mut inner = self.lock();
        for path in paths {
            inner.subscriptions.remove(path);
        }
    }

    /// Drop every subscription.
    pub fn unsubscribe_all(&self) {
        self.lock().subscriptions.clear();
    }

    /// Check whether changes to `path` are reported.
    pub fn is_subscribed(&self, path: &str) -> bool {
        self.lock().subscriptions.contains(path)
    }

    /// Currently subscribed paths, in no particular order.
    pub fn subscribed_paths(&self) -> Vec<String> {
        self.lock().subscriptions.iter().cloned().collect()
    }
}
