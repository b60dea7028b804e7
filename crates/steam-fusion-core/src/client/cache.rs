//! Values cached against a file modification stamp.

use crate::error::Result;
use std::fmt::Debug;
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::trace;

/// A single cached value that stays valid while its source stamp is unchanged.
///
/// The stamp is supplied by the caller (usually a file mtime, or an mtime plus
/// a file count when entries can disappear), which keeps the cache itself free
/// of I/O. Lookups and refreshes happen under one lock, so
/// concurrent callers never compute the same value twice for a stamp.
#[derive(Debug)]
pub struct ModifiedCache<T: Clone, S = SystemTime> {
    entry: Mutex<Option<(S, T)>>,
}

impl<T: Clone, S> Default for ModifiedCache<T, S> {
    fn default() -> Self {
        Self {
            entry: Mutex::new(None),
        }
    }
}

impl<T: Clone, S: PartialEq + Debug> ModifiedCache<T, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `stamp`, or compute and store a fresh one.
    ///
    /// A failed compute leaves the previous entry in place.
    pub fn get_or_refresh<F>(&self, stamp: S, compute: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut entry = self
            .entry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((cached_stamp, value)) = entry.as_ref() {
            if *cached_stamp == stamp {
                trace!("Cache hit for stamp {:?}", stamp);
                return Ok(value.clone());
            }
        }

        let value = compute()?;
        *entry = Some((stamp, value.clone()));
        Ok(value)
    }

    /// Drop the cached entry.
    pub fn invalidate(&self) {
        let mut entry = self
            .entry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *entry = None;
    }
}
