//! Thread-shareable registry behind one coarse lock

use super::Registry;
use crate::error::{AccessError, AccessResult};
use std::sync::{Arc, Mutex};

/// A [`Registry`] that can be cloned across threads
///
/// Every call holds the lock for its whole duration, so a clip-then-store
/// write is never interleaved with another writer of the same cell.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Run `f` with exclusive access to the registry
    pub fn with<R>(&self, f: impl FnOnce(&mut Registry) -> AccessResult<R>) -> AccessResult<R> {
        let mut guard = self.inner.lock().map_err(|_| {
            tracing::warn!("Registry lock poisoned");
            AccessError::Generic
        })?;
        f(&mut guard)
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}
