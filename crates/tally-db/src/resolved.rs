//! Process-wide memory of the last host that accepted a connection.

use std::sync::{Arc, Mutex, PoisonError};

/// Shared, cheaply clonable cache of the last successfully connected host.
///
/// Owned by the composition root and handed to every connection manager.
/// Reads and writes are serialized by a mutex that is never held across an
/// await point.
#[derive(Debug, Clone, Default)]
pub struct ResolvedHost {
    inner: Arc<Mutex<Option<String>>>,
}

impl ResolvedHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, host: &str) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(host.to_string());
    }

    /// Forget the cached host, but only if it is still `host`.
    ///
    /// A concurrent request may already have replaced it with a host that
    /// works; that newer value is kept.
    pub fn clear_if(&self, host: &str) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_deref() == Some(host) {
            *guard = None;
            true
        } else {
            false
        }
    }
}
