use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::models::SiteSettings;

/// Cloneable handle to the cached settings singleton. Every component that
/// needs credentials holds a clone and reads a snapshot per operation, so a
/// replacement takes effect on the very next call. Replacement swaps the
/// whole `Arc`, never individual fields, so readers see either the old or
/// the new record, not a mix.
#[derive(Clone)]
pub struct SettingsHandle {
    inner: Arc<Inner>,
}

struct Inner {
    current: RwLock<Arc<SiteSettings>>,
    version: AtomicU64,
}

impl SettingsHandle {
    pub fn new(initial: SiteSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(Arc::new(initial)),
                version: AtomicU64::new(1),
            }),
        }
    }

    /// Current settings snapshot.
    pub fn get(&self) -> Arc<SiteSettings> {
        self.inner.current.read().unwrap().clone()
    }

    pub fn replace(&self, next: SiteSettings) {
        *self.inner.current.write().unwrap() = Arc::new(next);
        self.inner.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Monotonic counter bumped on every replacement.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }
}
