//! Per-key append serialization.
//!
//! The store rewrites the whole transcript on every append (read full,
//! append, write full), so two concurrent appends for the same session key
//! would race and drop a turn. Holding a per-key async mutex across the
//! read-modify-write removes the race while leaving distinct keys fully
//! independent.

use crate::transcript::SessionKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of per-session-key mutexes.
///
/// Entries are never evicted; they live as long as the session rows they
/// guard (session keys themselves are immortal until explicitly deleted, and
/// no deletion path exists).
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one session key, creating it on first use.
    pub async fn acquire(&self, key: &SessionKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
