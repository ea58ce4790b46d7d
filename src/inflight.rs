//! Per-key async locks so at most one generation runs for a key at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::Mutex;

type LockMap = HashMap<String, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct KeyedLocks {
    // Held only for map edits, never across an await.
    inflight: StdMutex<LockMap>,
}

/// One caller's claim on a key. Dropping it, whether the caller finished or
/// was cancelled, removes the map entry once nobody else holds the key.
struct Claim<'a> {
    locks: &'a KeyedLocks,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut inflight = self.locks.map();
        // Only the map and this claim still reference the lock: nobody is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            inflight.remove(self.key);
        }
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `fut` while holding the lock for `key`. Callers for the same key
    /// queue behind each other; different keys never block each other.
    pub async fn run<F, T>(&self, key: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let claim = Claim {
            locks: self,
            key,
            lock: Arc::clone(
                self.map()
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            ),
        };

        let _guard = claim.lock.lock().await;
        fut.await
    }

    /// Number of keys currently locked or waited on.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
