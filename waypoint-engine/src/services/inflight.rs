//! In-flight generation leases
//!
//! Concurrent requests for the same fingerprint or slug would otherwise each
//! miss the store and each call the generation service. A caller takes the
//! lease for its key before generating and re-checks the store once it holds
//! it; later callers wait for the holder to finish. Waiting is bounded: once `max_wait`
//! elapses the caller gives up on the lease and makes its own attempt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

/// Outcome of [`InflightLeases::acquire`]
pub enum LeaseOutcome {
    /// Lease held; `waited` is true when another holder ran first
    Acquired { lease: Lease, waited: bool },
    /// Gave up waiting for the current holder
    Expired,
}

/// Keyed lease registry
pub struct InflightLeases {
    inflight: Registry,
    max_wait: Duration,
}

impl InflightLeases {
    pub fn new(max_wait: Duration) -> Self {
        Self {
            inflight: Arc::new(StdMutex::new(HashMap::new())),
            max_wait,
        }
    }

    pub async fn acquire(&self, key: &str) -> LeaseOutcome {
        let lock = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                inflight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        if let Ok(guard) = Arc::clone(&lock).try_lock_owned() {
            return LeaseOutcome::Acquired {
                lease: self.lease(key, lock, guard),
                waited: false,
            };
        }

        tracing::debug!(key = %key, "Waiting on in-flight lease");
        match tokio::time::timeout(self.max_wait, Arc::clone(&lock).lock_owned()).await {
            Ok(guard) => LeaseOutcome::Acquired {
                lease: self.lease(key, lock, guard),
                waited: true,
            },
            Err(_) => {
                tracing::warn!(
                    key = %key,
                    max_wait_ms = self.max_wait.as_millis() as u64,
                    "In-flight lease wait expired, proceeding without lease"
                );
                LeaseOutcome::Expired
            }
        }
    }

    /// Keys currently registered (held or awaited)
    pub fn active_keys(&self) -> usize {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn lease(&self, key: &str, lock: Arc<Mutex<()>>, guard: OwnedMutexGuard<()>) -> Lease {
        Lease {
            key: key.to_string(),
            registry: Arc::clone(&self.inflight),
            lock,
            _guard: guard,
        }
    }
}

/// Held lease; released on drop
pub struct Lease {
    key: String,
    registry: Registry,
    lock: Arc<Mutex<()>>,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut inflight = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        // Registry entry, this lease and its guard: nobody else is waiting
        if Arc::strong_count(&self.lock) <= 3 {
            if let Some(current) = inflight.get(&self.key) {
                if Arc::ptr_eq(current, &self.lock) {
                    inflight.remove(&self.key);
                }
            }
        }
    }
}
