//! Per-key single-flight for network reads.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::keys::QueryKey;

type Slot = Arc<Mutex<()>>;

/// Serializes reads of the same key; different keys never wait on each other.
#[derive(Default)]
pub struct InFlightFetches {
    slots: Arc<DashMap<QueryKey, Slot>>,
}

impl InFlightFetches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other read of `key` is running and claims the slot.
    ///
    /// Callers must re-check the cache after acquiring: the previous holder
    /// has usually stored the value they were about to fetch.
    pub async fn acquire(&self, key: &QueryKey) -> FetchGuard {
        use dashmap::mapref::entry::Entry;

        let slot = match self.slots.entry(key.clone()) {
            Entry::Vacant(vacant) => {
                let slot = Slot::default();
                vacant.insert(Arc::clone(&slot));
                slot
            }
            Entry::Occupied(occupied) => {
                debug!(key = ?key, "Joining in-flight fetch");
                Arc::clone(occupied.get())
            }
        };

        let permit = Arc::clone(&slot).lock_owned().await;
        FetchGuard {
            key: key.clone(),
            slot,
            slots: Arc::clone(&self.slots),
            _permit: permit,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }
}

pub struct FetchGuard {
    key: QueryKey,
    slot: Slot,
    slots: Arc<DashMap<QueryKey, Slot>>,
    _permit: OwnedMutexGuard<()>,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        // Handles: the map, `self.slot` and the permit. Anything beyond is a waiter.
        self.slots.remove_if(&self.key, |_, current| {
            Arc::ptr_eq(current, &self.slot) && Arc::strong_count(current) <= 3
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn guard_release_clears_slot() {
        let inflight = InFlightFetches::new();
        {
            let _guard = inflight.acquire(&QueryKey::Session).await;
            assert_eq!(inflight.in_flight(), 1);
        }
        assert_eq!(inflight.in_flight(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let inflight = InFlightFetches::new();
        let _a = inflight.acquire(&QueryKey::Post(1)).await;
        let _b = inflight.acquire(&QueryKey::Post(2)).await;
        assert_eq!(inflight.in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn same_key_runs_one_at_a_time() {
        let inflight = Arc::new(InFlightFetches::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let inflight = Arc::clone(&inflight);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _guard = inflight.acquire(&QueryKey::Tag(1)).await;
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.expect("task");
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(inflight.in_flight(), 0);
    }
}
