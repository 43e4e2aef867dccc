//! Read path shared by every repository.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::EventQueue;
use super::inflight::InFlightFetches;
use super::keys::QueryKey;
use super::store::QueryStore;
use super::trigger::CacheTrigger;
use super::value::Cacheable;

/// Owns the store, the event pipeline and the single-flight table.
pub struct CacheCoordinator {
    store: Arc<QueryStore>,
    trigger: CacheTrigger,
    inflight: InFlightFetches,
}

impl CacheCoordinator {
    pub fn new(config: &CacheConfig) -> Self {
        let store = Arc::new(QueryStore::new(config));
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            config.clone(),
            Arc::clone(&store),
            Arc::clone(&queue),
        ));

        Self {
            store,
            trigger: CacheTrigger::new(queue, consumer),
            inflight: InFlightFetches::new(),
        }
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn trigger(&self) -> &CacheTrigger {
        &self.trigger
    }

    /// Returns the fresh snapshot for `key`, loading it on a miss.
    ///
    /// Concurrent callers for the same key share one load. A load that was
    /// superseded by a write or invalidation still answers its caller but is
    /// not stored.
    pub async fn fetch<T, E, F, Fut>(&self, key: QueryKey, load: F) -> Result<T, E>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.store.get_typed::<T>(&key) {
            return Ok(value);
        }

        let _guard = self.inflight.acquire(&key).await;
        if self.store.is_fresh(&key)
            && let Some(value) = self.store.peek_typed::<T>(&key)
        {
            debug!(key = ?key, "Served by coalesced fetch");
            return Ok(value);
        }

        let ticket = self.store.begin_fetch(&key);
        match load().await {
            Ok(value) => {
                self.store.complete_fetch(ticket, value.clone().into_cached());
                Ok(value)
            }
            Err(err) => {
                self.store.abandon_fetch(ticket);
                Err(err)
            }
        }
    }

    /// Drops every snapshot. Used when the identity behind the cache changes.
    pub fn teardown(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use agora_api_types::Tag;

    use super::*;
    use crate::cache::keys::KeyPrefix;

    fn tag(id: u64) -> Tag {
        Tag {
            id,
            name: "t".to_string(),
            color: "#000".to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = CacheCoordinator::new(&CacheConfig::default());
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let value: Result<Tag, ()> = cache
                .fetch(QueryKey::Tag(1), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(tag(1))
                })
                .await;
            assert_eq!(value, Ok(tag(1)));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidated_key_is_refetched() {
        let cache = CacheCoordinator::new(&CacheConfig::default());
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let load = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(tag(1))
        };

        cache.fetch(QueryKey::Tag(1), load).await.expect("first");
        cache
            .store()
            .invalidate(&KeyPrefix::Exact(QueryKey::Tag(1)));
        cache.fetch(QueryKey::Tag(1), load).await.expect("second");

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_load_leaves_cache_empty() {
        let cache = CacheCoordinator::new(&CacheConfig::default());
        let result: Result<Tag, &str> = cache.fetch(QueryKey::Tag(2), || async { Err("down") }).await;
        assert_eq!(result, Err("down"));
        assert!(cache.store().peek(&QueryKey::Tag(2)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_load() {
        let cache = Arc::new(CacheCoordinator::new(&CacheConfig::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .fetch(QueryKey::Tag(3), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, ()>(tag(3))
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.expect("task"), Ok(tag(3)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
