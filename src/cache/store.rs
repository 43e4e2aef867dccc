//! Query snapshot storage.
//!
//! One LRU holds every snapshot. Each key also carries a generation that is
//! bumped by writes and invalidations; a network read started under an older
//! generation is discarded when it completes. The generation is dropped once
//! the key has neither a snapshot nor a read in flight.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use super::config::CacheConfig;
use super::keys::{KeyPrefix, QueryKey};
use super::lock::{rw_read, rw_write};
use super::value::{CachedValue, Cacheable};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "agora_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "agora_cache_miss_total";
pub(crate) const METRIC_CACHE_EVICT: &str = "agora_cache_evict_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "agora_cache_invalidate_total";
pub(crate) const METRIC_CACHE_DISCARD: &str = "agora_cache_discard_total";

pub type Generation = u64;

/// Proof that a network read for `key` started at `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: QueryKey,
    pub generation: Generation,
}

#[derive(Debug, Clone)]
struct Slot {
    value: CachedValue,
    stale: bool,
}

/// Generation bookkeeping for one key. `born` tells tickets issued before a
/// `remove` or `clear` apart from the current ones.
#[derive(Debug, Clone, Copy)]
struct Lineage {
    born: Generation,
    generation: Generation,
    in_flight: usize,
}

impl Lineage {
    fn new(generation: Generation) -> Self {
        Self {
            born: generation,
            generation,
            in_flight: 0,
        }
    }
}

struct Inner {
    entries: LruCache<QueryKey, Slot>,
    lineages: HashMap<QueryKey, Lineage>,
}

impl Inner {
    /// Retires `ticket` and returns the key's current generation.
    fn settle(&mut self, ticket: &FetchTicket) -> Option<Generation> {
        let lineage = self.lineages.get_mut(&ticket.key)?;
        if ticket.generation >= lineage.born {
            lineage.in_flight = lineage.in_flight.saturating_sub(1);
        }
        Some(lineage.generation)
    }

    fn release(&mut self, key: &QueryKey) {
        let idle = self
            .lineages
            .get(key)
            .is_some_and(|lineage| lineage.in_flight == 0);
        if idle && !self.entries.contains(key) {
            self.lineages.remove(key);
        }
    }
}

pub struct QueryStore {
    inner: RwLock<Inner>,
    clock: AtomicU64,
}

impl QueryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: LruCache::new(config.capacity_non_zero()),
                lineages: HashMap::new(),
            }),
            clock: AtomicU64::new(1),
        }
    }

    fn tick(&self) -> Generation {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the fresh snapshot for `key`. Stale entries read as absent.
    pub fn get(&self, key: &QueryKey) -> Option<CachedValue> {
        let mut inner = rw_write(&self.inner, SOURCE, "get");
        match inner.entries.get(key) {
            Some(slot) if !slot.stale => {
                counter!(METRIC_CACHE_HIT, "kind" => key.kind()).increment(1);
                debug!(key = ?key, "Cache hit");
                Some(slot.value.clone())
            }
            _ => {
                counter!(METRIC_CACHE_MISS, "kind" => key.kind()).increment(1);
                None
            }
        }
    }

    pub fn get_typed<T: Cacheable>(&self, key: &QueryKey) -> Option<T> {
        self.get(key).as_ref().and_then(T::from_cached)
    }

    /// Reads a snapshot even when stale, without touching recency or metrics.
    pub fn peek(&self, key: &QueryKey) -> Option<CachedValue> {
        rw_read(&self.inner, SOURCE, "peek")
            .entries
            .peek(key)
            .map(|slot| slot.value.clone())
    }

    pub fn peek_typed<T: Cacheable>(&self, key: &QueryKey) -> Option<T> {
        self.peek(key).as_ref().and_then(T::from_cached)
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        rw_read(&self.inner, SOURCE, "is_fresh")
            .entries
            .peek(key)
            .is_some_and(|slot| !slot.stale)
    }

    /// True only for a snapshot that is present and marked stale.
    ///
    /// A key that was never stored or has been evicted is not invalidated.
    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        rw_read(&self.inner, SOURCE, "is_invalidated")
            .entries
            .peek(key)
            .is_some_and(|slot| slot.stale)
    }

    /// Replaces the snapshot for `key` and supersedes any read in flight.
    pub fn set(&self, key: QueryKey, value: CachedValue) {
        let generation = self.tick();
        let mut inner = rw_write(&self.inner, SOURCE, "set");
        inner
            .lineages
            .entry(key.clone())
            .and_modify(|lineage| lineage.generation = generation)
            .or_insert_with(|| Lineage::new(generation));
        Self::put(&mut inner, key, value);
    }

    pub fn set_typed<T: Cacheable>(&self, key: QueryKey, value: T) {
        self.set(key, value.into_cached());
    }

    /// Marks every key under `prefix` stale; returns how many entries changed.
    pub fn invalidate(&self, prefix: &KeyPrefix) -> usize {
        let mut inner = rw_write(&self.inner, SOURCE, "invalidate");
        let mut marked = 0;
        for (key, slot) in inner.entries.iter_mut() {
            if prefix.matches(key) && !slot.stale {
                slot.stale = true;
                marked += 1;
            }
        }

        for (key, lineage) in &mut inner.lineages {
            if prefix.matches(key) {
                lineage.generation = self.tick();
            }
        }

        if marked > 0 {
            counter!(METRIC_CACHE_INVALIDATE).increment(marked as u64);
        }
        debug!(prefix = ?prefix, marked, "Cache prefix invalidated");
        marked
    }

    pub fn remove(&self, key: &QueryKey) -> Option<CachedValue> {
        let mut inner = rw_write(&self.inner, SOURCE, "remove");
        inner.lineages.remove(key);
        inner.entries.pop(key).map(|slot| slot.value)
    }

    /// Starts a network read for `key`.
    pub fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let mut inner = rw_write(&self.inner, SOURCE, "begin_fetch");
        let lineage = inner
            .lineages
            .entry(key.clone())
            .or_insert_with(|| Lineage::new(self.tick()));
        lineage.in_flight += 1;
        FetchTicket {
            key: key.clone(),
            generation: lineage.generation,
        }
    }

    /// Stores the response of a read unless something superseded it.
    ///
    /// Returns false when the response was discarded.
    pub fn complete_fetch(&self, ticket: FetchTicket, value: CachedValue) -> bool {
        let mut inner = rw_write(&self.inner, SOURCE, "complete_fetch");
        if inner.settle(&ticket) != Some(ticket.generation) {
            counter!(METRIC_CACHE_DISCARD, "kind" => ticket.key.kind()).increment(1);
            debug!(
                key = ?ticket.key,
                generation = ticket.generation,
                "Discarded superseded response"
            );
            inner.release(&ticket.key);
            return false;
        }
        Self::put(&mut inner, ticket.key, value);
        true
    }

    /// Releases a ticket whose read failed.
    pub fn abandon_fetch(&self, ticket: FetchTicket) {
        let mut inner = rw_write(&self.inner, SOURCE, "abandon_fetch");
        inner.settle(&ticket);
        inner.release(&ticket.key);
    }

    /// Clear all cached data and supersede every read in flight.
    pub fn clear(&self) {
        let mut inner = rw_write(&self.inner, SOURCE, "clear");
        inner.entries.clear();
        inner.lineages.clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.inner, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put(inner: &mut Inner, key: QueryKey, value: CachedValue) {
        let slot = Slot {
            value,
            stale: false,
        };
        if let Some((evicted, _)) = inner.entries.push(key.clone(), slot)
            && evicted != key
        {
            inner.release(&evicted);
            counter!(METRIC_CACHE_EVICT, "kind" => evicted.kind()).increment(1);
        }
    }
}
