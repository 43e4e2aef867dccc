//! Agora query cache.
//!
//! Holds every snapshot the client has fetched, keyed by `QueryKey`:
//!
//! - **Store**: LRU of snapshots with per-key generations so superseded
//!   responses are dropped on arrival
//! - **Events**: mutations publish `EventKind`s; the consumer merges them into
//!   an `InvalidationPlan` of seeds and prefix invalidations
//! - **Single-flight**: one network read per key at a time
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! capacity = 1024
//! consume_batch_limit = 100
//! ```

mod config;
mod consumer;
mod coordinator;
mod events;
mod inflight;
mod keys;
mod lock;
mod planner;
mod store;
mod trigger;
mod value;

pub use config::CacheConfig;
pub use consumer::CacheConsumer;
pub use coordinator::CacheCoordinator;
pub use events::{CacheEvent, Epoch, EventKind, EventQueue};
pub use inflight::{FetchGuard, InFlightFetches};
pub use keys::{CommentListFilter, EntityKey, KeyPrefix, PostListFilter, QueryKey};
pub use planner::InvalidationPlan;
pub use store::{FetchTicket, Generation, QueryStore};
pub use trigger::CacheTrigger;
pub use value::{CachedValue, Cacheable};

pub(crate) mod metric_names {
    pub(crate) use super::consumer::METRIC_CACHE_CONSUME_MS;
    pub(crate) use super::events::METRIC_EVENT_QUEUE_LEN;
    pub(crate) use super::store::{
        METRIC_CACHE_DISCARD, METRIC_CACHE_EVICT, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE,
        METRIC_CACHE_MISS,
    };
}
