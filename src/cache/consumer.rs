//! Cache consumer for executing invalidation plans.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{info, instrument};
use uuid::Uuid;

use super::config::CacheConfig;
use super::events::EventQueue;
use super::planner::InvalidationPlan;
use super::store::QueryStore;

pub(crate) const METRIC_CACHE_CONSUME_MS: &str = "agora_cache_consume_ms";

/// Drains the event queue and applies the merged plan to the store.
///
/// 1. Clear the store when the batch ended a session
/// 2. Mark invalidated prefixes stale
/// 3. Write seeds from mutation responses
pub struct CacheConsumer {
    config: CacheConfig,
    store: Arc<QueryStore>,
    queue: Arc<EventQueue>,
}

impl CacheConsumer {
    pub fn new(config: CacheConfig, store: Arc<QueryStore>, queue: Arc<EventQueue>) -> Self {
        Self {
            config,
            store,
            queue,
        }
    }

    /// Consume pending events and execute the plan.
    ///
    /// Returns true if any events were processed.
    #[instrument(skip(self))]
    pub fn consume(&self) -> bool {
        let consume_started_at = Instant::now();
        let events = self
            .queue
            .drain(self.config.consume_batch_limit_non_zero());
        if events.is_empty() {
            return false;
        }

        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let plan = InvalidationPlan::from_events(events);

        info!(
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Cache consumption starting"
        );

        let marked = self.apply(plan);

        info!(event_count, invalidated = marked, "Cache consumption complete");

        histogram!(METRIC_CACHE_CONSUME_MS)
            .record(consume_started_at.elapsed().as_secs_f64() * 1000.0);

        true
    }

    fn apply(&self, plan: InvalidationPlan) -> usize {
        if plan.clear_all {
            self.store.clear();
        }

        let marked = plan
            .invalidate
            .iter()
            .map(|prefix| self.store.invalidate(prefix))
            .sum();

        for (key, value) in plan.seed {
            self.store.set(key, value);
        }

        marked
    }
}
