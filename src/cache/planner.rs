//! Invalidation plan generation.
//!
//! Merges a batch of mutation events into the seeds and prefix invalidations
//! the consumer applies.

use std::collections::{HashMap, HashSet};
use std::fmt;

use agora_api_types::Me;
use uuid::Uuid;

use super::events::{CacheEvent, Epoch, EventKind};
use super::keys::{EntityKey, KeyPrefix, QueryKey};
use super::value::{CachedValue, Cacheable};

/// Actions to execute for cache consistency.
///
/// Derived list invalidations accumulate over every event; the action on an
/// entity's own key comes from its latest event only.
#[derive(Debug, Default)]
pub struct InvalidationPlan {
    /// Drop every snapshot before applying anything else.
    pub clear_all: bool,
    /// Prefixes to mark stale.
    pub invalidate: HashSet<KeyPrefix>,
    /// Snapshots to write from mutation responses.
    pub seed: HashMap<QueryKey, CachedValue>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ clear_all: {}, invalidate: {}, seed: {} }}",
            self.clear_all,
            self.invalidate.len(),
            self.seed.len()
        )
    }
}

impl InvalidationPlan {
    /// Merge events into a plan.
    ///
    /// - Deduplicates by event ID
    /// - Keeps the latest epoch per entity for own-key actions
    /// - Drops actions older than a session teardown in the same batch
    pub fn from_events(events: Vec<CacheEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen_ids: HashSet<Uuid> = HashSet::new();

        let events: Vec<_> = events
            .into_iter()
            .filter(|e| seen_ids.insert(e.id))
            .collect();

        let cleared_at: Option<Epoch> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::SessionEnded))
            .map(|e| e.epoch)
            .max();
        plan.clear_all = cleared_at.is_some();

        let mut latest: HashMap<EntityKey, (Epoch, EventKind)> = HashMap::new();

        for event in events {
            if cleared_at.is_some_and(|cleared| event.epoch < cleared) {
                continue;
            }

            plan.add_derived(&event.kind);

            latest
                .entry(event.kind.entity())
                .and_modify(|(epoch, kind)| {
                    if event.epoch > *epoch {
                        *epoch = event.epoch;
                        *kind = event.kind.clone();
                    }
                })
                .or_insert((event.epoch, event.kind));
        }

        for (_, kind) in latest.into_values() {
            plan.add_own_key(kind);
        }

        plan
    }

    /// List-level consequences, independent of ordering.
    fn add_derived(&mut self, kind: &EventKind) {
        match kind {
            EventKind::PostCreated { .. } | EventKind::PostDeleted { .. } => {
                self.invalidate.insert(KeyPrefix::PostLists);
            }
            EventKind::CommentCreated { comment } => {
                self.invalidate
                    .insert(KeyPrefix::CommentListsForPost(comment.post_id()));
                if let Some(author) = comment.author().and_then(|user| user.username()) {
                    self.invalidate
                        .insert(KeyPrefix::CommentListsByAuthor(author.to_string()));
                }
            }
            EventKind::CommentDeleted {
                post_id, author, ..
            } => {
                self.invalidate
                    .insert(KeyPrefix::CommentListsForPost(*post_id));
                if let Some(author) = author {
                    self.invalidate
                        .insert(KeyPrefix::CommentListsByAuthor(author.clone()));
                }
            }
            EventKind::ReactionChanged { subject } => {
                self.invalidate.insert(KeyPrefix::Reactions(*subject));
            }
            EventKind::PostUpdated { .. }
            | EventKind::CommentUpdated { .. }
            | EventKind::TagUpdated { .. }
            | EventKind::UserUpdated { .. }
            | EventKind::UserDeleted { .. }
            | EventKind::SessionChanged
            | EventKind::SessionReplaced { .. }
            | EventKind::SessionEnded => {}
        }
    }

    fn add_own_key(&mut self, kind: EventKind) {
        match kind {
            EventKind::PostCreated { post } | EventKind::PostUpdated { post } => {
                self.seed.insert(QueryKey::Post(post.id()), post.into_cached());
            }
            EventKind::PostDeleted { post_id } => {
                self.invalidate
                    .insert(KeyPrefix::Exact(QueryKey::Post(post_id)));
            }
            EventKind::CommentCreated { comment } | EventKind::CommentUpdated { comment } => {
                self.seed
                    .insert(QueryKey::Comment(comment.id()), comment.into_cached());
            }
            EventKind::CommentDeleted { comment_id, .. } => {
                self.invalidate
                    .insert(KeyPrefix::Exact(QueryKey::Comment(comment_id)));
            }
            EventKind::ReactionChanged { .. } => {}
            EventKind::TagUpdated { tag } => {
                self.seed.insert(QueryKey::Tag(tag.id), tag.into_cached());
            }
            EventKind::UserUpdated { user_id, user } => {
                self.seed.insert(QueryKey::User(user_id), user.into_cached());
            }
            EventKind::UserDeleted { user_id } => {
                self.invalidate
                    .insert(KeyPrefix::Exact(QueryKey::User(user_id)));
            }
            EventKind::SessionChanged => {
                self.invalidate.insert(KeyPrefix::Exact(QueryKey::Session));
            }
            EventKind::SessionReplaced { session } => {
                self.seed.insert(QueryKey::Session, session.into_cached());
            }
            EventKind::SessionEnded => {
                self.seed
                    .insert(QueryKey::Session, None::<Me>.into_cached());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.clear_all && self.invalidate.is_empty() && self.seed.is_empty()
    }
}
