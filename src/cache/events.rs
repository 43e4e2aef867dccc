//! Cache event system.
//!
//! Mutations publish events describing what changed on the server; the
//! consumer turns them into invalidations and seeds.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use agora_api_types::{EntityId, Me, Tag};
use metrics::gauge;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::{Comment, Post, User};
use crate::domain::reactions::Subject;

use super::keys::EntityKey;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::events";

pub(crate) const METRIC_EVENT_QUEUE_LEN: &str = "agora_cache_event_queue_len";

/// Monotonic epoch for ordering events.
///
/// When several events name the same entity, the highest epoch wins.
pub type Epoch = u64;

/// Cache event with idempotency and ordering support.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier for idempotency (UUIDv4).
    pub id: Uuid,
    /// Monotonic epoch for ordering within this process.
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Successful mutations, carrying the server response where there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PostCreated { post: Post },
    PostUpdated { post: Post },
    PostDeleted { post_id: EntityId },

    CommentCreated { comment: Comment },
    CommentUpdated { comment: Comment },
    /// `author` is the username whose comment listings contained the comment.
    CommentDeleted {
        comment_id: EntityId,
        post_id: EntityId,
        author: Option<String>,
    },

    ReactionChanged { subject: Subject },

    TagUpdated { tag: Tag },

    /// `user_id` is the id the request addressed; tombstones may omit it.
    UserUpdated { user_id: EntityId, user: User },
    UserDeleted { user_id: EntityId },

    /// A preference changed server side; the session must be re-read.
    SessionChanged,
    /// Login, registration or a rejected login settled the session.
    SessionReplaced { session: Option<Me> },
    /// Logout: everything cached belonged to the previous identity.
    SessionEnded,
}

impl EventKind {
    pub fn entity(&self) -> EntityKey {
        match self {
            EventKind::PostCreated { post } | EventKind::PostUpdated { post } => {
                EntityKey::Post(post.id())
            }
            EventKind::PostDeleted { post_id } => EntityKey::Post(*post_id),
            EventKind::CommentCreated { comment } | EventKind::CommentUpdated { comment } => {
                EntityKey::Comment(comment.id())
            }
            EventKind::CommentDeleted { comment_id, .. } => EntityKey::Comment(*comment_id),
            EventKind::ReactionChanged { subject } => EntityKey::Reactions(*subject),
            EventKind::TagUpdated { tag } => EntityKey::Tag(tag.id),
            EventKind::UserUpdated { user_id, .. } | EventKind::UserDeleted { user_id } => {
                EntityKey::User(*user_id)
            }
            EventKind::SessionChanged
            | EventKind::SessionReplaced { .. }
            | EventKind::SessionEnded => EntityKey::Session,
        }
    }

    /// Short label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PostCreated { .. } => "post_created",
            EventKind::PostUpdated { .. } => "post_updated",
            EventKind::PostDeleted { .. } => "post_deleted",
            EventKind::CommentCreated { .. } => "comment_created",
            EventKind::CommentUpdated { .. } => "comment_updated",
            EventKind::CommentDeleted { .. } => "comment_deleted",
            EventKind::ReactionChanged { .. } => "reaction_changed",
            EventKind::TagUpdated { .. } => "tag_updated",
            EventKind::UserUpdated { .. } => "user_updated",
            EventKind::UserDeleted { .. } => "user_deleted",
            EventKind::SessionChanged => "session_changed",
            EventKind::SessionReplaced { .. } => "session_replaced",
            EventKind::SessionEnded => "session_ended",
        }
    }
}

/// In-memory event queue for cache invalidation.
///
/// Contention is low: mutations publish one event and consume right away.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn publish(&self, kind: EventKind) {
        let epoch = self.next_epoch();
        let event = CacheEvent::new(kind, epoch);

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = event.kind.name(),
            entity = ?event.kind.entity(),
            "Cache event enqueued"
        );

        let mut queue = mutex_lock(&self.queue, SOURCE, "publish");
        queue.push_back(event);
        gauge!(METRIC_EVENT_QUEUE_LEN).set(queue.len() as f64);
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let events = queue.drain(..count).collect();
        gauge!(METRIC_EVENT_QUEUE_LEN).set(queue.len() as f64);
        events
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
