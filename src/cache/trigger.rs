//! Cache trigger service.
//!
//! Publishes mutation events and consumes them immediately so the next read
//! already sees the invalidation.

use std::sync::Arc;

use agora_api_types::{EntityId, Me, Tag};

use crate::domain::entities::{Comment, Post, User};
use crate::domain::reactions::Subject;

use super::consumer::CacheConsumer;
use super::events::{EventKind, EventQueue};

/// Entry point for repositories after a successful mutation.
///
/// ```ignore
/// let post = api.create_post(form).await?;
/// trigger.post_created(post.clone());
/// ```
pub struct CacheTrigger {
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl CacheTrigger {
    pub fn new(queue: Arc<EventQueue>, consumer: Arc<CacheConsumer>) -> Self {
        Self { queue, consumer }
    }

    /// Publish an event and apply everything queued so far.
    pub fn trigger(&self, kind: EventKind) {
        self.queue.publish(kind);
        self.consumer.consume();
    }

    pub fn post_created(&self, post: Post) {
        self.trigger(EventKind::PostCreated { post });
    }

    pub fn post_updated(&self, post: Post) {
        self.trigger(EventKind::PostUpdated { post });
    }

    pub fn post_deleted(&self, post_id: EntityId) {
        self.trigger(EventKind::PostDeleted { post_id });
    }

    pub fn comment_created(&self, comment: Comment) {
        self.trigger(EventKind::CommentCreated { comment });
    }

    pub fn comment_updated(&self, comment: Comment) {
        self.trigger(EventKind::CommentUpdated { comment });
    }

    pub fn comment_deleted(&self, comment_id: EntityId, post_id: EntityId, author: Option<String>) {
        self.trigger(EventKind::CommentDeleted {
            comment_id,
            post_id,
            author,
        });
    }

    pub fn reaction_changed(&self, subject: Subject) {
        self.trigger(EventKind::ReactionChanged { subject });
    }

    pub fn tag_updated(&self, tag: Tag) {
        self.trigger(EventKind::TagUpdated { tag });
    }

    pub fn user_updated(&self, user_id: EntityId, user: User) {
        self.trigger(EventKind::UserUpdated { user_id, user });
    }

    pub fn user_deleted(&self, user_id: EntityId) {
        self.trigger(EventKind::UserDeleted { user_id });
    }

    pub fn session_changed(&self) {
        self.trigger(EventKind::SessionChanged);
    }

    pub fn session_replaced(&self, session: Option<Me>) {
        self.trigger(EventKind::SessionReplaced { session });
    }

    pub fn session_ended(&self) {
        self.trigger(EventKind::SessionEnded);
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;
    use crate::cache::keys::{KeyPrefix, PostListFilter, QueryKey};
    use crate::cache::store::QueryStore;

    fn create_trigger() -> (Arc<QueryStore>, CacheTrigger) {
        let config = CacheConfig::default();
        let store = Arc::new(QueryStore::new(&config));
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(config, store.clone(), queue.clone()));
        (store, CacheTrigger::new(queue, consumer))
    }

    #[test]
    fn trigger_applies_events_queued_elsewhere() {
        let (store, trigger) = create_trigger();
        store.set_typed(QueryKey::Post(4), Post::Deleted { id: 4 });
        trigger.queue.publish(EventKind::PostDeleted { post_id: 4 });
        assert_eq!(trigger.queue.len(), 1);

        trigger.trigger(EventKind::SessionChanged);

        assert!(trigger.queue.is_empty());
        assert!(!store.is_fresh(&QueryKey::Post(4)));
    }

    #[test]
    fn post_delete_marks_post_and_lists_stale() {
        let (store, trigger) = create_trigger();
        let list = QueryKey::PostPage {
            filter: PostListFilter::default(),
            page: 1,
        };
        store.set_typed(list.clone(), vec![Post::Deleted { id: 2 }]);
        store.set_typed(QueryKey::Post(2), Post::Deleted { id: 2 });

        trigger.post_deleted(2);

        assert!(!store.is_fresh(&list));
        assert!(!store.is_fresh(&QueryKey::Post(2)));
        assert!(!KeyPrefix::PostLists.matches(&QueryKey::Post(2)));
    }

    #[test]
    fn convenience_methods_drain_the_queue() {
        let (_, trigger) = create_trigger();

        trigger.post_created(Post::Deleted { id: 1 });
        trigger.post_updated(Post::Deleted { id: 1 });
        trigger.comment_deleted(3, 1, Some("erin".into()));
        trigger.reaction_changed(Subject::Comment(3));
        trigger.user_deleted(7);
        trigger.session_replaced(None);
        trigger.session_ended();

        assert!(trigger.queue.is_empty());
    }
}
