//! Comments on posts and by authors.

use std::sync::Arc;

use agora_api_types::{BodyForm, EntityId};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::application::error::ClientError;
use crate::application::identity::IdentityService;
use crate::application::pagination::{PageSource, Paginator};
use crate::application::repos::ForumApi;
use crate::cache::{CacheCoordinator, CommentListFilter, QueryKey};
use crate::domain::entities::Comment;

#[derive(Clone)]
pub struct CommentService {
    api: Arc<dyn ForumApi>,
    cache: Arc<CacheCoordinator>,
    identity: IdentityService,
}

impl CommentService {
    pub fn new(
        api: Arc<dyn ForumApi>,
        cache: Arc<CacheCoordinator>,
        identity: IdentityService,
    ) -> Self {
        Self {
            api,
            cache,
            identity,
        }
    }

    pub async fn fetch_one(&self, id: EntityId) -> Result<Comment, ClientError> {
        self.cache
            .fetch(QueryKey::Comment(id), move || async move {
                self.api
                    .comment(id)
                    .await
                    .map_err(|err| ClientError::from_api(err, "comment"))
            })
            .await
    }

    /// One page of comments. A filter with neither post nor author yields
    /// nothing without a request.
    pub async fn fetch_page(
        &self,
        filter: &CommentListFilter,
        page: u32,
    ) -> Result<Vec<Comment>, ClientError> {
        let filter = filter.clone().normalized();
        if !filter.is_addressable() {
            debug!("Comment listing without post or author; skipping fetch");
            return Ok(Vec::new());
        }

        let key = QueryKey::CommentPage {
            filter: filter.clone(),
            page,
        };
        let filter = &filter;

        self.cache
            .fetch(key, move || async move {
                self.api
                    .comments(filter, page)
                    .await
                    .map_err(|err| ClientError::from_api(err, "comment"))
            })
            .await
    }

    pub fn thread(&self, filter: CommentListFilter) -> Paginator<CommentFeed> {
        Paginator::new(CommentFeed {
            comments: self.clone(),
            filter: filter.normalized(),
        })
    }

    #[instrument(skip(self, body))]
    pub async fn create(&self, post_id: EntityId, body: &str) -> Result<Comment, ClientError> {
        if body.trim().is_empty() {
            return Err(ClientError::validation("comment must not be empty"));
        }
        self.identity.require_user().await?;

        let created = self
            .api
            .create_comment(
                post_id,
                &BodyForm {
                    body: body.to_string(),
                },
            )
            .await
            .map_err(|err| ClientError::from_api(err, "comment"))?;
        info!(comment_id = created.id(), post_id, "Comment created");
        self.cache.trigger().comment_created(created.clone());
        Ok(created)
    }

    #[instrument(skip(self, body))]
    pub async fn update(&self, id: EntityId, body: &str) -> Result<Comment, ClientError> {
        if body.trim().is_empty() {
            return Err(ClientError::validation("comment must not be empty"));
        }
        self.authorize(id).await?;

        let updated = self
            .api
            .update_comment(
                id,
                &BodyForm {
                    body: body.to_string(),
                },
            )
            .await
            .map_err(|err| ClientError::from_api(err, "comment"))?;
        self.cache.trigger().comment_updated(updated.clone());
        Ok(updated)
    }

    /// Deletes a comment and invalidates the lists it appeared in.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<Comment, ClientError> {
        let target = self.authorize(id).await?;

        let removed = self
            .api
            .delete_comment(id)
            .await
            .map_err(|err| ClientError::from_api(err, "comment"))?;

        // The tombstone carries no author; fall back to the snapshot we edited.
        let author = removed
            .author()
            .or_else(|| target.author())
            .and_then(|user| user.username())
            .map(str::to_string);
        info!(comment_id = id, post_id = removed.post_id(), "Comment deleted");
        self.cache
            .trigger()
            .comment_deleted(id, removed.post_id(), author);
        Ok(removed)
    }

    async fn authorize(&self, id: EntityId) -> Result<Comment, ClientError> {
        let comment = self.fetch_one(id).await?;
        let author = comment
            .author()
            .ok_or(ClientError::NotFound { entity: "comment" })?;
        self.identity.ensure_can_moderate(author, "comment").await?;
        Ok(comment)
    }
}

/// Page source over one comment filter.
pub struct CommentFeed {
    comments: CommentService,
    filter: CommentListFilter,
}

impl CommentFeed {
    pub fn filter(&self) -> &CommentListFilter {
        &self.filter
    }
}

#[async_trait]
impl PageSource for CommentFeed {
    type Item = Comment;

    async fn fetch_page(&self, page: u32) -> Result<Vec<Comment>, ClientError> {
        self.comments.fetch_page(&self.filter, page).await
    }

    fn is_page_invalidated(&self, page: u32) -> bool {
        self.filter.is_addressable()
            && self.comments.cache.store().is_invalidated(&QueryKey::CommentPage {
                filter: self.filter.clone(),
                page,
            })
    }
}

#[cfg(test)]
mod tests {
    use agora_api_types::CommentSort;

    use super::*;
    use crate::application::repos::ApiError;
    use crate::application::testing::{FakeApi, admin, cache, comment, member};

    fn service(api: &Arc<FakeApi>) -> CommentService {
        let cache = cache();
        let identity = IdentityService::new(api.clone(), cache.clone());
        CommentService::new(api.clone(), cache, identity)
    }

    fn page_key(filter: CommentListFilter) -> QueryKey {
        QueryKey::CommentPage { filter, page: 1 }
    }

    #[tokio::test]
    async fn unfiltered_listing_makes_no_request() {
        let api = FakeApi::new();
        let comments = service(&api);

        let page = comments
            .fetch_page(&CommentListFilter::default(), 1)
            .await
            .expect("page");

        assert!(page.is_empty());
        assert!(api.calls().is_empty());

        let mut thread = comments.thread(CommentListFilter::by_author("  ", CommentSort::Latest));
        assert_eq!(thread.load_next().await, Ok(0));
        assert!(thread.is_exhausted());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn pages_are_cached_per_filter() {
        let api = FakeApi::new();
        let alice = member(1, "alice");
        api.with(|state| state.comment_pages.insert(1, vec![comment(3, 7, &alice)]));
        let comments = service(&api);

        let on_post = CommentListFilter::for_post(7, CommentSort::Latest);
        let by_alice = CommentListFilter::by_author("alice", CommentSort::Latest);
        comments.fetch_page(&on_post, 1).await.expect("post page");
        comments.fetch_page(&on_post, 1).await.expect("post page");
        comments.fetch_page(&by_alice, 1).await.expect("author page");

        assert_eq!(api.count("comments"), 2);
    }

    #[tokio::test]
    async fn create_requires_session_and_invalidates_parent_lists() {
        let api = FakeApi::new();
        let comments = service(&api);

        assert_eq!(
            comments.create(7, "hi").await,
            Err(ClientError::Unauthorized)
        );
        assert_eq!(api.count("create_comment"), 0);

        let alice = member(1, "alice");
        api.sign_in_as(&alice);
        let comments = service(&api);
        let on_post = CommentListFilter::for_post(7, CommentSort::Latest);
        comments.fetch_page(&on_post, 1).await.expect("page");

        let created = comments.create(7, "hi").await.expect("create");

        let store = comments.cache.store();
        assert!(!store.is_fresh(&page_key(on_post)));
        assert_eq!(
            store.get_typed::<Comment>(&QueryKey::Comment(created.id())),
            Some(created)
        );
    }

    #[tokio::test]
    async fn delete_invalidates_own_key_parent_and_author_lists() {
        let api = FakeApi::new();
        let alice = member(1, "alice");
        api.sign_in_as(&alice);
        api.with(|state| state.comments.insert(3, comment(3, 7, &alice)));
        let comments = service(&api);

        let on_post = CommentListFilter::for_post(7, CommentSort::Latest);
        let on_other = CommentListFilter::for_post(8, CommentSort::Latest);
        let by_alice = CommentListFilter::by_author("alice", CommentSort::Top);
        let by_bob = CommentListFilter::by_author("bob", CommentSort::Top);
        for filter in [&on_post, &on_other, &by_alice, &by_bob] {
            comments.fetch_page(filter, 1).await.expect("page");
        }

        let removed = comments.delete(3).await.expect("delete");
        assert!(removed.is_deleted());

        let store = comments.cache.store();
        assert!(!store.is_fresh(&QueryKey::Comment(3)));
        assert!(!store.is_fresh(&page_key(on_post)));
        assert!(!store.is_fresh(&page_key(by_alice)));
        assert!(store.is_fresh(&page_key(on_other)));
        assert!(store.is_fresh(&page_key(by_bob)));
    }

    #[tokio::test]
    async fn non_author_cannot_edit_but_admin_can() {
        let api = FakeApi::new();
        let alice = member(1, "alice");
        api.with(|state| {
            state.users.insert(1, alice.clone());
            state.comments.insert(3, comment(3, 7, &alice));
        });

        api.sign_in_as(&member(2, "bob"));
        assert_eq!(
            service(&api).update(3, "edited").await,
            Err(ClientError::Forbidden { entity: "comment" })
        );
        assert_eq!(api.count("update_comment"), 0);

        api.sign_in_as(&admin(9, "root"));
        let updated = service(&api).update(3, "edited").await.expect("admin edit");
        assert!(updated.is_edited());
    }

    #[tokio::test]
    async fn failed_delete_leaves_cache_untouched() {
        let api = FakeApi::new();
        let alice = member(1, "alice");
        api.sign_in_as(&alice);
        api.with(|state| state.comments.insert(3, comment(3, 7, &alice)));
        api.fail("delete_comment", ApiError::from_status(500, "down"));
        let comments = service(&api);

        let result = comments.delete(3).await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert!(comments.cache.store().is_fresh(&QueryKey::Comment(3)));
    }
}
