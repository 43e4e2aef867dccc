//! Posts: single reads, filtered pages and authored mutations.

use std::sync::Arc;

use agora_api_types::{BodyForm, EntityId, PostCreateForm};
use async_trait::async_trait;
use tracing::{info, instrument};

use crate::application::error::ClientError;
use crate::application::identity::IdentityService;
use crate::application::pagination::{PageSource, Paginator};
use crate::application::repos::ForumApi;
use crate::cache::{CacheCoordinator, PostListFilter, QueryKey};
use crate::domain::entities::Post;

/// The server keeps at most this many tags per post; extra tags are dropped.
pub const MAX_TAGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl NewPost {
    fn into_form(self) -> Result<PostCreateForm, ClientError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ClientError::validation("title must not be empty"));
        }
        if self.body.trim().is_empty() {
            return Err(ClientError::validation("body must not be empty"));
        }

        let tags: Vec<&str> = self
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .take(MAX_TAGS)
            .collect();

        Ok(PostCreateForm {
            title,
            body: self.body,
            tags: tags.join(","),
        })
    }
}

#[derive(Clone)]
pub struct PostService {
    api: Arc<dyn ForumApi>,
    cache: Arc<CacheCoordinator>,
    identity: IdentityService,
}

impl PostService {
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

    pub async fn fetch_one(&self, id: EntityId) -> Result<Post, ClientError> {
        self.cache
            .fetch(QueryKey::Post(id), move || async move {
                self.api
                    .post(id)
                    .await
                    .map_err(|err| ClientError::from_api(err, "post"))
            })
            .await
    }

    /// One page of the listing; an empty page means the listing has ended.
    pub async fn fetch_page(
        &self,
        filter: &PostListFilter,
        page: u32,
    ) -> Result<Vec<Post>, ClientError> {
        let filter = filter.clone().normalized();
        let key = QueryKey::PostPage {
            filter: filter.clone(),
            page,
        };
        let filter = &filter;

        self.cache
            .fetch(key, move || async move {
                self.api
                    .posts(filter, page)
                    .await
                    .map_err(|err| ClientError::from_api(err, "post"))
            })
            .await
    }

    /// A paginated listing for `filter`, starting at page 1.
    pub fn feed(&self, filter: PostListFilter) -> Paginator<PostFeed> {
        Paginator::new(PostFeed {
            posts: self.clone(),
            filter: filter.normalized(),
        })
    }

    #[instrument(skip(self, post), fields(title = %post.title))]
    pub async fn create(&self, post: NewPost) -> Result<Post, ClientError> {
        let form = post.into_form()?;
        self.identity.require_user().await?;

        let created = self
            .api
            .create_post(&form)
            .await
            .map_err(|err| ClientError::from_api(err, "post"))?;
        info!(post_id = created.id(), "Post created");
        self.cache.trigger().post_created(created.clone());
        Ok(created)
    }

    #[instrument(skip(self, body))]
    pub async fn update(&self, id: EntityId, body: &str) -> Result<Post, ClientError> {
        if body.trim().is_empty() {
            return Err(ClientError::validation("body must not be empty"));
        }
        self.authorize(id).await?;

        let updated = self
            .api
            .update_post(
                id,
                &BodyForm {
                    body: body.to_string(),
                },
            )
            .await
            .map_err(|err| ClientError::from_api(err, "post"))?;
        self.cache.trigger().post_updated(updated.clone());
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<(), ClientError> {
        self.authorize(id).await?;

        self.api
            .delete_post(id)
            .await
            .map_err(|err| ClientError::from_api(err, "post"))?;
        info!(post_id = id, "Post deleted");
        self.cache.trigger().post_deleted(id);
        Ok(())
    }

    async fn authorize(&self, id: EntityId) -> Result<(), ClientError> {
        let post = self.fetch_one(id).await?;
        // A tombstone has no author and cannot be edited again.
        let author = post.author().ok_or(ClientError::NotFound { entity: "post" })?;
        self.identity.ensure_can_moderate(author, "post").await?;
        Ok(())
    }
}

/// Page source over one post filter.
pub struct PostFeed {
    posts: PostService,
    filter: PostListFilter,
}

impl PostFeed {
    pub fn filter(&self) -> &PostListFilter {
        &self.filter
    }
}

#[async_trait]
impl PageSource for PostFeed {
    type Item = Post;

    async fn fetch_page(&self, page: u32) -> Result<Vec<Post>, ClientError> {
        self.posts.fetch_page(&self.filter, page).await
    }

    fn is_page_invalidated(&self, page: u32) -> bool {
        self.posts.cache.store().is_invalidated(&QueryKey::PostPage {
            filter: self.filter.clone(),
            page,
        })
    }
}
