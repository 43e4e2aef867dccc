//! Debounced free-text search.
//!
//! Every input gets a generation number. After the debounce window the task
//! runs only if no newer input arrived, and its result is dropped if one
//! arrived while the request was in flight. The last input always wins.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use agora_api_types::{PostSort, Tag};
use tracing::debug;

use crate::application::error::ClientError;
use crate::application::pagination::Paginator;
use crate::application::posts::{PostFeed, PostService};
use crate::application::tags::TagService;
use crate::cache::PostListFilter;
use crate::domain::entities::Post;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits out the window, then runs `load` unless superseded.
    ///
    /// Returns `None` when a later call claimed a newer generation before
    /// or during `load`.
    pub async fn settle<T, F, Fut>(&self, load: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.is_superseded(generation) {
            debug!(generation, "Input superseded; skipping request");
            return None;
        }

        let value = load().await;
        if self.is_superseded(generation) {
            debug!(generation, "Input superseded; dropping response");
            return None;
        }
        Some(value)
    }

    /// Invalidates any pending call without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

/// Post search box: the first page of matches for the settled query.
pub struct PostSearch {
    posts: PostService,
    sort: PostSort,
    debouncer: Debouncer,
}

impl PostSearch {
    pub fn new(posts: PostService, sort: PostSort, delay: Duration) -> Self {
        Self {
            posts,
            sort,
            debouncer: Debouncer::new(delay),
        }
    }

    pub fn filter(&self, query: &str) -> PostListFilter {
        PostListFilter::new(self.sort).query(query)
    }

    /// `None` when a newer input superseded this one. A blank query
    /// lists every post.
    pub async fn input(&self, query: &str) -> Option<Result<Vec<Post>, ClientError>> {
        let filter = self.filter(query);
        let filter = &filter;
        self.debouncer
            .settle(move || async move { self.posts.fetch_page(filter, 1).await })
            .await
    }

    /// The full paginated listing for a settled query.
    pub fn results(&self, query: &str) -> Paginator<PostFeed> {
        self.posts.feed(self.filter(query))
    }

    pub fn cancel(&self) {
        self.debouncer.cancel();
    }
}

/// Tag suggestions for the tag picker.
pub struct TagSuggestions {
    tags: TagService,
    debouncer: Debouncer,
}

impl TagSuggestions {
    pub fn new(tags: TagService, delay: Duration) -> Self {
        Self {
            tags,
            debouncer: Debouncer::new(delay),
        }
    }

    pub async fn input(&self, query: &str) -> Option<Result<Vec<Tag>, ClientError>> {
        self.debouncer
            .settle(move || async move { self.tags.search(Some(query)).await })
            .await
    }

    pub fn cancel(&self) {
        self.debouncer.cancel();
    }
}
