//! Application root.
//!
//! `ForumClient` owns the cache and hands out repositories that share it.
//! Dropping the client drops every snapshot; `teardown` does the same while
//! keeping the client usable.

use std::sync::Arc;
use std::time::Duration;

use agora_api_types::PostSort;

use crate::application::comments::CommentService;
use crate::application::identity::IdentityService;
use crate::application::posts::PostService;
use crate::application::reactions::ReactionService;
use crate::application::repos::ForumApi;
use crate::application::search::{PostSearch, TagSuggestions};
use crate::application::tags::TagService;
use crate::application::users::UserService;
use crate::application::virtualizer::{Virtualizer, VirtualizerConfig};
use crate::cache::{CacheConfig, CacheCoordinator};
use crate::config::Settings;
use crate::infra::error::InfraError;
use crate::infra::http::HttpForumApi;

const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Runtime knobs of the data layer, independent of the transport.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub cache: CacheConfig,
    pub lists: VirtualizerConfig,
    pub search_debounce: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            lists: VirtualizerConfig::default(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl From<&Settings> for ClientOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            cache: CacheConfig::from(&settings.cache),
            lists: VirtualizerConfig::from(&settings.lists),
            search_debounce: settings.search.debounce,
        }
    }
}

pub struct ForumClient {
    cache: Arc<CacheCoordinator>,
    options: ClientOptions,
    identity: IdentityService,
    users: UserService,
    posts: PostService,
    comments: CommentService,
    tags: TagService,
    reactions: ReactionService,
}

impl ForumClient {
    /// Builds the HTTP transport and the cache from loaded settings.
    pub fn new(settings: &Settings) -> Result<Self, InfraError> {
        let api = HttpForumApi::new(&settings.api)?;
        Ok(Self::with_api(Arc::new(api), ClientOptions::from(settings)))
    }

    pub fn with_api(api: Arc<dyn ForumApi>, options: ClientOptions) -> Self {
        let cache = Arc::new(CacheCoordinator::new(&options.cache));
        let identity = IdentityService::new(api.clone(), cache.clone());

        Self {
            users: UserService::new(api.clone(), cache.clone(), identity.clone()),
            posts: PostService::new(api.clone(), cache.clone(), identity.clone()),
            comments: CommentService::new(api.clone(), cache.clone(), identity.clone()),
            tags: TagService::new(api.clone(), cache.clone(), identity.clone()),
            reactions: ReactionService::new(api, cache.clone(), identity.clone()),
            identity,
            cache,
            options,
        }
    }

    pub fn identity(&self) -> &IdentityService {
        &self.identity
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    pub fn comments(&self) -> &CommentService {
        &self.comments
    }

    pub fn tags(&self) -> &TagService {
        &self.tags
    }

    pub fn reactions(&self) -> &ReactionService {
        &self.reactions
    }

    pub fn cache(&self) -> &CacheCoordinator {
        &self.cache
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn virtualizer(&self) -> Virtualizer {
        Virtualizer::new(self.options.lists)
    }

    pub fn post_search(&self, sort: PostSort) -> PostSearch {
        PostSearch::new(self.posts.clone(), sort, self.options.search_debounce)
    }

    pub fn tag_suggestions(&self) -> TagSuggestions {
        TagSuggestions::new(self.tags.clone(), self.options.search_debounce)
    }

    /// Drops every cached snapshot.
    pub fn teardown(&self) {
        self.cache.teardown();
    }
}
