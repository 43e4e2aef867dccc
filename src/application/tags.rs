//! Tag lookup, search and admin edits.

use std::sync::Arc;

use agora_api_types::{EntityId, Tag, TagUpdateForm};
use tracing::{info, instrument};

use crate::application::error::ClientError;
use crate::application::identity::IdentityService;
use crate::application::repos::ForumApi;
use crate::cache::{CacheCoordinator, QueryKey};

#[derive(Clone)]
pub struct TagService {
    api: Arc<dyn ForumApi>,
    cache: Arc<CacheCoordinator>,
    identity: IdentityService,
}

impl TagService {
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

    pub async fn fetch_one(&self, id: EntityId) -> Result<Tag, ClientError> {
        self.cache
            .fetch(QueryKey::Tag(id), move || async move {
                self.api
                    .tag(id)
                    .await
                    .map_err(|err| ClientError::from_api(err, "tag"))
            })
            .await
    }

    /// Tags whose name contains `query`; a blank query lists every tag.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Tag>, ClientError> {
        let query = query
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(str::to_string);
        let key = QueryKey::tag_search(query.clone());

        self.cache
            .fetch(key, move || async move {
                self.api
                    .tags(query.as_deref())
                    .await
                    .map_err(|err| ClientError::from_api(err, "tag"))
            })
            .await
    }

    pub async fn trending(&self) -> Result<Vec<Tag>, ClientError> {
        self.cache
            .fetch(QueryKey::TrendingTags, move || async move {
                self.api
                    .trending_tags()
                    .await
                    .map_err(|err| ClientError::from_api(err, "tag"))
            })
            .await
    }

    /// Changes a tag's color and description. Only admins may edit tags.
    #[instrument(skip(self, description))]
    pub async fn update(
        &self,
        id: EntityId,
        color: &str,
        description: &str,
    ) -> Result<Tag, ClientError> {
        let color = color.trim();
        if !is_hex_color(color) {
            return Err(ClientError::validation(format!(
                "`{color}` is not a #rrggbb color"
            )));
        }

        let actor = self.identity.require_user().await?;
        if !actor.as_active().is_some_and(|profile| profile.is_admin()) {
            return Err(ClientError::Forbidden { entity: "tag" });
        }

        let tag = self
            .api
            .update_tag(
                id,
                &TagUpdateForm {
                    color: color.to_string(),
                    description: description.trim().to_string(),
                },
            )
            .await
            .map_err(|err| ClientError::from_api(err, "tag"))?;
        info!(tag_id = tag.id, name = %tag.name, "Tag updated");
        self.cache.trigger().tag_updated(tag.clone());
        Ok(tag)
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
