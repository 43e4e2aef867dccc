//! User profiles.

use std::sync::Arc;

use agora_api_types::{EntityId, UserUpdateForm};
use tracing::instrument;

use crate::application::error::ClientError;
use crate::application::identity::IdentityService;
use crate::application::repos::{AvatarUpload, ForumApi};
use crate::cache::{CacheCoordinator, QueryKey};
use crate::domain::entities::User;

/// Reads one user through the shared cache key.
pub(crate) async fn fetch_user(
    api: &dyn ForumApi,
    cache: &CacheCoordinator,
    id: EntityId,
) -> Result<User, ClientError> {
    cache
        .fetch(QueryKey::User(id), move || async move {
            api.user(id)
                .await
                .map_err(|err| ClientError::from_api(err, "user"))
        })
        .await
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub bio: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    api: Arc<dyn ForumApi>,
    cache: Arc<CacheCoordinator>,
    identity: IdentityService,
}

impl UserService {
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

    pub async fn fetch_one(&self, id: EntityId) -> Result<User, ClientError> {
        fetch_user(self.api.as_ref(), &self.cache, id).await
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: EntityId, update: UserUpdate) -> Result<User, ClientError> {
        // Empty fields are not sent; the server keeps the current value.
        let form = UserUpdateForm {
            bio: update.bio.filter(|bio| !bio.is_empty()),
            password: update.password.filter(|password| !password.is_empty()),
        };
        if form.bio.is_none() && form.password.is_none() {
            return Err(ClientError::validation("nothing to update"));
        }

        self.authorize(id).await?;
        let user = self
            .api
            .update_user(id, &form)
            .await
            .map_err(|err| ClientError::from_api(err, "user"))?;
        self.cache.trigger().user_updated(id, user.clone());
        Ok(user)
    }

    #[instrument(skip(self, avatar), fields(bytes = avatar.bytes.len()))]
    pub async fn update_avatar(
        &self,
        id: EntityId,
        avatar: AvatarUpload,
    ) -> Result<User, ClientError> {
        if avatar.bytes.is_empty() {
            return Err(ClientError::validation("avatar file is empty"));
        }

        self.authorize(id).await?;
        let user = self
            .api
            .upload_avatar(id, avatar)
            .await
            .map_err(|err| ClientError::from_api(err, "user"))?;
        self.cache.trigger().user_updated(id, user.clone());
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_avatar(&self, id: EntityId) -> Result<User, ClientError> {
        self.authorize(id).await?;
        let user = self
            .api
            .delete_avatar(id)
            .await
            .map_err(|err| ClientError::from_api(err, "user"))?;
        self.cache.trigger().user_updated(id, user.clone());
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<User, ClientError> {
        self.authorize(id).await?;
        let user = self
            .api
            .delete_user(id)
            .await
            .map_err(|err| ClientError::from_api(err, "user"))?;
        self.cache.trigger().user_deleted(id);
        Ok(user)
    }

    async fn authorize(&self, id: EntityId) -> Result<(), ClientError> {
        let target = self.fetch_one(id).await?;
        self.identity.ensure_can_moderate(&target, "user").await?;
        Ok(())
    }
}
