//! Signed-in session and the user record behind it.

use std::str::FromStr;
use std::sync::Arc;

use agora_api_types::{Credentials, Me, PostSort, PreferenceForm, PreferenceKey, Prefs};
use tracing::{info, instrument};

use crate::application::error::ClientError;
use crate::application::repos::{ApiError, ForumApi};
use crate::application::users::fetch_user;
use crate::cache::{CacheCoordinator, QueryKey};
use crate::domain::entities::User;
use crate::domain::permissions::can_moderate;

#[derive(Clone)]
pub struct IdentityService {
    api: Arc<dyn ForumApi>,
    cache: Arc<CacheCoordinator>,
}

impl IdentityService {
    pub fn new(api: Arc<dyn ForumApi>, cache: Arc<CacheCoordinator>) -> Self {
        Self { api, cache }
    }

    /// The current session, or `None` when signed out.
    pub async fn me(&self) -> Result<Option<Me>, ClientError> {
        self.cache
            .fetch(QueryKey::Session, move || async move {
                match self.api.me().await {
                    Ok(me) => Ok(Some(me)),
                    Err(ApiError::Unauthorized) => Ok(None),
                    Err(err) => Err(ClientError::from_api(err, "session")),
                }
            })
            .await
    }

    /// The full user record of the session, read through the user key.
    pub async fn current_user(&self) -> Result<Option<User>, ClientError> {
        match self.me().await? {
            Some(me) => fetch_user(self.api.as_ref(), &self.cache, me.id)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    pub async fn require_user(&self) -> Result<User, ClientError> {
        self.current_user().await?.ok_or(ClientError::Unauthorized)
    }

    /// Fails unless the signed-in user may edit or delete content by `author`.
    pub async fn ensure_can_moderate(
        &self,
        author: &User,
        entity: &'static str,
    ) -> Result<User, ClientError> {
        let actor = self.require_user().await?;
        if can_moderate(Some(&actor), author) {
            Ok(actor)
        } else {
            Err(ClientError::Forbidden { entity })
        }
    }

    pub async fn prefs(&self) -> Result<Option<Prefs>, ClientError> {
        Ok(self.me().await?.map(|me| me.prefs))
    }

    /// Signs in and seeds the session. Rejected credentials record "no session".
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Me, ClientError> {
        match self.api.login(credentials).await {
            Ok(me) => {
                info!(user_id = me.id, "Signed in");
                self.cache.trigger().session_replaced(Some(me.clone()));
                Ok(me)
            }
            Err(ApiError::Unauthorized) => {
                self.cache.trigger().session_replaced(None);
                Err(ClientError::Unauthorized)
            }
            Err(err) => Err(ClientError::from_api(err, "session")),
        }
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn register(&self, credentials: &Credentials) -> Result<Me, ClientError> {
        let me = self
            .api
            .register(credentials)
            .await
            .map_err(|err| ClientError::from_api(err, "session"))?;
        info!(user_id = me.id, "Registered");
        self.cache.trigger().session_replaced(Some(me.clone()));
        Ok(me)
    }

    /// Ends the session and drops every cached snapshot.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.api
            .logout()
            .await
            .map_err(|err| ClientError::from_api(err, "session"))?;
        self.cache.trigger().session_ended();
        Ok(())
    }

    #[instrument(skip(self, value), fields(key = key.as_str()))]
    pub async fn update_preference(
        &self,
        key: PreferenceKey,
        value: &str,
    ) -> Result<(), ClientError> {
        let value = normalize_preference(key, value)?;
        if self.me().await?.is_none() {
            return Err(ClientError::Unauthorized);
        }

        self.api
            .set_preference(key, &PreferenceForm { value })
            .await
            .map_err(|err| ClientError::from_api(err, "session"))?;
        self.cache.trigger().session_changed();
        Ok(())
    }
}

fn normalize_preference(key: PreferenceKey, value: &str) -> Result<String, ClientError> {
    let value = value.trim();
    match key {
        PreferenceKey::PrefersDarkMode | PreferenceKey::PrefersReducedMotion => {
            let flag = bool::from_str(value).map_err(|_| {
                ClientError::validation(format!("`{}` expects true or false", key.as_str()))
            })?;
            Ok(flag.to_string())
        }
        PreferenceKey::PreferredSort => PostSort::from_str(value)
            .map(|sort| sort.as_str().to_string())
            .map_err(|err| ClientError::validation(err.to_string())),
    }
}
