//! Reactions on posts and comments.

use std::sync::Arc;

use agora_api_types::{Reaction, ReactionForm, ReactionName};
use tracing::{debug, instrument};

use crate::application::error::ClientError;
use crate::application::identity::IdentityService;
use crate::application::repos::{ApiError, ForumApi};
use crate::cache::{CacheCoordinator, QueryKey};
use crate::domain::reactions::{Subject, vote_score};

#[derive(Clone)]
pub struct ReactionService {
    api: Arc<dyn ForumApi>,
    cache: Arc<CacheCoordinator>,
    identity: IdentityService,
}

impl ReactionService {
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

    /// Aggregate counts per reaction name.
    pub async fn for_subject(&self, subject: Subject) -> Result<Vec<Reaction>, ClientError> {
        self.cache
            .fetch(QueryKey::Reactions(subject), move || async move {
                self.api
                    .reactions(subject)
                    .await
                    .map_err(|err| ClientError::from_api(err, "reaction"))
            })
            .await
    }

    /// The signed-in user's reaction. Signed out, nothing is requested.
    pub async fn mine(&self, subject: Subject) -> Result<Option<Reaction>, ClientError> {
        let Some(me) = self.identity.me().await? else {
            debug!(%subject, "No session; skipping own reaction lookup");
            return Ok(None);
        };
        if subject.id() == 0 {
            return Ok(None);
        }

        let user_id = me.id;
        self.cache
            .fetch(
                QueryKey::UserReaction { subject, user_id },
                move || async move {
                    match self.api.user_reaction(subject, user_id).await {
                        Ok(reaction) => Ok(Some(reaction)),
                        Err(ApiError::NotFound) => Ok(None),
                        Err(err) => Err(ClientError::from_api(err, "reaction")),
                    }
                },
            )
            .await
    }

    /// Sets or, with `None`, clears the signed-in user's reaction.
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn set(
        &self,
        subject: Subject,
        reaction: Option<ReactionName>,
    ) -> Result<(), ClientError> {
        if self.identity.me().await?.is_none() {
            return Err(ClientError::Unauthorized);
        }

        self.api
            .react(subject, &ReactionForm::new(reaction))
            .await
            .map_err(|err| ClientError::from_api(err, "reaction"))?;
        self.cache.trigger().reaction_changed(subject);
        Ok(())
    }

    /// Upvotes minus downvotes, derived from the aggregate.
    pub async fn vote_score(&self, subject: Subject) -> Result<i64, ClientError> {
        Ok(vote_score(&self.for_subject(subject).await?))
    }
}
