//! The remote forum API as seen by the application layer.

use agora_api_types::{
    BodyForm, Credentials, EntityId, Me, PostCreateForm, PreferenceForm, PreferenceKey, Reaction,
    ReactionForm, Tag, TagUpdateForm, UserUpdateForm,
};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::cache::{CommentListFilter, PostListFilter};
use crate::domain::entities::{Comment, Post, User};
use crate::domain::reactions::Subject;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,
    #[error("authentication required")]
    Unauthorized,
    #[error("permission denied")]
    Forbidden,
    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn from_decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Maps a non-success status; the body is kept for diagnostics only.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            _ => Self::Status {
                status,
                body: body.into(),
            },
        }
    }
}

/// An avatar image sent as the `file` part of a multipart upload.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn me(&self) -> Result<Me, ApiError>;

    async fn set_preference(
        &self,
        key: PreferenceKey,
        form: &PreferenceForm,
    ) -> Result<(), ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<Me, ApiError>;

    async fn register(&self, credentials: &Credentials) -> Result<Me, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn user(&self, id: EntityId) -> Result<User, ApiError>;

    async fn update_user(&self, id: EntityId, form: &UserUpdateForm) -> Result<User, ApiError>;

    async fn upload_avatar(&self, id: EntityId, avatar: AvatarUpload) -> Result<User, ApiError>;

    async fn delete_avatar(&self, id: EntityId) -> Result<User, ApiError>;

    async fn delete_user(&self, id: EntityId) -> Result<User, ApiError>;
}

#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn post(&self, id: EntityId) -> Result<Post, ApiError>;

    async fn posts(&self, filter: &PostListFilter, page: u32) -> Result<Vec<Post>, ApiError>;

    async fn create_post(&self, form: &PostCreateForm) -> Result<Post, ApiError>;

    async fn update_post(&self, id: EntityId, form: &BodyForm) -> Result<Post, ApiError>;

    async fn delete_post(&self, id: EntityId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait CommentsApi: Send + Sync {
    async fn comment(&self, id: EntityId) -> Result<Comment, ApiError>;

    async fn comments(
        &self,
        filter: &CommentListFilter,
        page: u32,
    ) -> Result<Vec<Comment>, ApiError>;

    async fn create_comment(&self, post_id: EntityId, form: &BodyForm)
    -> Result<Comment, ApiError>;

    async fn update_comment(&self, id: EntityId, form: &BodyForm) -> Result<Comment, ApiError>;

    /// Returns the removed comment, usually as a tombstone.
    async fn delete_comment(&self, id: EntityId) -> Result<Comment, ApiError>;
}

#[async_trait]
pub trait TagsApi: Send + Sync {
    async fn tag(&self, id: EntityId) -> Result<Tag, ApiError>;

    async fn tags(&self, query: Option<&str>) -> Result<Vec<Tag>, ApiError>;

    async fn trending_tags(&self) -> Result<Vec<Tag>, ApiError>;

    async fn update_tag(&self, id: EntityId, form: &TagUpdateForm) -> Result<Tag, ApiError>;
}

#[async_trait]
pub trait ReactionsApi: Send + Sync {
    async fn reactions(&self, subject: Subject) -> Result<Vec<Reaction>, ApiError>;

    /// `NotFound` means the user has not reacted to the subject.
    async fn user_reaction(&self, subject: Subject, user_id: EntityId)
    -> Result<Reaction, ApiError>;

    async fn react(&self, subject: Subject, form: &ReactionForm) -> Result<(), ApiError>;
}

/// Every endpoint the client talks to.
pub trait ForumApi: IdentityApi + UsersApi + PostsApi + CommentsApi + TagsApi + ReactionsApi {}

impl<T> ForumApi for T where
    T: IdentityApi + UsersApi + PostsApi + CommentsApi + TagsApi + ReactionsApi
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(ApiError::from_status(404, ""), ApiError::NotFound);
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
        assert_eq!(ApiError::from_status(403, ""), ApiError::Forbidden);
        assert_eq!(
            ApiError::from_status(502, "bad gateway"),
            ApiError::Status {
                status: 502,
                body: "bad gateway".to_string()
            }
        );
    }
}
