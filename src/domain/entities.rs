//! Forum entities as immutable snapshots.
//!
//! The server flattens tombstones into the live shape with `deleted: true`.
//! Here every entity is a sum type so content can only be reached after
//! matching the `Active` variant.

use agora_api_types::{CommentWire, EntityId, PostWire, Role, UserWire};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: EntityId,
    pub username: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub post_count: Option<u32>,
    pub comment_count: Option<u32>,
    pub created_at: String,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserWire", into = "UserWire")]
pub enum User {
    Active(UserProfile),
    /// The server may omit the id of a removed account.
    Deleted { id: Option<EntityId> },
}

impl User {
    pub fn id(&self) -> Option<EntityId> {
        match self {
            User::Active(profile) => Some(profile.id),
            User::Deleted { id } => *id,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, User::Deleted { .. })
    }

    pub fn as_active(&self) -> Option<&UserProfile> {
        match self {
            User::Active(profile) => Some(profile),
            User::Deleted { .. } => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.as_active().map(|profile| profile.username.as_str())
    }
}

impl TryFrom<UserWire> for User {
    type Error = DomainError;

    fn try_from(wire: UserWire) -> Result<Self, Self::Error> {
        if wire.deleted {
            return Ok(User::Deleted { id: wire.id });
        }

        Ok(User::Active(UserProfile {
            id: wire.id.ok_or_else(|| DomainError::missing("user", "id"))?,
            username: wire
                .username
                .ok_or_else(|| DomainError::missing("user", "username"))?,
            role: wire.role.ok_or_else(|| DomainError::missing("user", "role"))?,
            bio: wire.bio,
            avatar: wire.avatar,
            post_count: wire.post_count,
            comment_count: wire.comment_count,
            created_at: wire
                .created_at
                .ok_or_else(|| DomainError::missing("user", "createdAt"))?,
        }))
    }
}

impl From<User> for UserWire {
    fn from(user: User) -> Self {
        match user {
            User::Active(profile) => UserWire {
                deleted: false,
                id: Some(profile.id),
                username: Some(profile.username),
                role: Some(profile.role),
                bio: profile.bio,
                avatar: profile.avatar,
                post_count: profile.post_count,
                comment_count: profile.comment_count,
                created_at: Some(profile.created_at),
            },
            User::Deleted { id } => UserWire {
                deleted: true,
                id,
                ..UserWire::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    pub id: EntityId,
    pub title: String,
    pub body: String,
    pub author: User,
    pub comment_count: u32,
    pub tags: Vec<EntityId>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PostWire", into = "PostWire")]
pub enum Post {
    Active(PostContent),
    Deleted { id: EntityId },
}

impl Post {
    pub fn id(&self) -> EntityId {
        match self {
            Post::Active(content) => content.id,
            Post::Deleted { id } => *id,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Post::Deleted { .. })
    }

    pub fn as_active(&self) -> Option<&PostContent> {
        match self {
            Post::Active(content) => Some(content),
            Post::Deleted { .. } => None,
        }
    }

    pub fn author(&self) -> Option<&User> {
        self.as_active().map(|content| &content.author)
    }

    pub fn is_edited(&self) -> bool {
        self.as_active()
            .is_some_and(|content| content.updated_at != content.created_at)
    }
}

impl TryFrom<PostWire> for Post {
    type Error = DomainError;

    fn try_from(wire: PostWire) -> Result<Self, Self::Error> {
        if wire.deleted {
            return Ok(Post::Deleted { id: wire.id });
        }

        let author = wire
            .author
            .ok_or_else(|| DomainError::missing("post", "author"))?;

        Ok(Post::Active(PostContent {
            id: wire.id,
            title: wire.title.ok_or_else(|| DomainError::missing("post", "title"))?,
            body: wire.body.ok_or_else(|| DomainError::missing("post", "body"))?,
            author: User::try_from(author)?,
            comment_count: wire.comment_count.unwrap_or_default(),
            tags: wire.tags.unwrap_or_default(),
            created_at: wire
                .created_at
                .ok_or_else(|| DomainError::missing("post", "createdAt"))?,
            updated_at: wire
                .updated_at
                .ok_or_else(|| DomainError::missing("post", "updatedAt"))?,
        }))
    }
}

impl From<Post> for PostWire {
    fn from(post: Post) -> Self {
        match post {
            Post::Active(content) => PostWire {
                id: content.id,
                deleted: false,
                title: Some(content.title),
                body: Some(content.body),
                author: Some(content.author.into()),
                comment_count: Some(content.comment_count),
                tags: Some(content.tags),
                created_at: Some(content.created_at),
                updated_at: Some(content.updated_at),
            },
            Post::Deleted { id } => PostWire {
                id,
                deleted: true,
                title: None,
                body: None,
                author: None,
                comment_count: None,
                tags: None,
                created_at: None,
                updated_at: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent {
    pub id: EntityId,
    pub post_id: EntityId,
    pub body: String,
    pub author: User,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CommentWire", into = "CommentWire")]
pub enum Comment {
    Active(CommentContent),
    Deleted { id: EntityId, post_id: EntityId },
}

impl Comment {
    pub fn id(&self) -> EntityId {
        match self {
            Comment::Active(content) => content.id,
            Comment::Deleted { id, .. } => *id,
        }
    }

    pub fn post_id(&self) -> EntityId {
        match self {
            Comment::Active(content) => content.post_id,
            Comment::Deleted { post_id, .. } => *post_id,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Comment::Deleted { .. })
    }

    pub fn as_active(&self) -> Option<&CommentContent> {
        match self {
            Comment::Active(content) => Some(content),
            Comment::Deleted { .. } => None,
        }
    }

    pub fn author(&self) -> Option<&User> {
        self.as_active().map(|content| &content.author)
    }

    pub fn is_edited(&self) -> bool {
        self.as_active()
            .is_some_and(|content| content.updated_at != content.created_at)
    }
}

impl TryFrom<CommentWire> for Comment {
    type Error = DomainError;

    fn try_from(wire: CommentWire) -> Result<Self, Self::Error> {
        if wire.deleted {
            return Ok(Comment::Deleted {
                id: wire.id,
                post_id: wire.post_id,
            });
        }

        let author = wire
            .author
            .ok_or_else(|| DomainError::missing("comment", "author"))?;

        Ok(Comment::Active(CommentContent {
            id: wire.id,
            post_id: wire.post_id,
            body: wire
                .body
                .ok_or_else(|| DomainError::missing("comment", "body"))?,
            author: User::try_from(author)?,
            created_at: wire
                .created_at
                .ok_or_else(|| DomainError::missing("comment", "createdAt"))?,
            updated_at: wire
                .updated_at
                .ok_or_else(|| DomainError::missing("comment", "updatedAt"))?,
        }))
    }
}

impl From<Comment> for CommentWire {
    fn from(comment: Comment) -> Self {
        match comment {
            Comment::Active(content) => CommentWire {
                id: content.id,
                post_id: content.post_id,
                deleted: false,
                body: Some(content.body),
                author: Some(content.author.into()),
                created_at: Some(content.created_at),
                updated_at: Some(content.updated_at),
            },
            Comment::Deleted { id, post_id } => CommentWire {
                id,
                post_id,
                deleted: true,
                body: None,
                author: None,
                created_at: None,
                updated_at: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = r#"{"id":1,"username":"alice","role":"member","createdAt":"2024-01-01T00:00:00Z","deleted":false}"#;

    fn post_json(created: &str, updated: &str) -> String {
        format!(
            r#"{{"id":9,"title":"t","body":"b","author":{ALICE},"commentCount":2,"tags":[3,4],"createdAt":"{created}","updatedAt":"{updated}","deleted":false}}"#
        )
    }

    #[test]
    fn active_post_parses_into_content() {
        let post: Post = serde_json::from_str(&post_json(
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:00:00Z",
        ))
        .expect("post");

        let content = post.as_active().expect("active post");
        assert_eq!(content.title, "t");
        assert_eq!(content.tags, vec![3, 4]);
        assert_eq!(content.author.username(), Some("alice"));
        assert!(!post.is_edited());
    }

    #[test]
    fn differing_timestamps_mark_post_edited() {
        let post: Post = serde_json::from_str(&post_json(
            "2024-01-01T00:00:00Z",
            "2024-01-02T08:30:00Z",
        ))
        .expect("post");
        assert!(post.is_edited());
    }

    #[test]
    fn post_tombstone_exposes_only_id() {
        let post: Post = serde_json::from_str(r#"{"id":5,"deleted":true}"#).expect("post");
        assert_eq!(post, Post::Deleted { id: 5 });
        assert!(post.author().is_none());
        assert!(!post.is_edited());
    }

    #[test]
    fn comment_tombstone_keeps_post_id() {
        let comment: Comment =
            serde_json::from_str(r#"{"id":11,"postId":9,"deleted":true}"#).expect("comment");
        assert_eq!(comment, Comment::Deleted { id: 11, post_id: 9 });
        assert_eq!(comment.post_id(), 9);
    }

    #[test]
    fn deleted_user_may_omit_id() {
        let user: User = serde_json::from_str(r#"{"deleted":true}"#).expect("user");
        assert_eq!(user, User::Deleted { id: None });
        assert!(user.id().is_none());
    }

    #[test]
    fn active_post_without_title_is_rejected() {
        let err = serde_json::from_str::<Post>(&format!(
            r#"{{"id":9,"body":"b","author":{ALICE},"createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}}"#
        ))
        .expect_err("missing title");
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn tombstone_serializes_without_content() {
        let json = serde_json::to_string(&Post::Deleted { id: 2 }).expect("serialize");
        assert_eq!(json, r#"{"id":2,"deleted":true}"#);
    }
}
