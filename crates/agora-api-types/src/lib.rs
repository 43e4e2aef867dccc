//! Request and response shapes exchanged with the forum HTTP API.
//!
//! Response types mirror the JSON the server emits, including the flattened
//! tombstone encoding (`deleted: true` with every content field omitted).
//! The client crate turns them into explicit enums before anything reads
//! them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Numeric identifier used by every entity the API exposes.
pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Admin,
    #[serde(other)]
    Unknown,
}

/// Ordering accepted by the post listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSort {
    Popular,
    Replies,
    // The server stores an empty string until the user picks a sort.
    #[default]
    #[serde(other)]
    Latest,
}

impl PostSort {
    pub fn as_str(self) -> &'static str {
        match self {
            PostSort::Latest => "latest",
            PostSort::Popular => "popular",
            PostSort::Replies => "replies",
        }
    }
}

impl fmt::Display for PostSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostSort {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "latest" => Ok(PostSort::Latest),
            "popular" => Ok(PostSort::Popular),
            "replies" => Ok(PostSort::Replies),
            other => Err(UnknownVariant::new("post sort", other)),
        }
    }
}

/// Ordering accepted by the comment listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSort {
    #[default]
    Latest,
    Top,
}

impl CommentSort {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentSort::Latest => "latest",
            CommentSort::Top => "top",
        }
    }
}

impl fmt::Display for CommentSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentSort {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "latest" => Ok(CommentSort::Latest),
            "top" => Ok(CommentSort::Top),
            other => Err(UnknownVariant::new("comment sort", other)),
        }
    }
}

/// The fixed reaction vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionName {
    Upvote,
    Downvote,
    Laugh,
    Love,
    Wow,
    Think,
    Sus,
    Cry,
    Angry,
}

impl ReactionName {
    pub const ALL: [ReactionName; 9] = [
        ReactionName::Upvote,
        ReactionName::Downvote,
        ReactionName::Laugh,
        ReactionName::Love,
        ReactionName::Wow,
        ReactionName::Think,
        ReactionName::Sus,
        ReactionName::Cry,
        ReactionName::Angry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionName::Upvote => "Upvote",
            ReactionName::Downvote => "Downvote",
            ReactionName::Laugh => "Laugh",
            ReactionName::Love => "Love",
            ReactionName::Wow => "Wow",
            ReactionName::Think => "Think",
            ReactionName::Sus => "Sus",
            ReactionName::Cry => "Cry",
            ReactionName::Angry => "Angry",
        }
    }
}

impl fmt::Display for ReactionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionName {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownVariant::new("reaction", value))
    }
}

/// Returned by `FromStr` implementations when the input names no variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// ============================================================================
// Responses
// ============================================================================

/// A user as serialized by the server. Tombstones carry only `deleted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserWire {
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWire {
    pub id: EntityId,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<UserWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<EntityId>>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWire {
    pub id: EntityId,
    pub post_id: EntityId,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<UserWire>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

/// Aggregated count of one reaction kind on a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: EntityId,
    pub name: ReactionName,
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Prefs {
    pub prefers_dark_mode: bool,
    pub prefers_reduced_motion: bool,
    pub preferred_sort: PostSort,
}

/// The signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Me {
    pub id: EntityId,
    #[serde(default)]
    pub prefs: Prefs,
}

// ============================================================================
// Requests
// ============================================================================

/// Preference keys accepted by `PATCH /api/me/{key}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    PrefersDarkMode,
    PrefersReducedMotion,
    PreferredSort,
}

impl PreferenceKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::PrefersDarkMode => "prefersDarkMode",
            PreferenceKey::PrefersReducedMotion => "prefersReducedMotion",
            PreferenceKey::PreferredSort => "preferredSort",
        }
    }
}

impl FromStr for PreferenceKey {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "prefersDarkMode" | "dark-mode" => Ok(PreferenceKey::PrefersDarkMode),
            "prefersReducedMotion" | "reduced-motion" => Ok(PreferenceKey::PrefersReducedMotion),
            "preferredSort" | "sort" => Ok(PreferenceKey::PreferredSort),
            other => Err(UnknownVariant::new("preference", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// `tags` is a comma separated list of tag names; the server keeps three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCreateForm {
    pub title: String,
    pub body: String,
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyForm {
    pub body: String,
}

/// An empty `reaction` clears the caller's reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionForm {
    pub reaction: String,
}

impl ReactionForm {
    pub fn new(reaction: Option<ReactionName>) -> Self {
        Self {
            reaction: reaction.map(ReactionName::as_str).unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdateForm {
    pub color: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdateForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceForm {
    pub value: String,
}
