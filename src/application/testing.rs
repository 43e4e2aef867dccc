//! In-memory forum used by the service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agora_api_types::{
    BodyForm, Credentials, EntityId, Me, PostCreateForm, PreferenceForm, PreferenceKey, Prefs,
    Reaction, ReactionForm, ReactionName, Role, Tag, TagUpdateForm, UserUpdateForm,
};
use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::application::repos::{
    ApiError, AvatarUpload, CommentsApi, IdentityApi, PostsApi, ReactionsApi, TagsApi, UsersApi,
};
use crate::cache::{CacheConfig, CacheCoordinator, CommentListFilter, PostListFilter};
use crate::domain::entities::{Comment, CommentContent, Post, PostContent, User, UserProfile};
use crate::domain::reactions::Subject;

pub(crate) const CREATED: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

pub(crate) fn member(id: EntityId, username: &str) -> User {
    User::Active(UserProfile {
        id,
        username: username.to_string(),
        role: Role::Member,
        bio: None,
        avatar: None,
        post_count: None,
        comment_count: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    })
}

pub(crate) fn admin(id: EntityId, username: &str) -> User {
    match member(id, username) {
        User::Active(profile) => User::Active(UserProfile {
            role: Role::Admin,
            ..profile
        }),
        deleted => deleted,
    }
}

pub(crate) fn post(id: EntityId, author: &User) -> Post {
    Post::Active(PostContent {
        id,
        title: format!("post {id}"),
        body: "body".to_string(),
        author: author.clone(),
        comment_count: 0,
        tags: Vec::new(),
        created_at: CREATED,
        updated_at: CREATED,
    })
}

pub(crate) fn comment(id: EntityId, post_id: EntityId, author: &User) -> Comment {
    Comment::Active(CommentContent {
        id,
        post_id,
        body: "comment".to_string(),
        author: author.clone(),
        created_at: CREATED,
        updated_at: CREATED,
    })
}

pub(crate) fn tag(id: EntityId, name: &str) -> Tag {
    Tag {
        id,
        name: name.to_string(),
        color: "#888888".to_string(),
        description: String::new(),
    }
}

pub(crate) fn me(id: EntityId) -> Me {
    Me {
        id,
        prefs: Prefs::default(),
    }
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub session: Option<Me>,
    pub accounts: HashMap<String, Me>,
    pub users: HashMap<EntityId, User>,
    pub posts: HashMap<EntityId, Post>,
    pub post_pages: HashMap<u32, Vec<Post>>,
    pub comments: HashMap<EntityId, Comment>,
    pub comment_pages: HashMap<u32, Vec<Comment>>,
    pub tags: HashMap<EntityId, Tag>,
    pub reactions: HashMap<Subject, Vec<Reaction>>,
    pub user_reactions: HashMap<(Subject, EntityId), Reaction>,
    pub failures: HashMap<&'static str, ApiError>,
    pub calls: Vec<String>,
    pub next_id: EntityId,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with<R>(&self, edit: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().expect("fake state");
        edit(&mut state)
    }

    pub(crate) fn sign_in_as(&self, user: &User) {
        let id = user.id().expect("active user");
        self.with(|state| {
            state.session = Some(me(id));
            state.users.insert(id, user.clone());
        });
    }

    pub(crate) fn fail(&self, endpoint: &'static str, err: ApiError) {
        self.with(|state| state.failures.insert(endpoint, err));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.with(|state| state.calls.clone())
    }

    /// Counts recorded calls equal to `prefix` or starting with `prefix` plus a space.
    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.with(|state| {
            state
                .calls
                .iter()
                .filter(|call| {
                    call.as_str() == prefix
                        || call
                            .strip_prefix(prefix)
                            .is_some_and(|rest| rest.starts_with(' '))
                })
                .count()
        })
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.with(|state| {
            let endpoint = call.split(' ').next().unwrap_or_default().to_string();
            state.calls.push(call);
            match state.failures.get(endpoint.as_str()) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        })
    }

    fn next_id(&self) -> EntityId {
        self.with(|state| {
            state.next_id += 1;
            100 + state.next_id
        })
    }

    fn session_user(&self) -> Result<User, ApiError> {
        self.with(|state| {
            let me = state.session.clone().ok_or(ApiError::Unauthorized)?;
            state.users.get(&me.id).cloned().ok_or(ApiError::NotFound)
        })
    }
}

pub(crate) fn cache() -> Arc<CacheCoordinator> {
    Arc::new(CacheCoordinator::new(&CacheConfig::default()))
}

#[async_trait]
impl IdentityApi for FakeApi {
    async fn me(&self) -> Result<Me, ApiError> {
        self.record("me".to_string())?;
        self.with(|state| state.session.clone().ok_or(ApiError::Unauthorized))
    }

    async fn set_preference(
        &self,
        key: PreferenceKey,
        form: &PreferenceForm,
    ) -> Result<(), ApiError> {
        self.record(format!("set_preference {}={}", key.as_str(), form.value))?;
        self.with(|state| {
            let me = state.session.as_mut().ok_or(ApiError::Unauthorized)?;
            match key {
                PreferenceKey::PrefersDarkMode => me.prefs.prefers_dark_mode = form.value == "true",
                PreferenceKey::PrefersReducedMotion => {
                    me.prefs.prefers_reduced_motion = form.value == "true";
                }
                PreferenceKey::PreferredSort => {
                    me.prefs.preferred_sort = form.value.parse().unwrap_or_default();
                }
            }
            Ok(())
        })
    }

    async fn login(&self, credentials: &Credentials) -> Result<Me, ApiError> {
        self.record(format!("login {}", credentials.username))?;
        self.with(|state| {
            let me = state
                .accounts
                .get(&credentials.username)
                .cloned()
                .ok_or(ApiError::Unauthorized)?;
            state.session = Some(me.clone());
            Ok(me)
        })
    }

    async fn register(&self, credentials: &Credentials) -> Result<Me, ApiError> {
        self.record(format!("register {}", credentials.username))?;
        let id = self.next_id();
        self.with(|state| {
            let me = me(id);
            state.accounts.insert(credentials.username.clone(), me.clone());
            state.users.insert(id, member(id, &credentials.username));
            state.session = Some(me.clone());
            Ok(me)
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout".to_string())?;
        self.with(|state| state.session = None);
        Ok(())
    }
}

#[async_trait]
impl UsersApi for FakeApi {
    async fn user(&self, id: EntityId) -> Result<User, ApiError> {
        self.record(format!("user {id}"))?;
        self.with(|state| state.users.get(&id).cloned().ok_or(ApiError::NotFound))
    }

    async fn update_user(&self, id: EntityId, form: &UserUpdateForm) -> Result<User, ApiError> {
        self.record(format!("update_user {id}"))?;
        self.with(|state| {
            let user = state.users.get_mut(&id).ok_or(ApiError::NotFound)?;
            if let User::Active(profile) = user
                && let Some(bio) = form.bio.as_ref()
            {
                profile.bio = Some(bio.clone());
            }
            Ok(user.clone())
        })
    }

    async fn upload_avatar(&self, id: EntityId, avatar: AvatarUpload) -> Result<User, ApiError> {
        self.record(format!("upload_avatar {id} {}", avatar.bytes.len()))?;
        self.with(|state| {
            let user = state.users.get_mut(&id).ok_or(ApiError::NotFound)?;
            if let User::Active(profile) = user {
                profile.avatar = Some(format!("/uploads/{}", avatar.file_name));
            }
            Ok(user.clone())
        })
    }

    async fn delete_avatar(&self, id: EntityId) -> Result<User, ApiError> {
        self.record(format!("delete_avatar {id}"))?;
        self.with(|state| {
            let user = state.users.get_mut(&id).ok_or(ApiError::NotFound)?;
            if let User::Active(profile) = user {
                profile.avatar = None;
            }
            Ok(user.clone())
        })
    }

    async fn delete_user(&self, id: EntityId) -> Result<User, ApiError> {
        self.record(format!("delete_user {id}"))?;
        self.with(|state| {
            state.users.remove(&id).ok_or(ApiError::NotFound)?;
            let tombstone = User::Deleted { id: Some(id) };
            state.users.insert(id, tombstone.clone());
            Ok(tombstone)
        })
    }
}

#[async_trait]
impl PostsApi for FakeApi {
    async fn post(&self, id: EntityId) -> Result<Post, ApiError> {
        self.record(format!("post {id}"))?;
        self.with(|state| state.posts.get(&id).cloned().ok_or(ApiError::NotFound))
    }

    async fn posts(&self, filter: &PostListFilter, page: u32) -> Result<Vec<Post>, ApiError> {
        self.record(format!(
            "posts page={page} sort={} tag={:?}",
            filter.sort.as_str(),
            filter.tag
        ))?;
        self.with(|state| Ok(state.post_pages.get(&page).cloned().unwrap_or_default()))
    }

    async fn create_post(&self, form: &PostCreateForm) -> Result<Post, ApiError> {
        self.record(format!("create_post {}", form.title))?;
        let author = self.session_user()?;
        let id = self.next_id();
        let created = match post(id, &author) {
            Post::Active(content) => Post::Active(PostContent {
                title: form.title.clone(),
                body: form.body.clone(),
                ..content
            }),
            deleted => deleted,
        };
        self.with(|state| state.posts.insert(id, created.clone()));
        Ok(created)
    }

    async fn update_post(&self, id: EntityId, form: &BodyForm) -> Result<Post, ApiError> {
        self.record(format!("update_post {id}"))?;
        self.with(|state| {
            let post = state.posts.get_mut(&id).ok_or(ApiError::NotFound)?;
            if let Post::Active(content) = post {
                content.body = form.body.clone();
                content.updated_at = datetime!(2024-01-02 00:00 UTC);
            }
            Ok(post.clone())
        })
    }

    async fn delete_post(&self, id: EntityId) -> Result<(), ApiError> {
        self.record(format!("delete_post {id}"))?;
        self.with(|state| {
            state.posts.remove(&id).ok_or(ApiError::NotFound)?;
            state.posts.insert(id, Post::Deleted { id });
            Ok(())
        })
    }
}

#[async_trait]
impl CommentsApi for FakeApi {
    async fn comment(&self, id: EntityId) -> Result<Comment, ApiError> {
        self.record(format!("comment {id}"))?;
        self.with(|state| state.comments.get(&id).cloned().ok_or(ApiError::NotFound))
    }

    async fn comments(
        &self,
        filter: &CommentListFilter,
        page: u32,
    ) -> Result<Vec<Comment>, ApiError> {
        self.record(format!(
            "comments page={page} post={:?} user={:?}",
            filter.post_id, filter.author
        ))?;
        self.with(|state| Ok(state.comment_pages.get(&page).cloned().unwrap_or_default()))
    }

    async fn create_comment(
        &self,
        post_id: EntityId,
        form: &BodyForm,
    ) -> Result<Comment, ApiError> {
        self.record(format!("create_comment {post_id}"))?;
        let author = self.session_user()?;
        let id = self.next_id();
        let created = match comment(id, post_id, &author) {
            Comment::Active(content) => Comment::Active(CommentContent {
                body: form.body.clone(),
                ..content
            }),
            deleted => deleted,
        };
        self.with(|state| state.comments.insert(id, created.clone()));
        Ok(created)
    }

    async fn update_comment(&self, id: EntityId, form: &BodyForm) -> Result<Comment, ApiError> {
        self.record(format!("update_comment {id}"))?;
        self.with(|state| {
            let comment = state.comments.get_mut(&id).ok_or(ApiError::NotFound)?;
            if let Comment::Active(content) = comment {
                content.body = form.body.clone();
                content.updated_at = datetime!(2024-01-02 00:00 UTC);
            }
            Ok(comment.clone())
        })
    }

    async fn delete_comment(&self, id: EntityId) -> Result<Comment, ApiError> {
        self.record(format!("delete_comment {id}"))?;
        self.with(|state| {
            let removed = state.comments.remove(&id).ok_or(ApiError::NotFound)?;
            let tombstone = Comment::Deleted {
                id,
                post_id: removed.post_id(),
            };
            state.comments.insert(id, tombstone.clone());
            Ok(tombstone)
        })
    }
}

#[async_trait]
impl TagsApi for FakeApi {
    async fn tag(&self, id: EntityId) -> Result<Tag, ApiError> {
        self.record(format!("tag {id}"))?;
        self.with(|state| state.tags.get(&id).cloned().ok_or(ApiError::NotFound))
    }

    async fn tags(&self, query: Option<&str>) -> Result<Vec<Tag>, ApiError> {
        self.record(format!("tags {}", query.unwrap_or_default()))?;
        let needle = query.unwrap_or_default().to_lowercase();
        self.with(|state| {
            let mut found: Vec<Tag> = state
                .tags
                .values()
                .filter(|tag| tag.name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            found.sort_by_key(|tag| tag.id);
            Ok(found)
        })
    }

    async fn trending_tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.record("trending_tags".to_string())?;
        self.with(|state| {
            let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
            tags.sort_by_key(|tag| tag.id);
            Ok(tags)
        })
    }

    async fn update_tag(&self, id: EntityId, form: &TagUpdateForm) -> Result<Tag, ApiError> {
        self.record(format!("update_tag {id}"))?;
        self.with(|state| {
            let tag = state.tags.get_mut(&id).ok_or(ApiError::NotFound)?;
            tag.color = form.color.clone();
            tag.description = form.description.clone();
            Ok(tag.clone())
        })
    }
}

#[async_trait]
impl ReactionsApi for FakeApi {
    async fn reactions(&self, subject: Subject) -> Result<Vec<Reaction>, ApiError> {
        self.record(format!("reactions {subject}"))?;
        self.with(|state| Ok(state.reactions.get(&subject).cloned().unwrap_or_default()))
    }

    async fn user_reaction(
        &self,
        subject: Subject,
        user_id: EntityId,
    ) -> Result<Reaction, ApiError> {
        self.record(format!("user_reaction {subject} {user_id}"))?;
        self.with(|state| {
            state
                .user_reactions
                .get(&(subject, user_id))
                .cloned()
                .ok_or(ApiError::NotFound)
        })
    }

    async fn react(&self, subject: Subject, form: &ReactionForm) -> Result<(), ApiError> {
        self.record(format!("react {subject} {}", form.reaction))?;
        let user_id = self.with(|state| {
            state
                .session
                .as_ref()
                .map(|me| me.id)
                .ok_or(ApiError::Unauthorized)
        })?;
        let name: Option<ReactionName> = form.reaction.parse().ok();
        self.with(|state| {
            match name {
                Some(name) => {
                    let entry = state.reactions.entry(subject).or_default();
                    match entry.iter_mut().find(|reaction| reaction.name == name) {
                        Some(reaction) => reaction.count += 1,
                        None => entry.push(Reaction {
                            id: 0,
                            name,
                            count: 1,
                        }),
                    }
                    state.user_reactions.insert(
                        (subject, user_id),
                        Reaction {
                            id: 0,
                            name,
                            count: 1,
                        },
                    );
                }
                None => {
                    state.user_reactions.remove(&(subject, user_id));
                }
            }
            Ok(())
        })
    }
}
