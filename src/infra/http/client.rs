//! `reqwest` transport for the forum API.
//!
//! Reads are JSON; writes are form encoded, except the avatar upload which is
//! multipart with a single `file` part. The session cookie set by login lives
//! in the client's cookie store.

use agora_api_types::{
    BodyForm, Credentials, EntityId, Me, PostCreateForm, PreferenceForm, PreferenceKey, Reaction,
    ReactionForm, Tag, TagUpdateForm, UserUpdateForm,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use url::form_urlencoded::Serializer;

use crate::application::repos::{
    ApiError, AvatarUpload, CommentsApi, IdentityApi, PostsApi, ReactionsApi, TagsApi, UsersApi,
};
use crate::cache::{CommentListFilter, PostListFilter};
use crate::config::ApiSettings;
use crate::domain::entities::{Comment, Post, User};
use crate::domain::reactions::Subject;
use crate::infra::error::InfraError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub fn user_agent() -> &'static str {
    concat!("agora/", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone)]
pub struct HttpForumApi {
    client: Client,
    base: Url,
}

impl HttpForumApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, InfraError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = settings.token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| InfraError::http_client(format!("invalid bearer token: {err}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(settings.timeout)
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(ApiError::from_transport)
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.get(self.url(path)?))
    }

    fn form(
        &self,
        method: Method,
        url: Url,
        pairs: &[(&str, &str)],
    ) -> RequestBuilder {
        let body = Serializer::new(String::new())
            .extend_pairs(pairs.iter().copied())
            .finish();
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Bytes, ApiError> {
        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(ApiError::from_transport)?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "API response");

        if !status.is_success() {
            return Err(ApiError::from_status(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }
        Ok(body)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(ApiError::from_decode)
    }

    fn reactions_path(subject: Subject) -> String {
        format!("api/reactions/{}/{}", subject.segment(), subject.id())
    }
}

#[async_trait]
impl IdentityApi for HttpForumApi {
    async fn me(&self) -> Result<Me, ApiError> {
        self.json(self.get("api/me")?).await
    }

    async fn set_preference(
        &self,
        key: PreferenceKey,
        form: &PreferenceForm,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("api/me/{}", key.as_str()))?;
        self.send(self.form(Method::PATCH, url, &[("value", form.value.as_str())]))
            .await?;
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<Me, ApiError> {
        let url = self.url("api/auth/login")?;
        self.json(self.form(
            Method::POST,
            url,
            &[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ],
        ))
        .await
    }

    async fn register(&self, credentials: &Credentials) -> Result<Me, ApiError> {
        let url = self.url("api/auth/register")?;
        self.json(self.form(
            Method::POST,
            url,
            &[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ],
        ))
        .await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.url("api/auth/logout")?;
        self.send(self.client.post(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl UsersApi for HttpForumApi {
    async fn user(&self, id: EntityId) -> Result<User, ApiError> {
        self.json(self.get(&format!("api/users/{id}"))?).await
    }

    async fn update_user(&self, id: EntityId, form: &UserUpdateForm) -> Result<User, ApiError> {
        let mut pairs = Vec::new();
        if let Some(bio) = form.bio.as_deref() {
            pairs.push(("bio", bio));
        }
        if let Some(password) = form.password.as_deref() {
            pairs.push(("password", password));
        }

        let url = self.url(&format!("api/users/{id}"))?;
        self.json(self.form(Method::POST, url, &pairs)).await
    }

    async fn upload_avatar(&self, id: EntityId, avatar: AvatarUpload) -> Result<User, ApiError> {
        let mut part = Part::bytes(avatar.bytes.to_vec()).file_name(avatar.file_name);
        if let Some(content_type) = avatar.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(ApiError::from_transport)?;
        }

        let url = self.url(&format!("api/users/{id}/avatar"))?;
        self.json(self.client.post(url).multipart(Form::new().part("file", part)))
            .await
    }

    async fn delete_avatar(&self, id: EntityId) -> Result<User, ApiError> {
        let url = self.url(&format!("api/users/{id}/avatar"))?;
        self.json(self.client.delete(url)).await
    }

    async fn delete_user(&self, id: EntityId) -> Result<User, ApiError> {
        let url = self.url(&format!("api/users/{id}"))?;
        self.json(self.client.delete(url)).await
    }
}

#[async_trait]
impl PostsApi for HttpForumApi {
    async fn post(&self, id: EntityId) -> Result<Post, ApiError> {
        self.json(self.get(&format!("api/posts/{id}"))?).await
    }

    async fn posts(&self, filter: &PostListFilter, page: u32) -> Result<Vec<Post>, ApiError> {
        let mut url = self.url("api/posts")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", &page.to_string())
                .append_pair("sort", filter.sort.as_str());
            if let Some(author) = filter.author.as_deref() {
                query.append_pair("user", author);
            }
            if let Some(tag) = filter.tag.as_deref() {
                query.append_pair("tag", tag);
            }
            if let Some(text) = filter.query.as_deref() {
                query.append_pair("query", text);
            }
        }
        self.json(self.client.get(url)).await
    }

    async fn create_post(&self, form: &PostCreateForm) -> Result<Post, ApiError> {
        let url = self.url("api/posts")?;
        self.json(self.form(
            Method::POST,
            url,
            &[
                ("title", form.title.as_str()),
                ("body", form.body.as_str()),
                ("tags", form.tags.as_str()),
            ],
        ))
        .await
    }

    async fn update_post(&self, id: EntityId, form: &BodyForm) -> Result<Post, ApiError> {
        let url = self.url(&format!("api/posts/{id}"))?;
        self.json(self.form(Method::PATCH, url, &[("body", form.body.as_str())]))
            .await
    }

    async fn delete_post(&self, id: EntityId) -> Result<(), ApiError> {
        let url = self.url(&format!("api/posts/{id}"))?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl CommentsApi for HttpForumApi {
    async fn comment(&self, id: EntityId) -> Result<Comment, ApiError> {
        self.json(self.get(&format!("api/comments/{id}"))?).await
    }

    async fn comments(
        &self,
        filter: &CommentListFilter,
        page: u32,
    ) -> Result<Vec<Comment>, ApiError> {
        let mut url = self.url("api/comments")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", &page.to_string())
                .append_pair("sort", filter.sort.as_str());
            if let Some(post_id) = filter.post_id {
                query.append_pair("post", &post_id.to_string());
            }
            if let Some(author) = filter.author.as_deref() {
                query.append_pair("user", author);
            }
        }
        self.json(self.client.get(url)).await
    }

    async fn create_comment(
        &self,
        post_id: EntityId,
        form: &BodyForm,
    ) -> Result<Comment, ApiError> {
        let mut url = self.url("api/comments")?;
        url.query_pairs_mut()
            .append_pair("post", &post_id.to_string());
        self.json(self.form(Method::POST, url, &[("body", form.body.as_str())]))
            .await
    }

    async fn update_comment(&self, id: EntityId, form: &BodyForm) -> Result<Comment, ApiError> {
        let url = self.url(&format!("api/comments/{id}"))?;
        self.json(self.form(Method::PATCH, url, &[("body", form.body.as_str())]))
            .await
    }

    async fn delete_comment(&self, id: EntityId) -> Result<Comment, ApiError> {
        let url = self.url(&format!("api/comments/{id}"))?;
        self.json(self.client.delete(url)).await
    }
}

#[async_trait]
impl TagsApi for HttpForumApi {
    async fn tag(&self, id: EntityId) -> Result<Tag, ApiError> {
        self.json(self.get(&format!("api/tags/{id}"))?).await
    }

    async fn tags(&self, query: Option<&str>) -> Result<Vec<Tag>, ApiError> {
        let mut url = self.url("api/tags")?;
        if let Some(text) = query {
            url.query_pairs_mut().append_pair("query", text);
        }
        self.json(self.client.get(url)).await
    }

    async fn trending_tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.json(self.get("api/tags/trending")?).await
    }

    async fn update_tag(&self, id: EntityId, form: &TagUpdateForm) -> Result<Tag, ApiError> {
        let url = self.url(&format!("api/tags/{id}"))?;
        self.json(self.form(
            Method::PATCH,
            url,
            &[("color", form.color.as_str()), ("description", form.description.as_str())],
        ))
        .await
    }
}

#[async_trait]
impl ReactionsApi for HttpForumApi {
    async fn reactions(&self, subject: Subject) -> Result<Vec<Reaction>, ApiError> {
        self.json(self.get(&Self::reactions_path(subject))?).await
    }

    async fn user_reaction(
        &self,
        subject: Subject,
        user_id: EntityId,
    ) -> Result<Reaction, ApiError> {
        let path = format!("{}/{user_id}", Self::reactions_path(subject));
        // The server answers `null` when the user has not reacted.
        let reaction: Option<Reaction> = self.json(self.get(&path)?).await?;
        reaction.ok_or(ApiError::NotFound)
    }

    async fn react(&self, subject: Subject, form: &ReactionForm) -> Result<(), ApiError> {
        let url = self.url(&Self::reactions_path(subject))?;
        self.send(self.form(Method::POST, url, &[("reaction", form.reaction.as_str())]))
            .await?;
        Ok(())
    }
}
