//! Cache key definitions.
//!
//! `QueryKey` addresses one cached snapshot; `KeyPrefix` selects the group of
//! keys a mutation has to invalidate.

use agora_api_types::{CommentSort, EntityId, PostSort};

use crate::domain::reactions::Subject;

/// Filters accepted by the post listing. Empty strings never reach a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PostListFilter {
    pub sort: PostSort,
    pub author: Option<String>,
    pub tag: Option<String>,
    pub query: Option<String>,
}

impl PostListFilter {
    pub fn new(sort: PostSort) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = normalize(Some(author.into()));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = normalize(Some(tag.into()));
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = normalize(Some(query.into()));
        self
    }

    /// Re-applies normalization to a filter assembled field by field.
    pub fn normalized(self) -> Self {
        Self {
            sort: self.sort,
            author: normalize(self.author),
            tag: normalize(self.tag),
            query: normalize(self.query),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommentListFilter {
    pub sort: CommentSort,
    pub post_id: Option<EntityId>,
    pub author: Option<String>,
}

impl CommentListFilter {
    pub fn for_post(post_id: EntityId, sort: CommentSort) -> Self {
        Self {
            sort,
            post_id: Some(post_id),
            author: None,
        }
    }

    pub fn by_author(author: impl Into<String>, sort: CommentSort) -> Self {
        Self {
            sort,
            post_id: None,
            author: normalize(Some(author.into())),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            sort: self.sort,
            post_id: self.post_id.filter(|id| *id != 0),
            author: normalize(self.author),
        }
    }

    /// A listing needs a post or an author to be fetched at all.
    pub fn is_addressable(&self) -> bool {
        self.post_id.is_some() || self.author.is_some()
    }
}

/// Identifies one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Session,
    User(EntityId),
    Post(EntityId),
    PostPage { filter: PostListFilter, page: u32 },
    Comment(EntityId),
    CommentPage { filter: CommentListFilter, page: u32 },
    Tag(EntityId),
    TagSearch { query: Option<String> },
    TrendingTags,
    Reactions(Subject),
    UserReaction { subject: Subject, user_id: EntityId },
}

impl QueryKey {
    pub fn tag_search(query: Option<String>) -> Self {
        QueryKey::TagSearch {
            query: normalize(query),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryKey::Session => "session",
            QueryKey::User(_) => "user",
            QueryKey::Post(_) => "post",
            QueryKey::PostPage { .. } => "post_page",
            QueryKey::Comment(_) => "comment",
            QueryKey::CommentPage { .. } => "comment_page",
            QueryKey::Tag(_) => "tag",
            QueryKey::TagSearch { .. } => "tag_search",
            QueryKey::TrendingTags => "trending_tags",
            QueryKey::Reactions(_) => "reactions",
            QueryKey::UserReaction { .. } => "user_reaction",
        }
    }
}

/// Identifies the entity a mutation event is about.
///
/// Events for the same entity are merged so only the latest one applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Session,
    User(EntityId),
    Post(EntityId),
    Comment(EntityId),
    Tag(EntityId),
    Reactions(Subject),
}

/// Selects the keys touched by an invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPrefix {
    Exact(QueryKey),
    /// Every post page, whatever the filter or sort.
    PostLists,
    CommentListsForPost(EntityId),
    CommentListsByAuthor(String),
    /// Aggregate counts for the subject and every per-user reaction on it.
    Reactions(Subject),
}

impl KeyPrefix {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match (self, key) {
            (KeyPrefix::Exact(expected), key) => expected == key,
            (KeyPrefix::PostLists, QueryKey::PostPage { .. }) => true,
            (KeyPrefix::CommentListsForPost(post_id), QueryKey::CommentPage { filter, .. }) => {
                filter.post_id == Some(*post_id)
            }
            (KeyPrefix::CommentListsByAuthor(author), QueryKey::CommentPage { filter, .. }) => {
                filter.author.as_deref() == Some(author.as_str())
            }
            (KeyPrefix::Reactions(subject), QueryKey::Reactions(other)) => subject == other,
            (KeyPrefix::Reactions(subject), QueryKey::UserReaction { subject: other, .. }) => {
                subject == other
            }
            _ => false,
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_filters_resolve_to_same_key() {
        let a = QueryKey::PostPage {
            filter: PostListFilter::new(PostSort::Latest).tag("rust"),
            page: 1,
        };
        let b = QueryKey::PostPage {
            filter: PostListFilter::new(PostSort::Latest).tag("  rust "),
            page: 1,
        };
        assert_eq!(a, b);
    }

    #[test]
    fn empty_filter_strings_are_absent() {
        let filter = PostListFilter {
            sort: PostSort::Popular,
            author: Some(String::new()),
            tag: Some("   ".to_string()),
            query: Some("q".to_string()),
        }
        .normalized();
        assert_eq!(filter.author, None);
        assert_eq!(filter.tag, None);
        assert_eq!(filter.query.as_deref(), Some("q"));
        assert_eq!(QueryKey::tag_search(Some(String::new())), QueryKey::tag_search(None));
    }

    #[test]
    fn changing_any_filter_addresses_a_disjoint_key() {
        let base = PostListFilter::new(PostSort::Latest);
        let variants = [
            PostListFilter::new(PostSort::Popular),
            base.clone().author("alice"),
            base.clone().tag("go"),
            base.clone().query("cache"),
        ];
        for variant in variants {
            assert_ne!(base, variant);
        }
    }

    #[test]
    fn post_list_prefix_matches_every_page() {
        let key = QueryKey::PostPage {
            filter: PostListFilter::new(PostSort::Replies).author("bob"),
            page: 4,
        };
        assert!(KeyPrefix::PostLists.matches(&key));
        assert!(!KeyPrefix::PostLists.matches(&QueryKey::Post(1)));
    }

    #[test]
    fn comment_prefixes_match_by_parent_and_author() {
        let for_post = QueryKey::CommentPage {
            filter: CommentListFilter::for_post(7, CommentSort::Top),
            page: 2,
        };
        let by_author = QueryKey::CommentPage {
            filter: CommentListFilter::by_author("carol", CommentSort::Latest),
            page: 1,
        };

        assert!(KeyPrefix::CommentListsForPost(7).matches(&for_post));
        assert!(!KeyPrefix::CommentListsForPost(8).matches(&for_post));
        assert!(KeyPrefix::CommentListsByAuthor("carol".into()).matches(&by_author));
        assert!(!KeyPrefix::CommentListsByAuthor("carol".into()).matches(&for_post));
    }

    #[test]
    fn reaction_prefix_covers_per_user_reaction() {
        let subject = Subject::Post(3);
        let prefix = KeyPrefix::Reactions(subject);
        assert!(prefix.matches(&QueryKey::Reactions(subject)));
        assert!(prefix.matches(&QueryKey::UserReaction {
            subject,
            user_id: 42
        }));
        assert!(!prefix.matches(&QueryKey::Reactions(Subject::Comment(3))));
    }

    #[test]
    fn comment_filter_requires_post_or_author() {
        assert!(!CommentListFilter::default().is_addressable());
        assert!(CommentListFilter::for_post(1, CommentSort::Latest).is_addressable());
        assert!(!CommentListFilter::by_author(" ", CommentSort::Latest).is_addressable());
    }
}
