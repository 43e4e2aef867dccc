//! Snapshot payloads held by the query store.

use agora_api_types::{Me, Reaction, Tag};

use crate::domain::entities::{Comment, Post, User};

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// `None` records a confirmed "no session".
    Session(Option<Me>),
    User(User),
    Post(Post),
    Posts(Vec<Post>),
    Comment(Comment),
    Comments(Vec<Comment>),
    Tag(Tag),
    Tags(Vec<Tag>),
    Reactions(Vec<Reaction>),
    UserReaction(Option<Reaction>),
}

/// Conversion between a typed snapshot and its store representation.
pub trait Cacheable: Clone + Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty => $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: &CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Option<Me> => Session);
cacheable!(User => User);
cacheable!(Post => Post);
cacheable!(Vec<Post> => Posts);
cacheable!(Comment => Comment);
cacheable!(Vec<Comment> => Comments);
cacheable!(Tag => Tag);
cacheable!(Vec<Tag> => Tags);
cacheable!(Vec<Reaction> => Reactions);
cacheable!(Option<Reaction> => UserReaction);
