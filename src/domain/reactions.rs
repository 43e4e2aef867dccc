use std::fmt;

use agora_api_types::{EntityId, Reaction, ReactionName};
use serde::Serialize;

/// Something reactions attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Post(EntityId),
    Comment(EntityId),
}

impl Subject {
    pub fn id(self) -> EntityId {
        match self {
            Subject::Post(id) | Subject::Comment(id) => id,
        }
    }

    /// Path segment used by the reactions endpoints.
    pub fn segment(self) -> &'static str {
        match self {
            Subject::Post(_) => "post",
            Subject::Comment(_) => "comment",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.segment(), self.id())
    }
}

/// Net comment score derived from the aggregate counts.
pub fn vote_score(reactions: &[Reaction]) -> i64 {
    let count = |name: ReactionName| {
        reactions
            .iter()
            .filter(|reaction| reaction.name == name)
            .map(|reaction| i64::from(reaction.count))
            .sum::<i64>()
    };

    count(ReactionName::Upvote) - count(ReactionName::Downvote)
}
