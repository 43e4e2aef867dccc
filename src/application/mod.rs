//! Repositories and list machinery over the shared cache.

pub mod client;
pub mod comments;
pub mod error;
pub mod identity;
pub mod pagination;
pub mod posts;
pub mod reactions;
pub mod repos;
pub mod search;
pub mod tags;
pub mod users;
pub mod virtualizer;

#[cfg(test)]
pub(crate) mod testing;
