//! Client data layer for the Agora discussion forum.
//!
//! Entity snapshots live in one explicit cache owned by [`ForumClient`].
//! Repositories read through it, and every successful mutation publishes an
//! event that seeds or invalidates the affected keys. Paginated lists and the
//! virtualizer sit on top of the repositories.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::client::ForumClient;
