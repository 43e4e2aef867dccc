//! HTTP transport for the forum API.

mod client;

pub use client::{HttpForumApi, user_agent};
