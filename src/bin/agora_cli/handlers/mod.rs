#![deny(clippy::all, clippy::pedantic)]

pub mod comments;
pub mod posts;
pub mod reactions;
pub mod session;
pub mod tags;
pub mod users;
