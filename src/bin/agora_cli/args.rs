//! Command-line surface for `agora-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use agora::config::ConfigArgs;
use agora::domain::reactions::Subject;
use agora_api_types::{CommentSort, EntityId, PostSort, PreferenceKey, ReactionName};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agora-cli", version, about = "Agora forum command-line client", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Sign in as this user before running the command
    #[arg(long, env = "AGORA_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for --username (env only, to keep it out of shell history)
    #[arg(long, hide = true, env = "AGORA_PASSWORD")]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session and preferences
    Session(SessionArgs),
    /// Browse and write posts
    Posts(PostsArgs),
    /// Browse and write comments
    Comments(CommentsArgs),
    /// Tag lookup and admin edits
    Tags(TagsArgs),
    /// Reactions on posts and comments
    Reactions(ReactionsArgs),
    /// User profiles
    Users(UsersArgs),
}

impl Commands {
    /// Registering creates the account every other command signs in with.
    pub fn signs_in_first(&self) -> bool {
        !matches!(
            self,
            Commands::Session(SessionArgs {
                action: SessionCmd::Register
            })
        )
    }
}

#[derive(Parser, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionCmd,
}

#[derive(Subcommand, Debug)]
pub enum SessionCmd {
    /// Show the signed-in session, or null
    Me,
    /// Create an account with --username and AGORA_PASSWORD
    Register,
    /// End the session
    Logout,
    /// Set one preference
    Prefer {
        /// prefersDarkMode | prefersReducedMotion | preferredSort
        key: PreferenceKey,
        value: String,
    },
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// List posts, newest pages first
    List {
        #[arg(long, default_value_t = PostSort::Latest)]
        sort: PostSort,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        query: Option<String>,
        /// Number of pages to load; stops early at the end of the list
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search posts by free text
    Search {
        query: String,
        #[arg(long, default_value_t = PostSort::Latest)]
        sort: PostSort,
    },
    /// Get a post by id
    Get { id: EntityId },
    /// Create a post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
        /// Tag name; repeat for several (only the first 3 are kept)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Replace the body of a post
    Update {
        id: EntityId,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
    /// Delete a post
    Delete { id: EntityId },
}

#[derive(Parser, Debug)]
pub struct CommentsArgs {
    #[command(subcommand)]
    pub action: CommentsCmd,
}

#[derive(Subcommand, Debug)]
pub enum CommentsCmd {
    /// List comments on a post or by an author
    List {
        #[arg(long)]
        post: Option<EntityId>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long, default_value_t = CommentSort::Latest)]
        sort: CommentSort,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Get a comment by id
    Get { id: EntityId },
    /// Comment on a post
    Create {
        #[arg(long)]
        post: EntityId,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
    /// Replace the body of a comment
    Update {
        id: EntityId,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
    /// Delete a comment
    Delete { id: EntityId },
}

#[derive(Parser, Debug)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub action: TagsCmd,
}

#[derive(Subcommand, Debug)]
pub enum TagsCmd {
    /// Tags whose name contains the query
    Search { query: Option<String> },
    /// Trending tags
    Trending,
    /// Get a tag by id
    Get { id: EntityId },
    /// Change color and description (admin)
    Update {
        id: EntityId,
        #[arg(long)]
        color: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Parser, Debug)]
pub struct ReactionsArgs {
    #[command(subcommand)]
    pub action: ReactionsCmd,
}

#[derive(Subcommand, Debug)]
pub enum ReactionsCmd {
    /// Counts, vote score and your own reaction
    Show(SubjectArgs),
    /// React to a post or comment
    Set {
        #[command(flatten)]
        subject: SubjectArgs,
        #[arg(long)]
        reaction: ReactionName,
    },
    /// Remove your reaction
    Clear(SubjectArgs),
}

#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct SubjectArgs {
    #[arg(long)]
    pub post: Option<EntityId>,
    #[arg(long)]
    pub comment: Option<EntityId>,
}

impl SubjectArgs {
    pub fn subject(self) -> Option<Subject> {
        match (self.post, self.comment) {
            (Some(id), None) => Some(Subject::Post(id)),
            (None, Some(id)) => Some(Subject::Comment(id)),
            _ => None,
        }
    }
}

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersCmd,
}

#[derive(Subcommand, Debug)]
pub enum UsersCmd {
    /// Get a user by id
    Get { id: EntityId },
    /// Change bio and/or password (password from AGORA_NEW_PASSWORD)
    Update {
        id: EntityId,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long, hide = true, env = "AGORA_NEW_PASSWORD")]
        new_password: Option<String>,
    },
    /// Upload a new avatar image
    Avatar {
        id: EntityId,
        #[arg(long)]
        file: PathBuf,
    },
    /// Remove the avatar
    RemoveAvatar { id: EntityId },
    /// Delete the account
    Delete { id: EntityId },
}
