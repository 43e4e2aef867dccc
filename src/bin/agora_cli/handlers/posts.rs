#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use agora::application::posts::NewPost;
use agora::cache::PostListFilter;
use agora_api_types::{EntityId, PostSort};

use crate::args::PostsCmd;
use crate::client::{CliError, Ctx};
use crate::io::read_value;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List {
            sort,
            author,
            tag,
            query,
            pages,
        } => {
            let filter = PostListFilter {
                sort,
                author,
                tag,
                query,
            }
            .normalized();
            list(ctx, filter, pages).await
        }
        PostsCmd::Search { query, sort } => search(ctx, &query, sort).await,
        PostsCmd::Get { id } => get(ctx, id).await,
        PostsCmd::Create {
            title,
            body,
            body_file,
            tags,
        } => create(ctx, title, body, body_file, tags).await,
        PostsCmd::Update {
            id,
            body,
            body_file,
        } => update(ctx, id, body, body_file).await,
        PostsCmd::Delete { id } => delete(ctx, id).await,
    }
}

async fn list(ctx: &Ctx, filter: PostListFilter, pages: u32) -> Result<(), CliError> {
    let mut feed = ctx.client.posts().feed(filter);
    for _ in 0..pages {
        feed.load_next().await?;
        if feed.is_exhausted() {
            break;
        }
    }
    let posts: Vec<_> = feed.items().collect();
    print_json(&posts)
}

async fn search(ctx: &Ctx, query: &str, sort: PostSort) -> Result<(), CliError> {
    let search = ctx.client.post_search(sort);
    let posts = search
        .input(query)
        .await
        .ok_or_else(|| CliError::InvalidInput("search was superseded".into()))??;
    print_json(&posts)
}

async fn get(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    let post = ctx.client.posts().fetch_one(id).await?;
    print_json(&post)
}

async fn create(
    ctx: &Ctx,
    title: String,
    body: Option<String>,
    body_file: Option<PathBuf>,
    tags: Vec<String>,
) -> Result<(), CliError> {
    let post = NewPost {
        title,
        body: read_value(body, body_file)?,
        tags,
    };
    let created = ctx.client.posts().create(post).await?;
    print_json(&created)
}

async fn update(
    ctx: &Ctx,
    id: EntityId,
    body: Option<String>,
    body_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let body = read_value(body, body_file)?;
    let updated = ctx.client.posts().update(id, &body).await?;
    print_json(&updated)
}

async fn delete(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    ctx.client.posts().delete(id).await?;
    println!("deleted");
    Ok(())
}
