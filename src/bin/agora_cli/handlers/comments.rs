#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use agora::cache::CommentListFilter;
use agora_api_types::EntityId;

use crate::args::CommentsCmd;
use crate::client::{CliError, Ctx};
use crate::io::read_value;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: CommentsCmd) -> Result<(), CliError> {
    match cmd {
        CommentsCmd::List {
            post,
            author,
            sort,
            pages,
        } => {
            let filter = CommentListFilter {
                sort,
                post_id: post,
                author,
            }
            .normalized();
            list(ctx, filter, pages).await
        }
        CommentsCmd::Get { id } => get(ctx, id).await,
        CommentsCmd::Create {
            post,
            body,
            body_file,
        } => {
            let body = read_value(body, body_file)?;
            create(ctx, post, &body).await
        }
        CommentsCmd::Update {
            id,
            body,
            body_file,
        } => update(ctx, id, body, body_file).await,
        CommentsCmd::Delete { id } => delete(ctx, id).await,
    }
}

async fn list(ctx: &Ctx, filter: CommentListFilter, pages: u32) -> Result<(), CliError> {
    if !filter.is_addressable() {
        return Err(CliError::InvalidInput(
            "comments list needs --post or --author".into(),
        ));
    }

    let mut thread = ctx.client.comments().thread(filter);
    for _ in 0..pages {
        thread.load_next().await?;
        if thread.is_exhausted() {
            break;
        }
    }
    let comments: Vec<_> = thread.items().collect();
    print_json(&comments)
}

async fn get(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    let comment = ctx.client.comments().fetch_one(id).await?;
    print_json(&comment)
}

async fn create(ctx: &Ctx, post_id: EntityId, body: &str) -> Result<(), CliError> {
    let created = ctx.client.comments().create(post_id, body).await?;
    print_json(&created)
}

async fn update(
    ctx: &Ctx,
    id: EntityId,
    body: Option<String>,
    body_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let body = read_value(body, body_file)?;
    let updated = ctx.client.comments().update(id, &body).await?;
    print_json(&updated)
}

async fn delete(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    ctx.client.comments().delete(id).await?;
    println!("deleted");
    Ok(())
}
