#![deny(clippy::all, clippy::pedantic)]

use agora_api_types::EntityId;

use crate::args::TagsCmd;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: TagsCmd) -> Result<(), CliError> {
    match cmd {
        TagsCmd::Search { query } => search(ctx, query.as_deref()).await,
        TagsCmd::Trending => trending(ctx).await,
        TagsCmd::Get { id } => get(ctx, id).await,
        TagsCmd::Update {
            id,
            color,
            description,
        } => update(ctx, id, &color, &description).await,
    }
}

async fn search(ctx: &Ctx, query: Option<&str>) -> Result<(), CliError> {
    let tags = ctx.client.tags().search(query).await?;
    print_json(&tags)
}

async fn trending(ctx: &Ctx) -> Result<(), CliError> {
    let tags = ctx.client.tags().trending().await?;
    print_json(&tags)
}

async fn get(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    let tag = ctx.client.tags().fetch_one(id).await?;
    print_json(&tag)
}

async fn update(ctx: &Ctx, id: EntityId, color: &str, description: &str) -> Result<(), CliError> {
    let tag = ctx.client.tags().update(id, color, description).await?;
    print_json(&tag)
}
