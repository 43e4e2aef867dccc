#![deny(clippy::all, clippy::pedantic)]

use std::path::Path;

use agora::application::users::UserUpdate;
use agora_api_types::EntityId;

use crate::args::UsersCmd;
use crate::client::{CliError, Ctx};
use crate::io::read_avatar;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: UsersCmd) -> Result<(), CliError> {
    match cmd {
        UsersCmd::Get { id } => get(ctx, id).await,
        UsersCmd::Update {
            id,
            bio,
            new_password,
        } => {
            let update = UserUpdate {
                bio,
                password: new_password,
            };
            update_profile(ctx, id, update).await
        }
        UsersCmd::Avatar { id, file } => avatar(ctx, id, &file).await,
        UsersCmd::RemoveAvatar { id } => remove_avatar(ctx, id).await,
        UsersCmd::Delete { id } => delete(ctx, id).await,
    }
}

async fn get(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    let user = ctx.client.users().fetch_one(id).await?;
    print_json(&user)
}

async fn update_profile(ctx: &Ctx, id: EntityId, update: UserUpdate) -> Result<(), CliError> {
    let user = ctx.client.users().update(id, update).await?;
    print_json(&user)
}

async fn avatar(ctx: &Ctx, id: EntityId, file: &Path) -> Result<(), CliError> {
    let upload = read_avatar(file)?;
    let user = ctx.client.users().update_avatar(id, upload).await?;
    print_json(&user)
}

async fn remove_avatar(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    let user = ctx.client.users().delete_avatar(id).await?;
    print_json(&user)
}

async fn delete(ctx: &Ctx, id: EntityId) -> Result<(), CliError> {
    ctx.client.users().delete(id).await?;
    println!("deleted");
    Ok(())
}
