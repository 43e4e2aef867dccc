#![deny(clippy::all, clippy::pedantic)]

use agora_api_types::{Credentials, PreferenceKey};

use crate::args::SessionCmd;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(
    ctx: &Ctx,
    cmd: SessionCmd,
    credentials: Result<Credentials, CliError>,
) -> Result<(), CliError> {
    match cmd {
        SessionCmd::Me => me(ctx).await,
        SessionCmd::Register => register(ctx, &credentials?).await,
        SessionCmd::Logout => logout(ctx).await,
        SessionCmd::Prefer { key, value } => prefer(ctx, key, &value).await,
    }
}

async fn me(ctx: &Ctx) -> Result<(), CliError> {
    let me = ctx.client.identity().me().await?;
    print_json(&me)
}

async fn register(ctx: &Ctx, credentials: &Credentials) -> Result<(), CliError> {
    let me = ctx.client.identity().register(credentials).await?;
    print_json(&me)
}

async fn logout(ctx: &Ctx) -> Result<(), CliError> {
    ctx.client.identity().logout().await?;
    println!("signed out");
    Ok(())
}

async fn prefer(ctx: &Ctx, key: PreferenceKey, value: &str) -> Result<(), CliError> {
    let identity = ctx.client.identity();
    identity.update_preference(key, value).await?;
    print_json(&identity.prefs().await?)
}
