//! agora-cli: command-line client over the cached forum data layer.
//! Each invocation builds a fresh client; `--username` signs in first.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;

use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{comments, posts, reactions, session, tags, users};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = agora::config::load(&cli.config)?;
    agora::infra::telemetry::init(&settings.logging)?;

    let credentials = client::credentials(&cli);
    let ctx = build_ctx_from_cli(&cli, &settings).await?;

    match cli.command {
        Commands::Session(cmd) => session::handle(&ctx, cmd.action, credentials).await?,
        Commands::Posts(cmd) => posts::handle(&ctx, cmd.action).await?,
        Commands::Comments(cmd) => comments::handle(&ctx, cmd.action).await?,
        Commands::Tags(cmd) => tags::handle(&ctx, cmd.action).await?,
        Commands::Reactions(cmd) => reactions::handle(&ctx, cmd.action).await?,
        Commands::Users(cmd) => users::handle(&ctx, cmd.action).await?,
    }

    Ok(())
}
