#![deny(clippy::all, clippy::pedantic)]

use agora::ForumClient;
use agora::application::error::ClientError;
use agora::config::{LoadError, Settings};
use agora::infra::error::InfraError;
use agora_api_types::Credentials;
use thiserror::Error;
use tracing::info;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("password is required (set AGORA_PASSWORD)")]
    MissingPassword,
    #[error("username is required (use --username or AGORA_USERNAME)")]
    MissingUsername,
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub struct Ctx {
    pub client: ForumClient,
}

impl Ctx {
    pub fn new(settings: &Settings) -> Result<Self, CliError> {
        Ok(Self {
            client: ForumClient::new(settings)?,
        })
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<(), CliError> {
        let me = self
            .client
            .identity()
            .login(&Credentials {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        info!(user_id = me.id, "Signed in for this invocation");
        Ok(())
    }
}

pub fn credentials(cli: &Cli) -> Result<Credentials, CliError> {
    let username = cli.username.clone().ok_or(CliError::MissingUsername)?;
    let password = cli.password.clone().ok_or(CliError::MissingPassword)?;
    Ok(Credentials { username, password })
}

/// Builds the client and, when a username is given, signs in first.
pub async fn build_ctx_from_cli(cli: &Cli, settings: &Settings) -> Result<Ctx, CliError> {
    let ctx = Ctx::new(settings)?;
    if cli.username.is_some() && cli.command.signs_in_first() {
        let credentials = credentials(cli)?;
        ctx.sign_in(&credentials.username, &credentials.password)
            .await?;
    }
    Ok(ctx)
}
