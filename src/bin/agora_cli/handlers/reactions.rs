#![deny(clippy::all, clippy::pedantic)]

use agora::domain::reactions::Subject;
use agora_api_types::{Reaction, ReactionName};
use serde::Serialize;

use crate::args::{ReactionsCmd, SubjectArgs};
use crate::client::{CliError, Ctx};
use crate::print::print_json;

#[derive(Serialize)]
struct ReactionSummary {
    subject: Subject,
    counts: Vec<Reaction>,
    score: i64,
    mine: Option<ReactionName>,
}

pub async fn handle(ctx: &Ctx, cmd: ReactionsCmd) -> Result<(), CliError> {
    match cmd {
        ReactionsCmd::Show(subject) => show(ctx, subject_of(subject)?).await,
        ReactionsCmd::Set { subject, reaction } => {
            set(ctx, subject_of(subject)?, Some(reaction)).await
        }
        ReactionsCmd::Clear(subject) => set(ctx, subject_of(subject)?, None).await,
    }
}

fn subject_of(args: SubjectArgs) -> Result<Subject, CliError> {
    args.subject()
        .ok_or_else(|| CliError::InvalidInput("pass exactly one of --post or --comment".into()))
}

async fn show(ctx: &Ctx, subject: Subject) -> Result<(), CliError> {
    let reactions = ctx.client.reactions();
    let counts = reactions.for_subject(subject).await?;
    let mine = reactions.mine(subject).await?;

    print_json(&ReactionSummary {
        subject,
        score: agora::domain::reactions::vote_score(&counts),
        counts,
        mine: mine.map(|reaction| reaction.name),
    })
}

async fn set(
    ctx: &Ctx,
    subject: Subject,
    reaction: Option<ReactionName>,
) -> Result<(), CliError> {
    ctx.client.reactions().set(subject, reaction).await?;
    show(ctx, subject).await
}
