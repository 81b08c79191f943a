use tracing::info;

use super::{channel_key, render, send_chunked};
use crate::state::Context;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum Field {
    Overview,
    Topic,
    Summaries,
    Questions,
    Answers,
    Documents,
    Content,
}

/// Record your answers to the interview questions
#[poise::command(slash_command, guild_only)]
pub async fn answer(
    ctx: Context<'_>,
    #[description = "Your answers"] text: String,
) -> Result<(), anyhow::Error> {
    let channel = channel_key(&ctx);
    ctx.data()
        .sessions
        .update(channel, |s| s.interview_answers = text)
        .await;
    ctx.say("Answers saved.").await?;
    Ok(())
}

/// Show a field of the current session
#[poise::command(slash_command, guild_only)]
pub async fn show(
    ctx: Context<'_>,
    #[description = "Field to show (default: overview)"] field: Option<Field>,
) -> Result<(), anyhow::Error> {
    let session = ctx.data().sessions.snapshot(channel_key(&ctx)).await;

    let text = match field.unwrap_or(Field::Overview) {
        Field::Overview => render::overview(&session),
        Field::Topic => session.topic.clone(),
        Field::Summaries => render::summaries(&session.summaries),
        Field::Questions => session.interview_questions.clone(),
        Field::Answers => session.interview_answers.clone(),
        Field::Documents => render::documents(&session.documents),
        Field::Content => session.generated_content.clone(),
    };

    if text.trim().is_empty() {
        ctx.say("_(empty)_").await?;
        return Ok(());
    }
    send_chunked(&ctx, &text).await
}

/// Clear every field of this channel's session
#[poise::command(slash_command, guild_only)]
pub async fn clear(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let channel = channel_key(&ctx);
    ctx.data().sessions.clear(channel).await;
    info!(user = %ctx.author().name, channel, "session cleared");
    ctx.say("Session cleared.").await?;
    Ok(())
}
