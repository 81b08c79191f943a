use tracing::{info, warn};

use super::{channel_key, render, send_chunked};
use crate::state::Context;

/// Search the web for a topic, summarize the sources and draft interview questions
#[poise::command(slash_command, guild_only)]
pub async fn summarize(
    ctx: Context<'_>,
    #[description = "Topic to research"] topic: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let channel = channel_key(&ctx);
    let sessions = &ctx.data().sessions;
    let ticket = sessions
        .update(channel, |s| s.begin_summarize(&topic))
        .await;

    info!(user = %ctx.author().name, channel, topic, "summarize started");

    let handle = ctx.data().scheduler.submit_summarize(topic.clone());
    let run_id = handle.run_id();
    info!(
        run_id,
        kind = %handle.kind(),
        active = ctx.data().scheduler.active_runs(),
        "run submitted"
    );

    match handle.join().await {
        Ok(output) => {
            let summaries = render::summaries(&output.summaries);
            let documents = render::documents(&output.documents);
            let questions = output.interview_questions.clone();
            let doc_count = output.documents.len();

            let applied = sessions
                .update(channel, |s| s.finish_summarize(ticket, output))
                .await;
            if !applied {
                info!(run_id, channel, "session moved on, summarize result discarded");
                ctx.say("The session was cleared or restarted while researching; results discarded.")
                    .await?;
                return Ok(());
            }

            info!(run_id, doc_count, "summarize delivered");
            send_chunked(
                &ctx,
                &format!("**Summaries for '{}'** ({} sources)\n\n{}", topic.trim(), doc_count, summaries),
            )
            .await?;
            send_chunked(&ctx, &format!("**Interview questions**\n\n{}", questions)).await?;
            send_chunked(&ctx, &format!("**Text documents**\n\n{}", documents)).await?;
            ctx.say("Answer the questions with `/quill answer`, then run `/quill generate` to draft the article.")
                .await?;
        }
        Err(e) => {
            warn!(run_id, channel, kind = e.kind(), error = %e, "summarize failed");
            sessions.update(channel, |s| s.fail(ticket, &e)).await;
            ctx.say(format!("Summarize failed ({}): {}", e.kind(), e))
                .await?;
        }
    }

    Ok(())
}
