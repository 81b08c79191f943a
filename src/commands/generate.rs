use tracing::{info, warn};

use super::{channel_key, send_chunked};
use crate::state::Context;

/// Write an article from the current session's research
#[poise::command(slash_command, guild_only)]
pub async fn generate(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let channel = channel_key(&ctx);
    let sessions = &ctx.data().sessions;
    let (ticket, request) = sessions.update(channel, |s| s.begin_generate()).await;

    info!(
        user = %ctx.author().name,
        channel,
        topic = %request.topic,
        documents = request.documents.len(),
        summaries = request.summaries.len(),
        "generate started"
    );

    let handle = ctx.data().scheduler.submit_generate(request);
    let run_id = handle.run_id();
    info!(
        run_id,
        kind = %handle.kind(),
        active = ctx.data().scheduler.active_runs(),
        "run submitted"
    );

    match handle.join().await {
        Ok(output) => {
            let content = output.content.clone();
            let applied = sessions
                .update(channel, |s| s.finish_generate(ticket, output))
                .await;
            if !applied {
                info!(run_id, channel, "session moved on, generate result discarded");
                ctx.say("The session was cleared or a newer article was requested; this one was discarded.")
                    .await?;
                return Ok(());
            }

            info!(run_id, len = content.len(), "generate delivered");
            send_chunked(&ctx, &content).await?;
        }
        Err(e) => {
            warn!(run_id, channel, kind = e.kind(), error = %e, "generate failed");
            sessions.update(channel, |s| s.fail(ticket, &e)).await;
            ctx.say(format!("Generate failed ({}): {}", e.kind(), e))
                .await?;
        }
    }

    Ok(())
}
