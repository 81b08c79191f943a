mod generate;
mod render;
mod session;
mod summarize;

use crate::state::Context;

/// Quill - research a topic and draft an article about it
#[poise::command(
    slash_command,
    subcommands(
        "summarize::summarize",
        "generate::generate",
        "session::answer",
        "session::show",
        "session::clear"
    )
)]
pub async fn quill(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Sessions are scoped per channel.
fn channel_key(ctx: &Context<'_>) -> u64 {
    ctx.channel_id().get()
}

/// Send a message in Discord-safe chunks (max 1990 chars).
/// Uses ctx.say() for all chunks so follow-ups go through the interaction
/// webhook and need no Send Messages permission.
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in render::split_message(text, 1990) {
        ctx.say(chunk).await?;
    }
    Ok(())
}
