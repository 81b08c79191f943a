mod article;
mod collect;
mod commands;
mod config;
mod error;
mod interview;
mod llm;
mod pipeline;
mod session;
mod state;
mod summarize;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tracing::{error, info, Level};

use collect::WebEvidenceCollector;
use config::PipelineConfig;
use llm::LlmClient;
use pipeline::scheduler::PipelineScheduler;
use pipeline::{Orchestrator, OrchestratorSettings};
use session::SessionStore;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let token = dotenv::var("DISCORD_TOKEN").context("DISCORD_TOKEN required")?;
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    let config = PipelineConfig::from_env()?;
    info!(
        search_results = config.search.num_results,
        model = %config.llm.model,
        embedding_model = %config.llm.embedding_model,
        chunk_size = config.chunking.chunk_size,
        chunk_overlap = config.chunking.chunk_overlap,
        "Pipeline configuration loaded"
    );

    let collector = Arc::new(WebEvidenceCollector::new(config.search.clone())?);
    let llm_client = Arc::new(LlmClient::new(config.llm.clone())?);
    info!("LLM client initialized");

    let orchestrator = Arc::new(Orchestrator::new(
        collector,
        llm_client,
        OrchestratorSettings {
            chunking: config.chunking,
            max_concurrent_summaries: config.max_concurrent_summaries,
            retrieval_k: config.retrieval_k,
        },
    ));

    // One scheduler for the life of the process, on the bot's runtime
    let scheduler = Arc::new(PipelineScheduler::on_current_runtime(orchestrator));

    let app_state = AppState {
        scheduler,
        sessions: Arc::new(SessionStore::new()),
    };

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::quill()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, gid)
                        .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting Quill Discord bot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
