use std::sync::Arc;

use crate::pipeline::scheduler::PipelineScheduler;
use crate::session::SessionStore;

pub struct AppState {
    pub scheduler: Arc<PipelineScheduler>,
    pub sessions: Arc<SessionStore>,
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
