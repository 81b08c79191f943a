use thiserror::Error;

/// Failures surfaced by the research pipeline.
///
/// Stages never catch these: whatever a collaborator returns is handed
/// straight back to whoever submitted the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("topic must not be empty")]
    EmptyTopic,

    /// Search or page fetch failed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// LLM call failed (transport, HTTP status, rate limit, timeout, empty reply).
    #[error("generation failed: {0}")]
    Generation(String),

    /// Model output could not be coerced into the expected schema.
    #[error("could not parse model output: {0}")]
    Parse(String),

    /// The run's task panicked or was aborted before producing a result.
    #[error("pipeline run failed: {0}")]
    Scheduler(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Short label used in logs and in the session's error field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::EmptyTopic => "invalid_input",
            PipelineError::Retrieval(_) => "retrieval",
            PipelineError::Generation(_) => "generation",
            PipelineError::Parse(_) => "parse",
            PipelineError::Scheduler(_) => "scheduler",
        }
    }
}
