use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

use super::{GenerateRequest, Orchestrator, SummarizeOutput};
use crate::article::GenerateOutput;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Summarize,
    Generate,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Summarize => f.write_str("summarize"),
            RunKind::Generate => f.write_str("generate"),
        }
    }
}

/// Accepts pipeline runs and executes each as its own task on a
/// long-lived runtime.
pub struct PipelineScheduler {
    orchestrator: Arc<Orchestrator>,
    handle: Handle,
    active: Arc<AtomicUsize>,
    next_run_id: AtomicU64,
}

impl PipelineScheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, handle: Handle) -> Self {
        Self {
            orchestrator,
            handle,
            active: Arc::new(AtomicUsize::new(0)),
            next_run_id: AtomicU64::new(1),
        }
    }

    /// Scheduler bound to the runtime of the calling task.
    pub fn on_current_runtime(orchestrator: Arc<Orchestrator>) -> Self {
        Self::new(orchestrator, Handle::current())
    }

    /// Runs that have been submitted and not yet torn down.
    pub fn active_runs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn submit_summarize(&self, topic: impl Into<String>) -> PipelineHandle<SummarizeOutput> {
        let topic = topic.into();
        let orchestrator = self.orchestrator.clone();
        self.submit(RunKind::Summarize, async move {
            orchestrator.summarize(&topic).await
        })
    }

    pub fn submit_generate(&self, request: GenerateRequest) -> PipelineHandle<GenerateOutput> {
        let orchestrator = self.orchestrator.clone();
        self.submit(RunKind::Generate, async move {
            orchestrator.generate(request).await
        })
    }

    fn submit<F, T>(&self, kind: RunKind, run: F) -> PipelineHandle<T>
    where
        F: Future<Output = PipelineResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let run_id = self.next_run_id.fetch_add(1, Ordering::SeqCst);
        let guard = RunGuard::enter(self.active.clone(), run_id, kind);
        let span = info_span!("pipeline_run", run_id, kind = %kind);

        let join = self.handle.spawn(
            async move {
                // Dropped when the task finishes, fails, panics or is aborted
                let _guard = guard;
                run.await
            }
            .instrument(span),
        );

        PipelineHandle { run_id, kind, join }
    }
}

/// Counts a run as active for as long as it is alive.
struct RunGuard {
    active: Arc<AtomicUsize>,
    run_id: u64,
    kind: RunKind,
}

impl RunGuard {
    fn enter(active: Arc<AtomicUsize>, run_id: u64, kind: RunKind) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(run_id, kind = %kind, active = now, "run started");
        Self {
            active,
            run_id,
            kind,
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let now = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(run_id = self.run_id, kind = %self.kind, active = now, "run torn down");
    }
}

/// Handle to a submitted run.
pub struct PipelineHandle<T> {
    run_id: u64,
    kind: RunKind,
    join: JoinHandle<PipelineResult<T>>,
}

impl<T> PipelineHandle<T> {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn kind(&self) -> RunKind {
        self.kind
    }

    pub async fn join(self) -> PipelineResult<T> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(PipelineError::Scheduler(format!(
                "{} run {} panicked",
                self.kind, self.run_id
            ))),
            Err(e) => Err(PipelineError::Scheduler(format!(
                "{} run {} did not complete: {}",
                self.kind, self.run_id, e
            ))),
        }
    }

    /// Block the calling thread until the run finishes. For synchronous
    /// callers only; never call this from inside the runtime.
    #[allow(dead_code)]
    pub fn wait(self) -> PipelineResult<T> {
        futures::executor::block_on(self.join())
    }
}
