use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::article::{GenerateOutput, GeneratedImage};
use crate::collect::types::Document;
use crate::error::PipelineError;
use crate::pipeline::{GenerateRequest, SummarizeOutput};
use crate::summarize::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Summarizing,
    Summarized,
    Generating,
    Generated,
}

/// What a user sees for one channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub topic: String,
    pub summaries: Vec<Summary>,
    pub documents: Vec<Document>,
    pub interview_questions: String,
    pub interview_answers: String,
    pub generated_content: String,
    pub generated_image: Option<GeneratedImage>,
    pub generated_prompt: Option<String>,
    pub last_error: Option<String>,
    pub stage: Stage,
    /// Bumped by every clear and every new summarize; results from an
    /// older epoch are dropped.
    epoch: u64,
    /// Stage the session rests in once nothing is running.
    settled: Stage,
    summarizing: bool,
    /// Sequence of the latest generate; only that one may write back.
    latest_generate: Option<u64>,
    next_generate: u64,
}

/// Proof that an action was started, used to write its result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    generate: Option<u64>,
}

impl Session {
    /// Reset every field to its empty default.
    pub fn clear(&mut self) {
        let epoch = self.epoch + 1;
        *self = Session {
            epoch,
            ..Session::default()
        };
    }

    /// Start a new research run. Everything from the previous topic is
    /// discarded.
    pub fn begin_summarize(&mut self, topic: &str) -> Ticket {
        self.clear();
        self.topic = topic.trim().to_string();
        self.summarizing = true;
        self.settle();
        Ticket {
            epoch: self.epoch,
            generate: None,
        }
    }

    /// Returns false if the session moved on since the ticket was issued.
    pub fn finish_summarize(&mut self, ticket: Ticket, output: SummarizeOutput) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.documents = output.documents;
        self.summaries = output.summaries;
        self.interview_questions = output.interview_questions;
        self.last_error = None;
        self.summarizing = false;
        self.settled = Stage::Summarized;
        self.settle();
        true
    }

    /// Snapshot the fields generate reads. There is no stage check: an idle
    /// session generates from empty material. A newer generate supersedes
    /// any still running.
    pub fn begin_generate(&mut self) -> (Ticket, GenerateRequest) {
        self.next_generate += 1;
        self.latest_generate = Some(self.next_generate);
        self.settle();
        let ticket = Ticket {
            epoch: self.epoch,
            generate: self.latest_generate,
        };
        let request = GenerateRequest {
            topic: self.topic.clone(),
            documents: self.documents.clone(),
            summaries: self.summaries.clone(),
        };
        (ticket, request)
    }

    pub fn finish_generate(&mut self, ticket: Ticket, output: GenerateOutput) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.generated_content = output.content;
        self.generated_image = output.image;
        self.generated_prompt = output.prompt;
        self.last_error = None;
        self.latest_generate = None;
        self.settled = Stage::Generated;
        self.settle();
        true
    }

    /// Record a failed action and go back to the last settled stage.
    pub fn fail(&mut self, ticket: Ticket, error: &PipelineError) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.last_error = Some(error.to_string());
        match ticket.generate {
            Some(_) => self.latest_generate = None,
            None => self.summarizing = false,
        }
        self.settle();
        true
    }

    fn accepts(&self, ticket: Ticket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        match ticket.generate {
            Some(seq) => self.latest_generate == Some(seq),
            None => self.summarizing,
        }
    }

    fn settle(&mut self) {
        self.stage = if self.latest_generate.is_some() {
            Stage::Generating
        } else if self.summarizing {
            Stage::Summarizing
        } else {
            self.settled
        };
    }
}

/// Sessions keyed by Discord channel id.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<u64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self, channel: u64) -> Session {
        self.sessions
            .read()
            .await
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    /// Run `f` against the channel's session, creating it if needed.
    pub async fn update<R>(&self, channel: u64, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.sessions.write().await;
        f(sessions.entry(channel).or_default())
    }

    pub async fn clear(&self, channel: u64) {
        self.update(channel, Session::clear).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::scheduler::PipelineScheduler;
    use crate::pipeline::{Orchestrator, OrchestratorSettings};
    use crate::testing::{documents, FakeCollector, FakeModel};
    use std::sync::Arc;

    fn summarized(topic: &str, n: usize) -> SummarizeOutput {
        SummarizeOutput {
            documents: documents(topic, n),
            summaries: vec![],
            interview_questions: "1. Why?".to_string(),
        }
    }

    fn generated() -> GenerateOutput {
        GenerateOutput {
            content: "# Article".to_string(),
            image: None,
            prompt: None,
        }
    }

    #[test]
    fn happy_path_walks_every_stage() {
        let mut session = Session::default();
        assert_eq!(session.stage, Stage::Idle);

        let ticket = session.begin_summarize("  Memetics ");
        assert_eq!(session.stage, Stage::Summarizing);
        assert_eq!(session.topic, "Memetics");

        assert!(session.finish_summarize(ticket, summarized("Memetics", 5)));
        assert_eq!(session.stage, Stage::Summarized);
        assert_eq!(session.documents.len(), 5);

        let (ticket, request) = session.begin_generate();
        assert_eq!(session.stage, Stage::Generating);
        assert_eq!(request.topic, "Memetics");
        assert_eq!(request.documents.len(), 5);

        assert!(session.finish_generate(ticket, generated()));
        assert_eq!(session.stage, Stage::Generated);
        assert_eq!(session.generated_content, "# Article");
    }

    fn fill_every_field(s: &mut Session) {
        s.topic = "Memetics".to_string();
        s.summaries = vec![];
        s.documents = documents("Memetics", 2);
        s.interview_questions = "q".to_string();
        s.interview_answers = "a".to_string();
        s.generated_content = "c".to_string();
        s.generated_image = Some(GeneratedImage {
            url: "https://example.com/i.png".to_string(),
            width: 1200,
            height: 630,
        });
        s.generated_prompt = Some("p".to_string());
        s.last_error = Some("e".to_string());
    }

    fn assert_cleared(session: &Session) {
        assert!(session.topic.is_empty());
        assert!(session.summaries.is_empty());
        assert!(session.documents.is_empty());
        assert!(session.interview_questions.is_empty());
        assert!(session.interview_answers.is_empty());
        assert!(session.generated_content.is_empty());
        assert!(session.generated_image.is_none());
        assert!(session.generated_prompt.is_none());
        assert!(session.last_error.is_none());
        assert_eq!(session.stage, Stage::Idle);
    }

    #[tokio::test]
    async fn clear_resets_all_fields_without_backend_calls() {
        let collector = Arc::new(FakeCollector::returning(3));
        let model = Arc::new(FakeModel::scripted());
        let orchestrator = Orchestrator::new(
            collector.clone(),
            model.clone(),
            OrchestratorSettings::default(),
        );
        let scheduler = PipelineScheduler::on_current_runtime(Arc::new(orchestrator));
        let store = SessionStore::new();

        // A finished summarize, then every field populated
        let ticket = store.update(7, |s| s.begin_summarize("Memetics")).await;
        let output = scheduler.submit_summarize("Memetics").join().await.unwrap();
        assert!(store.update(7, |s| s.finish_summarize(ticket, output)).await);
        store.update(7, fill_every_field).await;

        let collector_calls = collector.calls();
        let chat_calls = model.chat_calls();
        let embed_calls = model.embed_calls();
        assert_eq!(collector_calls, 1);

        store.clear(7).await;
        assert_cleared(&store.snapshot(7).await);
        assert_eq!(collector.calls(), collector_calls);
        assert_eq!(model.chat_calls(), chat_calls);
        assert_eq!(model.embed_calls(), embed_calls);
        assert_eq!(scheduler.active_runs(), 0);
    }

    #[tokio::test]
    async fn clear_while_running_discards_the_result() {
        let collector = Arc::new(FakeCollector::returning(2));
        let model = Arc::new(FakeModel::scripted());
        let orchestrator = Orchestrator::new(
            collector.clone(),
            model.clone(),
            OrchestratorSettings::default(),
        );
        let scheduler = PipelineScheduler::on_current_runtime(Arc::new(orchestrator));
        let store = SessionStore::new();

        let ticket = store.update(7, |s| s.begin_summarize("Memetics")).await;
        let handle = scheduler.submit_summarize("Memetics");
        store.clear(7).await;

        let output = handle.join().await.unwrap();
        assert!(!store.update(7, |s| s.finish_summarize(ticket, output)).await);
        assert_cleared(&store.snapshot(7).await);
        assert_eq!(collector.calls(), 1);
        assert_eq!(scheduler.active_runs(), 0);
    }

    #[test]
    fn overlapping_generates_settle_when_the_latest_fails() {
        let mut session = Session::default();
        let ticket = session.begin_summarize("Memetics");
        session.finish_summarize(ticket, summarized("Memetics", 2));

        let (first, _) = session.begin_generate();
        let (second, _) = session.begin_generate();
        assert_eq!(session.stage, Stage::Generating);

        // superseded by the second run
        assert!(!session.finish_generate(first, generated()));
        assert_eq!(session.stage, Stage::Generating);
        assert!(session.generated_content.is_empty());

        assert!(session.fail(second, &PipelineError::Generation("rate limited".to_string())));
        assert_eq!(session.stage, Stage::Summarized);
        assert!(session.last_error.is_some());
    }

    #[test]
    fn late_generate_does_not_overwrite_newer_content() {
        let mut session = Session::default();
        let (first, _) = session.begin_generate();
        let (second, _) = session.begin_generate();

        let mut newer = generated();
        newer.content = "# Newer".to_string();
        assert!(session.finish_generate(second, newer));
        assert!(!session.finish_generate(first, generated()));
        assert!(!session.fail(first, &PipelineError::Generation("late".to_string())));

        assert_eq!(session.generated_content, "# Newer");
        assert_eq!(session.stage, Stage::Generated);
        assert!(session.last_error.is_none());
    }

    #[test]
    fn generate_during_summarize_keeps_both_results() {
        let mut session = Session::default();
        let summarize = session.begin_summarize("Memetics");
        let (generate, request) = session.begin_generate();
        assert!(request.documents.is_empty());
        assert_eq!(session.stage, Stage::Generating);

        assert!(session.finish_summarize(summarize, summarized("Memetics", 2)));
        assert_eq!(session.stage, Stage::Generating);

        assert!(session.fail(generate, &PipelineError::Generation("boom".to_string())));
        assert_eq!(session.stage, Stage::Summarized);
        assert_eq!(session.documents.len(), 2);
    }

    #[test]
    fn summarize_result_is_written_once() {
        let mut session = Session::default();
        let ticket = session.begin_summarize("Memetics");
        assert!(session.finish_summarize(ticket, summarized("Memetics", 2)));
        assert!(!session.fail(ticket, &PipelineError::Generation("late".to_string())));
        assert_eq!(session.stage, Stage::Summarized);
        assert!(session.last_error.is_none());
    }

    #[test]
    fn results_after_clear_are_dropped() {
        let mut session = Session::default();
        let ticket = session.begin_summarize("Memetics");
        session.clear();

        assert!(!session.finish_summarize(ticket, summarized("Memetics", 5)));
        assert!(session.documents.is_empty());
        assert_eq!(session.stage, Stage::Idle);
    }

    #[test]
    fn new_topic_supersedes_running_one() {
        let mut session = Session::default();
        let first = session.begin_summarize("Memetics");
        let second = session.begin_summarize("Sourdough");

        assert!(!session.finish_summarize(first, summarized("Memetics", 3)));
        assert!(session.finish_summarize(second, summarized("Sourdough", 2)));
        assert_eq!(session.topic, "Sourdough");
        assert_eq!(session.documents.len(), 2);
    }

    #[test]
    fn generate_is_allowed_from_idle() {
        let mut session = Session::default();
        let (ticket, request) = session.begin_generate();
        assert!(request.documents.is_empty());
        assert!(request.topic.is_empty());
        assert!(session.finish_generate(ticket, generated()));
        assert_eq!(session.stage, Stage::Generated);
    }

    #[test]
    fn failure_records_error_and_restores_stage() {
        let mut session = Session::default();
        let ticket = session.begin_summarize("Memetics");
        session.finish_summarize(ticket, summarized("Memetics", 2));

        let (ticket, _) = session.begin_generate();
        assert!(session.fail(ticket, &PipelineError::Generation("rate limited".to_string())));
        assert_eq!(session.stage, Stage::Summarized);
        assert!(session.last_error.as_deref().unwrap().contains("rate limited"));
        assert_eq!(session.documents.len(), 2);
    }

    #[test]
    fn interview_answers_do_not_reach_generate() {
        let mut session = Session::default();
        let ticket = session.begin_summarize("Memetics");
        session.finish_summarize(ticket, summarized("Memetics", 1));
        session.interview_answers = "I started in 1998.".to_string();

        let (_, request) = session.begin_generate();
        let serialized = serde_json::to_string(&request).unwrap();
        assert!(!serialized.contains("1998"));
    }
}
