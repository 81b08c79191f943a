pub mod scheduler;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::article::content::ContentGenerator;
use crate::article::outline::OutlineGenerator;
use crate::article::GenerateOutput;
use crate::collect::types::Document;
use crate::collect::EvidenceCollector;
use crate::error::{PipelineError, PipelineResult};
use crate::interview::InterviewAgent;
use crate::llm::LanguageModel;
use crate::summarize::parser::StructuredParser;
use crate::summarize::splitter::ChunkConfig;
use crate::summarize::{Summarizer, Summary};

/// Output of the research half of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeOutput {
    pub documents: Vec<Document>,
    pub summaries: Vec<Summary>,
    pub interview_questions: String,
}

/// Input of the writing half. Nothing checks that these came from a
/// summarize run for the same topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub documents: Vec<Document>,
    pub summaries: Vec<Summary>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub chunking: ChunkConfig,
    pub max_concurrent_summaries: usize,
    pub retrieval_k: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkConfig::default(),
            max_concurrent_summaries: 4,
            retrieval_k: 3,
        }
    }
}

/// Sequences the pipeline stages. Holds no per-run state, so concurrent
/// runs share nothing but the collaborators.
pub struct Orchestrator {
    collector: Arc<dyn EvidenceCollector>,
    llm: Arc<dyn LanguageModel>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        collector: Arc<dyn EvidenceCollector>,
        llm: Arc<dyn LanguageModel>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            collector,
            llm,
            settings,
        }
    }

    /// Collect, summarize, then write interview questions.
    pub async fn summarize(&self, topic: &str) -> PipelineResult<SummarizeOutput> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::EmptyTopic);
        }

        let documents = self.collector.collect(topic).await?;

        let summarizer = Summarizer::new(
            self.llm.clone(),
            StructuredParser::new(),
            self.settings.chunking,
            self.settings.max_concurrent_summaries,
        );
        let summaries = summarizer.summarize_all(&documents).await?;

        let agent = InterviewAgent::new(topic, self.llm.clone());
        let prompt = InterviewAgent::build_prompt(topic, &summaries);
        let interview_questions = agent.run(&prompt).await?;

        info!(
            topic,
            documents = documents.len(),
            summaries = summaries.len(),
            "summarize complete"
        );
        Ok(SummarizeOutput {
            documents,
            summaries,
            interview_questions,
        })
    }

    /// Outline, vectorize, write. Steps run one after another.
    pub async fn generate(&self, request: GenerateRequest) -> PipelineResult<GenerateOutput> {
        let GenerateRequest {
            topic,
            documents,
            summaries,
        } = request;

        let outline_generator = OutlineGenerator::new(topic.as_str(), self.llm.clone());
        let questions_and_answers = outline_generator.questions_and_answers.clone();
        let outline = outline_generator.generate_outline(&summaries).await?;

        let mut content_gen = ContentGenerator::new(
            topic.as_str(),
            outline,
            questions_and_answers,
            self.llm.clone(),
            self.settings.chunking,
            self.settings.retrieval_k,
        );
        content_gen.split_and_vectorize(&documents).await?;
        let content = content_gen.generate_post().await?;

        info!(
            topic = %topic,
            chunks = content_gen.indexed_chunks(),
            len = content.len(),
            "generate complete"
        );
        Ok(GenerateOutput {
            content,
            image: None,
            prompt: None,
        })
    }
}
