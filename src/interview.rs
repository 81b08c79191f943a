use std::sync::Arc;

use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::llm::{LanguageModel, Message};
use crate::summarize::Summary;

/// Persona for the interviewer. The topic is filled in per agent.
const SYSTEM_PROMPT: &str = r#"You are an expert interviewer preparing to interview a subject-matter expert about "{topic}".

You are given structured summaries of the most relevant web pages on the topic. Use them to find what is already well covered, what is contested, and what is missing.

Write 5 to 10 interview questions that:
- draw out first-hand experience, opinions and concrete examples the pages do not contain;
- explore disagreements or gaps between the sources;
- are open-ended and answerable in a paragraph or two.

Return a numbered list of questions and nothing else."#;

/// Single-shot interview question writer.
pub struct InterviewAgent {
    topic: String,
    llm: Arc<dyn LanguageModel>,
}

impl InterviewAgent {
    pub fn new(topic: impl Into<String>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            topic: topic.into(),
            llm,
        }
    }

    /// The composite message handed to the agent: serialized summaries,
    /// then the topic, then the instruction.
    pub fn build_prompt(topic: &str, summaries: &[Summary]) -> String {
        let bodies: Vec<_> = summaries.iter().map(|s| &s.content).collect();
        let serialized = serde_json::to_string(&bodies).unwrap_or_else(|_| "[]".to_string());
        format!(
            "document_summaries: {}topic: {}---Use the above to make interview questions, then I want to answer them.",
            serialized, topic
        )
    }

    pub async fn run(&self, prompt: &str) -> PipelineResult<String> {
        let messages = [
            Message::system(SYSTEM_PROMPT.replace("{topic}", &self.topic)),
            Message::user(prompt),
        ];
        let questions = self.llm.chat(&messages).await?;
        if questions.trim().is_empty() {
            return Err(PipelineError::Generation(
                "interview agent returned an empty reply".to_string(),
            ));
        }
        info!(topic = %self.topic, len = questions.len(), "interview questions ready");
        Ok(questions.trim().to_string())
    }
}
