use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineResult;
use crate::llm::{LanguageModel, Message};
use crate::summarize::parser::StructuredParser;
use crate::summarize::Summary;

/// Article skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Outline {
    /// Working title of the article.
    pub title: String,
    /// Sections in reading order.
    pub sections: Vec<OutlineSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutlineSection {
    /// Section heading.
    pub heading: String,
    /// Talking points the section should cover.
    #[serde(default)]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

const SYSTEM_PROMPT: &str = "You are an experienced editor who plans long-form articles. \
You build outlines that are original, well ordered and grounded in the research provided.";

pub struct OutlineGenerator {
    topic: String,
    llm: Arc<dyn LanguageModel>,
    /// Expert Q&A to weave into the outline. Built only from the topic, so
    /// it starts empty; interview output is not fed in here.
    pub questions_and_answers: Option<Vec<QuestionAnswer>>,
    parser: StructuredParser<Outline>,
}

impl OutlineGenerator {
    pub fn new(topic: impl Into<String>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            topic: topic.into(),
            llm,
            questions_and_answers: None,
            parser: StructuredParser::new(),
        }
    }

    pub async fn generate_outline(&self, summaries: &[Summary]) -> PipelineResult<Outline> {
        let bodies: Vec<_> = summaries.iter().map(|s| &s.content).collect();
        let serialized = serde_json::to_string_pretty(&bodies).unwrap_or_else(|_| "[]".to_string());

        let mut prompt = format!(
            "Create a detailed outline for an article about \"{}\".\n\n\
             Research summaries of the top search results:\n{}\n",
            self.topic, serialized
        );
        if let Some(qa) = self.questions_and_answers.as_deref().filter(|qa| !qa.is_empty()) {
            prompt.push_str("\nExpert interview:\n");
            for pair in qa {
                prompt.push_str(&format!("Q: {}\nA: {}\n", pair.question, pair.answer));
            }
        }
        prompt.push('\n');
        prompt.push_str(&self.parser.format_instructions());

        let reply = self
            .llm
            .chat(&[Message::system(SYSTEM_PROMPT), Message::user(prompt)])
            .await?;
        let outline = self.parser.parse(&reply)?;

        info!(
            topic = %self.topic,
            title = %outline.title,
            sections = outline.sections.len(),
            "outline generated"
        );
        Ok(outline)
    }
}
