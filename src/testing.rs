//! Scripted collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::collect::types::Document;
use crate::collect::EvidenceCollector;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::{LanguageModel, Message};

type Responder = Box<dyn Fn(&[Message]) -> PipelineResult<String> + Send + Sync>;

/// Language model whose replies come from a closure. Counts calls.
pub struct FakeModel {
    responder: Responder,
    chat_calls: AtomicUsize,
    embed_calls: AtomicUsize,
}

impl FakeModel {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[Message]) -> PipelineResult<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            chat_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
        }
    }

    /// Plausible replies keyed on what the prompt asks for.
    pub fn scripted() -> Self {
        Self::new(|messages| {
            let prompt = messages
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            let reply = if prompt.contains("\"sections\"") {
                r#"{"title": "Memetics: How Ideas Replicate", "sections": [
                    {"heading": "What is a meme?", "points": ["Dawkins, 1976"]},
                    {"heading": "Criticism", "points": []}
                ]}"#
                .to_string()
            } else if prompt.starts_with("document_summaries:") {
                "1. What first drew you to memetics?\n2. Where does the gene analogy break down?"
                    .to_string()
            } else if prompt.contains("\"concise_summary\"") {
                summary_json("A page about how ideas spread.")
            } else if prompt.contains("Write section") {
                "Section body grounded in the research.".to_string()
            } else {
                "Partial summary of an excerpt.".to_string()
            };
            Ok(reply)
        })
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn chat(&self, messages: &[Message]) -> PipelineResult<String> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(messages)
    }

    async fn embed(&self, inputs: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|text| letter_histogram(text)).collect())
    }
}

/// 26-dim letter frequency vector; similar texts land close together.
fn letter_histogram(text: &str) -> Vec<f32> {
    let mut counts = vec![0f32; 26];
    for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
        counts[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    counts
}

pub fn summary_json(concise: &str) -> String {
    serde_json::json!({
        "concise_summary": concise,
        "writing_style": "informative",
        "key_themes": ["replication", "culture"],
        "interesting_facts": ["The word meme was coined in 1976."],
    })
    .to_string()
}

/// `n` short, distinct documents for `topic`.
pub fn documents(topic: &str, n: usize) -> Vec<Document> {
    let slug = topic.to_lowercase().replace(' ', "-");
    (0..n)
        .map(|i| {
            Document::new(
                format!("https://example.com/{}/{}", slug, i),
                format!("{} source {}", topic, i),
                format!(
                    "Page {} about {}. It explains the history, key ideas and debates.",
                    i, topic
                ),
            )
        })
        .collect()
}

/// Collector that returns canned documents, or a canned failure.
pub struct FakeCollector {
    docs: usize,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FakeCollector {
    pub fn returning(docs: usize) -> Self {
        Self {
            docs,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            docs: 0,
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvidenceCollector for FakeCollector {
    async fn collect(&self, topic: &str) -> PipelineResult<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(PipelineError::Retrieval(message.clone())),
            None => Ok(documents(topic, self.docs)),
        }
    }
}
