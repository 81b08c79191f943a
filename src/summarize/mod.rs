pub mod parser;
pub mod splitter;

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collect::types::{DocId, Document};
use crate::error::PipelineResult;
use crate::llm::{LanguageModel, Message};
use parser::StructuredParser;
use splitter::{ChunkConfig, TextSplitter};

/// Structured condensation of one web page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSummary {
    /// A concise summary of the page in a few sentences.
    pub concise_summary: String,
    /// The writing style of the page (tone, audience, register).
    pub writing_style: String,
    /// The main themes the page covers.
    pub key_themes: Vec<String>,
    /// Notable facts, figures or quotes worth reusing.
    #[serde(default)]
    pub interesting_facts: Vec<String>,
}

/// A summary together with the document it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub document_id: DocId,
    pub source_url: String,
    #[serde(flatten)]
    pub content: DocumentSummary,
}

const SYSTEM_PROMPT: &str = "You are a meticulous research assistant. You read web pages \
and condense them faithfully, keeping concrete facts and the author's voice.";

/// Map-reduce summarizer: each document is chunked, chunks are condensed,
/// and the condensed text is folded into one structured summary.
pub struct Summarizer {
    llm: Arc<dyn LanguageModel>,
    parser: StructuredParser<DocumentSummary>,
    splitter: TextSplitter,
    concurrency: usize,
}

impl Summarizer {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        parser: StructuredParser<DocumentSummary>,
        chunking: ChunkConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            llm,
            parser,
            splitter: TextSplitter::new(chunking),
            concurrency: concurrency.max(1),
        }
    }

    /// One summary per document, in document order.
    pub async fn summarize_all(&self, documents: &[Document]) -> PipelineResult<Vec<Summary>> {
        // Futures are lazy; collecting them first keeps the closure type out
        // of this future so it stays `Send` when spawned.
        let runs: Vec<_> = documents.iter().map(|doc| self.summarize_one(doc)).collect();
        let summaries: Vec<Summary> = futures::stream::iter(runs)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        debug_assert_eq!(summaries.len(), documents.len());
        info!(count = summaries.len(), "documents summarized");
        Ok(summaries)
    }

    async fn summarize_one(&self, doc: &Document) -> PipelineResult<Summary> {
        let chunks = self.splitter.split(&doc.content);
        debug!(url = %doc.url, chunks = chunks.len(), "summarizing document");

        let body = match chunks.len() {
            0 => doc.content.clone(),
            1 => chunks.into_iter().next().unwrap_or_default(),
            _ => {
                let mut partials = Vec::with_capacity(chunks.len());
                for (i, chunk) in chunks.iter().enumerate() {
                    let prompt = format!(
                        "Write a concise summary of the following excerpt (part {} of {}) \
                         from \"{}\". Keep names, numbers and quotes.\n\n{}",
                        i + 1,
                        chunks.len(),
                        doc.title,
                        chunk
                    );
                    partials.push(
                        self.llm
                            .chat(&[Message::system(SYSTEM_PROMPT), Message::user(prompt)])
                            .await?,
                    );
                }
                partials.join("\n\n")
            }
        };

        let prompt = format!(
            "Summarize the following content from \"{}\" ({}).\n\n{}\n\n{}",
            doc.title,
            doc.url,
            body,
            self.parser.format_instructions()
        );
        let reply = self
            .llm
            .chat(&[Message::system(SYSTEM_PROMPT), Message::user(prompt)])
            .await?;
        let content = self.parser.parse(&reply)?;

        Ok(Summary {
            document_id: doc.id.clone(),
            source_url: doc.url.clone(),
            content,
        })
    }
}
