use std::sync::Arc;

use tracing::{debug, info};

use super::index::{IndexedChunk, VectorIndex};
use super::outline::{Outline, QuestionAnswer};
use crate::collect::types::Document;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::{LanguageModel, Message};
use crate::summarize::splitter::{ChunkConfig, TextSplitter};

/// Chunks embedded per embeddings request.
const EMBED_BATCH: usize = 32;
/// Tail of the draft shown to the model when writing the next section.
const PREVIOUS_TEXT_CHARS: usize = 1500;

const SYSTEM_PROMPT: &str = "You are a skilled long-form writer. You write clear, engaging, \
factually careful prose in markdown, using the research excerpts you are given and never \
inventing sources.";

/// Writes the article section by section, grounding each section in the
/// most similar chunks of the source documents.
pub struct ContentGenerator {
    topic: String,
    outline: Outline,
    questions_and_answers: Option<Vec<QuestionAnswer>>,
    llm: Arc<dyn LanguageModel>,
    splitter: TextSplitter,
    retrieval_k: usize,
    index: VectorIndex,
}

impl ContentGenerator {
    pub fn new(
        topic: impl Into<String>,
        outline: Outline,
        questions_and_answers: Option<Vec<QuestionAnswer>>,
        llm: Arc<dyn LanguageModel>,
        chunking: ChunkConfig,
        retrieval_k: usize,
    ) -> Self {
        Self {
            topic: topic.into(),
            outline,
            questions_and_answers,
            llm,
            splitter: TextSplitter::new(chunking),
            retrieval_k,
            index: VectorIndex::new(),
        }
    }

    pub fn indexed_chunks(&self) -> usize {
        self.index.len()
    }

    /// Chunk and embed the documents into this generator's index.
    pub async fn split_and_vectorize(&mut self, documents: &[Document]) -> PipelineResult<()> {
        let mut pending: Vec<(usize, String)> = Vec::new();
        for (doc_pos, doc) in documents.iter().enumerate() {
            for chunk in self.splitter.split(&doc.content) {
                pending.push((doc_pos, chunk));
            }
        }

        for batch in pending.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let embeddings = self.llm.embed(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(PipelineError::Generation(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }
            for ((doc_pos, text), embedding) in batch.iter().zip(embeddings) {
                let doc = &documents[*doc_pos];
                self.index.insert(IndexedChunk {
                    source_url: doc.url.clone(),
                    text: text.clone(),
                    embedding,
                });
            }
        }

        info!(
            documents = documents.len(),
            chunks = self.index.len(),
            "documents vectorized"
        );
        Ok(())
    }

    pub async fn generate_post(&self) -> PipelineResult<String> {
        let mut post = format!("# {}\n\n", self.outline.title);
        let overview = self
            .outline
            .sections
            .iter()
            .map(|s| format!("- {}", s.heading))
            .collect::<Vec<_>>()
            .join("\n");

        for (i, section) in self.outline.sections.iter().enumerate() {
            let excerpts = self.retrieve(&format!("{}: {}", self.topic, section.heading)).await?;

            let mut prompt = format!(
                "Article topic: {}\nArticle title: {}\nSections:\n{}\n\n\
                 Write section {} of {}: \"{}\".\n",
                self.topic,
                self.outline.title,
                overview,
                i + 1,
                self.outline.sections.len(),
                section.heading
            );
            if !section.points.is_empty() {
                prompt.push_str("Cover these points:\n");
                for point in &section.points {
                    prompt.push_str(&format!("- {}\n", point));
                }
            }
            if let Some(qa) = self.questions_and_answers.as_deref().filter(|qa| !qa.is_empty()) {
                prompt.push_str("\nExpert interview notes:\n");
                for pair in qa {
                    prompt.push_str(&format!("Q: {}\nA: {}\n", pair.question, pair.answer));
                }
            }
            if !excerpts.is_empty() {
                prompt.push_str("\nResearch excerpts:\n");
                for (source, text) in &excerpts {
                    prompt.push_str(&format!("--- {} ---\n{}\n", source, text));
                }
            }
            let previous = tail_chars(&post, PREVIOUS_TEXT_CHARS);
            if i > 0 {
                prompt.push_str(&format!("\nThe article so far ends with:\n{}\n", previous));
            }
            prompt.push_str(
                "\nReturn only the body of this section in markdown, without repeating its heading.",
            );

            let body = self
                .llm
                .chat(&[Message::system(SYSTEM_PROMPT), Message::user(prompt)])
                .await?;
            let body = body.trim();
            if body.is_empty() {
                return Err(PipelineError::Generation(format!(
                    "model returned an empty body for section '{}'",
                    section.heading
                )));
            }
            debug!(section = %section.heading, len = body.len(), "section written");

            post.push_str(&format!("## {}\n\n{}\n\n", section.heading, body));
        }

        info!(
            topic = %self.topic,
            sections = self.outline.sections.len(),
            len = post.len(),
            "article generated"
        );
        Ok(post.trim_end().to_string())
    }

    /// `(source_url, text)` of the best matching chunks.
    async fn retrieve(&self, query: &str) -> PipelineResult<Vec<(String, String)>> {
        if self.index.is_empty() || self.retrieval_k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self
            .llm
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Generation("no embedding for query".to_string()))?;

        Ok(self
            .index
            .search(&embedding, self.retrieval_k)
            .into_iter()
            .map(|(_, chunk)| (chunk.source_url.clone(), chunk.text.clone()))
            .collect())
    }
}

fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
