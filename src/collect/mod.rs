pub mod scrape;
pub mod search;
pub mod types;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::error::{PipelineError, PipelineResult};
use types::{Document, SearchHit};

/// Concurrent page fetches per collection.
const FETCH_CONCURRENCY: usize = 4;

/// Turns a topic into ranked source documents.
#[async_trait]
pub trait EvidenceCollector: Send + Sync {
    async fn collect(&self, topic: &str) -> PipelineResult<Vec<Document>>;
}

/// SerpAPI search followed by a scrape of every result page.
pub struct WebEvidenceCollector {
    client: reqwest::Client,
    config: SearchConfig,
}

impl WebEvidenceCollector {
    pub fn new(config: SearchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!("quill/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl EvidenceCollector for WebEvidenceCollector {
    async fn collect(&self, topic: &str) -> PipelineResult<Vec<Document>> {
        let hits = search::search_serpapi(&self.client, &self.config, topic).await?;
        if hits.is_empty() {
            return Err(PipelineError::Retrieval(format!(
                "no search results for '{}'",
                topic
            )));
        }

        // `buffered` keeps search rank order while fetching in parallel
        let pages: Vec<_> = futures::stream::iter(hits)
            .map(|hit| async move {
                let text = scrape::fetch_text(&self.client, &hit.url).await;
                (hit, text)
            })
            .buffered(FETCH_CONCURRENCY)
            .collect()
            .await;

        let documents = assemble_documents(pages, self.config.max_document_chars, topic)?;

        info!(
            topic,
            doc_count = documents.len(),
            total_chars = documents.iter().map(|d| d.content.len()).sum::<usize>(),
            "evidence collected"
        );
        Ok(documents)
    }
}

/// Turn fetched pages into documents in rank order. Pages that failed or
/// yielded no text are skipped; `Retrieval` only when none survive.
pub(crate) fn assemble_documents(
    pages: Vec<(SearchHit, PipelineResult<String>)>,
    max_chars: usize,
    topic: &str,
) -> PipelineResult<Vec<Document>> {
    let mut documents = Vec::with_capacity(pages.len());
    for (hit, text) in pages {
        match text {
            Ok(text) if !text.trim().is_empty() => {
                let text = scrape::truncate_chars(&text, max_chars);
                documents.push(Document::new(hit.url, hit.title, text));
            }
            Ok(_) => warn!(url = %hit.url, "page yielded no text, skipping"),
            Err(e) => warn!(url = %hit.url, error = %e, "page fetch failed, skipping"),
        }
    }

    if documents.is_empty() {
        return Err(PipelineError::Retrieval(format!(
            "no documents could be extracted for '{}'",
            topic
        )));
    }
    Ok(documents)
}
