use serde::Deserialize;
use tracing::debug;

use super::types::SearchHit;
use crate::config::SearchConfig;
use crate::error::{PipelineError, PipelineResult};

#[derive(Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SerpApiResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SerpApiResult {
    #[serde(default)]
    title: String,
    link: Option<String>,
}

/// Google organic results via SerpAPI.
pub async fn search_serpapi(
    client: &reqwest::Client,
    config: &SearchConfig,
    query: &str,
) -> PipelineResult<Vec<SearchHit>> {
    let url = format!("{}/search", config.base_url.trim_end_matches('/'));
    let num = config.num_results.to_string();

    let response = client
        .get(&url)
        .query(&[
            ("engine", "google"),
            ("q", query),
            ("num", num.as_str()),
            ("api_key", config.api_key.as_str()),
        ])
        .send()
        .await
        .map_err(|e| PipelineError::Retrieval(format!("SerpAPI request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(PipelineError::Retrieval(format!(
            "SerpAPI error: {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| PipelineError::Retrieval(format!("Failed to read SerpAPI body: {}", e)))?;
    let hits = parse_serpapi(&body, config.num_results as usize)?;
    debug!(query, hits = hits.len(), "search complete");
    Ok(hits)
}

/// Decode a SerpAPI payload, keeping rank order and dropping link-less rows.
pub(crate) fn parse_serpapi(body: &str, limit: usize) -> PipelineResult<Vec<SearchHit>> {
    let parsed: SerpApiResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::Retrieval(format!("Failed to decode SerpAPI JSON: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(PipelineError::Retrieval(format!("SerpAPI error: {}", error)));
    }

    Ok(parsed
        .organic_results
        .into_iter()
        .filter_map(|r| {
            let url = r.link?;
            Some(SearchHit {
                title: r.title,
                url,
            })
        })
        .take(limit)
        .collect())
}
