use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat and embedding access used by every LLM-backed stage.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn chat(&self, messages: &[Message]) -> PipelineResult<String>;

    /// One embedding per input, in input order.
    async fn embed(&self, inputs: &[String]) -> PipelineResult<Vec<Vec<f32>>>;
}

/// Client for any OpenAI-compatible API.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client, config })
    }

    /// Resolve an API path (`chat/completions`, `embeddings`) against the base URL.
    fn endpoint(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let base = base
            .strip_suffix("/chat/completions")
            .unwrap_or(base);
        if base.ends_with("/v1") {
            format!("{}/{}", base, path)
        } else {
            format!("{}/v1/{}", base, path)
        }
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> PipelineResult<serde_json::Value> {
        let mut req = self.client.post(self.endpoint(path)).json(&body);
        if let Some(key) = &self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PipelineError::Generation(format!("LLM request failed: {}", e)))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| PipelineError::Generation(format!("Failed to read LLM response: {}", e)))?;
        if !status.is_success() {
            let snippet: String = text.chars().take(300).collect();
            return Err(PipelineError::Generation(format!(
                "LLM endpoint returned {}: {}",
                status, snippet
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| PipelineError::Generation(format!("Failed to parse LLM JSON: {}", e)))
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn chat(&self, messages: &[Message]) -> PipelineResult<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let json = self.post_json("chat/completions", body).await?;

        // choices[0].message.content may be null
        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .unwrap_or("")
            .to_string();

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            response_len = content.len(),
            "chat completion"
        );
        Ok(content)
    }

    async fn embed(&self, inputs: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.config.embedding_model,
            "input": inputs,
        });
        let json = self.post_json("embeddings", body).await?;

        let vectors = parse_embeddings(&json, inputs.len())?;
        debug!(model = %self.config.embedding_model, count = vectors.len(), "embeddings");
        Ok(vectors)
    }
}

/// Vectors from an embeddings response, ordered by their `index`.
fn parse_embeddings(json: &serde_json::Value, expected: usize) -> PipelineResult<Vec<Vec<f32>>> {
    let data = json["data"]
        .as_array()
        .ok_or_else(|| PipelineError::Generation("embedding response has no data".to_string()))?;

    let mut rows = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
        let values = item["embedding"].as_array().ok_or_else(|| {
            PipelineError::Generation(format!("embedding {} is missing its vector", index))
        })?;
        let vector = values
            .iter()
            .map(|v| v.as_f64().map(|v| v as f32))
            .collect::<Option<Vec<f32>>>()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                PipelineError::Generation(format!("embedding {} is empty or not numeric", index))
            })?;
        rows.push((index, vector));
    }
    rows.sort_by_key(|(index, _)| *index);

    if rows.len() != expected {
        return Err(PipelineError::Generation(format!(
            "expected {} embeddings, got {}",
            expected,
            rows.len()
        )));
    }
    Ok(rows.into_iter().map(|(_, v)| v).collect())
}
