use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::summarize::splitter::ChunkConfig;

/// SerpAPI settings. The credential lives here and is handed to the
/// collector at construction; nothing is exported into the process env.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub num_results: u32,
    /// Upper bound on scraped text kept per page, in chars.
    pub max_document_chars: usize,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub chunking: ChunkConfig,
    pub max_concurrent_summaries: usize,
    pub retrieval_k: usize,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Build the config from an arbitrary key lookup (env, test map, ...).
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(api_key) = get("SERPAPI_API_KEY") else {
            bail!("SERPAPI_API_KEY required");
        };

        let search = SearchConfig {
            api_key,
            base_url: get("SERPAPI_BASE_URL").unwrap_or_else(|| "https://serpapi.com".to_string()),
            num_results: parse_or(&get, "SEARCH_RESULTS", 5)?,
            max_document_chars: parse_or(&get, "MAX_DOCUMENT_CHARS", 40_000)?,
            fetch_timeout: Duration::from_secs(parse_or(&get, "FETCH_TIMEOUT_SECS", 20)?),
        };

        let model = get("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let llm = LlmConfig {
            base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            embedding_model: get("LLM_EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            model,
            api_key: get("LLM_API_KEY"),
            temperature: parse_or(&get, "LLM_TEMPERATURE", 0.0)?,
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", 2048)?,
            timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT_SECS", 120)?),
        };

        let max_concurrent_summaries: usize = parse_or(&get, "MAX_CONCURRENT_SUMMARIES", 4)?;
        let retrieval_k: usize = parse_or(&get, "RETRIEVAL_K", 3)?;
        if max_concurrent_summaries == 0 {
            bail!("MAX_CONCURRENT_SUMMARIES must be at least 1");
        }

        Ok(Self {
            search,
            llm,
            chunking: ChunkConfig::default(),
            max_concurrent_summaries,
            retrieval_k,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
