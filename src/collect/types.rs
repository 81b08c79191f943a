use serde::{Deserialize, Serialize};

/// Content-addressed document ID (blake3 hex hash of the extracted text).
pub type DocId = String;

/// Text extracted from one search result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub title: String,
    pub content: String,
    pub fetched_at: i64,
}

impl Document {
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: blake3::hash(content.as_bytes()).to_hex().to_string(),
            url: url.into(),
            title: title.into(),
            content,
            fetched_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// One organic search hit, before its page is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}
