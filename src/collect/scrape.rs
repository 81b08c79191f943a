use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Fetch a page and return its readable text.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> PipelineResult<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| PipelineError::Retrieval(format!("Failed to fetch {}: {}", url, e)))?;

    if !resp.status().is_success() {
        return Err(PipelineError::Retrieval(format!(
            "{} returned {}",
            url,
            resp.status()
        )));
    }

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = resp
        .bytes()
        .await
        .map_err(|e| PipelineError::Retrieval(format!("Failed to read body of {}: {}", url, e)))?;

    let text = extract_text(&body, &content_type);
    debug!(url, content_type, size = text.len(), "page fetched");
    Ok(text)
}

/// Convert a response body to plain text. HTML goes through html2text,
/// anything else is decoded lossily.
pub fn extract_text(body: &[u8], content_type: &str) -> String {
    let text = if content_type.contains("html") {
        html2text::from_read(body, 120)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).to_string())
    } else {
        String::from_utf8_lossy(body).to_string()
    };
    normalize_whitespace(&text)
}

/// Collapse runs of blank lines and trim trailing spaces.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Cut text to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
