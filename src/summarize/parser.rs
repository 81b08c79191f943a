use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::error::{PipelineError, PipelineResult};

/// Coerces model output into `T`, and tells the model how to shape it.
pub struct StructuredParser<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> Default for StructuredParser<T> {
    fn default() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Clone for StructuredParser<T> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<T> StructuredParser<T>
where
    T: JsonSchema + DeserializeOwned,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions appended to a prompt so the reply parses as `T`.
    pub fn format_instructions(&self) -> String {
        let schema = schemars::schema_for!(T);
        let schema = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
        format!(
            "The output must be a single JSON object that conforms to the JSON schema below. \
             Return only the JSON object, with no commentary.\n\n```json\n{}\n```",
            schema
        )
    }

    pub fn parse(&self, output: &str) -> PipelineResult<T> {
        let candidate = extract_json(output).ok_or_else(|| {
            PipelineError::Parse(format!("no JSON object found in: {}", preview(output)))
        })?;
        serde_json::from_str(candidate).map_err(|e| {
            PipelineError::Parse(format!("{} (output: {})", e, preview(output)))
        })
    }
}

/// Pull the JSON object out of a reply: a fenced block if there is one,
/// otherwise the span from the first `{` to the last `}`.
fn extract_json(output: &str) -> Option<&str> {
    if let Some(start) = output.find("```") {
        let after_fence = &output[start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }

    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (end > start).then(|| &output[start..=end])
}

fn preview(output: &str) -> String {
    let head: String = output.chars().take(200).collect();
    if head.len() < output.len() {
        format!("{}...", head)
    } else {
        head
    }
}
