pub mod content;
pub mod index;
pub mod outline;

use serde::{Deserialize, Serialize};

/// Generated artwork for an article. Image generation is not wired up yet,
/// so every run leaves it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Result of the generate pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOutput {
    pub content: String,
    pub image: Option<GeneratedImage>,
    pub prompt: Option<String>,
}
