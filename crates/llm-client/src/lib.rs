pub mod error;
pub mod summarizer;

pub use error::{LlmError, LlmResult};
pub use summarizer::{fallback_headline, OpenAiSummarizer};

use std::time::Duration;

/// Configuration for the chat-completions service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Empty disables remote calls; every summary becomes the truncation fallback
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 60,
            temperature: 0.4,
            timeout: Duration::from_secs(30),
        }
    }
}
