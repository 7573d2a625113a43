use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signal_core::{truncate_chars, Summarizer};

use crate::error::{LlmError, LlmResult};
use crate::LlmConfig;

const FALLBACK_CHARS: usize = 140;

const SYSTEM_PROMPT: &str = "You are a financial news summarizer. \
Given discussion text from Reddit / 4chan about crypto or stocks, \
return a short, punchy headline (max ~20 words) that captures \
the main market-relevant idea.";

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// What a headline degrades to when the model cannot be reached.
pub fn fallback_headline(text: &str) -> String {
    format!("{}...", truncate_chars(text, FALLBACK_CHARS))
}

/// Headline generator backed by the OpenAI chat-completions endpoint
#[derive(Clone)]
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiSummarizer {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Ask the model for a headline. Errors are returned, not swallowed.
    pub async fn headline(&self, text: &str) -> LlmResult<String> {
        if !self.is_configured() {
            return Err(LlmError::MissingApiKey);
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: text },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response.json::<ChatResponse>().await?;
        first_choice(body)
    }
}

fn first_choice(body: ChatResponse) -> LlmResult<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("empty completion".to_string()))
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> String {
        match self.headline(text).await {
            Ok(headline) => headline,
            Err(LlmError::MissingApiKey) => fallback_headline(text),
            Err(e) => {
                tracing::warn!("GPT error, using truncated text: {}", e);
                fallback_headline(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_headline_truncates() {
        let text = "x".repeat(500);
        let headline = fallback_headline(&text);
        assert_eq!(headline.len(), FALLBACK_CHARS + 3);
        assert!(headline.ends_with("..."));
    }

    #[test]
    fn test_fallback_headline_short_and_empty() {
        assert_eq!(fallback_headline("$BTC up"), "$BTC up...");
        assert_eq!(fallback_headline(""), "...");
    }

    #[test]
    fn test_first_choice_trims() {
        let body: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  $NVDA bulls eye new highs \n"}}]
        }))
        .unwrap();
        assert_eq!(first_choice(body).unwrap(), "$NVDA bulls eye new highs");
    }

    #[test]
    fn test_first_choice_empty() {
        let body: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(first_choice(body), Err(LlmError::InvalidResponse(_))));

        let body: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert!(first_choice(body).is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            max_tokens: 60,
            temperature: 0.4,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["max_tokens"], 60);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_unconfigured_summarizer_falls_back() {
        let summarizer = OpenAiSummarizer::new(LlmConfig::default());
        assert!(!summarizer.is_configured());
        assert_eq!(summarizer.summarize("$SOL flips $ETH").await, "$SOL flips $ETH...");
        assert!(matches!(summarizer.headline("x").await, Err(LlmError::MissingApiKey)));
    }
}
