use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Where a post was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Platform {
    #[serde(rename = "reddit")]
    Reddit,
    #[serde(rename = "4chan")]
    FourChan,
}

/// A single scraped submission or thread, normalized across platforms
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    pub title: String,
    /// Body text, truncated to `SNIPPET_CHARS`
    pub snippet: String,
    #[serde(default)]
    pub comments: Vec<String>,
    /// Title, body and comments joined by blank lines
    #[serde(default)]
    pub combined: String,
    #[serde(default)]
    pub url: String,
}

pub const SNIPPET_CHARS: usize = 280;

impl Post {
    /// Text handed to the summarizer and sentiment scorer.
    pub fn full_text(&self) -> String {
        if !self.combined.is_empty() {
            return self.combined.clone();
        }
        format!("{}\n\n{}", self.title, self.snippet)
    }
}

/// Three-way sentiment bucket attached to posts and signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

impl Default for SentimentLabel {
    fn default() -> Self {
        SentimentLabel::Neutral
    }
}

/// A post after the summarization and sentiment passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPost {
    #[serde(flatten)]
    pub post: Post,
    pub summary: String,
    pub sentiment: SentimentLabel,
    #[serde(skip)]
    pub full_text: String,
}

/// Synthesized feed entry for one spiking ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Signal {
    pub title: String,
    /// Formatted as `%Y-%m-%d %H:%M:%S UTC`
    pub timestamp: String,
    pub summary: String,
    pub sentiment: SentimentLabel,
    pub sources: Vec<String>,
    pub spike_tickers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartPoint {
    /// Local exchange time, `%H:%M`
    pub time: String,
    pub price: f64,
}

/// Everything one scan hands back to the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ScanReport {
    pub logs: Vec<String>,
    pub signals: Vec<Signal>,
    pub charts: BTreeMap<String, Vec<ChartPoint>>,
}

/// Prefix of `text` holding at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
