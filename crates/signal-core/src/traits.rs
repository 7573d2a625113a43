use async_trait::async_trait;
use crate::{ChartPoint, Post, ScanError, SentimentLabel};

/// A social platform that can be scraped for ticker chatter
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Display name used in scan logs and signal titles ("Reddit", "4chan")
    fn name(&self) -> &str;

    /// What one fetched item is called in scan logs ("posts", "threads")
    fn unit(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Post>, ScanError>;
}

/// Condenses discussion text into a short headline.
///
/// Implementations never fail: when the backing service is unavailable they
/// fall back to a truncated copy of the input.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> String;
}

pub trait SentimentScorer: Send + Sync {
    fn label(&self, text: &str) -> SentimentLabel;
}

/// Intraday price history for chart rendering
#[async_trait]
pub trait PriceHistory: Send + Sync {
    async fn intraday(&self, symbol: &str) -> Result<Vec<ChartPoint>, ScanError>;
}
