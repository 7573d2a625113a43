use signal_core::{SentimentLabel, SentimentScorer};
use vader_sentiment::SentimentIntensityAnalyzer;

/// Compound score at or beyond which text counts as positive (or, negated, negative)
pub const DEFAULT_THRESHOLD: f64 = 0.25;

/// Lexicon-based sentiment labeling for social-media text.
///
/// The VADER compound score lands in [-1, 1] and is bucketed
/// symmetrically around zero.
pub struct SentimentAnalysisEngine {
    analyzer: SentimentIntensityAnalyzer<'static>,
    threshold: f64,
}

impl SentimentAnalysisEngine {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.abs();
        self
    }

    /// Raw VADER compound score
    pub fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        scores.get("compound").copied().unwrap_or(0.0)
    }

    pub fn classify(&self, score: f64) -> SentimentLabel {
        if score >= self.threshold {
            SentimentLabel::Positive
        } else if score <= -self.threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl SentimentScorer for SentimentAnalysisEngine {
    fn label(&self, text: &str) -> SentimentLabel {
        let score = self.compound(text);
        let label = self.classify(score);
        tracing::trace!("compound {:.3} -> {}", score, label.as_str());
        label
    }
}

impl Default for SentimentAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
