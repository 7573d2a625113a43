use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use signal_core::{
    EnrichedPost, Post, PostSource, PriceHistory, ScanReport, SentimentScorer, Summarizer,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::signals::{assemble_signal, related_posts, sources_phrase};
use crate::tickers::{detect_spikes, extract_tickers};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Minimum mentions for a ticker to become a signal
    pub spike_threshold: usize,
    /// Summarize/score calls allowed in flight at once during enrichment
    pub enrich_concurrency: usize,
    /// Look up intraday price charts for spiking tickers
    pub charts_enabled: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            spike_threshold: 1,
            enrich_concurrency: 8,
            charts_enabled: true,
        }
    }
}

/// Human-readable progress lines returned with the report, mirrored to tracing.
#[derive(Default)]
struct ScanLog {
    lines: Vec<String>,
}

impl ScanLog {
    fn info(&mut self, line: String) {
        tracing::info!("{}", line);
        self.lines.push(line);
    }

    fn warn(&mut self, line: String) {
        tracing::warn!("{}", line);
        self.lines.push(line);
    }
}

/// Runs one fetch, enrich and aggregate pass over every configured source.
pub struct Scanner {
    sources: Vec<Arc<dyn PostSource>>,
    summarizer: Arc<dyn Summarizer>,
    scorer: Arc<dyn SentimentScorer>,
    prices: Option<Arc<dyn PriceHistory>>,
    settings: ScanSettings,
}

impl Scanner {
    pub fn new(summarizer: Arc<dyn Summarizer>, scorer: Arc<dyn SentimentScorer>) -> Self {
        Self {
            sources: Vec::new(),
            summarizer,
            scorer,
            prices: None,
            settings: ScanSettings::default(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn PostSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_price_history(mut self, prices: Arc<dyn PriceHistory>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_settings(mut self, settings: ScanSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Scan with the configured spike threshold.
    pub async fn scan(&self) -> ScanReport {
        self.scan_with_threshold(self.settings.spike_threshold).await
    }

    /// Scan with an explicit spike threshold. Never fails: every remote
    /// problem becomes a log line in the report.
    pub async fn scan_with_threshold(&self, threshold: usize) -> ScanReport {
        let mut log = ScanLog::default();
        log.info(format!(
            "Scan started at {}Z",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f")
        ));

        let posts = self.collect_posts(&mut log).await;
        if posts.is_empty() {
            log.info("No posts found from any source.".to_string());
            return ScanReport {
                logs: log.lines,
                ..Default::default()
            };
        }

        let enriched = self.enrich_all(posts).await;

        let tickers = extract_tickers(&enriched);
        let unique = tickers.iter().collect::<std::collections::HashSet<_>>().len();
        log.info(format!("Unique tickers mentioned: {}", unique));

        let spikes = detect_spikes(&tickers, threshold);
        let ranked = spikes.ranked();
        if ranked.is_empty() {
            log.info("No ticker spikes detected.".to_string());
        } else {
            let listed: Vec<String> = ranked
                .iter()
                .map(|(ticker, count)| format!("{} x{}", ticker, count))
                .collect();
            log.info(format!("Spike tickers: {}", listed.join(", ")));
        }

        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        let across = sources_phrase(&names);
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let mut signals = Vec::new();
        for (ticker, mentions) in &ranked {
            let related = related_posts(ticker, &enriched);
            if related.is_empty() {
                continue;
            }

            let combined = related
                .iter()
                .map(|p| p.full_text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let headline = self.summarizer.summarize(&combined).await;

            signals.push(assemble_signal(ticker, *mentions, &related, headline, &across, &timestamp));
        }

        let mut charts = BTreeMap::new();
        if let Some(prices) = self.prices.as_ref().filter(|_| self.settings.charts_enabled) {
            for (ticker, _) in &ranked {
                let symbol = ticker.trim_start_matches('$');
                match prices.intraday(symbol).await {
                    Ok(points) if points.is_empty() => {}
                    Ok(points) => {
                        charts.insert(ticker.to_string(), points);
                    }
                    Err(e) => log.warn(format!("Chart error for {}: {}", ticker, e)),
                }
            }
        }

        log.info(format!("Signals returned: {}", signals.len()));
        log.info(format!("Charts retrieved: {}", charts.len()));

        ScanReport {
            logs: log.lines,
            signals,
            charts,
        }
    }

    async fn collect_posts(&self, log: &mut ScanLog) -> Vec<Post> {
        let mut posts = Vec::new();
        for source in &self.sources {
            match source.fetch().await {
                Ok(fetched) => {
                    log.info(format!("{} {} fetched: {}", source.name(), source.unit(), fetched.len()));
                    posts.extend(fetched);
                }
                Err(e) => log.warn(format!("{} scrape error: {}", source.name(), e)),
            }
        }
        posts
    }

    /// Summarize and score every post, keeping input order.
    async fn enrich_all(&self, posts: Vec<Post>) -> Vec<EnrichedPost> {
        let concurrency = self.settings.enrich_concurrency.max(1);
        stream::iter(posts)
            .map(|post| self.enrich(post))
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn enrich(&self, post: Post) -> EnrichedPost {
        let full_text = post.full_text();
        let summary = self.summarizer.summarize(&full_text).await;
        let sentiment = self.scorer.label(&full_text);

        EnrichedPost {
            post,
            summary,
            sentiment,
            full_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use signal_core::{ChartPoint, Platform, ScanError, SentimentLabel};
    use std::sync::Mutex;

    struct FakeSource {
        name: &'static str,
        unit: &'static str,
        result: Mutex<Option<Result<Vec<Post>, ScanError>>>,
    }

    impl FakeSource {
        fn ok(name: &'static str, unit: &'static str, posts: Vec<Post>) -> Arc<Self> {
            Arc::new(Self { name, unit, result: Mutex::new(Some(Ok(posts))) })
        }

        fn failing(name: &'static str, err: ScanError) -> Arc<Self> {
            Arc::new(Self { name, unit: "posts", result: Mutex::new(Some(Err(err))) })
        }
    }

    #[async_trait]
    impl PostSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        fn unit(&self) -> &str {
            self.unit
        }

        async fn fetch(&self) -> Result<Vec<Post>, ScanError> {
            self.result.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Echoes the first line, so cash tags in titles survive into summaries.
    struct FirstLineSummarizer;

    #[async_trait]
    impl Summarizer for FirstLineSummarizer {
        async fn summarize(&self, text: &str) -> String {
            text.lines().next().unwrap_or("").to_string()
        }
    }

    struct KeywordScorer;

    impl SentimentScorer for KeywordScorer {
        fn label(&self, text: &str) -> SentimentLabel {
            if text.contains("moon") {
                SentimentLabel::Positive
            } else if text.contains("dump") {
                SentimentLabel::Negative
            } else {
                SentimentLabel::Neutral
            }
        }
    }

    struct FakePrices;

    #[async_trait]
    impl PriceHistory for FakePrices {
        async fn intraday(&self, symbol: &str) -> Result<Vec<ChartPoint>, ScanError> {
            match symbol {
                "NVDA" => Ok(vec![ChartPoint { time: "09:30".to_string(), price: 900.0 }]),
                "PEPE" => Ok(Vec::new()),
                other => Err(ScanError::NoData(format!("{} not listed", other))),
            }
        }
    }

    fn post(platform: Platform, title: &str, body: &str, url: &str) -> Post {
        let combined = format!("{}\n\n{}", title, body).trim().to_string();
        Post {
            platform,
            subreddit: None,
            title: title.to_string(),
            snippet: body.to_string(),
            comments: vec![],
            combined,
            url: url.to_string(),
        }
    }

    fn scanner() -> Scanner {
        Scanner::new(Arc::new(FirstLineSummarizer), Arc::new(KeywordScorer))
    }

    #[tokio::test]
    async fn test_scan_builds_ranked_signals() {
        let reddit = FakeSource::ok(
            "Reddit",
            "posts",
            vec![
                post(Platform::Reddit, "$NVDA to the moon", "earnings soon", "https://reddit/1"),
                post(Platform::Reddit, "$NVDA calls", "moon mission", "https://reddit/2"),
            ],
        );
        let chan = FakeSource::ok(
            "4chan",
            "threads",
            vec![post(Platform::FourChan, "$PEPE dump incoming", "$NVDA too", "https://4chan/9")],
        );

        let report = scanner()
            .with_source(reddit)
            .with_source(chan)
            .with_price_history(Arc::new(FakePrices))
            .scan()
            .await;

        // $NVDA: title+summary for two reddit posts (4) plus one snippet mention
        assert_eq!(report.signals.len(), 2);
        let nvda = &report.signals[0];
        assert_eq!(nvda.title, "$NVDA mentioned 5 times across Reddit and 4chan");
        assert_eq!(nvda.spike_tickers, vec!["$NVDA"]);
        assert_eq!(nvda.sources, vec!["https://reddit/1", "https://reddit/2", "https://4chan/9"]);
        assert_eq!(nvda.sentiment, SentimentLabel::Positive);
        assert_eq!(nvda.summary, "$NVDA to the moon");

        let pepe = &report.signals[1];
        assert_eq!(pepe.title, "$PEPE mentioned 2 times across Reddit and 4chan");
        assert_eq!(pepe.sentiment, SentimentLabel::Negative);

        assert_eq!(report.charts.len(), 1);
        assert_eq!(report.charts["$NVDA"][0].price, 900.0);

        assert!(report.logs[0].starts_with("Scan started at "));
        assert!(report.logs[0].ends_with('Z'));
        assert_eq!(report.logs[1], "Reddit posts fetched: 2");
        assert_eq!(report.logs[2], "4chan threads fetched: 1");
        assert!(report.logs.contains(&"Unique tickers mentioned: 2".to_string()));
        assert!(report.logs.contains(&"Spike tickers: $NVDA x5, $PEPE x2".to_string()));
        assert_eq!(report.logs[report.logs.len() - 2], "Signals returned: 2");
        assert_eq!(report.logs[report.logs.len() - 1], "Charts retrieved: 1");
    }

    #[tokio::test]
    async fn test_scan_without_posts_returns_early() {
        let report = scanner()
            .with_source(FakeSource::failing(
                "Reddit",
                ScanError::MissingCredentials("Reddit API credentials missing.".to_string()),
            ))
            .with_source(FakeSource::ok("4chan", "threads", vec![]))
            .scan()
            .await;

        assert!(report.signals.is_empty());
        assert!(report.charts.is_empty());
        assert_eq!(report.logs.len(), 4);
        assert_eq!(report.logs[1], "Reddit scrape error: Reddit API credentials missing.");
        assert_eq!(report.logs[2], "4chan threads fetched: 0");
        assert_eq!(report.logs[3], "No posts found from any source.");
    }

    #[tokio::test]
    async fn test_source_failure_does_not_stop_scan() {
        let report = scanner()
            .with_source(FakeSource::failing("Reddit", ScanError::Http("timed out".to_string())))
            .with_source(FakeSource::ok(
                "4chan",
                "threads",
                vec![post(Platform::FourChan, "$LINK", "", "https://4chan/1")],
            ))
            .scan()
            .await;

        assert_eq!(report.logs[1], "Reddit scrape error: HTTP request failed: timed out");
        assert_eq!(report.signals.len(), 1);
        assert_eq!(report.signals[0].title, "$LINK mentioned 2 times across Reddit and 4chan");
        assert_eq!(report.signals[0].sentiment, SentimentLabel::Neutral);
    }

    #[tokio::test]
    async fn test_threshold_filters_spikes() {
        let report = scanner()
            .with_source(FakeSource::ok(
                "4chan",
                "threads",
                vec![post(Platform::FourChan, "$ETH thread", "no tags", "https://4chan/2")],
            ))
            .scan_with_threshold(3)
            .await;

        assert!(report.signals.is_empty());
        assert!(report.logs.contains(&"No ticker spikes detected.".to_string()));
        assert!(report.logs.contains(&"Unique tickers mentioned: 1".to_string()));
        assert_eq!(report.logs.last().unwrap(), "Charts retrieved: 0");
    }

    #[tokio::test]
    async fn test_chart_errors_are_logged() {
        let report = scanner()
            .with_source(FakeSource::ok(
                "Reddit",
                "posts",
                vec![post(Platform::Reddit, "$WOOF", "", "https://reddit/3")],
            ))
            .with_price_history(Arc::new(FakePrices))
            .scan()
            .await;

        assert!(report.charts.is_empty());
        assert!(report
            .logs
            .contains(&"Chart error for $WOOF: No data: WOOF not listed".to_string()));
    }

    #[tokio::test]
    async fn test_charts_can_be_disabled() {
        let settings = ScanSettings {
            charts_enabled: false,
            ..ScanSettings::default()
        };
        let report = scanner()
            .with_source(FakeSource::ok(
                "Reddit",
                "posts",
                vec![post(Platform::Reddit, "$NVDA", "", "https://reddit/4")],
            ))
            .with_price_history(Arc::new(FakePrices))
            .with_settings(settings)
            .scan()
            .await;

        assert_eq!(report.signals.len(), 1);
        assert!(report.charts.is_empty());
    }

    #[tokio::test]
    async fn test_enrichment_preserves_order() {
        let posts: Vec<Post> = (0..20)
            .map(|i| post(Platform::Reddit, &format!("post {}", i), "", &format!("u{}", i)))
            .collect();
        let scanner = scanner().with_settings(ScanSettings {
            enrich_concurrency: 4,
            ..ScanSettings::default()
        });

        let enriched = scanner.enrich_all(posts).await;
        let summaries: Vec<String> = enriched.iter().map(|p| p.summary.clone()).collect();
        let expected: Vec<String> = (0..20).map(|i| format!("post {}", i)).collect();
        assert_eq!(summaries, expected);
    }
}
