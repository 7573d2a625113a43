use anyhow::{bail, Context, Result};
use social_client::DEFAULT_SUBREDDITS;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    // Summarization
    pub openai_api_key: String,
    pub openai_model: String,

    // Reddit application-only OAuth
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    pub reddit_subreddits: Vec<String>,
    pub reddit_limit_per_sub: u32,

    // 4chan
    pub chan_board: String,
    pub chan_max_threads: usize,

    // Scan behaviour
    pub spike_threshold: usize,
    pub enrich_concurrency: usize,
    pub charts_enabled: bool,
    pub http_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 5000)?,

            openai_api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4".to_string()),

            reddit_client_id: get("REDDIT_CLIENT_ID").unwrap_or_default(),
            reddit_client_secret: get("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            reddit_user_agent: get("REDDIT_USER_AGENT").unwrap_or_default(),
            reddit_subreddits: get("REDDIT_SUBREDDITS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect()),
            reddit_limit_per_sub: parse_or(&get, "REDDIT_LIMIT_PER_SUB", 25)?,

            chan_board: get("CHAN_BOARD").unwrap_or_else(|| "biz".to_string()),
            chan_max_threads: parse_or(&get, "CHAN_MAX_THREADS", 60)?,

            spike_threshold: parse_or(&get, "SPIKE_THRESHOLD", 1)?,
            enrich_concurrency: parse_or(&get, "ENRICH_CONCURRENCY", 8)?,
            charts_enabled: parse_or(&get, "CHARTS_ENABLED", true)?,
            http_timeout_secs: parse_or(&get, "HTTP_TIMEOUT_SECS", 10)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.spike_threshold == 0 {
            bail!("SPIKE_THRESHOLD must be at least 1");
        }
        if self.enrich_concurrency == 0 {
            bail!("ENRICH_CONCURRENCY must be at least 1");
        }
        if self.http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be at least 1");
        }
        if self.reddit_subreddits.is_empty() {
            bail!("REDDIT_SUBREDDITS must name at least one subreddit");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Degraded-mode notices worth printing at startup
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.openai_api_key.is_empty() {
            warnings.push("OPENAI_API_KEY is not set. GPT summaries will fall back to truncated text.");
        }
        if self.reddit_client_id.is_empty() || self.reddit_client_secret.is_empty() {
            warnings.push("Reddit credentials are not set. Reddit scraping will fail until you configure them.");
        }
        warnings
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
