use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use signal_core::{truncate_chars, Platform, Post, PostSource, ScanError, SNIPPET_CHARS};
use std::time::Duration;

use crate::{check_status, clean_html, decode_error, http_error};

const API_BASE: &str = "https://a.4cdn.org";
const BOARD_BASE: &str = "https://boards.4channel.org";
const MAX_REPLIES: usize = 10;
const UNTITLED: &str = "Untitled Thread";

#[derive(Debug, Clone)]
pub struct ChanConfig {
    pub board: String,
    /// Root of the read-only JSON API
    pub api_base: String,
    /// Stop after this many threads have been turned into posts
    pub max_threads: usize,
    pub timeout: Duration,
}

impl Default for ChanConfig {
    fn default() -> Self {
        Self {
            board: "biz".to_string(),
            api_base: API_BASE.to_string(),
            max_threads: 80,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Read-only client for the 4chan JSON API
#[derive(Clone)]
pub struct ChanClient {
    config: ChanConfig,
    client: Client,
}

impl ChanClient {
    pub fn new(config: ChanConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ScanError> {
        let response = self.client.get(url).send().await.map_err(http_error)?;
        check_status(response).await?.json().await.map_err(decode_error)
    }

    async fn get_catalog(&self) -> Result<Vec<CatalogPage>, ScanError> {
        let url = format!("{}/{}/catalog.json", self.config.api_base, self.config.board);
        self.get_json(&url).await
    }

    async fn get_thread(&self, thread_id: u64) -> Result<ThreadResponse, ScanError> {
        let url = format!("{}/{}/thread/{}.json", self.config.api_base, self.config.board, thread_id);
        self.get_json(&url).await
    }

    /// Walk the board catalog and expand every thread that carries a `$` in
    /// its subject or opening post. An unreachable catalog yields no threads.
    pub async fn scrape(&self) -> Result<Vec<Post>, ScanError> {
        let catalog = match self.get_catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("Error loading 4chan /{}/ catalog: {}", self.config.board, e);
                return Ok(Vec::new());
            }
        };
        let mut results = Vec::new();

        for thread in catalog.iter().flat_map(|page| page.threads.iter()) {
            if results.len() >= self.config.max_threads {
                break;
            }

            let Some(thread_id) = thread.no else {
                continue;
            };

            let title = clean_html(thread.sub.as_deref().unwrap_or(""));
            let body = clean_html(thread.com.as_deref().unwrap_or(""));

            if !title.contains('$') && !body.contains('$') {
                continue;
            }

            match self.get_thread(thread_id).await {
                Ok(detail) => {
                    results.push(build_post(&self.config.board, thread_id, &title, &body, &detail.posts));
                }
                Err(e) => {
                    tracing::warn!("Error loading 4chan thread {}: {}", thread_id, e);
                }
            }
        }

        tracing::debug!("4chan /{}/ produced {} threads", self.config.board, results.len());
        Ok(results)
    }
}

#[async_trait]
impl PostSource for ChanClient {
    fn name(&self) -> &str {
        "4chan"
    }

    fn unit(&self) -> &str {
        "threads"
    }

    async fn fetch(&self) -> Result<Vec<Post>, ScanError> {
        self.scrape().await
    }
}

/// Assemble a post from an already-cleaned opening post and the raw thread.
/// The first entry in `posts` is the opening post itself and is skipped.
fn build_post(board: &str, thread_id: u64, title: &str, body: &str, posts: &[ThreadPost]) -> Post {
    let replies: Vec<String> = posts
        .iter()
        .skip(1)
        .take(MAX_REPLIES)
        .filter_map(|p| p.com.as_deref())
        .map(clean_html)
        .collect();

    let title = if title.is_empty() { UNTITLED } else { title };

    let mut parts = vec![title.to_string(), body.to_string()];
    parts.extend(replies.iter().cloned());
    let combined = parts.join("\n\n").trim().to_string();

    Post {
        platform: Platform::FourChan,
        subreddit: None,
        title: title.to_string(),
        snippet: truncate_chars(body, SNIPPET_CHARS).to_string(),
        comments: replies,
        combined,
        url: format!("{}/{}/thread/{}", BOARD_BASE, board, thread_id),
    }
}

// Response structures

#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[serde(default)]
    threads: Vec<CatalogThread>,
}

#[derive(Debug, Deserialize)]
struct CatalogThread {
    #[serde(default)]
    no: Option<u64>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    com: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    posts: Vec<ThreadPost>,
}

#[derive(Debug, Deserialize)]
struct ThreadPost {
    #[serde(default)]
    com: Option<String>,
}
