use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use signal_core::{truncate_chars, Platform, Post, PostSource, ScanError, SNIPPET_CHARS};
use std::collections::VecDeque;
use std::time::Duration;

use crate::{check_status, decode_error, http_error};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const WEB_BASE: &str = "https://www.reddit.com";
const MAX_COMMENTS: usize = 10;

pub const DEFAULT_SUBREDDITS: &[&str] = &["wallstreetbets", "stocks", "investing", "cryptocurrency"];

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub subreddits: Vec<String>,
    /// Size of the `hot` listing requested per subreddit
    pub limit_per_sub: u32,
    pub timeout: Duration,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: "finview-scanner/0.1".to_string(),
            subreddits: DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
            limit_per_sub: 25,
            timeout: Duration::from_secs(10),
        }
    }
}

impl RedditConfig {
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Application-only OAuth client for the Reddit listing API
#[derive(Clone)]
pub struct RedditClient {
    config: RedditConfig,
    client: Client,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Self {
        let user_agent = if config.user_agent.is_empty() {
            RedditConfig::default().user_agent
        } else {
            config.user_agent.clone()
        };

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    async fn access_token(&self) -> Result<String, ScanError> {
        let response = self
            .client
            .post(AUTH_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(http_error)?;

        let token: TokenResponse = check_status(response).await?.json().await.map_err(decode_error)?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ScanError::InvalidResponse(token.error.unwrap_or_else(|| "no access token".to_string())))
    }

    async fn get_json(&self, token: &str, path: &str, query: &[(&str, String)]) -> Result<Value, ScanError> {
        let response = self
            .client
            .get(format!("{}{}", API_BASE, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(http_error)?;

        check_status(response).await?.json().await.map_err(decode_error)
    }

    async fn load_comments(&self, token: &str, submission_id: &str) -> Result<Vec<String>, ScanError> {
        let path = format!("/comments/{}", submission_id);
        let thread = self
            .get_json(token, &path, &[("limit", "50".to_string()), ("raw_json", "1".to_string())])
            .await?;

        // [submission listing, comment listing]
        Ok(thread
            .get(1)
            .map(|listing| flatten_comments(listing, MAX_COMMENTS))
            .unwrap_or_default())
    }

    async fn scrape_subreddit(&self, token: &str, subreddit: &str) -> Result<Vec<Post>, ScanError> {
        let path = format!("/r/{}/hot", subreddit);
        let raw = self
            .get_json(
                token,
                &path,
                &[("limit", self.config.limit_per_sub.to_string()), ("raw_json", "1".to_string())],
            )
            .await?;

        let listing: Listing = serde_json::from_value(raw)
            .map_err(|e| ScanError::InvalidResponse(format!("r/{} listing: {}", subreddit, e)))?;

        let mut posts = Vec::new();
        for child in listing.data.children {
            let submission = child.data;
            if !is_candidate(&submission) {
                continue;
            }

            let comments = match self.load_comments(token, &submission.id).await {
                Ok(comments) => comments,
                Err(e) => {
                    tracing::debug!("Comments unavailable for {}: {}", submission.id, e);
                    Vec::new()
                }
            };

            posts.push(build_post(subreddit, &submission, comments));
        }

        Ok(posts)
    }

    /// Scrape every configured subreddit. A subreddit that fails is logged
    /// and skipped; missing credentials fail the whole source.
    pub async fn scrape(&self) -> Result<Vec<Post>, ScanError> {
        if !self.config.has_credentials() {
            return Err(ScanError::MissingCredentials(
                "Reddit API credentials missing. Set REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET.".to_string(),
            ));
        }

        let token = self.access_token().await?;
        let mut results = Vec::new();

        for subreddit in &self.config.subreddits {
            match self.scrape_subreddit(&token, subreddit).await {
                Ok(posts) => {
                    tracing::debug!("r/{} produced {} posts", subreddit, posts.len());
                    results.extend(posts);
                }
                Err(e) => {
                    tracing::warn!("Error scraping subreddit {}: {}", subreddit, e);
                }
            }
        }

        Ok(results)
    }
}

#[async_trait]
impl PostSource for RedditClient {
    fn name(&self) -> &str {
        "Reddit"
    }

    fn unit(&self) -> &str {
        "posts"
    }

    async fn fetch(&self) -> Result<Vec<Post>, ScanError> {
        self.scrape().await
    }
}

/// Stickied announcements and posts without any `$` are not worth a
/// comment fetch.
fn is_candidate(submission: &Submission) -> bool {
    !submission.stickied && (submission.title.contains('$') || submission.selftext.contains('$'))
}

fn build_post(subreddit: &str, submission: &Submission, comments: Vec<String>) -> Post {
    let title = submission.title.as_str();
    let body = submission.selftext.as_str();
    let snippet_source = if body.is_empty() { title } else { body };

    let mut parts = vec![title.to_string(), body.to_string()];
    parts.extend(comments.iter().cloned());
    let combined = parts.join("\n\n").trim().to_string();

    Post {
        platform: Platform::Reddit,
        subreddit: Some(subreddit.to_string()),
        title: title.to_string(),
        snippet: truncate_chars(snippet_source, SNIPPET_CHARS).to_string(),
        comments,
        combined,
        url: format!("{}{}", WEB_BASE, submission.permalink),
    }
}

/// Breadth-first walk over a comment listing. The first `max` comments are
/// taken and those with an empty body dropped, so fewer than `max` may come
/// back. `more` stubs are ignored.
fn flatten_comments(listing: &Value, max: usize) -> Vec<String> {
    let mut queue: VecDeque<&Value> = children(listing).collect();
    let mut bodies = Vec::new();
    let mut taken = 0;

    while let Some(node) = queue.pop_front() {
        if taken >= max {
            break;
        }
        if node.get("kind").and_then(Value::as_str) != Some("t1") {
            continue;
        }
        taken += 1;

        let data = &node["data"];
        if let Some(body) = data.get("body").and_then(Value::as_str) {
            if !body.is_empty() {
                bodies.push(body.to_string());
            }
        }
        // `replies` is an empty string when there are none
        if let Some(replies) = data.get("replies") {
            queue.extend(children(replies));
        }
    }

    bodies
}

fn children(listing: &Value) -> impl Iterator<Item = &Value> {
    listing
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

// Response structures

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Submission,
}

#[derive(Debug, Deserialize)]
struct Submission {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    permalink: String,
}
