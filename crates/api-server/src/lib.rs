use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use llm_client::{LlmConfig, OpenAiSummarizer};
use market_data::MarketDataClient;
use sentiment_analysis::SentimentAnalysisEngine;
use serde::Serialize;
use signal_core::{ChartPoint, ScanReport, SentimentLabel, Signal};
use signal_engine::{ScanSettings, Scanner};
use social_client::{ChanClient, ChanConfig, RedditClient, RedditConfig};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod request_id;
pub mod scan_routes;

use config::ServerConfig;
use request_id::request_id_middleware;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
}

/// Envelope for error bodies
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "FinView Signal Scanner", description = "Ticker spike signals from social chatter"),
    paths(scan_routes::health, scan_routes::scan),
    components(schemas(ScanReport, Signal, ChartPoint, SentimentLabel, scan_routes::HealthResponse)),
    tags((name = "Scan", description = "On-demand social scan"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(scan_routes::scan_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire the production clients into a scanner.
pub fn build_scanner(config: &ServerConfig) -> Scanner {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let reddit = RedditClient::new(RedditConfig {
        client_id: config.reddit_client_id.clone(),
        client_secret: config.reddit_client_secret.clone(),
        user_agent: config.reddit_user_agent.clone(),
        subreddits: config.reddit_subreddits.clone(),
        limit_per_sub: config.reddit_limit_per_sub,
        timeout,
    });

    let chan = ChanClient::new(ChanConfig {
        board: config.chan_board.clone(),
        max_threads: config.chan_max_threads,
        timeout,
        ..ChanConfig::default()
    });

    let summarizer = OpenAiSummarizer::new(LlmConfig {
        api_key: config.openai_api_key.clone(),
        model: config.openai_model.clone(),
        ..LlmConfig::default()
    });

    Scanner::new(Arc::new(summarizer), Arc::new(SentimentAnalysisEngine::new()))
        .with_source(Arc::new(reddit))
        .with_source(Arc::new(chan))
        .with_price_history(Arc::new(MarketDataClient::new(timeout)))
        .with_settings(ScanSettings {
            spike_threshold: config.spike_threshold,
            enrich_concurrency: config.enrich_concurrency,
            charts_enabled: config.charts_enabled,
        })
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }
    tracing::info!(
        "Sources: r/{} (limit {}), 4chan /{}/ (max {} threads); spike threshold {}",
        config.reddit_subreddits.join(", r/"),
        config.reddit_limit_per_sub,
        config.chan_board,
        config.chan_max_threads,
        config.spike_threshold
    );

    let state = AppState {
        scanner: Arc::new(build_scanner(&config)),
    };
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("FinView scanner listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use signal_core::{Platform, Post, PostSource, ScanError};
    use tower::ServiceExt;

    struct OneThread;

    #[async_trait]
    impl PostSource for OneThread {
        fn name(&self) -> &str {
            "4chan"
        }

        fn unit(&self) -> &str {
            "threads"
        }

        async fn fetch(&self) -> Result<Vec<Post>, ScanError> {
            Ok(vec![Post {
                platform: Platform::FourChan,
                subreddit: None,
                title: "$LINK general".to_string(),
                snippet: "$LINK marines report in".to_string(),
                comments: vec![],
                combined: "$LINK general\n\n$LINK marines report in".to_string(),
                url: "https://boards.4channel.org/biz/thread/1".to_string(),
            }])
        }
    }

    fn test_app() -> Router {
        let scanner = Scanner::new(
            Arc::new(OpenAiSummarizer::new(LlmConfig::default())),
            Arc::new(SentimentAnalysisEngine::new()),
        )
        .with_source(Arc::new(OneThread));

        build_router(AppState {
            scanner: Arc::new(scanner),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Response<()>, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, Response::from_parts(parts, ()), value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = get_json(test_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["time"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_scan_returns_report() {
        let (status, response, body) = get_json(test_app(), "/scan").await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let signals = body["signals"].as_array().unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0]["spike_tickers"][0], "$LINK");
        assert_eq!(signals[0]["title"], "$LINK mentioned 4 times across 4chan");
        assert!(signals[0]["summary"].as_str().unwrap().ends_with("..."));
        assert!(body["charts"].as_object().unwrap().is_empty());
        assert_eq!(body["logs"][1], "4chan threads fetched: 1");
    }

    #[tokio::test]
    async fn test_scan_threshold_override() {
        let (status, _, body) = get_json(test_app(), "/scan?threshold=5").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["signals"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_rejects_invalid_threshold() {
        for uri in ["/scan?threshold=0", "/scan?threshold=-1", "/scan?threshold=abc"] {
            let (status, response, body) = get_json(test_app(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(response.headers().contains_key("x-request-id"));
            assert_eq!(body["success"], false, "{}", uri);
            assert_eq!(body["error"], "threshold must be an integer of at least 1", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, _, body) = get_json(test_app(), "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/scan"].is_object());
        assert!(body["paths"]["/health"].is_object());
    }
}
