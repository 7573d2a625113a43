//! Intraday price series for the dashboard charts.
//!
//! Equities come from the Yahoo chart endpoint. Symbols that are really
//! crypto assets fall back to CoinGecko when the equity lookup comes back
//! empty or fails.

use async_trait::async_trait;
use signal_core::{ChartPoint, PriceHistory, ScanError};
use std::time::Duration;

pub mod coingecko;
pub mod yahoo;

pub use coingecko::{coin_id, CoinGeckoClient};
pub use yahoo::YahooChartClient;

pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ScanError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(ScanError::Api {
        status: response.status().as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}

pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("Mozilla/5.0 (compatible; finview-scanner/0.1)")
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[derive(Clone)]
pub struct MarketDataClient {
    equities: YahooChartClient,
    crypto: CoinGeckoClient,
}

impl MarketDataClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            equities: YahooChartClient::new(timeout),
            crypto: CoinGeckoClient::new(timeout),
        }
    }

    /// Point both upstreams somewhere else, e.g. a local fixture server.
    pub fn with_base_urls(timeout: Duration, yahoo: &str, coingecko: &str) -> Self {
        Self {
            equities: YahooChartClient::new(timeout).with_base_url(yahoo),
            crypto: CoinGeckoClient::new(timeout).with_base_url(coingecko),
        }
    }
}

#[async_trait]
impl PriceHistory for MarketDataClient {
    async fn intraday(&self, symbol: &str) -> Result<Vec<ChartPoint>, ScanError> {
        let equity_error = match self.equities.intraday(symbol).await {
            Ok(points) if !points.is_empty() => return Ok(points),
            Ok(_) => None,
            Err(e) => Some(e),
        };

        if let Some(coin) = coin_id(symbol) {
            tracing::debug!("No equity series for {}, trying CoinGecko '{}'", symbol, coin);
            return self.crypto.market_chart(coin).await;
        }

        match equity_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}
