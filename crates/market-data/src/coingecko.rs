use chrono::DateTime;
use serde::Deserialize;
use signal_core::{ChartPoint, ScanError};
use std::time::Duration;

use crate::{build_http_client, check_status};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Cash tags that chatter uses for crypto assets, keyed by lowercase symbol
const COIN_IDS: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("sol", "solana"),
    ("link", "chainlink"),
    ("xrp", "ripple"),
    ("doge", "dogecoin"),
    ("ada", "cardano"),
    ("shib", "shiba-inu"),
];

/// CoinGecko coin id for a ticker such as `$ETH` or `eth`
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    let symbol = symbol.trim_start_matches('$').to_lowercase();
    COIN_IDS
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map(|(_, id)| *id)
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: build_http_client(timeout),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Last 24h of USD prices for a coin id
    pub async fn market_chart(&self, coin: &str) -> Result<Vec<ChartPoint>, ScanError> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, coin);

        let response = self
            .client
            .get(&url)
            .query(&[("vs_currency", "usd"), ("days", "1")])
            .send()
            .await
            .map_err(|e| ScanError::Http(e.to_string()))?;

        let chart: MarketChartResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ScanError::InvalidResponse(e.to_string()))?;

        Ok(price_points(&chart))
    }
}

fn price_points(chart: &MarketChartResponse) -> Vec<ChartPoint> {
    chart
        .prices
        .iter()
        .filter_map(|&(ms, price)| {
            let at = DateTime::from_timestamp_millis(ms as i64)?;
            Some(ChartPoint {
                time: at.format("%H:%M").to_string(),
                price,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}
