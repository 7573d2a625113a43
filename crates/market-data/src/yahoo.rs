use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use signal_core::{ChartPoint, ScanError};
use std::time::Duration;

use crate::{build_http_client, check_status};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Keyless client for Yahoo's chart endpoint
#[derive(Clone)]
pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: String,
    range: String,
    interval: String,
}

impl YahooChartClient {
    /// One trading day of 15-minute bars
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: build_http_client(timeout),
            base_url: BASE_URL.to_string(),
            range: "1d".to_string(),
            interval: "15m".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Intraday bars for `symbol`. A symbol Yahoo does not list yields an
    /// empty series rather than an error.
    pub async fn intraday(&self, symbol: &str) -> Result<Vec<ChartPoint>, ScanError> {
        let symbol = symbol.trim_start_matches('$').to_uppercase();
        let url = format!("{}/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", self.range.as_str()), ("interval", self.interval.as_str())])
            .send()
            .await
            .map_err(|e| ScanError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Yahoo has no chart for {}", symbol);
            return Ok(Vec::new());
        }

        let chart: ChartResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ScanError::InvalidResponse(e.to_string()))?;

        chart_points(chart)
    }
}

/// Pair timestamps with closes, skipping intervals without a close, and
/// render times in the exchange's local clock.
fn chart_points(chart: ChartResponse) -> Result<Vec<ChartPoint>, ScanError> {
    if let Some(err) = chart.chart.error {
        if err.is_unknown_symbol() {
            return Ok(Vec::new());
        }
        return Err(ScanError::NoData(err.description.unwrap_or(err.code)));
    }

    let Some(result) = chart.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = FixedOffset::east_opt(result.meta.gmtoffset).unwrap_or_else(|| Utc.fix());

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    Ok(result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let price = close?;
            let local = DateTime::from_timestamp(ts, 0)?.with_timezone(&offset);
            Some(ChartPoint {
                time: local.format("%H:%M").to_string(),
                price,
            })
        })
        .collect())
}

// Response structures

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl ChartError {
    fn is_unknown_symbol(&self) -> bool {
        self.code == "Not Found"
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.starts_with("No data found"))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
