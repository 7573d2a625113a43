//! Scan Routes
//!
//! The dashboard's two endpoints: a liveness probe and the on-demand scan
//! that returns the signal feed and chart data.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use signal_core::ScanReport;

use crate::request_id::RequestId;
use crate::{AppError, AppState};

const THRESHOLD_ERROR: &str = "threshold must be an integer of at least 1";

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScanQuery {
    /// Override the configured spike threshold (minimum mentions, at least 1)
    pub threshold: Option<usize>,
}

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/scan", get(scan))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Scan"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        time: format!("{}Z", Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f")),
    })
}

#[utoipa::path(
    get,
    path = "/scan",
    params(ScanQuery),
    responses(
        (status = 200, description = "Scan logs, spike signals and price charts", body = ScanReport),
        (status = 400, description = "Invalid threshold")
    ),
    tag = "Scan"
)]
pub async fn scan(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    query: Result<Query<ScanQuery>, QueryRejection>,
) -> Result<Json<ScanReport>, AppError> {
    let Query(query) = query.map_err(|_| AppError::BadRequest(THRESHOLD_ERROR.to_string()))?;
    let threshold = match query.threshold {
        Some(0) => {
            return Err(AppError::BadRequest(THRESHOLD_ERROR.to_string()));
        }
        Some(t) => t,
        None => state.scanner.settings().spike_threshold,
    };

    tracing::info!(request_id = %request_id, threshold, "Scan requested");
    let report = state.scanner.scan_with_threshold(threshold).await;
    tracing::info!(
        request_id = %request_id,
        signals = report.signals.len(),
        charts = report.charts.len(),
        "Scan finished"
    );

    Ok(Json(report))
}
