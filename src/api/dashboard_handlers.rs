use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::clock::ExchangeClock;
use crate::database::models::{DailySummary, RawSample};
use crate::database::repositories::{DailySummaryRepository, RawSampleRepository};
use crate::rollup::{top_movers, RollupResult, RollupService};

use super::handlers::ApiError;
use super::responses::*;

const MAX_LATEST_SAMPLES: i64 = 1_000;
const MAX_TREND_SAMPLES: i64 = 5_000;
const MAX_TREND_MINUTES: i64 = 24 * 60;
const MAX_HISTORY_DAYS: i64 = 3_650;
const MAX_MOVERS: i64 = 50;

/// Shared state for dashboard API handlers
#[derive(Clone)]
pub struct DashboardState {
    pub raw_repository: Arc<dyn RawSampleRepository>,
    pub summary_repository: Arc<dyn DailySummaryRepository>,
    pub rollup_service: Arc<RollupService>,
    /// Retention used by manual rollup runs without `cutoff_days`
    pub retention_days: i64,
    /// Database reachability check (blocking)
    pub health_probe: Arc<dyn Fn() -> bool + Send + Sync>,
    /// Source of "now" and default dates, in the frame of stored sample times
    pub clock: ExchangeClock,
}

/// Run a synchronous repository call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, crate::database::DatabaseError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::from)
}

fn bounded(value: i64, name: &str, max: i64) -> Result<i64, ApiError> {
    if value < 1 {
        return Err(ApiError::BadRequest(format!("{} must be at least 1", name)));
    }
    Ok(value.min(max))
}

// ============================================================================
// Symbol Endpoints
// ============================================================================

/// Symbols with raw samples on record
#[utoipa::path(
    get,
    path = "/api/v1/symbols",
    tag = "Samples",
    responses(
        (status = 200, description = "Sorted symbol list", body = Vec<String>),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn get_symbols(
    State(state): State<DashboardState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let repository = state.raw_repository.clone();
    blocking(move || repository.distinct_symbols()).await.map(Json)
}

// ============================================================================
// Raw Sample Endpoints
// ============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct LatestQueryParams {
    /// Maximum number of samples to return
    #[serde(default = "default_latest_limit")]
    pub limit: i64,
}

fn default_latest_limit() -> i64 {
    50
}

/// Most recent raw samples across all symbols
#[utoipa::path(
    get,
    path = "/api/v1/samples/latest",
    tag = "Samples",
    params(LatestQueryParams),
    responses(
        (status = 200, description = "Samples, newest first", body = Vec<RawSample>),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn get_latest_samples(
    State(state): State<DashboardState>,
    Query(params): Query<LatestQueryParams>,
) -> Result<Json<Vec<RawSample>>, ApiError> {
    let limit = bounded(params.limit, "limit", MAX_LATEST_SAMPLES)?;
    let repository = state.raw_repository.clone();
    blocking(move || repository.get_latest(limit)).await.map(Json)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendQueryParams {
    /// Look-back window in minutes
    #[serde(default = "default_trend_minutes")]
    pub minutes: i64,
    /// Maximum number of samples to return
    #[serde(default = "default_trend_limit")]
    pub limit: i64,
}

fn default_trend_minutes() -> i64 {
    30
}

fn default_trend_limit() -> i64 {
    1_000
}

/// Intraday trend for one symbol
#[utoipa::path(
    get,
    path = "/api/v1/samples/{symbol}",
    tag = "Samples",
    params(
        ("symbol" = String, Path, description = "Symbol without exchange suffix"),
        TrendQueryParams
    ),
    responses(
        (status = 200, description = "Samples in time order", body = Vec<RawSample>),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn get_symbol_samples(
    State(state): State<DashboardState>,
    Path(symbol): Path<String>,
    Query(params): Query<TrendQueryParams>,
) -> Result<Json<Vec<RawSample>>, ApiError> {
    let minutes = bounded(params.minutes, "minutes", MAX_TREND_MINUTES)?;
    let limit = bounded(params.limit, "limit", MAX_TREND_SAMPLES)?;
    let since = state.clock.now() - Duration::minutes(minutes);
    let symbol = symbol.trim().to_uppercase();

    let repository = state.raw_repository.clone();
    blocking(move || repository.get_by_symbol_since(&symbol, since, limit))
        .await
        .map(Json)
}

// ============================================================================
// Daily Summary Endpoints
// ============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateQueryParams {
    /// Trading day (YYYY-MM-DD); defaults to yesterday in exchange time
    pub date: Option<NaiveDate>,
}

/// Daily summaries for one trading day
#[utoipa::path(
    get,
    path = "/api/v1/daily",
    tag = "Daily",
    params(DateQueryParams),
    responses(
        (status = 200, description = "Summaries ordered by symbol", body = Vec<DailySummary>),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn get_daily_summaries(
    State(state): State<DashboardState>,
    Query(params): Query<DateQueryParams>,
) -> Result<Json<Vec<DailySummary>>, ApiError> {
    let date = params.date.unwrap_or_else(|| state.clock.yesterday());
    let repository = state.summary_repository.clone();
    blocking(move || repository.get_by_date(date)).await.map(Json)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQueryParams {
    /// Maximum number of days to return
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    30
}

/// Summary history for one symbol
#[utoipa::path(
    get,
    path = "/api/v1/daily/{symbol}",
    tag = "Daily",
    params(
        ("symbol" = String, Path, description = "Symbol without exchange suffix"),
        HistoryQueryParams
    ),
    responses(
        (status = 200, description = "Summaries, newest first", body = Vec<DailySummary>),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn get_symbol_history(
    State(state): State<DashboardState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<Vec<DailySummary>>, ApiError> {
    let limit = bounded(params.limit, "limit", MAX_HISTORY_DAYS)?;
    let symbol = symbol.trim().to_uppercase();

    let repository = state.summary_repository.clone();
    blocking(move || repository.get_by_symbol(&symbol, limit))
        .await
        .map(Json)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MoversQueryParams {
    /// Trading day (YYYY-MM-DD); defaults to yesterday in exchange time
    pub date: Option<NaiveDate>,
    /// Entries per side
    #[serde(default = "default_movers_count")]
    pub count: i64,
}

fn default_movers_count() -> i64 {
    5
}

/// Top gainers and losers by open-to-close change
#[utoipa::path(
    get,
    path = "/api/v1/movers",
    tag = "Daily",
    params(MoversQueryParams),
    responses(
        (status = 200, description = "Gainers and losers", body = MoversResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn get_movers(
    State(state): State<DashboardState>,
    Query(params): Query<MoversQueryParams>,
) -> Result<Json<MoversResponse>, ApiError> {
    let count = bounded(params.count, "count", MAX_MOVERS)? as usize;
    let date = params.date.unwrap_or_else(|| state.clock.yesterday());

    let repository = state.summary_repository.clone();
    let rows = blocking(move || repository.get_by_date(date)).await?;
    let movers = top_movers(&rows, count);

    Ok(Json(MoversResponse {
        trade_date: date,
        gainers: movers.gainers,
        losers: movers.losers,
    }))
}

// ============================================================================
// Rollup Endpoints
// ============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct RollupQueryParams {
    /// Retention window in days; defaults to the configured value
    pub cutoff_days: Option<i64>,
}

/// Run the rollup and retention job now
#[utoipa::path(
    post,
    path = "/api/v1/rollup/run",
    tag = "Rollup",
    params(RollupQueryParams),
    responses(
        (status = 200, description = "Run summary", body = RollupResult),
        (status = 400, description = "Invalid retention window", body = ErrorResponse),
        (status = 409, description = "A run is already in progress", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn run_rollup(
    State(state): State<DashboardState>,
    Query(params): Query<RollupQueryParams>,
) -> Result<Json<RollupResult>, ApiError> {
    let cutoff_days = params.cutoff_days.unwrap_or(state.retention_days);
    let now = state.clock.now();

    tracing::info!("Manual rollup requested (retention: {} days)", cutoff_days);

    let result = state
        .rollup_service
        .clone()
        .run_blocking(now, cutoff_days)
        .await?;

    Ok(Json(result))
}
