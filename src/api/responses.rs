use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::rollup::Mover;

/// Service health
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "healthy" when the database answers, "degraded" otherwise
    pub status: String,
    pub database: bool,
    pub timestamp: String,
}

/// Top gainers and losers for one trading day
#[derive(Debug, Serialize, ToSchema)]
pub struct MoversResponse {
    pub trade_date: NaiveDate,
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
