use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::rollup::RollupError;

use super::dashboard_handlers::DashboardState;
use super::responses::*;

/// Errors returned by the dashboard endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rollup(#[from] RollupError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Rollup(RollupError::AlreadyRunning) => StatusCode::CONFLICT,
            ApiError::Rollup(RollupError::InvalidRetention(_)) => StatusCode::BAD_REQUEST,
            ApiError::Rollup(RollupError::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Rollup(RollupError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rollup(RollupError::Task(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(
                DatabaseError::ConnectionPoolError(_) | DatabaseError::ConnectionFailed(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health and database reachability", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<DashboardState>) -> impl IntoResponse {
    let probe = state.health_probe.clone();
    let database = tokio::task::spawn_blocking(move || probe())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: if database { "healthy" } else { "degraded" }.to_string(),
        database,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(RollupError::AlreadyRunning).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RollupError::StorageUnavailable(DatabaseError::ConnectionFailed(
                "down".into()
            )))
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(RollupError::InvalidRetention(-3)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RollupError::from(DatabaseError::QueryError("syntax".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(DatabaseError::QueryError("syntax".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_message_is_passed_through() {
        let err = ApiError::from(RollupError::AlreadyRunning);
        assert_eq!(err.to_string(), "A rollup run is already in progress");
    }
}
