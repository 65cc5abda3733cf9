use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dashboard_handlers::*;
use super::handlers::health_check;
use super::openapi::ApiDoc;

/// Create the dashboard API router with Swagger UI
pub fn create_router(state: DashboardState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/health", get(health_check))
        // Raw samples
        .route("/api/v1/symbols", get(get_symbols))
        .route("/api/v1/samples/latest", get(get_latest_samples))
        .route("/api/v1/samples/:symbol", get(get_symbol_samples))
        // Daily summaries
        .route("/api/v1/daily", get(get_daily_summaries))
        .route("/api/v1/daily/:symbol", get(get_symbol_history))
        .route("/api/v1/movers", get(get_movers))
        // Manual trigger
        .route("/api/v1/rollup/run", post(run_rollup))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ExchangeClock, DEFAULT_EXCHANGE_TZ};
    use crate::database::models::NewRawSample;
    use crate::database::repositories::RawSampleRepository;
    use crate::rollup::RollupService;
    use crate::testing::memory::{FailingStore, MemoryStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(store: &MemoryStore) -> DashboardState {
        DashboardState {
            raw_repository: store.raw_repository(),
            summary_repository: store.summary_repository(),
            rollup_service: Arc::new(RollupService::new(
                store.raw_repository(),
                store.summary_repository(),
            )),
            retention_days: 30,
            health_probe: Arc::new(|| true),
            clock: ExchangeClock::default(),
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let at = |h, m| day.and_hms_opt(h, m, 0).unwrap();

        store
            .insert_batch(vec![
                NewRawSample::flat("TCS", at(9, 15), dec!(100), 10),
                NewRawSample::flat("TCS", at(15, 30), dec!(110), 20),
                NewRawSample::flat("INFY", at(9, 15), dec!(100), 5),
                NewRawSample::flat("INFY", at(15, 30), dec!(90), 5),
            ])
            .unwrap();
        store
    }

    async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(state(&MemoryStore::new()));
        let (status, body) = send(router, "GET", "/api/v1/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_symbols_and_latest_samples() {
        let router = create_router(state(&seeded_store()));

        let (status, body) = send(router.clone(), "GET", "/api/v1/symbols").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["INFY", "TCS"]));

        let (status, body) = send(router.clone(), "GET", "/api/v1/samples/latest?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));

        let (status, _) = send(router, "GET", "/api/v1/samples/latest?limit=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_manual_rollup_then_daily_views() {
        let store = seeded_store();
        let router = create_router(state(&store));

        let (status, body) = send(router.clone(), "POST", "/api/v1/rollup/run").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summaries_written"], 2);
        // 2024 samples are far outside a 30 day window
        assert_eq!(body["samples_deleted"], 4);
        assert!(store.raw_samples().is_empty());

        let (status, body) = send(router.clone(), "GET", "/api/v1/daily?date=2024-01-02").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["symbol"], "INFY");
        assert_eq!(rows[1]["volume"], 30);

        let (status, body) = send(router.clone(), "GET", "/api/v1/daily/tcs?limit=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["trade_date"], "2024-01-02");

        let (status, body) = send(router, "GET", "/api/v1/movers?date=2024-01-02&count=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gainers"][0]["symbol"], "TCS");
        assert_eq!(body["losers"][0]["symbol"], "INFY");
    }

    #[tokio::test]
    async fn test_manual_rollup_rejects_negative_retention() {
        let router = create_router(state(&seeded_store()));
        let (status, body) = send(router, "POST", "/api/v1/rollup/run?cutoff_days=-1").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid retention window: -1 days");
    }

    #[tokio::test]
    async fn test_storage_outage_maps_to_503() {
        let failing = Arc::new(FailingStore::reads());
        let store = MemoryStore::new();
        let mut state = state(&store);
        state.raw_repository = failing.clone();
        state.rollup_service = Arc::new(RollupService::new(failing, store.summary_repository()));
        let router = create_router(state);

        let (status, _) = send(router.clone(), "GET", "/api/v1/symbols").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(router, "POST", "/api/v1/rollup/run").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_views_follow_exchange_clock() {
        let store = seeded_store();
        let clock_at = |hour, minute| {
            ExchangeClock::fixed(
                DEFAULT_EXCHANGE_TZ,
                Utc.with_ymd_and_hms(2024, 1, 2, hour, minute, 0).unwrap(),
            )
        };

        // 10:15 UTC is 15:45 in Kolkata: only the 15:30 bars fall in the last 30 minutes
        let mut trend_state = state(&store);
        trend_state.clock = clock_at(10, 15);
        let (status, body) = send(create_router(trend_state), "GET", "/api/v1/samples/TCS?minutes=30").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["sampled_at"], "2024-01-02T15:30:00");

        // 12:00 UTC is 17:30 in Kolkata: the snapshot covers the whole session
        let mut run_state = state(&store);
        run_state.clock = clock_at(12, 0);
        let (status, body) = send(create_router(run_state), "POST", "/api/v1/rollup/run").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["snapshot"], "2024-01-02T17:30:00");
        assert_eq!(body["samples_read"], 4);
        assert_eq!(body["samples_deleted"], 0);

        // 20:00 UTC is already January 3rd in Kolkata, so "yesterday" is the 2nd
        let mut daily_state = state(&store);
        daily_state.clock = clock_at(20, 0);
        let (status, body) = send(create_router(daily_state), "GET", "/api/v1/daily").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
        assert_eq!(body[1]["close_price"], "110");
    }
}
