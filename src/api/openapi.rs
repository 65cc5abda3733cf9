use utoipa::OpenApi;

use crate::api::{dashboard_handlers, handlers};
use crate::api::responses::*;
use crate::database::models::{DailySummary, RawSample};
use crate::rollup::{Mover, RollupResult};

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Market Rollup API",
        version = "1.0.0",
        description = "Intraday samples, daily OHLCV summaries and the rollup/retention job"
    ),
    paths(
        handlers::health_check,
        dashboard_handlers::get_symbols,
        dashboard_handlers::get_latest_samples,
        dashboard_handlers::get_symbol_samples,
        dashboard_handlers::get_daily_summaries,
        dashboard_handlers::get_symbol_history,
        dashboard_handlers::get_movers,
        dashboard_handlers::run_rollup,
    ),
    components(
        schemas(
            RawSample,
            DailySummary,
            Mover,
            MoversResponse,
            RollupResult,
            HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Samples", description = "Intraday raw samples"),
        (name = "Daily", description = "Daily summaries and movers"),
        (name = "Rollup", description = "Rollup and retention job"),
    )
)]
pub struct ApiDoc;
