use market_rollup::database::establish_connection_pool;
use market_rollup::database::repositories::{DailySummaryRepositoryImpl, RawSampleRepositoryImpl};
use market_rollup::{AppConfig, ExchangeClock, RollupService};
use std::sync::Arc;

/// Run the daily rollup and retention job once and print the result
///
/// Usage: rollup_once [cutoff_days]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    let cutoff_days = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<i64>()
            .map_err(|e| format!("invalid cutoff_days {:?}: {}", arg, e))?,
        None => config.retention_days,
    };

    let database_url = config.database_url.clone().ok_or("DATABASE_URL must be set")?;
    let pool = establish_connection_pool(&database_url, config.pool_size)?;
    if config.run_migrations {
        pool.run_migrations()?;
    }

    let raw_pool = pool.clone();
    let summary_pool = pool.clone();
    let service = Arc::new(RollupService::new(
        Arc::new(RawSampleRepositoryImpl::new(move || raw_pool.get_conn())),
        Arc::new(DailySummaryRepositoryImpl::new(move || summary_pool.get_conn())),
    ));

    println!("📦 Rolling up raw samples (retention: {} days)...", cutoff_days);

    let result = service
        .run_blocking(ExchangeClock::new(config.exchange_tz).now(), cutoff_days)
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
