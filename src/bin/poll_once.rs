use market_rollup::database::establish_connection_pool;
use market_rollup::database::repositories::RawSampleRepositoryImpl;
use market_rollup::{AppConfig, IngestJob, YahooChartProvider};
use std::sync::Arc;
use std::time::Duration;

/// Poll every configured symbol once and store the samples
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();

    let database_url = config.database_url.clone().ok_or("DATABASE_URL must be set")?;
    let pool = establish_connection_pool(&database_url, config.pool_size)?;
    if config.run_migrations {
        pool.run_migrations()?;
    }

    let provider = YahooChartProvider::new(
        config.quote_base_url.clone(),
        config.symbol_suffix.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?;

    let job = IngestJob::new(
        Arc::new(provider),
        Arc::new(RawSampleRepositoryImpl::new(move || pool.get_conn())),
        config.symbols.clone(),
        config.poll_concurrency,
    );

    println!("📡 Polling {} symbols...", config.symbols.len());

    let report = job.run_now().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
