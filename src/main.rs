use market_rollup::database::repositories::{
    DailySummaryRepository, DailySummaryRepositoryImpl, RawSampleRepository, RawSampleRepositoryImpl,
};
use market_rollup::database::{establish_connection_pool, DatabasePool};
use market_rollup::{
    create_router, AppConfig, DailyRollupJob, DashboardState, ExchangeClock, IngestJob,
    QuoteProvider,
    RollupService, YahooChartProvider,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_rollup=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let clock = ExchangeClock::new(config.exchange_tz);

    let pool = initialize_database(&config).await?;

    let raw_repository = {
        let pool = pool.clone();
        Arc::new(RawSampleRepositoryImpl::new(move || pool.get_conn())) as Arc<dyn RawSampleRepository>
    };
    let summary_repository = {
        let pool = pool.clone();
        Arc::new(DailySummaryRepositoryImpl::new(move || pool.get_conn()))
            as Arc<dyn DailySummaryRepository>
    };

    let rollup_service = Arc::new(RollupService::new(
        raw_repository.clone(),
        summary_repository.clone(),
    ));

    let provider = Arc::new(YahooChartProvider::new(
        config.quote_base_url.clone(),
        config.symbol_suffix.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?) as Arc<dyn QuoteProvider>;

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = initialize_cron_scheduler(
        &config,
        provider,
        raw_repository.clone(),
        rollup_service.clone(),
        clock,
    )
    .await?;

    let state = DashboardState {
        raw_repository,
        summary_repository,
        rollup_service,
        retention_days: config.retention_days,
        health_probe: Arc::new(move || pool.ping()),
        clock,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("🚀 Market rollup server running on http://{}", config.bind_addr);
    tracing::info!("📊 Health check: http://{}/api/v1/health", config.bind_addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Establish the connection pool and bring the schema up to date
async fn initialize_database(config: &AppConfig) -> Result<DatabasePool, Box<dyn std::error::Error>> {
    let database_url = config
        .database_url
        .clone()
        .ok_or("DATABASE_URL must be set")?;

    tracing::info!("🗄️  Initializing PostgreSQL connection...");

    let pool_size = config.pool_size;
    let pool = tokio::task::spawn_blocking(move || establish_connection_pool(&database_url, pool_size))
        .await??;

    if config.run_migrations {
        let migrator = pool.clone();
        let applied = tokio::task::spawn_blocking(move || migrator.run_migrations()).await??;
        tracing::info!("✅ Migrations up to date ({} applied)", applied);
    }

    Ok(pool)
}

/// Register the polling and rollup jobs and start the scheduler
async fn initialize_cron_scheduler(
    config: &AppConfig,
    provider: Arc<dyn QuoteProvider>,
    raw_repository: Arc<dyn RawSampleRepository>,
    rollup_service: Arc<RollupService>,
    clock: ExchangeClock,
) -> Result<JobScheduler, Box<dyn std::error::Error>> {
    tracing::info!("⏰ Initializing cron scheduler...");

    let scheduler = JobScheduler::new().await?;

    IngestJob::new(
        provider,
        raw_repository,
        config.symbols.clone(),
        config.poll_concurrency,
    )
    .register(&scheduler, &config.poll_cron)
    .await?;

    DailyRollupJob::new(rollup_service, config.retention_days, clock)
        .register(&scheduler, &config.rollup_cron)
        .await?;

    scheduler.start().await?;

    tracing::info!("✅ Cron scheduler started successfully");
    tracing::info!("   • Poll: {} ({} symbols)", config.poll_cron, config.symbols.len());
    tracing::info!(
        "   • Rollup: {} {} (retention {} days)",
        config.rollup_cron,
        clock.timezone().name(),
        config.retention_days
    );

    Ok(scheduler)
}
