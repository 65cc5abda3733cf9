// Library Crate Root
// lib.rs

// main.rs and the one-shot binaries import through lib.rs like an external crate
pub mod api;
pub mod clock;
pub mod config;
pub mod database;
pub mod ingest;
pub mod jobs;
pub mod rollup;
pub mod testing;

// pub use = re-export at crate root
pub use api::{create_router, DashboardState};
pub use clock::ExchangeClock;
pub use config::AppConfig;
pub use database::{DatabaseError, DatabasePool};
pub use ingest::{QuoteProvider, YahooChartProvider};
pub use jobs::{DailyRollupJob, IngestJob};
pub use rollup::{RollupError, RollupResult, RollupService};
