/// Daily rollup and raw-sample retention
///
/// - `aggregate`: raw samples → one OHLCV row per (symbol, day)
/// - `moving_average`: trailing MA_5 / MA_10 over a symbol's daily series
/// - `movers`: top gainers / losers for the dashboard
/// - `service`: the batch job tying reads, upserts and retention together

pub mod aggregate;
pub mod errors;
pub mod moving_average;
pub mod movers;
pub mod service;

pub use aggregate::aggregate_daily;
pub use errors::RollupError;
pub use moving_average::{apply_moving_averages, MA_LONG_WINDOW, MA_SHORT_WINDOW};
pub use movers::{top_movers, Mover, Movers};
pub use service::{RollupResult, RollupService, DEFAULT_RETENTION_DAYS};
