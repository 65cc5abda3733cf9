/// Cron jobs and scheduled tasks module
///
/// Contains background jobs that run on a schedule:
/// - Intraday quote polling into the raw sample table
/// - Daily rollup and raw sample retention

pub mod daily_rollup_job;
pub mod ingest_job;

pub use daily_rollup_job::DailyRollupJob;
pub use ingest_job::{IngestJob, PollReport};
