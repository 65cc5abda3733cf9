/// Repository traits and their PostgreSQL implementations
///
/// Callers depend on the traits; the rollup job and the dashboard are
/// exercised in tests against the in-memory store in `crate::testing`.

pub mod daily_summary_repository;
pub mod raw_sample_repository;

pub use daily_summary_repository::{DailySummaryRepository, DailySummaryRepositoryImpl};
pub use raw_sample_repository::{RawSampleRepository, RawSampleRepositoryImpl};
