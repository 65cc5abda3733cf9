pub mod daily_summary;
pub mod raw_sample;

pub use daily_summary::DailySummary;
pub use raw_sample::{NewRawSample, RawSample};
