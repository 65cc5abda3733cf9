//! Quote provider trait and structured error types.
//!
//! The polling job only sees this trait, so the HTTP provider can be swapped
//! for a canned one in tests.

use crate::database::models::NewRawSample;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while fetching a quote for one symbol
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("no data for symbol: {symbol}")]
    NoData { symbol: String },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Source of the latest intraday bar for a symbol
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Latest completed bar for `symbol`, as a sample ready for insertion
    async fn latest_sample(&self, symbol: &str) -> Result<NewRawSample, ProviderError>;
}
