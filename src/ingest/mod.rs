/// Market-data ingestion
///
/// - `provider`: the `QuoteProvider` seam and its error type
/// - `yahoo`: Yahoo Finance chart API client
/// - `symbols`: the polled symbol universe

pub mod provider;
pub mod symbols;
pub mod yahoo;

pub use provider::{ProviderError, QuoteProvider};
pub use symbols::{default_universe, parse_symbol_list};
pub use yahoo::YahooChartProvider;
