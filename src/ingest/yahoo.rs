//! Yahoo Finance chart provider.
//!
//! Fetches today's 2-minute bars from the v8 chart API and keeps the most
//! recent bar that has a close. Bar times are shifted by the exchange's GMT
//! offset so stored timestamps are in the exchange's local frame.

use super::provider::{ProviderError, QuoteProvider};
use crate::database::models::NewRawSample;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Decimal places kept for polled prices (matches the column scale)
const PRICE_SCALE: u32 = 4;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance chart API provider
pub struct YahooChartProvider {
    client: reqwest::Client,
    base_url: String,
    symbol_suffix: String,
}

impl YahooChartProvider {
    /// Build a provider against `base_url` (e.g. `https://query2.finance.yahoo.com`)
    ///
    /// `symbol_suffix` is appended to every ticker, e.g. `.NS` for NSE listings.
    pub fn new(
        base_url: impl Into<String>,
        symbol_suffix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            symbol_suffix: symbol_suffix.into(),
        })
    }

    /// Chart URL for one ticker
    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::InvalidValue(format!("base url: {e}")))?;

        let ticker = format!("{}{}", symbol, self.symbol_suffix);
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidValue("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(&["v8", "finance", "chart", ticker.as_str()]);
        url.query_pairs_mut()
            .append_pair("range", "1d")
            .append_pair("interval", "2m");

        Ok(url)
    }
}

fn to_price(value: Option<f64>, field: &str) -> Result<Decimal, ProviderError> {
    let raw = value.ok_or_else(|| ProviderError::InvalidValue(format!("missing {field}")))?;
    Decimal::try_from(raw)
        .map(|d| d.round_dp(PRICE_SCALE))
        .map_err(|e| ProviderError::InvalidValue(format!("{field} {raw}: {e}")))
}

fn local_time(timestamp: i64, gmtoffset: i64) -> Result<NaiveDateTime, ProviderError> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| ProviderError::ResponseFormat(format!("invalid timestamp: {timestamp}")))
}

/// Pick the latest bar with a close out of a chart response
fn parse_latest(symbol: &str, response: ChartResponse) -> Result<NewRawSample, ProviderError> {
    let results = response.chart.result.ok_or_else(|| match response.chart.error {
        Some(err) if err.code == "Not Found" => ProviderError::NoData {
            symbol: symbol.to_string(),
        },
        Some(err) => ProviderError::ResponseFormat(format!("{}: {}", err.code, err.description)),
        None => ProviderError::ResponseFormat("empty result with no error".into()),
    })?;

    let data = results
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ResponseFormat("result array is empty".into()))?;

    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ResponseFormat("no quote data".into()))?;

    // Most recent bar with a close; the in-progress bar may still be null
    let index = (0..timestamps.len())
        .rev()
        .find(|&i| quote.close.get(i).copied().flatten().is_some())
        .ok_or_else(|| ProviderError::NoData {
            symbol: symbol.to_string(),
        })?;

    let field = |series: &[Option<f64>]| series.get(index).copied().flatten();

    let volume = quote.volume.get(index).copied().flatten().unwrap_or(0);
    let volume = i64::try_from(volume)
        .map_err(|_| ProviderError::InvalidValue(format!("volume {volume} out of range")))?;

    Ok(NewRawSample::new(
        symbol,
        local_time(timestamps[index], data.meta.gmtoffset)?,
        to_price(field(quote.open.as_slice()), "open")?,
        to_price(field(quote.high.as_slice()), "high")?,
        to_price(field(quote.low.as_slice()), "low")?,
        to_price(field(quote.close.as_slice()), "close")?,
        volume,
    ))
}

#[async_trait]
impl QuoteProvider for YahooChartProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    async fn latest_sample(&self, symbol: &str) -> Result<NewRawSample, ProviderError> {
        let url = self.chart_url(symbol)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = response.json().await.map_err(|e| {
            ProviderError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
        })?;

        parse_latest(symbol, chart)
    }
}
