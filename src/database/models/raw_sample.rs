use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw sample entity - one polled OHLCV observation for one symbol
///
/// `sampled_at` is a naive timestamp in the exchange's local frame; the
/// calendar day of a sample is its plain truncation.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::raw_samples)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(primary_key(id))]
pub struct RawSample {
    /// Auto-incrementing ID
    pub id: i64,

    /// Ticker symbol without exchange suffix (e.g., "TCS")
    pub symbol: String,

    /// Time of the observation (exchange-local, no timezone)
    pub sampled_at: NaiveDateTime,

    #[schema(value_type = String, example = "3512.40")]
    pub open_price: Decimal,

    #[schema(value_type = String, example = "3520.00")]
    pub high_price: Decimal,

    #[schema(value_type = String, example = "3508.15")]
    pub low_price: Decimal,

    #[schema(value_type = String, example = "3515.85")]
    pub close_price: Decimal,

    /// Traded volume in the polled bar
    pub volume: i64,

    /// When this record was inserted into database
    pub created_at: DateTime<Utc>,
}

impl RawSample {
    /// Calendar day this sample belongs to
    pub fn trade_date(&self) -> NaiveDate {
        self.sampled_at.date()
    }
}

/// New raw sample for batch insertion
#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::raw_samples)]
pub struct NewRawSample {
    pub symbol: String,
    pub sampled_at: NaiveDateTime,
    #[schema(value_type = String)]
    pub open_price: Decimal,
    #[schema(value_type = String)]
    pub high_price: Decimal,
    #[schema(value_type = String)]
    pub low_price: Decimal,
    #[schema(value_type = String)]
    pub close_price: Decimal,
    pub volume: i64,
}

impl NewRawSample {
    /// Create a new raw sample
    pub fn new(
        symbol: impl Into<String>,
        sampled_at: NaiveDateTime,
        open_price: Decimal,
        high_price: Decimal,
        low_price: Decimal,
        close_price: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            sampled_at,
            open_price,
            high_price,
            low_price,
            close_price,
            volume,
        }
    }

    /// Single-price sample (open = high = low = close)
    pub fn flat(symbol: impl Into<String>, sampled_at: NaiveDateTime, price: Decimal, volume: i64) -> Self {
        Self::new(symbol, sampled_at, price, price, price, price, volume)
    }

    /// Materialize as a stored row with the given id
    pub fn into_stored(self, id: i64, created_at: DateTime<Utc>) -> RawSample {
        RawSample {
            id,
            symbol: self.symbol,
            sampled_at: self.sampled_at,
            open_price: self.open_price,
            high_price: self.high_price,
            low_price: self.low_price,
            close_price: self.close_price,
            volume: self.volume,
            created_at,
        }
    }
}
