use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Daily OHLCV summary - one row per (symbol, trading day)
///
/// Written by the rollup job with an upsert on the `(symbol, trade_date)`
/// primary key, read by the dashboard API.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::daily_summaries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DailySummary {
    pub symbol: String,

    pub trade_date: NaiveDate,

    /// Open of the first sample of the day
    #[schema(value_type = String, example = "100.00")]
    pub open_price: Decimal,

    /// Highest high of the day
    #[schema(value_type = String, example = "105.00")]
    pub high_price: Decimal,

    /// Lowest low of the day
    #[schema(value_type = String, example = "99.00")]
    pub low_price: Decimal,

    /// Close of the last sample of the day
    #[schema(value_type = String, example = "105.00")]
    pub close_price: Decimal,

    /// Sum of sample volumes
    pub volume: i64,

    /// Mean of the last 5 daily closes, inclusive; null below 5 points
    #[schema(value_type = Option<String>)]
    pub ma_5: Option<Decimal>,

    /// Mean of the last 10 daily closes, inclusive; null below 10 points
    #[schema(value_type = Option<String>)]
    pub ma_10: Option<Decimal>,
}

impl DailySummary {
    /// Intraday change as a percentage of the open
    ///
    /// Returns `None` when the open is zero.
    pub fn pct_change(&self) -> Option<Decimal> {
        if self.open_price.is_zero() {
            return None;
        }
        Some((self.close_price - self.open_price) / self.open_price * Decimal::ONE_HUNDRED)
    }

    /// Day range (high - low)
    pub fn range(&self) -> Decimal {
        self.high_price - self.low_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_summary(open: Decimal, close: Decimal) -> DailySummary {
        DailySummary {
            symbol: "TCS".to_string(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open_price: open,
            high_price: open.max(close) + dec!(1),
            low_price: open.min(close) - dec!(1),
            close_price: close,
            volume: 1000,
            ma_5: None,
            ma_10: None,
        }
    }

    #[test]
    fn test_pct_change() {
        let summary = create_test_summary(dec!(100), dec!(105));
        assert_eq!(summary.pct_change(), Some(dec!(5)));

        let summary = create_test_summary(dec!(200), dec!(190));
        assert_eq!(summary.pct_change(), Some(dec!(-5)));
    }

    #[test]
    fn test_pct_change_zero_open() {
        let summary = create_test_summary(dec!(0), dec!(5));
        assert_eq!(summary.pct_change(), None);
    }

    #[test]
    fn test_range() {
        let summary = create_test_summary(dec!(100), dec!(105));
        assert_eq!(summary.range(), dec!(7));
    }
}
