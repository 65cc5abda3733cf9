use crate::database::models::DailySummary;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// One symbol's open-to-close move on a trading day
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Mover {
    pub symbol: String,
    #[schema(value_type = String, example = "100.00")]
    pub open_price: Decimal,
    #[schema(value_type = String, example = "105.00")]
    pub close_price: Decimal,
    /// (close - open) / open * 100, rounded to 2 places
    #[schema(value_type = String, example = "5.00")]
    pub pct_change: Decimal,
}

/// Top gainers and losers for a day
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Movers {
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
}

/// Rank summaries by percentage change and keep `count` from each end
///
/// Rows with a zero open have no defined change and are skipped. Ties are
/// ordered by symbol so the output is stable.
pub fn top_movers(rows: &[DailySummary], count: usize) -> Movers {
    let mut ranked: Vec<Mover> = rows
        .iter()
        .filter_map(|row| {
            row.pct_change().map(|pct| Mover {
                symbol: row.symbol.clone(),
                open_price: row.open_price,
                close_price: row.close_price,
                pct_change: pct.round_dp(2),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.pct_change
            .cmp(&a.pct_change)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    let gainers = ranked.iter().take(count).cloned().collect();

    ranked.sort_by(|a, b| {
        a.pct_change
            .cmp(&b.pct_change)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    let losers = ranked.into_iter().take(count).collect();

    Movers { gainers, losers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn row(symbol: &str, open: Decimal, close: Decimal) -> DailySummary {
        DailySummary {
            symbol: symbol.to_string(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open_price: open,
            high_price: open.max(close),
            low_price: open.min(close),
            close_price: close,
            volume: 1,
            ma_5: None,
            ma_10: None,
        }
    }

    #[test]
    fn test_gainers_and_losers() {
        let rows = vec![
            row("AAA", dec!(100), dec!(110)),
            row("BBB", dec!(100), dec!(90)),
            row("CCC", dec!(100), dec!(101)),
            row("DDD", dec!(0), dec!(5)),
        ];

        let movers = top_movers(&rows, 2);

        let gainers: Vec<&str> = movers.gainers.iter().map(|m| m.symbol.as_str()).collect();
        let losers: Vec<&str> = movers.losers.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(gainers, vec!["AAA", "CCC"]);
        assert_eq!(losers, vec!["BBB", "CCC"]);
        assert_eq!(movers.gainers[0].pct_change, dec!(10));
    }

    #[test]
    fn test_empty_rows() {
        assert_eq!(top_movers(&[], 5), Movers::default());
    }
}
