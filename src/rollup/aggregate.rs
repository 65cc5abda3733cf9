use crate::database::models::{DailySummary, RawSample};
use std::cmp::Ordering;

/// Order samples by symbol, then observation time, then insertion id
///
/// The store is not trusted to return rows in this order; open/close are
/// only well defined once this sort has been applied.
pub fn chronological_order(a: &RawSample, b: &RawSample) -> Ordering {
    a.symbol
        .cmp(&b.symbol)
        .then(a.sampled_at.cmp(&b.sampled_at))
        .then(a.id.cmp(&b.id))
}

/// Roll raw samples into one OHLCV row per (symbol, calendar day)
///
/// Output is ordered by symbol then date. Moving averages are left unset;
/// they depend on the persisted history and are filled in by
/// [`super::moving_average::apply_moving_averages`].
pub fn aggregate_daily(mut samples: Vec<RawSample>) -> Vec<DailySummary> {
    samples.sort_by(chronological_order);

    let mut summaries: Vec<DailySummary> = Vec::new();

    for sample in samples {
        let trade_date = sample.trade_date();

        match summaries.last_mut() {
            Some(current) if current.symbol == sample.symbol && current.trade_date == trade_date => {
                current.high_price = current.high_price.max(sample.high_price);
                current.low_price = current.low_price.min(sample.low_price);
                current.close_price = sample.close_price;
                current.volume += sample.volume;
            }
            _ => summaries.push(DailySummary {
                symbol: sample.symbol,
                trade_date,
                open_price: sample.open_price,
                high_price: sample.high_price,
                low_price: sample.low_price,
                close_price: sample.close_price,
                volume: sample.volume,
                ma_5: None,
                ma_10: None,
            }),
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewRawSample;
    use chrono::{NaiveDate, NaiveDateTime, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample(id: i64, symbol: &str, when: NaiveDateTime, close: Decimal, volume: i64) -> RawSample {
        NewRawSample::flat(symbol, when, close, volume).into_stored(id, Utc::now())
    }

    #[test]
    fn test_single_day_ohlcv() {
        let samples = vec![
            sample(1, "ABC", at(1, 9, 15), dec!(100), 10),
            sample(2, "ABC", at(1, 9, 17), dec!(102), 20),
            sample(3, "ABC", at(1, 9, 19), dec!(99), 30),
            sample(4, "ABC", at(1, 9, 21), dec!(105), 40),
        ];

        let summaries = aggregate_daily(samples);

        assert_eq!(summaries.len(), 1);
        let day = &summaries[0];
        assert_eq!(day.open_price, dec!(100));
        assert_eq!(day.close_price, dec!(105));
        assert_eq!(day.high_price, dec!(105));
        assert_eq!(day.low_price, dec!(99));
        assert_eq!(day.volume, 100);
        assert_eq!(day.ma_5, None);
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_grouping() {
        // Returned newest-first; open must still be the earliest sample
        let samples = vec![
            sample(4, "ABC", at(1, 9, 21), dec!(105), 1),
            sample(2, "ABC", at(1, 9, 17), dec!(102), 1),
            sample(1, "ABC", at(1, 9, 15), dec!(100), 1),
            sample(3, "ABC", at(1, 9, 19), dec!(99), 1),
        ];

        let summaries = aggregate_daily(samples);

        assert_eq!(summaries[0].open_price, dec!(100));
        assert_eq!(summaries[0].close_price, dec!(105));
    }

    #[test]
    fn test_equal_timestamps_break_ties_by_id() {
        let samples = vec![
            sample(8, "ABC", at(1, 9, 15), dec!(101), 1),
            sample(7, "ABC", at(1, 9, 15), dec!(100), 1),
        ];

        let summaries = aggregate_daily(samples);

        assert_eq!(summaries[0].open_price, dec!(100));
        assert_eq!(summaries[0].close_price, dec!(101));
    }

    #[test]
    fn test_groups_by_symbol_and_day() {
        let samples = vec![
            sample(1, "ABC", at(1, 23, 59), dec!(100), 1),
            sample(2, "ABC", at(2, 0, 0), dec!(110), 1),
            sample(3, "XYZ", at(1, 10, 0), dec!(50), 1),
        ];

        let summaries = aggregate_daily(samples);

        let keys: Vec<(String, u32)> = summaries
            .iter()
            .map(|s| (s.symbol.clone(), chrono::Datelike::day(&s.trade_date)))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("ABC".to_string(), 1),
                ("ABC".to_string(), 2),
                ("XYZ".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_daily(Vec::new()).is_empty());
    }

    fn arb_sample() -> impl Strategy<Value = (usize, u32, u32, i64, i64, i64, i64)> {
        (0usize..3, 1u32..4, 0u32..24 * 60, 1i64..10_000, 0i64..500, 0i64..500, 0i64..1_000_000)
    }

    proptest! {
        #[test]
        fn prop_volume_is_conserved_and_high_not_below_low(
            raw in proptest::collection::vec(arb_sample(), 1..200)
        ) {
            let symbols = ["ABC", "TCS", "INFY"];
            let samples: Vec<RawSample> = raw
                .iter()
                .enumerate()
                .map(|(i, (sym, day, minute, base, up, down, volume))| {
                    let when = at(*day, minute / 60, minute % 60);
                    let low = Decimal::from(*base);
                    let high = low + Decimal::from(*up + *down);
                    let open = low + Decimal::from(*up);
                    let close = low + Decimal::from(*down);
                    NewRawSample::new(symbols[*sym], when, open, high, low, close, *volume)
                        .into_stored(i as i64, Utc::now())
                })
                .collect();

            let total_in: i64 = samples.iter().map(|s| s.volume).sum();
            let summaries = aggregate_daily(samples.clone());
            let total_out: i64 = summaries.iter().map(|s| s.volume).sum();
            prop_assert_eq!(total_in, total_out);

            for summary in &summaries {
                prop_assert!(summary.high_price >= summary.low_price);
                let group_volume: i64 = samples
                    .iter()
                    .filter(|s| s.symbol == summary.symbol && s.trade_date() == summary.trade_date)
                    .map(|s| s.volume)
                    .sum();
                prop_assert_eq!(group_volume, summary.volume);
            }
        }
    }
}
