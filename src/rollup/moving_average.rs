use crate::database::models::DailySummary;
use rust_decimal::{Decimal, RoundingStrategy};

/// Short moving-average window (trading days)
pub const MA_SHORT_WINDOW: usize = 5;

/// Long moving-average window (trading days)
pub const MA_LONG_WINDOW: usize = 10;

/// Decimal places stored for moving averages (matches the column scale)
pub const MA_SCALE: u32 = 4;

/// Trailing simple moving average over `closes`
///
/// Position `i` holds the mean of `closes[i + 1 - window..=i]`, or `None`
/// while fewer than `window` values are available. A running sum is used;
/// decimal arithmetic is exact so this matches a full recompute.
pub fn trailing_means(closes: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    if window == 0 {
        return vec![None; closes.len()];
    }

    let divisor = Decimal::from(window as u64);
    let mut sum = Decimal::ZERO;
    let mut means = Vec::with_capacity(closes.len());

    for (i, close) in closes.iter().enumerate() {
        sum += *close;
        if i >= window {
            sum -= closes[i - window];
        }

        if i + 1 >= window {
            means.push(Some(round_average(sum / divisor)));
        } else {
            means.push(None);
        }
    }

    means
}

fn round_average(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MA_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Fill MA_5 / MA_10 on one symbol's chronological summary series
///
/// `series` must hold a single symbol ordered by ascending date.
pub fn apply_moving_averages(series: &mut [DailySummary]) {
    debug_assert!(series.windows(2).all(|w| w[0].symbol == w[1].symbol
        && w[0].trade_date < w[1].trade_date));

    let closes: Vec<Decimal> = series.iter().map(|s| s.close_price).collect();
    let short = trailing_means(&closes, MA_SHORT_WINDOW);
    let long = trailing_means(&closes, MA_LONG_WINDOW);

    for ((summary, ma_5), ma_10) in series.iter_mut().zip(short).zip(long) {
        summary.ma_5 = ma_5;
        summary.ma_10 = ma_10;
    }
}
