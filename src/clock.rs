use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// NSE listings trade in India Standard Time
pub const DEFAULT_EXCHANGE_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Wall clock in the exchange's timezone
///
/// Stored sample times are naive exchange-local, so every "now", "today"
/// and cron schedule is derived here rather than from the host clock.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeClock {
    tz: Tz,
    fixed: Option<DateTime<Utc>>,
}

impl ExchangeClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz, fixed: None }
    }

    /// Clock pinned to one instant (tests, replays)
    pub fn fixed(tz: Tz, at: DateTime<Utc>) -> Self {
        Self { tz, fixed: Some(at) }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current exchange-local time, in the same frame as `sampled_at`
    pub fn now(&self) -> NaiveDateTime {
        self.fixed
            .unwrap_or_else(Utc::now)
            .with_timezone(&self.tz)
            .naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    pub fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }
}

impl Default for ExchangeClock {
    fn default() -> Self {
        Self::new(DEFAULT_EXCHANGE_TZ)
    }
}
