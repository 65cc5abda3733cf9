use crate::clock::DEFAULT_EXCHANGE_TZ;
use crate::ingest::symbols::{default_universe, parse_symbol_list};
use crate::rollup::DEFAULT_RETENTION_DAYS;
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

/// Every 2 minutes
pub const DEFAULT_POLL_CRON: &str = "0 */2 * * * *";

/// 18:30 exchange time, after market close
pub const DEFAULT_ROLLUP_CRON: &str = "0 30 18 * * *";

/// Service configuration read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL URL; the server refuses to start without it
    pub database_url: Option<String>,

    /// Maximum pooled connections
    pub pool_size: u32,

    /// Address for the dashboard API
    pub bind_addr: String,

    /// Run embedded migrations at startup
    pub run_migrations: bool,

    /// Symbols to poll, without exchange suffix
    pub symbols: Vec<String>,

    /// Exchange suffix appended by the provider (".NS" for NSE)
    pub symbol_suffix: String,

    /// Quote API base URL
    pub quote_base_url: String,

    /// HTTP timeout for quote requests
    pub http_timeout_secs: u64,

    /// Symbols fetched concurrently per poll (1 = sequential)
    pub poll_concurrency: usize,

    /// Cron expression for the polling job
    pub poll_cron: String,

    /// Cron expression for the daily rollup (exchange local time)
    pub rollup_cron: String,

    /// Raw samples older than this many days are deleted by the rollup
    pub retention_days: i64,

    /// Exchange timezone; sample times, "now" and cron schedules use it
    pub exchange_tz: Tz,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_size: 20,
            bind_addr: "127.0.0.1:3000".to_string(),
            run_migrations: true,
            symbols: default_universe(),
            symbol_suffix: ".NS".to_string(),
            quote_base_url: "https://query2.finance.yahoo.com".to_string(),
            http_timeout_secs: 30,
            poll_concurrency: 1,
            poll_cron: DEFAULT_POLL_CRON.to_string(),
            rollup_cron: DEFAULT_ROLLUP_CRON.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            exchange_tz: DEFAULT_EXCHANGE_TZ,
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let symbols = get("TRACKED_SYMBOLS")
            .map(|raw| parse_symbol_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.symbols);

        Self {
            database_url: get("DATABASE_URL"),
            pool_size: parse_or(get("DB_POOL_MAX_SIZE"), "DB_POOL_MAX_SIZE", defaults.pool_size),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            run_migrations: get("RUN_MIGRATIONS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(defaults.run_migrations),
            symbols,
            symbol_suffix: lookup("SYMBOL_SUFFIX")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.symbol_suffix),
            quote_base_url: get("QUOTE_BASE_URL").unwrap_or(defaults.quote_base_url),
            http_timeout_secs: parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                defaults.http_timeout_secs,
            ),
            poll_concurrency: parse_or::<usize>(
                get("POLL_CONCURRENCY"),
                "POLL_CONCURRENCY",
                defaults.poll_concurrency,
            )
            .max(1),
            poll_cron: get("POLL_CRON").unwrap_or(defaults.poll_cron),
            rollup_cron: get("ROLLUP_CRON").unwrap_or(defaults.rollup_cron),
            retention_days: match parse_or(get("RETENTION_DAYS"), "RETENTION_DAYS", defaults.retention_days) {
                days if days >= 0 => days,
                days => {
                    tracing::warn!("RETENTION_DAYS={} is negative, using {}", days, defaults.retention_days);
                    defaults.retention_days
                }
            },
            exchange_tz: match get("EXCHANGE_TZ") {
                Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                    tracing::warn!("Unknown EXCHANGE_TZ={:?}, using {}", name, defaults.exchange_tz.name());
                    defaults.exchange_tz
                }),
                None => defaults.exchange_tz,
            },
        }
    }
}

fn parse_or<T: FromStr + std::fmt::Display>(value: Option<String>, name: &str, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}, using {}", name, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);

        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.retention_days, 30);
        assert_eq!(cfg.poll_cron, DEFAULT_POLL_CRON);
        assert_eq!(cfg.symbol_suffix, ".NS");
        assert!(cfg.symbols.contains(&"RELIANCE".to_string()));
        assert_eq!(cfg.exchange_tz, chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("TRACKED_SYMBOLS", "tcs,infy"),
            ("RETENTION_DAYS", "7"),
            ("POLL_CONCURRENCY", "4"),
            ("SYMBOL_SUFFIX", ""),
            ("RUN_MIGRATIONS", "false"),
            ("EXCHANGE_TZ", "America/New_York"),
        ]);

        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/market"));
        assert_eq!(cfg.symbols, vec!["TCS", "INFY"]);
        assert_eq!(cfg.retention_days, 7);
        assert_eq!(cfg.poll_concurrency, 4);
        assert_eq!(cfg.symbol_suffix, "");
        assert!(!cfg.run_migrations);
        assert_eq!(cfg.exchange_tz, chrono_tz::America::New_York);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = config(&[
            ("RETENTION_DAYS", "-5"),
            ("DB_POOL_MAX_SIZE", "lots"),
            ("POLL_CONCURRENCY", "0"),
            ("EXCHANGE_TZ", "Mars/Olympus"),
        ]);

        assert_eq!(cfg.retention_days, 30);
        assert_eq!(cfg.pool_size, 20);
        assert_eq!(cfg.poll_concurrency, 1);
        assert_eq!(cfg.exchange_tz, DEFAULT_EXCHANGE_TZ);
    }
}
