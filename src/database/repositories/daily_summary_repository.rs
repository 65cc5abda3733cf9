use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::DailySummary;
use crate::database::schema::daily_summaries;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::sync::Arc;

/// Rows per INSERT statement; 9 binds per row keeps well under the
/// PostgreSQL limit of 65535 bind parameters.
const UPSERT_CHUNK_SIZE: usize = 1000;

/// Daily summary repository trait - history reads and idempotent writes
pub trait DailySummaryRepository: Send + Sync {
    /// Existing summaries for the given symbols, ordered by symbol then date
    fn load_history(&self, symbols: &[String]) -> Result<Vec<DailySummary>, DatabaseError>;

    /// Insert or replace summaries keyed on (symbol, trade_date)
    ///
    /// All rows are written in one transaction.
    fn upsert_batch(&self, rows: &[DailySummary]) -> Result<usize, DatabaseError>;

    /// Summaries for every symbol on one date
    fn get_by_date(&self, trade_date: NaiveDate) -> Result<Vec<DailySummary>, DatabaseError>;

    /// Summary history for one symbol, newest first
    fn get_by_symbol(&self, symbol: &str, limit: i64) -> Result<Vec<DailySummary>, DatabaseError>;
}

/// PostgreSQL implementation of DailySummaryRepository
pub struct DailySummaryRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl DailySummaryRepositoryImpl {
    /// Create new daily summary repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl DailySummaryRepository for DailySummaryRepositoryImpl {
    fn load_history(&self, symbols: &[String]) -> Result<Vec<DailySummary>, DatabaseError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = (self.get_conn)()?;

        daily_summaries::table
            .filter(daily_summaries::symbol.eq_any(symbols))
            .order((daily_summaries::symbol.asc(), daily_summaries::trade_date.asc()))
            .select(DailySummary::as_select())
            .load(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn upsert_batch(&self, rows: &[DailySummary]) -> Result<usize, DatabaseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = (self.get_conn)()?;
        let now = Utc::now();

        // Use transaction for atomicity
        conn.transaction::<_, DatabaseError, _>(|conn| {
            let mut written = 0;

            for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
                written += diesel::insert_into(daily_summaries::table)
                    .values(chunk)
                    .on_conflict((daily_summaries::symbol, daily_summaries::trade_date))
                    .do_update()
                    .set((
                        daily_summaries::open_price.eq(excluded(daily_summaries::open_price)),
                        daily_summaries::high_price.eq(excluded(daily_summaries::high_price)),
                        daily_summaries::low_price.eq(excluded(daily_summaries::low_price)),
                        daily_summaries::close_price.eq(excluded(daily_summaries::close_price)),
                        daily_summaries::volume.eq(excluded(daily_summaries::volume)),
                        daily_summaries::ma_5.eq(excluded(daily_summaries::ma_5)),
                        daily_summaries::ma_10.eq(excluded(daily_summaries::ma_10)),
                        daily_summaries::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }

            Ok(written)
        })
    }

    fn get_by_date(&self, trade_date: NaiveDate) -> Result<Vec<DailySummary>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        daily_summaries::table
            .filter(daily_summaries::trade_date.eq(trade_date))
            .order(daily_summaries::symbol.asc())
            .select(DailySummary::as_select())
            .load(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn get_by_symbol(&self, symbol: &str, limit: i64) -> Result<Vec<DailySummary>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        daily_summaries::table
            .filter(daily_summaries::symbol.eq(symbol))
            .order(daily_summaries::trade_date.desc())
            .limit(limit)
            .select(DailySummary::as_select())
            .load(&mut conn)
            .map_err(DatabaseError::from)
    }
}
