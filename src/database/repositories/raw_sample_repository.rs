use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{NewRawSample, RawSample};
use crate::database::schema::raw_samples;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use std::sync::Arc;

/// Raw sample repository trait - append, snapshot read and retention delete
///
/// Shared by the polling job (append), the rollup job (snapshot read +
/// delete) and the dashboard (recent reads).
pub trait RawSampleRepository: Send + Sync {
    /// Batch insert samples, skipping any (symbol, sampled_at) already stored
    ///
    /// Returns the number of rows actually inserted.
    fn insert_batch(&self, samples: Vec<NewRawSample>) -> Result<usize, DatabaseError>;

    /// All samples observed at or before `snapshot`
    ///
    /// Row order is store-specific; callers sort before relying on it.
    fn load_until(&self, snapshot: NaiveDateTime) -> Result<Vec<RawSample>, DatabaseError>;

    /// Most recent samples across all symbols, newest first
    fn get_latest(&self, limit: i64) -> Result<Vec<RawSample>, DatabaseError>;

    /// Samples for one symbol at or after `since`, oldest first
    fn get_by_symbol_since(
        &self,
        symbol: &str,
        since: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<RawSample>, DatabaseError>;

    /// Distinct symbols present in the raw table
    fn distinct_symbols(&self) -> Result<Vec<String>, DatabaseError>;

    /// Delete samples strictly older than `before` whose id is at most `max_id`
    ///
    /// `max_id` is the highest id the caller has already read, so rows
    /// appended since then survive until a later run has summarized them.
    fn delete_before(&self, before: NaiveDateTime, max_id: i64) -> Result<usize, DatabaseError>;
}

/// PostgreSQL implementation of RawSampleRepository
pub struct RawSampleRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl RawSampleRepositoryImpl {
    /// Create new raw sample repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl RawSampleRepository for RawSampleRepositoryImpl {
    fn insert_batch(&self, samples: Vec<NewRawSample>) -> Result<usize, DatabaseError> {
        if samples.is_empty() {
            return Ok(0);
        }

        let mut conn = (self.get_conn)()?;

        let inserted = diesel::insert_into(raw_samples::table)
            .values(&samples)
            .on_conflict_do_nothing() // Same bar polled twice (unique symbol + sampled_at)
            .execute(&mut conn)?;

        tracing::debug!(
            "Batch inserted {} raw samples ({} duplicates skipped)",
            inserted,
            samples.len() - inserted
        );

        Ok(inserted)
    }

    fn load_until(&self, snapshot: NaiveDateTime) -> Result<Vec<RawSample>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        raw_samples::table
            .filter(raw_samples::sampled_at.le(snapshot))
            .order((
                raw_samples::symbol.asc(),
                raw_samples::sampled_at.asc(),
                raw_samples::id.asc(),
            ))
            .select(RawSample::as_select())
            .load(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn get_latest(&self, limit: i64) -> Result<Vec<RawSample>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        raw_samples::table
            .order((raw_samples::sampled_at.desc(), raw_samples::id.desc()))
            .limit(limit)
            .select(RawSample::as_select())
            .load(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn get_by_symbol_since(
        &self,
        symbol: &str,
        since: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<RawSample>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        raw_samples::table
            .filter(raw_samples::symbol.eq(symbol))
            .filter(raw_samples::sampled_at.ge(since))
            .order((raw_samples::sampled_at.asc(), raw_samples::id.asc()))
            .limit(limit)
            .select(RawSample::as_select())
            .load(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn distinct_symbols(&self) -> Result<Vec<String>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        raw_samples::table
            .select(raw_samples::symbol)
            .distinct()
            .order(raw_samples::symbol.asc())
            .load::<String>(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn delete_before(&self, before: NaiveDateTime, max_id: i64) -> Result<usize, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let deleted = diesel::delete(raw_samples::table)
            .filter(raw_samples::sampled_at.lt(before))
            .filter(raw_samples::id.le(max_id))
            .execute(&mut conn)?;

        tracing::info!("Deleted {} raw samples before {}", deleted, before);

        Ok(deleted)
    }
}
