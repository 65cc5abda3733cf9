use crate::database::models::DailySummary;
use crate::database::repositories::{DailySummaryRepository, RawSampleRepository};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;
use uuid::Uuid;

use super::aggregate::aggregate_daily;
use super::errors::RollupError;
use super::moving_average::apply_moving_averages;

/// Default retention window for raw samples (days)
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Outcome of one rollup and retention run
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RollupResult {
    pub run_id: Uuid,
    /// Point in time the raw table was read up to
    pub snapshot: NaiveDateTime,
    /// Raw samples older than this were deleted
    pub retention_cutoff: NaiveDateTime,
    pub samples_read: usize,
    pub symbols: usize,
    pub summaries_written: usize,
    /// Days past the retention boundary that kept their stored summary
    pub sealed_days_skipped: usize,
    pub samples_deleted: usize,
    pub elapsed_ms: u64,
}

/// Rows to upsert after merging fresh aggregates into stored history
#[derive(Debug, Default)]
pub(crate) struct WritePlan {
    pub rows: Vec<DailySummary>,
    pub sealed_days_skipped: usize,
}

/// Merge newly aggregated days into each symbol's stored history
///
/// - a computed day replaces the stored one unless it is sealed: dated on or
///   before `seal_date` with a summary already stored, in which case the raw
///   rows may have been partly removed by retention and the stored row wins
/// - moving averages are recomputed over the merged series
/// - every recomputed day is written, plus stored days whose averages moved
pub(crate) fn plan_writes(
    history: Vec<DailySummary>,
    computed: Vec<DailySummary>,
    seal_date: NaiveDate,
) -> WritePlan {
    let mut series: BTreeMap<String, BTreeMap<NaiveDate, DailySummary>> = BTreeMap::new();
    for row in history {
        series
            .entry(row.symbol.clone())
            .or_default()
            .insert(row.trade_date, row);
    }

    let mut stored_averages: BTreeMap<(String, NaiveDate), (Option<_>, Option<_>)> = BTreeMap::new();
    for (symbol, days) in &series {
        for (date, row) in days {
            stored_averages.insert((symbol.clone(), *date), (row.ma_5, row.ma_10));
        }
    }

    let mut plan = WritePlan::default();
    let mut touched: BTreeSet<(String, NaiveDate)> = BTreeSet::new();
    let mut affected_symbols: BTreeSet<String> = BTreeSet::new();

    for row in computed {
        let days = series.entry(row.symbol.clone()).or_default();
        affected_symbols.insert(row.symbol.clone());

        if row.trade_date <= seal_date && days.contains_key(&row.trade_date) {
            plan.sealed_days_skipped += 1;
            continue;
        }

        touched.insert((row.symbol.clone(), row.trade_date));
        days.insert(row.trade_date, row);
    }

    for symbol in affected_symbols {
        let Some(days) = series.remove(&symbol) else {
            continue;
        };

        let mut ordered: Vec<DailySummary> = days.into_values().collect();
        apply_moving_averages(&mut ordered);

        for row in ordered {
            let key = (row.symbol.clone(), row.trade_date);
            let averages_moved = stored_averages
                .get(&key)
                .map_or(false, |stored| *stored != (row.ma_5, row.ma_10));

            if touched.contains(&key) || averages_moved {
                plan.rows.push(row);
            }
        }
    }

    plan
}

/// Rollup and retention job
///
/// Reads a snapshot of raw samples, writes one summary per (symbol, day)
/// and then prunes raw samples past the retention window. Holds no state
/// between runs apart from the in-process run lock.
pub struct RollupService {
    raw_repository: Arc<dyn RawSampleRepository>,
    summary_repository: Arc<dyn DailySummaryRepository>,
    run_lock: Mutex<()>,
}

impl RollupService {
    /// Create a new rollup service over the given stores
    pub fn new(
        raw_repository: Arc<dyn RawSampleRepository>,
        summary_repository: Arc<dyn DailySummaryRepository>,
    ) -> Self {
        Self {
            raw_repository,
            summary_repository,
            run_lock: Mutex::new(()),
        }
    }

    /// Run the rollup and retention steps once
    ///
    /// `now` is the snapshot instant: samples observed after it are left for
    /// the next run. Summaries are committed before any raw row is deleted;
    /// the first storage error aborts the run.
    pub fn run_rollup_and_retention(
        &self,
        now: NaiveDateTime,
        cutoff_days: i64,
    ) -> Result<RollupResult, RollupError> {
        if cutoff_days < 0 {
            return Err(RollupError::InvalidRetention(cutoff_days));
        }

        let _guard = self.run_lock.try_lock().ok_or(RollupError::AlreadyRunning)?;

        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let retention_cutoff = now - chrono::Duration::days(cutoff_days);

        tracing::info!(
            %run_id,
            snapshot = %now,
            %retention_cutoff,
            "Starting daily rollup"
        );

        let samples = self.raw_repository.load_until(now)?;

        if samples.is_empty() {
            tracing::info!(%run_id, "No raw samples to roll up");
            return Ok(RollupResult {
                run_id,
                snapshot: now,
                retention_cutoff,
                samples_read: 0,
                symbols: 0,
                summaries_written: 0,
                sealed_days_skipped: 0,
                samples_deleted: 0,
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        let samples_read = samples.len();
        // Rows appended after the read have higher ids and are not pruned by this run
        let max_id_read = samples.iter().map(|s| s.id).max().unwrap_or(0);
        let computed = aggregate_daily(samples);

        let mut symbols: Vec<String> = computed.iter().map(|s| s.symbol.clone()).collect();
        symbols.dedup();

        let history = self.summary_repository.load_history(&symbols)?;
        let plan = plan_writes(history, computed, retention_cutoff.date());

        tracing::debug!(
            %run_id,
            rows = plan.rows.len(),
            sealed = plan.sealed_days_skipped,
            "Upserting daily summaries"
        );

        let summaries_written = self.summary_repository.upsert_batch(&plan.rows)?;
        let samples_deleted = self
            .raw_repository
            .delete_before(retention_cutoff, max_id_read)?;

        let result = RollupResult {
            run_id,
            snapshot: now,
            retention_cutoff,
            samples_read,
            symbols: symbols.len(),
            summaries_written,
            sealed_days_skipped: plan.sealed_days_skipped,
            samples_deleted,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            %run_id,
            samples_read,
            symbols = result.symbols,
            summaries_written,
            samples_deleted,
            elapsed_ms = result.elapsed_ms,
            "Daily rollup completed"
        );

        Ok(result)
    }

    /// Run on the blocking thread pool (diesel calls are synchronous)
    pub async fn run_blocking(
        self: Arc<Self>,
        now: NaiveDateTime,
        cutoff_days: i64,
    ) -> Result<RollupResult, RollupError> {
        tokio::task::spawn_blocking(move || self.run_rollup_and_retention(now, cutoff_days))
            .await
            .map_err(|e| RollupError::Task(e.to_string()))?
    }
}
