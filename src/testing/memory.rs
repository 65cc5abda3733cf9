use crate::database::models::{DailySummary, NewRawSample, RawSample};
use crate::database::repositories::{DailySummaryRepository, RawSampleRepository};
use crate::database::DatabaseError;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    raw: Vec<RawSample>,
    next_id: i64,
    summaries: BTreeMap<(String, NaiveDate), DailySummary>,
}

/// In-process store implementing both repository traits
///
/// Clones share the same tables. `load_until` hands rows back newest first
/// so callers cannot lean on incidental ordering.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw_repository(&self) -> Arc<dyn RawSampleRepository> {
        Arc::new(self.clone())
    }

    pub fn summary_repository(&self) -> Arc<dyn DailySummaryRepository> {
        Arc::new(self.clone())
    }

    /// All summaries ordered by symbol then date
    pub fn summaries(&self) -> Vec<DailySummary> {
        self.tables.lock().summaries.values().cloned().collect()
    }

    /// All raw samples ordered by time then id
    pub fn raw_samples(&self) -> Vec<RawSample> {
        let mut rows = self.tables.lock().raw.clone();
        rows.sort_by(|a, b| a.sampled_at.cmp(&b.sampled_at).then(a.id.cmp(&b.id)));
        rows
    }
}

impl RawSampleRepository for MemoryStore {
    fn insert_batch(&self, samples: Vec<NewRawSample>) -> Result<usize, DatabaseError> {
        let mut tables = self.tables.lock();
        let mut inserted = 0;

        for sample in samples {
            let duplicate = tables
                .raw
                .iter()
                .any(|s| s.symbol == sample.symbol && s.sampled_at == sample.sampled_at);
            if duplicate {
                continue;
            }

            tables.next_id += 1;
            let id = tables.next_id;
            tables.raw.push(sample.into_stored(id, Utc::now()));
            inserted += 1;
        }

        Ok(inserted)
    }

    fn load_until(&self, snapshot: NaiveDateTime) -> Result<Vec<RawSample>, DatabaseError> {
        let tables = self.tables.lock();
        Ok(tables
            .raw
            .iter()
            .rev()
            .filter(|s| s.sampled_at <= snapshot)
            .cloned()
            .collect())
    }

    fn get_latest(&self, limit: i64) -> Result<Vec<RawSample>, DatabaseError> {
        let mut rows = self.raw_samples();
        rows.reverse();
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    fn get_by_symbol_since(
        &self,
        symbol: &str,
        since: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<RawSample>, DatabaseError> {
        Ok(self
            .raw_samples()
            .into_iter()
            .filter(|s| s.symbol == symbol && s.sampled_at >= since)
            .take(limit.max(0) as usize)
            .collect())
    }

    fn distinct_symbols(&self) -> Result<Vec<String>, DatabaseError> {
        let tables = self.tables.lock();
        let symbols: BTreeSet<String> = tables.raw.iter().map(|s| s.symbol.clone()).collect();
        Ok(symbols.into_iter().collect())
    }

    fn delete_before(&self, before: NaiveDateTime, max_id: i64) -> Result<usize, DatabaseError> {
        let mut tables = self.tables.lock();
        let len_before = tables.raw.len();
        tables.raw.retain(|s| s.sampled_at >= before || s.id > max_id);
        Ok(len_before - tables.raw.len())
    }
}

impl DailySummaryRepository for MemoryStore {
    fn load_history(&self, symbols: &[String]) -> Result<Vec<DailySummary>, DatabaseError> {
        let tables = self.tables.lock();
        Ok(tables
            .summaries
            .values()
            .filter(|row| symbols.contains(&row.symbol))
            .cloned()
            .collect())
    }

    fn upsert_batch(&self, rows: &[DailySummary]) -> Result<usize, DatabaseError> {
        let mut tables = self.tables.lock();

        for row in rows {
            tables
                .summaries
                .insert((row.symbol.clone(), row.trade_date), row.clone());
        }

        Ok(rows.len())
    }

    fn get_by_date(&self, trade_date: NaiveDate) -> Result<Vec<DailySummary>, DatabaseError> {
        let tables = self.tables.lock();
        Ok(tables
            .summaries
            .values()
            .filter(|row| row.trade_date == trade_date)
            .cloned()
            .collect())
    }

    fn get_by_symbol(&self, symbol: &str, limit: i64) -> Result<Vec<DailySummary>, DatabaseError> {
        let tables = self.tables.lock();
        Ok(tables
            .summaries
            .values()
            .rev()
            .filter(|row| row.symbol == symbol)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

/// Store whose reads or writes fail as if the database were unreachable
pub struct FailingStore {
    fail_reads: bool,
    fail_writes: bool,
}

impl FailingStore {
    /// Every read fails
    pub fn reads() -> Self {
        Self {
            fail_reads: true,
            fail_writes: false,
        }
    }

    /// Reads return nothing, every write or delete fails
    pub fn writes() -> Self {
        Self {
            fail_reads: false,
            fail_writes: true,
        }
    }

    fn check(failing: bool) -> Result<(), DatabaseError> {
        if failing {
            Err(DatabaseError::ConnectionFailed("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RawSampleRepository for FailingStore {
    fn insert_batch(&self, _samples: Vec<NewRawSample>) -> Result<usize, DatabaseError> {
        Self::check(self.fail_writes).map(|_| 0)
    }

    fn load_until(&self, _snapshot: NaiveDateTime) -> Result<Vec<RawSample>, DatabaseError> {
        Self::check(self.fail_reads).map(|_| Vec::new())
    }

    fn get_latest(&self, _limit: i64) -> Result<Vec<RawSample>, DatabaseError> {
        Self::check(self.fail_reads).map(|_| Vec::new())
    }

    fn get_by_symbol_since(
        &self,
        _symbol: &str,
        _since: NaiveDateTime,
        _limit: i64,
    ) -> Result<Vec<RawSample>, DatabaseError> {
        Self::check(self.fail_reads).map(|_| Vec::new())
    }

    fn distinct_symbols(&self) -> Result<Vec<String>, DatabaseError> {
        Self::check(self.fail_reads).map(|_| Vec::new())
    }

    fn delete_before(&self, _before: NaiveDateTime, _max_id: i64) -> Result<usize, DatabaseError> {
        Self::check(self.fail_writes).map(|_| 0)
    }
}

impl DailySummaryRepository for FailingStore {
    fn load_history(&self, _symbols: &[String]) -> Result<Vec<DailySummary>, DatabaseError> {
        Self::check(self.fail_reads).map(|_| Vec::new())
    }

    fn upsert_batch(&self, _rows: &[DailySummary]) -> Result<usize, DatabaseError> {
        Self::check(self.fail_writes).map(|_| 0)
    }

    fn get_by_date(&self, _trade_date: NaiveDate) -> Result<Vec<DailySummary>, DatabaseError> {
        Self::check(self.fail_reads).map(|_| Vec::new())
    }

    fn get_by_symbol(&self, _symbol: &str, _limit: i64) -> Result<Vec<DailySummary>, DatabaseError> {
        Self::check(self.fail_reads).map(|_| Vec::new())
    }
}
