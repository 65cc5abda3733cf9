use crate::clock::ExchangeClock;
use crate::rollup::{RollupError, RollupResult, RollupService};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Daily rollup and retention job
///
/// Fires once a day after market close (exchange time) and runs the
/// rollup with the exchange wall clock as the snapshot instant.
pub struct DailyRollupJob {
    service: Arc<RollupService>,
    cutoff_days: i64,
    clock: ExchangeClock,
}

impl DailyRollupJob {
    /// Create a new rollup job
    pub fn new(service: Arc<RollupService>, cutoff_days: i64, clock: ExchangeClock) -> Self {
        Self {
            service,
            cutoff_days,
            clock,
        }
    }

    async fn run(
        service: Arc<RollupService>,
        cutoff_days: i64,
        clock: ExchangeClock,
    ) -> Result<RollupResult, RollupError> {
        service.run_blocking(clock.now(), cutoff_days).await
    }

    /// Register this job with the scheduler
    ///
    /// The schedule is evaluated in the exchange timezone.
    pub async fn register(
        self,
        scheduler: &JobScheduler,
        schedule: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = self.service.clone();
        let cutoff_days = self.cutoff_days;
        let clock = self.clock;

        let job = Job::new_async_tz(schedule, clock.timezone(), move |_uuid, _lock| {
            let service = service.clone();

            Box::pin(async move {
                tracing::info!("Daily rollup job triggered");

                match Self::run(service, cutoff_days, clock).await {
                    Ok(result) => tracing::info!(
                        "Daily rollup job completed: {} summaries written, {} samples deleted",
                        result.summaries_written,
                        result.samples_deleted
                    ),
                    Err(e) if e.is_retryable() => {
                        tracing::warn!("Daily rollup job failed, next run will retry: {}", e)
                    }
                    Err(e) => tracing::error!("Daily rollup job failed: {}", e),
                }
            })
        })?;

        scheduler.add(job).await?;

        tracing::info!(
            "Daily rollup job registered (schedule: {} {}, retention: {} days)",
            schedule,
            clock.timezone().name(),
            self.cutoff_days
        );

        Ok(())
    }

    /// Run the rollup immediately (manual trigger)
    pub async fn run_now(&self) -> Result<RollupResult, RollupError> {
        Self::run(self.service.clone(), self.cutoff_days, self.clock).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewRawSample;
    use crate::database::repositories::RawSampleRepository;
    use crate::testing::memory::MemoryStore;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_run_now_rolls_up_yesterday() {
        let store = MemoryStore::new();
        let yesterday = ExchangeClock::default()
            .yesterday()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        store
            .insert_batch(vec![
                NewRawSample::flat("TCS", yesterday, dec!(3700), 10),
                NewRawSample::flat("TCS", yesterday + Duration::minutes(2), dec!(3710), 5),
            ])
            .unwrap();

        let service = Arc::new(RollupService::new(
            store.raw_repository(),
            store.summary_repository(),
        ));
        let result = DailyRollupJob::new(service, 30, ExchangeClock::default()).run_now().await.unwrap();

        assert_eq!(result.samples_read, 2);
        assert_eq!(result.samples_deleted, 0);

        let summaries = store.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].volume, 15);
    }

    #[tokio::test]
    async fn test_run_now_rejects_negative_retention() {
        let store = MemoryStore::new();
        let service = Arc::new(RollupService::new(
            store.raw_repository(),
            store.summary_repository(),
        ));

        let err = DailyRollupJob::new(service, -1, ExchangeClock::default()).run_now().await.unwrap_err();
        assert!(matches!(err, RollupError::InvalidRetention(-1)));
    }

    #[tokio::test]
    async fn test_snapshot_uses_exchange_time() {
        use chrono::{NaiveDate, TimeZone, Utc};

        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        store
            .insert_batch(vec![
                NewRawSample::flat("TCS", day.and_hms_opt(9, 15, 0).unwrap(), dec!(3700), 10),
                NewRawSample::flat("TCS", day.and_hms_opt(15, 28, 0).unwrap(), dec!(3750), 10),
            ])
            .unwrap();

        // 12:00 UTC: a UTC host clock would cut the snapshot before the 15:28 bar
        let clock = ExchangeClock::fixed(
            crate::clock::DEFAULT_EXCHANGE_TZ,
            Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
        );
        let service = Arc::new(RollupService::new(
            store.raw_repository(),
            store.summary_repository(),
        ));
        let result = DailyRollupJob::new(service, 30, clock).run_now().await.unwrap();

        assert_eq!(result.snapshot, day.and_hms_opt(17, 30, 0).unwrap());
        assert_eq!(result.samples_read, 2);
        assert_eq!(store.summaries()[0].close_price, dec!(3750));
    }
}
