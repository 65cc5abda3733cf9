use crate::database::models::NewRawSample;
use crate::database::repositories::RawSampleRepository;
use crate::database::DatabaseError;
use crate::ingest::QuoteProvider;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Outcome of one polling pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollReport {
    pub attempted: usize,
    pub stored: usize,
    /// Bars already on record (e.g. polled again after market close)
    pub duplicates: usize,
    pub failed: usize,
}

/// Intraday polling job
///
/// Fetches the latest bar for every tracked symbol and appends it to the
/// raw sample table. A symbol that fails is logged and skipped; the rest of
/// the batch is still stored.
#[derive(Clone)]
pub struct IngestJob {
    provider: Arc<dyn QuoteProvider>,
    repository: Arc<dyn RawSampleRepository>,
    symbols: Arc<Vec<String>>,
    concurrency: usize,
    in_flight: Arc<Mutex<()>>,
}

impl IngestJob {
    /// Create a new polling job; `concurrency` of 1 polls symbols one at a time
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        repository: Arc<dyn RawSampleRepository>,
        symbols: Vec<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            provider,
            repository,
            symbols: Arc::new(symbols),
            concurrency: concurrency.max(1),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Poll every symbol once and store what came back
    pub async fn poll_once(&self) -> Result<PollReport, DatabaseError> {
        let started = std::time::Instant::now();
        let provider = Arc::clone(&self.provider);

        let results: Vec<Option<NewRawSample>> = stream::iter(self.symbols.iter().cloned())
            .map(|symbol| {
                let provider = Arc::clone(&provider);
                async move {
                    match provider.latest_sample(&symbol).await {
                        Ok(sample) => Some(sample),
                        Err(e) => {
                            tracing::warn!("{} poll failed for {}: {}", provider.name(), symbol, e);
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let attempted = results.len();
        let samples: Vec<NewRawSample> = results.into_iter().flatten().collect();
        let failed = attempted - samples.len();

        if samples.is_empty() {
            tracing::warn!("Poll returned no samples ({} symbols failed)", failed);
            return Ok(PollReport {
                attempted,
                failed,
                ..PollReport::default()
            });
        }

        let fetched = samples.len();
        let repository = Arc::clone(&self.repository);
        let stored = tokio::task::spawn_blocking(move || repository.insert_batch(samples))
            .await
            .map_err(|e| DatabaseError::QueryError(format!("insert task failed: {}", e)))??;

        let duplicates = fetched - stored;

        tracing::info!(
            "Poll stored {} samples ({} already stored, {} failed) in {:?}",
            stored,
            duplicates,
            failed,
            started.elapsed()
        );

        Ok(PollReport {
            attempted,
            stored,
            duplicates,
            failed,
        })
    }

    /// Register this job with the scheduler
    ///
    /// A tick that fires while the previous poll is still running is skipped.
    pub async fn register(
        self,
        scheduler: &JobScheduler,
        schedule: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let symbol_count = self.symbols.len();

        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let job = self.clone();

            Box::pin(async move {
                let Ok(_guard) = job.in_flight.try_lock() else {
                    tracing::warn!("Previous poll still running, skipping this tick");
                    return;
                };

                match job.poll_once().await {
                    Ok(report) => tracing::debug!("Poll job completed: {:?}", report),
                    Err(e) => tracing::error!("Poll job failed: {}", e),
                }
            })
        })?;

        scheduler.add(job).await?;

        tracing::info!("Poll job registered ({} symbols, schedule: {})", symbol_count, schedule);

        Ok(())
    }

    /// Poll immediately (manual trigger)
    pub async fn run_now(&self) -> Result<PollReport, DatabaseError> {
        self.poll_once().await
    }
}
