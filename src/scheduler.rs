//! Recurring rate-ingestion jobs
//!
//! One job per product, each ticking on the ingestor's interval. The first
//! tick fires one interval after [`Scheduler::start`]; ticks missed while a
//! slow ingest runs are skipped rather than replayed.

use crate::rates::RateIngestor;
use crate::telemetry::{increment_counter, CounterMetric};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Scheduler errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Two products map onto the same job id
    #[error("Job already scheduled: {0}")]
    DuplicateJob(String),
    /// `start` called on a running scheduler
    #[error("Scheduler already started")]
    AlreadyStarted,
}

/// Job identifier for a product's ingestion job, e.g. `btc_usd_rates`
pub fn job_id(product_id: &str) -> String {
    format!("{}_rates", product_id.to_lowercase().replace('-', "_"))
}

struct Job {
    id: String,
    handle: JoinHandle<()>,
}

/// Process-wide owner of the ingestion jobs
///
/// Dropping the scheduler aborts any job still running.
pub struct Scheduler {
    ingestor: Arc<RateIngestor>,
    shutdown: watch::Sender<bool>,
    jobs: Vec<Job>,
}

impl Scheduler {
    pub fn new(ingestor: Arc<RateIngestor>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            ingestor,
            shutdown,
            jobs: Vec::new(),
        }
    }

    /// Register and spawn one recurring job per product
    pub fn start(&mut self, products: &[String]) -> Result<(), SchedulerError> {
        if !self.jobs.is_empty() {
            return Err(SchedulerError::AlreadyStarted);
        }

        let mut ids = HashSet::new();
        for product in products {
            let id = job_id(product);
            if !ids.insert(id.clone()) {
                return Err(SchedulerError::DuplicateJob(id));
            }
        }

        self.shutdown.send_replace(false);
        let interval = self.ingestor.interval();

        for product in products {
            let id = job_id(product);
            let handle = tokio::spawn(run_job(
                id.clone(),
                product.clone(),
                self.ingestor.clone(),
                self.shutdown.subscribe(),
            ));

            tracing::info!(job = %id, prod_id = %product, ?interval, "Scheduled rate ingestion");
            self.jobs.push(Job { id, handle });
        }

        Ok(())
    }

    /// Ids of the jobs currently registered
    pub fn job_ids(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.id.as_str()).collect()
    }

    /// Cancel every job and wait for it to finish its current tick
    pub async fn stop(&mut self) {
        self.shutdown.send_replace(true);

        for job in self.jobs.drain(..) {
            if let Err(e) = job.handle.await {
                if !e.is_cancelled() {
                    tracing::error!(job = %job.id, error = %e, "Ingestion job panicked");
                }
            }
        }

        tracing::info!("Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for job in &self.jobs {
            job.handle.abort();
        }
    }
}

async fn run_job(
    id: String,
    product_id: String,
    ingestor: Arc<RateIngestor>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = ingestor.interval();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = ingestor.ingest_recent_rates(&product_id).await {
                    increment_counter(CounterMetric::IngestFailures, Some(&product_id), 1);
                    tracing::error!(job = %id, prod_id = %product_id, error = %e, "Rate ingestion failed, window dropped");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::debug!(job = %id, "Ingestion job exited");
}
