//! Runs one sweep end to end.
//!
//! Current-weather tasks are split spatially, history and forecast tasks
//! round-robin over the same pool. Each worker is a tokio task that owns its
//! list and hands back its outcomes once, when it finishes. The coordinator
//! waits for every worker before aggregating. There is no timeout: a worker
//! that never returns stalls the run.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    Location,
    aggregate::{RunWindow, aggregate},
    model::{Bucket, Snapshot},
    partition::{AssignStrategy, PartitionError, RoundRobin, Spatial, merge_assignments},
    provider::MetricsProvider,
    task::{forecast_dates, generate_tasks, history_dates},
    worker::FetchWorker,
};

/// Failures that abort a whole run. Per-task provider errors never show up
/// here; they are recorded on the affected [`crate::MetricRecord`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no locations to fetch")]
    NoLocations,

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("worker {worker_id} did not return its results")]
    WorkerLost {
        worker_id: usize,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("no {bucket} record was produced for '{district}'")]
    IncompleteRun { district: String, bucket: Bucket },
}

/// Parameters of a single run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub locations: Vec<Location>,
    pub worker_count: usize,
    pub history_days: u32,
    pub forecast_days: u32,
}

#[derive(Debug, Clone)]
pub struct Coordinator {
    provider: Arc<dyn MetricsProvider>,
}

impl Coordinator {
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self { provider }
    }

    /// Execute one run with windows relative to today's UTC date.
    pub async fn execute(&self, request: &RunRequest) -> Result<Snapshot, RunError> {
        self.execute_on(request, Utc::now().date_naive()).await
    }

    /// Execute one run with windows relative to `today`.
    pub async fn execute_on(
        &self,
        request: &RunRequest,
        today: NaiveDate,
    ) -> Result<Snapshot, RunError> {
        if request.locations.is_empty() {
            return Err(RunError::NoLocations);
        }

        let workers = request.worker_count;
        let window = RunWindow {
            history_dates: history_dates(today, request.history_days),
            forecast_dates: forecast_dates(today, request.forecast_days),
        };

        let tasks = generate_tasks(
            request.locations.len(),
            &window.history_dates,
            &window.forecast_dates,
        );
        let total_tasks = tasks.len();
        let temporal = tasks.temporal();

        let assignments = merge_assignments(
            Spatial.assign(tasks.current, workers)?,
            RoundRobin.assign(temporal, workers)?,
        );

        info!(
            districts = request.locations.len(),
            workers,
            tasks = total_tasks,
            "starting weather sweep"
        );

        let locations: Arc<[Location]> = request.locations.clone().into();
        let handles: Vec<_> = assignments
            .into_iter()
            .enumerate()
            .map(|(id, list)| {
                let worker = FetchWorker::new(id, Arc::clone(&self.provider));
                let locations = Arc::clone(&locations);
                tokio::spawn(async move { worker.run(list, &locations).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total_tasks);
        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(part) => outcomes.extend(part),
                Err(source) => {
                    error!(worker = worker_id, "worker terminated without results: {source}");
                    return Err(RunError::WorkerLost { worker_id, source });
                }
            }
        }

        let snapshot = aggregate(&locations, outcomes, &window, workers, Utc::now())?;
        info!(
            districts = snapshot.districts().len(),
            errors = snapshot.error_count(),
            "weather sweep complete"
        );
        Ok(snapshot)
    }
}
