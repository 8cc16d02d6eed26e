use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    Location,
    model::MetricRecord,
    provider::MetricsProvider,
    task::Task,
};

/// A finished task: what was asked and what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task: Task,
    pub record: MetricRecord,
}

/// Executes an assigned task list against a provider.
///
/// Each task yields exactly one outcome; a provider error becomes a failed
/// record and the worker moves on to the next task.
#[derive(Debug, Clone)]
pub struct FetchWorker {
    id: usize,
    provider: Arc<dyn MetricsProvider>,
}

impl FetchWorker {
    pub fn new(id: usize, provider: Arc<dyn MetricsProvider>) -> Self {
        Self { id, provider }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub async fn run(&self, tasks: Vec<Task>, locations: &[Location]) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut failed = 0usize;

        for task in tasks {
            let date = task.kind.date();
            let record = match locations.get(task.location) {
                Some(location) => match self.provider.fetch(location, task.kind).await {
                    Ok(obs) => MetricRecord::observed(obs, self.id, date),
                    Err(err) => {
                        warn!(
                            worker = self.id,
                            district = %location.name,
                            bucket = %task.kind.bucket(),
                            ?date,
                            "fetch failed: {err:#}"
                        );
                        MetricRecord::failed(format!("{err:#}"), self.id, date)
                    }
                },
                None => MetricRecord::failed(
                    format!("unknown location index {}", task.location),
                    self.id,
                    date,
                ),
            };

            if record.is_error() {
                failed += 1;
            }
            outcomes.push(TaskOutcome { task, record });
        }

        debug!(worker = self.id, total = outcomes.len(), failed, "worker finished");
        outcomes
    }
}
