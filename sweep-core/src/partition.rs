//! Strategies that split a task list across a fixed number of workers.
//!
//! Current-weather tasks are split spatially (contiguous runs of locations),
//! history and forecast tasks round-robin over the whole pool. Both return
//! exactly `workers` lists whose concatenation is a permutation of the input.

use thiserror::Error;

use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("cannot split tasks across zero workers")]
    NoWorkers,
}

pub trait AssignStrategy {
    fn assign(&self, tasks: Vec<Task>, workers: usize) -> Result<Vec<Vec<Task>>, PartitionError>;
}

/// Near-equal contiguous chunks; earlier workers take the remainder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spatial;

/// Task `i` goes to worker `i % workers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

/// Half-open index range of chunk `index` when `total` items are split into `parts`.
///
/// `parts` must be non-zero.
pub fn chunk_bounds(total: usize, parts: usize, index: usize) -> (usize, usize) {
    let base = total / parts;
    let remainder = total % parts;
    let start = if index < remainder {
        index * (base + 1)
    } else {
        remainder * (base + 1) + (index - remainder) * base
    };
    let len = if index < remainder { base + 1 } else { base };
    (start.min(total), (start + len).min(total))
}

impl AssignStrategy for Spatial {
    fn assign(&self, tasks: Vec<Task>, workers: usize) -> Result<Vec<Vec<Task>>, PartitionError> {
        if workers == 0 {
            return Err(PartitionError::NoWorkers);
        }

        let total = tasks.len();
        let mut rest = tasks.into_iter();
        Ok((0..workers)
            .map(|w| {
                let (start, end) = chunk_bounds(total, workers, w);
                rest.by_ref().take(end - start).collect()
            })
            .collect())
    }
}

impl AssignStrategy for RoundRobin {
    fn assign(&self, tasks: Vec<Task>, workers: usize) -> Result<Vec<Vec<Task>>, PartitionError> {
        if workers == 0 {
            return Err(PartitionError::NoWorkers);
        }

        let mut lists = vec![Vec::with_capacity(tasks.len() / workers + 1); workers];
        for (i, task) in tasks.into_iter().enumerate() {
            lists[i % workers].push(task);
        }
        Ok(lists)
    }
}

/// Concatenate per-worker lists from two assignments of the same pool size.
pub fn merge_assignments(mut first: Vec<Vec<Task>>, second: Vec<Vec<Task>>) -> Vec<Vec<Task>> {
    debug_assert_eq!(first.len(), second.len());
    for (dst, src) in first.iter_mut().zip(second) {
        dst.extend(src);
    }
    first
}
