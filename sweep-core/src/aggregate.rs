//! Reassembles worker outputs into a [`Snapshot`].
//!
//! Outcomes arrive in whatever order workers produced them. Each one is
//! slotted by (location, bucket, date); every slot must be filled before a
//! snapshot is built, so a run can never publish a location with silently
//! missing data.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    Location,
    coordinator::RunError,
    model::{
        Averages, Bucket, DistrictRecord, MetricAverages, MetricRecord, Snapshot, SnapshotMeta,
        WorkloadMeta,
    },
    provider::round2,
    task::TaskKind,
    worker::TaskOutcome,
};

/// The dates a run asked for, used to size and label the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunWindow {
    pub history_dates: Vec<NaiveDate>,
    pub forecast_dates: Vec<NaiveDate>,
}

#[derive(Default)]
struct Slots {
    current: Option<MetricRecord>,
    history: HashMap<NaiveDate, MetricRecord>,
    forecast: HashMap<NaiveDate, MetricRecord>,
}

pub fn aggregate(
    locations: &[Location],
    outcomes: impl IntoIterator<Item = TaskOutcome>,
    window: &RunWindow,
    worker_count: usize,
    completed_at: DateTime<Utc>,
) -> Result<Snapshot, RunError> {
    let mut slots: Vec<Slots> = locations.iter().map(|_| Slots::default()).collect();
    let mut workload = WorkloadMeta::default();

    for TaskOutcome { task, record } in outcomes {
        *workload
            .bucket_mut(task.kind.bucket())
            .entry(record.worker_id)
            .or_default() += 1;

        let Some(slot) = slots.get_mut(task.location) else {
            continue;
        };
        match task.kind {
            TaskKind::Current => slot.current = Some(record),
            TaskKind::History(date) => {
                slot.history.insert(date, record);
            }
            TaskKind::Forecast(date) => {
                slot.forecast.insert(date, record);
            }
        }
    }

    let districts = locations
        .iter()
        .zip(slots)
        .map(|(location, slot)| assemble(location, slot, window))
        .collect::<Result<Vec<_>, _>>()?;

    let averages = Averages {
        current: average(districts.iter().map(|d| &d.current)),
        history: average(districts.iter().flat_map(|d| &d.history)),
        forecast: average(districts.iter().flat_map(|d| &d.forecast)),
    };

    let meta = SnapshotMeta {
        total_districts: districts.len(),
        worker_count,
        history_dates: window.history_dates.clone(),
        forecast_dates: window.forecast_dates.clone(),
        workload,
    };

    Ok(Snapshot::new(completed_at, districts, averages, meta))
}

fn assemble(location: &Location, slot: Slots, window: &RunWindow) -> Result<DistrictRecord, RunError> {
    let missing = |bucket| RunError::IncompleteRun { district: location.name.clone(), bucket };

    let current = slot.current.ok_or_else(|| missing(Bucket::Current))?;
    let history = ordered(slot.history, &window.history_dates).ok_or_else(|| missing(Bucket::History))?;
    let forecast =
        ordered(slot.forecast, &window.forecast_dates).ok_or_else(|| missing(Bucket::Forecast))?;

    Ok(DistrictRecord {
        district: location.name.clone(),
        query: location.query.clone(),
        coord: location.coord,
        current,
        history,
        forecast,
    })
}

/// Records for exactly `dates`, ascending; `None` if any date is missing.
fn ordered(
    mut by_date: HashMap<NaiveDate, MetricRecord>,
    dates: &[NaiveDate],
) -> Option<Vec<MetricRecord>> {
    let mut dates = dates.to_vec();
    dates.sort_unstable();
    dates.into_iter().map(|d| by_date.remove(&d)).collect()
}

/// Per-metric mean over the non-null values only.
pub fn average<'a>(records: impl Iterator<Item = &'a MetricRecord> + Clone) -> MetricAverages {
    fn mean<'a>(
        records: impl Iterator<Item = &'a MetricRecord>,
        metric: fn(&MetricRecord) -> Option<f64>,
    ) -> Option<f64> {
        let (sum, n) = records
            .filter_map(metric)
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        (n > 0).then(|| round2(sum / n as f64))
    }

    MetricAverages {
        temperature_c: mean(records.clone(), |r| r.temperature_c),
        humidity_pct: mean(records.clone(), |r| r.humidity_pct),
        rainfall_mm: mean(records.clone(), |r| r.rainfall_mm),
        wind_speed_ms: mean(records, |r| r.wind_speed_ms),
    }
}
