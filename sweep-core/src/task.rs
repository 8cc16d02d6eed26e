use chrono::{Days, NaiveDate};

use crate::model::Bucket;

/// What a single task asks the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Current,
    History(NaiveDate),
    Forecast(NaiveDate),
}

impl TaskKind {
    pub fn bucket(&self) -> Bucket {
        match self {
            TaskKind::Current => Bucket::Current,
            TaskKind::History(_) => Bucket::History,
            TaskKind::Forecast(_) => Bucket::Forecast,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            TaskKind::Current => None,
            TaskKind::History(d) | TaskKind::Forecast(d) => Some(*d),
        }
    }
}

/// One unit of work: fetch `kind` for the location at index `location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Task {
    pub location: usize,
    pub kind: TaskKind,
}

/// Every task of one run, split by bucket.
///
/// Each list is ordered by location index, then by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSet {
    pub current: Vec<Task>,
    pub history: Vec<Task>,
    pub forecast: Vec<Task>,
}

impl TaskSet {
    pub fn len(&self) -> usize {
        self.current.len() + self.history.len() + self.forecast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// History followed by forecast, the input of the temporal scheduler.
    pub fn temporal(&self) -> Vec<Task> {
        self.history.iter().chain(&self.forecast).copied().collect()
    }
}

/// The `days` calendar days strictly before `today`, oldest first.
pub fn history_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (1..=u64::from(days))
        .rev()
        .filter_map(|i| today.checked_sub_days(Days::new(i)))
        .collect()
}

/// The `days` calendar days strictly after `today`, earliest first.
pub fn forecast_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (1..=u64::from(days))
        .filter_map(|i| today.checked_add_days(Days::new(i)))
        .collect()
}

pub fn generate_tasks(
    location_count: usize,
    history_dates: &[NaiveDate],
    forecast_dates: &[NaiveDate],
) -> TaskSet {
    let current = (0..location_count)
        .map(|location| Task { location, kind: TaskKind::Current })
        .collect();

    let history = (0..location_count)
        .flat_map(|location| {
            history_dates.iter().map(move |&d| Task { location, kind: TaskKind::History(d) })
        })
        .collect();

    let forecast = (0..location_count)
        .flat_map(|location| {
            forecast_dates.iter().map(move |&d| Task { location, kind: TaskKind::Forecast(d) })
        })
        .collect();

    TaskSet { current, history, forecast }
}
