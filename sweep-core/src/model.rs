use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// A place metrics are collected for, e.g. a district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// Free-text key the provider resolves, e.g. "Madurai, Tamil Nadu, IN".
    pub query: String,
    pub coord: Coord,
}

/// Temporal category of a metric record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Current,
    History,
    Forecast,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Current => "current",
            Bucket::History => "history",
            Bucket::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful provider reading for one (location, window).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
    pub wind_speed_ms: f64,
}

/// One observation as it appears in a snapshot.
///
/// Either every metric is present and `error` is `None`, or `error` is set and
/// every metric is `None`. Use [`MetricRecord::observed`] and
/// [`MetricRecord::failed`] to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub rainfall_mm: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub worker_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricRecord {
    pub fn observed(obs: Observation, worker_id: usize, date: Option<NaiveDate>) -> Self {
        Self {
            temperature_c: Some(obs.temperature_c),
            humidity_pct: Some(obs.humidity_pct),
            rainfall_mm: Some(obs.rainfall_mm),
            wind_speed_ms: Some(obs.wind_speed_ms),
            worker_id,
            date,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, worker_id: usize, date: Option<NaiveDate>) -> Self {
        Self {
            temperature_c: None,
            humidity_pct: None,
            rainfall_mm: None,
            wind_speed_ms: None,
            worker_id,
            date,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything collected for one location in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    pub district: String,
    pub query: String,
    pub coord: Coord,
    pub current: MetricRecord,
    /// Ascending by date.
    pub history: Vec<MetricRecord>,
    /// Ascending by date.
    pub forecast: Vec<MetricRecord>,
}

/// Per-metric means over one bucket; `None` where nothing contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAverages {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub rainfall_mm: Option<f64>,
    pub wind_speed_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub current: MetricAverages,
    pub history: MetricAverages,
    pub forecast: MetricAverages,
}

/// Worker id -> number of records it produced.
pub type WorkerCounts = BTreeMap<usize, usize>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadMeta {
    pub current: WorkerCounts,
    pub history: WorkerCounts,
    pub forecast: WorkerCounts,
}

impl WorkloadMeta {
    pub fn bucket(&self, bucket: Bucket) -> &WorkerCounts {
        match bucket {
            Bucket::Current => &self.current,
            Bucket::History => &self.history,
            Bucket::Forecast => &self.forecast,
        }
    }

    pub(crate) fn bucket_mut(&mut self, bucket: Bucket) -> &mut WorkerCounts {
        match bucket {
            Bucket::Current => &mut self.current,
            Bucket::History => &mut self.history,
            Bucket::Forecast => &mut self.forecast,
        }
    }
}

/// Run configuration summary carried alongside the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub total_districts: usize,
    pub worker_count: usize,
    pub history_dates: Vec<NaiveDate>,
    pub forecast_dates: Vec<NaiveDate>,
    pub workload: WorkloadMeta,
}

/// The aggregated output of one complete run.
///
/// Built only by the aggregator; a later run produces a new snapshot rather
/// than editing this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    last_updated: DateTime<Utc>,
    districts: Vec<DistrictRecord>,
    averages: Averages,
    meta: SnapshotMeta,
}

impl Snapshot {
    pub(crate) fn new(
        last_updated: DateTime<Utc>,
        districts: Vec<DistrictRecord>,
        averages: Averages,
        meta: SnapshotMeta,
    ) -> Self {
        Self { last_updated, districts, averages, meta }
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn districts(&self) -> &[DistrictRecord] {
        &self.districts
    }

    pub fn district(&self, name: &str) -> Option<&DistrictRecord> {
        self.districts.iter().find(|d| d.district == name)
    }

    pub fn averages(&self) -> &Averages {
        &self.averages
    }

    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    /// Number of records with `error` set, across all buckets.
    pub fn error_count(&self) -> usize {
        self.districts
            .iter()
            .flat_map(|d| std::iter::once(&d.current).chain(&d.history).chain(&d.forecast))
            .filter(|r| r.is_error())
            .count()
    }
}
