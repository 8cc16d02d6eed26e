//! Core library for the `weather-sweep` CLI.
//!
//! This crate defines:
//! - The fetch-and-aggregate engine: task generation, spatial and round-robin
//!   assignment, fetch workers and the coordinator that merges their output
//! - Abstraction over weather providers
//! - Shared domain models (locations, metric records, snapshots)
//! - Configuration, location lists and snapshot persistence
//!
//! It is used by `weather-sweep`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod coordinator;
pub mod locations;
pub mod model;
pub mod partition;
pub mod provider;
pub mod store;
pub mod task;
pub mod worker;

pub use config::{Config, ProviderConfig, RunSettings};
pub use coordinator::{Coordinator, RunError, RunRequest};
pub use model::{
    Averages, Bucket, Coord, DistrictRecord, Location, MetricAverages, MetricRecord, Observation,
    Snapshot, SnapshotMeta, WorkloadMeta,
};
pub use provider::{MetricsProvider, ProviderId};
pub use store::SnapshotStore;
pub use task::TaskKind;
