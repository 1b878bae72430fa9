//! Core library for the clustershift migration tool.
//!
//! The crate moves a managed database cluster from one cloud account to
//! another: it snapshots the source cluster, re-encrypts and shares the
//! snapshot, restores it in the destination account, and provisions writer
//! and reader instances when the engine mode calls for them. Provider calls
//! go through the [`ClusterBackend`] and [`KeyBackend`] traits; [`AwsBackend`]
//! implements them against RDS and KMS.

pub mod aws;
pub mod backend;
pub mod config;
pub mod fault;
pub mod keys;
pub mod migration;
pub mod poll;
#[cfg(test)]
pub mod test_helpers;
pub mod test_support;

pub use aws::{AwsBackend, AwsBackendError};
pub use backend::{
    Backend, BackendFuture, ClusterBackend, ClusterMaintenance, ClusterObservation,
    CopySnapshotRequest, CreateInstanceRequest, InstanceObservation, ResourceStatus,
    RestoreClusterRequest, SnapshotObservation,
};
pub use config::{ConfigError, MigrationConfig, SERVERLESS_ENGINE_MODE};
pub use fault::{Classify, FaultKind, classify};
pub use keys::{KeyBackend, KeyDescription};
pub use migration::{
    MigrationError, MigrationOrchestrator, MigrationPlan, MigrationReport, MigrationStep,
    snapshot_stamp,
};
pub use poll::{PollError, PollPolicy, ReadinessPoller, Visibility};
