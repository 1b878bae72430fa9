//! Backend abstraction over the managed database-cluster service.
//!
//! Each method issues a single request against one account's endpoint and
//! returns either the observed resource or a classified failure. Which account
//! a call targets is decided by which backend value the caller holds.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::fault::Classify;

/// Status string reported once a snapshot, cluster or instance is usable.
pub const STATUS_AVAILABLE: &str = "available";

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Lifecycle status string reported by the provider (for example `creating`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceStatus(String);

impl ResourceStatus {
    /// Wraps a provider status string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw status string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Compares against a target status, ignoring ASCII case.
    #[must_use]
    pub fn is(&self, target: &str) -> bool {
        self.0.eq_ignore_ascii_case(target)
    }
}

impl From<&str> for ResourceStatus {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Current view of a cluster snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SnapshotObservation {
    /// Snapshot identifier.
    pub id: String,
    /// Lifecycle status.
    pub status: ResourceStatus,
    /// Snapshot ARN once the provider reports one.
    pub arn: Option<String>,
}

/// Current view of a database cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterObservation {
    /// Cluster identifier.
    pub id: String,
    /// Lifecycle status.
    pub status: ResourceStatus,
    /// Cluster ARN once the provider reports one.
    pub arn: Option<String>,
    /// Engine mode (for example `provisioned` or `serverless`).
    pub engine_mode: Option<String>,
}

/// Current view of a database instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceObservation {
    /// Instance identifier.
    pub id: String,
    /// Lifecycle status.
    pub status: ResourceStatus,
    /// Instance class (for example `db.r5.xlarge`).
    pub instance_class: Option<String>,
}

/// Parameters for copying a snapshot under a different key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CopySnapshotRequest {
    /// Snapshot being copied.
    pub source_snapshot_id: String,
    /// Identifier for the copy.
    pub target_snapshot_id: String,
    /// Alias (without the `alias/` prefix) of the key used to re-encrypt.
    pub kms_key_alias: String,
}

/// Parameters for restoring a cluster from a shared snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RestoreClusterRequest {
    /// Identifier of the cluster to create.
    pub cluster_id: String,
    /// ARN of the snapshot, as addressable by the restoring account.
    pub snapshot_arn: String,
    /// Engine family.
    pub engine: String,
    /// Engine version.
    pub engine_version: String,
    /// Engine mode.
    pub engine_mode: String,
    /// Subnet group placing the cluster in the destination network.
    pub subnet_group: String,
    /// Security group attached to the cluster.
    pub security_group: String,
    /// Alias (without the `alias/` prefix) of the destination encryption key.
    pub kms_key_alias: String,
    /// Whether deletion protection is enabled on the new cluster.
    pub deletion_protection: bool,
}

/// Parameters for adding an instance to a cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateInstanceRequest {
    /// Identifier of the instance to create.
    pub instance_id: String,
    /// Cluster the instance joins.
    pub cluster_id: String,
    /// Instance class.
    pub instance_class: String,
    /// Engine family, matching the cluster.
    pub engine: String,
}

/// Backup and maintenance settings applied to a restored cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterMaintenance {
    /// Daily backup window, `hh24:mi-hh24:mi` in UTC.
    pub backup_window: String,
    /// Weekly maintenance window, `ddd:hh24:mi-ddd:hh24:mi` in UTC.
    pub maintenance_window: String,
    /// Days automated backups are retained.
    pub backup_retention_days: i32,
    /// Whether deletion protection is enabled.
    pub deletion_protection: bool,
}

/// Base trait carrying the provider error type.
pub trait Backend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Classify + Send + Sync + 'static;
}

/// Snapshot, cluster and instance operations against one account.
pub trait ClusterBackend: Backend {
    /// Starts a manual snapshot of a cluster.
    fn create_cluster_snapshot<'a>(
        &'a self,
        cluster_id: &'a str,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error>;

    /// Describes a cluster snapshot owned by this account.
    fn describe_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error>;

    /// Copies a snapshot, re-encrypting it under another key.
    fn copy_cluster_snapshot<'a>(
        &'a self,
        request: &'a CopySnapshotRequest,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error>;

    /// Grants another account permission to restore from a snapshot.
    fn share_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
        account_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error>;

    /// Deletes a snapshot.
    fn delete_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error>;

    /// Restores a new cluster from a snapshot ARN.
    fn restore_cluster_from_snapshot<'a>(
        &'a self,
        request: &'a RestoreClusterRequest,
    ) -> BackendFuture<'a, ClusterObservation, Self::Error>;

    /// Describes a cluster.
    fn describe_cluster<'a>(
        &'a self,
        cluster_id: &'a str,
    ) -> BackendFuture<'a, ClusterObservation, Self::Error>;

    /// Applies backup and maintenance settings to a cluster immediately.
    fn modify_cluster<'a>(
        &'a self,
        cluster_id: &'a str,
        settings: &'a ClusterMaintenance,
    ) -> BackendFuture<'a, (), Self::Error>;

    /// Adds an instance to a cluster.
    fn create_instance<'a>(
        &'a self,
        request: &'a CreateInstanceRequest,
    ) -> BackendFuture<'a, InstanceObservation, Self::Error>;

    /// Describes an instance.
    fn describe_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> BackendFuture<'a, InstanceObservation, Self::Error>;

    /// Sets an instance's weekly maintenance window immediately.
    fn modify_instance<'a>(
        &'a self,
        instance_id: &'a str,
        maintenance_window: &'a str,
    ) -> BackendFuture<'a, (), Self::Error>;
}
