//! AWS backend for cluster, snapshot and key operations.
//!
//! One [`AwsBackend`] talks to one account: it holds RDS and KMS clients
//! built from a named credentials profile and a region.

mod cluster;
mod error;
mod instance;
mod keys;
mod snapshot;
mod types;

use aws_config::{BehaviorVersion, Region};
use tracing::debug;

pub use error::AwsBackendError;

use crate::backend::{
    Backend, BackendFuture, ClusterBackend, ClusterMaintenance, ClusterObservation,
    CopySnapshotRequest, CreateInstanceRequest, InstanceObservation, RestoreClusterRequest,
    SnapshotObservation,
};

/// Backend that drives the RDS and KMS APIs of a single account.
#[derive(Clone, Debug)]
pub struct AwsBackend {
    rds: aws_sdk_rds::Client,
    kms: aws_sdk_kms::Client,
    account: String,
}

impl AwsBackend {
    /// Builds clients for `profile` in `region`. An empty profile uses the
    /// default credential chain.
    ///
    /// # Errors
    ///
    /// Returns [`AwsBackendError::Config`] when no region is given.
    pub async fn connect(
        account: &str,
        profile: &str,
        region: &str,
    ) -> Result<Self, AwsBackendError> {
        let region_name = types::non_empty(region).ok_or_else(|| {
            AwsBackendError::Config(format!("no region configured for the {account} account"))
        })?;
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region_name));
        if let Some(profile_name) = types::non_empty(profile) {
            loader = loader.profile_name(profile_name);
        }
        let shared = loader.load().await;
        debug!(account, profile, region, "cloud clients configured");
        Ok(Self::from_clients(
            account,
            aws_sdk_rds::Client::new(&shared),
            aws_sdk_kms::Client::new(&shared),
        ))
    }

    /// Wraps existing clients, for callers that build their own SDK config.
    #[must_use]
    pub fn from_clients(
        account: &str,
        rds: aws_sdk_rds::Client,
        kms: aws_sdk_kms::Client,
    ) -> Self {
        Self {
            rds,
            kms,
            account: account.to_owned(),
        }
    }

    /// Label used in logs for this account.
    #[must_use]
    pub const fn account(&self) -> &str {
        self.account.as_str()
    }
}

impl Backend for AwsBackend {
    type Error = AwsBackendError;
}

impl ClusterBackend for AwsBackend {
    fn create_cluster_snapshot<'a>(
        &'a self,
        cluster_id: &'a str,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error> {
        Box::pin(async move { self.create_snapshot(cluster_id, snapshot_id).await })
    }

    fn describe_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error> {
        Box::pin(async move { self.describe_snapshot(snapshot_id).await })
    }

    fn copy_cluster_snapshot<'a>(
        &'a self,
        request: &'a CopySnapshotRequest,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error> {
        Box::pin(async move { self.copy_snapshot(request).await })
    }

    fn share_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
        account_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.share_snapshot(snapshot_id, account_id).await })
    }

    fn delete_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete_snapshot(snapshot_id).await })
    }

    fn restore_cluster_from_snapshot<'a>(
        &'a self,
        request: &'a RestoreClusterRequest,
    ) -> BackendFuture<'a, ClusterObservation, Self::Error> {
        Box::pin(async move { self.restore_cluster(request).await })
    }

    fn describe_cluster<'a>(
        &'a self,
        cluster_id: &'a str,
    ) -> BackendFuture<'a, ClusterObservation, Self::Error> {
        Box::pin(async move { self.describe_db_cluster(cluster_id).await })
    }

    fn modify_cluster<'a>(
        &'a self,
        cluster_id: &'a str,
        settings: &'a ClusterMaintenance,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.modify_db_cluster(cluster_id, settings).await })
    }

    fn create_instance<'a>(
        &'a self,
        request: &'a CreateInstanceRequest,
    ) -> BackendFuture<'a, InstanceObservation, Self::Error> {
        Box::pin(async move { self.create_db_instance(request).await })
    }

    fn describe_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> BackendFuture<'a, InstanceObservation, Self::Error> {
        Box::pin(async move { self.describe_db_instance(instance_id).await })
    }

    fn modify_instance<'a>(
        &'a self,
        instance_id: &'a str,
        maintenance_window: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.modify_db_instance(instance_id, maintenance_window)
                .await
        })
    }
}
