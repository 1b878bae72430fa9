//! Conversions from SDK shapes into backend observations.

use aws_sdk_kms::types::KeyMetadata;
use aws_sdk_rds::types::{DbCluster, DbClusterSnapshot, DbInstance};

use super::AwsBackendError;
use crate::backend::{ClusterObservation, InstanceObservation, ResourceStatus, SnapshotObservation};
use crate::keys::{ALIAS_PREFIX, KeyDescription};

/// Returns `None` for blank values so optional request fields stay unset.
pub(super) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

pub(super) fn snapshot_observation(
    operation: &'static str,
    snapshot: &DbClusterSnapshot,
) -> Result<SnapshotObservation, AwsBackendError> {
    let id = snapshot
        .db_cluster_snapshot_identifier()
        .ok_or_else(|| AwsBackendError::missing(operation, "snapshot identifier"))?;
    let status = snapshot
        .status()
        .ok_or_else(|| AwsBackendError::missing(operation, "snapshot status"))?;
    Ok(SnapshotObservation {
        id: id.to_owned(),
        status: ResourceStatus::from(status),
        arn: snapshot.db_cluster_snapshot_arn().map(ToOwned::to_owned),
    })
}

pub(super) fn cluster_observation(
    operation: &'static str,
    cluster: &DbCluster,
) -> Result<ClusterObservation, AwsBackendError> {
    let id = cluster
        .db_cluster_identifier()
        .ok_or_else(|| AwsBackendError::missing(operation, "cluster identifier"))?;
    let status = cluster
        .status()
        .ok_or_else(|| AwsBackendError::missing(operation, "cluster status"))?;
    Ok(ClusterObservation {
        id: id.to_owned(),
        status: ResourceStatus::from(status),
        arn: cluster.db_cluster_arn().map(ToOwned::to_owned),
        engine_mode: cluster.engine_mode().map(ToOwned::to_owned),
    })
}

pub(super) fn instance_observation(
    operation: &'static str,
    instance: &DbInstance,
) -> Result<InstanceObservation, AwsBackendError> {
    let id = instance
        .db_instance_identifier()
        .ok_or_else(|| AwsBackendError::missing(operation, "instance identifier"))?;
    let status = instance
        .db_instance_status()
        .ok_or_else(|| AwsBackendError::missing(operation, "instance status"))?;
    Ok(InstanceObservation {
        id: id.to_owned(),
        status: ResourceStatus::from(status),
        instance_class: instance.db_instance_class().map(ToOwned::to_owned),
    })
}

pub(super) fn key_description(metadata: &KeyMetadata) -> KeyDescription {
    KeyDescription {
        key_id: metadata.key_id().to_owned(),
        arn: metadata.arn().map(ToOwned::to_owned),
        enabled: metadata.enabled(),
    }
}

/// Strips the `alias/` prefix the key service puts on every alias name.
pub(super) fn alias_name(raw: &str) -> String {
    raw.strip_prefix(ALIAS_PREFIX).unwrap_or(raw).to_owned()
}
