//! Cluster snapshot calls.

use tracing::debug;

use super::types::snapshot_observation;
use super::{AwsBackend, AwsBackendError};
use crate::backend::{CopySnapshotRequest, SnapshotObservation};
use crate::keys::alias_key_id;

const CREATE: &str = "CreateDBClusterSnapshot";
const DESCRIBE: &str = "DescribeDBClusterSnapshots";
const COPY: &str = "CopyDBClusterSnapshot";
const SHARE: &str = "ModifyDBClusterSnapshotAttribute";
const DELETE: &str = "DeleteDBClusterSnapshot";

/// Snapshot attribute that controls which accounts may restore it.
const RESTORE_ATTRIBUTE: &str = "restore";

impl AwsBackend {
    pub(super) async fn create_snapshot(
        &self,
        cluster_id: &str,
        snapshot_id: &str,
    ) -> Result<SnapshotObservation, AwsBackendError> {
        debug!(account = %self.account, cluster_id, snapshot_id, "creating cluster snapshot");
        let output = self
            .rds
            .create_db_cluster_snapshot()
            .db_cluster_identifier(cluster_id)
            .db_cluster_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(CREATE, &err))?;
        let snapshot = output
            .db_cluster_snapshot()
            .ok_or_else(|| AwsBackendError::missing(CREATE, "DBClusterSnapshot"))?;
        snapshot_observation(CREATE, snapshot)
    }

    pub(super) async fn describe_snapshot(
        &self,
        snapshot_id: &str,
    ) -> Result<SnapshotObservation, AwsBackendError> {
        let output = self
            .rds
            .describe_db_cluster_snapshots()
            .db_cluster_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(DESCRIBE, &err))?;
        let snapshot = output.db_cluster_snapshots().first().ok_or_else(|| {
            AwsBackendError::NotFound {
                operation: DESCRIBE,
                resource: format!("snapshot {snapshot_id}"),
            }
        })?;
        snapshot_observation(DESCRIBE, snapshot)
    }

    pub(super) async fn copy_snapshot(
        &self,
        request: &CopySnapshotRequest,
    ) -> Result<SnapshotObservation, AwsBackendError> {
        debug!(
            account = %self.account,
            source = %request.source_snapshot_id,
            target = %request.target_snapshot_id,
            key_alias = %request.kms_key_alias,
            "copying cluster snapshot"
        );
        let output = self
            .rds
            .copy_db_cluster_snapshot()
            .source_db_cluster_snapshot_identifier(&request.source_snapshot_id)
            .target_db_cluster_snapshot_identifier(&request.target_snapshot_id)
            .kms_key_id(alias_key_id(&request.kms_key_alias))
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(COPY, &err))?;
        let snapshot = output
            .db_cluster_snapshot()
            .ok_or_else(|| AwsBackendError::missing(COPY, "DBClusterSnapshot"))?;
        snapshot_observation(COPY, snapshot)
    }

    pub(super) async fn share_snapshot(
        &self,
        snapshot_id: &str,
        account_id: &str,
    ) -> Result<(), AwsBackendError> {
        debug!(account = %self.account, snapshot_id, account_id, "sharing cluster snapshot");
        self.rds
            .modify_db_cluster_snapshot_attribute()
            .db_cluster_snapshot_identifier(snapshot_id)
            .attribute_name(RESTORE_ATTRIBUTE)
            .values_to_add(account_id)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(SHARE, &err))?;
        Ok(())
    }

    pub(super) async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), AwsBackendError> {
        debug!(account = %self.account, snapshot_id, "deleting cluster snapshot");
        self.rds
            .delete_db_cluster_snapshot()
            .db_cluster_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(DELETE, &err))?;
        Ok(())
    }
}
