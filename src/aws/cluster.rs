//! Cluster restore, describe and modify calls.

use tracing::debug;

use super::types::{cluster_observation, non_empty};
use super::{AwsBackend, AwsBackendError};
use crate::backend::{ClusterMaintenance, ClusterObservation, RestoreClusterRequest};
use crate::keys::alias_key_id;

const RESTORE: &str = "RestoreDBClusterFromSnapshot";
const DESCRIBE: &str = "DescribeDBClusters";
const MODIFY: &str = "ModifyDBCluster";

impl AwsBackend {
    pub(super) async fn restore_cluster(
        &self,
        request: &RestoreClusterRequest,
    ) -> Result<ClusterObservation, AwsBackendError> {
        debug!(
            account = %self.account,
            cluster_id = %request.cluster_id,
            snapshot_arn = %request.snapshot_arn,
            "restoring cluster from snapshot"
        );
        let mut call = self
            .rds
            .restore_db_cluster_from_snapshot()
            .db_cluster_identifier(&request.cluster_id)
            .snapshot_identifier(&request.snapshot_arn)
            .engine(&request.engine)
            .set_engine_version(non_empty(&request.engine_version))
            .set_engine_mode(non_empty(&request.engine_mode))
            .set_db_subnet_group_name(non_empty(&request.subnet_group))
            .kms_key_id(alias_key_id(&request.kms_key_alias))
            .deletion_protection(request.deletion_protection);
        if let Some(group) = non_empty(&request.security_group) {
            call = call.vpc_security_group_ids(group);
        }
        let output = call
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(RESTORE, &err))?;
        let cluster = output
            .db_cluster()
            .ok_or_else(|| AwsBackendError::missing(RESTORE, "DBCluster"))?;
        cluster_observation(RESTORE, cluster)
    }

    pub(super) async fn describe_db_cluster(
        &self,
        cluster_id: &str,
    ) -> Result<ClusterObservation, AwsBackendError> {
        let output = self
            .rds
            .describe_db_clusters()
            .db_cluster_identifier(cluster_id)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(DESCRIBE, &err))?;
        let cluster = output
            .db_clusters()
            .first()
            .ok_or_else(|| AwsBackendError::NotFound {
                operation: DESCRIBE,
                resource: format!("cluster {cluster_id}"),
            })?;
        cluster_observation(DESCRIBE, cluster)
    }

    pub(super) async fn modify_db_cluster(
        &self,
        cluster_id: &str,
        settings: &ClusterMaintenance,
    ) -> Result<(), AwsBackendError> {
        debug!(account = %self.account, cluster_id, "modifying cluster maintenance settings");
        self.rds
            .modify_db_cluster()
            .db_cluster_identifier(cluster_id)
            .apply_immediately(true)
            .preferred_backup_window(&settings.backup_window)
            .preferred_maintenance_window(&settings.maintenance_window)
            .backup_retention_period(settings.backup_retention_days)
            .deletion_protection(settings.deletion_protection)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(MODIFY, &err))?;
        Ok(())
    }
}
