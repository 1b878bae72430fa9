//! Resolved, immutable description of a single migration run.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::backend::{ClusterMaintenance, CreateInstanceRequest, RestoreClusterRequest};
use crate::config::MigrationConfig;

use super::state::{InstanceRole, MigrationStep};

const SNAPSHOT_PREFIX: &str = "migrationsnapshot-";
const SNAPSHOT_COPY_PREFIX: &str = "migrationsnapshotshared-";

/// Formats the timestamp embedded in snapshot names.
#[must_use]
pub fn snapshot_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// How the reader flow is ordered relative to the writer flow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReaderOrdering {
    /// Create the reader only once the writer has been observed available.
    AfterWriterAvailable,
    /// Create the reader after a fixed delay, concurrently with the writer.
    AfterDelay(Duration),
}

/// Name and size of one instance to provision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSpec {
    /// Instance identifier.
    pub id: String,
    /// Instance class.
    pub instance_class: String,
    /// Writer or reader.
    pub role: InstanceRole,
}

/// Instance provisioning for non-serverless clusters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstancePlan {
    /// Writer instance.
    pub writer: InstanceSpec,
    /// Reader instance.
    pub reader: InstanceSpec,
    /// Ordering between the two flows.
    pub ordering: ReaderOrdering,
}

/// Everything a run needs, resolved once from configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MigrationPlan {
    /// Cluster being snapshotted in the source account.
    pub source_cluster: String,
    /// Identifier of the initial snapshot.
    pub snapshot_id: String,
    /// Identifier of the re-keyed copy that is shared.
    pub copy_id: String,
    /// Source-account key alias used for the copy.
    pub migration_key_alias: String,
    /// Destination-account key alias used for the restored cluster.
    pub destination_key_alias: String,
    /// Account the copy is shared with.
    pub destination_account_id: String,
    /// Identifier of the restored cluster.
    pub destination_cluster: String,
    /// Engine family.
    pub engine: String,
    /// Engine version.
    pub engine_version: String,
    /// Engine mode.
    pub engine_mode: String,
    /// Subnet group for the restored cluster.
    pub subnet_group: String,
    /// Security group for the restored cluster.
    pub security_group: String,
    /// Administrator user carried over from the source cluster.
    pub admin_username: String,
    /// Instances to provision, absent for serverless clusters.
    pub instances: Option<InstancePlan>,
    /// Whether key aliases are checked before the first snapshot.
    pub verify_keys: bool,
    /// Settings applied after provisioning, when enabled.
    pub maintenance: Option<ClusterMaintenance>,
}

impl MigrationPlan {
    /// Resolves a plan from configuration, naming snapshots with `stamp`.
    #[must_use]
    pub fn from_config(config: &MigrationConfig, stamp: &str) -> Self {
        let instances = config.provisions_instances().then(|| InstancePlan {
            writer: InstanceSpec {
                id: config.writer_instance_name.clone(),
                instance_class: config.writer_instance_class.clone(),
                role: InstanceRole::Writer,
            },
            reader: InstanceSpec {
                id: config.reader_instance_name.clone(),
                instance_class: config.reader_instance_class.clone(),
                role: InstanceRole::Reader,
            },
            ordering: if config.reader_waits_for_writer {
                ReaderOrdering::AfterWriterAvailable
            } else {
                ReaderOrdering::AfterDelay(config.reader_start_delay())
            },
        });

        Self {
            source_cluster: config.source_cluster_name.trim().to_owned(),
            snapshot_id: format!("{SNAPSHOT_PREFIX}{stamp}"),
            copy_id: format!("{SNAPSHOT_COPY_PREFIX}{stamp}"),
            migration_key_alias: config.migration_key_alias.trim().to_owned(),
            destination_key_alias: config.destination_kms_key_alias.trim().to_owned(),
            destination_account_id: config.destination_account_id.trim().to_owned(),
            destination_cluster: config.destination_cluster().to_owned(),
            engine: config.destination_engine.trim().to_owned(),
            engine_version: config.destination_engine_version.trim().to_owned(),
            engine_mode: config.destination_engine_mode.trim().to_owned(),
            subnet_group: config.destination_subnet_group.trim().to_owned(),
            security_group: config.destination_security_group.trim().to_owned(),
            admin_username: config.admin_username.trim().to_owned(),
            instances,
            verify_keys: config.verify_keys,
            maintenance: config.maintenance(),
        }
    }

    /// Steps this plan will execute, in order. Writer and reader steps run
    /// concurrently and are listed writer first.
    #[must_use]
    pub fn steps(&self) -> Vec<MigrationStep> {
        let mut steps = Vec::with_capacity(11);
        if self.verify_keys {
            steps.push(MigrationStep::VerifyKeys);
        }
        steps.extend([
            MigrationStep::CreateSourceSnapshot,
            MigrationStep::CopySnapshotWithNewKey,
            MigrationStep::DeleteOriginalSnapshot,
            MigrationStep::ShareSnapshotWithDestinationAccount,
            MigrationStep::FetchSharedSnapshotArn,
            MigrationStep::RestoreClusterFromSnapshot,
            MigrationStep::DeleteSharedSnapshotCopy,
        ]);
        if self.instances.is_some() {
            steps.push(MigrationStep::ProvisionWriterInstance);
            steps.push(MigrationStep::ProvisionReaderInstance);
        }
        if self.maintenance.is_some() {
            steps.push(MigrationStep::ApplyMaintenanceSettings);
        }
        steps
    }

    /// Builds the restore request for the ARN captured after sharing.
    #[must_use]
    pub fn restore_request(&self, snapshot_arn: &str) -> RestoreClusterRequest {
        RestoreClusterRequest {
            cluster_id: self.destination_cluster.clone(),
            snapshot_arn: snapshot_arn.to_owned(),
            engine: self.engine.clone(),
            engine_version: self.engine_version.clone(),
            engine_mode: self.engine_mode.clone(),
            subnet_group: self.subnet_group.clone(),
            security_group: self.security_group.clone(),
            kms_key_alias: self.destination_key_alias.clone(),
            deletion_protection: true,
        }
    }

    /// Builds the creation request for one instance of the restored cluster.
    #[must_use]
    pub fn instance_request(&self, spec: &InstanceSpec) -> CreateInstanceRequest {
        CreateInstanceRequest {
            instance_id: spec.id.clone(),
            cluster_id: self.destination_cluster.clone(),
            instance_class: spec.instance_class.clone(),
            engine: self.engine.clone(),
        }
    }
}
