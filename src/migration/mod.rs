//! Orchestrates a cross-account cluster migration.
//!
//! The pipeline snapshots the source cluster, copies the snapshot under a
//! key the destination account may use, shares the copy, and restores it as
//! a new cluster in the destination account. Intermediate snapshots are
//! removed as soon as the artifact that supersedes them is available.
//! Non-serverless clusters then receive a writer and a reader instance,
//! provisioned concurrently.
//!
//! Every step waits for the provider to report the target status before the
//! next step starts. The first failure aborts the run; artifacts created up
//! to that point are left in place and named in the logs.

mod error;
mod plan;
mod preflight;
mod provision;
mod state;

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

pub use self::error::MigrationError;
pub use self::plan::{InstancePlan, InstanceSpec, MigrationPlan, ReaderOrdering, snapshot_stamp};
pub use self::state::{
    Account, ClusterHandle, ClusterState, InstanceHandle, InstanceRole, InstanceState,
    MigrationStep, SnapshotHandle, SnapshotState,
};
use crate::backend::{ClusterBackend, CopySnapshotRequest, STATUS_AVAILABLE};
use crate::keys::KeyBackend;
use crate::poll::{ReadinessPoller, Visibility};

/// Artifacts left behind by a successful run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MigrationReport {
    /// Snapshot of the source cluster, deleted once copied.
    pub source_snapshot: SnapshotHandle,
    /// Re-keyed copy, deleted once restored.
    pub shared_snapshot: SnapshotHandle,
    /// Cluster restored in the destination account.
    pub cluster: ClusterHandle,
    /// Instances provisioned for the cluster, writer first.
    pub instances: Vec<InstanceHandle>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Executes the migration pipeline against a source and a destination
/// account.
#[derive(Debug)]
pub struct MigrationOrchestrator<B> {
    source: B,
    destination: B,
    poller: ReadinessPoller,
}

impl<B> MigrationOrchestrator<B>
where
    B: ClusterBackend + KeyBackend + Sync,
{
    /// Creates an orchestrator over the two accounts.
    #[must_use]
    pub const fn new(source: B, destination: B, poller: ReadinessPoller) -> Self {
        Self {
            source,
            destination,
            poller,
        }
    }

    /// Runs every step of `plan` in order and reports the resulting
    /// artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] for the first step that fails, times out,
    /// or is cancelled. No compensating action is taken.
    pub async fn execute(
        &self,
        plan: &MigrationPlan,
    ) -> Result<MigrationReport, MigrationError<B::Error>> {
        let started = Instant::now();
        info!(
            source_cluster = %plan.source_cluster,
            destination_cluster = %plan.destination_cluster,
            destination_account = %plan.destination_account_id,
            engine_mode = %plan.engine_mode,
            "starting migration"
        );

        if plan.verify_keys {
            self.verify_keys(plan).await?;
        }

        let mut source_snapshot = self.create_source_snapshot(plan).await?;
        let mut shared_snapshot = self.copy_with_migration_key(plan).await?;

        self.delete_snapshot(MigrationStep::DeleteOriginalSnapshot, &mut source_snapshot)
            .await?;
        self.share_snapshot(plan, &mut shared_snapshot).await?;
        self.fetch_shared_arn(&mut shared_snapshot).await?;

        let cluster = self.restore_cluster(plan, &shared_snapshot).await?;
        self.delete_snapshot(MigrationStep::DeleteSharedSnapshotCopy, &mut shared_snapshot)
            .await?;

        let instances = match &plan.instances {
            Some(instance_plan) => self.provision_instances(plan, instance_plan).await?,
            None => {
                info!(
                    cluster = %cluster.id,
                    engine_mode = %cluster.engine_mode,
                    "serverless cluster; skipping instance provisioning"
                );
                Vec::new()
            }
        };

        if plan.maintenance.is_some() {
            self.apply_maintenance(plan, &instances).await?;
        }

        let elapsed = started.elapsed();
        info!(
            cluster = %cluster.id,
            instances = instances.len(),
            elapsed_secs = elapsed.as_secs(),
            "migration completed"
        );
        Ok(MigrationReport {
            source_snapshot,
            shared_snapshot,
            cluster,
            instances,
            elapsed,
        })
    }

    fn checkpoint(&self, step: MigrationStep) -> Result<(), MigrationError<B::Error>> {
        if self.poller.cancellation().is_cancelled() {
            warn!(%step, "migration cancelled");
            return Err(MigrationError::Cancelled { step });
        }
        info!(%step, "starting step");
        Ok(())
    }

    async fn create_source_snapshot(
        &self,
        plan: &MigrationPlan,
    ) -> Result<SnapshotHandle, MigrationError<B::Error>> {
        let step = MigrationStep::CreateSourceSnapshot;
        self.checkpoint(step)?;
        self.source
            .create_cluster_snapshot(&plan.source_cluster, &plan.snapshot_id)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;

        let mut handle = SnapshotHandle::creating(plan.snapshot_id.as_str());
        let observation = self
            .poller
            .wait_until(&handle.id, STATUS_AVAILABLE, Visibility::AfterCreate, || {
                self.source.describe_cluster_snapshot(&plan.snapshot_id)
            })
            .await
            .map_err(|source| MigrationError::Wait { step, source })?;
        handle.mark_available(observation.arn);
        info!(snapshot = %handle.id, cluster = %plan.source_cluster, "source snapshot available");
        Ok(handle)
    }

    async fn copy_with_migration_key(
        &self,
        plan: &MigrationPlan,
    ) -> Result<SnapshotHandle, MigrationError<B::Error>> {
        let step = MigrationStep::CopySnapshotWithNewKey;
        self.checkpoint(step)?;
        let request = CopySnapshotRequest {
            source_snapshot_id: plan.snapshot_id.clone(),
            target_snapshot_id: plan.copy_id.clone(),
            kms_key_alias: plan.migration_key_alias.clone(),
        };
        self.source
            .copy_cluster_snapshot(&request)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;

        let mut handle = SnapshotHandle::copying(plan.copy_id.as_str());
        let observation = self
            .poller
            .wait_until(&handle.id, STATUS_AVAILABLE, Visibility::AfterCreate, || {
                self.source.describe_cluster_snapshot(&plan.copy_id)
            })
            .await
            .map_err(|source| MigrationError::Wait { step, source })?;
        handle.mark_available(observation.arn);
        info!(
            snapshot = %handle.id,
            key_alias = %plan.migration_key_alias,
            "snapshot copy available"
        );
        Ok(handle)
    }

    async fn delete_snapshot(
        &self,
        step: MigrationStep,
        handle: &mut SnapshotHandle,
    ) -> Result<(), MigrationError<B::Error>> {
        self.checkpoint(step)?;
        self.source
            .delete_cluster_snapshot(&handle.id)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;
        handle.mark_deleted();
        info!(snapshot = %handle.id, "snapshot deleted");
        Ok(())
    }

    async fn share_snapshot(
        &self,
        plan: &MigrationPlan,
        handle: &mut SnapshotHandle,
    ) -> Result<(), MigrationError<B::Error>> {
        let step = MigrationStep::ShareSnapshotWithDestinationAccount;
        self.checkpoint(step)?;
        self.source
            .share_cluster_snapshot(&handle.id, &plan.destination_account_id)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;
        info!(
            snapshot = %handle.id,
            account = %plan.destination_account_id,
            "snapshot shared"
        );
        Ok(())
    }

    async fn fetch_shared_arn(
        &self,
        handle: &mut SnapshotHandle,
    ) -> Result<(), MigrationError<B::Error>> {
        let step = MigrationStep::FetchSharedSnapshotArn;
        self.checkpoint(step)?;
        let observation = self
            .source
            .describe_cluster_snapshot(&handle.id)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;
        let arn = observation
            .arn
            .filter(|arn| !arn.trim().is_empty())
            .ok_or_else(|| MigrationError::MissingArn {
                snapshot: handle.id.clone(),
            })?;
        info!(snapshot = %handle.id, %arn, "shared snapshot ARN captured");
        handle.mark_shared(arn);
        Ok(())
    }

    async fn restore_cluster(
        &self,
        plan: &MigrationPlan,
        snapshot: &SnapshotHandle,
    ) -> Result<ClusterHandle, MigrationError<B::Error>> {
        let step = MigrationStep::RestoreClusterFromSnapshot;
        self.checkpoint(step)?;
        let arn = snapshot
            .restorable_arn()
            .ok_or_else(|| MigrationError::MissingArn {
                snapshot: snapshot.id.clone(),
            })?;
        let request = plan.restore_request(arn);
        self.destination
            .restore_cluster_from_snapshot(&request)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;
        info!(
            cluster = %request.cluster_id,
            snapshot_arn = %request.snapshot_arn,
            engine = %request.engine,
            engine_version = %request.engine_version,
            "cluster restore requested"
        );

        let mut handle =
            ClusterHandle::restoring(request.cluster_id.as_str(), request.engine_mode.as_str());
        let observation = self
            .poller
            .wait_until(
                &handle.id,
                STATUS_AVAILABLE,
                Visibility::AfterCreate,
                || self.destination.describe_cluster(&request.cluster_id),
            )
            .await
            .map_err(|source| MigrationError::Wait { step, source })?;
        handle.mark_available(observation.engine_mode);
        info!(
            cluster = %handle.id,
            engine_mode = %handle.engine_mode,
            "destination cluster available"
        );
        Ok(handle)
    }

    async fn apply_maintenance(
        &self,
        plan: &MigrationPlan,
        instances: &[InstanceHandle],
    ) -> Result<(), MigrationError<B::Error>> {
        let step = MigrationStep::ApplyMaintenanceSettings;
        let Some(settings) = &plan.maintenance else {
            return Ok(());
        };
        self.checkpoint(step)?;
        self.destination
            .modify_cluster(&plan.destination_cluster, settings)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;
        for instance in instances {
            self.destination
                .modify_instance(&instance.id, &settings.maintenance_window)
                .await
                .map_err(|source| MigrationError::Step { step, source })?;
        }
        info!(
            cluster = %plan.destination_cluster,
            backup_window = %settings.backup_window,
            maintenance_window = %settings.maintenance_window,
            "maintenance settings applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests;
