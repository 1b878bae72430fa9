//! Concurrent writer and reader provisioning for non-serverless clusters.

use tokio::sync::watch;
use tracing::info;

use super::{
    InstanceHandle, InstancePlan, InstanceSpec, MigrationError,
    MigrationOrchestrator, MigrationPlan, MigrationStep, ReaderOrdering,
};
use crate::backend::{ClusterBackend, STATUS_AVAILABLE};
use crate::keys::KeyBackend;
use crate::poll::Visibility;

impl<B> MigrationOrchestrator<B>
where
    B: ClusterBackend + KeyBackend + Sync,
{
    /// Runs the writer and reader flows together and returns once both
    /// instances are available. The first failing flow decides the error.
    pub(super) async fn provision_instances(
        &self,
        plan: &MigrationPlan,
        instances: &InstancePlan,
    ) -> Result<Vec<InstanceHandle>, MigrationError<B::Error>> {
        let (writer_ready, mut writer_observed) = watch::channel(false);
        let writer_flow = self.provision_writer(plan, &instances.writer, writer_ready);
        let reader_flow = self.provision_reader(plan, instances, &mut writer_observed);
        let (writer, reader) = tokio::try_join!(writer_flow, reader_flow)?;
        Ok(vec![writer, reader])
    }

    async fn provision_writer(
        &self,
        plan: &MigrationPlan,
        spec: &InstanceSpec,
        ready: watch::Sender<bool>,
    ) -> Result<InstanceHandle, MigrationError<B::Error>> {
        match self
            .provision_instance(plan, spec, MigrationStep::ProvisionWriterInstance)
            .await
        {
            Ok(handle) => {
                ready.send_replace(true);
                Ok(handle)
            }
            Err(err) => {
                // Closing the channel releases a reader still waiting.
                drop(ready);
                Err(err)
            }
        }
    }

    async fn provision_reader(
        &self,
        plan: &MigrationPlan,
        instances: &InstancePlan,
        writer_observed: &mut watch::Receiver<bool>,
    ) -> Result<InstanceHandle, MigrationError<B::Error>> {
        let step = MigrationStep::ProvisionReaderInstance;
        match instances.ordering {
            ReaderOrdering::AfterWriterAvailable => {
                info!(
                    reader = %instances.reader.id,
                    writer = %instances.writer.id,
                    "reader waiting for writer"
                );
                // Fails only when the writer flow ended without signalling.
                let writer_available = writer_observed.wait_for(|ready| *ready).await.is_ok();
                if !writer_available {
                    return Err(MigrationError::WriterUnavailable {
                        writer: instances.writer.id.clone(),
                        reader: instances.reader.id.clone(),
                    });
                }
            }
            ReaderOrdering::AfterDelay(delay) => {
                self.poller
                    .pause(&instances.reader.id, delay)
                    .await
                    .map_err(|source| MigrationError::Wait { step, source })?;
            }
        }
        self.provision_instance(plan, &instances.reader, step).await
    }

    async fn provision_instance(
        &self,
        plan: &MigrationPlan,
        spec: &InstanceSpec,
        step: MigrationStep,
    ) -> Result<InstanceHandle, MigrationError<B::Error>> {
        self.checkpoint(step)?;
        let request = plan.instance_request(spec);
        self.destination
            .create_instance(&request)
            .await
            .map_err(|source| MigrationError::Step { step, source })?;
        info!(
            instance = %spec.id,
            role = %spec.role,
            instance_class = %spec.instance_class,
            cluster = %request.cluster_id,
            "instance creation requested"
        );

        let mut handle =
            InstanceHandle::creating(spec.id.as_str(), spec.role, spec.instance_class.as_str());
        self.poller
            .wait_until(&handle.id, STATUS_AVAILABLE, Visibility::AfterCreate, || {
                self.destination.describe_instance(&spec.id)
            })
            .await
            .map_err(|source| MigrationError::Wait { step, source })?;
        handle.mark_available();
        info!(instance = %handle.id, role = %handle.role, "instance available");
        Ok(handle)
    }
}
