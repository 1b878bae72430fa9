//! Instance calls.

use tracing::debug;

use super::types::instance_observation;
use super::{AwsBackend, AwsBackendError};
use crate::backend::{CreateInstanceRequest, InstanceObservation};

const CREATE: &str = "CreateDBInstance";
const DESCRIBE: &str = "DescribeDBInstances";
const MODIFY: &str = "ModifyDBInstance";

impl AwsBackend {
    pub(super) async fn create_db_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<InstanceObservation, AwsBackendError> {
        debug!(
            account = %self.account,
            instance_id = %request.instance_id,
            cluster_id = %request.cluster_id,
            instance_class = %request.instance_class,
            "creating instance"
        );
        let output = self
            .rds
            .create_db_instance()
            .db_instance_identifier(&request.instance_id)
            .db_cluster_identifier(&request.cluster_id)
            .db_instance_class(&request.instance_class)
            .engine(&request.engine)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(CREATE, &err))?;
        let instance = output
            .db_instance()
            .ok_or_else(|| AwsBackendError::missing(CREATE, "DBInstance"))?;
        instance_observation(CREATE, instance)
    }

    pub(super) async fn describe_db_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceObservation, AwsBackendError> {
        let output = self
            .rds
            .describe_db_instances()
            .db_instance_identifier(instance_id)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(DESCRIBE, &err))?;
        let instance = output
            .db_instances()
            .first()
            .ok_or_else(|| AwsBackendError::NotFound {
                operation: DESCRIBE,
                resource: format!("instance {instance_id}"),
            })?;
        instance_observation(DESCRIBE, instance)
    }

    pub(super) async fn modify_db_instance(
        &self,
        instance_id: &str,
        maintenance_window: &str,
    ) -> Result<(), AwsBackendError> {
        debug!(account = %self.account, instance_id, maintenance_window, "modifying instance");
        self.rds
            .modify_db_instance()
            .db_instance_identifier(instance_id)
            .preferred_maintenance_window(maintenance_window)
            .apply_immediately(true)
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(MODIFY, &err))?;
        Ok(())
    }
}
