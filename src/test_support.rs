//! Test support utilities shared across unit and integration tests.
//!
//! [`ScriptedBackend`] stands in for one cloud account. Siblings created with
//! [`ScriptedBackend::sibling`] share a single journal, so a test can assert
//! the global order of calls made against the source and destination
//! accounts.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::backend::{
    Backend, BackendFuture, ClusterBackend, ClusterMaintenance, ClusterObservation,
    CopySnapshotRequest, CreateInstanceRequest, InstanceObservation, ResourceStatus,
    RestoreClusterRequest, STATUS_AVAILABLE, SnapshotObservation,
};
use crate::fault::{Classify, FaultKind, classify};
use crate::keys::{KeyBackend, KeyDescription};

const STATUS_CREATING: &str = "creating";

/// Error returned by [`ScriptedBackend`], carrying a provider-style code.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{code}: scripted failure")]
pub struct ScriptedError {
    /// Provider error code, classified through [`classify`].
    pub code: String,
}

impl ScriptedError {
    /// Builds an error from a provider code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl Classify for ScriptedError {
    fn fault(&self) -> FaultKind {
        classify(&self.code)
    }
}

/// Operations that can be scripted to fail.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// `create_cluster_snapshot`.
    CreateSnapshot,
    /// `describe_cluster_snapshot`.
    DescribeSnapshot,
    /// `copy_cluster_snapshot`.
    CopySnapshot,
    /// `share_cluster_snapshot`.
    ShareSnapshot,
    /// `delete_cluster_snapshot`.
    DeleteSnapshot,
    /// `restore_cluster_from_snapshot`.
    RestoreCluster,
    /// `describe_cluster`.
    DescribeCluster,
    /// `modify_cluster`.
    ModifyCluster,
    /// `create_instance`.
    CreateInstance,
    /// `describe_instance`.
    DescribeInstance,
    /// `modify_instance`.
    ModifyInstance,
    /// `describe_key`.
    DescribeKey,
    /// `list_key_aliases`.
    ListKeyAliases,
}

/// A call recorded by [`ScriptedBackend`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedCall {
    /// Label of the backend that received the call.
    pub account: String,
    /// Operation invoked.
    pub operation: Operation,
    /// Primary resource identifier, or alias for key calls.
    pub resource: String,
}

/// Requests captured verbatim for assertions on their fields.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CapturedRequests {
    /// Copy requests in call order.
    pub copies: Vec<CopySnapshotRequest>,
    /// Restore requests in call order.
    pub restores: Vec<RestoreClusterRequest>,
    /// Instance creation requests in call order.
    pub instances: Vec<CreateInstanceRequest>,
    /// Cluster maintenance settings in call order.
    pub maintenance: Vec<ClusterMaintenance>,
}

/// Scripted outcome of one describe call. `State` holds no `Result` or `()`
/// values: rstest-bdd step worlds embed it.
#[derive(Clone, Debug)]
enum ScriptedStep {
    Status(String),
    Fail(ScriptedError),
}

#[derive(Debug, Default)]
struct State {
    journal: Vec<RecordedCall>,
    requests: CapturedRequests,
    statuses: HashMap<String, VecDeque<ScriptedStep>>,
    never_ready: Vec<String>,
    failures: HashMap<(Operation, Option<String>), ScriptedError>,
    shared_with: HashMap<String, String>,
    aliases: Vec<String>,
}

/// In-memory backend that records calls and replays scripted outcomes.
///
/// Describe calls pop the next scripted status for the resource; once the
/// script is exhausted the resource reports `available` unless it was marked
/// with [`ScriptedBackend::never_ready`].
#[derive(Clone, Debug)]
pub struct ScriptedBackend {
    label: String,
    state: Arc<Mutex<State>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Creates a backend labelled `account`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("account")
    }

    /// Creates a backend with the given journal label.
    #[must_use]
    pub fn named(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Returns a backend sharing this one's scripts and journal under a new
    /// label.
    #[must_use]
    pub fn sibling(&self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Arc::clone(&self.state),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues statuses returned by successive describe calls for `resource`.
    pub fn script_statuses<I, S>(&self, resource: &str, statuses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state();
        let queue = state.statuses.entry(resource.to_owned()).or_default();
        queue.extend(
            statuses
                .into_iter()
                .map(|status| ScriptedStep::Status(status.into())),
        );
    }

    /// Queues a describe failure for `resource`.
    pub fn script_describe_error(&self, resource: &str, code: &str) {
        self.state()
            .statuses
            .entry(resource.to_owned())
            .or_default()
            .push_back(ScriptedStep::Fail(ScriptedError::new(code)));
    }

    /// Makes `resource` report `creating` forever once its script runs out.
    pub fn never_ready(&self, resource: &str) {
        let mut state = self.state();
        if !state.never_ready.iter().any(|known| known == resource) {
            state.never_ready.push(resource.to_owned());
        }
    }

    /// Fails every call to `operation`.
    pub fn fail(&self, operation: Operation, code: &str) {
        self.state()
            .failures
            .insert((operation, None), ScriptedError::new(code));
    }

    /// Fails calls to `operation` that target `resource`.
    pub fn fail_for(&self, operation: Operation, resource: &str, code: &str) {
        self.state().failures.insert(
            (operation, Some(resource.to_owned())),
            ScriptedError::new(code),
        );
    }

    /// Sets the aliases returned by `list_key_aliases`.
    pub fn set_aliases<I, S>(&self, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().aliases = aliases.into_iter().map(Into::into).collect();
    }

    /// Returns every call recorded so far across siblings.
    #[must_use]
    pub fn journal(&self) -> Vec<RecordedCall> {
        self.state().journal.clone()
    }

    /// Returns the requests captured so far across siblings.
    #[must_use]
    pub fn requests(&self) -> CapturedRequests {
        self.state().requests.clone()
    }

    /// Counts recorded calls to `operation`, optionally for one resource.
    #[must_use]
    pub fn count(&self, operation: Operation, resource: Option<&str>) -> usize {
        self.state()
            .journal
            .iter()
            .filter(|call| {
                call.operation == operation
                    && resource.is_none_or(|wanted| call.resource == wanted)
            })
            .count()
    }

    /// Position of the first recorded call matching `operation` and
    /// `resource`.
    #[must_use]
    pub fn first_position(&self, operation: Operation, resource: &str) -> Option<usize> {
        self.state()
            .journal
            .iter()
            .position(|call| call.operation == operation && call.resource == resource)
    }

    /// Position of the last recorded call matching `operation` and
    /// `resource`.
    #[must_use]
    pub fn last_position(&self, operation: Operation, resource: &str) -> Option<usize> {
        self.state()
            .journal
            .iter()
            .rposition(|call| call.operation == operation && call.resource == resource)
    }

    fn record(&self, operation: Operation, resource: &str) -> Result<(), ScriptedError> {
        let mut state = self.state();
        state.journal.push(RecordedCall {
            account: self.label.clone(),
            operation,
            resource: resource.to_owned(),
        });
        if let Some(err) = state
            .failures
            .get(&(operation, Some(resource.to_owned())))
            .or_else(|| state.failures.get(&(operation, None)))
        {
            return Err(err.clone());
        }
        Ok(())
    }

    fn next_status(&self, resource: &str) -> Result<ResourceStatus, ScriptedError> {
        let mut state = self.state();
        if let Some(next) = state
            .statuses
            .get_mut(resource)
            .and_then(VecDeque::pop_front)
        {
            return match next {
                ScriptedStep::Status(status) => Ok(ResourceStatus::new(status)),
                ScriptedStep::Fail(err) => Err(err),
            };
        }
        if state.never_ready.iter().any(|known| known == resource) {
            return Ok(ResourceStatus::from(STATUS_CREATING));
        }
        Ok(ResourceStatus::from(STATUS_AVAILABLE))
    }

    fn restored_engine_mode(&self, cluster_id: &str) -> Option<String> {
        self.state()
            .requests
            .restores
            .iter()
            .rev()
            .find(|request| request.cluster_id == cluster_id)
            .map(|request| request.engine_mode.clone())
            .filter(|mode| !mode.is_empty())
    }

    fn snapshot_arn(&self, snapshot_id: &str) -> String {
        let base = format!("arn:scripted:rds:cluster-snapshot:{snapshot_id}");
        match self.state().shared_with.get(snapshot_id) {
            Some(account) => format!("{base}:shared-with-{account}"),
            None => base,
        }
    }
}

impl Backend for ScriptedBackend {
    type Error = ScriptedError;
}

impl ClusterBackend for ScriptedBackend {
    fn create_cluster_snapshot<'a>(
        &'a self,
        _cluster_id: &'a str,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error> {
        Box::pin(async move {
            self.record(Operation::CreateSnapshot, snapshot_id)?;
            Ok(SnapshotObservation {
                id: snapshot_id.to_owned(),
                status: ResourceStatus::from(STATUS_CREATING),
                arn: Some(self.snapshot_arn(snapshot_id)),
            })
        })
    }

    fn describe_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error> {
        Box::pin(async move {
            self.record(Operation::DescribeSnapshot, snapshot_id)?;
            let status = self.next_status(snapshot_id)?;
            Ok(SnapshotObservation {
                id: snapshot_id.to_owned(),
                status,
                arn: Some(self.snapshot_arn(snapshot_id)),
            })
        })
    }

    fn copy_cluster_snapshot<'a>(
        &'a self,
        request: &'a CopySnapshotRequest,
    ) -> BackendFuture<'a, SnapshotObservation, Self::Error> {
        Box::pin(async move {
            self.record(Operation::CopySnapshot, &request.target_snapshot_id)?;
            self.state().requests.copies.push(request.clone());
            Ok(SnapshotObservation {
                id: request.target_snapshot_id.clone(),
                status: ResourceStatus::from("copying"),
                arn: Some(self.snapshot_arn(&request.target_snapshot_id)),
            })
        })
    }

    fn share_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
        account_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(Operation::ShareSnapshot, snapshot_id)?;
            self.state()
                .shared_with
                .insert(snapshot_id.to_owned(), account_id.to_owned());
            Ok(())
        })
    }

    fn delete_cluster_snapshot<'a>(
        &'a self,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.record(Operation::DeleteSnapshot, snapshot_id) })
    }

    fn restore_cluster_from_snapshot<'a>(
        &'a self,
        request: &'a RestoreClusterRequest,
    ) -> BackendFuture<'a, ClusterObservation, Self::Error> {
        Box::pin(async move {
            self.record(Operation::RestoreCluster, &request.cluster_id)?;
            self.state().requests.restores.push(request.clone());
            Ok(ClusterObservation {
                id: request.cluster_id.clone(),
                status: ResourceStatus::from(STATUS_CREATING),
                arn: None,
                engine_mode: Some(request.engine_mode.clone()),
            })
        })
    }

    fn describe_cluster<'a>(
        &'a self,
        cluster_id: &'a str,
    ) -> BackendFuture<'a, ClusterObservation, Self::Error> {
        Box::pin(async move {
            self.record(Operation::DescribeCluster, cluster_id)?;
            let status = self.next_status(cluster_id)?;
            Ok(ClusterObservation {
                id: cluster_id.to_owned(),
                status,
                arn: Some(format!("arn:scripted:rds:cluster:{cluster_id}")),
                engine_mode: self.restored_engine_mode(cluster_id),
            })
        })
    }

    fn modify_cluster<'a>(
        &'a self,
        cluster_id: &'a str,
        settings: &'a ClusterMaintenance,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(Operation::ModifyCluster, cluster_id)?;
            self.state().requests.maintenance.push(settings.clone());
            Ok(())
        })
    }

    fn create_instance<'a>(
        &'a self,
        request: &'a CreateInstanceRequest,
    ) -> BackendFuture<'a, InstanceObservation, Self::Error> {
        Box::pin(async move {
            self.record(Operation::CreateInstance, &request.instance_id)?;
            self.state().requests.instances.push(request.clone());
            Ok(InstanceObservation {
                id: request.instance_id.clone(),
                status: ResourceStatus::from(STATUS_CREATING),
                instance_class: Some(request.instance_class.clone()),
            })
        })
    }

    fn describe_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> BackendFuture<'a, InstanceObservation, Self::Error> {
        Box::pin(async move {
            self.record(Operation::DescribeInstance, instance_id)?;
            let status = self.next_status(instance_id)?;
            Ok(InstanceObservation {
                id: instance_id.to_owned(),
                status,
                instance_class: None,
            })
        })
    }

    fn modify_instance<'a>(
        &'a self,
        instance_id: &'a str,
        _maintenance_window: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.record(Operation::ModifyInstance, instance_id) })
    }
}

impl KeyBackend for ScriptedBackend {
    fn describe_key<'a>(
        &'a self,
        alias: &'a str,
    ) -> BackendFuture<'a, KeyDescription, Self::Error> {
        Box::pin(async move {
            self.record(Operation::DescribeKey, alias)?;
            Ok(KeyDescription {
                key_id: format!("key-{alias}"),
                arn: Some(format!("arn:scripted:kms:key/{alias}")),
                enabled: true,
            })
        })
    }

    fn list_key_aliases(&self) -> BackendFuture<'_, Vec<String>, Self::Error> {
        Box::pin(async move {
            self.record(Operation::ListKeyAliases, "*")?;
            Ok(self.state().aliases.clone())
        })
    }
}
