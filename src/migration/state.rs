//! Pipeline steps and the handles tracking each artifact they produce.
//!
//! Handle states only advance after the readiness poller has observed the
//! corresponding provider status; nothing downstream reads a handle that is
//! still in a transitional state.

use std::fmt;

/// Ordered steps of the migration pipeline.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MigrationStep {
    /// Check that both encryption keys exist before touching any data.
    VerifyKeys,
    /// Snapshot the source cluster.
    CreateSourceSnapshot,
    /// Copy the snapshot under the migration key.
    CopySnapshotWithNewKey,
    /// Remove the original snapshot once its copy is available.
    DeleteOriginalSnapshot,
    /// Grant the destination account restore permission on the copy.
    ShareSnapshotWithDestinationAccount,
    /// Re-read the copy to capture the ARN addressable cross-account.
    FetchSharedSnapshotArn,
    /// Restore the destination cluster from the shared copy.
    RestoreClusterFromSnapshot,
    /// Remove the shared copy once the destination cluster is available.
    DeleteSharedSnapshotCopy,
    /// Create the writer instance and wait for it.
    ProvisionWriterInstance,
    /// Create the reader instance and wait for it.
    ProvisionReaderInstance,
    /// Apply backup and maintenance windows to the destination resources.
    ApplyMaintenanceSettings,
}

impl MigrationStep {
    const fn label(self) -> &'static str {
        match self {
            Self::VerifyKeys => "verify encryption keys",
            Self::CreateSourceSnapshot => "create source snapshot",
            Self::CopySnapshotWithNewKey => "copy snapshot with migration key",
            Self::DeleteOriginalSnapshot => "delete original snapshot",
            Self::ShareSnapshotWithDestinationAccount => "share snapshot with destination account",
            Self::FetchSharedSnapshotArn => "fetch shared snapshot ARN",
            Self::RestoreClusterFromSnapshot => "restore cluster from snapshot",
            Self::DeleteSharedSnapshotCopy => "delete shared snapshot copy",
            Self::ProvisionWriterInstance => "provision writer instance",
            Self::ProvisionReaderInstance => "provision reader instance",
            Self::ApplyMaintenanceSettings => "apply maintenance settings",
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Account a call is made against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Account {
    /// Account owning the source cluster.
    Source,
    /// Account receiving the migrated cluster.
    Destination,
}

impl fmt::Display for Account {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Source => "source",
            Self::Destination => "destination",
        })
    }
}

/// Lifecycle of a snapshot within the pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SnapshotState {
    /// Snapshot requested; not yet usable.
    Creating,
    /// Copy requested; not yet usable.
    Copying,
    /// Observed as available.
    Available,
    /// Restore permission granted to the destination account.
    Shared,
    /// Removed after a later artifact superseded it.
    Deleted,
}

/// Tracks one snapshot produced by the pipeline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SnapshotHandle {
    /// Snapshot identifier.
    pub id: String,
    /// ARN, once observed.
    pub arn: Option<String>,
    /// Current lifecycle state.
    pub state: SnapshotState,
}

impl SnapshotHandle {
    /// Handle for a snapshot whose creation was just requested.
    #[must_use]
    pub fn creating(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            arn: None,
            state: SnapshotState::Creating,
        }
    }

    /// Handle for a copy whose creation was just requested.
    #[must_use]
    pub fn copying(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            arn: None,
            state: SnapshotState::Copying,
        }
    }

    /// Records that the poller observed the snapshot as available.
    pub fn mark_available(&mut self, arn: Option<String>) {
        self.arn = arn;
        self.state = SnapshotState::Available;
    }

    /// Records the share and the ARN re-read after it.
    pub fn mark_shared(&mut self, arn: String) {
        self.arn = Some(arn);
        self.state = SnapshotState::Shared;
    }

    /// Records that the snapshot was deleted.
    pub const fn mark_deleted(&mut self) {
        self.state = SnapshotState::Deleted;
    }

    /// Returns the ARN the destination account can restore from, which only
    /// exists once the snapshot has been shared.
    #[must_use]
    pub fn restorable_arn(&self) -> Option<&str> {
        match self.state {
            SnapshotState::Shared => self.arn.as_deref(),
            _ => None,
        }
    }
}

/// Lifecycle of the destination cluster.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClusterState {
    /// Restore requested; not yet usable.
    Restoring,
    /// Observed as available.
    Available,
}

/// Tracks the destination cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterHandle {
    /// Cluster identifier.
    pub id: String,
    /// Current lifecycle state.
    pub state: ClusterState,
    /// Engine mode the cluster was restored with.
    pub engine_mode: String,
}

impl ClusterHandle {
    /// Tracks a cluster whose restore was just requested.
    #[must_use]
    pub fn restoring(id: impl Into<String>, engine_mode: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: ClusterState::Restoring,
            engine_mode: engine_mode.into(),
        }
    }

    /// Records that the cluster is available, keeping the engine mode the
    /// provider reports over the requested one.
    pub fn mark_available(&mut self, reported_engine_mode: Option<String>) {
        if let Some(mode) = reported_engine_mode.filter(|mode| !mode.trim().is_empty()) {
            self.engine_mode = mode;
        }
        self.state = ClusterState::Available;
    }
}

/// Role an instance plays in the destination cluster.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstanceRole {
    /// Accepts writes.
    Writer,
    /// Serves reads.
    Reader,
}

impl fmt::Display for InstanceRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Writer => "writer",
            Self::Reader => "reader",
        })
    }
}

/// Lifecycle of a provisioned instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstanceState {
    /// Creation requested; not yet usable.
    Creating,
    /// Observed as available.
    Available,
}

/// Tracks one provisioned instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceHandle {
    /// Instance identifier.
    pub id: String,
    /// Writer or reader.
    pub role: InstanceRole,
    /// Instance class.
    pub instance_class: String,
    /// Current lifecycle state.
    pub state: InstanceState,
}

impl InstanceHandle {
    /// Tracks an instance whose creation was just requested.
    #[must_use]
    pub fn creating(
        id: impl Into<String>,
        role: InstanceRole,
        instance_class: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            instance_class: instance_class.into(),
            state: InstanceState::Creating,
        }
    }

    /// Records that the instance is available.
    pub const fn mark_available(&mut self) {
        self.state = InstanceState::Available;
    }
}
