//! Errors surfaced by the migration orchestrator.

use thiserror::Error;

use crate::fault::{Classify, FaultKind};
use crate::poll::PollError;

use super::state::{Account, MigrationStep};

/// Errors surfaced while migrating a cluster.
#[derive(Debug, Error)]
pub enum MigrationError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when a provider call made by a step fails.
    #[error("{step} failed: {source}")]
    Step {
        /// Step that issued the call.
        step: MigrationStep,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
    /// Raised when a readiness wait does not complete.
    #[error("{step} did not complete: {source}")]
    Wait {
        /// Step that was waiting.
        step: MigrationStep,
        /// Underlying wait failure.
        #[source]
        source: PollError<BackendError>,
    },
    /// Raised when the shared snapshot has no ARN to restore from.
    #[error("snapshot {snapshot} has no ARN visible to the destination account")]
    MissingArn {
        /// Snapshot identifier.
        snapshot: String,
    },
    /// Raised when a key alias does not exist in the account that needs it.
    #[error(
        "key alias {alias} not found in the {account} account (available: {})",
        format_aliases(.available)
    )]
    KeyUnavailable {
        /// Account that was checked.
        account: Account,
        /// Alias that was requested.
        alias: String,
        /// Aliases the account does have.
        available: Vec<String>,
    },
    /// Raised when a key alias resolves to a disabled key.
    #[error("key alias {alias} in the {account} account is disabled")]
    KeyDisabled {
        /// Account that was checked.
        account: Account,
        /// Alias that was requested.
        alias: String,
    },
    /// Raised when the reader flow is left without an available writer.
    #[error("reader instance {reader} not created: writer {writer} never became available")]
    WriterUnavailable {
        /// Writer instance identifier.
        writer: String,
        /// Reader instance identifier.
        reader: String,
    },
    /// Raised when the run is cancelled between steps.
    #[error("migration cancelled before {step}")]
    Cancelled {
        /// Step that did not start.
        step: MigrationStep,
    },
}

fn format_aliases(aliases: &[String]) -> String {
    if aliases.is_empty() {
        String::from("none")
    } else {
        aliases.join(", ")
    }
}

impl<E> MigrationError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the step the error is attributed to, when there is one.
    #[must_use]
    pub const fn step(&self) -> Option<MigrationStep> {
        match self {
            Self::Step { step, .. } | Self::Wait { step, .. } | Self::Cancelled { step } => {
                Some(*step)
            }
            Self::MissingArn { .. } => Some(MigrationStep::FetchSharedSnapshotArn),
            Self::KeyUnavailable { .. } | Self::KeyDisabled { .. } => {
                Some(MigrationStep::VerifyKeys)
            }
            Self::WriterUnavailable { .. } => Some(MigrationStep::ProvisionReaderInstance),
        }
    }
}

impl<E> Classify for MigrationError<E>
where
    E: std::error::Error + Classify + 'static,
{
    fn fault(&self) -> FaultKind {
        match self {
            Self::Step { source, .. } => source.fault(),
            Self::Wait { source, .. } => source.fault(),
            Self::KeyUnavailable { .. } => FaultKind::NotFound,
            Self::KeyDisabled { .. } => FaultKind::InvalidState,
            Self::MissingArn { .. } | Self::WriterUnavailable { .. } | Self::Cancelled { .. } => {
                FaultKind::Unclassified
            }
        }
    }
}
