//! Failure taxonomy shared by every cloud operation.
//!
//! Providers report failures as string codes. [`classify`] maps a code onto a
//! [`FaultKind`] once, so callers branch on the kind instead of matching
//! provider codes at each call site.

use std::fmt;

/// Classification of a failed cloud operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FaultKind {
    /// The resource (or a resource it references) does not exist.
    NotFound,
    /// The resource exists but cannot make the requested transition.
    InvalidState,
    /// A quota or capacity limit was hit; surface to the operator.
    QuotaExceeded,
    /// A resource with the requested identifier already exists.
    AlreadyExists,
    /// Dependency or internal failure that is safe to retry.
    Transient,
    /// Any code not covered by the table.
    Unclassified,
}

impl FaultKind {
    /// Returns `true` when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::InvalidState => "invalid-state",
            Self::QuotaExceeded => "quota-exceeded",
            Self::AlreadyExists => "already-exists",
            Self::Transient => "transient",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Errors that know which [`FaultKind`] they belong to.
pub trait Classify {
    /// Returns the taxonomy kind for this error.
    fn fault(&self) -> FaultKind;
}

/// Maps a provider error code to a [`FaultKind`].
///
/// Both wire codes (`DBInstanceNotFound`) and the `Fault`-suffixed SDK
/// constant spellings (`DBInstanceNotFoundFault`) are accepted.
#[must_use]
pub fn classify(code: &str) -> FaultKind {
    let trimmed = code.trim();
    let base = trimmed.strip_suffix("Fault").unwrap_or(trimmed);
    match base {
        "DBClusterNotFound"
        | "DBClusterSnapshotNotFound"
        | "DBInstanceNotFound"
        | "DBSnapshotNotFound"
        | "DBSubnetGroupNotFound"
        | "DBSecurityGroupNotFound"
        | "DBParameterGroupNotFound"
        | "DBClusterParameterGroupNotFound"
        | "OptionGroupNotFound"
        | "DomainNotFound"
        | "AuthorizationNotFound"
        | "BackupPolicyNotFound"
        | "CertificateNotFound"
        | "NotFoundException" => FaultKind::NotFound,
        "InvalidDBClusterState"
        | "InvalidDBClusterSnapshotState"
        | "InvalidDBInstanceState"
        | "InvalidDBSnapshotState"
        | "InvalidDBSecurityGroupState"
        | "InvalidDBSubnetGroupState"
        | "InvalidDBSubnetGroup"
        | "InvalidVPCNetworkState"
        | "InvalidSubnet"
        | "InvalidRestore"
        | "DBSubnetGroupDoesNotCoverEnoughAZs"
        | "DBSubnetGroupNotAllowed"
        | "StorageTypeNotSupported"
        | "ProvisionedIopsNotAvailableInAZ"
        | "DBUpgradeDependencyFailure"
        | "KMSKeyNotAccessible"
        | "InvalidArnException"
        | "InvalidMarkerException" => FaultKind::InvalidState,
        "DBClusterQuotaExceeded"
        | "InstanceQuotaExceeded"
        | "SnapshotQuotaExceeded"
        | "SharedSnapshotQuotaExceeded"
        | "StorageQuotaExceeded"
        | "InsufficientDBClusterCapacity"
        | "InsufficientDBInstanceCapacity"
        | "InsufficientStorageClusterCapacity" => FaultKind::QuotaExceeded,
        "DBClusterAlreadyExists" | "DBClusterSnapshotAlreadyExists" | "DBInstanceAlreadyExists" => {
            FaultKind::AlreadyExists
        }
        "DependencyTimeoutException"
        | "KMSInternalException"
        | "InternalFailure"
        | "ServiceUnavailable"
        | "Throttling"
        | "ThrottlingException"
        | "RequestLimitExceeded" => FaultKind::Transient,
        _ => FaultKind::Unclassified,
    }
}
