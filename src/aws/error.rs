//! Error types for the AWS backend.

use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

use crate::fault::{Classify, FaultKind, classify};

/// Errors raised by the AWS backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AwsBackendError {
    /// Raised when the account settings cannot produce a client.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the service rejects a request.
    #[error("{operation} rejected with {code} ({kind}): {message}")]
    Service {
        /// API operation that failed.
        operation: &'static str,
        /// Classification of `code`.
        kind: FaultKind,
        /// Error code returned by the service.
        code: String,
        /// Error message returned by the service.
        message: String,
    },
    /// Raised when no service response was received.
    #[error("{operation} failed before a response was received: {message}")]
    Transport {
        /// API operation that failed.
        operation: &'static str,
        /// Rendered error chain.
        message: String,
    },
    /// Raised when a describe call returns an empty result set.
    #[error("{operation} returned no {resource}")]
    NotFound {
        /// API operation that was called.
        operation: &'static str,
        /// Resource that was requested.
        resource: String,
    },
    /// Raised when a response omits a field the backend relies on.
    #[error("{operation} response is missing {field}")]
    MissingField {
        /// API operation that was called.
        operation: &'static str,
        /// Missing field.
        field: &'static str,
    },
}

impl AwsBackendError {
    /// Converts an SDK failure, classifying service error codes.
    ///
    /// Failures to build or sign the request (missing credentials, an unknown
    /// profile) become [`AwsBackendError::Config`] so they are never retried.
    pub(crate) fn from_sdk<E, R>(operation: &'static str, err: &SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        if let Some(service) = err.as_service_error() {
            let code = service.code().unwrap_or("Unknown").to_owned();
            return Self::Service {
                operation,
                kind: classify(&code),
                message: service.message().unwrap_or("no message").to_owned(),
                code,
            };
        }

        let message = DisplayErrorContext(err).to_string();
        match err {
            SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
                Self::Transport { operation, message }
            }
            SdkError::DispatchFailure(failure) if failure.is_io() || failure.is_timeout() => {
                Self::Transport { operation, message }
            }
            _ => Self::Config(format!("{operation}: {message}")),
        }
    }

    pub(crate) const fn missing(operation: &'static str, field: &'static str) -> Self {
        Self::MissingField { operation, field }
    }
}

impl Classify for AwsBackendError {
    fn fault(&self) -> FaultKind {
        match self {
            Self::Service { kind, .. } => *kind,
            Self::Transport { .. } => FaultKind::Transient,
            Self::NotFound { .. } => FaultKind::NotFound,
            Self::Config(_) | Self::MissingField { .. } => FaultKind::Unclassified,
        }
    }
}
