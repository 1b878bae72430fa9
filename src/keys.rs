//! Key-management abstractions used to check encryption keys before a run.

use crate::backend::{Backend, BackendFuture};

/// Prefix the key service expects in front of alias names.
pub const ALIAS_PREFIX: &str = "alias/";

/// Returns `alias/<name>`, leaving already-prefixed values untouched.
#[must_use]
pub fn alias_key_id(alias: &str) -> String {
    if alias.starts_with(ALIAS_PREFIX) {
        alias.to_owned()
    } else {
        format!("{ALIAS_PREFIX}{alias}")
    }
}

/// Metadata describing an encryption key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyDescription {
    /// Provider key identifier.
    pub key_id: String,
    /// Key ARN, when reported.
    pub arn: Option<String>,
    /// Whether the key can currently be used.
    pub enabled: bool,
}

/// Backend operations for encryption keys.
pub trait KeyBackend: Backend {
    /// Describes the key behind an alias (given without the `alias/` prefix).
    fn describe_key<'a>(&'a self, alias: &'a str)
    -> BackendFuture<'a, KeyDescription, Self::Error>;

    /// Lists every key alias visible to the account, prefix stripped.
    fn list_key_aliases(&self) -> BackendFuture<'_, Vec<String>, Self::Error>;
}
