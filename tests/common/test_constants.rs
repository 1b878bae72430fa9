//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

#![allow(
    dead_code,
    reason = "each test binary includes this module and uses a different subset"
)]

/// Timestamp embedded in snapshot names by the behaviour scenarios.
pub const SNAPSHOT_STAMP: &str = "20240101120000";
/// Cluster migrated by the scenarios and CLI tests.
pub const SOURCE_CLUSTER: &str = "orders";
/// Source-account key alias used for the snapshot copy.
pub const MIGRATION_KEY_ALIAS: &str = "migration";
/// Destination-account key alias used for the restored cluster.
pub const DESTINATION_KEY_ALIAS: &str = "restored";
/// Account the snapshot copy is shared with.
pub const DESTINATION_ACCOUNT_ID: &str = "222233334444";
