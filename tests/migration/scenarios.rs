//! BDD scenarios for the migration pipeline.

use rstest_bdd_macros::scenario;

use super::test_helpers::{MigrationContext, migration_context};

#[scenario(
    path = "tests/features/migration.feature",
    name = "Migrate a serverless cluster"
)]
fn scenario_serverless_migration(migration_context: MigrationContext) {
    let _ = migration_context;
}

#[scenario(
    path = "tests/features/migration.feature",
    name = "Migrate a provisioned cluster with writer and reader"
)]
fn scenario_provisioned_migration(migration_context: MigrationContext) {
    let _ = migration_context;
}

#[scenario(
    path = "tests/features/migration.feature",
    name = "Stop when the snapshot copy is rejected"
)]
fn scenario_copy_rejected(migration_context: MigrationContext) {
    let _ = migration_context;
}

#[scenario(
    path = "tests/features/migration.feature",
    name = "Report a writer failure"
)]
fn scenario_writer_failure(migration_context: MigrationContext) {
    let _ = migration_context;
}

#[scenario(
    path = "tests/features/migration.feature",
    name = "Refuse to start when the destination key is missing"
)]
fn scenario_missing_key(migration_context: MigrationContext) {
    let _ = migration_context;
}

#[scenario(
    path = "tests/features/migration.feature",
    name = "Keep the shared copy when the restored cluster never becomes available"
)]
fn scenario_cluster_timeout(migration_context: MigrationContext) {
    let _ = migration_context;
}
