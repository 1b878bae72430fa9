//! BDD step definitions for the migration pipeline.

use clustershift::test_support::Operation;
use clustershift::{Classify, MigrationPlan};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Builder;

use super::test_helpers::{MigrationContext, MigrationOutcome, copy_id, snapshot_id};
use crate::test_constants::{DESTINATION_KEY_ALIAS, SNAPSHOT_STAMP};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn expect(condition: bool, message: impl FnOnce() -> String) -> Result<(), StepError> {
    if condition {
        Ok(())
    } else {
        Err(StepError::Assertion(message()))
    }
}

fn failure(migration_context: &MigrationContext) -> Result<(String, String, String), StepError> {
    match migration_context.outcome() {
        Some(MigrationOutcome::Failure {
            step,
            fault,
            message,
        }) => Ok((
            step.map(|value| value.to_string()).unwrap_or_default(),
            fault,
            message,
        )),
        Some(other) => Err(StepError::Assertion(format!(
            "expected failure, got {other:?}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[given("a migration of cluster \"{cluster}\" with engine mode \"{mode}\"")]
fn migration_of_cluster(
    migration_context: MigrationContext,
    cluster: String,
    mode: String,
) -> MigrationContext {
    migration_context.configure(|config| {
        config.source_cluster_name = cluster.trim().to_owned();
        config.destination_engine_mode = mode.trim().to_owned();
    });
    migration_context
}

#[given("the writer takes {polls:u32} polls to become available")]
fn writer_takes_polls(migration_context: MigrationContext, polls: u32) -> MigrationContext {
    let writer = migration_context.config().writer_instance_name;
    let statuses = (1..polls)
        .map(|_| "creating")
        .chain(std::iter::once("available"));
    migration_context.destination.script_statuses(&writer, statuses);
    migration_context
}

#[given("the snapshot copy fails with \"{code}\"")]
fn copy_fails(migration_context: MigrationContext, code: String) -> MigrationContext {
    migration_context
        .source
        .fail(Operation::CopySnapshot, code.trim());
    migration_context
}

#[given("the writer instance creation fails with \"{code}\"")]
fn writer_creation_fails(migration_context: MigrationContext, code: String) -> MigrationContext {
    let writer = migration_context.config().writer_instance_name;
    migration_context
        .destination
        .fail_for(Operation::CreateInstance, &writer, code.trim());
    migration_context
}

#[given("the destination key alias is missing")]
fn destination_key_missing(migration_context: MigrationContext) -> MigrationContext {
    migration_context.destination.fail_for(
        Operation::DescribeKey,
        DESTINATION_KEY_ALIAS,
        "NotFoundException",
    );
    migration_context
        .destination
        .set_aliases(["aws/rds", "shared-key"]);
    migration_context
}

#[given("the destination cluster never becomes available")]
fn cluster_never_ready(migration_context: MigrationContext) -> MigrationContext {
    let cluster = migration_context.config().source_cluster_name;
    migration_context.destination.never_ready(&cluster);
    migration_context
}

#[when("I run the migration")]
fn run_migration(migration_context: MigrationContext) -> Result<MigrationContext, StepError> {
    let runtime = Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    let plan = MigrationPlan::from_config(&migration_context.config(), SNAPSHOT_STAMP);
    let orchestrator = migration_context.orchestrator();

    let result = runtime.block_on(async move { orchestrator.execute(&plan).await });
    migration_context.record(match result {
        Ok(report) => MigrationOutcome::Success {
            instances: report.instances.len(),
        },
        Err(err) => MigrationOutcome::Failure {
            step: err.step(),
            fault: err.fault().to_string(),
            message: err.to_string(),
        },
    });
    Ok(migration_context)
}

#[then("the migration succeeds")]
fn migration_succeeds(migration_context: &MigrationContext) -> Result<(), StepError> {
    match migration_context.outcome() {
        Some(MigrationOutcome::Success { .. }) => Ok(()),
        Some(MigrationOutcome::Failure { message, .. }) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the migration fails at step \"{step}\"")]
fn migration_fails_at(migration_context: &MigrationContext, step: String) -> Result<(), StepError> {
    let (actual, _, message) = failure(migration_context)?;
    expect(actual == step.trim(), || {
        format!("expected failure at {step}, got {actual}: {message}")
    })
}

#[then("the failure is classified as \"{kind}\"")]
fn failure_classified(migration_context: &MigrationContext, kind: String) -> Result<(), StepError> {
    let (_, fault, message) = failure(migration_context)?;
    expect(fault == kind.trim(), || {
        format!("expected {kind} failure, got {fault}: {message}")
    })
}

#[then("the error lists the available key aliases")]
fn error_lists_aliases(migration_context: &MigrationContext) -> Result<(), StepError> {
    let (_, _, message) = failure(migration_context)?;
    expect(message.contains("aws/rds, shared-key"), || {
        format!("expected alias listing, got: {message}")
    })
}

#[then("both snapshots are deleted")]
fn both_snapshots_deleted(migration_context: &MigrationContext) -> Result<(), StepError> {
    let source = &migration_context.source;
    let original = source.count(Operation::DeleteSnapshot, Some(&snapshot_id()));
    let copy = source.count(Operation::DeleteSnapshot, Some(&copy_id()));
    expect(original == 1 && copy == 1, || {
        format!("expected one delete per snapshot, got {original} and {copy}")
    })
}

#[then("the original snapshot is kept")]
fn original_snapshot_kept(migration_context: &MigrationContext) -> Result<(), StepError> {
    let deletes = migration_context
        .source
        .count(Operation::DeleteSnapshot, Some(&snapshot_id()));
    expect(deletes == 0, || format!("original snapshot deleted {deletes} times"))
}

#[then("the shared snapshot copy is kept")]
fn shared_copy_kept(migration_context: &MigrationContext) -> Result<(), StepError> {
    let deletes = migration_context
        .source
        .count(Operation::DeleteSnapshot, Some(&copy_id()));
    expect(deletes == 0, || format!("shared copy deleted {deletes} times"))
}

#[then("the snapshot is not shared")]
fn snapshot_not_shared(migration_context: &MigrationContext) -> Result<(), StepError> {
    let shares = migration_context.source.count(Operation::ShareSnapshot, None);
    expect(shares == 0, || format!("snapshot shared {shares} times"))
}

#[then("no snapshot is created")]
fn no_snapshot_created(migration_context: &MigrationContext) -> Result<(), StepError> {
    let creates = migration_context.source.count(Operation::CreateSnapshot, None);
    expect(creates == 0, || format!("{creates} snapshots created"))
}

#[then("no instances are created")]
fn no_instances_created(migration_context: &MigrationContext) -> Result<(), StepError> {
    let creates = migration_context
        .destination
        .count(Operation::CreateInstance, None);
    expect(creates == 0, || format!("{creates} instances created"))
}

#[then("the writer and reader are each created once")]
fn writer_and_reader_created_once(migration_context: &MigrationContext) -> Result<(), StepError> {
    let config = migration_context.config();
    let journal = &migration_context.destination;
    let writers = journal.count(Operation::CreateInstance, Some(&config.writer_instance_name));
    let readers = journal.count(Operation::CreateInstance, Some(&config.reader_instance_name));
    let instances = match migration_context.outcome() {
        Some(MigrationOutcome::Success { instances }) => instances,
        _ => 0,
    };
    expect(writers == 1 && readers == 1 && instances == 2, || {
        format!("expected one writer and one reader, got {writers}/{readers} ({instances} reported)")
    })
}

#[then("the reader is created after the writer is available")]
fn reader_after_writer(migration_context: &MigrationContext) -> Result<(), StepError> {
    let config = migration_context.config();
    let journal = &migration_context.destination;
    let writer_ready = journal
        .last_position(Operation::DescribeInstance, &config.writer_instance_name)
        .ok_or_else(|| StepError::Assertion(String::from("writer never described")))?;
    let reader_created = journal
        .first_position(Operation::CreateInstance, &config.reader_instance_name)
        .ok_or_else(|| StepError::Assertion(String::from("reader never created")))?;
    expect(writer_ready < reader_created, || {
        format!("reader created at {reader_created}, before writer ready at {writer_ready}")
    })
}

#[then("the reader is never created")]
fn reader_never_created(migration_context: &MigrationContext) -> Result<(), StepError> {
    let reader = migration_context.config().reader_instance_name;
    let creates = migration_context
        .destination
        .count(Operation::CreateInstance, Some(&reader));
    expect(creates == 0, || format!("reader created {creates} times"))
}
