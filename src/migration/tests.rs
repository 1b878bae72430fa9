//! Tests for the migration orchestrator.

use std::time::Duration;

use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::{
    Account, ClusterState, InstanceRole, MigrationError, MigrationOrchestrator, MigrationPlan,
    MigrationStep, SnapshotState,
};
use crate::config::MigrationConfig;
use crate::fault::{Classify, FaultKind};
use crate::poll::{PollError, PollPolicy, ReadinessPoller};
use crate::test_support::{Operation, ScriptedBackend};

const STAMP: &str = "20240101120000";
const SNAPSHOT: &str = "migrationsnapshot-20240101120000";
const COPY: &str = "migrationsnapshotshared-20240101120000";
const CLUSTER: &str = "orders";

struct Accounts {
    source: ScriptedBackend,
    destination: ScriptedBackend,
}

#[fixture]
fn accounts() -> Accounts {
    let source = ScriptedBackend::named("source");
    let destination = source.sibling("destination");
    Accounts {
        source,
        destination,
    }
}

fn config(engine_mode: &str) -> MigrationConfig {
    MigrationConfig {
        source_cluster_name: CLUSTER.to_owned(),
        migration_key_alias: String::from("migration"),
        destination_kms_key_alias: String::from("restored"),
        destination_account_id: String::from("222233334444"),
        destination_engine: String::from("aurora-postgresql"),
        destination_engine_version: String::from("13.9"),
        destination_engine_mode: engine_mode.to_owned(),
        destination_subnet_group: String::from("private"),
        destination_security_group: String::from("sg-0123"),
        ..MigrationConfig::default()
    }
}

fn plan(engine_mode: &str) -> MigrationPlan {
    MigrationPlan::from_config(&config(engine_mode), STAMP)
}

fn orchestrator(accounts: &Accounts) -> MigrationOrchestrator<ScriptedBackend> {
    orchestrator_with_token(accounts, CancellationToken::new())
}

fn orchestrator_with_token(
    accounts: &Accounts,
    token: CancellationToken,
) -> MigrationOrchestrator<ScriptedBackend> {
    let policy = PollPolicy {
        interval: Duration::from_secs(1),
        timeout: Duration::from_secs(60),
        transient_retries: 0,
    };
    MigrationOrchestrator::new(
        accounts.source.clone(),
        accounts.destination.clone(),
        ReadinessPoller::new(policy, token),
    )
}

fn position(accounts: &Accounts, operation: Operation, resource: &str) -> usize {
    accounts
        .source
        .first_position(operation, resource)
        .unwrap_or_else(|| panic!("expected {operation:?} for {resource}"))
}

fn last_position(accounts: &Accounts, operation: Operation, resource: &str) -> usize {
    accounts
        .source
        .last_position(operation, resource)
        .unwrap_or_else(|| panic!("expected {operation:?} for {resource}"))
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn serverless_migration_runs_every_snapshot_step_in_order(accounts: Accounts) {
    accounts.source.script_statuses(SNAPSHOT, ["creating", "available"]);
    accounts.source.script_statuses(COPY, ["copying", "copying", "available"]);
    accounts.destination.script_statuses(CLUSTER, ["creating", "available"]);

    let report = orchestrator(&accounts)
        .execute(&plan("serverless"))
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    let create = position(&accounts, Operation::CreateSnapshot, SNAPSHOT);
    let snapshot_ready = last_position(&accounts, Operation::DescribeSnapshot, SNAPSHOT);
    let copy = position(&accounts, Operation::CopySnapshot, COPY);
    let delete_original = position(&accounts, Operation::DeleteSnapshot, SNAPSHOT);
    let share = position(&accounts, Operation::ShareSnapshot, COPY);
    let restore = position(&accounts, Operation::RestoreCluster, CLUSTER);
    let cluster_ready = last_position(&accounts, Operation::DescribeCluster, CLUSTER);
    let delete_copy = position(&accounts, Operation::DeleteSnapshot, COPY);

    assert!(create < snapshot_ready && snapshot_ready < copy);
    assert!(copy < delete_original && delete_original < share);
    assert!(share < restore && restore < cluster_ready && cluster_ready < delete_copy);

    assert_eq!(accounts.source.count(Operation::CreateInstance, None), 0);
    assert_eq!(accounts.source.count(Operation::DescribeInstance, None), 0);
    assert!(report.instances.is_empty());
    assert_eq!(report.source_snapshot.state, SnapshotState::Deleted);
    assert_eq!(report.shared_snapshot.state, SnapshotState::Deleted);
    assert_eq!(report.cluster.state, ClusterState::Available);
    assert_eq!(report.cluster.engine_mode, "serverless");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_snapshot_is_created_once_and_copied_after_third_poll(accounts: Accounts) {
    accounts
        .source
        .script_statuses(SNAPSHOT, ["creating", "creating", "available"]);

    orchestrator(&accounts)
        .execute(&plan("serverless"))
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    assert_eq!(accounts.source.count(Operation::CreateSnapshot, None), 1);
    assert_eq!(accounts.source.count(Operation::DescribeSnapshot, Some(SNAPSHOT)), 3);
    assert_eq!(accounts.source.count(Operation::CopySnapshot, Some(COPY)), 1);
    let snapshot_ready = last_position(&accounts, Operation::DescribeSnapshot, SNAPSHOT);
    let copy = position(&accounts, Operation::CopySnapshot, COPY);
    assert_eq!(copy, snapshot_ready + 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn original_snapshot_is_deleted_only_after_copy_is_available(accounts: Accounts) {
    accounts.source.script_statuses(COPY, ["copying", "copying", "available"]);

    orchestrator(&accounts)
        .execute(&plan("serverless"))
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    let copy_describes: Vec<usize> = accounts
        .source
        .journal()
        .iter()
        .enumerate()
        .filter(|(_, call)| call.operation == Operation::DescribeSnapshot && call.resource == COPY)
        .map(|(index, _)| index)
        .collect();
    let delete_original = position(&accounts, Operation::DeleteSnapshot, SNAPSHOT);

    // Three polls until available, then one read for the shared ARN.
    assert_eq!(copy_describes.len(), 4);
    let copy_ready = copy_describes
        .get(2)
        .copied()
        .unwrap_or_else(|| panic!("third copy describe expected"));
    assert!(copy_ready < delete_original);
    assert!(copy_describes.last().is_some_and(|fetch| *fetch > delete_original));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn restore_uses_arn_read_after_sharing(accounts: Accounts) {
    orchestrator(&accounts)
        .execute(&plan("serverless"))
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    let requests = accounts.source.requests();
    let copy = requests
        .copies
        .first()
        .unwrap_or_else(|| panic!("copy request expected"));
    assert_eq!(copy.source_snapshot_id, SNAPSHOT);
    assert_eq!(copy.kms_key_alias, "migration");

    let restore = requests
        .restores
        .first()
        .unwrap_or_else(|| panic!("restore request expected"));
    assert_eq!(
        restore.snapshot_arn,
        format!("arn:scripted:rds:cluster-snapshot:{COPY}:shared-with-222233334444")
    );
    assert_eq!(restore.kms_key_alias, "restored");
    assert_eq!(restore.engine_mode, "serverless");
    assert!(restore.deletion_protection);

    let restore_call = accounts
        .source
        .journal()
        .into_iter()
        .find(|call| call.operation == Operation::RestoreCluster)
        .unwrap_or_else(|| panic!("restore call expected"));
    assert_eq!(restore_call.account, "destination");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn provisioned_cluster_gets_one_writer_and_one_reader(accounts: Accounts) {
    accounts.destination.script_statuses("writer", ["creating", "creating", "available"]);

    let report = orchestrator(&accounts)
        .execute(&plan("provisioned"))
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    assert_eq!(accounts.source.count(Operation::CreateInstance, Some("writer")), 1);
    assert_eq!(accounts.source.count(Operation::CreateInstance, Some("reader")), 1);

    let cluster_ready = last_position(&accounts, Operation::DescribeCluster, CLUSTER);
    let writer_ready = last_position(&accounts, Operation::DescribeInstance, "writer");
    let writer_create = position(&accounts, Operation::CreateInstance, "writer");
    let reader_create = position(&accounts, Operation::CreateInstance, "reader");
    assert!(cluster_ready < writer_create);
    assert!(writer_ready < reader_create);

    let roles: Vec<InstanceRole> = report.instances.iter().map(|instance| instance.role).collect();
    assert_eq!(roles, vec![InstanceRole::Writer, InstanceRole::Reader]);

    let requests = accounts.source.requests();
    let classes: Vec<&str> = requests
        .instances
        .iter()
        .map(|request| request.instance_class.as_str())
        .collect();
    assert_eq!(classes, vec!["db.r5.2xlarge", "db.r5.xlarge"]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn delayed_reader_is_created_while_writer_is_pending(accounts: Accounts) {
    accounts
        .destination
        .script_statuses("writer", ["creating", "creating", "creating", "available"]);
    let delayed = MigrationConfig {
        reader_waits_for_writer: false,
        ..config("provisioned")
    };
    let plan = MigrationPlan::from_config(&delayed, STAMP);

    orchestrator(&accounts)
        .execute(&plan)
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    let writer_ready = last_position(&accounts, Operation::DescribeInstance, "writer");
    let reader_create = position(&accounts, Operation::CreateInstance, "reader");
    assert!(reader_create < writer_ready);
    assert_eq!(accounts.source.count(Operation::CreateInstance, Some("reader")), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn copy_failure_stops_before_anything_is_shared(accounts: Accounts) {
    accounts
        .source
        .fail(Operation::CopySnapshot, "DBClusterSnapshotAlreadyExistsFault");

    let result = orchestrator(&accounts).execute(&plan("serverless")).await;

    assert!(
        matches!(
            result,
            Err(MigrationError::Step {
                step: MigrationStep::CopySnapshotWithNewKey,
                ..
            })
        ),
        "unexpected outcome: {result:?}"
    );
    assert_eq!(accounts.source.count(Operation::ShareSnapshot, None), 0);
    assert_eq!(accounts.source.count(Operation::DeleteSnapshot, None), 0);
    assert_eq!(accounts.source.count(Operation::RestoreCluster, None), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cluster_timeout_keeps_the_shared_copy(accounts: Accounts) {
    accounts.destination.never_ready(CLUSTER);

    let result = orchestrator(&accounts).execute(&plan("provisioned")).await;

    match result {
        Err(MigrationError::Wait {
            step: MigrationStep::RestoreClusterFromSnapshot,
            source: PollError::Timeout { last_status, .. },
        }) => assert_eq!(last_status.as_deref(), Some("creating")),
        other => panic!("expected restore timeout, got {other:?}"),
    }
    assert_eq!(accounts.source.count(Operation::DeleteSnapshot, Some(COPY)), 0);
    assert_eq!(accounts.source.count(Operation::CreateInstance, None), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn writer_failure_is_reported_and_reader_is_never_created(accounts: Accounts) {
    accounts
        .destination
        .fail_for(Operation::CreateInstance, "writer", "InsufficientDBInstanceCapacity");

    let result = orchestrator(&accounts).execute(&plan("provisioned")).await;

    assert!(
        matches!(
            result,
            Err(MigrationError::Step {
                step: MigrationStep::ProvisionWriterInstance,
                ref source,
            }) if source.code == "InsufficientDBInstanceCapacity"
        ),
        "unexpected outcome: {result:?}"
    );
    assert_eq!(accounts.source.count(Operation::CreateInstance, Some("reader")), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn writer_failure_with_delayed_reader_skips_the_reader(accounts: Accounts) {
    accounts.destination.fail_for(
        Operation::CreateInstance,
        "writer",
        "InsufficientDBInstanceCapacityFault",
    );
    let delayed = MigrationConfig {
        reader_waits_for_writer: false,
        ..config("provisioned")
    };

    let result = orchestrator(&accounts)
        .execute(&MigrationPlan::from_config(&delayed, STAMP))
        .await;

    match result {
        Err(ref err @ MigrationError::Step {
            step: MigrationStep::ProvisionWriterInstance,
            ..
        }) => assert_eq!(err.fault(), FaultKind::QuotaExceeded),
        other => panic!("expected writer failure, got {other:?}"),
    }
    assert_eq!(accounts.source.count(Operation::CreateInstance, Some("reader")), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn missing_key_alias_aborts_before_snapshotting(accounts: Accounts) {
    accounts
        .destination
        .fail_for(Operation::DescribeKey, "restored", "NotFoundException");
    accounts.destination.set_aliases(["aws/rds", "shared-key"]);

    let result = orchestrator(&accounts).execute(&plan("serverless")).await;

    match result {
        Err(MigrationError::KeyUnavailable {
            account,
            alias,
            available,
        }) => {
            assert_eq!(account, Account::Destination);
            assert_eq!(alias, "restored");
            assert_eq!(available, vec!["aws/rds", "shared-key"]);
        }
        other => panic!("expected missing key, got {other:?}"),
    }
    assert_eq!(accounts.source.count(Operation::CreateSnapshot, None), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn key_checks_can_be_disabled(accounts: Accounts) {
    let unchecked = MigrationConfig {
        verify_keys: false,
        ..config("serverless")
    };

    orchestrator(&accounts)
        .execute(&MigrationPlan::from_config(&unchecked, STAMP))
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    assert_eq!(accounts.source.count(Operation::DescribeKey, None), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn maintenance_settings_reach_cluster_and_instances(accounts: Accounts) {
    let maintained = MigrationConfig {
        apply_maintenance_settings: true,
        ..config("provisioned")
    };

    orchestrator(&accounts)
        .execute(&MigrationPlan::from_config(&maintained, STAMP))
        .await
        .unwrap_or_else(|err| panic!("migration should succeed: {err}"));

    assert_eq!(accounts.source.count(Operation::ModifyCluster, Some(CLUSTER)), 1);
    assert_eq!(accounts.source.count(Operation::ModifyInstance, None), 2);
    let settings = accounts.source.requests().maintenance;
    assert_eq!(
        settings.first().map(|entry| entry.maintenance_window.as_str()),
        Some("Tue:05:00-Tue:05:30")
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cancelled_runs_issue_no_calls(accounts: Accounts) {
    let token = CancellationToken::new();
    token.cancel();

    let result = orchestrator_with_token(&accounts, token)
        .execute(&plan("serverless"))
        .await;

    assert!(
        matches!(
            result,
            Err(MigrationError::Cancelled {
                step: MigrationStep::VerifyKeys
            })
        ),
        "unexpected outcome: {result:?}"
    );
    assert!(accounts.source.journal().is_empty());
}
