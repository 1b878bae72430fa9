//! Shared fixtures and helpers for migration BDD scenarios.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use clustershift::test_support::ScriptedBackend;
use clustershift::{
    MigrationConfig, MigrationOrchestrator, MigrationStep, PollPolicy, ReadinessPoller,
};
use rstest::fixture;
use tokio_util::sync::CancellationToken;

use crate::test_constants::{
    DESTINATION_ACCOUNT_ID, DESTINATION_KEY_ALIAS, MIGRATION_KEY_ALIAS, SNAPSHOT_STAMP,
};

/// Result of running the orchestrator.
#[derive(Clone, Debug)]
pub enum MigrationOutcome {
    Success {
        instances: usize,
    },
    Failure {
        step: Option<MigrationStep>,
        fault: String,
        message: String,
    },
}

#[derive(Clone, Debug)]
pub struct MigrationContext {
    pub source: ScriptedBackend,
    pub destination: ScriptedBackend,
    config: Arc<Mutex<MigrationConfig>>,
    outcome: Arc<Mutex<Option<MigrationOutcome>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MigrationContext {
    pub fn configure(&self, update: impl FnOnce(&mut MigrationConfig)) {
        update(&mut lock(&self.config));
    }

    pub fn config(&self) -> MigrationConfig {
        lock(&self.config).clone()
    }

    pub fn record(&self, outcome: MigrationOutcome) {
        *lock(&self.outcome) = Some(outcome);
    }

    pub fn outcome(&self) -> Option<MigrationOutcome> {
        lock(&self.outcome).clone()
    }

    pub fn orchestrator(&self) -> MigrationOrchestrator<ScriptedBackend> {
        let policy = PollPolicy {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            transient_retries: 0,
        };
        MigrationOrchestrator::new(
            self.source.clone(),
            self.destination.clone(),
            ReadinessPoller::new(policy, CancellationToken::new()),
        )
    }
}

#[fixture]
pub fn migration_context() -> MigrationContext {
    let source = ScriptedBackend::named("source");
    let destination = source.sibling("destination");
    let config = MigrationConfig {
        migration_key_alias: MIGRATION_KEY_ALIAS.to_owned(),
        destination_kms_key_alias: DESTINATION_KEY_ALIAS.to_owned(),
        destination_account_id: DESTINATION_ACCOUNT_ID.to_owned(),
        destination_engine: String::from("aurora-postgresql"),
        ..MigrationConfig::default()
    };
    MigrationContext {
        source,
        destination,
        config: Arc::new(Mutex::new(config)),
        outcome: Arc::new(Mutex::new(None)),
    }
}

pub fn snapshot_id() -> String {
    format!("migrationsnapshot-{SNAPSHOT_STAMP}")
}

pub fn copy_id() -> String {
    format!("migrationsnapshotshared-{SNAPSHOT_STAMP}")
}
