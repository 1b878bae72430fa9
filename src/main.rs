//! Binary entry point for the clustershift CLI.

mod cli;

use std::error::Error as _;
use std::io::{self, IsTerminal};
use std::process;

use chrono::Utc;
use clap::Parser;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clustershift::{
    AwsBackend, AwsBackendError, ConfigError, MigrationConfig, MigrationError,
    MigrationOrchestrator, MigrationPlan, ReadinessPoller, snapshot_stamp,
};

use cli::Cli;

const DEFAULT_LOG_FILTER: &str = "clustershift=info";

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to the {account} account: {source}")]
    Connect {
        account: &'static str,
        #[source]
        source: AwsBackendError,
    },
    #[error("migration failed: {0}")]
    Migration(#[source] Box<MigrationError<AwsBackendError>>),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(&cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let mut config = MigrationConfig::load_without_cli_args()?;
    apply_overrides(cli, &mut config);
    config.validate()?;

    let plan = MigrationPlan::from_config(&config, &snapshot_stamp(Utc::now()));
    log_plan(&plan);
    if cli.dry_run {
        info!("dry run: no changes made");
        return Ok(());
    }

    let source = connect("source", &config.source_profile, &config.source_region).await?;
    let destination = connect(
        "destination",
        &config.destination_profile,
        &config.destination_region,
    )
    .await?;

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());
    let orchestrator = MigrationOrchestrator::new(
        source,
        destination,
        ReadinessPoller::new(config.poll_policy(), cancel),
    );
    let report = orchestrator
        .execute(&plan)
        .await
        .map_err(|err| CliError::Migration(Box::new(err)))?;
    info!(
        cluster = %report.cluster.id,
        instances = report.instances.len(),
        elapsed_secs = report.elapsed.as_secs(),
        "cluster ready in the destination account"
    );
    Ok(())
}

async fn connect(
    account: &'static str,
    profile: &str,
    region: &str,
) -> Result<AwsBackend, CliError> {
    let backend = AwsBackend::connect(account, profile, region)
        .await
        .map_err(|source| CliError::Connect { account, source })?;
    info!(account = backend.account(), region, "connected");
    Ok(backend)
}

fn apply_overrides(cli: &Cli, config: &mut MigrationConfig) {
    let text_overrides = [
        (&cli.source_cluster, &mut config.source_cluster_name),
        (&cli.destination_cluster, &mut config.destination_cluster_name),
        (&cli.migration_key_alias, &mut config.migration_key_alias),
        (&cli.source_profile, &mut config.source_profile),
        (&cli.source_region, &mut config.source_region),
        (&cli.destination_profile, &mut config.destination_profile),
        (&cli.destination_region, &mut config.destination_region),
        (&cli.destination_kms_key_alias, &mut config.destination_kms_key_alias),
        (&cli.destination_account_id, &mut config.destination_account_id),
        (&cli.writer_instance_name, &mut config.writer_instance_name),
        (&cli.reader_instance_name, &mut config.reader_instance_name),
        (&cli.writer_instance_class, &mut config.writer_instance_class),
        (&cli.reader_instance_class, &mut config.reader_instance_class),
        (&cli.engine, &mut config.destination_engine),
        (&cli.engine_version, &mut config.destination_engine_version),
        (&cli.engine_mode, &mut config.destination_engine_mode),
        (&cli.subnet_group, &mut config.destination_subnet_group),
        (&cli.security_group, &mut config.destination_security_group),
        (&cli.admin_username, &mut config.admin_username),
    ];
    for (flag, field) in text_overrides {
        if let Some(value) = flag {
            field.clone_from(value);
        }
    }

    if let Some(interval) = cli.poll_interval_secs {
        config.poll_interval_secs = interval;
    }
    if let Some(timeout) = cli.wait_timeout_secs {
        config.wait_timeout_secs = timeout;
    }
    if let Some(retries) = cli.transient_retries {
        config.transient_retries = retries;
    }
    if let Some(delay) = cli.reader_start_delay_ms {
        config.reader_waits_for_writer = false;
        config.reader_start_delay_ms = delay;
    }
    if cli.skip_key_check {
        config.verify_keys = false;
    }
    if cli.apply_maintenance {
        config.apply_maintenance_settings = true;
    }
}

fn log_plan(plan: &MigrationPlan) {
    info!(
        source_cluster = %plan.source_cluster,
        destination_cluster = %plan.destination_cluster,
        destination_account = %plan.destination_account_id,
        admin_username = %plan.admin_username,
        snapshot = %plan.snapshot_id,
        shared_snapshot = %plan.copy_id,
        provisions_instances = plan.instances.is_some(),
        "migration plan"
    );
    for (position, step) in plan.steps().iter().enumerate() {
        info!(position = position + 1, "planned step: {step}");
    }
}

fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping the migration");
            cancel.cancel();
        }
    });
}

fn report_error(err: &CliError) {
    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let detail = inner.to_string();
        if !rendered.contains(&detail) {
            rendered.push_str(": ");
            rendered.push_str(&detail);
        }
        cause = inner.source();
    }
    error!("{rendered}");
}
