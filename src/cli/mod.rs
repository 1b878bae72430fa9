//! Command-line interface definitions for the `clustershift` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `clustershift` binary.
///
/// Every option overrides the matching `clustershift.toml` key or
/// `CLUSTERSHIFT_*` environment variable for a single run.
#[derive(Debug, Parser)]
#[command(
    name = "clustershift",
    version,
    about = "Migrate a managed database cluster to another cloud account"
)]
pub(crate) struct Cli {
    /// Resolve and log the migration plan without contacting either account.
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Cluster to migrate, in the source account.
    #[arg(long, value_name = "NAME")]
    pub(crate) source_cluster: Option<String>,
    /// Name of the restored cluster (defaults to the source cluster name).
    #[arg(long, value_name = "NAME")]
    pub(crate) destination_cluster: Option<String>,
    /// Alias of the source-account key used to re-encrypt the snapshot.
    #[arg(long, value_name = "ALIAS")]
    pub(crate) migration_key_alias: Option<String>,
    /// Credentials profile for the source account.
    #[arg(long, value_name = "PROFILE")]
    pub(crate) source_profile: Option<String>,
    /// Region of the source cluster.
    #[arg(long, value_name = "REGION")]
    pub(crate) source_region: Option<String>,
    /// Credentials profile for the destination account.
    #[arg(long, value_name = "PROFILE")]
    pub(crate) destination_profile: Option<String>,
    /// Region the cluster is restored in.
    #[arg(long, value_name = "REGION")]
    pub(crate) destination_region: Option<String>,
    /// Alias of the destination-account key encrypting the restored cluster.
    #[arg(long, value_name = "ALIAS")]
    pub(crate) destination_kms_key_alias: Option<String>,
    /// Account the snapshot is shared with.
    #[arg(long, value_name = "ACCOUNT_ID")]
    pub(crate) destination_account_id: Option<String>,
    /// Identifier of the writer instance.
    #[arg(long, value_name = "NAME")]
    pub(crate) writer_instance_name: Option<String>,
    /// Identifier of the reader instance.
    #[arg(long, value_name = "NAME")]
    pub(crate) reader_instance_name: Option<String>,
    /// Instance class of the writer.
    #[arg(long, value_name = "CLASS")]
    pub(crate) writer_instance_class: Option<String>,
    /// Instance class of the reader.
    #[arg(long, value_name = "CLASS")]
    pub(crate) reader_instance_class: Option<String>,
    /// Engine family of the restored cluster.
    #[arg(long, value_name = "ENGINE")]
    pub(crate) engine: Option<String>,
    /// Engine version of the restored cluster.
    #[arg(long, value_name = "VERSION")]
    pub(crate) engine_version: Option<String>,
    /// Engine mode of the restored cluster; `serverless` skips instances.
    #[arg(long, value_name = "MODE")]
    pub(crate) engine_mode: Option<String>,
    /// Subnet group of the restored cluster.
    #[arg(long, value_name = "GROUP")]
    pub(crate) subnet_group: Option<String>,
    /// Security group attached to the restored cluster.
    #[arg(long, value_name = "GROUP")]
    pub(crate) security_group: Option<String>,
    /// Administrator user of the migrated cluster.
    #[arg(long, value_name = "USER")]
    pub(crate) admin_username: Option<String>,
    /// Seconds between readiness polls.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) poll_interval_secs: Option<u64>,
    /// Seconds a single readiness wait may take.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) wait_timeout_secs: Option<u64>,
    /// Transient describe failures tolerated per wait.
    #[arg(long, value_name = "COUNT")]
    pub(crate) transient_retries: Option<u32>,
    /// Start the reader after a fixed delay instead of waiting for the writer.
    #[arg(long, value_name = "MILLISECONDS")]
    pub(crate) reader_start_delay_ms: Option<u64>,
    /// Skip the encryption key check before the first snapshot.
    #[arg(long)]
    pub(crate) skip_key_check: bool,
    /// Apply backup and maintenance windows once the cluster is ready.
    #[arg(long)]
    pub(crate) apply_maintenance: bool,
}
