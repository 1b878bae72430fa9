//! Configuration loading via `ortho-config`.
//!
//! [`MigrationConfig`] is loaded once at startup, layered with command-line
//! overrides by the binary, and then passed by reference to every component.
//! Cloud identifiers are not validated locally: the provider rejects missing
//! or malformed values with its own validation errors.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::backend::ClusterMaintenance;
use crate::poll::PollPolicy;

/// Engine mode whose clusters manage their own compute.
pub const SERVERLESS_ENGINE_MODE: &str = "serverless";

/// Parameters for a cross-account cluster migration, merged from defaults,
/// configuration files, and environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "CLUSTERSHIFT",
    discovery(
        app_name = "clustershift",
        env_var = "CLUSTERSHIFT_CONFIG_PATH",
        config_file_name = "clustershift.toml",
        dotfile_name = ".clustershift.toml",
        project_file_name = "clustershift.toml"
    )
)]
pub struct MigrationConfig {
    /// Cluster to migrate, in the source account.
    #[ortho_config(default = String::new(), skip_cli)]
    pub source_cluster_name: String,
    /// Name of the cluster created in the destination account. Falls back to
    /// the source cluster name when empty.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_cluster_name: String,
    /// Alias of the key used to re-encrypt the snapshot before sharing.
    #[ortho_config(default = String::new(), skip_cli)]
    pub migration_key_alias: String,
    /// Credentials profile for the source account.
    #[ortho_config(default = String::new(), skip_cli)]
    pub source_profile: String,
    /// Region of the source cluster.
    #[ortho_config(default = "eu-west-2".to_owned(), skip_cli)]
    pub source_region: String,
    /// Credentials profile for the destination account.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_profile: String,
    /// Region the cluster is migrated to.
    #[ortho_config(default = "eu-west-2".to_owned(), skip_cli)]
    pub destination_region: String,
    /// Alias of the key encrypting the restored cluster.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_kms_key_alias: String,
    /// Account the snapshot is shared with.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_account_id: String,
    /// Identifier of the writer instance.
    #[ortho_config(default = "writer".to_owned(), skip_cli)]
    pub writer_instance_name: String,
    /// Identifier of the reader instance.
    #[ortho_config(default = "reader".to_owned(), skip_cli)]
    pub reader_instance_name: String,
    /// Instance class of the writer.
    #[ortho_config(default = "db.r5.2xlarge".to_owned(), skip_cli)]
    pub writer_instance_class: String,
    /// Instance class of the reader.
    #[ortho_config(default = "db.r5.xlarge".to_owned(), skip_cli)]
    pub reader_instance_class: String,
    /// Engine family of the destination cluster.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_engine: String,
    /// Engine version of the destination cluster.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_engine_version: String,
    /// Engine mode of the destination cluster.
    #[ortho_config(default = SERVERLESS_ENGINE_MODE.to_owned(), skip_cli)]
    pub destination_engine_mode: String,
    /// Subnet group the destination cluster is placed in.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_subnet_group: String,
    /// Security group attached to the destination cluster.
    #[ortho_config(default = String::new(), skip_cli)]
    pub destination_security_group: String,
    /// Administrator user of the migrated cluster.
    #[ortho_config(default = "admin".to_owned(), skip_cli)]
    pub admin_username: String,
    /// Seconds between readiness polls.
    #[ortho_config(default = 60, skip_cli)]
    pub poll_interval_secs: u64,
    /// Seconds a single readiness wait may take before timing out.
    #[ortho_config(default = 14_400, skip_cli)]
    pub wait_timeout_secs: u64,
    /// Transient describe failures tolerated per wait.
    #[ortho_config(default = 0, skip_cli)]
    pub transient_retries: u32,
    /// Whether the reader is created only after the writer is available.
    #[ortho_config(default = true, skip_cli)]
    pub reader_waits_for_writer: bool,
    /// Milliseconds the reader flow waits before creating its instance when
    /// it does not wait for the writer.
    #[ortho_config(default = 5, skip_cli)]
    pub reader_start_delay_ms: u64,
    /// Whether both key aliases are checked before the first snapshot.
    #[ortho_config(default = true, skip_cli)]
    pub verify_keys: bool,
    /// Whether backup and maintenance settings are applied after the run.
    #[ortho_config(default = false, skip_cli)]
    pub apply_maintenance_settings: bool,
    /// Daily backup window applied to the restored cluster.
    #[ortho_config(default = "22:00-06:00".to_owned(), skip_cli)]
    pub backup_window: String,
    /// Weekly maintenance window applied to the cluster and its instances.
    #[ortho_config(default = "Tue:05:00-Tue:05:30".to_owned(), skip_cli)]
    pub maintenance_window: String,
    /// Days automated backups are retained on the restored cluster.
    #[ortho_config(default = 1, skip_cli)]
    pub backup_retention_days: i32,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            source_cluster_name: String::new(),
            destination_cluster_name: String::new(),
            migration_key_alias: String::new(),
            source_profile: String::new(),
            source_region: String::from("eu-west-2"),
            destination_profile: String::new(),
            destination_region: String::from("eu-west-2"),
            destination_kms_key_alias: String::new(),
            destination_account_id: String::new(),
            writer_instance_name: String::from("writer"),
            reader_instance_name: String::from("reader"),
            writer_instance_class: String::from("db.r5.2xlarge"),
            reader_instance_class: String::from("db.r5.xlarge"),
            destination_engine: String::new(),
            destination_engine_version: String::new(),
            destination_engine_mode: String::from(SERVERLESS_ENGINE_MODE),
            destination_subnet_group: String::new(),
            destination_security_group: String::new(),
            admin_username: String::from("admin"),
            poll_interval_secs: 60,
            wait_timeout_secs: 14_400,
            transient_retries: 0,
            reader_waits_for_writer: true,
            reader_start_delay_ms: 5,
            verify_keys: true,
            apply_maintenance_settings: false,
            backup_window: String::from("22:00-06:00"),
            maintenance_window: String::from("Tue:05:00-Tue:05:30"),
            backup_retention_days: 1,
        }
    }
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidField(format!(
            "{} {reason}: set {} or {} in clustershift.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

impl MigrationConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("clustershift")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the polling and maintenance settings. Cloud identifiers are
    /// left to the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the environment variable
    /// and TOML key to fix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(FieldMetadata::new(
                "poll interval",
                "CLUSTERSHIFT_POLL_INTERVAL_SECS",
                "poll_interval_secs",
            )
            .invalid("must be greater than zero"));
        }
        if self.wait_timeout_secs < self.poll_interval_secs {
            return Err(FieldMetadata::new(
                "wait timeout",
                "CLUSTERSHIFT_WAIT_TIMEOUT_SECS",
                "wait_timeout_secs",
            )
            .invalid("must be at least the poll interval"));
        }
        if self.apply_maintenance_settings && self.backup_retention_days < 1 {
            return Err(FieldMetadata::new(
                "backup retention",
                "CLUSTERSHIFT_BACKUP_RETENTION_DAYS",
                "backup_retention_days",
            )
            .invalid("must be at least one day"));
        }
        Ok(())
    }

    /// Returns the destination cluster name, falling back to the source name.
    #[must_use]
    pub fn destination_cluster(&self) -> &str {
        let trimmed = self.destination_cluster_name.trim();
        if trimmed.is_empty() {
            self.source_cluster_name.trim()
        } else {
            trimmed
        }
    }

    /// Returns `true` when the destination cluster has addressable instances.
    #[must_use]
    pub fn provisions_instances(&self) -> bool {
        !self
            .destination_engine_mode
            .trim()
            .eq_ignore_ascii_case(SERVERLESS_ENGINE_MODE)
    }

    /// Builds the polling policy used by every wait.
    #[must_use]
    pub const fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.wait_timeout_secs),
            transient_retries: self.transient_retries,
        }
    }

    /// Returns the fixed reader delay used when the reader does not wait for
    /// the writer.
    #[must_use]
    pub const fn reader_start_delay(&self) -> Duration {
        Duration::from_millis(self.reader_start_delay_ms)
    }

    /// Returns the maintenance settings to apply, if enabled.
    #[must_use]
    pub fn maintenance(&self) -> Option<ClusterMaintenance> {
        self.apply_maintenance_settings.then(|| ClusterMaintenance {
            backup_window: self.backup_window.clone(),
            maintenance_window: self.maintenance_window.clone(),
            backup_retention_days: self.backup_retention_days,
            deletion_protection: true,
        })
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a setting holds a value the run cannot use.
    #[error("invalid configuration: {0}")]
    InvalidField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
