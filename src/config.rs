//! Configuration loading via `ortho-config`.
//!
//! Values merge defaults, configuration files (`sshdfs.toml`), and
//! `SSHDFS_*` environment variables.

use std::env;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::error::HdfsError;

/// SSH and remote tool settings.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "SSHDFS",
    discovery(
        app_name = "sshdfs",
        env_var = "SSHDFS_CONFIG_PATH",
        config_file_name = "sshdfs.toml",
        dotfile_name = ".sshdfs.toml",
        project_file_name = "sshdfs.toml"
    )
)]
pub struct SshdfsConfig {
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
    /// Filesystem client invoked on the remote host.
    #[ortho_config(default = "hdfs".to_owned())]
    pub hdfs_bin: String,
    /// Host used when the command line does not name one.
    pub default_host: Option<String>,
    /// Remote user used when the command line does not name one. When unset,
    /// SSH picks the user from its own configuration.
    pub default_user: Option<String>,
    /// SSH port override.
    pub ssh_port: Option<u16>,
    /// Path to an SSH private key. Supports tilde expansion.
    pub ssh_identity_file: Option<String>,
    /// Whether to force batch mode so SSH never prompts for a password.
    #[ortho_config(default = false)]
    pub ssh_batch_mode: bool,
}

/// Errors raised when loading configuration from layered sources.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigLoadError {
    /// Indicates that parsing or merging configuration layers failed.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl Default for SshdfsConfig {
    fn default() -> Self {
        Self {
            ssh_bin: String::from("ssh"),
            hdfs_bin: String::from("hdfs"),
            default_host: None,
            default_user: None,
            ssh_port: None,
            ssh_identity_file: None,
            ssh_batch_mode: false,
        }
    }
}

impl SshdfsConfig {
    /// Loads configuration from defaults, files, and environment variables
    /// without consulting the process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigLoadError> {
        Self::load_from_iter([std::ffi::OsString::from("sshdfs")])
            .map_err(|err| ConfigLoadError::Parse(err.to_string()))
    }

    /// Ensures configuration values are present after trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::InvalidConfig`] when a required field is empty or
    /// an optional field is set to a blank value.
    pub fn validate(&self) -> Result<(), HdfsError> {
        Self::require_value(&self.ssh_bin, "ssh_bin")?;
        Self::require_value(&self.hdfs_bin, "hdfs_bin")?;
        Self::require_optional_value(self.default_host.as_deref(), "default_host")?;
        Self::require_optional_value(self.default_user.as_deref(), "default_user")?;
        Self::require_optional_value(self.ssh_identity_file.as_deref(), "ssh_identity_file")?;
        Ok(())
    }

    /// Returns the identity file as passed to `ssh -i`.
    ///
    /// A leading `~` or `~/` is rewritten against `HOME`; `~user` forms and
    /// an unset `HOME` leave the configured value as written.
    #[must_use]
    pub fn identity_file_path(&self) -> Option<Utf8PathBuf> {
        let raw = self.ssh_identity_file.as_deref()?;
        let home = env::var("HOME").ok().filter(|value| !value.is_empty());
        let resolved = match (raw.strip_prefix('~'), home) {
            (Some(""), Some(home)) => Utf8PathBuf::from(home),
            (Some(rest), Some(home)) if rest.starts_with('/') => {
                Utf8PathBuf::from(home).join(rest.trim_start_matches('/'))
            }
            _ => Utf8PathBuf::from(raw),
        };
        Some(resolved)
    }

    fn require_optional_value(value: Option<&str>, field: &str) -> Result<(), HdfsError> {
        match value {
            None => Ok(()),
            Some(v) if !v.trim().is_empty() => Ok(()),
            Some(_) => Err(HdfsError::InvalidConfig {
                field: field.to_owned(),
            }),
        }
    }

    fn require_value(value: &str, field: &str) -> Result<(), HdfsError> {
        Self::require_optional_value(Some(value), field)
    }
}
