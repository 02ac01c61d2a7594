//! Remote filesystem operations over SSH.
//!
//! [`HdfsClient`] runs the filesystem client on a remote host through the
//! system `ssh` binary. Each operation opens one channel, drains it, closes
//! it, and only then inspects the exit status and parses the output, so the
//! channel is released on every path and transport failures are reported
//! before any attempt to parse empty or partial output.

use std::ffi::OsString;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::config::SshdfsConfig;
use crate::error::HdfsError;
use crate::fetch::{CopyError, CopyStats, FetchSummary, LocalDestination, copy_chunks};
use crate::listing::{DirectoryEntry, parse_listing};
use crate::remote::{
    Channel, ChannelStatus, CommandRunner, ProcessCommandRunner, RemoteInvocation, RemoteTarget,
    TransferMode,
};
use crate::usage::{UsageRecord, parse_usage};

mod commands;

/// Exit status the OpenSSH client uses for its own failures.
pub const SSH_FAILURE_STATUS: i32 = 255;

/// Runs listing, usage, and fetch commands on a remote host.
#[derive(Clone, Debug)]
pub struct HdfsClient<R: CommandRunner> {
    config: SshdfsConfig,
    runner: R,
}

impl HdfsClient<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::InvalidConfig`] when validation fails.
    pub fn with_process_runner(config: SshdfsConfig) -> Result<Self, HdfsError> {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> HdfsClient<R> {
    /// Creates a client using the provided runner and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::InvalidConfig`] when configuration validation
    /// fails.
    pub fn new(config: SshdfsConfig, runner: R) -> Result<Self, HdfsError> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// Returns a reference to the underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &SshdfsConfig {
        &self.config
    }

    /// Resolves a target from explicit values, falling back to the
    /// configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::MissingHost`] when no host is available.
    pub fn resolve_target(
        &self,
        host: Option<&str>,
        user: Option<&str>,
    ) -> Result<RemoteTarget, HdfsError> {
        let resolved_host = host
            .or(self.config.default_host.as_deref())
            .filter(|value| !value.trim().is_empty())
            .ok_or(HdfsError::MissingHost)?;
        let resolved_user = user
            .or(self.config.default_user.as_deref())
            .map(str::to_owned);
        Ok(RemoteTarget::new(resolved_host, resolved_user))
    }

    /// Opens a channel on the remote command described by `invocation`.
    ///
    /// The caller owns the channel and should drain and
    /// [`close`](Channel::close) it; a dropped channel is still released.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::Spawn`] if the SSH client cannot be started.
    pub fn open_channel(&self, invocation: &RemoteInvocation) -> Result<Channel, HdfsError> {
        let args = self.build_ssh_args(invocation);
        debug!(
            invocation = %invocation.invocation_string(),
            mode = %invocation.mode,
            "opening remote channel"
        );
        self.runner.open(&self.config.ssh_bin, &args, invocation.mode)
    }

    /// Lists remote paths with `hdfs dfs -ls`.
    ///
    /// `args` are passed through after shell escaping, so flags such as `-R`
    /// work as they do on the remote command line.
    ///
    /// # Errors
    ///
    /// Returns a transport error ([`HdfsError::Spawn`],
    /// [`HdfsError::Connection`]), [`HdfsError::RemoteCommand`] when the
    /// listing command fails, or a format error ([`HdfsError::Schema`],
    /// [`HdfsError::InvalidField`]) for unexpected output.
    pub fn list(
        &self,
        target: &RemoteTarget,
        args: &[String],
    ) -> Result<Vec<DirectoryEntry>, HdfsError> {
        let command = commands::list_command(&self.config.hdfs_bin, args);
        let invocation = RemoteInvocation::new(target.clone(), command, TransferMode::Text);
        let text = self.run_text(&invocation)?;
        let entries = parse_listing(&text)?;
        debug!(count = entries.len(), "parsed listing");
        Ok(entries)
    }

    /// Summarises disk usage of `path` with `hdfs dfs -du -s`.
    ///
    /// # Errors
    ///
    /// Returns the same error kinds as [`HdfsClient::list`].
    pub fn usage(&self, target: &RemoteTarget, path: &str) -> Result<Vec<UsageRecord>, HdfsError> {
        let command = commands::usage_command(&self.config.hdfs_bin, path);
        let invocation = RemoteInvocation::new(target.clone(), command, TransferMode::Text);
        let text = self.run_text(&invocation)?;
        parse_usage(&text)
    }

    /// Streams remote `source` into a local file with `hdfs dfs -cat`.
    ///
    /// The destination defaults to the source path. Bytes are staged next to
    /// the destination and replace it only once the remote command has
    /// succeeded; a failed transfer removes the staged file and leaves any
    /// existing destination as it was.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::LocalFile`] when the destination cannot be
    /// created or written, a transport error or
    /// [`HdfsError::RemoteCommand`] when the remote side fails, or
    /// [`HdfsError::Read`] when the stream breaks.
    pub fn fetch(
        &self,
        target: &RemoteTarget,
        source: &str,
        destination: Option<&Utf8Path>,
    ) -> Result<FetchSummary, HdfsError> {
        let destination_path =
            destination.map_or_else(|| Utf8PathBuf::from(source), Utf8Path::to_path_buf);
        let command = commands::cat_command(&self.config.hdfs_bin, source);
        let invocation = RemoteInvocation::new(target.clone(), command, TransferMode::Binary);

        let mut channel = self.open_channel(&invocation)?;
        let (local, mut file) = match LocalDestination::create(&destination_path) {
            Ok(created) => created,
            Err(err) => {
                channel.close().ok();
                return Err(err);
            }
        };

        let copied = copy_chunks(&mut channel, &mut file)
            .and_then(|stats| file.sync_all().map(|()| stats).map_err(CopyError::Write));
        drop(file);
        let closed = channel.close();

        match Self::settle_fetch(&invocation, local.path(), copied, closed) {
            Ok(stats) => {
                local.commit()?;
                info!(
                    source,
                    destination = %destination_path,
                    bytes = stats.bytes,
                    "fetch complete"
                );
                Ok(FetchSummary {
                    source: source.to_owned(),
                    destination: destination_path,
                    bytes: stats.bytes,
                    chunks: stats.chunks,
                })
            }
            Err(err) => {
                local.discard();
                Err(err)
            }
        }
    }

    /// Picks the most informative outcome of a fetch: local write failures
    /// first, then the remote exit status, then stream read failures.
    fn settle_fetch(
        invocation: &RemoteInvocation,
        destination: &Utf8Path,
        copied: Result<CopyStats, CopyError>,
        closed: Result<ChannelStatus, HdfsError>,
    ) -> Result<CopyStats, HdfsError> {
        if let Err(CopyError::Write(ref err)) = copied {
            return Err(HdfsError::LocalFile {
                path: destination.to_string(),
                message: err.to_string(),
            });
        }

        let exit = closed?;
        match copied {
            Ok(stats) => {
                Self::check_status(invocation, &exit)?;
                Ok(stats)
            }
            Err(err) => {
                // A killed process says nothing about why the stream broke.
                if exit.code.is_some() {
                    Self::check_status(invocation, &exit)?;
                }
                Err(HdfsError::Read {
                    command: invocation.command.clone(),
                    message: err.to_string(),
                })
            }
        }
    }

    fn run_text(&self, invocation: &RemoteInvocation) -> Result<String, HdfsError> {
        let mut channel = self.open_channel(invocation)?;
        let text = match channel.read_text() {
            Ok(text) => text,
            Err(err) => {
                channel.close().ok();
                return Err(err);
            }
        };
        let status = channel.close()?;
        Self::check_status(invocation, &status)?;
        Ok(text)
    }

    fn check_status(
        invocation: &RemoteInvocation,
        status: &ChannelStatus,
    ) -> Result<(), HdfsError> {
        match status.code {
            Some(0) => Ok(()),
            Some(SSH_FAILURE_STATUS) => Err(HdfsError::Connection {
                target: invocation.target.connection_target(),
                stderr: status.stderr.trim().to_owned(),
            }),
            code => Err(HdfsError::RemoteCommand {
                command: invocation.command.clone(),
                status: code,
                status_text: code.map_or_else(|| String::from("signal"), |c| c.to_string()),
                stderr: status.stderr.trim().to_owned(),
            }),
        }
    }

    fn build_ssh_args(&self, invocation: &RemoteInvocation) -> Vec<OsString> {
        let mut args = self.common_ssh_options();
        args.push(OsString::from(invocation.target.connection_target()));
        args.push(OsString::from(&invocation.command));
        args
    }

    fn common_ssh_options(&self) -> Vec<OsString> {
        let mut args = Vec::new();

        if let Some(port) = self.config.ssh_port {
            args.push(OsString::from("-p"));
            args.push(OsString::from(port.to_string()));
        }

        if let Some(identity_file) = self.config.identity_file_path() {
            args.push(OsString::from("-i"));
            args.push(identity_file.into_std_path_buf().into_os_string());
        }

        if self.config.ssh_batch_mode {
            args.push(OsString::from("-o"));
            args.push(OsString::from("BatchMode=yes"));
        }

        args
    }
}

#[cfg(test)]
mod tests;
