//! Command-line interface definitions for the `sshdfs` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser};

/// Top-level CLI for the `sshdfs` binary.
#[derive(Debug, Parser)]
#[command(
    name = "sshdfs",
    about = "List, size, and fetch distributed filesystem paths over SSH",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// List remote paths.
    #[command(name = "ls", about = "List remote paths with `hdfs dfs -ls`")]
    List(ListCommand),
    /// Summarise remote disk usage.
    #[command(name = "du", about = "Summarise disk usage with `hdfs dfs -du -s`")]
    Usage(UsageCommand),
    /// Copy a remote file to local storage.
    #[command(name = "get", about = "Stream a remote file into a local file")]
    Fetch(FetchCommand),
}

/// Connection options shared by every subcommand.
#[derive(Debug, Args)]
pub(crate) struct TargetArgs {
    /// Remote host running the filesystem client. Defaults to
    /// `default_host` from configuration.
    #[arg(long, short = 'H', value_name = "HOST")]
    pub(crate) host: Option<String>,
    /// Remote login user. Defaults to `default_user` from configuration, then
    /// to SSH's own choice.
    #[arg(long, short = 'u', value_name = "USER")]
    pub(crate) user: Option<String>,
}

/// Arguments for `sshdfs ls`.
#[derive(Debug, Parser)]
pub(crate) struct ListCommand {
    #[command(flatten)]
    pub(crate) target: TargetArgs,
    /// Print records as a JSON array.
    #[arg(long)]
    pub(crate) json: bool,
    /// Arguments passed to the remote listing command (use -- before flags
    /// such as -R).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub(crate) args: Vec<String>,
}

/// Arguments for `sshdfs du`.
#[derive(Debug, Parser)]
pub(crate) struct UsageCommand {
    #[command(flatten)]
    pub(crate) target: TargetArgs,
    /// Print records as a JSON array.
    #[arg(long)]
    pub(crate) json: bool,
    /// Remote path to summarise.
    pub(crate) path: String,
}

/// Arguments for `sshdfs get`.
#[derive(Debug, Parser)]
pub(crate) struct FetchCommand {
    #[command(flatten)]
    pub(crate) target: TargetArgs,
    /// Remote file to stream.
    pub(crate) source: String,
    /// Local destination; defaults to the remote path.
    pub(crate) destination: Option<String>,
}
