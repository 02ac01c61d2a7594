//! Binary entry point for the `sshdfs` CLI.

use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use sshdfs::{
    DirectoryEntry, FetchSummary, HdfsClient, HdfsError, ProcessCommandRunner, RemoteTarget,
    SshdfsConfig, UsageRecord,
};

mod cli;

use cli::{Cli, FetchCommand, ListCommand, TargetArgs, UsageCommand};

/// Environment variable holding the log filter directive.
const LOG_ENV_VAR: &str = "SSHDFS_LOG";

type Client = HdfsClient<ProcessCommandRunner>;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Hdfs(#[from] HdfsError),
    #[error("failed to write output: {0}")]
    Output(String),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config =
        SshdfsConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let client = HdfsClient::with_process_runner(config)?;
    let mut stdout = io::stdout().lock();

    match cli {
        Cli::List(command) => run_list(&client, &command, &mut stdout),
        Cli::Usage(command) => run_usage(&client, &command, &mut stdout),
        Cli::Fetch(command) => run_fetch(&client, &command, &mut stdout),
    }
}

fn resolve_target(client: &Client, args: &TargetArgs) -> Result<RemoteTarget, CliError> {
    Ok(client.resolve_target(args.host.as_deref(), args.user.as_deref())?)
}

fn run_list(
    client: &Client,
    command: &ListCommand,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let target = resolve_target(client, &command.target)?;
    let entries = client.list(&target, &command.args)?;
    if command.json {
        write_json(out, &entries)
    } else {
        write_listing(out, &entries)
    }
}

fn run_usage(
    client: &Client,
    command: &UsageCommand,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let target = resolve_target(client, &command.target)?;
    let records = client.usage(&target, &command.path)?;
    if command.json {
        write_json(out, &records)
    } else {
        write_usage(out, &records)
    }
}

fn run_fetch(
    client: &Client,
    command: &FetchCommand,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let target = resolve_target(client, &command.target)?;
    let destination = command.destination.as_deref().map(Utf8PathBuf::from);
    let summary = client.fetch(&target, &command.source, destination.as_deref())?;
    write_summary(out, &summary)
}

fn write_listing(out: &mut impl Write, entries: &[DirectoryEntry]) -> Result<(), CliError> {
    for entry in entries {
        writeln!(
            out,
            "{} {} {} {:>12} {} {}",
            entry.permissions,
            entry.owner,
            entry.group,
            entry.size,
            entry.modified.format("%Y-%m-%d %H:%M"),
            entry.path
        )
        .map_err(output_error)?;
    }
    Ok(())
}

fn write_usage(out: &mut impl Write, records: &[UsageRecord]) -> Result<(), CliError> {
    for record in records {
        writeln!(
            out,
            "{:>12} {:>12} {}",
            record.logical_size, record.physical_size, record.path
        )
        .map_err(output_error)?;
    }
    Ok(())
}

fn write_summary(out: &mut impl Write, summary: &FetchSummary) -> Result<(), CliError> {
    writeln!(
        out,
        "{} -> {} ({} bytes)",
        summary.source, summary.destination, summary.bytes
    )
    .map_err(output_error)
}

fn write_json<T: Serialize>(out: &mut impl Write, records: &[T]) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, records)
        .map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(out).map_err(output_error)
}

fn output_error(err: io::Error) -> CliError {
    CliError::Output(err.to_string())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "sshdfs: {err}").ok();
}
