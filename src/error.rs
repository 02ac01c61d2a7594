//! Error type shared by every `sshdfs` operation.
//!
//! Transport failures (the local `ssh` client could not be started or could
//! not reach the host) are kept apart from output-format failures (the remote
//! tool printed something that does not match the expected table) so callers
//! can tell a dead host from a changed output format.

use thiserror::Error;

/// Errors surfaced while running remote filesystem commands.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HdfsError {
    /// Raised when configuration is missing required values. The message
    /// names both the environment variable and the configuration key.
    #[error("missing {field}: set SSHDFS_{env_suffix} or add {field} to sshdfs.toml", env_suffix = field.to_uppercase())]
    InvalidConfig {
        /// Configuration field that failed validation.
        field: String,
    },
    /// Raised when neither the command line nor configuration names a host.
    #[error("no remote host given: pass --host or set SSHDFS_DEFAULT_HOST")]
    MissingHost,
    /// Raised when a local process cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the SSH client itself fails (exit status 255), which
    /// covers unreachable hosts and rejected logins.
    #[error("could not reach {target} over ssh: {stderr}")]
    Connection {
        /// Connection target in `[user@]host` form.
        target: String,
        /// Stderr captured from the SSH client.
        stderr: String,
    },
    /// Raised when the remote command exits unsuccessfully.
    #[error("remote command `{command}` exited with status {status_text}: {stderr}")]
    RemoteCommand {
        /// Remote command line that was executed.
        command: String,
        /// Exit status reported by the process, absent when killed by a signal.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the process.
        stderr: String,
    },
    /// Raised when reading from an open channel fails.
    #[error("failed to read output of `{command}`: {message}")]
    Read {
        /// Remote command whose output was being read.
        command: String,
        /// Underlying I/O error string.
        message: String,
    },
    /// Raised when a table row does not carry the expected number of fields.
    #[error("line {line}: expected {expected} fields, found {found}: {content:?}")]
    Schema {
        /// One-based line number within the command output.
        line: usize,
        /// Number of columns the schema declares.
        expected: usize,
        /// Number of fields present on the line.
        found: usize,
        /// Offending line.
        content: String,
    },
    /// Raised when a field cannot be converted to its column type.
    #[error("line {line}: invalid {column} {value:?}: {reason}")]
    InvalidField {
        /// One-based line number within the command output.
        line: usize,
        /// Column name from the schema.
        column: String,
        /// Raw field text.
        value: String,
        /// Conversion failure description.
        reason: String,
    },
    /// Raised when the local destination cannot be created or written.
    #[error("failed to write {path}: {message}")]
    LocalFile {
        /// Local path being written.
        path: String,
        /// Underlying I/O error string.
        message: String,
    },
}

impl HdfsError {
    /// Returns `true` for failures of the SSH transport rather than of the
    /// remote command or its output.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::Connection { .. })
    }

    /// Returns `true` when the remote tool produced output that does not
    /// match the expected table layout.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::InvalidField { .. })
    }
}
