//! Remote command channels.
//!
//! A [`RemoteInvocation`] describes one `ssh [user@]host command` call. A
//! [`CommandRunner`] turns it into a [`Channel`]: a readable handle on the
//! remote process's standard output that is finished exactly once, either
//! through [`Channel::close`] or, on early-return paths, when dropped.

use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::HdfsError;

mod process;

pub use process::{ProcessChannel, ProcessCommandRunner};

/// How the remote output is consumed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Output is decoded as text and parsed line by line.
    Text,
    /// Output is copied byte for byte.
    Binary,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

/// Host and optional user to connect as.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteTarget {
    /// Hostname or address.
    pub host: String,
    /// Login user; `None` or an empty string defers to SSH's own default.
    pub user: Option<String>,
}

impl RemoteTarget {
    /// Creates a target for `host` with an optional user.
    #[must_use]
    pub fn new(host: impl Into<String>, user: Option<String>) -> Self {
        Self {
            host: host.into(),
            user,
        }
    }

    /// Returns `user@host` when a non-empty user is set, otherwise `host`.
    #[must_use]
    pub fn connection_target(&self) -> String {
        match self.user.as_deref() {
            Some(user) if !user.is_empty() => format!("{user}@{}", self.host),
            _ => self.host.clone(),
        }
    }
}

/// A single remote command execution request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteInvocation {
    /// Where to run the command.
    pub target: RemoteTarget,
    /// Command line executed by the remote shell.
    pub command: String,
    /// How the caller will consume the output.
    pub mode: TransferMode,
}

impl RemoteInvocation {
    /// Creates an invocation.
    #[must_use]
    pub fn new(target: RemoteTarget, command: impl Into<String>, mode: TransferMode) -> Self {
        Self {
            target,
            command: command.into(),
            mode,
        }
    }

    /// Returns `[user@]host command` as handed to the SSH client.
    #[must_use]
    pub fn invocation_string(&self) -> String {
        format!("{} {}", self.target.connection_target(), self.command)
    }
}

/// Exit information collected when a channel is finished.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChannelStatus {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard error.
    pub stderr: String,
}

impl ChannelStatus {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Byte source behind a [`Channel`].
///
/// Implementations release their process and descriptors in `finish`.
/// [`Channel`] guarantees `finish` is called exactly once.
pub trait ChannelSource: Read {
    /// Releases the source and reports how the remote side finished.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the underlying process cannot be reaped.
    fn finish(&mut self) -> io::Result<ChannelStatus>;
}

/// Open, readable, closable conduit to a remote command's output.
pub struct Channel {
    command: String,
    mode: TransferMode,
    source: Box<dyn ChannelSource>,
    finished: bool,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("command", &self.command)
            .field("mode", &self.mode)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Wraps `source` as a channel for `command`.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        mode: TransferMode,
        source: Box<dyn ChannelSource>,
    ) -> Self {
        Self {
            command: command.into(),
            mode,
            source,
            finished: false,
        }
    }

    /// Command the channel is attached to.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Transfer mode the channel was opened with.
    #[must_use]
    pub const fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Drains the channel and decodes the output as text.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::Read`] when the channel was opened in binary mode
    /// or reading fails.
    pub fn read_text(&mut self) -> Result<String, HdfsError> {
        if self.mode != TransferMode::Text {
            return Err(HdfsError::Read {
                command: self.command.clone(),
                message: String::from("channel was opened in binary mode"),
            });
        }

        let mut buffer = Vec::new();
        self.source
            .read_to_end(&mut buffer)
            .map_err(|err| HdfsError::Read {
                command: self.command.clone(),
                message: err.to_string(),
            })?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Finishes the channel and returns the remote exit status.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::Read`] when the process cannot be reaped.
    pub fn close(mut self) -> Result<ChannelStatus, HdfsError> {
        self.finished = true;
        let status = self.source.finish().map_err(|err| HdfsError::Read {
            command: self.command.clone(),
            message: err.to_string(),
        })?;
        debug!(command = %self.command, code = ?status.code, "channel closed");
        Ok(status)
    }
}

impl Read for Channel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.source.read(buf)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        warn!(command = %self.command, "channel dropped without close; releasing");
        if let Err(err) = self.source.finish() {
            warn!(command = %self.command, error = %err, "failed to release channel");
        }
    }
}

/// Abstraction over process spawning to support fakes in tests.
pub trait CommandRunner {
    /// Starts `program` with `args` and returns a channel on its stdout.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::Spawn`] if the command cannot be started.
    fn open(
        &self,
        program: &str,
        args: &[OsString],
        mode: TransferMode,
    ) -> Result<Channel, HdfsError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn open(
        &self,
        program: &str,
        args: &[OsString],
        mode: TransferMode,
    ) -> Result<Channel, HdfsError> {
        (**self).open(program, args, mode)
    }
}
