//! Channel backed by a real child process.

use std::ffi::OsString;
use std::io::{self, Read};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::{Channel, ChannelSource, ChannelStatus, CommandRunner, TransferMode};
use crate::error::HdfsError;

/// Real command runner that shells out to the host operating system.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn open(
        &self,
        program: &str,
        args: &[OsString],
        mode: TransferMode,
    ) -> Result<Channel, HdfsError> {
        let spawn_error = |message: String| HdfsError::Spawn {
            program: program.to_owned(),
            message,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| spawn_error(err.to_string()))?;
        debug!(program, pid = child.id(), %mode, "spawned remote command");

        let stdout = child.stdout.take();
        let stderr = match child.stderr.take().map(drain_stderr).transpose() {
            Ok(handle) => handle,
            Err(err) => {
                reap(&mut child);
                return Err(spawn_error(err.to_string()));
            }
        };

        let command = args
            .last()
            .map_or_else(String::new, |arg| arg.to_string_lossy().into_owned());
        let source = ProcessChannel {
            child,
            stdout,
            stderr,
            exhausted: false,
        };
        Ok(Channel::new(command, mode, Box::new(source)))
    }
}

/// Stdout of a spawned process plus the handles needed to release it.
#[derive(Debug)]
pub struct ProcessChannel {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    exhausted: bool,
}

impl Read for ProcessChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(0);
        };
        let read = stdout.read(buf)?;
        if read == 0 && !buf.is_empty() {
            self.exhausted = true;
        }
        Ok(read)
    }
}

impl ChannelSource for ProcessChannel {
    fn finish(&mut self) -> io::Result<ChannelStatus> {
        drop(self.stdout.take());
        if !self.exhausted {
            // The reader gave up early; nobody will drain the rest.
            match self.child.kill() {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::InvalidInput => {}
                Err(err) => return Err(err),
            }
        }

        let status = self.child.wait()?;
        let stderr = self
            .stderr
            .take()
            .map(|handle| handle.join().unwrap_or_default())
            .unwrap_or_default();

        Ok(ChannelStatus {
            code: status.code(),
            stderr,
        })
    }
}

fn drain_stderr(mut stderr: ChildStderr) -> io::Result<JoinHandle<String>> {
    thread::Builder::new()
        .name(String::from("sshdfs-stderr"))
        .spawn(move || {
            let mut buffer = Vec::new();
            if stderr.read_to_end(&mut buffer).is_err() {
                return String::new();
            }
            String::from_utf8_lossy(&buffer).into_owned()
        })
}

fn reap(child: &mut Child) {
    child.kill().ok();
    child.wait().ok();
}
