//! Test support utilities shared across unit and integration tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::io::{self, Cursor, Read};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::HdfsError;
use crate::remote::{Channel, ChannelSource, ChannelStatus, CommandRunner, TransferMode};

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
    /// Transfer mode requested by the caller.
    pub mode: TransferMode,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

#[derive(Clone, Debug)]
enum ScriptedResponse {
    Output {
        code: Option<i32>,
        stdout: Vec<u8>,
        stderr: String,
    },
    ReadFailure {
        prefix: Vec<u8>,
    },
    SpawnFailure {
        message: String,
    },
}

/// Scripted command runner that returns pre-seeded channels in FIFO order.
///
/// Every channel handed out reports back how many times it was finished, so
/// tests can assert that each call released its channel exactly once.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<ScriptedResponse>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
    opened: Rc<Cell<usize>>,
    finished: Rc<Cell<usize>>,
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Number of channels handed out.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.get()
    }

    /// Number of `finish` calls across all channels handed out.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.finished.get()
    }

    /// Pushes a successful run printing `stdout`.
    pub fn push_stdout(&self, stdout: impl Into<Vec<u8>>) {
        self.push_output(Some(0), stdout, "");
    }

    /// Pushes an explicit channel response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<Vec<u8>>,
        stderr: impl Into<String>,
    ) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::Output {
                code,
                stdout: stdout.into(),
                stderr: stderr.into(),
            });
    }

    /// Pushes a channel that yields `prefix` and then fails with an I/O error.
    pub fn push_read_failure(&self, prefix: impl Into<Vec<u8>>) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::ReadFailure {
                prefix: prefix.into(),
            });
    }

    /// Pushes a failure to start the process.
    pub fn push_spawn_failure(&self, message: impl Into<String>) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::SpawnFailure {
                message: message.into(),
            });
    }
}

impl CommandRunner for ScriptedRunner {
    fn open(
        &self,
        program: &str,
        args: &[OsString],
        mode: TransferMode,
    ) -> Result<Channel, HdfsError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
            mode,
        });
        let response = self.responses.borrow_mut().pop_front().ok_or_else(|| {
            HdfsError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            }
        })?;

        let (data, status, fail_at_end) = match response {
            ScriptedResponse::Output {
                code,
                stdout,
                stderr,
            } => (stdout, ChannelStatus { code, stderr }, false),
            ScriptedResponse::ReadFailure { prefix } => (
                prefix,
                ChannelStatus {
                    code: Some(0),
                    stderr: String::new(),
                },
                true,
            ),
            ScriptedResponse::SpawnFailure { message } => {
                return Err(HdfsError::Spawn {
                    program: program.to_owned(),
                    message,
                });
            }
        };

        self.opened.set(self.opened.get() + 1);
        let command = args
            .last()
            .map_or_else(String::new, |arg| arg.to_string_lossy().into_owned());
        let source = ScriptedSource {
            data: Cursor::new(data),
            status,
            fail_at_end,
            finished: Rc::clone(&self.finished),
        };
        Ok(Channel::new(command, mode, Box::new(source)))
    }
}

struct ScriptedSource {
    data: Cursor<Vec<u8>>,
    status: ChannelStatus,
    fail_at_end: bool,
    finished: Rc<Cell<usize>>,
}

impl Read for ScriptedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.data.read(buf)?;
        if read == 0 && self.fail_at_end && !buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "scripted stream reset",
            ));
        }
        Ok(read)
    }
}

impl ChannelSource for ScriptedSource {
    fn finish(&mut self) -> io::Result<ChannelStatus> {
        self.finished.set(self.finished.get() + 1);
        Ok(self.status.clone())
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    #[must_use]
    pub fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
