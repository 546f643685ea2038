//! External process execution.
//!
//! Both output streams are drained on their own threads. A child that writes
//! more than a pipe buffer to stderr while we block on stdout would otherwise
//! deadlock.

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::{Error, Result};

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `args[0]` with the remaining args and return its stdout.
    ///
    /// A non-zero exit becomes [`Error::CommandFailed`] carrying both streams.
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S], cwd: Option<&Path>) -> Result<String> {
        let output = self.output(args, cwd)?;
        if output.success() {
            return Ok(output.stdout);
        }
        Err(Error::CommandFailed {
            command: display_command(args),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run a process and return whatever it produced, successful or not.
    pub fn output<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput> {
        let command_line = display_command(args);
        let Some((program, rest)) = args.split_first() else {
            return Err(Error::Launch {
                command: command_line,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        tracing::debug!("running: {command_line}");

        let mut cmd = Command::new(program);
        cmd.args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| Error::Launch {
            command: command_line.clone(),
            source,
        })?;

        let stdout = child.stdout.take().map(spawn_drain);
        let stderr = child.stderr.take().map(spawn_drain);

        let status = child.wait().map_err(|source| Error::Launch {
            command: command_line.clone(),
            source,
        })?;

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: join_drain(stdout, "stdout", &command_line)?,
            stderr: join_drain(stderr, "stderr", &command_line)?,
        })
    }
}

type Drain = thread::JoinHandle<std::io::Result<Vec<u8>>>;

fn spawn_drain<R: Read + Send + 'static>(mut pipe: R) -> Drain {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drain(handle: Option<Drain>, stream: &str, command_line: &str) -> Result<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("reader thread panicked")))
        .map_err(|e| Error::io(format!("Failed to read {stream} of '{command_line}'"), e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn display_command<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
