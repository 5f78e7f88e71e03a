//! Execution backends.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError};

use crate::error::SbsError;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read size for captured pipes.
const CHUNK_SIZE: usize = 8 * 1024;

/// Captured result of running a fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Execution {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub duration: Duration,
}

impl Execution {
    /// A successful execution that printed `stdout`.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Execution {
            stdout: stdout.into(),
            status: Some(0),
            ..Execution::default()
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// A runtime that can execute a code fragment and capture its output.
pub trait ExternalRunner: Send + Sync {
    /// Short label used in reports (`cpython`, `ipy`, ...).
    fn name(&self) -> &str;

    fn execute(&self, code: &str) -> Result<Execution, SbsError>;
}

/// In-process runner backed by a closure.
pub struct FnRunner<F> {
    name: String,
    f: F,
}

impl<F> FnRunner<F>
where
    F: Fn(&str) -> Result<Execution, SbsError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        FnRunner {
            name: name.into(),
            f,
        }
    }
}

impl<F> ExternalRunner for FnRunner<F>
where
    F: Fn(&str) -> Result<Execution, SbsError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, code: &str) -> Result<Execution, SbsError> {
        (self.f)(code)
    }
}

/// How a fragment is handed to the interpreter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Write the fragment to a temp file and pass its path as the last argument.
    #[default]
    File,
    /// Pipe the fragment to the interpreter's stdin.
    Stdin,
}

/// Runs fragments by spawning an interpreter process.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    input: InputMode,
    extension: String,
    timeout: Duration,
    current_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        ProcessRunner {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            input: InputMode::File,
            extension: "py".to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            current_dir: None,
        }
    }

    /// Arguments placed before the script path.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn input(mut self, input: InputMode) -> Self {
        self.input = input;
        self
    }

    /// Extension for temp files in [`InputMode::File`] (without the dot).
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn time_limit(&self) -> Duration {
        self.timeout
    }

    /// Run an existing script file.
    pub fn run_file(&self, path: &Path) -> Result<Execution, SbsError> {
        self.run_file_with_timeout(path, self.timeout)
    }

    /// Run an existing script file with an explicit bound.
    pub fn run_file_with_timeout(
        &self,
        path: &Path,
        timeout: Duration,
    ) -> Result<Execution, SbsError> {
        let mut command = self.command();
        command.arg(path);
        run_with_timeout(command, None, timeout)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl ExternalRunner for ProcessRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, code: &str) -> Result<Execution, SbsError> {
        match self.input {
            InputMode::Stdin => run_with_timeout(self.command(), Some(code), self.timeout),
            InputMode::File => {
                let suffix = format!(".{}", self.extension);
                let mut file = tempfile::Builder::new()
                    .prefix("ipt_")
                    .suffix(&suffix)
                    .tempfile()?;
                file.write_all(code.as_bytes())?;
                file.flush()?;
                // `file` is removed on drop, after the child has exited.
                self.run_file(file.path())
            }
        }
    }
}

/// Spawn `command`, optionally feeding `stdin`, and wait at most `timeout`.
///
/// A child still running at the deadline is killed and reported as
/// [`SbsError::Timeout`]; its output is discarded. Output capture is bound
/// by the same deadline: when a descendant keeps a pipe open after the
/// child exits, whatever arrived before the deadline is returned.
#[tracing::instrument(level = "debug", skip_all, fields(program = ?command.get_program()))]
pub fn run_with_timeout(
    mut command: Command,
    stdin: Option<&str>,
    timeout: Duration,
) -> Result<Execution, SbsError> {
    let program = command.get_program().to_string_lossy().into_owned();
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let start = Instant::now();
    let mut child = command.spawn().map_err(|source| SbsError::Spawn {
        program: program.clone(),
        source,
    })?;

    // Feed stdin and drain stdout/stderr on their own threads so a child
    // filling one pipe cannot block on the other.
    // The writer is never joined: a descendant holding stdin must not
    // extend the wait.
    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let input = input.to_owned();
        thread::spawn(move || {
            // A child that exits without reading stdin closes the pipe.
            let _ = pipe.write_all(input.as_bytes());
        });
    }
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());
    let deadline = start + timeout;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() >= timeout {
            tracing::warn!(%program, ?timeout, "process exceeded its time limit, killing it");
            // Either call can fail if the child exited after `try_wait`.
            let _ = child.kill();
            let _ = child.wait();
            return Err(SbsError::Timeout { program, timeout });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let execution = Execution {
        stdout: collect_output(stdout, deadline, &program),
        stderr: collect_output(stderr, deadline, &program),
        status: status.code(),
        duration: start.elapsed(),
    };
    tracing::debug!(status = ?execution.status, duration = ?execution.duration, "process finished");
    Ok(execution)
}

/// Forward everything read from `pipe` in chunks until EOF.
fn spawn_reader<R>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let (tx, rx) = channel::unbounded();
        thread::spawn(move || {
            let mut chunk = vec![0; CHUNK_SIZE];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                    Err(_) => break,
                }
            }
        });
        rx
    })
}

/// Gather a reader's chunks until EOF or `deadline`, whichever comes first.
fn collect_output(rx: Option<Receiver<Vec<u8>>>, deadline: Instant, program: &str) -> String {
    let mut bytes = Vec::new();
    if let Some(rx) = rx {
        loop {
            match rx.recv_deadline(deadline) {
                Ok(chunk) => bytes.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(%program, "output pipe still open at the deadline, keeping partial output");
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
