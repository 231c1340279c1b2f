//! Blocking subprocess execution with a timeout.
//!
//! External tools (compiler, test runner, linter, converter) run as child
//! processes. stdout and stderr are drained on helper threads so a chatty
//! child cannot fill a pipe and stall, and stdin is fed from a third thread.
//! The main thread waits with
//! [`wait_timeout`](wait_timeout::ChildExt::wait_timeout) and kills the child
//! when the deadline passes. Every outcome, including a failed spawn, is
//! returned as data.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use mg_core::CommandSpec;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Default timeout for a single tool run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How a tool run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Exited with status zero.
    Passed,
    /// Exited non-zero, or was killed by a signal (`code` is `None`).
    Failed {
        /// Exit code, when there is one.
        code: Option<i32>,
    },
    /// Did not finish within the timeout and was killed.
    TimedOut,
    /// Could not be started.
    SpawnFailed {
        /// The spawn error.
        reason: String,
    },
}

impl ToolOutcome {
    /// Returns `true` for [`ToolOutcome::Passed`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Short label for reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::TimedOut => "timed-out",
            Self::SpawnFailed { .. } => "spawn-failed",
        }
    }
}

/// The result of one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReport {
    /// Name of the command.
    pub name: String,
    /// The command line as run.
    pub command: String,
    /// How it ended.
    pub outcome: ToolOutcome,
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
    /// Wall time.
    pub duration: Duration,
}

/// Runs external commands with a timeout.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use mg_core::CommandSpec;
/// use mg_pipeline::ToolRunner;
///
/// let runner = ToolRunner::new(Duration::from_secs(60));
/// let report = runner.run(&CommandSpec::new("tsc", "npx", &["tsc", "--noEmit"]));
/// println!("{}: {}", report.name, report.outcome.label());
/// ```
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
    working_dir: Option<Utf8PathBuf>,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ToolRunner {
    /// Creates a runner with the given timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            working_dir: None,
        }
    }

    /// Runs commands in `dir` instead of the current directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// The configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `spec` with no input.
    pub fn run(&self, spec: &CommandSpec) -> ToolReport {
        self.run_with_input(spec, None, &[])
    }

    /// Runs `spec`, writing `input` to its stdin and adding `env` to its environment.
    pub fn run_with_input(
        &self,
        spec: &CommandSpec,
        input: Option<&str>,
        env: &[(&str, &str)],
    ) -> ToolReport {
        let started = Instant::now();
        let command = spec.display();
        debug!(tool = %spec.name, command = %command, "Running tool");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let report = |outcome, stdout: String, stderr: String| ToolReport {
            name: spec.name.clone(),
            command: command.clone(),
            outcome,
            stdout,
            stderr,
            duration: started.elapsed(),
        };

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(tool = %spec.name, error = %e, "Failed to spawn tool");
                return report(
                    ToolOutcome::SpawnFailed {
                        reason: e.to_string(),
                    },
                    String::new(),
                    String::new(),
                );
            }
        };

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        if let (Some(text), Some(mut stdin)) = (input, child.stdin.take()) {
            let text = text.to_owned();
            std::thread::spawn(move || {
                if let Err(e) = stdin.write_all(text.as_bytes()) {
                    debug!(error = %e, "Tool closed stdin early");
                }
            });
        }

        let outcome = wait(&mut child, self.timeout, &spec.name);
        if outcome == ToolOutcome::TimedOut {
            // Grandchildren may still hold the pipes; leave the readers detached.
            return report(outcome, String::new(), String::new());
        }
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        debug!(tool = %spec.name, outcome = outcome.label(), "Tool finished");
        report(outcome, stdout, stderr)
    }

    /// Runs every spec in order, never stopping early.
    pub fn run_all(&self, specs: &[CommandSpec]) -> Vec<ToolReport> {
        specs.iter().map(|spec| self.run(spec)).collect()
    }
}

fn wait(child: &mut Child, timeout: Duration, name: &str) -> ToolOutcome {
    match child.wait_timeout(timeout) {
        Ok(Some(status)) if status.success() => ToolOutcome::Passed,
        Ok(Some(status)) => ToolOutcome::Failed {
            code: status.code(),
        },
        Ok(None) => {
            warn!(tool = name, timeout_secs = timeout.as_secs(), "Tool timed out, killing");
            if let Err(e) = child.kill() {
                warn!(tool = name, error = %e, "Failed to kill tool");
            }
            let _ = child.wait();
            ToolOutcome::TimedOut
        }
        Err(e) => {
            warn!(tool = name, error = %e, "Failed to wait for tool");
            let _ = child.kill();
            let _ = child.wait();
            ToolOutcome::Failed { code: None }
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
