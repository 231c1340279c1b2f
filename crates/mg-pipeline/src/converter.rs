//! The content converter collaborator.
//!
//! Conversion itself happens outside this engine. A [`Converter`] takes a
//! legacy file's path and text and returns a [`Conversion`]: either the
//! converted code (plus optional generated test code) or a failure reason.

use std::time::Duration;

use camino::Utf8Path;
use mg_core::CommandSpec;
use tracing::debug;

use crate::tools::{ToolOutcome, ToolRunner};

/// Marker line separating converted code from generated test code on stdout.
pub const TEST_MARKER: &str = "--- test ---";

/// Environment variable carrying the source path for [`CommandConverter`].
pub const SOURCE_PATH_ENV: &str = "MG_SOURCE_PATH";

/// The outcome of converting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// The converter produced code.
    Converted {
        /// Converted source text.
        code: String,
        /// Generated test text, if any.
        test_code: Option<String>,
    },
    /// The converter could not convert the file.
    Failed {
        /// Why.
        reason: String,
    },
}

impl Conversion {
    /// Creates a failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Converts legacy source text into the typed format.
pub trait Converter {
    /// Converts `source`, read from `path`.
    fn convert(&self, path: &Utf8Path, source: &str) -> Conversion;

    /// Name recorded in the `Model` header of staged artifacts.
    fn model(&self) -> &str {
        "external"
    }
}

/// A converter backed by an external command.
///
/// The source text goes to the command's stdin and its path to
/// `MG_SOURCE_PATH`. Everything the command prints before a line equal to
/// `--- test ---` is the converted code; everything after it is test code.
/// A non-zero exit, a timeout or empty output is a failure.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    spec: CommandSpec,
    runner: ToolRunner,
}

impl CommandConverter {
    /// Creates a converter that runs `spec` with `timeout`.
    #[must_use]
    pub const fn new(spec: CommandSpec, timeout: Duration) -> Self {
        Self {
            spec,
            runner: ToolRunner::new(timeout),
        }
    }
}

impl Converter for CommandConverter {
    fn model(&self) -> &str {
        &self.spec.name
    }

    fn convert(&self, path: &Utf8Path, source: &str) -> Conversion {
        let report = self
            .runner
            .run_with_input(&self.spec, Some(source), &[(SOURCE_PATH_ENV, path.as_str())]);

        match report.outcome {
            ToolOutcome::Passed => parse_output(&report.stdout),
            ToolOutcome::Failed { code } => {
                let detail = report.stderr.lines().last().unwrap_or("").trim();
                let code = code.map_or_else(|| "signal".to_owned(), |code| code.to_string());
                debug!(path = %path, code = %code, "Converter exited unsuccessfully");
                Conversion::failed(if detail.is_empty() {
                    format!("converter exited with {code}")
                } else {
                    format!("converter exited with {code}: {detail}")
                })
            }
            ToolOutcome::TimedOut => Conversion::failed(format!(
                "converter timed out after {}s",
                self.runner.timeout().as_secs()
            )),
            ToolOutcome::SpawnFailed { reason } => {
                Conversion::failed(format!("converter could not start: {reason}"))
            }
        }
    }
}

/// Splits converter stdout into code and optional test code.
fn parse_output(stdout: &str) -> Conversion {
    let mut code = String::new();
    let mut test = None::<String>;

    for line in stdout.split_inclusive('\n') {
        if test.is_none() && line.trim_end() == TEST_MARKER {
            test = Some(String::new());
            continue;
        }
        match test.as_mut() {
            Some(test) => test.push_str(line),
            None => code.push_str(line),
        }
    }

    if code.trim().is_empty() {
        return Conversion::failed("converter produced no code");
    }
    Conversion::Converted {
        code,
        test_code: test.filter(|test| !test.trim().is_empty()),
    }
}
