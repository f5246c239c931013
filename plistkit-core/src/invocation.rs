//! External tool command lines.

use crate::error::ToolInvocationError;
use crate::ports::ToolRunner;
use camino::Utf8Path;
use std::fmt;
use tracing::{debug, warn};

/// Leading flag pair selecting a developer directory for the tool.
///
/// Tools do not understand it; [`Invocation::from_command_line`] turns it
/// into the `DEVELOPER_DIR` environment variable.
pub const DEVELOPER_DIR_FLAG: &str = "--developer-dir";
pub const DEVELOPER_DIR_ENV: &str = "DEVELOPER_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Build from a rule command line, lifting a leading
    /// `--developer-dir <dir>` pair into the environment.
    pub fn from_command_line(program: &str, args: &[String]) -> Self {
        let mut inv = Self::new(program);
        let rest = match args {
            [flag, dir, rest @ ..] if flag == DEVELOPER_DIR_FLAG => {
                inv.env.push((DEVELOPER_DIR_ENV.to_string(), dir.clone()));
                rest
            }
            _ => args,
        };
        inv.args = rest.to_vec();
        inv
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Swap every argument equal to `from` for `to`.
    pub fn replace_arg(&mut self, from: &str, to: &str) {
        for arg in self.args.iter_mut().filter(|a| a.as_str() == from) {
            *arg = to.to_string();
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.env {
            write!(f, "{k}={v} ")?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `invocation` and require both a zero exit and `expected_output` on disk.
pub fn run_tool(
    runner: &dyn ToolRunner,
    invocation: &Invocation,
    expected_output: &Utf8Path,
) -> Result<ToolOutput, ToolInvocationError> {
    debug!(command = %invocation, "running tool");

    let output = runner
        .run(invocation)
        .map_err(|e| ToolInvocationError::Spawn {
            program: invocation.program.clone(),
            message: format!("{e:#}"),
        })?;

    if !output.is_success() {
        let status = output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        warn!(program = %invocation.program, status = %status, "tool failed");
        return Err(ToolInvocationError::ExitStatus {
            program: invocation.program.clone(),
            status,
            stderr: output.stderr.trim().to_string(),
        });
    }

    if !expected_output.exists() {
        return Err(ToolInvocationError::MissingOutput {
            program: invocation.program.clone(),
            output: expected_output.to_path_buf(),
        });
    }

    Ok(output)
}
