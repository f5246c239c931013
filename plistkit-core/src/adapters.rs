//! Default process- and filesystem-backed port implementations.

use crate::invocation::{Invocation, ToolOutput};
use crate::ports::{ToolRunner, WritePort};
use crate::staging::parent_dir;
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs tools as blocking child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<ToolOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(
                invocation
                    .env
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn {}", invocation.program))?;

        let out = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program = %invocation.program, code = ?out.code, "tool exited");
        Ok(out)
    }
}

/// Writes through a temp file in the destination directory, then renames.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        let parent = parent_dir(path);
        fs::create_dir_all(parent).with_context(|| format!("create parent dir for {}", path))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".plistkit-")
            .tempfile_in(parent)
            .with_context(|| format!("create temp file in {}", parent))?;
        tmp.write_all(contents)
            .with_context(|| format!("write temp file for {}", path))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("sync temp file for {}", path))?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("write {}", path))?;
        Ok(())
    }
}
