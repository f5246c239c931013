//! Port traits abstracting process and filesystem side effects.

use crate::invocation::{Invocation, ToolOutput};
use camino::Utf8Path;

/// Runs external tools. `Err` means the process could not be started;
/// a non-zero exit is reported through [`ToolOutput`].
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<ToolOutput>;
}

/// File-system write operations.
pub trait WritePort {
    /// Replace `path` with `contents`. Readers never observe a partial file.
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}
