//! Staged outputs for external tools.
//!
//! A tool writes into a private temp directory next to the final output.
//! `commit` renames the result into place. Dropping an uncommitted
//! [`StagedOutput`] removes whatever the tool left behind, so a failed rule
//! never leaves a partial output.

use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tempfile::TempDir;
use tracing::debug;

#[derive(Debug)]
pub struct StagedOutput {
    _dir: TempDir,
    staged: Utf8PathBuf,
    target: Utf8PathBuf,
}

impl StagedOutput {
    pub fn new(target: &Utf8Path) -> anyhow::Result<Self> {
        let parent = parent_dir(target);
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;

        let file_name = target
            .file_name()
            .ok_or_else(|| anyhow!("output path {} has no file name", target))?;
        let dir = tempfile::Builder::new()
            .prefix(".plistkit-")
            .tempdir_in(parent)
            .with_context(|| format!("create staging dir in {}", parent))?;
        let dir_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow!("staging dir {} is not utf-8", p.display()))?;

        Ok(Self {
            staged: dir_path.join(file_name),
            _dir: dir,
            target: target.to_path_buf(),
        })
    }

    /// Where the tool should write.
    pub fn path(&self) -> &Utf8Path {
        &self.staged
    }

    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// Move the staged output over the target. Directory outputs (such as
    /// `.storyboardc` bundles) replace any previous directory.
    pub fn commit(self) -> anyhow::Result<Utf8PathBuf> {
        if self.target.is_dir() {
            fs::remove_dir_all(&self.target)
                .with_context(|| format!("remove stale {}", self.target))?;
        }
        fs::rename(&self.staged, &self.target)
            .with_context(|| format!("move {} into place", self.target))?;
        debug!(output = %self.target, "committed staged output");
        Ok(self.target)
    }
}

pub(crate) fn parent_dir(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    }
}
