//! Clap-free toolchain settings.

use crate::invocation::DEVELOPER_DIR_FLAG;
use camino::Utf8PathBuf;
use serde::Deserialize;

/// How plist conversion is performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterMode {
    /// Shell out to `plutil`.
    #[default]
    External,
    /// Decode and re-encode in-process.
    Native,
}

/// Tool locations and developer directory selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Use the pinned developer directory instead of the system install.
    pub hermetic: bool,
    pub developer_dir: Option<Utf8PathBuf>,
    pub plutil: String,
    pub ib_compiler: String,
    /// Program recorded in merge/substitute rules.
    pub helper: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            hermetic: false,
            developer_dir: None,
            plutil: "plutil".to_string(),
            ib_compiler: "ibtool".to_string(),
            helper: "plistkit".to_string(),
        }
    }
}

impl Toolchain {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.hermetic && self.developer_dir.is_none() {
            anyhow::bail!("hermetic toolchain selected but no developer_dir configured");
        }
        Ok(())
    }

    /// `--developer-dir <dir>` when the hermetic toolchain is active.
    pub fn developer_dir_args(&self) -> Vec<String> {
        match (&self.developer_dir, self.hermetic) {
            (Some(dir), true) => vec![DEVELOPER_DIR_FLAG.to_string(), dir.to_string()],
            _ => vec![],
        }
    }
}
