//! Configuration file loading for plistkit.
//!
//! Discovers and loads `plistkit.toml` from the working directory, or from
//! an explicit `--config` path. Merges config file settings with CLI
//! arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use plistkit_core::settings::{ConverterMode, Toolchain};
use plistkit_core::{PlistFormat, SubstitutionSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "plistkit.toml";

/// Top-level configuration from plistkit.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlistkitConfig {
    pub toolchain: ToolchainConfig,
    pub defaults: DefaultsConfig,

    /// Substitutions applied before any given on the command line.
    pub substitutions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Run tools against `developer_dir` instead of the system Xcode.
    pub hermetic: bool,
    pub developer_dir: Option<Utf8PathBuf>,
    pub plutil: Option<String>,
    pub ib_compiler: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Output format when a command does not name one.
    pub format: Option<PlistFormat>,
    pub converter: Option<ConverterMode>,
}

/// Look for `plistkit.toml` in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<PlistkitConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<PlistkitConfig> {
    let config: PlistkitConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config if given, else the discovered one, else defaults.
///
/// An explicit path that does not exist is an error.
pub fn load_or_default(
    explicit: Option<&Utf8Path>,
    dir: &Utf8Path,
) -> anyhow::Result<PlistkitConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => match discover_config(dir) {
            Some(path) => load_config(&path),
            None => Ok(PlistkitConfig::default()),
        },
    }
}

/// Values given on the command line that can override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub hermetic: bool,
    pub developer_dir: Option<Utf8PathBuf>,
    pub format: Option<PlistFormat>,
    pub native: bool,
    pub substitutions: SubstitutionSet,
}

/// Config file and CLI, merged.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub toolchain: Toolchain,
    pub format: PlistFormat,
    pub converter: ConverterMode,
    /// Config substitutions first, then CLI substitutions.
    pub substitutions: SubstitutionSet,
}

pub struct ConfigMerger {
    config: PlistkitConfig,
}

impl ConfigMerger {
    pub fn new(config: PlistkitConfig) -> Self {
        Self { config }
    }

    /// Merge with CLI overrides.
    ///
    /// `--hermetic` turns the hermetic toolchain on but cannot turn a
    /// configured one off. Substitutions from the CLI come last, so they win.
    pub fn merge(self, cli: &CliOverrides) -> anyhow::Result<MergedConfig> {
        let defaults = Toolchain::default();
        let tc = self.config.toolchain;
        let toolchain = Toolchain {
            hermetic: cli.hermetic || tc.hermetic,
            developer_dir: cli.developer_dir.clone().or(tc.developer_dir),
            plutil: tc.plutil.unwrap_or(defaults.plutil),
            ib_compiler: tc.ib_compiler.unwrap_or(defaults.ib_compiler),
            helper: defaults.helper,
        };
        toolchain.validate()?;

        let converter = if cli.native {
            ConverterMode::Native
        } else {
            self.config.defaults.converter.unwrap_or_default()
        };

        let mut substitutions: SubstitutionSet = self
            .config
            .substitutions
            .iter()
            .map(|(k, v)| plistkit_core::Substitution::new(k.as_str(), v.as_str()))
            .collect();
        substitutions.extend(&cli.substitutions);

        Ok(MergedConfig {
            toolchain,
            format: cli
                .format
                .or(self.config.defaults.format)
                .unwrap_or(PlistFormat::Binary),
            converter,
            substitutions,
        })
    }
}
