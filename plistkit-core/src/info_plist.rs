//! Info.plist generation: standard substitution keys plus the two-rule
//! merge/substitute chain.

use crate::error::PipelineResult;
use crate::graph::BuildGraph;
use crate::invocation::Invocation;
use crate::pipeline::{MergeSubstituteOutcome, run_merge_substitute};
use crate::ports::{ToolRunner, WritePort};
use crate::rules::{merge_rule, substitute_rule};
use crate::settings::Toolchain;
use anyhow::{Context, bail};
use crate::paths::rebase_path;
use camino::{Utf8Path, Utf8PathBuf};
use plistkit_types::{BuildRule, PlistFormat, RuleError, SubstitutionSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const GCC_VERSION: &str = "com.apple.compilers.llvm.clang.1_0";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ios,
    Macos,
}

impl Platform {
    pub fn deployment_key(self) -> &'static str {
        match self {
            Platform::Ios => "IOS_DEPLOYMENT_TARGET",
            Platform::Macos => "MACOSX_DEPLOYMENT_TARGET",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Ios => "ios",
            Platform::Macos => "macos",
        })
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "macos" | "mac" | "macosx" => Ok(Platform::Macos),
            other => Err(format!("unknown platform '{other}' (expected ios or macos)")),
        }
    }
}

/// Build machine and Xcode facts recorded in the Info.plist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainInfo {
    pub build_machine_os_build: String,
    pub xcode_build: String,
    /// Four-digit form, e.g. `0152` for Xcode 15.2.
    pub xcode_version: String,
}

impl ToolchainInfo {
    /// Ask `sw_vers` and `xcodebuild` on the build machine.
    pub fn probe(runner: &dyn ToolRunner, toolchain: &Toolchain) -> anyhow::Result<Self> {
        let sw_vers = runner
            .run(&Invocation::new("sw_vers").arg("-buildVersion"))
            .context("run sw_vers")?;
        if !sw_vers.is_success() {
            bail!("sw_vers failed: {}", sw_vers.stderr.trim());
        }

        let mut args = toolchain.developer_dir_args();
        args.push("-version".to_string());
        let xcodebuild = runner
            .run(&Invocation::from_command_line("xcodebuild", &args))
            .context("run xcodebuild")?;
        if !xcodebuild.is_success() {
            bail!("xcodebuild -version failed: {}", xcodebuild.stderr.trim());
        }

        let mut version = None;
        let mut build = None;
        for line in xcodebuild.stdout.lines() {
            if let Some(v) = line.strip_prefix("Xcode ") {
                version = Some(v.trim());
            } else if let Some(b) = line.strip_prefix("Build version ") {
                build = Some(b.trim());
            }
        }
        let (Some(version), Some(build)) = (version, build) else {
            bail!("unexpected xcodebuild -version output: {}", xcodebuild.stdout.trim());
        };

        let info = Self {
            build_machine_os_build: sw_vers.stdout.trim().to_string(),
            xcode_build: build.to_string(),
            xcode_version: format_xcode_version(version),
        };
        debug!(?info, "probed toolchain");
        Ok(info)
    }
}

/// `15.2` becomes `0152`, `9` becomes `0900`.
pub fn format_xcode_version(version: &str) -> String {
    let mut digits: String = version.chars().filter(|c| *c != '.').collect();
    while digits.len() < 3 {
        digits.push('0');
    }
    format!("{digits:0>4}")
}

#[derive(Debug, Clone)]
pub struct InfoPlistSpec {
    pub name: String,
    pub templates: Vec<Utf8PathBuf>,
    pub executable_name: String,
    pub product_name: Option<String>,
    pub platform: Platform,
    pub deployment_target: String,
    pub toolchain: ToolchainInfo,
    /// Applied after the standard keys, so they can override them.
    pub extra_substitutions: SubstitutionSet,
    pub format: PlistFormat,
    pub gen_dir: Utf8PathBuf,
}

/// The two rules declared for one Info.plist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPlistRules {
    pub merge: BuildRule,
    pub substitute: BuildRule,
}

impl InfoPlistSpec {
    pub fn substitutions(&self) -> SubstitutionSet {
        let mut subs = SubstitutionSet::new();
        subs.push("EXECUTABLE_NAME", self.executable_name.as_str());
        subs.push(
            "PRODUCT_NAME",
            self.product_name.as_deref().unwrap_or(&self.executable_name),
        );
        subs.push(
            "BUILD_MACHINE_OS_BUILD",
            self.toolchain.build_machine_os_build.as_str(),
        );
        subs.push("GCC_VERSION", GCC_VERSION);
        subs.push("XCODE_BUILD", self.toolchain.xcode_build.as_str());
        subs.push("XCODE_VERSION", self.toolchain.xcode_version.as_str());
        subs.push(self.platform.deployment_key(), self.deployment_target.as_str());
        subs.extend(&self.extra_substitutions);
        subs
    }

    pub fn merged_path(&self) -> Utf8PathBuf {
        self.gen_dir.join(format!("{}_merged.plist", self.name))
    }

    pub fn output_path(&self) -> Utf8PathBuf {
        self.gen_dir.join(format!("{}.plist", self.name))
    }

    /// Same spec with template and generated paths relative to `base`, so the
    /// declared rules can be run from that directory.
    pub fn rebased(&self, base: &Utf8Path) -> InfoPlistSpec {
        InfoPlistSpec {
            templates: self
                .templates
                .iter()
                .map(|t| rebase_path(t, base))
                .collect(),
            gen_dir: rebase_path(&self.gen_dir, base),
            ..self.clone()
        }
    }

    pub fn declare(&self, toolchain: &Toolchain) -> Result<InfoPlistRules, RuleError> {
        let merged = self.merged_path();
        let merge = merge_rule(
            format!("{}_merge", self.name),
            toolchain,
            &self.templates,
            PlistFormat::Xml,
            &merged,
        )?;
        let substitute = substitute_rule(
            format!("{}_substitute", self.name),
            toolchain,
            &merged,
            self.format,
            &self.substitutions(),
            &self.output_path(),
        )?;
        Ok(InfoPlistRules { merge, substitute })
    }

    /// Both rules, added to a fresh graph.
    pub fn into_graph(&self, toolchain: &Toolchain) -> Result<BuildGraph, RuleError> {
        let rules = self.declare(toolchain)?;
        let mut graph = BuildGraph::new();
        graph.add(rules.merge)?;
        graph.add(rules.substitute)?;
        Ok(graph)
    }

    /// Run the chain in-process.
    pub fn generate(&self, writer: &dyn WritePort) -> PipelineResult<MergeSubstituteOutcome> {
        run_merge_substitute(
            &self.templates,
            &self.merged_path(),
            self.format,
            &self.substitutions(),
            &self.output_path(),
            writer,
        )
    }
}
