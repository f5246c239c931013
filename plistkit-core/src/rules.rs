//! Merge and substitute rule declarations, and the helper argument shape
//! they share with the `plistkit` CLI:
//!
//! ```text
//! merge      -f=<format> -o=<output> <template>...
//! substitute -f=<format> -o=<output> -t=<merged> -s=<key>=<value>...
//! ```

use crate::settings::Toolchain;
use anyhow::{Context, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use plistkit_types::{BuildRule, PlistFormat, RuleError, RuleKind, SubstitutionSet};

pub const MERGE_MODE: &str = "merge";
pub const SUBSTITUTE_MODE: &str = "substitute";

/// Declare a rule merging `templates` into `output`.
pub fn merge_rule(
    name: impl Into<String>,
    toolchain: &Toolchain,
    templates: &[Utf8PathBuf],
    format: PlistFormat,
    output: &Utf8Path,
) -> Result<BuildRule, RuleError> {
    BuildRule::builder(name, RuleKind::MergePlist)
        .program(toolchain.helper.clone())
        .sources(templates.iter().cloned())
        .output(output)
        .arg(MERGE_MODE)
        .arg(format!("-f={}", format))
        .arg(format!("-o={}", output))
        .args(templates.iter().map(|t| t.to_string()))
        .build()
}

/// Declare a rule substituting `substitutions` into `merged`.
pub fn substitute_rule(
    name: impl Into<String>,
    toolchain: &Toolchain,
    merged: &Utf8Path,
    format: PlistFormat,
    substitutions: &SubstitutionSet,
    output: &Utf8Path,
) -> Result<BuildRule, RuleError> {
    BuildRule::builder(name, RuleKind::SubstitutePlist)
        .program(toolchain.helper.clone())
        .source(merged)
        .output(output)
        .arg(SUBSTITUTE_MODE)
        .arg(format!("-f={}", format))
        .arg(format!("-o={}", output))
        .arg(format!("-t={}", merged))
        .args(substitutions.to_args())
        .build()
}

/// Parsed helper arguments (either mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperArgs {
    pub mode: String,
    pub format: PlistFormat,
    pub output: Utf8PathBuf,
    pub template: Option<Utf8PathBuf>,
    pub substitutions: SubstitutionSet,
    pub inputs: Vec<Utf8PathBuf>,
}

impl HelperArgs {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let (mode, rest) = args
            .split_first()
            .ok_or_else(|| anyhow!("missing helper mode"))?;
        if mode != MERGE_MODE && mode != SUBSTITUTE_MODE {
            bail!("unknown helper mode '{}'", mode);
        }

        let mut format = None;
        let mut output = None;
        let mut template = None;
        let mut subs = Vec::new();
        let mut inputs = Vec::new();

        for arg in rest {
            if let Some(v) = arg.strip_prefix("-f=") {
                format = Some(v.parse::<PlistFormat>()?);
            } else if let Some(v) = arg.strip_prefix("-o=") {
                output = Some(Utf8PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("-t=") {
                template = Some(Utf8PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("-s=") {
                subs.push(v);
            } else if arg.starts_with('-') {
                bail!("unknown helper flag '{}'", arg);
            } else {
                inputs.push(Utf8PathBuf::from(arg));
            }
        }

        let parsed = Self {
            mode: mode.clone(),
            format: format.ok_or_else(|| anyhow!("missing -f=<format>"))?,
            output: output.ok_or_else(|| anyhow!("missing -o=<output>"))?,
            template,
            substitutions: SubstitutionSet::parse_all(subs).context("parse -s= arguments")?,
            inputs,
        };

        if parsed.mode == SUBSTITUTE_MODE && parsed.template.is_none() {
            bail!("substitute mode requires -t=<merged template>");
        }
        if parsed.mode == MERGE_MODE && parsed.inputs.is_empty() {
            bail!("merge mode requires at least one template");
        }
        Ok(parsed)
    }
}
