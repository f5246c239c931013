//! Interface Builder compilation (`.xib` / `.storyboard`).
//!
//! One rule covers many sources. Its args are a template where
//! [`SOURCE_PLACEHOLDER`] and [`OUTPUT_PLACEHOLDER`] are expanded per source,
//! so every source gets its own tool invocation. A failing source is
//! recorded and the remaining sources still run.

use crate::digest::output_sha256;
use crate::invocation::{Invocation, run_tool};
use crate::ports::ToolRunner;
use crate::settings::Toolchain;
use crate::staging::StagedOutput;
use camino::{Utf8Path, Utf8PathBuf};
use plistkit_types::report::{BatchReport, InvocationStatus, SourceResult};
use plistkit_types::{BuildRule, RuleError, RuleKind};
use tracing::{info, warn};

pub const SOURCE_PLACEHOLDER: &str = "{{source}}";
pub const OUTPUT_PLACEHOLDER: &str = "{{output}}";

/// What to compile and where.
#[derive(Debug, Clone)]
pub struct IbCompileRequest {
    pub sources: Vec<Utf8PathBuf>,
    pub output_dir: Utf8PathBuf,
    /// `nib` or `storyboardc`; a leading `.` is ignored.
    pub output_extension: String,
    /// Passed through to the compiler ahead of `--input`/`--output`.
    pub extra_flags: Vec<String>,
}

impl IbCompileRequest {
    /// `<output_dir>/<source stem>.<output_extension>` for every source.
    pub fn output_paths(&self) -> Result<Vec<Utf8PathBuf>, RuleError> {
        self.sources
            .iter()
            .map(|s| derive_output_path(s, &self.output_dir, &self.output_extension))
            .collect()
    }
}

pub fn derive_output_path(
    source: &Utf8Path,
    output_dir: &Utf8Path,
    extension: &str,
) -> Result<Utf8PathBuf, RuleError> {
    let stem = source
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RuleError::NoFileName {
            path: source.to_path_buf(),
        })?;
    let extension = extension.trim_start_matches('.');
    Ok(output_dir.join(format!("{stem}.{extension}")))
}

/// Args template shared by every source of the rule.
pub fn args_template(toolchain: &Toolchain, extra_flags: &[String]) -> Vec<String> {
    let mut args = toolchain.developer_dir_args();
    args.extend(extra_flags.iter().cloned());
    args.extend([
        "--input".to_string(),
        SOURCE_PLACEHOLDER.to_string(),
        "--output".to_string(),
        OUTPUT_PLACEHOLDER.to_string(),
    ]);
    args
}

fn expand(template: &[String], source: &Utf8Path, output: &Utf8Path) -> Vec<String> {
    template
        .iter()
        .map(|a| {
            a.replace(SOURCE_PLACEHOLDER, source.as_str())
                .replace(OUTPUT_PLACEHOLDER, output.as_str())
        })
        .collect()
}

/// Declare a fan-out compile rule.
pub fn compile_ib_rule(
    name: impl Into<String>,
    toolchain: &Toolchain,
    request: &IbCompileRequest,
) -> Result<BuildRule, RuleError> {
    let outputs = request.output_paths()?;
    BuildRule::builder(name, RuleKind::CompileIb)
        .program(toolchain.ib_compiler.clone())
        .sources(request.sources.iter().cloned())
        .outputs(outputs)
        .args(args_template(toolchain, &request.extra_flags))
        .build()
}

/// Run one invocation per (source, output) pair.
pub fn compile_pairs(
    runner: &dyn ToolRunner,
    program: &str,
    rule_name: &str,
    pairs: &[(Utf8PathBuf, Utf8PathBuf)],
    template: &[String],
) -> BatchReport {
    let mut report = BatchReport::new(rule_name);

    for (source, output) in pairs {
        let result = match compile_one(runner, program, template, source, output) {
            Ok(sha) => SourceResult {
                source: source.clone(),
                output: output.clone(),
                status: InvocationStatus::Succeeded,
                message: None,
                output_sha256: sha,
            },
            Err(e) => {
                let message = format!("{e:#}");
                warn!(rule = %rule_name, source = %source, error = %message, "ib compile failed");
                SourceResult {
                    source: source.clone(),
                    output: output.clone(),
                    status: InvocationStatus::Failed,
                    message: Some(message),
                    output_sha256: None,
                }
            }
        };
        report.record(result);
    }

    report.finish();
    info!(
        rule = %rule_name,
        succeeded = report.summary.succeeded,
        failed = report.summary.failed,
        "ib compile finished"
    );
    report
}

fn compile_one(
    runner: &dyn ToolRunner,
    program: &str,
    template: &[String],
    source: &Utf8Path,
    output: &Utf8Path,
) -> anyhow::Result<Option<String>> {
    let staged = StagedOutput::new(output)?;
    let args = expand(template, source, staged.path());
    let invocation = Invocation::from_command_line(program, &args);
    run_tool(runner, &invocation, staged.path())?;
    let committed = staged.commit()?;
    output_sha256(&committed)
}

/// Compile every source of `request`, one invocation per source.
pub fn compile_each(
    runner: &dyn ToolRunner,
    toolchain: &Toolchain,
    rule_name: &str,
    request: &IbCompileRequest,
) -> Result<BatchReport, RuleError> {
    let rule = compile_ib_rule(rule_name, toolchain, request)?;
    Ok(run_compile_rule(runner, &rule))
}

/// Execute a rule declared by [`compile_ib_rule`].
pub fn run_compile_rule(runner: &dyn ToolRunner, rule: &BuildRule) -> BatchReport {
    let pairs: Vec<_> = rule
        .sources
        .iter()
        .cloned()
        .zip(rule.outputs.iter().cloned())
        .collect();
    compile_pairs(runner, &rule.program, &rule.name, &pairs, &rule.args)
}
