//! Plist format conversion.
//!
//! The external path runs `plutil -convert <format> -o <output> <source>`;
//! the native path decodes and re-encodes in-process.

use crate::error::PipelineResult;
use crate::invocation::{Invocation, run_tool};
use crate::ports::{ToolRunner, WritePort};
use crate::settings::Toolchain;
use crate::staging::StagedOutput;
use anyhow::anyhow;
use camino::Utf8Path;
use plistkit_types::{BuildRule, PlistFormat, RuleError, RuleKind};
use tracing::info;

pub trait Converter {
    fn convert(
        &self,
        source: &Utf8Path,
        output: &Utf8Path,
        format: PlistFormat,
    ) -> PipelineResult<()>;
}

/// Declare a `plutil` conversion rule.
pub fn convert_rule(
    name: impl Into<String>,
    toolchain: &Toolchain,
    source: &Utf8Path,
    output: &Utf8Path,
    format: PlistFormat,
) -> Result<BuildRule, RuleError> {
    BuildRule::builder(name, RuleKind::ConvertPlist)
        .program(toolchain.plutil.clone())
        .source(source)
        .output(output)
        .args(toolchain.developer_dir_args())
        .args(["-convert", format.plutil_name(), "-o", output.as_str(), source.as_str()])
        .build()
}

/// Execute a conversion rule with a staged output.
pub fn run_convert_rule(runner: &dyn ToolRunner, rule: &BuildRule) -> PipelineResult<()> {
    let output = match rule.outputs.as_slice() {
        [single] => single,
        _ => {
            return Err(
                anyhow!("convert rule '{}' must declare exactly one output", rule.name).into(),
            );
        }
    };

    let staged = StagedOutput::new(output)?;
    let mut invocation = Invocation::from_command_line(&rule.program, &rule.args);
    invocation.replace_arg(output.as_str(), staged.path().as_str());

    run_tool(runner, &invocation, staged.path())?;
    staged.commit()?;
    info!(rule = %rule.name, output = %output, "converted plist");
    Ok(())
}

/// Converts through the external `plutil` tool.
pub struct ExternalConverter<'a> {
    runner: &'a dyn ToolRunner,
    toolchain: &'a Toolchain,
}

impl<'a> ExternalConverter<'a> {
    pub fn new(runner: &'a dyn ToolRunner, toolchain: &'a Toolchain) -> Self {
        Self { runner, toolchain }
    }
}

impl Converter for ExternalConverter<'_> {
    fn convert(
        &self,
        source: &Utf8Path,
        output: &Utf8Path,
        format: PlistFormat,
    ) -> PipelineResult<()> {
        let rule = convert_rule("convert", self.toolchain, source, output, format)?;
        run_convert_rule(self.runner, &rule)
    }
}

/// Converts in-process with the plist codec.
pub struct NativeConverter<'a> {
    writer: &'a dyn WritePort,
}

impl<'a> NativeConverter<'a> {
    pub fn new(writer: &'a dyn WritePort) -> Self {
        Self { writer }
    }
}

impl Converter for NativeConverter<'_> {
    fn convert(
        &self,
        source: &Utf8Path,
        output: &Utf8Path,
        format: PlistFormat,
    ) -> PipelineResult<()> {
        let value = plistkit_plist::load(source)?;
        let bytes = plistkit_plist::encode(&value, format)?;
        self.writer.write_file(output, &bytes)?;
        info!(source = %source, output = %output, format = %format, "converted plist");
        Ok(())
    }
}
