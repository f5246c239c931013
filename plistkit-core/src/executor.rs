//! Runs declared rules in this process, dispatching on [`RuleKind`].

use crate::convert::run_convert_rule;
use crate::error::PipelineResult;
use crate::graph::RuleExecutor;
use crate::ib::run_compile_rule;
use crate::pipeline::{run_merge, run_substitute};
use crate::ports::{ToolRunner, WritePort};
use crate::rules::HelperArgs;
use anyhow::{Context, anyhow};
use plistkit_types::report::BatchReport;
use plistkit_types::{BuildRule, RuleKind};
use tracing::debug;

/// Merge and substitute rules run through the in-process pipeline instead
/// of spawning the helper binary. Convert and compile rules use the runner.
pub struct LocalExecutor<'a> {
    runner: &'a dyn ToolRunner,
    writer: &'a dyn WritePort,
}

impl<'a> LocalExecutor<'a> {
    pub fn new(runner: &'a dyn ToolRunner, writer: &'a dyn WritePort) -> Self {
        Self { runner, writer }
    }
}

impl RuleExecutor for LocalExecutor<'_> {
    fn execute(&self, rule: &BuildRule) -> PipelineResult<Option<BatchReport>> {
        debug!(rule = %rule.name, kind = rule.kind.as_str(), "executing rule");
        match rule.kind {
            RuleKind::MergePlist => {
                let args = HelperArgs::parse(&rule.args)
                    .with_context(|| format!("rule '{}'", rule.name))?;
                run_merge(&args.inputs, args.format, &args.output, self.writer)?;
                Ok(None)
            }
            RuleKind::SubstitutePlist => {
                let args = HelperArgs::parse(&rule.args)
                    .with_context(|| format!("rule '{}'", rule.name))?;
                let template = args
                    .template
                    .as_deref()
                    .ok_or_else(|| anyhow!("rule '{}' has no template", rule.name))?;
                run_substitute(
                    template,
                    args.format,
                    &args.substitutions,
                    &args.output,
                    self.writer,
                )?;
                Ok(None)
            }
            RuleKind::ConvertPlist => {
                run_convert_rule(self.runner, rule)?;
                Ok(None)
            }
            RuleKind::CompileIb => Ok(Some(run_compile_rule(self.runner, rule))),
        }
    }
}
