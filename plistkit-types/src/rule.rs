//! Declared units of work for a build graph.
//!
//! A [`BuildRule`] is validated once by [`RuleBuilder::build`] and never
//! mutated afterwards. Rules only know about each other through file paths:
//! a producer's output path equal to a consumer's source path is an edge.
//! Paths are compared after lexical normalization.

use crate::path::normalize;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    MergePlist,
    SubstitutePlist,
    ConvertPlist,
    CompileIb,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::MergePlist => "merge_plist",
            RuleKind::SubstitutePlist => "substitute_plist",
            RuleKind::ConvertPlist => "convert_plist",
            RuleKind::CompileIb => "compile_ib",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRule {
    pub name: String,
    pub kind: RuleKind,
    /// Program invoked by the executor.
    pub program: String,
    pub sources: Vec<Utf8PathBuf>,
    pub outputs: Vec<Utf8PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl BuildRule {
    pub fn builder(name: impl Into<String>, kind: RuleKind) -> RuleBuilder {
        RuleBuilder::new(name, kind)
    }

    /// Full command line: program followed by args.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule name must not be empty")]
    MissingName,

    #[error("rule '{rule}': no program to invoke")]
    MissingProgram { rule: String },

    #[error("rule '{rule}': at least one source is required")]
    MissingSources { rule: String },

    #[error("rule '{rule}': at least one output is required")]
    MissingOutputs { rule: String },

    #[error("rule '{rule}': '{path}' is declared as both source and output")]
    OutputIsSource { rule: String, path: Utf8PathBuf },

    #[error("'{path}' has no file name")]
    NoFileName { path: Utf8PathBuf },

    #[error("rule '{rule}': output '{path}' is declared twice")]
    DuplicateOutput { rule: String, path: Utf8PathBuf },

    #[error("output '{path}' of rule '{rule}' is already produced by rule '{owner}'")]
    OutputOwned {
        rule: String,
        owner: String,
        path: Utf8PathBuf,
    },

    #[error("rule '{rule}' is part of a dependency cycle")]
    Cycle { rule: String },
}

#[derive(Debug, Clone)]
pub struct RuleBuilder {
    name: String,
    kind: RuleKind,
    program: Option<String>,
    sources: Vec<Utf8PathBuf>,
    outputs: Vec<Utf8PathBuf>,
    args: Vec<String>,
}

impl RuleBuilder {
    pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            program: None,
            sources: Vec::new(),
            outputs: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn source(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    pub fn sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.sources.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn output(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn outputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.outputs.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Validate required fields and freeze the rule.
    pub fn build(self) -> Result<BuildRule, RuleError> {
        if self.name.trim().is_empty() {
            return Err(RuleError::MissingName);
        }
        let program = match self.program {
            Some(p) if !p.trim().is_empty() => p,
            _ => return Err(RuleError::MissingProgram { rule: self.name }),
        };
        if self.sources.is_empty() {
            return Err(RuleError::MissingSources { rule: self.name });
        }
        if self.outputs.is_empty() {
            return Err(RuleError::MissingOutputs { rule: self.name });
        }

        let sources: BTreeSet<_> = self.sources.iter().map(|s| normalize(s)).collect();
        let mut seen = BTreeSet::new();
        for out in &self.outputs {
            let key = normalize(out);
            if sources.contains(&key) {
                return Err(RuleError::OutputIsSource {
                    rule: self.name,
                    path: out.clone(),
                });
            }
            if !seen.insert(key) {
                return Err(RuleError::DuplicateOutput {
                    rule: self.name,
                    path: out.clone(),
                });
            }
        }

        Ok(BuildRule {
            name: self.name,
            kind: self.kind,
            program,
            sources: self.sources,
            outputs: self.outputs,
            args: self.args,
        })
    }
}
