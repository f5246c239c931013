//! In-process build graph.
//!
//! Rules are connected only through paths: when a rule's source is another
//! rule's output, the producer runs first. Every output path has exactly one
//! producing rule. Paths are compared after lexical normalization, so
//! `gen/./a.plist` and `gen/a.plist` are the same output.

use crate::error::{PipelineError, PipelineResult};
use crate::paths::normalize;
use camino::{Utf8Path, Utf8PathBuf};
use plistkit_types::report::{BatchReport, GraphReport, InvocationStatus, RuleResult};
use plistkit_types::{BuildRule, RuleError};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info};

/// Runs a single rule.
pub trait RuleExecutor {
    /// Fan-out rules return their batch report even when some sources
    /// failed; the graph turns a failed batch into a rule failure.
    fn execute(&self, rule: &BuildRule) -> PipelineResult<Option<BatchReport>>;
}

#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    rules: Vec<BuildRule>,
    owners: BTreeMap<Utf8PathBuf, usize>,
}

/// Report of [`BuildGraph::execute`], plus the error that stopped it.
#[derive(Debug)]
pub struct GraphRun {
    pub report: GraphReport,
    pub error: Option<PipelineError>,
}

impl GraphRun {
    pub fn into_result(self) -> PipelineResult<GraphReport> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.report),
        }
    }
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, rejecting an output another rule already produces.
    pub fn add(&mut self, rule: BuildRule) -> Result<(), RuleError> {
        for out in &rule.outputs {
            if let Some(&owner) = self.owners.get(&normalize(out)) {
                return Err(RuleError::OutputOwned {
                    rule: rule.name.clone(),
                    owner: self.rules[owner].name.clone(),
                    path: out.clone(),
                });
            }
        }

        let idx = self.rules.len();
        for out in &rule.outputs {
            self.owners.insert(normalize(out), idx);
        }
        debug!(rule = %rule.name, kind = rule.kind.as_str(), "rule added");
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[BuildRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule producing `path`, if any.
    pub fn producer(&self, path: &Utf8Path) -> Option<&BuildRule> {
        self.owners.get(&normalize(path)).map(|&i| &self.rules[i])
    }

    /// Rules in dependency order; ties keep insertion order.
    pub fn ordered(&self) -> Result<Vec<&BuildRule>, RuleError> {
        let n = self.rules.len();
        let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        let mut indegree = vec![0usize; n];

        for (consumer, rule) in self.rules.iter().enumerate() {
            let producers: BTreeSet<usize> = rule
                .sources
                .iter()
                .filter_map(|s| self.owners.get(&normalize(s)).copied())
                .filter(|&p| p != consumer)
                .collect();
            indegree[consumer] = producers.len();
            for p in producers {
                dependents[p].insert(consumer);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &d in &dependents[next] {
                indegree[d] -= 1;
                if indegree[d] == 0 {
                    ready.insert(d);
                }
            }
        }

        if order.len() < n {
            let stuck = (0..n)
                .find(|i| indegree[*i] > 0)
                .map(|i| self.rules[i].name.clone())
                .unwrap_or_default();
            return Err(RuleError::Cycle { rule: stuck });
        }
        Ok(order.into_iter().map(|i| &self.rules[i]).collect())
    }

    /// Run every rule in order. After the first failure the remaining
    /// rules are recorded as skipped.
    pub fn execute(&self, executor: &dyn RuleExecutor) -> GraphRun {
        let mut report = GraphReport::new();
        let ordered = match self.ordered() {
            Ok(o) => o,
            Err(e) => {
                report.finish();
                return GraphRun {
                    report,
                    error: Some(e.into()),
                };
            }
        };

        let mut failure: Option<PipelineError> = None;
        for rule in ordered {
            let mut result = RuleResult {
                rule: rule.name.clone(),
                kind: rule.kind,
                status: InvocationStatus::Skipped,
                outputs: rule.outputs.clone(),
                message: None,
                batch: None,
            };

            if failure.is_some() {
                report.record(result);
                continue;
            }

            let outcome = executor.execute(rule).and_then(|batch| match batch {
                Some(b) if !b.is_success() => {
                    let err = PipelineError::BatchFailed {
                        rule: rule.name.clone(),
                        failed: b.summary.failed,
                        total: b.summary.total,
                    };
                    result.batch = Some(b);
                    Err(err)
                }
                other => {
                    result.batch = other;
                    Ok(())
                }
            });

            match outcome {
                Ok(()) => {
                    result.status = InvocationStatus::Succeeded;
                    info!(rule = %rule.name, "rule succeeded");
                }
                Err(e) => {
                    error!(rule = %rule.name, error = %e, "rule failed");
                    result.status = InvocationStatus::Failed;
                    result.message = Some(e.to_string());
                    failure = Some(e);
                }
            }
            report.record(result);
        }

        report.finish();
        GraphRun {
            report,
            error: failure,
        }
    }
}
