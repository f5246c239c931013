//! Serializable outcome of running one or more rules.

use crate::rule::RuleKind;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Succeeded,
    Failed,
    /// Not attempted because an upstream rule failed.
    Skipped,
}

/// Result for one source of a fan-out rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResult {
    pub source: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub status: InvocationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Digest of the written output; absent for directory outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_sha256: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub schema: String,
    pub rule: String,
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub results: Vec<SourceResult>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::PLISTKIT_BATCH_V1.to_string(),
            rule: rule.into(),
            started_at: Utc::now(),
            ended_at: None,
            results: vec![],
            summary: BatchSummary::default(),
        }
    }

    pub fn record(&mut self, result: SourceResult) {
        self.summary.total += 1;
        match result.status {
            InvocationStatus::Succeeded => self.summary.succeeded += 1,
            InvocationStatus::Failed => self.summary.failed += 1,
            InvocationStatus::Skipped => self.summary.skipped += 1,
        }
        self.results.push(result);
    }

    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    /// A batch succeeds only when every source succeeded.
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0 && self.summary.skipped == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceResult> {
        self.results
            .iter()
            .filter(|r| r.status == InvocationStatus::Failed)
    }
}

/// Result for one rule of a graph run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: String,
    pub kind: RuleKind,
    pub status: InvocationStatus,
    pub outputs: Vec<Utf8PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Per-source detail for fan-out rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphReport {
    pub schema: String,
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub rules: Vec<RuleResult>,
    pub summary: BatchSummary,
}

impl GraphReport {
    pub fn new() -> Self {
        Self {
            schema: crate::schema::PLISTKIT_RUN_V1.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            rules: vec![],
            summary: BatchSummary::default(),
        }
    }

    pub fn record(&mut self, result: RuleResult) {
        self.summary.total += 1;
        match result.status {
            InvocationStatus::Succeeded => self.summary.succeeded += 1,
            InvocationStatus::Failed => self.summary.failed += 1,
            InvocationStatus::Skipped => self.summary.skipped += 1,
        }
        self.rules.push(result);
    }

    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.summary.failed == 0 && self.summary.skipped == 0
    }
}

impl Default for GraphReport {
    fn default() -> Self {
        Self::new()
    }
}
