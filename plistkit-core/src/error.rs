//! Error types for plistkit-core.
//!
//! Exit code mapping:
//! - 1: runtime errors (I/O, encoding, internal)
//! - 2: input errors (malformed plist, unresolved token, invalid rule or argument)
//! - 3: external tool failures

use camino::Utf8PathBuf;
use plistkit_plist::PlistError;
use plistkit_types::{RuleError, SubstitutionError};
use thiserror::Error;

/// An external tool could not be run or did not do its job.
#[derive(Debug, Error)]
pub enum ToolInvocationError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} exited with status {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} exited successfully but did not produce {output}")]
    MissingOutput {
        program: String,
        output: Utf8PathBuf,
    },
}

/// Top-level error for pipelines and rule execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Plist(#[from] PlistError),

    #[error(transparent)]
    Tool(#[from] ToolInvocationError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),

    /// One or more sources of a fan-out rule failed.
    #[error("rule '{rule}': {failed} of {total} sources failed")]
    BatchFailed { rule: String, failed: u64, total: u64 },

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Returns the recommended process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Plist(e) if e.is_input_error() => 2,
            PipelineError::Plist(_) => 1,
            PipelineError::Rule(_) | PipelineError::Substitution(_) => 2,
            PipelineError::Tool(_) | PipelineError::BatchFailed { .. } => 3,
            PipelineError::Internal(_) => 1,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
