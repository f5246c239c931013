//! Shared types for the plistkit workspace.
//!
//! # Design constraints
//! - Rules and reports are serialized to disk, so keep field names stable.
//! - Prefer adding optional fields over changing semantics.

pub mod format;
pub mod path;
pub mod report;
pub mod rule;
pub mod subst;

pub use format::{ParseFormatError, PlistFormat};
pub use rule::{BuildRule, RuleBuilder, RuleError, RuleKind};
pub use subst::{Substitution, SubstitutionError, SubstitutionSet};

/// Schema identifiers.
pub mod schema {
    pub const PLISTKIT_BATCH_V1: &str = "plistkit.batch.v1";
    pub const PLISTKIT_RULES_V1: &str = "plistkit.rules.v1";
    pub const PLISTKIT_RUN_V1: &str = "plistkit.run.v1";
}
