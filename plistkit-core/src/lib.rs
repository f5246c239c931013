//! Embeddable core library for plistkit.
//!
//! Declares build rules for plist merge/substitute, plist conversion and
//! Interface Builder compilation, and runs them. Nothing here parses command
//! lines, so the crate can be linked into any build driver.
//!
//! # Port traits
//!
//! Side effects go through the traits in [`ports`]:
//! - [`ToolRunner`](ports::ToolRunner) runs external tools (`plutil`, `ibtool`)
//! - [`WritePort`](ports::WritePort) writes output files atomically
//!
//! The [`adapters`] module provides the process- and filesystem-backed
//! implementations.
//!
//! # Entry points
//!
//! - [`run_merge_substitute`](pipeline::run_merge_substitute) merges templates and substitutes tokens
//! - [`Converter`](convert::Converter) converts between plist encodings
//! - [`compile_each`](ib::compile_each) compiles IB sources one invocation per source
//! - [`InfoPlistSpec`](info_plist::InfoPlistSpec) declares the Info.plist rule chain
//! - [`BuildGraph`](graph::BuildGraph) orders and executes declared rules

pub mod adapters;
pub mod convert;
pub mod digest;
pub mod error;
pub mod executor;
pub mod graph;
pub mod ib;
pub mod info_plist;
pub mod invocation;
pub mod paths;
pub mod pipeline;
pub mod ports;
pub mod rules;
pub mod settings;
pub mod staging;

pub use error::{PipelineError, PipelineResult, ToolInvocationError};

// Re-export shared types so embedders don't need plistkit-types directly.
pub use plistkit_types::{
    BuildRule, PlistFormat, RuleError, RuleKind, Substitution, SubstitutionSet,
};
