//! Merge and substitute pipelines.
//!
//! These entry points are I/O-agnostic on the write side: every output goes
//! through a [`WritePort`]. Templates are read directly from disk.

use crate::digest::sha256_hex;
use crate::error::PipelineResult;
use crate::ports::WritePort;
use camino::{Utf8Path, Utf8PathBuf};
use plistkit_plist::{encode, load, merge_files, substitute};
use plistkit_types::{PlistFormat, SubstitutionSet};
use tracing::{debug, info};

/// Outcome of [`run_merge_substitute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSubstituteOutcome {
    pub merged: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub merged_sha256: String,
    pub output_sha256: String,
}

/// Merge `templates` in order and write the result to `output`.
///
/// Returns the sha256 of the written bytes.
pub fn run_merge<P: AsRef<Utf8Path>>(
    templates: &[P],
    format: PlistFormat,
    output: &Utf8Path,
    writer: &dyn WritePort,
) -> PipelineResult<String> {
    let merged = merge_files(templates)?;
    let bytes = encode(&merged, format)?;
    writer.write_file(output, &bytes)?;
    info!(
        templates = templates.len(),
        output = %output,
        format = %format,
        "merged plist"
    );
    Ok(sha256_hex(&bytes))
}

/// Replace `${KEY}` tokens in `template` and write the result to `output`.
///
/// An unresolved token fails before anything is written.
pub fn run_substitute(
    template: &Utf8Path,
    format: PlistFormat,
    substitutions: &SubstitutionSet,
    output: &Utf8Path,
    writer: &dyn WritePort,
) -> PipelineResult<String> {
    let document = load(template)?;
    let document = substitute(document, substitutions)?;
    let bytes = encode(&document, format)?;
    writer.write_file(output, &bytes)?;
    info!(
        template = %template,
        substitutions = substitutions.len(),
        output = %output,
        format = %format,
        "substituted plist"
    );
    Ok(sha256_hex(&bytes))
}

/// Merge, then substitute. The intermediate file is always `xml1`.
pub fn run_merge_substitute<P: AsRef<Utf8Path>>(
    templates: &[P],
    merged: &Utf8Path,
    format: PlistFormat,
    substitutions: &SubstitutionSet,
    output: &Utf8Path,
    writer: &dyn WritePort,
) -> PipelineResult<MergeSubstituteOutcome> {
    let merged_sha256 = run_merge(templates, PlistFormat::Xml, merged, writer)?;
    debug!(merged = %merged, "intermediate plist written");
    let output_sha256 = run_substitute(merged, format, substitutions, output, writer)?;

    Ok(MergeSubstituteOutcome {
        merged: merged.to_path_buf(),
        output: output.to_path_buf(),
        merged_sha256,
        output_sha256,
    })
}
