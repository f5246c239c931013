//! Error types for plistkit-plist.

use camino::Utf8PathBuf;
use plistkit_types::PlistFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlistError {
    /// Input bytes are not a valid property list in any supported encoding.
    #[error("malformed plist {path}: {reason}")]
    MalformedInput { path: Utf8PathBuf, reason: String },

    /// A `${KEY}` token has no matching substitution.
    #[error("unresolved substitution ${{{key}}}")]
    UnresolvedToken { key: String },

    /// A substituted dictionary key collides with another key of the same dictionary.
    #[error("substituted key '{key}' is already present in its dictionary")]
    DuplicateKey { key: String },

    #[error("unknown modifier '{modifier}' in ${{{key}:{modifier}}}")]
    UnknownModifier { key: String, modifier: String },

    /// JSON cannot carry dates, data, UIDs or non-finite reals.
    #[error("{kind} value at {at} cannot be written as json")]
    UnsupportedJsonValue { kind: &'static str, at: String },

    #[error("at least one template is required")]
    EmptyInput,

    #[error("failed to encode {format}: {reason}")]
    Encode { format: PlistFormat, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlistError {
    /// True for errors caused by the documents or substitutions themselves,
    /// as opposed to I/O trouble.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, PlistError::Io(_) | PlistError::Encode { .. })
    }
}

pub type PlistResult<T> = Result<T, PlistError>;
