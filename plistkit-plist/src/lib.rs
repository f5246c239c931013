//! Property-list engine for plistkit.
//!
//! Responsibilities:
//! - Decode XML, binary and JSON property lists (encoding sniffed from content).
//! - Merge template fragments in order (later templates win).
//! - Replace `${KEY}` tokens from an ordered substitution list.
//! - Encode the result in any supported format.
//!
//! Nothing here writes files; see `plistkit-core` for atomic output.

pub mod codec;
pub mod error;
pub mod merge;
pub mod substitute;

pub use codec::{decode, detect_format, encode, load};
pub use error::{PlistError, PlistResult};
pub use merge::{merge_documents, merge_files, merge_values};
pub use substitute::{Modifier, remaining_tokens, substitute};

pub use plist::{Dictionary, Value};
