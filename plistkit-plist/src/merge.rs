//! Template merging.
//!
//! Templates fold left to right and later templates win. Two dictionaries
//! merge key by key, recursively. Two arrays concatenate with the earlier
//! items first. Any other collision takes the later value. Keys keep the
//! position of their first appearance.

use crate::codec;
use crate::error::{PlistError, PlistResult};
use camino::Utf8Path;
use plist::Value;
use tracing::debug;

/// Merge `overlay` on top of `base`.
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Dictionary(mut base), Value::Dictionary(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => {
                        let previous = std::mem::replace(slot, Value::Boolean(false));
                        *slot = merge_values(previous, value);
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Dictionary(base)
        }
        (Value::Array(mut base), Value::Array(overlay)) => {
            base.extend(overlay);
            Value::Array(base)
        }
        (_, overlay) => overlay,
    }
}

/// Merge already-decoded documents in order.
pub fn merge_documents<I>(documents: I) -> PlistResult<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut iter = documents.into_iter();
    let first = iter.next().ok_or(PlistError::EmptyInput)?;
    Ok(iter.fold(first, merge_values))
}

/// Load every template from disk and merge them in order.
pub fn merge_files<P>(templates: &[P]) -> PlistResult<Value>
where
    P: AsRef<Utf8Path>,
{
    if templates.is_empty() {
        return Err(PlistError::EmptyInput);
    }
    let mut documents = Vec::with_capacity(templates.len());
    for path in templates {
        documents.push(codec::load(path.as_ref())?);
    }
    debug!(templates = templates.len(), "merging plist templates");
    merge_documents(documents)
}
