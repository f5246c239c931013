//! `${KEY}` placeholder substitution.
//!
//! Tokens look like `${NAME}` or `${NAME:modifier}`. Every string value and
//! every dictionary key is scanned. Replacement is single pass: text that a
//! substitution inserts is never scanned again. A token without a matching
//! substitution is an error, and so is a substituted key that collides with
//! another key of the same dictionary.

use crate::error::{PlistError, PlistResult};
use plist::{Dictionary, Value};
use plistkit_types::SubstitutionSet;
use std::collections::{BTreeSet, HashMap};

/// Transformations applied to a substituted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Characters outside `[A-Za-z0-9.-]` become `-`.
    Rfc1034Identifier,
    /// Characters outside `[A-Za-z0-9_]` become `_`; a leading digit gets a `_` prefix.
    C99ExtIdentifier,
}

impl Modifier {
    pub fn parse(key: &str, name: &str) -> PlistResult<Self> {
        match name {
            "rfc1034identifier" => Ok(Modifier::Rfc1034Identifier),
            "c99extidentifier" => Ok(Modifier::C99ExtIdentifier),
            _ => Err(PlistError::UnknownModifier {
                key: key.to_string(),
                modifier: name.to_string(),
            }),
        }
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            Modifier::Rfc1034Identifier => value
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                        c
                    } else {
                        '-'
                    }
                })
                .collect(),
            Modifier::C99ExtIdentifier => {
                let mut out: String = value
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
                    .collect();
                if out.starts_with(|c: char| c.is_ascii_digit()) {
                    out.insert(0, '_');
                }
                out
            }
        }
    }
}

/// One `${...}` occurrence inside a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub key: &'a str,
    pub modifier: Option<&'a str>,
    /// Byte range of the whole token, braces included.
    pub span: std::ops::Range<usize>,
}

/// Scan `text` for complete tokens. An unterminated `${` ends the scan.
pub fn tokens(text: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut offset = 0;
    while let Some(found) = text[offset..].find("${") {
        let start = offset + found;
        let body_start = start + 2;
        let Some(len) = text[body_start..].find('}') else {
            break;
        };
        let body = &text[body_start..body_start + len];
        let (key, modifier) = match body.split_once(':') {
            Some((k, m)) => (k, Some(m)),
            None => (body, None),
        };
        let end = body_start + len + 1;
        out.push(Token {
            key,
            modifier,
            span: start..end,
        });
        offset = end;
    }
    out
}

/// Replace every token in `text`.
pub fn interpolate(text: &str, table: &HashMap<&str, &str>) -> PlistResult<String> {
    let found = tokens(text);
    if found.is_empty() {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for token in found {
        out.push_str(&text[cursor..token.span.start]);
        let value = table
            .get(token.key)
            .ok_or_else(|| PlistError::UnresolvedToken {
                key: token.key.to_string(),
            })?;
        match token.modifier {
            Some(name) => out.push_str(&Modifier::parse(token.key, name)?.apply(value)),
            None => out.push_str(value),
        }
        cursor = token.span.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Apply `substitutions` to every string value and dictionary key of `value`.
pub fn substitute(value: Value, substitutions: &SubstitutionSet) -> PlistResult<Value> {
    let table = substitutions.resolved();
    substitute_with(value, &table)
}

fn substitute_with(value: Value, table: &HashMap<&str, &str>) -> PlistResult<Value> {
    Ok(match value {
        Value::String(s) => Value::String(interpolate(&s, table)?),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| substitute_with(item, table))
                .collect::<PlistResult<_>>()?,
        ),
        Value::Dictionary(dict) => {
            let mut out = Dictionary::new();
            for (key, item) in dict {
                let key = interpolate(&key, table)?;
                if out.contains_key(&key) {
                    return Err(PlistError::DuplicateKey { key });
                }
                out.insert(key, substitute_with(item, table)?);
            }
            Value::Dictionary(out)
        }
        other => other,
    })
}

/// Every token key still present in `value` (keys and string values).
pub fn remaining_tokens(value: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_tokens(value, &mut out);
    out
}

fn collect_tokens(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => out.extend(tokens(s).into_iter().map(|t| t.key.to_string())),
        Value::Array(items) => items.iter().for_each(|i| collect_tokens(i, out)),
        Value::Dictionary(dict) => {
            for (key, item) in dict {
                out.extend(tokens(key).into_iter().map(|t| t.key.to_string()));
                collect_tokens(item, out);
            }
        }
        _ => {}
    }
}
