use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// On-disk encoding of a property list.
///
/// Canonical names follow `plutil -convert`: `xml1`, `binary1`, `json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlistFormat {
    #[serde(rename = "xml1", alias = "xml")]
    Xml,
    #[serde(rename = "binary1", alias = "binary")]
    Binary,
    #[serde(rename = "json")]
    Json,
}

impl PlistFormat {
    pub const ALL: [PlistFormat; 3] = [PlistFormat::Xml, PlistFormat::Binary, PlistFormat::Json];

    /// Name accepted by `plutil -convert`.
    pub fn plutil_name(self) -> &'static str {
        match self {
            PlistFormat::Xml => "xml1",
            PlistFormat::Binary => "binary1",
            PlistFormat::Json => "json",
        }
    }
}

impl fmt::Display for PlistFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plutil_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown plist format '{0}' (expected xml1, binary1 or json)")]
pub struct ParseFormatError(pub String);

impl FromStr for PlistFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml1" | "xml" => Ok(PlistFormat::Xml),
            "binary1" | "binary" => Ok(PlistFormat::Binary),
            "json" => Ok(PlistFormat::Json),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}
