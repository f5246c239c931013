//! Reading and writing property lists in XML, binary and JSON encodings.
//!
//! Input encoding is sniffed from content, never from the file extension:
//! `bplist` magic means binary, a leading `{` or `[` means JSON, anything
//! else is handed to the XML parser.

use crate::error::{PlistError, PlistResult};
use camino::Utf8Path;
use fs_err as fs;
use plist::{Dictionary, Value};
use plistkit_types::PlistFormat;
use std::io::Cursor;
use tracing::debug;

const BINARY_MAGIC: &[u8] = b"bplist";

/// Sniff the encoding of `bytes`.
pub fn detect_format(bytes: &[u8]) -> PlistFormat {
    if bytes.starts_with(BINARY_MAGIC) {
        return PlistFormat::Binary;
    }
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => PlistFormat::Json,
        _ => PlistFormat::Xml,
    }
}

/// Decode a document. `origin` is only used for error messages.
pub fn decode(bytes: &[u8], origin: &Utf8Path) -> PlistResult<Value> {
    let malformed = |reason: String| PlistError::MalformedInput {
        path: origin.to_path_buf(),
        reason,
    };

    match detect_format(bytes) {
        PlistFormat::Binary => {
            Value::from_reader(Cursor::new(bytes)).map_err(|e| malformed(e.to_string()))
        }
        PlistFormat::Xml => {
            Value::from_reader_xml(Cursor::new(bytes)).map_err(|e| malformed(e.to_string()))
        }
        PlistFormat::Json => {
            let json: serde_json::Value =
                serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
            from_json(json, "$").map_err(malformed)
        }
    }
}

/// Read and decode a document from disk.
pub fn load(path: &Utf8Path) -> PlistResult<Value> {
    let bytes = fs::read(path)?;
    debug!(path = %path, format = %detect_format(&bytes), "loading plist");
    decode(&bytes, path)
}

/// Encode a document in `format`. XML and JSON output end with a newline.
pub fn encode(value: &Value, format: PlistFormat) -> PlistResult<Vec<u8>> {
    let encode_err = |e: plist::Error| PlistError::Encode {
        format,
        reason: e.to_string(),
    };

    let mut buf = Vec::new();
    match format {
        PlistFormat::Xml => {
            value.to_writer_xml(&mut buf).map_err(encode_err)?;
            if !buf.ends_with(b"\n") {
                buf.push(b'\n');
            }
        }
        PlistFormat::Binary => {
            value.to_writer_binary(&mut buf).map_err(encode_err)?;
        }
        PlistFormat::Json => {
            let json = to_json(value, "$")?;
            buf = serde_json::to_vec_pretty(&json).map_err(|e| PlistError::Encode {
                format,
                reason: e.to_string(),
            })?;
            buf.push(b'\n');
        }
    }
    Ok(buf)
}

fn from_json(json: serde_json::Value, at: &str) -> Result<Value, String> {
    Ok(match json {
        serde_json::Value::Null => return Err(format!("null is not a plist value (at {at})")),
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Integer(u.into())
            } else {
                Value::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| from_json(item, &format!("{at}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(map) => {
            let mut dict = Dictionary::new();
            for (key, item) in map {
                let child = from_json(item, &format!("{at}.{key}"))?;
                dict.insert(key, child);
            }
            Value::Dictionary(dict)
        }
    })
}

fn to_json(value: &Value, at: &str) -> PlistResult<serde_json::Value> {
    let unsupported = |kind: &'static str| PlistError::UnsupportedJsonValue {
        kind,
        at: at.to_string(),
    };

    Ok(match value {
        Value::Dictionary(dict) => {
            let mut map = serde_json::Map::with_capacity(dict.len());
            for (key, item) in dict {
                map.insert(key.clone(), to_json(item, &format!("{at}.{key}"))?);
            }
            serde_json::Value::Object(map)
        }
        Value::Array(items) => serde_json::Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_json(item, &format!("{at}[{i}]")))
                .collect::<PlistResult<_>>()?,
        ),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => match (i.as_signed(), i.as_unsigned()) {
            (Some(s), _) => serde_json::Value::from(s),
            (None, Some(u)) => serde_json::Value::from(u),
            (None, None) => return Err(unsupported("integer")),
        },
        Value::Real(r) => serde_json::Number::from_f64(*r)
            .map(serde_json::Value::Number)
            .ok_or_else(|| unsupported("non-finite real"))?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(_) => return Err(unsupported("date")),
        Value::Data(_) => return Err(unsupported("data")),
        Value::Uid(_) => return Err(unsupported("uid")),
        _ => return Err(unsupported("unknown")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut dict = Dictionary::new();
        dict.insert("CFBundleName".to_string(), Value::from("Demo"));
        dict.insert("Count".to_string(), Value::Integer(3.into()));
        dict.insert("Enabled".to_string(), Value::Boolean(true));
        dict.insert(
            "Items".to_string(),
            Value::Array(vec![Value::from("a"), Value::Real(1.5)]),
        );
        Value::Dictionary(dict)
    }

    #[test]
    fn detect_format_sniffs_content() {
        assert_eq!(detect_format(b"bplist00\x00"), PlistFormat::Binary);
        assert_eq!(detect_format(b"  \n{\"a\": 1}"), PlistFormat::Json);
        assert_eq!(detect_format(b"[1]"), PlistFormat::Json);
        assert_eq!(detect_format(b"<?xml version=\"1.0\"?>"), PlistFormat::Xml);
        assert_eq!(detect_format(b""), PlistFormat::Xml);
    }

    #[test]
    fn every_format_decodes_what_it_encodes() {
        let value = sample();
        for format in PlistFormat::ALL {
            let bytes = encode(&value, format).unwrap();
            assert_eq!(detect_format(&bytes), format);
            let back = decode(&bytes, Utf8Path::new("mem")).unwrap();
            assert_eq!(back, value, "format {format}");
        }
    }

    #[test]
    fn json_keeps_key_order() {
        let bytes = br#"{"Zed": 1, "Alpha": 2, "Mid": 3}"#;
        let value = decode(bytes, Utf8Path::new("mem")).unwrap();
        let keys: Vec<_> = value
            .as_dictionary()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["Zed", "Alpha", "Mid"]);
    }

    #[test]
    fn json_null_is_malformed() {
        let err = decode(br#"{"A": null}"#, Utf8Path::new("t.json")).unwrap_err();
        match err {
            PlistError::MalformedInput { path, reason } => {
                assert_eq!(path, "t.json");
                assert!(reason.contains("$.A"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let err = decode(b"<plist><dict><key>A</key>", Utf8Path::new("bad.plist")).unwrap_err();
        assert!(matches!(err, PlistError::MalformedInput { .. }));
    }

    #[test]
    fn data_cannot_become_json() {
        let mut dict = Dictionary::new();
        dict.insert("Blob".to_string(), Value::Data(vec![1, 2, 3]));
        let err = encode(&Value::Dictionary(dict), PlistFormat::Json).unwrap_err();
        match err {
            PlistError::UnsupportedJsonValue { kind, at } => {
                assert_eq!(kind, "data");
                assert_eq!(at, "$.Blob");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn xml_output_ends_with_newline() {
        let bytes = encode(&sample(), PlistFormat::Xml).unwrap();
        assert!(bytes.ends_with(b"\n"));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<key>CFBundleName</key>"));
    }
}
