//! dtjson decoder: parses JSON text and rebuilds timestamps and durations.
//!
//! Decoding is a standard `serde_json` parse followed by a depth-first walk
//! that recognizes tagged objects purely by shape. An object is tagged only
//! when its key set is *exactly* `{"__type__", <payload key>}` and
//! `__type__` names the matching type:
//!
//! | wire object                                      | decoded as            |
//! |--------------------------------------------------|-----------------------|
//! | `{"__type__": "datetime", "isoformat": "..."}`   | `Document::Timestamp` |
//! | `{"__type__": "timedelta", "seconds": 1.5}`      | `Document::Duration`  |
//! | anything else (extra/missing key, other tag)     | `Document::Mapping`   |
//!
//! Look-alike objects are never an error: they come back as plain mappings.
//! A recognized tag with an unusable payload (a non-string `isoformat`, a
//! string that is not ISO-8601, a non-numeric `seconds`) fails with
//! [`DtJsonError::InvalidPayload`].
//!
//! # Example
//! ```
//! use dtjson_core::{decode, Document};
//!
//! let doc = decode(r#"{"at": {"__type__": "datetime", "isoformat": "2024-01-01T09:30:00"}}"#).unwrap();
//! assert!(doc.get("at").and_then(Document::as_timestamp).is_some());
//!
//! let plain = decode(r#"{"__type__": "datetime"}"#).unwrap();
//! assert!(plain.as_mapping().is_some());
//! ```

use crate::error::{DtJsonError, Result};
use crate::time::{duration_from_seconds, Timestamp};
use crate::types::{
    Document, DATETIME_TAG, ISOFORMAT_KEY, SECONDS_KEY, TIMEDELTA_TAG, TYPE_KEY,
};
use serde_json::{Map, Value};
use std::io;

/// The tagged shapes the decoder knows how to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Datetime,
    Timedelta,
}

/// Decode JSON text into a document.
pub fn decode(json: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(json)?;
    from_json_value(value)
}

/// Decode JSON bytes (UTF-8) into a document.
pub fn decode_slice(json: &[u8]) -> Result<Document> {
    let value: Value = serde_json::from_slice(json)?;
    from_json_value(value)
}

/// Decode a JSON document read from `reader` until end of input.
///
/// Wrap unbuffered sources in `io::BufReader`; the reader's lifecycle stays
/// with the caller.
pub fn decode_from_reader<R: io::Read>(reader: R) -> Result<Document> {
    let value: Value = serde_json::from_reader(reader)?;
    from_json_value(value)
}

/// Rebuild a document from an already-parsed JSON tree.
///
/// This is the hook for callers that need a differently configured parser:
/// parse with your own `serde_json::Deserializer`, then hand the value here.
pub fn from_json_value(value: Value) -> Result<Document> {
    let doc = match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(b),
        Value::Number(n) => Document::Number(n),
        Value::String(s) => Document::String(s),
        Value::Array(items) => Document::Sequence(
            items
                .into_iter()
                .map(from_json_value)
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => match detect_tag(&map) {
            Some((Tag::Datetime, payload)) => Document::Timestamp(decode_timestamp(payload)?),
            Some((Tag::Timedelta, payload)) => Document::Duration(decode_duration(payload)?),
            None => Document::Mapping(
                map.into_iter()
                    .map(|(key, value)| Ok((key, from_json_value(value)?)))
                    .collect::<Result<_>>()?,
            ),
        },
    };
    Ok(doc)
}

/// Structural tag check: exact two-key set plus a matching `__type__` string.
/// Total: never fails, only answers "which tag, if any" and hands back the
/// payload.
fn detect_tag(map: &Map<String, Value>) -> Option<(Tag, &Value)> {
    if map.len() != 2 {
        return None;
    }
    let (tag, payload_key) = match map.get(TYPE_KEY)?.as_str()? {
        DATETIME_TAG => (Tag::Datetime, ISOFORMAT_KEY),
        TIMEDELTA_TAG => (Tag::Timedelta, SECONDS_KEY),
        _ => return None,
    };
    map.get(payload_key).map(|payload| (tag, payload))
}

fn decode_timestamp(payload: &Value) -> Result<Timestamp> {
    match payload {
        Value::String(s) => Timestamp::parse_iso(s),
        other => Err(DtJsonError::invalid_payload(
            DATETIME_TAG,
            format!("isoformat must be a string, got {}", json_kind(other)),
        )),
    }
}

fn decode_duration(payload: &Value) -> Result<chrono::TimeDelta> {
    match payload {
        Value::Number(n) => {
            let seconds = n.as_f64().ok_or_else(|| {
                DtJsonError::invalid_payload(TIMEDELTA_TAG, format!("unusable seconds value {n}"))
            })?;
            duration_from_seconds(seconds)
        }
        other => Err(DtJsonError::invalid_payload(
            TIMEDELTA_TAG,
            format!("seconds must be a number, got {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
