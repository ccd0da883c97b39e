//! dtjson encoder: converts a [`Document`] into JSON text.
//!
//! The document is first simplified into a plain `serde_json::Value` tree,
//! replacing every timestamp and duration with its tagged object:
//!
//! - **Timestamp** → `{"__type__": "datetime", "isoformat": "2024-05-25T14:23:36.769090"}`
//! - **Duration** → `{"__type__": "timedelta", "seconds": 90.5}`
//!
//! The tree is then written by `serde_json` through a formatter driven by
//! [`EncodeOptions`] (indentation, separators, key sorting, ASCII escaping).
//! The options only shape the text; they never change which document the
//! text decodes to.
//!
//! # Example
//! ```
//! use chrono::TimeDelta;
//! use dtjson_core::{encode, Document};
//!
//! let doc: Document = [("retry_after", Document::from(TimeDelta::seconds(90)))]
//!     .into_iter()
//!     .collect();
//! let json = encode(&doc).unwrap();
//! assert_eq!(json, r#"{"retry_after":{"__type__":"timedelta","seconds":90.0}}"#);
//! ```

use crate::error::{DtJsonError, Result};
use crate::time::total_seconds;
use crate::types::{
    Document, DATETIME_TAG, ISOFORMAT_KEY, SECONDS_KEY, TIMEDELTA_TAG, TYPE_KEY,
};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Number, Value};
use std::io;

/// Output controls forwarded to the JSON serializer.
///
/// The default produces compact output (`{"a":1,"b":[1,2]}`) with keys in
/// insertion order and non-ASCII characters written as UTF-8, following
/// `serde_json`. Python's `json.dumps` defaults differ: it separates with
/// `", "` and `": "` and escapes non-ASCII text. Byte-identical output needs
/// `EncodeOptions::new().separators(", ", ": ").ensure_ascii(true)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    indent: Option<String>,
    separators: Option<(String, String)>,
    sort_keys: bool,
    ensure_ascii: bool,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print, indenting each nesting level by `width` spaces.
    /// A width of zero still puts every element on its own line.
    pub fn indent(self, width: usize) -> Self {
        self.indent_with(" ".repeat(width))
    }

    /// Pretty-print, indenting each nesting level with `unit` (e.g. `"\t"`).
    pub fn indent_with(mut self, unit: impl Into<String>) -> Self {
        self.indent = Some(unit.into());
        self
    }

    /// Override the item separator (default `","`) and the key separator
    /// (default `":"`, or `": "` when indenting).
    pub fn separators(mut self, item: impl Into<String>, key: impl Into<String>) -> Self {
        self.separators = Some((item.into(), key.into()));
        self
    }

    /// Emit mapping keys in lexicographic order at every depth.
    pub fn sort_keys(mut self, sort: bool) -> Self {
        self.sort_keys = sort;
        self
    }

    /// Escape every non-ASCII character as `\uXXXX` (surrogate pairs above
    /// the Basic Multilingual Plane).
    pub fn ensure_ascii(mut self, ascii: bool) -> Self {
        self.ensure_ascii = ascii;
        self
    }

    fn formatter(&self) -> DtFormatter<'_> {
        let default_key: &'static str = if self.indent.is_some() { ": " } else { ":" };
        let (item_separator, key_separator) = match &self.separators {
            Some((item, key)) => (item.as_str(), key.as_str()),
            None => (",", default_key),
        };
        DtFormatter {
            indent: self.indent.as_deref().map(str::as_bytes),
            item_separator: item_separator.as_bytes(),
            key_separator: key_separator.as_bytes(),
            ensure_ascii: self.ensure_ascii,
            depth: 0,
            has_value: false,
        }
    }
}

/// Encode a document as compact JSON text.
pub fn encode(doc: &Document) -> Result<String> {
    encode_with(doc, &EncodeOptions::default())
}

/// Encode a document as JSON text using the given output options.
pub fn encode_with(doc: &Document, options: &EncodeOptions) -> Result<String> {
    let mut buf = Vec::new();
    encode_to_writer(&mut buf, doc, options)?;
    String::from_utf8(buf).map_err(|e| DtJsonError::Encode(e.to_string()))
}

/// Encode a document into any `io::Write` sink. The writer is not flushed.
pub fn encode_to_writer<W: io::Write>(
    writer: W,
    doc: &Document,
    options: &EncodeOptions,
) -> Result<()> {
    let value = simplify(doc, options.sort_keys)?;
    let mut ser = Serializer::with_formatter(writer, options.formatter());
    value.serialize(&mut ser).map_err(|e| {
        if e.is_io() {
            DtJsonError::Io(e.into())
        } else {
            DtJsonError::Encode(e.to_string())
        }
    })
}

/// Convert a document into the plain JSON tree that [`encode`] writes.
///
/// Useful for embedding dtjson content in a larger `serde_json` payload.
pub fn to_json_value(doc: &Document) -> Result<Value> {
    simplify(doc, false)
}

/// Recursive walk replacing timestamps and durations with tagged objects.
fn simplify(doc: &Document, sort_keys: bool) -> Result<Value> {
    let value = match doc {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(n) => Value::Number(n.clone()),
        Document::String(s) => Value::String(s.clone()),
        Document::Timestamp(ts) => tagged(
            DATETIME_TAG,
            ISOFORMAT_KEY,
            Value::String(ts.to_iso_string()),
        ),
        Document::Duration(delta) => {
            let seconds = total_seconds(delta);
            let number = Number::from_f64(seconds).ok_or_else(|| {
                DtJsonError::Encode(format!("duration of {seconds} seconds has no JSON form"))
            })?;
            tagged(TIMEDELTA_TAG, SECONDS_KEY, Value::Number(number))
        }
        Document::Mapping(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            if sort_keys {
                entries.sort_by(|a, b| a.0.cmp(b.0));
            }
            let mut out = Map::with_capacity(entries.len());
            for (key, value) in entries {
                out.insert(key.clone(), simplify(value, sort_keys)?);
            }
            Value::Object(out)
        }
        Document::Sequence(items) => Value::Array(
            items
                .iter()
                .map(|item| simplify(item, sort_keys))
                .collect::<Result<_>>()?,
        ),
    };
    Ok(value)
}

/// Build `{"__type__": tag, key: payload}`. `__type__` sorts before both
/// payload keys, so the shape is identical with or without `sort_keys`.
fn tagged(tag: &str, key: &str, payload: Value) -> Value {
    let mut map = Map::with_capacity(2);
    map.insert(TYPE_KEY.to_string(), Value::String(tag.to_string()));
    map.insert(key.to_string(), payload);
    Value::Object(map)
}

/// `serde_json` formatter with configurable indentation and separators and
/// optional ASCII-only string output.
///
/// Layout follows `serde_json::ser::PrettyFormatter`: empty containers stay
/// on one line, and each element of a non-empty container starts on a fresh
/// indented line when an indent unit is set.
struct DtFormatter<'a> {
    indent: Option<&'a [u8]>,
    item_separator: &'a [u8],
    key_separator: &'a [u8],
    ensure_ascii: bool,
    depth: usize,
    has_value: bool,
}

impl DtFormatter<'_> {
    fn newline<W: ?Sized + io::Write>(&self, writer: &mut W) -> io::Result<()> {
        if let Some(unit) = self.indent {
            writer.write_all(b"\n")?;
            for _ in 0..self.depth {
                writer.write_all(unit)?;
            }
        }
        Ok(())
    }
}

impl Formatter for DtFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth -= 1;
        if self.has_value {
            self.newline(writer)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if !first {
            writer.write_all(self.item_separator)?;
        }
        self.newline(writer)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth -= 1;
        if self.has_value {
            self.newline(writer)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if !first {
            writer.write_all(self.item_separator)?;
        }
        self.newline(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.key_separator)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.ensure_ascii {
            return writer.write_all(fragment.as_bytes());
        }
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
