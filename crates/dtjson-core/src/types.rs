//! The dtjson value model.
//!
//! A [`Document`] mirrors the JSON value tree and adds two leaves JSON cannot
//! express natively: [`Timestamp`] and [`Duration`](Document::Duration).

use crate::time::Timestamp;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde_json::Number;
use std::collections::{BTreeSet, HashSet};

/// Discriminator key of a tagged wire object.
pub const TYPE_KEY: &str = "__type__";
/// `__type__` value of a tagged timestamp.
pub const DATETIME_TAG: &str = "datetime";
/// Payload key of a tagged timestamp (ISO-8601 string).
pub const ISOFORMAT_KEY: &str = "isoformat";
/// `__type__` value of a tagged duration.
pub const TIMEDELTA_TAG: &str = "timedelta";
/// Payload key of a tagged duration (float total seconds).
pub const SECONDS_KEY: &str = "seconds";

/// String-keyed mapping in insertion order. Equality ignores order.
pub type Mapping = IndexMap<String, Document>;

/// A dtjson value: JSON plus timestamps and durations.
///
/// Numbers keep the integer/float distinction of the JSON text they came
/// from, so `1` and `1.0` are different documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Mapping(Mapping),
    Sequence(Vec<Document>),
    Timestamp(Timestamp),
    Duration(TimeDelta),
}

impl Document {
    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Document::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Document::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Document::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Document]> {
        match self {
            Document::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Document::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<&TimeDelta> {
        match self {
            Document::Duration(delta) => Some(delta),
            _ => None,
        }
    }

    /// Look up a key when this document is a mapping.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_mapping().and_then(|map| map.get(key))
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Document {
                fn from(n: $ty) -> Self {
                    Document::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Non-finite floats become [`Document::Null`], as in `serde_json::json!`.
impl From<f64> for Document {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Document::Null, Document::Number)
    }
}

impl From<f32> for Document {
    fn from(f: f32) -> Self {
        Document::from(f64::from(f))
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<Mapping> for Document {
    fn from(map: Mapping) -> Self {
        Document::Mapping(map)
    }
}

impl<T: Into<Document>> From<Vec<T>> for Document {
    fn from(items: Vec<T>) -> Self {
        Document::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Sets flatten to sequences; decoding never rebuilds a set.
impl<T: Into<Document>, S> From<HashSet<T, S>> for Document {
    fn from(items: HashSet<T, S>) -> Self {
        Document::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Document>> From<BTreeSet<T>> for Document {
    fn from(items: BTreeSet<T>) -> Self {
        Document::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Document>> From<Option<T>> for Document {
    fn from(value: Option<T>) -> Self {
        value.map_or(Document::Null, Into::into)
    }
}

impl From<Timestamp> for Document {
    fn from(ts: Timestamp) -> Self {
        Document::Timestamp(ts)
    }
}

impl From<NaiveDateTime> for Document {
    fn from(dt: NaiveDateTime) -> Self {
        Document::Timestamp(dt.into())
    }
}

impl From<DateTime<FixedOffset>> for Document {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Document::Timestamp(dt.into())
    }
}

impl From<DateTime<Utc>> for Document {
    fn from(dt: DateTime<Utc>) -> Self {
        Document::Timestamp(dt.into())
    }
}

impl From<TimeDelta> for Document {
    fn from(delta: TimeDelta) -> Self {
        Document::Duration(delta)
    }
}

impl<K: Into<String>, V: Into<Document>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Document::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
