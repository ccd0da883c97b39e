//! # dtjson-core
//!
//! JSON encoding and decoding with two extra leaf types: **timestamps** and
//! **durations**.
//!
//! JSON has no date or time-span type. dtjson carries them as small tagged
//! objects that any JSON tool can read, and turns them back into typed
//! values on decode:
//!
//! ```json
//! {"__type__": "datetime", "isoformat": "2024-05-25T14:23:36.769090"}
//! {"__type__": "timedelta", "seconds": 3600.0}
//! ```
//!
//! Tagged objects may appear at any depth and are recognized by shape alone
//! (exactly those two keys), so no schema is needed. Objects that merely look
//! similar decode as ordinary mappings.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::{NaiveDate, TimeDelta};
//! use dtjson_core::{decode, encode, Document};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 5, 25)
//!     .unwrap()
//!     .and_hms_opt(14, 23, 36)
//!     .unwrap();
//! let doc: Document = [
//!     ("start", Document::from(start)),
//!     ("length", Document::from(TimeDelta::minutes(90))),
//! ]
//! .into_iter()
//! .collect();
//!
//! let json = encode(&doc).unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"start":{"__type__":"datetime","isoformat":"2024-05-25T14:23:36"},"length":{"__type__":"timedelta","seconds":5400.0}}"#
//! );
//! assert_eq!(decode(&json).unwrap(), doc);
//! ```
//!
//! ## Modules
//!
//! - [`encoder`] — Document → JSON text, with [`EncodeOptions`]
//! - [`decoder`] — JSON text → Document, structural tag recognition
//! - [`types`] — the `Document` value model and wire constants
//! - [`time`] — `Timestamp`, ISO-8601 and total-seconds conversions
//! - [`rpc`] — call envelope, method dispatcher, reply interpretation
//! - [`error`] — Error types for parse/encode failures

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod rpc;
pub mod time;
pub mod types;

pub use decoder::{decode, decode_from_reader, decode_slice, from_json_value};
pub use encoder::{encode, encode_to_writer, encode_with, to_json_value, EncodeOptions};
pub use error::DtJsonError;
pub use time::Timestamp;
pub use types::{Document, Mapping};
