use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use dtjson_core::{encode, encode_to_writer, encode_with, to_json_value, Document, EncodeOptions};
use serde_json::json;
use std::collections::BTreeSet;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, micro: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_micro_opt(h, min, s, micro)
        .unwrap()
}

fn doc<const N: usize>(entries: [(&str, Document); N]) -> Document {
    entries.into_iter().collect()
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn encode_scalars() {
    assert_eq!(encode(&Document::Null).unwrap(), "null");
    assert_eq!(encode(&Document::from(true)).unwrap(), "true");
    assert_eq!(encode(&Document::from(42)).unwrap(), "42");
    assert_eq!(encode(&Document::from(-7i64)).unwrap(), "-7");
    assert_eq!(encode(&Document::from(3.5)).unwrap(), "3.5");
    assert_eq!(encode(&Document::from("hi \"there\"")).unwrap(), r#""hi \"there\"""#);
}

#[test]
fn non_finite_float_becomes_null() {
    assert_eq!(Document::from(f64::NAN), Document::Null);
    assert_eq!(encode(&Document::from(f64::INFINITY)).unwrap(), "null");
}

// ============================================================================
// Tagged leaves
// ============================================================================

#[test]
fn encode_naive_timestamp() {
    let ts = Document::from(at(2024, 5, 25, 14, 23, 36, 769_090));
    assert_eq!(
        encode(&ts).unwrap(),
        r#"{"__type__":"datetime","isoformat":"2024-05-25T14:23:36.769090"}"#
    );
}

#[test]
fn encode_offset_timestamp() {
    let ts = DateTime::parse_from_rfc3339("2024-05-25T14:23:36+02:00").unwrap();
    assert_eq!(
        encode(&Document::from(ts)).unwrap(),
        r#"{"__type__":"datetime","isoformat":"2024-05-25T14:23:36+02:00"}"#
    );
}

#[test]
fn encode_utc_timestamp() {
    let ts = DateTime::parse_from_rfc3339("2024-05-25T14:23:36Z")
        .unwrap()
        .to_utc();
    assert_eq!(
        encode(&Document::from(ts)).unwrap(),
        r#"{"__type__":"datetime","isoformat":"2024-05-25T14:23:36+00:00"}"#
    );
}

#[test]
fn encode_durations() {
    assert_eq!(
        encode(&Document::from(TimeDelta::milliseconds(1_500))).unwrap(),
        r#"{"__type__":"timedelta","seconds":1.5}"#
    );
    assert_eq!(
        encode(&Document::from(TimeDelta::seconds(-90))).unwrap(),
        r#"{"__type__":"timedelta","seconds":-90.0}"#
    );
    assert_eq!(
        encode(&Document::from(TimeDelta::zero())).unwrap(),
        r#"{"__type__":"timedelta","seconds":0.0}"#
    );
}

#[test]
fn encode_nested_tags() {
    let t = at(2024, 1, 1, 9, 30, 0, 0);
    let d = TimeDelta::minutes(5);
    let value = doc([
        ("event", Document::from(t)),
        (
            "items",
            Document::Sequence(vec![Document::from(d), Document::from("x")]),
        ),
    ]);

    let json: serde_json::Value = serde_json::from_str(&encode(&value).unwrap()).unwrap();
    assert_eq!(
        json,
        json!({
            "event": {"__type__": "datetime", "isoformat": "2024-01-01T09:30:00"},
            "items": [{"__type__": "timedelta", "seconds": 300.0}, "x"]
        })
    );
}

#[test]
fn mapping_keeps_insertion_order() {
    let value = doc([
        ("zeta", Document::from(1)),
        ("alpha", Document::from(2)),
        ("mid", Document::from(3)),
    ]);
    assert_eq!(encode(&value).unwrap(), r#"{"zeta":1,"alpha":2,"mid":3}"#);
}

#[test]
fn sets_encode_as_sequences() {
    let set: BTreeSet<i64> = [3, 1, 2].into_iter().collect();
    assert_eq!(encode(&Document::from(set)).unwrap(), "[1,2,3]");
}

#[test]
fn to_json_value_matches_encoded_tree() {
    let value = doc([("wait", Document::from(TimeDelta::seconds(2)))]);
    assert_eq!(
        to_json_value(&value).unwrap(),
        json!({"wait": {"__type__": "timedelta", "seconds": 2.0}})
    );
}

// ============================================================================
// Formatting options
// ============================================================================

#[test]
fn indent_pretty_prints() {
    let value = doc([
        ("a", Document::from(1)),
        ("b", Document::from(vec![1, 2])),
        ("c", Document::Sequence(vec![])),
        ("d", Document::Mapping(Default::default())),
    ]);
    let out = encode_with(&value, &EncodeOptions::new().indent(2)).unwrap();
    assert_eq!(
        out,
        "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ],\n  \"c\": [],\n  \"d\": {}\n}"
    );
}

#[test]
fn indent_zero_still_breaks_lines() {
    let value = Document::from(vec![1, 2]);
    let out = encode_with(&value, &EncodeOptions::new().indent(0)).unwrap();
    assert_eq!(out, "[\n1,\n2\n]");
}

#[test]
fn indent_with_tabs() {
    let value = doc([("a", Document::from(1))]);
    let out = encode_with(&value, &EncodeOptions::new().indent_with("\t")).unwrap();
    assert_eq!(out, "{\n\t\"a\": 1\n}");
}

#[test]
fn custom_separators() {
    let value = doc([("a", Document::from(vec![1, 2])), ("b", Document::Null)]);
    let out = encode_with(&value, &EncodeOptions::new().separators(", ", ": ")).unwrap();
    assert_eq!(out, r#"{"a": [1, 2], "b": null}"#);
}

#[test]
fn sort_keys_applies_at_every_depth() {
    let value = doc([
        ("b", doc([("y", Document::from(1)), ("x", Document::from(2))])),
        ("a", Document::from(TimeDelta::seconds(1))),
    ]);
    let out = encode_with(&value, &EncodeOptions::new().sort_keys(true)).unwrap();
    assert_eq!(
        out,
        r#"{"a":{"__type__":"timedelta","seconds":1.0},"b":{"x":2,"y":1}}"#
    );
}

#[test]
fn ensure_ascii_escapes_non_ascii() {
    let value = doc([("caf\u{e9}", Document::from("\u{4f60}\u{597d} \u{1f600}"))]);
    let out = encode_with(&value, &EncodeOptions::new().ensure_ascii(true)).unwrap();
    assert_eq!(out, r#"{"caf\u00e9":"\u4f60\u597d \ud83d\ude00"}"#);
    assert!(out.is_ascii());
}

#[test]
fn ensure_ascii_off_writes_utf8() {
    let value = Document::from("caf\u{e9}");
    assert_eq!(encode(&value).unwrap(), "\"caf\u{e9}\"");
}

#[test]
fn control_characters_are_escaped_either_way() {
    let value = Document::from("a\nb\t\u{1}");
    let expected = r#""a\nb\t\u0001""#;
    assert_eq!(encode(&value).unwrap(), expected);
    assert_eq!(
        encode_with(&value, &EncodeOptions::new().ensure_ascii(true)).unwrap(),
        expected
    );
}

// ============================================================================
// Writer entry point
// ============================================================================

#[test]
fn encode_to_writer_matches_encode() {
    let value = doc([("when", Document::from(at(2023, 12, 31, 23, 59, 59, 1)))]);
    let mut buf = Vec::new();
    encode_to_writer(&mut buf, &value, &EncodeOptions::default()).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), encode(&value).unwrap());
}

#[test]
fn encode_to_failing_writer_reports_io() {
    struct Broken;
    impl std::io::Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let err = encode_to_writer(Broken, &Document::from(1), &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, dtjson_core::DtJsonError::Io(_)), "got {err:?}");
}

#[test]
fn python_json_dumps_layout() {
    let value = doc([
        ("title", Document::from("café")),
        ("at", Document::from(at(2024, 1, 1, 9, 0, 0, 0))),
        ("tags", Document::from(vec![1, 2])),
    ]);

    assert_eq!(
        encode(&value).unwrap(),
        r#"{"title":"café","at":{"__type__":"datetime","isoformat":"2024-01-01T09:00:00"},"tags":[1,2]}"#
    );

    let python = EncodeOptions::new().separators(", ", ": ").ensure_ascii(true);
    assert_eq!(
        encode_with(&value, &python).unwrap(),
        r#"{"title": "caf\u00e9", "at": {"__type__": "datetime", "isoformat": "2024-01-01T09:00:00"}, "tags": [1, 2]}"#
    );
}
