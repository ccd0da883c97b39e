//! Timestamp and duration leaves, and their wire representations.
//!
//! Timestamps travel as ISO-8601 strings, durations as floating-point total
//! seconds. Formatting keeps every sub-second digit the value carries, so a
//! timestamp always survives `format → parse` unchanged.
//!
//! Accepted ISO-8601 input forms:
//!
//! - `YYYY-MM-DD` (midnight)
//! - `YYYY-MM-DD[T| ]HH`, `HH:MM`, `HH:MM:SS` and `HH:MM:SS.f` (1 to 9 digits,
//!   `.` or `,` as the decimal mark)
//! - any of the above followed by `Z`, `±HH`, `±HHMM`, `±HH:MM` or `±HH:MM:SS`

use crate::error::{DtJsonError, Result};
use crate::types::{DATETIME_TAG, TIMEDELTA_TAG};
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike,
    Utc,
};
use std::fmt;
use std::str::FromStr;

/// An absolute point in time, with or without a fixed UTC offset.
///
/// Equality follows chrono: two offset timestamps are equal when they denote
/// the same instant; a naive timestamp never equals an offset one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// Wall-clock time with no offset attached.
    Naive(NaiveDateTime),
    /// Time pinned to a fixed offset from UTC.
    Offset(DateTime<FixedOffset>),
}

impl Timestamp {
    /// Parse an ISO-8601 string. See the module docs for the accepted forms.
    pub fn parse_iso(s: &str) -> Result<Self> {
        parse_iso(s).ok_or_else(|| {
            DtJsonError::invalid_payload(DATETIME_TAG, format!("invalid isoformat string: {s:?}"))
        })
    }

    /// Render as ISO-8601, e.g. `2024-05-25T14:23:36.769090+02:00`.
    pub fn to_iso_string(&self) -> String {
        match self {
            Timestamp::Naive(dt) => dt.format(&datetime_pattern(dt.nanosecond())).to_string(),
            Timestamp::Offset(dt) => {
                // Offsets with a seconds component need `+HH:MM:SS` to survive a reparse.
                let zone = if dt.offset().local_minus_utc() % 60 == 0 {
                    "%:z"
                } else {
                    "%::z"
                };
                let pattern = format!("{}{zone}", datetime_pattern(dt.nanosecond()));
                dt.format(&pattern).to_string()
            }
        }
    }

    /// The wall-clock reading, ignoring any offset.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Timestamp::Naive(dt) => *dt,
            Timestamp::Offset(dt) => dt.naive_local(),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            Timestamp::Naive(_) => None,
            Timestamp::Offset(dt) => Some(*dt.offset()),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl FromStr for Timestamp {
    type Err = DtJsonError;

    fn from_str(s: &str) -> Result<Self> {
        Timestamp::parse_iso(s)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp::Naive(dt)
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Timestamp::Offset(dt)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Offset(dt.fixed_offset())
    }
}

/// Seconds-and-fraction pattern: no fraction for whole seconds, six digits
/// for whole microseconds, nine otherwise.
fn datetime_pattern(nanos: u32) -> String {
    let fraction = match nanos % 1_000_000_000 {
        0 => "",
        n if n % 1_000 == 0 => "%.6f",
        _ => "%.9f",
    };
    format!("%Y-%m-%dT%H:%M:%S{fraction}")
}

fn parse_iso(s: &str) -> Option<Timestamp> {
    let date = NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()?;
    let rest = &s[10..];
    if rest.is_empty() {
        return Some(Timestamp::Naive(date.and_time(NaiveTime::MIN)));
    }

    let mut chars = rest.chars();
    if !matches!(chars.next(), Some('T' | 't' | ' ')) {
        return None;
    }
    let time_and_offset = chars.as_str();

    let (time_part, offset) = split_offset(time_and_offset)?;
    let time = parse_time(time_part)?;
    let naive = date.and_time(time);

    match offset {
        None => Some(Timestamp::Naive(naive)),
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(Timestamp::Offset),
    }
}

/// Split `HH:MM:SS.f±HH:MM` into the time and a parsed offset, if any.
/// Returns `None` when an offset is present but malformed.
fn split_offset(s: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(time) = s.strip_suffix(['Z', 'z']) {
        return Some((time, FixedOffset::east_opt(0)));
    }
    match s.find(['+', '-']) {
        None => Some((s, None)),
        Some(idx) => {
            let offset = parse_offset(&s[idx..])?;
            Some((&s[..idx], Some(offset)))
        }
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let sign = match s.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let body = &s[1..];
    if !body.is_ascii() {
        return None;
    }

    let fields: Vec<&str> = if body.contains(':') {
        body.split(':').collect()
    } else {
        match body.len() {
            2 => vec![body],
            4 => vec![&body[..2], &body[2..]],
            6 => vec![&body[..2], &body[2..4], &body[4..]],
            _ => return None,
        }
    };
    if fields.is_empty() || fields.len() > 3 {
        return None;
    }

    let limits = [23, 59, 59];
    let weights = [3600, 60, 1];
    let mut seconds = 0i32;
    for (i, field) in fields.iter().enumerate() {
        if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: i32 = field.parse().ok()?;
        if n > limits[i] {
            return None;
        }
        seconds += n * weights[i];
    }
    FixedOffset::east_opt(sign * seconds)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    // chrono refuses a time without minutes, so a bare hour is handled here.
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveTime::from_hms_opt(s.parse().ok()?, 0, 0);
    }
    // `,` is an accepted decimal mark for the fraction.
    let s = s.replacen(',', ".", 1);
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|pattern| NaiveTime::parse_from_str(&s, pattern).ok())
}

/// Total seconds of a duration as a float.
///
/// Durations with whole-microsecond precision are computed from the
/// microsecond count, which keeps the float exact enough for
/// [`duration_from_seconds`] to restore the same value.
pub fn total_seconds(delta: &TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(micros) if delta.subsec_nanos() % 1_000 == 0 => micros as f64 / 1e6,
        _ => delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9,
    }
}

/// Build a duration from float seconds, rounding half-to-even to the nearest
/// microsecond.
pub fn duration_from_seconds(seconds: f64) -> Result<TimeDelta> {
    if !seconds.is_finite() {
        return Err(DtJsonError::invalid_payload(
            TIMEDELTA_TAG,
            format!("seconds must be finite, got {seconds}"),
        ));
    }
    let whole = seconds.trunc();
    let micros = ((seconds - whole) * 1e6).round_ties_even();

    TimeDelta::try_seconds(whole as i64)
        .and_then(|delta| delta.checked_add(&TimeDelta::microseconds(micros as i64)))
        .ok_or_else(|| {
            DtJsonError::invalid_payload(TIMEDELTA_TAG, format!("{seconds} seconds is out of range"))
        })
}
