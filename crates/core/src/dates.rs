//! Date handling at the backend boundary.
//!
//! The backend is not consistent about dates: appointment dates and dates of birth arrive as epoch
//! seconds on some endpoints and as ISO strings on others. This module is the single place where
//! that is absorbed.
//!
//! ## Reads
//! Any date or date-time field accepts:
//! - epoch seconds, as a JSON number or a numeric string
//! - an RFC 3339 date-time (`2024-03-01T09:30:00Z`, offsets allowed)
//! - a naive date-time (`2024-03-01T09:30:00`), taken as UTC
//! - a calendar date (`2024-03-01`), taken as UTC midnight
//!
//! Date-only fields keep the UTC calendar date of whatever arrived.
//!
//! ## Writes
//! Request bodies carry date-only fields as `YYYY-MM-DD` strings ([`to_wire_date`]) and
//! date-time fields as RFC 3339 UTC with whole seconds, `2023-11-14T22:13:20Z`
//! ([`to_wire_datetime`]). A date-time is never narrowed to a date on the way out.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Wire format for dates in request bodies.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Interpret a date-ish string pulled from the wire or a form field.
///
/// Returns `None` if the text matches none of the accepted encodings.
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    let numeric = text
        .strip_prefix('-')
        .unwrap_or(text)
        .bytes()
        .all(|b| b.is_ascii_digit());
    if numeric {
        return text.parse::<i64>().ok().and_then(from_epoch_seconds);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(text, WIRE_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a date typed or picked into a form field.
///
/// Date pickers produce `YYYY-MM-DD`; pasted values may be full date-times. Either way the UTC
/// calendar date is kept.
pub fn parse_form_date(input: &str) -> Option<NaiveDate> {
    parse_instant(input).map(|dt| dt.date_naive())
}

/// Render a date the way request bodies carry it.
pub fn to_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

/// Render an instant the way request bodies carry it.
pub fn to_wire_datetime(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `serialize_with` helper for date-time fields, see [`to_wire_datetime`].
pub fn serialize_wire_datetime<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_wire_datetime(*instant))
}

/// `serialize_with` helper that writes a date in [`WIRE_DATE_FORMAT`].
pub fn serialize_wire_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_wire_date(*date))
}

fn from_epoch_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

fn raw_to_instant(raw: RawDate) -> Option<DateTime<Utc>> {
    match raw {
        RawDate::Int(secs) => from_epoch_seconds(secs),
        RawDate::Float(secs) if secs.is_finite() => from_epoch_seconds(secs.trunc() as i64),
        RawDate::Float(_) => None,
        RawDate::Text(text) => parse_instant(&text),
    }
}

/// `deserialize_with` helper for required date-time fields.
pub fn lenient_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawDate::deserialize(deserializer)?;
    raw_to_instant(raw).ok_or_else(|| serde::de::Error::custom("unrecognised date encoding"))
}

/// `deserialize_with` helper for optional date-time fields (timestamps).
pub fn lenient_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDate>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawDate::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(raw) => raw_to_instant(raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("unrecognised date encoding")),
    }
}

/// `deserialize_with` helper for required date-only fields.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_datetime(deserializer).map(|dt| dt.date_naive())
}

/// `deserialize_with` helper for optional date-only fields.
pub fn lenient_date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_datetime_opt(deserializer).map(|dt| dt.map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "lenient_datetime")]
        at: DateTime<Utc>,
        #[serde(default, deserialize_with = "lenient_date_opt")]
        on: Option<NaiveDate>,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_epoch_seconds_number_and_string_agree() {
        let a: Holder = serde_json::from_str(r#"{"at": 1700000000}"#).expect("number");
        let b: Holder = serde_json::from_str(r#"{"at": "1700000000"}"#).expect("string");
        assert_eq!(a.at, b.at);
        assert_eq!(a.at.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_iso_encodings_are_accepted() {
        let h: Holder =
            serde_json::from_str(r#"{"at": "2024-03-01T09:30:00+02:00", "on": "1990-05-17"}"#)
                .expect("iso");
        assert_eq!(h.at.to_rfc3339(), "2024-03-01T07:30:00+00:00");
        assert_eq!(h.on, Some(date(1990, 5, 17)));
    }

    #[test]
    fn test_date_only_field_truncates_datetime_to_utc_date() {
        let h: Holder = serde_json::from_str(
            r#"{"at": 0, "on": "1990-05-17T23:30:00-02:00"}"#,
        )
        .expect("datetime into date field");
        assert_eq!(h.on, Some(date(1990, 5, 18)));
    }

    #[test]
    fn test_null_and_missing_optional_dates() {
        let h: Holder = serde_json::from_str(r#"{"at": 0, "on": null}"#).expect("null");
        assert_eq!(h.on, None);
        let h: Holder = serde_json::from_str(r#"{"at": 0}"#).expect("missing");
        assert_eq!(h.on, None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = serde_json::from_str::<Holder>(r#"{"at": "next tuesday"}"#)
            .err()
            .expect("should reject");
        assert!(err.to_string().contains("unrecognised date encoding"));
    }

    #[test]
    fn test_form_dates_normalise_to_wire_format() {
        assert_eq!(parse_form_date("2025-01-09"), Some(date(2025, 1, 9)));
        assert_eq!(
            parse_form_date("2025-01-09T00:00:00.000Z"),
            Some(date(2025, 1, 9))
        );
        assert_eq!(parse_form_date(""), None);
        assert_eq!(parse_form_date("09/01/2025"), None);
        assert_eq!(to_wire_date(date(2025, 1, 9)), "2025-01-09");
    }

    #[test]
    fn test_wire_datetime_keeps_time_of_day() {
        let instant = DateTime::from_timestamp(1_700_000_000, 0).expect("valid epoch");
        let wire = to_wire_datetime(instant);
        assert_eq!(wire, "2023-11-14T22:13:20Z");
        assert_eq!(parse_instant(&wire), Some(instant));
    }
}
