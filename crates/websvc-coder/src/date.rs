//! Date and time text forms used on the wire.
//!
//! XML-RPC and JSON carry instants as `YYYYMMDDTHH:MM:SS` without an offset,
//! read and written in the coder's time zone. XML Schema (`xsd:dateTime`)
//! carries the offset explicitly.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const BASIC_FORMAT: &str = "%Y%m%dT%H:%M:%S";
const DASHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const XSD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Format an instant as `YYYYMMDDTHH:MM:SS` in the given zone.
pub(crate) fn format_basic(value: &DateTime<Utc>, tz: FixedOffset) -> String {
    value.with_timezone(&tz).format(BASIC_FORMAT).to_string()
}

/// Read `YYYYMMDDTHH:MM:SS` (or the dashed form) as a time in the given zone.
///
/// Text with an explicit offset is honoured as such.
pub(crate) fn parse_basic(text: &str, tz: FixedOffset) -> Option<DateTime<Utc>> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, BASIC_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DASHED_FORMAT))
        .ok()
        .and_then(|naive| in_zone(&naive, tz))
        .or_else(|| parse_xsd_date_time(text, tz))
}

/// Read text that has exactly the shape `YYYYMMDDTHH:MM:SS` and nothing else
/// as a time in the given zone.
pub(crate) fn parse_basic_exact(text: &str, tz: FixedOffset) -> Option<DateTime<Utc>> {
    let shaped = text.len() == 17
        && text.bytes().enumerate().all(|(i, b)| match i {
            8 => b == b'T',
            11 | 14 => b == b':',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDateTime::parse_from_str(text, BASIC_FORMAT)
        .ok()
        .and_then(|naive| in_zone(&naive, tz))
}

/// Format an instant as `xsd:dateTime` with the zone offset.
pub(crate) fn format_xsd(value: &DateTime<Utc>, tz: FixedOffset) -> String {
    value.with_timezone(&tz).format(XSD_FORMAT).to_string()
}

/// Read an `xsd:dateTime`; values without an offset are taken to be in `tz`.
pub(crate) fn parse_xsd_date_time(text: &str, tz: FixedOffset) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| in_zone(&naive, tz))
}

/// Read an `xsd:date` as midnight in `tz`.
pub(crate) fn parse_xsd_date(text: &str, tz: FixedOffset) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()?;
    in_zone(&date.and_hms_opt(0, 0, 0)?, tz)
}

fn in_zone(naive: &NaiveDateTime, tz: FixedOffset) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
