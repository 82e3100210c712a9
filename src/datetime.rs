//! Date/time utilities for newsdesk.
//!
//! Feeds and the headline API encode publication dates differently and often
//! badly. Every parser here resolves to a UTC instant; the `_or_now` variants
//! never fail and fall back to the current time, so a malformed date can never
//! keep an article out of the store.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Storage format for timestamps (fixed width, UTC, sorts chronologically).
const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Layout SQLite's `datetime('now')` writes; `%.f` also accepts the stored
/// microsecond form.
const DB_TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// ISO-8601 layouts once any offset has been split off.
const NAIVE_ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a feed timestamp (RFC 2822, with RFC 3339 accepted for Atom).
///
/// Returns `None` when the value cannot be read. Installed as the feed
/// parser's timestamp hook, so it also accepts what real feeds send: zone
/// names like `UTC`, offsets without a colon and single-digit hours. An
/// unknown zone name is dropped and the time read as UTC.
pub fn parse_feed_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_rfc2822_lenient(raw).or_else(|| parse_iso_lenient(raw))
}

/// Parse an ISO-8601 timestamp as returned by the headline API.
///
/// A trailing `Z` is the UTC offset; values without an offset are taken as UTC.
pub fn parse_iso_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_iso_lenient(raw) {
        return Some(dt);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `[Day,] D Mon YY[YY] H:MM[:SS] [zone]`, tolerating what chrono rejects.
fn parse_rfc2822_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let mut parts: Vec<&str> = raw.split_whitespace().collect();
    let has_weekday = parts.first().is_some_and(|first| {
        first
            .trim_end_matches(',')
            .chars()
            .all(|c| c.is_ascii_alphabetic())
    });
    if has_weekday {
        parts.remove(0);
    }

    let [day, month, year, clock, rest @ ..] = parts.as_slice() else {
        return None;
    };

    let day: u32 = day.trim_end_matches(',').parse().ok()?;
    let month = month_number(month)?;
    let year = parse_year(year)?;
    let (hour, minute, second) = parse_clock(clock)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = rest.first().map_or(Some(utc_offset()), |zone| zone_offset(zone))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// ISO-8601 with an optional `Z`, `+HH`, `+HHMM` or `+HH:MM` suffix.
fn parse_iso_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let (local, offset) = split_iso_offset(raw)?;
    let naive = NAIVE_ISO_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok())?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn split_iso_offset(raw: &str) -> Option<(&str, FixedOffset)> {
    if let Some(local) = raw.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        return Some((local, utc_offset()));
    }

    // An offset can only follow the time part; the date has its own dashes.
    let Some(time_start) = raw.find(|c: char| c == 'T' || c == ' ') else {
        return Some((raw, utc_offset()));
    };
    match raw[time_start..].rfind(|c: char| c == '+' || c == '-') {
        Some(sign_at) => {
            let (local, offset) = raw.split_at(time_start + sign_at);
            Some((local, parse_numeric_offset(offset)?))
        }
        None => Some((raw, utc_offset())),
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// `+HH`, `+HHMM` or `+HH:MM`.
fn parse_numeric_offset(s: &str) -> Option<FixedOffset> {
    let sign = match s.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = s[1..].chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes): (i32, i32) = match digits.len() {
        2 => (digits.parse().ok()?, 0),
        4 => (digits[..2].parse().ok()?, digits[2..].parse().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Offset for a trailing RFC 2822 zone. Unknown names read as UTC.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.starts_with(['+', '-']) {
        return parse_numeric_offset(zone);
    }
    let hours = match zone.to_ascii_uppercase().as_str() {
        "EST" | "CDT" => -5,
        "EDT" | "AST" => -4,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        "ADT" => -3,
        _ => 0,
    };
    FixedOffset::east_opt(hours * 3600)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Four-digit years as-is; two-digit years pivot at 69.
fn parse_year(s: &str) -> Option<i32> {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s.parse().ok()?;
    match s.len() {
        4 => Some(year),
        2 if year > 68 => Some(1900 + year),
        2 => Some(2000 + year),
        _ => None,
    }
}

/// `H:MM` or `H:MM:SS`, hour with one or two digits.
fn parse_clock(s: &str) -> Option<(u32, u32, u32)> {
    let mut fields = s.split(':');
    let hour = fields.next()?;
    let minute = fields.next()?;
    let second = fields.next().unwrap_or("0");
    if fields.next().is_some() || hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }
    Some((hour.parse().ok()?, minute.parse().ok()?, second.parse().ok()?))
}

/// Resolve a feed date, falling back to now.
pub fn parse_feed_date_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_feed_timestamp).unwrap_or_else(Utc::now)
}

/// Resolve an API date, falling back to now.
pub fn parse_api_date_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_iso_timestamp).unwrap_or_else(Utc::now)
}

/// Format an instant for storage.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Read a stored timestamp (SQLite `datetime('now')` layout or RFC 3339).
pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DB_TIMESTAMP_PARSE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a DateTime<Utc> in the specified timezone.
///
/// # Arguments
///
/// * `dt` - DateTime in UTC
/// * `timezone` - Timezone name (e.g., "Asia/Kolkata", "UTC")
/// * `format` - Output format string (e.g., "%Y/%m/%d %H:%M")
///
/// Unknown timezones fall back to UTC.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}
