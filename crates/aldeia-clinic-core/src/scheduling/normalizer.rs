//! Date input normalizer.
//!
//! Callers hand over calendar days ("2024-03-15"), full timestamps, or
//! nothing at all. A bare calendar day is anchored at **local noon** before
//! conversion to an absolute instant: anchoring at midnight lands on a zone
//! boundary and rolls the displayed date to the adjacent day for clients
//! east or west of the server.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::{SchedulingError, SchedulingResult};

/// Inputs up to this length are calendar days without a time component.
const BARE_DATE_LEN: usize = 10;

/// Accepted layouts for inputs that carry a time but no zone offset; these
/// are interpreted in the given zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Normalize an optional date input against the system-local zone.
/// Absent input means "now".
pub fn normalize(input: Option<&str>) -> SchedulingResult<DateTime<Utc>> {
    normalize_in(input, &Local)
}

/// Normalize an optional date input against an explicit zone.
pub fn normalize_in<Tz: TimeZone>(input: Option<&str>, tz: &Tz) -> SchedulingResult<DateTime<Utc>> {
    let raw = match input.map(str::trim) {
        None | Some("") => return Ok(Utc::now()),
        Some(raw) => raw,
    };

    if raw.len() <= BARE_DATE_LEN {
        let day = parse_day(raw)?;
        let noon = day
            .and_hms_opt(12, 0, 0)
            .ok_or_else(|| SchedulingError::Validation(format!("Invalid date: '{raw}'")))?;
        return resolve_local(noon, tz);
    }

    parse_instant_in(raw, tz)
}

/// Resolve the start of a range query: a bare day means its local start.
pub fn range_start_in<Tz: TimeZone>(input: &str, tz: &Tz) -> SchedulingResult<DateTime<Utc>> {
    let raw = input.trim();
    if raw.len() <= BARE_DATE_LEN {
        let (start, _) = day_window_in(parse_day(raw)?, tz)?;
        return Ok(start);
    }
    parse_instant_in(raw, tz)
}

/// Resolve the end of a range query: a bare day means its local end
/// (exclusive, i.e. the start of the next day).
pub fn range_end_in<Tz: TimeZone>(input: &str, tz: &Tz) -> SchedulingResult<DateTime<Utc>> {
    let raw = input.trim();
    if raw.len() <= BARE_DATE_LEN {
        let (_, end) = day_window_in(parse_day(raw)?, tz)?;
        return Ok(end);
    }
    parse_instant_in(raw, tz)
}

/// The `[start, end)` pair of instants covering one calendar day in a zone.
pub fn day_window_in<Tz: TimeZone>(
    day: NaiveDate,
    tz: &Tz,
) -> SchedulingResult<(DateTime<Utc>, DateTime<Utc>)> {
    let next = day
        .succ_opt()
        .ok_or_else(|| SchedulingError::Validation(format!("Date out of range: {day}")))?;
    let start = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| SchedulingError::Validation(format!("Date out of range: {day}")))?;
    let end = next
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| SchedulingError::Validation(format!("Date out of range: {next}")))?;
    Ok((resolve_local(start, tz)?, resolve_local(end, tz)?))
}

fn parse_day(raw: &str) -> SchedulingResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| SchedulingError::Validation(format!("Unparsable date '{raw}': {e}")))
}

fn parse_instant_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> SchedulingResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return resolve_local(naive, tz);
        }
    }
    Err(SchedulingError::Validation(format!(
        "Unparsable date input: '{raw}'"
    )))
}

/// Map a zone-less local time to an instant. On a DST fold take the earlier
/// instant; in a DST gap (midnight transitions skip 00:00 in some zones)
/// shift forward until the time exists.
fn resolve_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> SchedulingResult<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => {
            let shifted = naive + chrono::Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    Ok(dt.with_timezone(&Utc))
                }
                LocalResult::None => Err(SchedulingError::Validation(format!(
                    "Local time does not exist: {naive}"
                ))),
            }
        }
    }
}
