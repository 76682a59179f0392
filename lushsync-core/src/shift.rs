//! The work-shift value object and shift-text parsing.

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::error::ShiftParseError;

/// One scheduled work shift: a calendar date plus wall-clock start/end times.
///
/// The zone-aware instants are derived once at construction from the
/// configured IANA zone and never re-derived, so the instants compared during
/// reconciliation are exactly the instants written into calendar events.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkShift {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl WorkShift {
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        tz: Tz,
    ) -> Result<Self, ShiftParseError> {
        let start = resolve_local(date, start_time, tz)?;
        let end = resolve_local(date, end_time, tz)?;

        Ok(Self {
            date,
            start_time,
            end_time,
            start,
            end,
        })
    }

    /// Key used in schedule maps: `YYYYMMDD`.
    pub fn date_key(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }
}

/// Resolve a wall-clock time on a date to an instant in `tz`.
///
/// An ambiguous local time (the repeated hour when clocks fall back) takes
/// the earlier instant; a time skipped by a spring-forward transition is an
/// error and drops the day.
fn resolve_local(
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Result<DateTime<Tz>, ShiftParseError> {
    use chrono::TimeZone;

    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| {
            ShiftParseError::NonexistentLocalTime(date.and_time(time).to_string(), tz.name().to_string())
        })
}

/// Parse `"H:MM AM - H:MM PM"` shift text into wall-clock start/end times.
///
/// Splits on the first `-`, trims both sides and parses each with a 12-hour
/// clock format, matching what the portal renders into day cells.
pub fn parse_time_range(text: &str) -> Result<(NaiveTime, NaiveTime), ShiftParseError> {
    let (start_raw, end_raw) = text
        .split_once('-')
        .ok_or_else(|| ShiftParseError::MissingSeparator(text.to_string()))?;

    Ok((parse_clock(start_raw.trim())?, parse_clock(end_raw.trim())?))
}

fn parse_clock(raw: &str) -> Result<NaiveTime, ShiftParseError> {
    NaiveTime::parse_from_str(raw, "%I:%M %p")
        .map_err(|_| ShiftParseError::BadTime(raw.to_string()))
}
