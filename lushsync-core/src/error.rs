//! Error types for the lushsync crates.

use thiserror::Error;

/// Errors that can occur during a sync run.
///
/// `Auth` is fatal for the whole run (no calendar operations are possible);
/// `Login`, `Portal` and `Api` are fatal for one user's sync only and must
/// never stop the remaining configured users.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Google credentials error: {0}")]
    Auth(String),

    #[error("Portal login failed: {0}")]
    Login(String),

    #[error("Portal error: {0}")]
    Portal(String),

    #[error("Shift parse error: {0}")]
    Parse(#[from] ShiftParseError),

    #[error("Calendar API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// A malformed day cell or shift string.
///
/// Recovered locally wherever it occurs: the day is dropped and the scrape
/// continues with the rest of the month.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShiftParseError {
    #[error("shift text {0:?} has no '-' separated time range")]
    MissingSeparator(String),

    #[error("unparseable time {0:?} (expected a 12-hour clock time like \"4:30 PM\")")]
    BadTime(String),

    #[error("unparseable day-of-month {0:?}")]
    BadDayNumber(String),

    #[error("day {day} does not exist in {year}-{month:02}")]
    NoSuchDate { year: i32, month: u32, day: u32 },

    #[error("local time {0} does not exist in timezone {1}")]
    NonexistentLocalTime(String, String),
}
