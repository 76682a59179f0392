//! The slice of a provider event that reconciliation needs, plus the fixed
//! shape of the events this tool owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary that marks a calendar event as owned by this tool.
/// Events with any other summary are never touched.
pub const SHIFT_SUMMARY: &str = "Lush Shift";

/// Location written into every shift event.
pub const SHIFT_LOCATION: &str = "1961 Chain Bridge Rd Unit G7U, McLean, VA 22102";

/// Description written into every shift event.
pub const SHIFT_DESCRIPTION: &str = "Workin hard for the money! Go baby!";

/// Popup reminder offsets, in minutes before shift start.
pub const REMINDER_MINUTES: [i64; 2] = [90, 45];

/// A calendar event as reconciliation sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    /// `None` when the provider returned an all-day date instead of an instant.
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}
