//! StoreForce portal scraping.
//!
//! Drives a WebDriver session against the portal's rendered DOM: log in,
//! open the schedule tab, capture the month views. Parsing the captured
//! markup lives in lushsync-core so it works against fixtures without a
//! browser. The portal has no stable API; everything here is coupled to its
//! current markup and breaks when that changes.

mod session;

pub use session::{PortalConfig, PortalSession};

use chrono::{Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use lushsync_core::schedule::{parse_month, Schedule};
use lushsync_core::SyncError;

/// Log in as `username` and scrape the current and next month's shifts.
///
/// The browser session is closed on every exit path, including login
/// failure. A [`SyncError::Login`] means no schedule could be produced for
/// this user and the caller must stop; it carries no partial results.
pub async fn scrape(
    cfg: &PortalConfig,
    username: &str,
    password: &str,
    tz: Tz,
) -> Result<Schedule, SyncError> {
    let mut session = PortalSession::connect(cfg).await?;
    let result = scrape_months(&mut session, username, password, tz).await;
    session.close().await;
    result
}

async fn scrape_months(
    session: &mut PortalSession,
    username: &str,
    password: &str,
    tz: Tz,
) -> Result<Schedule, SyncError> {
    session.authenticate(username, password).await?;

    let today = Utc::now().with_timezone(&tz).date_naive();
    let mut schedule = Schedule::new();

    for offset in 0..2 {
        let markup = session.fetch_month_view(offset).await?;
        let month = month_start(today, offset);
        // Only the current month filters out days already in the past.
        let min_day = if offset == 0 { Some(today.day()) } else { None };
        schedule.extend(parse_month(&markup, month.year(), month.month(), min_day, tz));
    }

    Ok(schedule)
}

fn month_start(today: NaiveDate, offset: u32) -> NaiveDate {
    today
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(offset)))
        .unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start_rolls_over_year_end() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 18).unwrap();
        assert_eq!(month_start(today, 0), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(month_start(today, 1), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
