//! Thin authenticated wrapper over the Google Calendar events API.

use anyhow::{Context, Result};
use chrono::Utc;
use google_calendar::types::{EventDateTime, EventReminder, OrderBy, Reminders, SendUpdates};
use google_calendar::Client;
use lushsync_core::event::{
    CalendarEvent, REMINDER_MINUTES, SHIFT_DESCRIPTION, SHIFT_LOCATION, SHIFT_SUMMARY,
};
use lushsync_core::shift::WorkShift;

use crate::auth;
use crate::config::{self, GoogleConfig};

/// Upper bound on how many upcoming events one reconcile pass can see.
const LIST_PAGE_SIZE: i64 = 30;

/// An authenticated calendar client.
///
/// Insert has no idempotence guard; duplicate suppression is entirely the
/// reconciler's responsibility.
pub struct CalendarWriter {
    client: Client,
}

impl CalendarWriter {
    /// Establish credentials (cached token, refresh, or interactive consent
    /// flow) and build the API client. Failing here means no calendar
    /// operations are possible at all.
    pub async fn connect(cfg: &GoogleConfig) -> Result<Self> {
        let creds = config::load_credentials(&cfg.credentials_path)?;
        let tokens = auth::valid_tokens(cfg).await?;

        Ok(Self {
            client: auth::create_client(&creds, &tokens),
        })
    }

    /// Upcoming events from midnight today (UTC), earliest first, single
    /// occurrences only, capped at [`LIST_PAGE_SIZE`] results.
    pub async fn list_upcoming(&self, calendar_id: &str) -> Result<Vec<CalendarEvent>> {
        let time_min = format!("{}T00:00:00Z", Utc::now().format("%Y-%m-%d"));

        let response = self
            .client
            .events()
            .list(
                calendar_id,
                "",
                0,
                LIST_PAGE_SIZE,
                OrderBy::StartTime,
                "",
                &[],
                "", // search query
                &[],
                false,
                false,
                true,
                "",
                &time_min,
                "",
                "",
            )
            .await
            .with_context(|| format!("Failed to list events for calendar {}", calendar_id))?;

        Ok(response
            .body
            .into_iter()
            .filter(|event| !event.id.is_empty())
            .map(|event| CalendarEvent {
                id: event.id,
                summary: event.summary,
                start: event.start.as_ref().and_then(|s| s.date_time),
                end: event.end.as_ref().and_then(|e| e.date_time),
            })
            .collect())
    }

    /// Delete one event. An event that is already gone is fine.
    pub async fn delete(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let result = self
            .client
            .events()
            .delete(calendar_id, event_id, false, SendUpdates::None)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("410") || error_str.contains("Gone") {
                    Ok(())
                } else {
                    Err(e).with_context(|| format!("Failed to delete event: {}", event_id))
                }
            }
        }
    }

    /// Insert the fixed-shape shift event and return its link.
    pub async fn insert_shift(&self, calendar_id: &str, shift: &WorkShift) -> Result<String> {
        let event = shift_event_body(shift);

        let response = self
            .client
            .events()
            .insert(calendar_id, 0, 0, false, SendUpdates::None, false, &event)
            .await
            .with_context(|| format!("Failed to create event for {}", shift.date_key()))?;

        Ok(response.body.html_link)
    }
}

/// The fixed event payload: owned summary/location/description, the shift's
/// instants labeled with their zone, popup reminders before the start.
fn shift_event_body(shift: &WorkShift) -> google_calendar::types::Event {
    let time_zone = shift.start.timezone().name().to_string();

    google_calendar::types::Event {
        summary: SHIFT_SUMMARY.to_string(),
        location: SHIFT_LOCATION.to_string(),
        description: SHIFT_DESCRIPTION.to_string(),
        start: Some(EventDateTime {
            date: None,
            date_time: Some(shift.start.with_timezone(&Utc)),
            time_zone: time_zone.clone(),
        }),
        end: Some(EventDateTime {
            date: None,
            date_time: Some(shift.end.with_timezone(&Utc)),
            time_zone,
        }),
        reminders: Some(Reminders {
            use_default: false,
            overrides: REMINDER_MINUTES
                .iter()
                .map(|&minutes| EventReminder {
                    method: "popup".to_string(),
                    minutes,
                })
                .collect(),
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use chrono_tz::America::New_York;

    fn shift() -> WorkShift {
        WorkShift::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            New_York,
        )
        .unwrap()
    }

    #[test]
    fn test_event_body_has_the_owned_shape() {
        let event = shift_event_body(&shift());

        assert_eq!(event.summary, SHIFT_SUMMARY);
        assert_eq!(event.location, SHIFT_LOCATION);
        assert_eq!(event.description, SHIFT_DESCRIPTION);

        let start = event.start.unwrap();
        assert_eq!(start.time_zone, "America/New_York");
        // 9:00 EST is 14:00 UTC.
        assert_eq!(
            start.date_time.unwrap().to_rfc3339(),
            "2024-01-15T14:00:00+00:00"
        );
    }

    #[test]
    fn test_event_body_reminders() {
        let event = shift_event_body(&shift());
        let reminders = event.reminders.unwrap();

        assert!(!reminders.use_default);
        let minutes: Vec<i64> = reminders.overrides.iter().map(|r| r.minutes).collect();
        assert_eq!(minutes, vec![90, 45]);
        assert!(reminders.overrides.iter().all(|r| r.method == "popup"));
    }
}
