//! Reconciling scraped schedule truth against existing calendar events.

use chrono_tz::Tz;

use crate::event::{CalendarEvent, SHIFT_SUMMARY};
use crate::schedule::Schedule;

/// An explicit partition of the work one sync pass must do.
///
/// Computed from an immutable truth snapshot: `to_delete` holds the ids of
/// owned events whose times no longer match the portal, `to_create` every
/// shift with no up-to-date event on the calendar.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub to_delete: Vec<String>,
    pub to_create: Schedule,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }
}

/// Compare existing calendar events against the scraped truth.
///
/// Only events whose summary is exactly [`SHIFT_SUMMARY`], with both instants
/// present, and whose start date (in `tz`) has an entry in `truth` are
/// considered. An exact start+end match means that day is already satisfied;
/// any mismatch schedules the event for deletion and leaves the shift in the
/// create set so it is recreated. Everything else is left untouched: other
/// summaries are not ours, and days absent from `truth` may be events the
/// user added by hand.
pub fn reconcile(existing: &[CalendarEvent], truth: &Schedule, tz: Tz) -> ReconcilePlan {
    let mut to_create = truth.clone();
    let mut to_delete = Vec::new();

    for event in existing {
        if event.summary != SHIFT_SUMMARY {
            continue;
        }

        let (Some(start), Some(end)) = (event.start, event.end) else {
            continue;
        };

        let key = start.with_timezone(&tz).format("%Y%m%d").to_string();
        let Some(shift) = truth.get(&key) else {
            continue;
        };

        // Instant comparison is exact: a one-minute difference is stale.
        if shift.start == start && shift.end == end {
            to_create.remove(&key);
        } else {
            to_delete.push(event.id.clone());
        }
    }

    ReconcilePlan {
        to_delete,
        to_create,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::WorkShift;
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use chrono_tz::America::New_York;

    fn shift(day: u32, start: (u32, u32), end: (u32, u32)) -> WorkShift {
        WorkShift::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            New_York,
        )
        .unwrap()
    }

    fn truth_of(shifts: Vec<WorkShift>) -> Schedule {
        shifts.into_iter().map(|s| (s.date_key(), s)).collect()
    }

    fn event_matching(shift: &WorkShift, id: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            summary: SHIFT_SUMMARY.to_string(),
            start: Some(shift.start.with_timezone(&Utc)),
            end: Some(shift.end.with_timezone(&Utc)),
        }
    }

    fn instant(s: &str) -> Option<DateTime<Utc>> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_empty_calendar_creates_everything() {
        let truth = truth_of(vec![shift(15, (9, 0), (17, 0)), shift(16, (12, 0), (20, 0))]);
        let plan = reconcile(&[], &truth, New_York);

        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_create.len(), 2);
    }

    #[test]
    fn test_exact_match_is_neither_deleted_nor_recreated() {
        let truth = truth_of(vec![shift(15, (9, 0), (17, 0))]);
        let existing = vec![event_matching(&truth["20240115"], "ev1")];

        let plan = reconcile(&existing, &truth, New_York);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_stale_event_is_deleted_and_recreated() {
        // Truth says Jan 15 is 9:00-17:00; the calendar has 9:00-17:30.
        let truth = truth_of(vec![shift(15, (9, 0), (17, 0))]);
        let existing = vec![CalendarEvent {
            id: "stale".to_string(),
            summary: SHIFT_SUMMARY.to_string(),
            start: instant("2024-01-15T14:00:00Z"),
            end: instant("2024-01-15T22:30:00Z"),
        }];

        let plan = reconcile(&existing, &truth, New_York);
        assert_eq!(plan.to_delete, vec!["stale".to_string()]);
        assert!(plan.to_create.contains_key("20240115"));
    }

    #[test]
    fn test_other_summaries_are_never_touched() {
        let truth = truth_of(vec![shift(15, (9, 0), (17, 0))]);
        let existing = vec![CalendarEvent {
            id: "dentist".to_string(),
            summary: "Dentist".to_string(),
            start: instant("2024-01-15T15:00:00Z"),
            end: instant("2024-01-15T16:00:00Z"),
        }];

        let plan = reconcile(&existing, &truth, New_York);
        assert!(plan.to_delete.is_empty());
        // The shift itself still gets created; the dentist appointment is
        // simply not ours.
        assert!(plan.to_create.contains_key("20240115"));
    }

    #[test]
    fn test_event_without_truth_entry_is_left_alone() {
        // An owned event on a day the portal no longer lists: deliberately
        // kept, so manually added events are never destroyed.
        let orphan = event_matching(&shift(16, (9, 0), (17, 0)), "orphan");
        let truth = truth_of(vec![shift(15, (9, 0), (17, 0))]);

        let plan = reconcile(&[orphan], &truth, New_York);
        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_create.keys().collect::<Vec<_>>(), vec!["20240115"]);
    }

    #[test]
    fn test_all_day_events_are_ignored() {
        let truth = truth_of(vec![shift(15, (9, 0), (17, 0))]);
        let existing = vec![CalendarEvent {
            id: "allday".to_string(),
            summary: SHIFT_SUMMARY.to_string(),
            start: None,
            end: None,
        }];

        let plan = reconcile(&existing, &truth, New_York);
        assert!(plan.to_delete.is_empty());
        assert!(plan.to_create.contains_key("20240115"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let truth = truth_of(vec![
            shift(15, (9, 0), (17, 0)),
            shift(16, (12, 0), (20, 0)),
            shift(17, (10, 0), (18, 30)),
        ]);

        let existing = vec![
            // Up to date.
            event_matching(&truth["20240115"], "ev15"),
            // Stale: wrong end time.
            CalendarEvent {
                end: instant("2024-01-16T23:00:00Z"),
                ..event_matching(&truth["20240116"], "ev16")
            },
            // Jan 17 missing entirely.
        ];

        let first = reconcile(&existing, &truth, New_York);
        assert_eq!(first.to_delete, vec!["ev16".to_string()]);
        assert_eq!(
            first.to_create.keys().collect::<Vec<_>>(),
            vec!["20240116", "20240117"]
        );

        // Reflect the applied plan back as the calendar's state: the stale
        // event is gone and every created shift now has a matching event.
        let after: Vec<CalendarEvent> = existing
            .iter()
            .filter(|e| !first.to_delete.contains(&e.id))
            .cloned()
            .chain(
                first
                    .to_create
                    .values()
                    .map(|s| event_matching(s, "created")),
            )
            .collect();

        let second = reconcile(&after, &truth, New_York);
        assert!(second.is_empty());
    }
}
