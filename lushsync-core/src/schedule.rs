//! Month-view markup parsing into a keyed schedule.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use scraper::{Html, Selector};

use crate::error::ShiftParseError;
use crate::shift::{parse_time_range, WorkShift};

/// Schedule truth for one run: `YYYYMMDD` -> shift, at most one per day.
///
/// Built fresh on every run, never persisted.
pub type Schedule = BTreeMap<String, WorkShift>;

/// Extract shifts from one captured month view.
///
/// Walks the week rows inside the schedule container and their day cells.
/// A cell's first text line is the numeric day-of-month, its last line the
/// shift text. Cells with no shift text are skipped, as are days below
/// `min_day` (pass the current day-of-month for the current month, `None`
/// for a future month). A malformed cell drops that single day with a
/// console note; it never aborts the rest of the month.
pub fn parse_month(markup: &str, year: i32, month: u32, min_day: Option<u32>, tz: Tz) -> Schedule {
    let document = Html::parse_document(markup);
    let week_rows = Selector::parse(r#"[data-bind="foreach: ScheduleWeeks"] tr"#).unwrap();
    let day_cells = Selector::parse("td").unwrap();

    let mut schedule = Schedule::new();

    for row in document.select(&week_rows) {
        for cell in row.select(&day_cells) {
            let lines: Vec<&str> = cell
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();

            match parse_day_cell(&lines, year, month, min_day, tz) {
                Ok(Some(shift)) => {
                    let key = shift.date_key();
                    if schedule.insert(key.clone(), shift).is_some() {
                        eprintln!("Note: multiple shifts on {}, keeping the last one", key);
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("Skipping a day cell in {}-{:02}: {}", year, month, e),
            }
        }
    }

    schedule
}

/// One day cell, already reduced to its non-empty text lines.
///
/// `Ok(None)` means nothing to schedule: a blank or day-number-only cell, or
/// a day filtered out as already past.
fn parse_day_cell(
    lines: &[&str],
    year: i32,
    month: u32,
    min_day: Option<u32>,
    tz: Tz,
) -> Result<Option<WorkShift>, ShiftParseError> {
    if lines.len() <= 1 {
        return Ok(None);
    }

    let day: u32 = lines[0]
        .parse()
        .map_err(|_| ShiftParseError::BadDayNumber(lines[0].to_string()))?;

    if let Some(min_day) = min_day {
        if day < min_day {
            return Ok(None);
        }
    }

    let (start_time, end_time) = parse_time_range(lines[lines.len() - 1])?;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(ShiftParseError::NoSuchDate { year, month, day })?;

    WorkShift::new(date, start_time, end_time, tz).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use chrono_tz::America::New_York;

    const MONTH_FIXTURE: &str = r#"
        <html><body>
        <div class="schedule-view">
          <table data-bind="foreach: ScheduleWeeks">
            <tr>
              <td>14</td>
              <td>15<br>9:00 AM - 5:00 PM</td>
              <td>16<br>4:30 PM - 9:30 PM</td>
              <td>17<br>off sick</td>
              <td></td>
            </tr>
            <tr>
              <td>21<br>12:00 PM - 8:00 PM</td>
            </tr>
          </table>
        </div>
        </body></html>
    "#;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_month_collects_shift_cells() {
        let schedule = parse_month(MONTH_FIXTURE, 2024, 5, None, New_York);

        assert_eq!(
            schedule.keys().collect::<Vec<_>>(),
            vec!["20240515", "20240516", "20240521"]
        );

        let shift = &schedule["20240516"];
        assert_eq!(shift.start_time, time(16, 30));
        assert_eq!(shift.end_time, time(21, 30));
        assert_eq!(shift.date, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
    }

    #[test]
    fn test_day_number_only_cell_yields_no_entry() {
        let schedule = parse_month(MONTH_FIXTURE, 2024, 5, None, New_York);
        assert!(!schedule.contains_key("20240514"));
    }

    #[test]
    fn test_malformed_cell_is_dropped_without_aborting() {
        // "17 off sick" has no time range, but 15/16/21 still parse.
        let schedule = parse_month(MONTH_FIXTURE, 2024, 5, None, New_York);
        assert!(!schedule.contains_key("20240517"));
        assert_eq!(schedule.len(), 3);
    }

    #[test]
    fn test_min_day_filters_past_days() {
        let schedule = parse_month(MONTH_FIXTURE, 2024, 5, Some(16), New_York);

        assert_eq!(
            schedule.keys().collect::<Vec<_>>(),
            vec!["20240516", "20240521"]
        );
    }

    #[test]
    fn test_future_month_is_not_day_filtered() {
        // The same markup parsed as a future month keeps day 15 even when
        // "today" would be the 16th in the current month.
        let schedule = parse_month(MONTH_FIXTURE, 2024, 6, None, New_York);
        assert!(schedule.contains_key("20240615"));
    }

    #[test]
    fn test_double_shift_day_keeps_the_last_cell() {
        let markup = r#"
            <table data-bind="foreach: ScheduleWeeks">
              <tr>
                <td>18<br>9:00 AM - 1:00 PM</td>
                <td>18<br>2:00 PM - 6:00 PM</td>
              </tr>
            </table>
        "#;

        let schedule = parse_month(markup, 2024, 5, None, New_York);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule["20240518"].start_time, time(14, 0));
    }

    #[test]
    fn test_nonexistent_date_is_dropped() {
        let markup = r#"
            <table data-bind="foreach: ScheduleWeeks">
              <tr>
                <td>30<br>9:00 AM - 5:00 PM</td>
                <td>28<br>9:00 AM - 5:00 PM</td>
              </tr>
            </table>
        "#;

        // February 30th does not exist; the 28th still parses.
        let schedule = parse_month(markup, 2023, 2, None, New_York);
        assert_eq!(schedule.keys().collect::<Vec<_>>(), vec!["20230228"]);
    }

    #[test]
    fn test_markup_without_schedule_container_is_empty() {
        let schedule = parse_month("<html><body><p>login</p></body></html>", 2024, 5, None, New_York);
        assert!(schedule.is_empty());
    }
}
