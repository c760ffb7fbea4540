use chrono::{Datelike, Duration, NaiveDate};

use ombrelle_core::Repetition;

/// Compute the next due date for a reminder that just fired on `date`.
///
/// Returns `None` for [`Repetition::None`]: the reminder is exhausted and
/// must not be advanced.
///
/// `Monthly` holds the day-of-month and clamps to the last day when the
/// target month is shorter: Jan 31 → Feb 28 (Feb 29 in a leap year),
/// with year rollover at December.
pub fn next_occurrence(date: NaiveDate, repetition: Repetition) -> Option<NaiveDate> {
    match repetition {
        Repetition::None => None,
        Repetition::Daily => Some(date + Duration::days(1)),
        Repetition::Weekly => Some(date + Duration::days(7)),
        Repetition::Monthly => {
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            let day = date.day().min(days_in_month(year, month));
            NaiveDate::from_ymd_opt(year, month, day)
        }
    }
}

/// Number of days in `month` of `year`: first of the following month, minus
/// one day.
fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}
