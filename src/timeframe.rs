use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Calendar month preceding (year, month), rolling over at January.
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Inclusive bounds of a calendar month: first day 00:00:00 through last day 23:59:59.
pub fn month_bounds(year: i32, month: u32) -> (NaiveDateTime, NaiveDateTime) {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("valid year/month")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid year/month")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
        - Duration::seconds(1);
    (start, end)
}

/// Wide-open range for all-time counts. Stays well inside the timestamp
/// range the database accepts.
pub fn all_time() -> (NaiveDateTime, NaiveDateTime) {
    let start = NaiveDate::from_ymd_opt(1970, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");
    let end = NaiveDate::from_ymd_opt(9999, 12, 31)
        .expect("valid date")
        .and_hms_opt(23, 59, 59)
        .expect("valid time");
    (start, end)
}

/// Midnight of the Monday that starts the week containing `ts`.
pub fn start_of_week_monday(ts: NaiveDateTime) -> NaiveDateTime {
    let date = ts.date();
    let back = date.weekday().num_days_from_monday() as i64;
    (date - Duration::days(back))
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
}

pub fn add_days(ts: NaiveDateTime, days: i64) -> NaiveDateTime {
    ts + Duration::days(days)
}

/// "Jun 3" style label used by the public dashboard.
pub fn short_date(date: NaiveDate) -> String {
    format!("{} {}", date.format("%b"), date.day())
}

/// "Jun 3–Jun 9" label for a week starting at `start` (exclusive end 7 days later).
pub fn week_label(start: NaiveDateTime) -> String {
    let last_day = (start + Duration::days(6)).date();
    format!("{}–{}", short_date(start.date()), short_date(last_day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn previous_month_rolls_over_at_january() {
        assert_eq!(previous_month(2026, 1), (2025, 12));
        assert_eq!(previous_month(2026, 7), (2026, 6));
    }

    #[test]
    fn month_bounds_are_inclusive_of_last_second() {
        let (start, end) = month_bounds(2026, 2);
        assert_eq!(start, dt(2026, 2, 1, 0));
        // 2026 is not a leap year
        assert_eq!(end, dt(2026, 2, 28, 23) + Duration::minutes(59) + Duration::seconds(59));

        let (_, leap_end) = month_bounds(2024, 2);
        assert_eq!(leap_end.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, dec_end) = month_bounds(2026, 12);
        assert_eq!(dec_end.date(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn week_starts_on_monday() {
        // 2026-08-31 is a Monday
        assert_eq!(start_of_week_monday(dt(2026, 8, 31, 15)), dt(2026, 8, 31, 0));
        // Sunday belongs to the week that started six days earlier
        assert_eq!(start_of_week_monday(dt(2026, 9, 6, 3)), dt(2026, 8, 31, 0));
        assert_eq!(start_of_week_monday(dt(2026, 9, 2, 0)), dt(2026, 8, 31, 0));
    }

    #[test]
    fn week_label_spans_monday_to_sunday() {
        assert_eq!(week_label(dt(2026, 8, 31, 0)), "Aug 31–Sep 6");
    }
}
