//! Calendar arithmetic shared by the date and recurrence parsers.

use time::{Date, Duration, Month, Weekday};

pub fn add_days(date: Date, days: i64) -> Date {
    date.saturating_add(Duration::days(days))
}

/// Adds whole months, clamping the day to the length of the target month.
pub fn add_months(date: Date, months: u32) -> Date {
    let index = i64::from(date.year()) * 12 + i64::from(u8::from(date.month()) - 1) + i64::from(months);
    let year = match i32::try_from(index.div_euclid(12)) {
        Ok(year) => year,
        Err(_) => return Date::MAX,
    };
    let month = Month::January.nth_next(index.rem_euclid(12) as u8);
    clamped_date(year, month, date.day())
}

pub fn add_years(date: Date, years: u32) -> Date {
    add_months(date, years.saturating_mul(12))
}

/// Builds `year-month-day`, pulling `day` back to the last day of the month when it overflows.
pub fn clamped_date(year: i32, month: Month, day: u8) -> Date {
    let last = time::util::days_in_year_month(year, month);
    Date::from_calendar_date(year, month, day.clamp(1, last)).unwrap_or(Date::MAX)
}

/// Days from `from` forward to the next `to`, in `1..=7`. Never zero.
pub fn days_until(from: Weekday, to: Weekday) -> u8 {
    let gap = (to.number_days_from_monday() + 7 - from.number_days_from_monday()) % 7;
    if gap == 0 { 7 } else { gap }
}

/// Next date strictly after `date` that falls on `weekday`.
pub fn next_weekday_after(date: Date, weekday: Weekday) -> Date {
    add_days(date, i64::from(days_until(date.weekday(), weekday)))
}

/// Resolves an English weekday name or common abbreviation.
pub fn parse_weekday(token: &str) -> Option<Weekday> {
    let weekday = match token {
        "mon" | "monday" => Weekday::Monday,
        "tue" | "tues" | "tuesday" => Weekday::Tuesday,
        "wed" | "weds" | "wednesday" => Weekday::Wednesday,
        "thu" | "thur" | "thurs" | "thursday" => Weekday::Thursday,
        "fri" | "friday" => Weekday::Friday,
        "sat" | "saturday" => Weekday::Saturday,
        "sun" | "sunday" => Weekday::Sunday,
        _ => return None,
    };
    Some(weekday)
}
