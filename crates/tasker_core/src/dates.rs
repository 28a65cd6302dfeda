//! Natural-language date expressions (`2025-03-01`, `today`, `+2w`, `next fri`).

use crate::calendar::{add_days, add_months, next_weekday_after, parse_weekday};
use crate::error::AppError;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));
static OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+(\d+)([dwm])$").expect("valid offset regex"));

/// Parses `input` relative to `now`.
///
/// Forms, first match wins: ISO `YYYY-MM-DD`, `today` / `tomorrow`, `+N{d|w|m}`, and a
/// weekday name optionally prefixed with `next`. A weekday always resolves to a date
/// strictly after today.
pub fn parse_date(input: &str, now: OffsetDateTime) -> Result<Date, AppError> {
    let normalized = input.trim().to_lowercase();
    let today = now.date();

    let parsed = if ISO_DATE_RE.is_match(&normalized) {
        Date::parse(&normalized, format_description!("[year]-[month]-[day]")).ok()
    } else {
        match normalized.as_str() {
            "today" => Some(today),
            "tomorrow" => Some(add_days(today, 1)),
            other => parse_offset(other, today).or_else(|| parse_named_weekday(other, today)),
        }
    };

    match parsed {
        Some(date) => {
            debug!("event=date_parsed input={:?} today={} date={}", input, today, date);
            Ok(date)
        }
        None => Err(AppError::parse("date", input)),
    }
}

fn parse_offset(expr: &str, today: Date) -> Option<Date> {
    let caps = OFFSET_RE.captures(expr)?;
    let amount: u32 = caps.get(1)?.as_str().parse().ok()?;
    let date = match caps.get(2)?.as_str() {
        "d" => add_days(today, i64::from(amount)),
        "w" => add_days(today, i64::from(amount) * 7),
        "m" => add_months(today, amount),
        _ => return None,
    };
    Some(date)
}

fn parse_named_weekday(expr: &str, today: Date) -> Option<Date> {
    let name = expr.strip_prefix("next ").map(str::trim).unwrap_or(expr);
    parse_weekday(name).map(|weekday| next_weekday_after(today, weekday))
}
