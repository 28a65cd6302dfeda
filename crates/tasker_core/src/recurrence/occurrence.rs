use super::rule::{RecurrenceKind, Rule, Unit};
use crate::calendar::{add_days, add_months, add_years, clamped_date, days_until};
use crate::clock::Clock;
use log::debug;
use time::{Date, OffsetDateTime};

/// Computes next occurrence dates, reading "today" from its clock for fixed schedules.
pub struct OccurrenceCalculator<C> {
    clock: C,
}

impl<C: Clock> OccurrenceCalculator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn next_occurrence(&self, rule: &Rule, kind: RecurrenceKind, anchor: OffsetDateTime) -> Date {
        next_occurrence_from(rule, kind, anchor, self.clock.today())
    }
}

/// Next occurrence of `rule`.
///
/// Relative rules add the interval to `anchor`. Fixed rules ignore `anchor` and step
/// forward from `today`, so a schedule never drifts with completion time.
pub fn next_occurrence_from(
    rule: &Rule,
    kind: RecurrenceKind,
    anchor: OffsetDateTime,
    today: Date,
) -> Date {
    let next = match kind {
        RecurrenceKind::Relative => add_interval(anchor.date(), rule.interval(), rule.unit()),
        RecurrenceKind::Fixed => next_fixed(rule, today),
    };
    debug!(
        "event=next_occurrence kind={} rule={} anchor={} today={} next={}",
        kind.as_str(),
        rule,
        anchor,
        today,
        next
    );
    next
}

fn next_fixed(rule: &Rule, today: Date) -> Date {
    if !rule.weekdays().is_empty() {
        let offset = rule
            .weekdays()
            .iter()
            .map(|code| days_until(today.weekday(), code.weekday()))
            .min()
            .unwrap_or(7);
        return add_days(today, i64::from(offset));
    }

    if let Some(day) = rule.day_of_month() {
        if today.day() < day {
            return clamped_date(today.year(), today.month(), day);
        }
        let next_month = add_months(today.replace_day(1).unwrap_or(today), 1);
        return clamped_date(next_month.year(), next_month.month(), day);
    }

    add_interval(today, rule.interval(), rule.unit())
}

fn add_interval(date: Date, interval: u32, unit: Unit) -> Date {
    match unit {
        Unit::Day => add_days(date, i64::from(interval)),
        Unit::Week => add_days(date, i64::from(interval) * 7),
        Unit::Month => add_months(date, interval),
        Unit::Year => add_years(date, interval),
    }
}
