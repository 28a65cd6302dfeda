use super::rule::{RecurrenceKind, Rule, Unit, WeekdayCode, ordinal_suffix};
use crate::calendar::parse_weekday;
use crate::error::AppError;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static RELATIVE_COMPACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)([dwmy]) after (?:done|completion)$").expect("valid relative compact regex")
});
static RELATIVE_WORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+) (days?|weeks?|months?|years?) after (?:done|completion)$")
        .expect("valid relative words regex")
});
static RELATIVE_AFTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^after (\d+) (days?|weeks?|months?|years?)$").expect("valid relative after regex")
});
static EVERY_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^every (day|week|month|year)$").expect("valid every unit regex"));
static EVERY_INTERVAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^every (\d+) (days?|weeks?|months?|years?)$").expect("valid every interval regex")
});
static EVERY_DAY_OF_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^every (\d{1,2})(st|nd|rd|th)$").expect("valid day of month regex")
});

/// A parsed recurrence phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub kind: RecurrenceKind,
    pub rule: Rule,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rule.format(self.kind))
    }
}

/// Parses a recurrence phrase such as `weekly`, `every mon,wed`, `every 15th` or
/// `3d after done`.
///
/// Relative forms are tried first because they are anchored by the word `after`.
/// Any phrase matching no form fails with a parse error naming the input.
pub fn parse_recurrence(input: &str) -> Result<Recurrence, AppError> {
    let normalized = input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        return Err(AppError::parse("recurrence", input));
    }

    let parsed = parse_relative(&normalized)
        .or_else(|| parse_keyword(&normalized))
        .or_else(|| parse_every_interval(&normalized))
        .or_else(|| parse_every_weekdays(&normalized))
        .or_else(|| parse_every_day_of_month(&normalized));

    match parsed {
        Some(Ok(recurrence)) => {
            debug!(
                "event=recurrence_parsed input={:?} kind={} rule={}",
                input,
                recurrence.kind.as_str(),
                recurrence.rule
            );
            Ok(recurrence)
        }
        Some(Err(_)) | None => Err(AppError::parse("recurrence", input)),
    }
}

type Attempt = Option<Result<Recurrence, AppError>>;

fn fixed(rule: Result<Rule, AppError>) -> Attempt {
    Some(rule.map(|rule| Recurrence {
        kind: RecurrenceKind::Fixed,
        rule,
    }))
}

fn parse_interval(digits: &str) -> Result<u32, AppError> {
    digits
        .parse::<u32>()
        .map_err(|_| AppError::invalid_input(format!("invalid interval: {digits}")))
}

fn parse_relative(phrase: &str) -> Attempt {
    let (digits, unit) = if let Some(caps) = RELATIVE_COMPACT_RE.captures(phrase) {
        (caps.get(1)?.as_str(), Unit::from_letter(caps.get(2)?.as_str())?)
    } else if let Some(caps) = RELATIVE_WORDS_RE
        .captures(phrase)
        .or_else(|| RELATIVE_AFTER_RE.captures(phrase))
    {
        (caps.get(1)?.as_str(), Unit::from_word(caps.get(2)?.as_str())?)
    } else {
        return None;
    };

    let rule = parse_interval(digits).and_then(|interval| Rule::every(interval, unit));
    Some(rule.map(|rule| Recurrence {
        kind: RecurrenceKind::Relative,
        rule,
    }))
}

fn parse_keyword(phrase: &str) -> Attempt {
    let (interval, unit) = match phrase {
        "daily" => (1, Unit::Day),
        "weekly" => (1, Unit::Week),
        "biweekly" => (2, Unit::Week),
        "monthly" => (1, Unit::Month),
        "yearly" => (1, Unit::Year),
        _ => return None,
    };
    fixed(Rule::every(interval, unit))
}

fn parse_every_interval(phrase: &str) -> Attempt {
    if let Some(caps) = EVERY_UNIT_RE.captures(phrase) {
        let unit = Unit::from_word(caps.get(1)?.as_str())?;
        return fixed(Rule::every(1, unit));
    }

    let caps = EVERY_INTERVAL_RE.captures(phrase)?;
    let unit = Unit::from_word(caps.get(2)?.as_str())?;
    fixed(parse_interval(caps.get(1)?.as_str()).and_then(|interval| Rule::every(interval, unit)))
}

fn parse_every_weekdays(phrase: &str) -> Attempt {
    let list = phrase.strip_prefix("every ")?;
    let mut weekdays = Vec::new();
    for token in list.split(',') {
        // One unknown token rejects the whole list.
        let weekday = parse_weekday(token.trim())?;
        weekdays.push(WeekdayCode::from(weekday));
    }
    fixed(Rule::on_weekdays(weekdays))
}

fn parse_every_day_of_month(phrase: &str) -> Attempt {
    let caps = EVERY_DAY_OF_MONTH_RE.captures(phrase)?;
    let day = caps.get(1)?.as_str().parse::<u8>().ok()?;
    if caps.get(2)?.as_str() != ordinal_suffix(day) {
        return None;
    }
    fixed(Rule::on_day_of_month(day))
}

#[cfg(test)]
mod tests {
    use super::parse_recurrence;
    use crate::recurrence::rule::{RecurrenceKind, Rule, Unit, WeekdayCode};

    #[test]
    fn parses_relative_forms() {
        let parsed = parse_recurrence("3d after done").unwrap();
        assert_eq!(parsed.kind, RecurrenceKind::Relative);
        assert_eq!(parsed.rule, Rule::every(3, Unit::Day).unwrap());

        let parsed = parse_recurrence("2 Weeks after completion").unwrap();
        assert_eq!(parsed.kind, RecurrenceKind::Relative);
        assert_eq!(parsed.rule, Rule::every(2, Unit::Week).unwrap());

        let parsed = parse_recurrence("  after 1 month ").unwrap();
        assert_eq!(parsed.kind, RecurrenceKind::Relative);
        assert_eq!(parsed.rule, Rule::every(1, Unit::Month).unwrap());
    }

    #[test]
    fn parses_fixed_keywords() {
        let cases = [
            ("daily", 1, Unit::Day),
            ("WEEKLY", 1, Unit::Week),
            ("biweekly", 2, Unit::Week),
            ("monthly", 1, Unit::Month),
            ("yearly", 1, Unit::Year),
        ];
        for (input, interval, unit) in cases {
            let parsed = parse_recurrence(input).unwrap();
            assert_eq!(parsed.kind, RecurrenceKind::Fixed, "{input}");
            assert_eq!(parsed.rule, Rule::every(interval, unit).unwrap(), "{input}");
        }
    }

    #[test]
    fn parses_fixed_intervals() {
        assert_eq!(
            parse_recurrence("every week").unwrap().rule,
            Rule::every(1, Unit::Week).unwrap()
        );
        assert_eq!(
            parse_recurrence("every 10 days").unwrap().rule,
            Rule::every(10, Unit::Day).unwrap()
        );
        assert_eq!(
            parse_recurrence("every 1 year").unwrap().rule,
            Rule::every(1, Unit::Year).unwrap()
        );
    }

    #[test]
    fn parses_weekday_sets() {
        let parsed = parse_recurrence("every mon,wed,fri").unwrap();
        assert_eq!(parsed.kind, RecurrenceKind::Fixed);
        assert_eq!(
            parsed.rule,
            Rule::on_weekdays([WeekdayCode::Mon, WeekdayCode::Wed, WeekdayCode::Fri]).unwrap()
        );

        let parsed = parse_recurrence("every Tuesday, thurs").unwrap();
        assert_eq!(
            parsed.rule,
            Rule::on_weekdays([WeekdayCode::Tue, WeekdayCode::Thu]).unwrap()
        );
    }

    #[test]
    fn weekday_set_with_unknown_token_fails() {
        let err = parse_recurrence("every mon,funday").unwrap_err();
        assert_eq!(err.code(), "parse_error");
        assert!(err.message().contains("every mon,funday"));
    }

    #[test]
    fn parses_day_of_month() {
        let parsed = parse_recurrence("every 15th").unwrap();
        assert_eq!(parsed.kind, RecurrenceKind::Fixed);
        assert_eq!(parsed.rule.interval(), 1);
        assert_eq!(parsed.rule.unit(), Unit::Month);
        assert_eq!(parsed.rule.day_of_month(), Some(15));
        assert_eq!(parsed.rule.to_json().unwrap(), r#"{"interval":1,"unit":"month","day":15}"#);

        assert_eq!(
            parse_recurrence("every 1st").unwrap().rule,
            Rule::on_day_of_month(1).unwrap()
        );
    }

    #[test]
    fn rejects_unknown_and_out_of_range_phrases() {
        for input in [
            "",
            "fortnightly",
            "every 0 days",
            "0d after done",
            "every 32nd",
            "every 0th",
            "every 1th",
            "every 2st",
            "every 23th",
            "3x after done",
            "every",
        ] {
            let err = parse_recurrence(input).unwrap_err();
            assert_eq!(err.code(), "parse_error", "{input}");
        }
    }

    #[test]
    fn format_round_trips_through_parser() {
        for input in ["every 2 weeks", "every mon,fri", "every 3rd", "5 days after completion"] {
            let parsed = parse_recurrence(input).unwrap();
            assert_eq!(parsed.to_string(), input);
            assert_eq!(parse_recurrence(&parsed.to_string()).unwrap(), parsed);
        }
        assert_eq!(parse_recurrence("every day").unwrap().to_string(), "daily");
    }
}
