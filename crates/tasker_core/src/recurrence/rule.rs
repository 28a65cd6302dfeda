use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use time::Weekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Accepts the singular or plural unit word.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.strip_suffix('s').unwrap_or(word) {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "d" => Some(Self::Day),
            "w" => Some(Self::Week),
            "m" => Some(Self::Month),
            "y" => Some(Self::Year),
            _ => None,
        }
    }

    fn label(self, count: u32) -> String {
        if count == 1 {
            self.as_str().to_string()
        } else {
            format!("{}s", self.as_str())
        }
    }
}

/// Weekday as persisted in rule JSON (`"mon"` .. `"sun"`), ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayCode {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl WeekdayCode {
    pub fn code(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Self::Mon => Weekday::Monday,
            Self::Tue => Weekday::Tuesday,
            Self::Wed => Weekday::Wednesday,
            Self::Thu => Weekday::Thursday,
            Self::Fri => Weekday::Friday,
            Self::Sat => Weekday::Saturday,
            Self::Sun => Weekday::Sunday,
        }
    }
}

impl From<Weekday> for WeekdayCode {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Monday => Self::Mon,
            Weekday::Tuesday => Self::Tue,
            Weekday::Wednesday => Self::Wed,
            Weekday::Thursday => Self::Thu,
            Weekday::Friday => Self::Fri,
            Weekday::Saturday => Self::Sat,
            Weekday::Sunday => Self::Sun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    /// Follows the calendar regardless of when the task gets completed.
    Fixed,
    /// Counted from the completion instant.
    Relative,
}

impl RecurrenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Relative => "relative",
        }
    }
}

/// Structured recurrence rule.
///
/// # Invariants
/// - `interval` is at least 1.
/// - At most one of `weekdays` and `day_of_month` is populated; `weekdays` only with
///   `Unit::Week`, `day_of_month` (1..=31) only with `Unit::Month`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRule", into = "StoredRule")]
pub struct Rule {
    interval: u32,
    unit: Unit,
    weekdays: BTreeSet<WeekdayCode>,
    day_of_month: Option<u8>,
}

/// Persisted JSON shape of a rule.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRule {
    interval: u32,
    unit: Unit,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    weekdays: Vec<WeekdayCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day: Option<u8>,
}

impl TryFrom<StoredRule> for Rule {
    type Error = AppError;

    fn try_from(value: StoredRule) -> Result<Self, Self::Error> {
        let rule = Rule {
            interval: value.interval,
            unit: value.unit,
            weekdays: value.weekdays.into_iter().collect(),
            day_of_month: value.day,
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl From<Rule> for StoredRule {
    fn from(value: Rule) -> Self {
        StoredRule {
            interval: value.interval,
            unit: value.unit,
            weekdays: value.weekdays.into_iter().collect(),
            day: value.day_of_month,
        }
    }
}

impl Rule {
    pub fn every(interval: u32, unit: Unit) -> Result<Self, AppError> {
        let rule = Rule {
            interval,
            unit,
            weekdays: BTreeSet::new(),
            day_of_month: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn on_weekdays<I>(weekdays: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = WeekdayCode>,
    {
        let rule = Rule {
            interval: 1,
            unit: Unit::Week,
            weekdays: weekdays.into_iter().collect(),
            day_of_month: None,
        };
        if rule.weekdays.is_empty() {
            return Err(AppError::invalid_input("weekday rule needs at least one weekday"));
        }
        rule.validate()?;
        Ok(rule)
    }

    pub fn on_day_of_month(day: u8) -> Result<Self, AppError> {
        let rule = Rule {
            interval: 1,
            unit: Unit::Month,
            weekdays: BTreeSet::new(),
            day_of_month: Some(day),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn weekdays(&self) -> &BTreeSet<WeekdayCode> {
        &self.weekdays
    }

    pub fn day_of_month(&self) -> Option<u8> {
        self.day_of_month
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.interval == 0 {
            return Err(AppError::invalid_input("rule interval must be at least 1"));
        }
        if !self.weekdays.is_empty() && self.day_of_month.is_some() {
            return Err(AppError::invalid_input(
                "rule cannot set both weekdays and day of month",
            ));
        }
        if !self.weekdays.is_empty() && self.unit != Unit::Week {
            return Err(AppError::invalid_input("weekdays require unit 'week'"));
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(AppError::invalid_input(format!(
                    "day of month out of range: {day}"
                )));
            }
            if self.unit != Unit::Month {
                return Err(AppError::invalid_input("day of month requires unit 'month'"));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self).map_err(|err| AppError::invalid_data(err.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|err| AppError::invalid_data(format!("invalid rule JSON '{raw}': {err}")))
    }

    /// Canonical human phrase for this rule under `kind`.
    pub fn format(&self, kind: RecurrenceKind) -> String {
        match kind {
            RecurrenceKind::Relative => format!(
                "{} {} after completion",
                self.interval,
                self.unit.label(self.interval)
            ),
            RecurrenceKind::Fixed => self.to_string(),
        }
    }
}

impl fmt::Display for Rule {
    /// Fixed-schedule phrase: `daily`, `every 3 days`, `every mon,fri`, `every 15th`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.weekdays.is_empty() {
            let codes: Vec<&str> = self.weekdays.iter().map(|day| day.code()).collect();
            return write!(f, "every {}", codes.join(","));
        }
        if let Some(day) = self.day_of_month {
            return write!(f, "every {day}{}", ordinal_suffix(day));
        }
        if self.interval == 1 {
            let keyword = match self.unit {
                Unit::Day => "daily",
                Unit::Week => "weekly",
                Unit::Month => "monthly",
                Unit::Year => "yearly",
            };
            return f.write_str(keyword);
        }
        write!(f, "every {} {}", self.interval, self.unit.label(self.interval))
    }
}

pub(crate) fn ordinal_suffix(day: u8) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::{RecurrenceKind, Rule, Unit, WeekdayCode};

    #[test]
    fn json_shape_is_stable() {
        let rule = Rule::on_day_of_month(15).unwrap();
        assert_eq!(
            rule.to_json().unwrap(),
            r#"{"interval":1,"unit":"month","day":15}"#
        );

        let rule = Rule::on_weekdays([WeekdayCode::Fri, WeekdayCode::Mon]).unwrap();
        assert_eq!(
            rule.to_json().unwrap(),
            r#"{"interval":1,"unit":"week","weekdays":["mon","fri"]}"#
        );

        let rule = Rule::every(3, Unit::Day).unwrap();
        assert_eq!(rule.to_json().unwrap(), r#"{"interval":3,"unit":"day"}"#);
    }

    #[test]
    fn json_round_trip_preserves_rule() {
        let rules = [
            Rule::every(1, Unit::Year).unwrap(),
            Rule::every(2, Unit::Week).unwrap(),
            Rule::on_weekdays([WeekdayCode::Sun, WeekdayCode::Wed, WeekdayCode::Sat]).unwrap(),
            Rule::on_day_of_month(31).unwrap(),
        ];

        for rule in rules {
            let restored = Rule::from_json(&rule.to_json().unwrap()).unwrap();
            assert_eq!(restored, rule);
        }
    }

    #[test]
    fn from_json_rejects_conflicting_refinements() {
        let err = Rule::from_json(r#"{"interval":1,"unit":"week","weekdays":["mon"],"day":3}"#)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_data");

        let err = Rule::from_json(r#"{"interval":0,"unit":"day"}"#).unwrap_err();
        assert_eq!(err.code(), "invalid_data");

        let err = Rule::from_json(r#"{"interval":1,"unit":"month","day":32}"#).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn format_uses_keywords_for_single_intervals() {
        assert_eq!(Rule::every(1, Unit::Day).unwrap().format(RecurrenceKind::Fixed), "daily");
        assert_eq!(
            Rule::every(2, Unit::Week).unwrap().format(RecurrenceKind::Fixed),
            "every 2 weeks"
        );
        assert_eq!(
            Rule::on_day_of_month(22).unwrap().format(RecurrenceKind::Fixed),
            "every 22nd"
        );
        assert_eq!(
            Rule::on_day_of_month(11).unwrap().format(RecurrenceKind::Fixed),
            "every 11th"
        );
        assert_eq!(
            Rule::every(1, Unit::Day).unwrap().format(RecurrenceKind::Relative),
            "1 day after completion"
        );
        assert_eq!(
            Rule::every(3, Unit::Month).unwrap().format(RecurrenceKind::Relative),
            "3 months after completion"
        );
    }
}
