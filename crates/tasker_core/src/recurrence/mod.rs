//! Recurrence rules: parsing phrases, persisting rules, and stepping to the next date.

pub mod occurrence;
pub mod parse;
pub mod rule;

pub use occurrence::{OccurrenceCalculator, next_occurrence_from};
pub use parse::{Recurrence, parse_recurrence};
pub use rule::{RecurrenceKind, Rule, Unit, WeekdayCode};
