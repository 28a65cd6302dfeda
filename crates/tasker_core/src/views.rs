//! Derived views computed from status, state, dates and placement.
//!
//! All comparisons are by calendar date against the caller's `today`. For an active todo
//! task, Inbox and Anytime cover the undated cases and Today / Upcoming the dated ones;
//! Someday and Logbook depend only on state and status.

use crate::error::AppError;
use crate::model::{Task, TaskState, TaskStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Inbox,
    Today,
    Upcoming,
    Anytime,
    Someday,
    Logbook,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Inbox,
        View::Today,
        View::Upcoming,
        View::Anytime,
        View::Someday,
        View::Logbook,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Today => "today",
            Self::Upcoming => "upcoming",
            Self::Anytime => "anytime",
            Self::Someday => "someday",
            Self::Logbook => "logbook",
        }
    }

    pub fn matches(self, task: &Task, today: Date) -> bool {
        match self {
            Self::Inbox => is_inbox(task),
            Self::Today => is_today(task, today),
            Self::Upcoming => is_upcoming(task, today),
            Self::Anytime => is_anytime(task),
            Self::Someday => is_someday(task),
            Self::Logbook => is_logbook(task),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == normalized)
            .ok_or_else(|| AppError::invalid_input(format!("unknown view: {value}")))
    }
}

fn is_active_todo(task: &Task) -> bool {
    task.status == TaskStatus::Todo && task.state == TaskState::Active
}

fn is_undated(task: &Task) -> bool {
    task.planned_date.is_none() && task.due_date.is_none()
}

pub fn is_today(task: &Task, today: Date) -> bool {
    is_active_todo(task)
        && (task.planned_date.is_some_and(|date| date <= today)
            || task.due_date.is_some_and(|date| date <= today))
}

pub fn is_upcoming(task: &Task, today: Date) -> bool {
    is_active_todo(task)
        && (task.planned_date.is_some_and(|date| date > today)
            || task.due_date.is_some_and(|date| date > today))
}

pub fn is_anytime(task: &Task) -> bool {
    is_active_todo(task) && is_undated(task) && task.has_placement()
}

pub fn is_inbox(task: &Task) -> bool {
    is_active_todo(task) && is_undated(task) && !task.has_placement()
}

pub fn is_someday(task: &Task) -> bool {
    task.status == TaskStatus::Todo && task.state == TaskState::Someday
}

pub fn is_logbook(task: &Task) -> bool {
    task.status == TaskStatus::Done
}

/// The single view a task is shown under when one has to be picked.
pub fn primary_view(task: &Task, today: Date) -> View {
    if is_logbook(task) {
        View::Logbook
    } else if is_someday(task) {
        View::Someday
    } else if is_today(task, today) {
        View::Today
    } else if is_upcoming(task, today) {
        View::Upcoming
    } else if is_anytime(task) {
        View::Anytime
    } else {
        View::Inbox
    }
}

/// Tasks belonging to `view`, in the order the view lists them.
pub fn filter_view(tasks: &[Task], view: View, today: Date) -> Vec<Task> {
    let mut filtered: Vec<Task> = tasks
        .iter()
        .filter(|task| view.matches(task, today))
        .cloned()
        .collect();
    sort_for_view(&mut filtered, view);
    filtered
}

fn earliest_date(task: &Task) -> Option<Date> {
    match (task.planned_date, task.due_date) {
        (Some(planned), Some(due)) => Some(planned.min(due)),
        (planned, due) => planned.or(due),
    }
}

fn sort_for_view(tasks: &mut [Task], view: View) {
    match view {
        View::Today | View::Upcoming => {
            tasks.sort_by_key(|task| (earliest_date(task), task.created_at))
        }
        View::Logbook => tasks.sort_by_key(|task| Reverse(task.completed_at)),
        View::Inbox | View::Anytime | View::Someday => tasks.sort_by_key(|task| task.created_at),
    }
}
