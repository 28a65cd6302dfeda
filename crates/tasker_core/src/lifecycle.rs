//! Task lifecycle: `(active | someday) x (todo | done)`.
//!
//! # Invariants
//! - A someday task has no planned date.
//! - Setting a planned or due date wakes a someday task; clearing one never puts it back.
//! - `completed_at` is set exactly while the task is done.

use crate::error::AppError;
use crate::model::{Task, TaskState, TaskStatus};
use time::{Date, OffsetDateTime};

impl Task {
    /// Moves the task to someday and drops its planned date.
    pub fn defer(&mut self) {
        self.state = TaskState::Someday;
        self.planned_date = None;
    }

    pub fn activate(&mut self) {
        self.state = TaskState::Active;
    }

    pub fn set_planned_date(&mut self, date: Option<Date>) {
        self.planned_date = date;
        self.wake_if_scheduled(date);
    }

    pub fn set_due_date(&mut self, date: Option<Date>) {
        self.due_date = date;
        self.wake_if_scheduled(date);
    }

    fn wake_if_scheduled(&mut self, date: Option<Date>) {
        if date.is_some() && self.state == TaskState::Someday {
            self.state = TaskState::Active;
        }
    }

    pub fn complete(&mut self, at: OffsetDateTime) -> Result<(), AppError> {
        if self.status == TaskStatus::Done {
            return Err(AppError::invalid_input(format!(
                "task already completed: {}",
                self.id
            )));
        }
        self.status = TaskStatus::Done;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn uncomplete(&mut self) -> Result<(), AppError> {
        if self.status == TaskStatus::Todo {
            return Err(AppError::invalid_input(format!(
                "task is not completed: {}",
                self.id
            )));
        }
        self.status = TaskStatus::Todo;
        self.completed_at = None;
        Ok(())
    }
}
