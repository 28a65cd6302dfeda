//! Batch completion with project cascade and recurring-task regeneration.
//!
//! # Invariants
//! - Ids are processed one at a time in input order; the batch is not transactional.
//!   The first failing id stops the batch, earlier completions stay persisted.
//! - Children of a completed project share its `completed_at` and never regenerate.
//! - A successor's `recur_lineage_id` always names the root of the chain.
//! - A failed regeneration leaves the task completed and is reported next to it.

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use crate::recurrence::OccurrenceCalculator;
use crate::storage::TaskStore;
use log::{info, warn};
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteResult {
    pub completed_task: Task,
    pub next_task: Option<Task>,
    /// Set when the task was eligible to repeat but no successor could be created.
    pub regeneration_error: Option<AppError>,
}

/// Outcome of a batch: everything completed before the first failure, plus that failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionReport {
    pub results: Vec<CompleteResult>,
    pub error: Option<AppError>,
}

impl CompletionReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<CompleteResult>, AppError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}

pub struct CompletionOrchestrator<'a, S, C> {
    store: &'a mut S,
    clock: &'a C,
}

impl<'a, S: TaskStore, C: Clock> CompletionOrchestrator<'a, S, C> {
    pub fn new(store: &'a mut S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    pub fn complete<I: AsRef<str>>(&mut self, ids: &[I]) -> CompletionReport {
        let mut report = CompletionReport::default();
        for id in ids {
            match self.complete_one(id.as_ref()) {
                Ok(result) => report.results.push(result),
                Err(err) => {
                    warn!(
                        "event=batch_completion_halted id={} completed={} error={}",
                        id.as_ref(),
                        report.results.len(),
                        err
                    );
                    report.error = Some(err);
                    break;
                }
            }
        }
        report
    }

    fn complete_one(&mut self, id: &str) -> Result<CompleteResult, AppError> {
        let mut task = self.store.get(id)?;
        let now = self.clock.now();

        task.complete(now)?;
        self.store.update(&task)?;
        if task.is_container() {
            self.cascade(&task, now)?;
        }
        info!("event=task_completed id={} container={}", task.id, task.is_container());

        let mut result = CompleteResult {
            completed_task: task,
            next_task: None,
            regeneration_error: None,
        };
        if !is_regeneration_eligible(&result.completed_task, self.clock.today()) {
            return Ok(result);
        }

        match self.regenerate(&result.completed_task, now) {
            Ok(next) => {
                info!(
                    "event=task_regenerated id={} next_id={} lineage={}",
                    result.completed_task.id,
                    next.id,
                    next.recur_lineage_id.as_deref().unwrap_or("-")
                );
                result.next_task = Some(next);
            }
            Err(err) => {
                warn!(
                    "event=regeneration_failed id={} error={}",
                    result.completed_task.id, err
                );
                result.regeneration_error = Some(err);
            }
        }
        Ok(result)
    }

    fn cascade(&mut self, container: &Task, at: OffsetDateTime) -> Result<(), AppError> {
        for mut child in self.store.children(&container.id)? {
            if child.status == TaskStatus::Done {
                continue;
            }
            child.complete(at)?;
            self.store.update(&child)?;
        }
        Ok(())
    }

    fn regenerate(&mut self, task: &Task, now: OffsetDateTime) -> Result<Task, AppError> {
        let recurrence = task
            .recurrence()
            .ok_or_else(|| AppError::regeneration_failed(format!("task {} has no rule", task.id)))?
            .map_err(|err| {
                AppError::regeneration_failed(format!(
                    "stored rule of task {} is unreadable: {}",
                    task.id,
                    err.message()
                ))
            })?;

        let anchor = task.completed_at.unwrap_or(now);
        let next_date = OccurrenceCalculator::new(self.clock).next_occurrence(
            &recurrence.rule,
            recurrence.kind,
            anchor,
        );

        let successor = successor_of(task, next_date, now);
        self.store.create(&successor).map_err(|err| {
            AppError::regeneration_failed(format!(
                "could not create successor of task {}: {}",
                task.id, err
            ))
        })?;
        Ok(successor)
    }
}

/// Whether completing `task` should schedule its next occurrence.
pub fn is_regeneration_eligible(task: &Task, today: Date) -> bool {
    !task.is_container()
        && task.recur_rule.is_some()
        && !task.recur_paused
        && !task.recur_end.is_some_and(|end| end < today)
}

fn successor_of(task: &Task, next_date: Date, now: OffsetDateTime) -> Task {
    let mut next = Task::new(task.title.clone(), now);
    next.notes = task.notes.clone();
    if let Some(container_id) = task.container_id() {
        next.set_container(container_id);
    } else if let Some(area_id) = task.area_id() {
        next.set_area(area_id);
    }
    if task.due_date.is_some() {
        next.due_date = Some(next_date);
    } else {
        next.planned_date = Some(next_date);
    }
    next.recur_kind = task.recur_kind;
    next.recur_rule = task.recur_rule.clone();
    next.recur_end = task.recur_end;
    next.recur_lineage_id = Some(
        task.recur_lineage_id
            .clone()
            .unwrap_or_else(|| task.id.clone()),
    );
    next.tags = task.tags.clone();
    next
}
