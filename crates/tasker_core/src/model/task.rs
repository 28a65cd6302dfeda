use crate::error::AppError;
use crate::recurrence::{Recurrence, RecurrenceKind, Rule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Task,
    /// Container whose children are the tasks pointing at it through `container_id`.
    Project,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Active,
    Someday,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub kind: TaskKind,
    #[serde(default)]
    container_id: Option<String>,
    #[serde(default)]
    area_id: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub planned_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub due_date: Option<Date>,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub recur_kind: Option<RecurrenceKind>,
    /// Rule JSON exactly as persisted; parsed lazily on regeneration.
    #[serde(default)]
    pub recur_rule: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub recur_end: Option<Date>,
    #[serde(default)]
    pub recur_paused: bool,
    /// Root task of the recurrence chain; never points at an intermediate successor.
    #[serde(default)]
    pub recur_lineage_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Task {
    /// Creates an active todo task with a fresh id.
    pub fn new(title: impl Into<String>, created_at: OffsetDateTime) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, created_at)
    }

    pub fn with_id(id: impl Into<String>, title: impl Into<String>, created_at: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            notes: None,
            kind: TaskKind::Task,
            container_id: None,
            area_id: None,
            planned_date: None,
            due_date: None,
            state: TaskState::Active,
            status: TaskStatus::Todo,
            created_at,
            completed_at: None,
            recur_kind: None,
            recur_rule: None,
            recur_end: None,
            recur_paused: false,
            recur_lineage_id: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind == TaskKind::Project
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn area_id(&self) -> Option<&str> {
        self.area_id.as_deref()
    }

    pub fn has_placement(&self) -> bool {
        self.container_id.is_some() || self.area_id.is_some()
    }

    /// Moves the task under a project. Clears any area.
    pub fn set_container(&mut self, container_id: impl Into<String>) {
        self.container_id = Some(container_id.into());
        self.area_id = None;
    }

    /// Moves the task into an area. Clears any project.
    pub fn set_area(&mut self, area_id: impl Into<String>) {
        self.area_id = Some(area_id.into());
        self.container_id = None;
    }

    pub fn clear_placement(&mut self) {
        self.container_id = None;
        self.area_id = None;
    }

    pub fn is_recurring(&self) -> bool {
        self.recur_rule.is_some()
    }

    pub fn set_recurrence(&mut self, kind: RecurrenceKind, rule: &Rule) -> Result<(), AppError> {
        self.recur_rule = Some(rule.to_json()?);
        self.recur_kind = Some(kind);
        Ok(())
    }

    /// Drops the schedule. The lineage pointer stays so history remains linked.
    pub fn clear_recurrence(&mut self) {
        self.recur_kind = None;
        self.recur_rule = None;
        self.recur_end = None;
        self.recur_paused = false;
    }

    pub fn pause_recurrence(&mut self) -> Result<(), AppError> {
        self.require_recurrence()?;
        self.recur_paused = true;
        Ok(())
    }

    pub fn resume_recurrence(&mut self) -> Result<(), AppError> {
        self.require_recurrence()?;
        self.recur_paused = false;
        Ok(())
    }

    fn require_recurrence(&self) -> Result<(), AppError> {
        if self.is_recurring() {
            Ok(())
        } else {
            Err(AppError::invalid_input(format!(
                "task has no recurrence: {}",
                self.id
            )))
        }
    }

    /// Decodes the stored recurrence, if any.
    pub fn recurrence(&self) -> Option<Result<Recurrence, AppError>> {
        let raw = self.recur_rule.as_deref()?;
        let kind = self.recur_kind.unwrap_or(RecurrenceKind::Fixed);
        Some(Rule::from_json(raw).map(|rule| Recurrence { kind, rule }))
    }

    /// Adds a normalized tag. Returns `false` when it was already present.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, AppError> {
        Ok(self.tags.insert(normalize_tag(tag)?))
    }

    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, AppError> {
        Ok(self.tags.remove(&normalize_tag(tag)?))
    }

    /// Checks the invariants the storage boundary enforces on every write.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::constraint("task id is required"));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::constraint(format!("task {} has no title", self.id)));
        }
        if self.container_id.is_some() && self.area_id.is_some() {
            return Err(AppError::constraint(format!(
                "task {} cannot belong to both a project and an area",
                self.id
            )));
        }
        if self.recur_kind.is_some() != self.recur_rule.is_some() {
            return Err(AppError::constraint(format!(
                "task {} must set recurrence kind and rule together",
                self.id
            )));
        }
        if (self.status == TaskStatus::Done) != self.completed_at.is_some() {
            return Err(AppError::constraint(format!(
                "task {} must have completed_at exactly when done",
                self.id
            )));
        }
        Ok(())
    }
}

pub fn normalize_tag(tag: &str) -> Result<String, AppError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("tag is required"));
    }
    Ok(trimmed.to_lowercase())
}
