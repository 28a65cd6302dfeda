//! Storage contracts consumed by the core, plus in-memory and JSON file backends.
//!
//! # Invariants
//! - Every write goes through `Task::validate()`; violations surface as constraint errors.
//! - Unknown ids surface as `NotFound`, never as an empty success.

pub mod json_store;
pub mod memory;

use crate::error::AppError;
use crate::model::Task;
use crate::views::View;
use std::collections::BTreeSet;
use time::Date;

pub use json_store::JsonTaskStore;
pub use memory::MemoryTaskStore;

/// Filters for `TaskStore::list`. Empty query lists every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub view: Option<View>,
    pub container_id: Option<String>,
    pub area_id: Option<String>,
    pub tag: Option<String>,
}

impl ListQuery {
    pub fn view(view: View) -> Self {
        Self {
            view: Some(view),
            ..Self::default()
        }
    }

    fn accepts(&self, task: &Task, today: Date) -> bool {
        self.view.is_none_or(|view| view.matches(task, today))
            && self
                .container_id
                .as_deref()
                .is_none_or(|id| task.container_id() == Some(id))
            && self
                .area_id
                .as_deref()
                .is_none_or(|id| task.area_id() == Some(id))
            && self.tag.as_deref().is_none_or(|tag| task.tags.contains(tag))
    }
}

pub trait TaskStore {
    fn get(&self, id: &str) -> Result<Task, AppError>;

    /// Persists a new task and returns its id.
    fn create(&mut self, task: &Task) -> Result<String, AppError>;

    fn update(&mut self, task: &Task) -> Result<(), AppError>;

    /// Tasks whose `container_id` is `container_id`.
    fn children(&self, container_id: &str) -> Result<Vec<Task>, AppError>;

    fn all(&self) -> Result<Vec<Task>, AppError>;

    fn add_tag(&mut self, id: &str, tag: &str) -> Result<Task, AppError> {
        let mut task = self.get(id)?;
        task.add_tag(tag)?;
        self.update(&task)?;
        Ok(task)
    }

    fn remove_tag(&mut self, id: &str, tag: &str) -> Result<Task, AppError> {
        let mut task = self.get(id)?;
        task.remove_tag(tag)?;
        self.update(&task)?;
        Ok(task)
    }

    fn tags(&self, id: &str) -> Result<BTreeSet<String>, AppError> {
        Ok(self.get(id)?.tags)
    }

    fn list(&self, query: &ListQuery, today: Date) -> Result<Vec<Task>, AppError> {
        let tasks: Vec<Task> = self
            .all()?
            .into_iter()
            .filter(|task| query.accepts(task, today))
            .collect();
        match query.view {
            Some(view) => Ok(crate::views::filter_view(&tasks, view, today)),
            None => {
                let mut tasks = tasks;
                tasks.sort_by_key(|task| task.created_at);
                Ok(tasks)
            }
        }
    }
}

/// Resolves a project name (or id) to the project's task id.
pub trait ContainerLookup {
    fn resolve_container(&self, name: &str) -> Result<String, AppError>;
}

/// Resolves an area name (or id) to the area id.
pub trait AreaLookup {
    fn resolve_area(&self, name: &str) -> Result<String, AppError>;
}
