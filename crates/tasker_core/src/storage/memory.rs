use super::{AreaLookup, ContainerLookup, TaskStore};
use crate::error::AppError;
use crate::model::{Area, Task};

/// In-memory store. Also the working set behind `JsonTaskStore`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTaskStore {
    tasks: Vec<Task>,
    areas: Vec<Area>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already-persisted records, rejecting invalid ones.
    pub fn from_parts(tasks: Vec<Task>, areas: Vec<Area>) -> Result<Self, AppError> {
        let mut store = Self::new();
        for area in areas {
            store.insert_area(area)?;
        }
        for task in tasks {
            store.create(&task)?;
        }
        Ok(store)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn create_area(&mut self, name: &str) -> Result<Area, AppError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("area name is required"));
        }
        let area = Area::new(trimmed);
        self.insert_area(area.clone())?;
        Ok(area)
    }

    fn insert_area(&mut self, area: Area) -> Result<(), AppError> {
        let duplicate = self.areas.iter().any(|existing| {
            existing.id == area.id || existing.name.eq_ignore_ascii_case(area.name.trim())
        });
        if duplicate {
            return Err(AppError::constraint(format!(
                "area already exists: {}",
                area.name
            )));
        }
        self.areas.push(area);
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, id: &str) -> Result<Task, AppError> {
        self.position(id)
            .map(|index| self.tasks[index].clone())
            .ok_or_else(|| AppError::not_found(format!("task not found: {id}")))
    }

    fn create(&mut self, task: &Task) -> Result<String, AppError> {
        task.validate()?;
        if self.position(&task.id).is_some() {
            return Err(AppError::constraint(format!(
                "task already exists: {}",
                task.id
            )));
        }
        self.tasks.push(task.clone());
        Ok(task.id.clone())
    }

    fn update(&mut self, task: &Task) -> Result<(), AppError> {
        task.validate()?;
        let index = self
            .position(&task.id)
            .ok_or_else(|| AppError::not_found(format!("task not found: {}", task.id)))?;
        self.tasks[index] = task.clone();
        Ok(())
    }

    fn children(&self, container_id: &str) -> Result<Vec<Task>, AppError> {
        Ok(self
            .tasks
            .iter()
            .filter(|task| task.container_id() == Some(container_id))
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.tasks.clone())
    }
}

impl ContainerLookup for MemoryTaskStore {
    fn resolve_container(&self, name: &str) -> Result<String, AppError> {
        let trimmed = name.trim();
        self.tasks
            .iter()
            .filter(|task| task.is_container())
            .find(|task| task.id == trimmed)
            .or_else(|| {
                self.tasks
                    .iter()
                    .filter(|task| task.is_container())
                    .find(|task| task.title.trim().eq_ignore_ascii_case(trimmed))
            })
            .map(|task| task.id.clone())
            .ok_or_else(|| AppError::not_found(format!("project not found: {trimmed}")))
    }
}

impl AreaLookup for MemoryTaskStore {
    fn resolve_area(&self, name: &str) -> Result<String, AppError> {
        let trimmed = name.trim();
        self.areas
            .iter()
            .find(|area| area.id == trimmed)
            .or_else(|| {
                self.areas
                    .iter()
                    .find(|area| area.name.eq_ignore_ascii_case(trimmed))
            })
            .map(|area| area.id.clone())
            .ok_or_else(|| AppError::not_found(format!("area not found: {trimmed}")))
    }
}
