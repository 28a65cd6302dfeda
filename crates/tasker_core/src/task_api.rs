use crate::clock::{Clock, SystemClock};
use crate::completion::{CompletionOrchestrator, CompletionReport};
use crate::dates::parse_date;
use crate::error::AppError;
use crate::model::{Area, Task, TaskKind};
use crate::recurrence::parse_recurrence;
use crate::storage::json_store;
use crate::storage::{AreaLookup, ContainerLookup, JsonTaskStore, ListQuery, TaskStore};
use crate::views::View;
use log::info;
use std::path::Path;
use time::Date;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddTaskRequest {
    pub title: String,
    pub notes: Option<String>,
    /// Project name or id.
    pub project: Option<String>,
    /// Area name or id.
    pub area: Option<String>,
    pub planned: Option<String>,
    pub due: Option<String>,
    pub repeat: Option<String>,
    pub someday: bool,
    pub as_project: bool,
    pub tags: Vec<String>,
}

impl AddTaskRequest {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Listing filter using names the way a user types them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub view: Option<View>,
    pub project: Option<String>,
    pub area: Option<String>,
    pub tag: Option<String>,
}

pub fn add_task(request: &AddTaskRequest) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    add_task_with_path(&path, &SystemClock, request)
}

pub fn complete_tasks<I: AsRef<str>>(ids: &[I]) -> Result<CompletionReport, AppError> {
    let path = json_store::store_path()?;
    complete_tasks_with_path(&path, &SystemClock, ids)
}

pub fn uncomplete_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    uncomplete_task_with_path(&path, id)
}

pub fn defer_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    defer_task_with_path(&path, id)
}

pub fn activate_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    activate_task_with_path(&path, id)
}

pub fn set_planned(id: &str, expression: Option<&str>) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    set_planned_with_path(&path, &SystemClock, id, expression)
}

pub fn set_due(id: &str, expression: Option<&str>) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    set_due_with_path(&path, &SystemClock, id, expression)
}

pub fn set_recurrence(id: &str, phrase: &str, end: Option<&str>) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    set_recurrence_with_path(&path, &SystemClock, id, phrase, end)
}

pub fn clear_recurrence(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    clear_recurrence_with_path(&path, id)
}

pub fn pause_recurrence(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    pause_recurrence_with_path(&path, id)
}

pub fn resume_recurrence(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    resume_recurrence_with_path(&path, id)
}

pub fn add_tag(id: &str, tag: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    add_tag_with_path(&path, id, tag)
}

pub fn remove_tag(id: &str, tag: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    remove_tag_with_path(&path, id, tag)
}

pub fn move_to_project(id: &str, project: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    move_to_project_with_path(&path, id, project)
}

pub fn move_to_area(id: &str, area: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    move_to_area_with_path(&path, id, area)
}

pub fn clear_placement(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    clear_placement_with_path(&path, id)
}

pub fn add_area(name: &str) -> Result<Area, AppError> {
    let path = json_store::store_path()?;
    add_area_with_path(&path, name)
}

pub fn list_areas() -> Result<Vec<Area>, AppError> {
    let path = json_store::store_path()?;
    list_areas_with_path(&path)
}

pub fn list_view(view: View) -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    list_tasks_with_path(&path, &SystemClock, &ListFilter {
        view: Some(view),
        ..ListFilter::default()
    })
}

pub fn list_tasks(filter: &ListFilter) -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    list_tasks_with_path(&path, &SystemClock, filter)
}

pub fn get_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    get_task_with_path(&path, id)
}

fn add_task_with_path<C: Clock>(
    path: &Path,
    clock: &C,
    request: &AddTaskRequest,
) -> Result<Task, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }
    if request.project.is_some() && request.area.is_some() {
        return Err(AppError::constraint(
            "a task cannot belong to both a project and an area",
        ));
    }
    if request.someday && (request.planned.is_some() || request.due.is_some()) {
        return Err(AppError::invalid_input(
            "a someday task cannot have a planned or due date",
        ));
    }

    let mut store = JsonTaskStore::open(path)?;
    let now = clock.now();
    let mut task = Task::new(title, now);
    task.notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_string);
    if request.as_project {
        task.kind = TaskKind::Project;
    }

    if let Some(project) = request.project.as_deref() {
        task.set_container(store.resolve_container(project)?);
    }
    if let Some(area) = request.area.as_deref() {
        task.set_area(store.resolve_area(area)?);
    }

    if request.someday {
        task.defer();
    }
    if let Some(expression) = request.planned.as_deref() {
        task.set_planned_date(Some(parse_date(expression, now)?));
    }
    if let Some(expression) = request.due.as_deref() {
        task.set_due_date(Some(parse_date(expression, now)?));
    }

    if let Some(phrase) = request.repeat.as_deref() {
        if task.is_container() {
            return Err(AppError::invalid_input("projects cannot repeat"));
        }
        let recurrence = parse_recurrence(phrase)?;
        task.set_recurrence(recurrence.kind, &recurrence.rule)?;
    }

    for tag in &request.tags {
        task.add_tag(tag)?;
    }

    store.create(&task)?;
    info!("event=task_added id={} kind={:?}", task.id, task.kind);
    Ok(task)
}

fn complete_tasks_with_path<C: Clock, I: AsRef<str>>(
    path: &Path,
    clock: &C,
    ids: &[I],
) -> Result<CompletionReport, AppError> {
    if ids.is_empty() {
        return Err(AppError::invalid_input("at least one id is required"));
    }
    let trimmed: Vec<&str> = ids.iter().map(|id| id.as_ref().trim()).collect();
    if trimmed.iter().any(|id| id.is_empty()) {
        return Err(AppError::invalid_input("id is required"));
    }

    let mut store = JsonTaskStore::open(path)?;
    Ok(CompletionOrchestrator::new(&mut store, clock).complete(&trimmed))
}

fn uncomplete_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    modify_task(path, id, |task| task.uncomplete())
}

fn defer_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    modify_task(path, id, |task| {
        task.defer();
        Ok(())
    })
}

fn activate_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    modify_task(path, id, |task| {
        task.activate();
        Ok(())
    })
}

fn set_planned_with_path<C: Clock>(
    path: &Path,
    clock: &C,
    id: &str,
    expression: Option<&str>,
) -> Result<Task, AppError> {
    let date = parse_optional_date(clock, expression)?;
    modify_task(path, id, |task| {
        task.set_planned_date(date);
        Ok(())
    })
}

fn set_due_with_path<C: Clock>(
    path: &Path,
    clock: &C,
    id: &str,
    expression: Option<&str>,
) -> Result<Task, AppError> {
    let date = parse_optional_date(clock, expression)?;
    modify_task(path, id, |task| {
        task.set_due_date(date);
        Ok(())
    })
}

fn set_recurrence_with_path<C: Clock>(
    path: &Path,
    clock: &C,
    id: &str,
    phrase: &str,
    end: Option<&str>,
) -> Result<Task, AppError> {
    let recurrence = parse_recurrence(phrase)?;
    let end = parse_optional_date(clock, end)?;
    modify_task(path, id, |task| {
        if task.is_container() {
            return Err(AppError::invalid_input("projects cannot repeat"));
        }
        task.set_recurrence(recurrence.kind, &recurrence.rule)?;
        task.recur_end = end;
        Ok(())
    })
}

fn clear_recurrence_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    modify_task(path, id, |task| {
        task.clear_recurrence();
        Ok(())
    })
}

fn pause_recurrence_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    modify_task(path, id, |task| task.pause_recurrence())
}

fn resume_recurrence_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    modify_task(path, id, |task| task.resume_recurrence())
}

fn add_tag_with_path(path: &Path, id: &str, tag: &str) -> Result<Task, AppError> {
    let id = require_id(id)?;
    let mut store = JsonTaskStore::open(path)?;
    store.add_tag(id, tag)
}

fn remove_tag_with_path(path: &Path, id: &str, tag: &str) -> Result<Task, AppError> {
    let id = require_id(id)?;
    let mut store = JsonTaskStore::open(path)?;
    store.remove_tag(id, tag)
}

fn move_to_project_with_path(path: &Path, id: &str, project: &str) -> Result<Task, AppError> {
    let id = require_id(id)?;
    let mut store = JsonTaskStore::open(path)?;
    let container_id = store.resolve_container(project)?;
    if container_id == id {
        return Err(AppError::invalid_input("a project cannot contain itself"));
    }

    let mut task = store.get(id)?;
    task.set_container(container_id);
    store.update(&task)?;
    Ok(task)
}

fn move_to_area_with_path(path: &Path, id: &str, area: &str) -> Result<Task, AppError> {
    let id = require_id(id)?;
    let mut store = JsonTaskStore::open(path)?;
    let area_id = store.resolve_area(area)?;

    let mut task = store.get(id)?;
    task.set_area(area_id);
    store.update(&task)?;
    Ok(task)
}

fn clear_placement_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    modify_task(path, id, |task| {
        task.clear_placement();
        Ok(())
    })
}

fn add_area_with_path(path: &Path, name: &str) -> Result<Area, AppError> {
    let mut store = JsonTaskStore::open(path)?;
    let area = store.create_area(name)?;
    info!("event=area_added id={} name={}", area.id, area.name);
    Ok(area)
}

fn list_areas_with_path(path: &Path) -> Result<Vec<Area>, AppError> {
    Ok(JsonTaskStore::open(path)?.areas().to_vec())
}

fn list_tasks_with_path<C: Clock>(
    path: &Path,
    clock: &C,
    filter: &ListFilter,
) -> Result<Vec<Task>, AppError> {
    let store = JsonTaskStore::open(path)?;
    let query = ListQuery {
        view: filter.view,
        container_id: filter
            .project
            .as_deref()
            .map(|name| store.resolve_container(name))
            .transpose()?,
        area_id: filter
            .area
            .as_deref()
            .map(|name| store.resolve_area(name))
            .transpose()?,
        tag: filter
            .tag
            .as_deref()
            .map(crate::model::normalize_tag)
            .transpose()?,
    };
    store.list(&query, clock.today())
}

fn get_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let id = require_id(id)?;
    JsonTaskStore::open(path)?.get(id)
}

fn modify_task<F>(path: &Path, id: &str, change: F) -> Result<Task, AppError>
where
    F: FnOnce(&mut Task) -> Result<(), AppError>,
{
    let id = require_id(id)?;
    let mut store = JsonTaskStore::open(path)?;
    let mut task = store.get(id)?;
    change(&mut task)?;
    store.update(&task)?;
    Ok(task)
}

fn require_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn parse_optional_date<C: Clock>(
    clock: &C,
    expression: Option<&str>,
) -> Result<Option<Date>, AppError> {
    expression
        .map(|expression| parse_date(expression, clock.now()))
        .transpose()
}
