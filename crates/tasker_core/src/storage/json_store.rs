use super::memory::MemoryTaskStore;
use super::{AreaLookup, ContainerLookup, TaskStore};
use crate::error::AppError;
use crate::model::{Area, Task};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "TASKER_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    schema_version: u32,
    tasks: Vec<Task>,
    #[serde(default)]
    areas: Vec<Area>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("tasker").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("tasker")
            .join(STORE_FILE_NAME))
    }
}

pub fn load_state(path: &Path) -> Result<MemoryTaskStore, AppError> {
    if !path.exists() {
        return Ok(MemoryTaskStore::new());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredState =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    MemoryTaskStore::from_parts(stored.tasks, stored.areas)
        .map_err(|err| AppError::invalid_data(err.message().to_string()))
}

pub fn save_state(path: &Path, state: &MemoryTaskStore) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredState {
        schema_version: SCHEMA_VERSION,
        tasks: state.tasks().to_vec(),
        areas: state.areas().to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    debug!(
        "event=store_saved path={} tasks={} areas={}",
        path.display(),
        state.tasks().len(),
        state.areas().len()
    );
    Ok(())
}

/// File-backed store: loaded once, written through after every successful mutation.
pub struct JsonTaskStore {
    path: PathBuf,
    state: MemoryTaskStore,
}

impl JsonTaskStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        Ok(Self {
            path: path.to_path_buf(),
            state: load_state(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn areas(&self) -> &[Area] {
        self.state.areas()
    }

    pub fn create_area(&mut self, name: &str) -> Result<Area, AppError> {
        self.commit(|state| state.create_area(name))
    }

    /// Applies `change` to a copy of the working set and keeps it only once saved.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut MemoryTaskStore) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut next = self.state.clone();
        let value = change(&mut next)?;
        save_state(&self.path, &next)?;
        self.state = next;
        Ok(value)
    }
}

impl TaskStore for JsonTaskStore {
    fn get(&self, id: &str) -> Result<Task, AppError> {
        self.state.get(id)
    }

    fn create(&mut self, task: &Task) -> Result<String, AppError> {
        self.commit(|state| state.create(task))
    }

    fn update(&mut self, task: &Task) -> Result<(), AppError> {
        self.commit(|state| state.update(task))
    }

    fn children(&self, container_id: &str) -> Result<Vec<Task>, AppError> {
        self.state.children(container_id)
    }

    fn all(&self) -> Result<Vec<Task>, AppError> {
        self.state.all()
    }
}

impl ContainerLookup for JsonTaskStore {
    fn resolve_container(&self, name: &str) -> Result<String, AppError> {
        self.state.resolve_container(name)
    }
}

impl AreaLookup for JsonTaskStore {
    fn resolve_area(&self, name: &str) -> Result<String, AppError> {
        self.state.resolve_area(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonTaskStore, SCHEMA_VERSION, load_state, save_state};
    use crate::model::Task;
    use crate::storage::{MemoryTaskStore, TaskStore};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasker-{nanos}-{file_name}"))
    }

    fn task(id: &str) -> Task {
        Task::with_id(id, "demo", datetime!(2025-01-01 08:00 UTC))
    }

    #[test]
    fn missing_file_loads_empty_store() {
        let path = temp_path("missing.json");
        let state = load_state(&path).unwrap();
        assert!(state.tasks().is_empty());
        assert!(state.areas().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("tasks.json");
        let mut state = MemoryTaskStore::new();
        let area = state.create_area("Home").unwrap();
        let mut task = task("task-1");
        task.set_area(area.id.clone());
        task.add_tag("chores").unwrap();
        state.create(&task).unwrap();

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, state);
    }

    #[test]
    fn writes_through_on_every_mutation() {
        let path = temp_path("write-through.json");
        let mut store = JsonTaskStore::open(&path).unwrap();
        store.create(&task("task-1")).unwrap();

        let mut updated = store.get("task-1").unwrap();
        updated.title = "renamed".to_string();
        store.update(&updated).unwrap();

        let reopened = JsonTaskStore::open(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(reopened.get("task-1").unwrap().title, "renamed");
    }

    #[test]
    fn failed_save_leaves_no_record_behind() {
        let path = temp_path("failed-save.json");
        let mut store = JsonTaskStore::open(&path).unwrap();
        store.create(&task("task-1")).unwrap();

        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        let err = store.create(&task("lost")).unwrap_err();
        fs::remove_dir(&path).unwrap();

        assert_eq!(err.code(), "io_error");
        assert_eq!(store.get("lost").unwrap_err().code(), "not_found");

        let mut updated = store.get("task-1").unwrap();
        updated.title = "renamed".to_string();
        store.update(&updated).unwrap();

        let loaded = load_state(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.tasks().len(), 1);
        assert_eq!(loaded.tasks()[0].title, "renamed");
    }

    #[test]
    fn failed_update_keeps_previous_record() {
        let path = temp_path("failed-update.json");
        let mut store = JsonTaskStore::open(&path).unwrap();
        store.create(&task("task-1")).unwrap();

        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        let mut updated = store.get("task-1").unwrap();
        updated.title = "renamed".to_string();
        let err = store.update(&updated).unwrap_err();
        fs::remove_dir(&path).unwrap();

        assert_eq!(err.code(), "io_error");
        assert_eq!(store.get("task-1").unwrap().title, "demo");
    }

    #[test]
    fn accepts_minimal_task_records() {
        let path = temp_path("minimal.json");
        let content = "{\n  \"schema_version\": 1,\n  \"tasks\": [\n    {\n      \"id\": \"task-1\",\n      \"title\": \"demo\",\n      \"created_at\": \"2025-12-20T00:00:00Z\"\n    }\n  ]\n}";
        fs::write(&path, content).unwrap();

        let loaded = load_state(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.tasks().len(), 1);
        assert_eq!(loaded.tasks()[0].planned_date, None);
        assert!(loaded.tasks()[0].tags.is_empty());
        assert!(!loaded.tasks()[0].recur_paused);
    }

    #[test]
    fn rejects_task_in_both_project_and_area() {
        let path = temp_path("both-placements.json");
        let content = "{\n  \"schema_version\": 1,\n  \"tasks\": [\n    {\n      \"id\": \"task-1\",\n      \"title\": \"demo\",\n      \"created_at\": \"2025-12-20T00:00:00Z\",\n      \"container_id\": \"p-1\",\n      \"area_id\": \"a-1\"\n    }\n  ]\n}";
        fs::write(&path, content).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_malformed_dates() {
        let path = temp_path("bad-date.json");
        let content = "{\n  \"schema_version\": 1,\n  \"tasks\": [\n    {\n      \"id\": \"task-1\",\n      \"title\": \"demo\",\n      \"created_at\": \"2025-12-20T00:00:00Z\",\n      \"due_date\": \"tomorrow\"\n    }\n  ]\n}";
        fs::write(&path, content).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn schema_version_must_match() {
        let path = temp_path("bad-schema.json");
        let bad = format!(
            "{{\n  \"schema_version\": {},\n  \"tasks\": []\n}}",
            SCHEMA_VERSION + 1
        );
        fs::write(&path, bad).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }
}
