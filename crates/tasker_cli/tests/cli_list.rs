use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};
use time::{Duration, OffsetDateTime, UtcOffset};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasker-{nanos}-{file_name}"))
}

fn local_date_strings() -> (String, String, String) {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let now = OffsetDateTime::now_utc().to_offset(offset);
    (
        (now - Duration::days(1)).date().to_string(),
        now.date().to_string(),
        (now + Duration::days(1)).date().to_string(),
    )
}

fn write_sample_store(path: &Path) {
    let (yesterday, today, tomorrow) = local_date_strings();
    let content = serde_json::json!({
        "schema_version": 1,
        "tasks": [
            {
                "id": "task-0",
                "title": "overdue task",
                "created_at": "2025-01-01T08:00:00Z",
                "due_date": yesterday,
                "tags": ["work"]
            },
            {
                "id": "task-1",
                "title": "today task",
                "created_at": "2025-01-02T08:00:00Z",
                "planned_date": today
            },
            {
                "id": "task-2",
                "title": "future task",
                "created_at": "2025-01-03T08:00:00Z",
                "planned_date": tomorrow
            },
            {
                "id": "task-3",
                "title": "someday task",
                "state": "someday",
                "created_at": "2025-01-04T08:00:00Z"
            },
            {
                "id": "task-4",
                "title": "inbox task",
                "created_at": "2025-01-05T08:00:00Z"
            }
        ],
        "areas": []
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn run(store_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasker"))
        .args(args)
        .env("TASKER_STORE_PATH", store_path)
        .env("TASKER_CONFIG_PATH", store_path.with_extension("config.json"))
        .output()
        .expect("failed to run list command")
}

fn listed_ids(output: &Output) -> Vec<String> {
    let parsed: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("json output");
    parsed
        .as_array()
        .expect("json array")
        .iter()
        .map(|task| task["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn list_today_includes_overdue_in_date_order() {
    let store_path = temp_path("cli-list-today.json");
    write_sample_store(&store_path);

    let output = run(&store_path, &["--json", "list", "today"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(listed_ids(&output), vec!["task-0", "task-1"]);
}

#[test]
fn list_views_partition_active_tasks() {
    let store_path = temp_path("cli-list-views.json");
    write_sample_store(&store_path);

    let upcoming = run(&store_path, &["--json", "list", "upcoming"]);
    let someday = run(&store_path, &["--json", "list", "someday"]);
    let inbox = run(&store_path, &["--json", "list", "INBOX"]);
    let tagged = run(&store_path, &["--json", "list", "--tag", "Work"]);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(listed_ids(&upcoming), vec!["task-2"]);
    assert_eq!(listed_ids(&someday), vec!["task-3"]);
    assert_eq!(listed_ids(&inbox), vec!["task-4"]);
    assert_eq!(listed_ids(&tagged), vec!["task-0"]);
}

#[test]
fn list_plain_text_renders_table() {
    let store_path = temp_path("cli-list-plain.json");
    write_sample_store(&store_path);

    let output = run(&store_path, &["list", "upcoming"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Title"));
    assert!(stdout.contains("future task"));
    assert!(!stdout.contains("today task"));
}

#[test]
fn list_uses_default_view_override() {
    let store_path = temp_path("cli-list-default.json");
    write_sample_store(&store_path);

    let output = run(
        &store_path,
        &["--json", "--config-override", "default_view=someday", "list"],
    );
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(listed_ids(&output), vec!["task-3"]);
}

#[test]
fn list_rejects_unknown_view() {
    let store_path = temp_path("cli-list-unknown.json");
    write_sample_store(&store_path);

    let output = run(&store_path, &["list", "later"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - unknown view: later"));
}

#[test]
fn list_reports_invalid_store() {
    let store_path = temp_path("cli-list-invalid.json");
    let content = serde_json::json!({
        "schema_version": 1,
        "tasks": [
            {
                "id": "task-1",
                "title": "bad",
                "created_at": "2025-01-01T08:00:00Z",
                "planned_date": "not-a-date"
            }
        ]
    });
    std::fs::write(&store_path, serde_json::to_string_pretty(&content).unwrap()).unwrap();

    let output = run(&store_path, &["list", "today"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_data"));
}
