use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::debug;
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasker_cli::cli::{
    AreaCommand, Cli, Command, ConfigOverrideTarget, parse_config_override, scan_config_overrides,
};
use tasker_core::clock::{Clock, SystemClock};
use tasker_core::completion::CompletionReport;
use tasker_core::config::{self, Config, ConfigOverrides};
use tasker_core::error::AppError;
use tasker_core::logging;
use tasker_core::model::{Area, Task, TaskKind, TaskState, TaskStatus};
use tasker_core::task_api::{self, AddTaskRequest, ListFilter};
use tasker_core::views::{View, primary_view};
use time::Date;
use time::format_description::well_known::Rfc3339;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "View")]
    view: String,
    #[tabled(rename = "Planned")]
    planned: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Repeat")]
    repeat: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

#[derive(Tabled)]
struct AreaRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "todo",
        TaskStatus::Done => "done",
    }
}

fn state_label(state: TaskState) -> &'static str {
    match state {
        TaskState::Active => "active",
        TaskState::Someday => "someday",
    }
}

fn kind_label(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Task => "task",
        TaskKind::Project => "project",
    }
}

fn date_label(date: Option<Date>) -> String {
    date.map(|date| date.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn recurrence_label(task: &Task) -> String {
    match task.recurrence() {
        None => "-".to_string(),
        Some(Err(_)) => "invalid rule".to_string(),
        Some(Ok(recurrence)) => {
            let mut label = recurrence.to_string();
            if let Some(end) = task.recur_end {
                label.push_str(&format!(" until {end}"));
            }
            if task.recur_paused {
                label.push_str(" (paused)");
            }
            label
        }
    }
}

fn tags_label(task: &Task) -> String {
    if task.tags.is_empty() {
        "-".to_string()
    } else {
        task.tags.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn task_row(task: &Task, today: Date) -> TaskRow {
    TaskRow {
        id: task.id.clone(),
        title: task.title.clone(),
        view: primary_view(task, today).to_string(),
        planned: date_label(task.planned_date),
        due: date_label(task.due_date),
        repeat: recurrence_label(task),
        tags: tags_label(task),
    }
}

fn print_tasks_plain(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    let today = SystemClock.today();
    let rows: Vec<TaskRow> = tasks.iter().map(|task| task_row(task, today)).collect();
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
}

fn print_areas_plain(areas: &[Area]) {
    if areas.is_empty() {
        println!("No areas.");
        return;
    }

    let rows: Vec<AreaRow> = areas
        .iter()
        .map(|area| AreaRow {
            id: area.id.clone(),
            name: area.name.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn error_json(err: &AppError) -> serde_json::Value {
    serde_json::json!({
        "code": err.code(),
        "message": err.message(),
    })
}

fn print_task_details(task: &Task) -> Result<(), AppError> {
    let created_at = task
        .created_at
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    let completed_at = match task.completed_at {
        Some(at) => at
            .format(&Rfc3339)
            .map_err(|err| AppError::invalid_data(err.to_string()))?,
        None => "-".to_string(),
    };

    println!("ID: {}", task.id);
    println!("Title: {}", task.title);
    println!("Kind: {}", kind_label(task.kind));
    println!("Status: {}", status_label(task.status));
    println!("State: {}", state_label(task.state));
    println!("View: {}", primary_view(task, SystemClock.today()));
    println!("Planned: {}", date_label(task.planned_date));
    println!("Due: {}", date_label(task.due_date));
    println!("Repeat: {}", recurrence_label(task));
    if let Some(project) = task.container_id() {
        println!("Project: {project}");
    }
    if let Some(area) = task.area_id() {
        println!("Area: {area}");
    }
    println!("Tags: {}", tags_label(task));
    if let Some(notes) = task.notes.as_deref() {
        println!("Notes: {notes}");
    }
    println!("Created: {created_at}");
    println!("Completed: {completed_at}");
    Ok(())
}

fn print_completion(report: &CompletionReport, json: bool) -> Result<(), AppError> {
    if json {
        let results: Vec<serde_json::Value> = report
            .results
            .iter()
            .map(|result| {
                serde_json::json!({
                    "completed_task": result.completed_task,
                    "next_task": result.next_task,
                    "regeneration_error": result.regeneration_error.as_ref().map(error_json),
                })
            })
            .collect();
        return print_json(&results);
    }

    for result in &report.results {
        let task = &result.completed_task;
        println!("Completed task: {} ({})", task.title, task.id);
        if let Some(next) = result.next_task.as_ref() {
            println!(
                "Next occurrence: {} ({}) on {}",
                next.title,
                next.id,
                date_label(next.planned_date.or(next.due_date))
            );
        }
        if let Some(err) = result.regeneration_error.as_ref() {
            eprintln!("WARNING: {err}");
        }
    }
    Ok(())
}

fn print_task_outcome(task: &Task, json: bool, verb: &str) -> Result<(), AppError> {
    if json {
        print_json(task)
    } else {
        println!("{verb} task: {} ({})", task.title, task.id);
        Ok(())
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::LogLevel => overrides.log_level = Some(parsed.value),
            ConfigOverrideTarget::DefaultView => {
                overrides.default_view = Some(parsed.value.parse::<View>()?);
            }
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
        }
    }
    Ok(overrides)
}

/// Applies overrides, expands a leading alias and parses the command line.
/// Returns `None` once help or version output has been printed.
fn prepare(args: Vec<String>, base: &Config) -> Result<Option<(Cli, Config)>, AppError> {
    let overrides = collect_overrides(&scan_config_overrides(&args))?;
    let config = config::merge_overrides(base, &overrides);
    let args = config.expand_alias(args);

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("tasker".to_string());
    argv.extend(args);

    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(Some((cli, config))),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            Ok(None)
        }
        Err(err) => Err(normalize_parse_error(err)),
    }
}

fn required_date(date: Option<String>, clear: bool) -> Result<Option<String>, AppError> {
    match (date, clear) {
        (Some(date), false) => Ok(Some(date)),
        (None, true) => Ok(None),
        _ => Err(AppError::invalid_input("a date or --clear is required")),
    }
}

fn run_command(cli: Cli, config: &Config) -> Result<(), AppError> {
    debug!("event=command_start command={:?}", cli.command);
    match cli.command {
        Command::Add {
            title,
            notes,
            project,
            area,
            planned,
            due,
            repeat,
            someday,
            as_project,
            tags,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };

            let request = AddTaskRequest {
                title,
                notes,
                project,
                area,
                planned,
                due,
                repeat,
                someday,
                as_project,
                tags,
            };
            let task = task_api::add_task(&request)?;
            let verb = if task.kind == TaskKind::Project {
                "Added project"
            } else {
                "Added"
            };
            print_task_outcome(&task, cli.json, verb)?;
        }
        Command::Done { ids } => {
            let report = task_api::complete_tasks(&ids)?;
            print_completion(&report, cli.json)?;
            if let Some(err) = report.error {
                return Err(err);
            }
        }
        Command::Undo { id } => {
            let task = task_api::uncomplete_task(&id)?;
            print_task_outcome(&task, cli.json, "Reopened")?;
        }
        Command::Defer { id } => {
            let task = task_api::defer_task(&id)?;
            print_task_outcome(&task, cli.json, "Deferred")?;
        }
        Command::Activate { id } => {
            let task = task_api::activate_task(&id)?;
            print_task_outcome(&task, cli.json, "Activated")?;
        }
        Command::Plan { id, date, clear } => {
            let date = required_date(date, clear)?;
            let task = task_api::set_planned(&id, date.as_deref())?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!(
                    "Planned task: {} ({}) for {}",
                    task.title,
                    task.id,
                    date_label(task.planned_date)
                );
            }
        }
        Command::Due { id, date, clear } => {
            let date = required_date(date, clear)?;
            let task = task_api::set_due(&id, date.as_deref())?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!(
                    "Task due: {} ({}) on {}",
                    task.title,
                    task.id,
                    date_label(task.due_date)
                );
            }
        }
        Command::Repeat {
            id,
            phrase,
            end,
            clear,
            pause,
            resume,
        } => {
            let task = match (phrase, clear, pause, resume) {
                (Some(phrase), false, false, false) => {
                    task_api::set_recurrence(&id, &phrase, end.as_deref())?
                }
                (None, true, false, false) => task_api::clear_recurrence(&id)?,
                (None, false, true, false) => task_api::pause_recurrence(&id)?,
                (None, false, false, true) => task_api::resume_recurrence(&id)?,
                _ => {
                    return Err(AppError::invalid_input(
                        "a recurrence phrase or one of --clear, --pause, --resume is required",
                    ));
                }
            };
            if cli.json {
                print_json(&task)?;
            } else {
                println!(
                    "Repeat for {} ({}): {}",
                    task.title,
                    task.id,
                    recurrence_label(&task)
                );
            }
        }
        Command::Tag { id, tags } => {
            let mut task = None;
            for tag in &tags {
                task = Some(task_api::add_tag(&id, tag)?);
            }
            if let Some(task) = task {
                print_task_outcome(&task, cli.json, "Tagged")?;
            }
        }
        Command::Untag { id, tags } => {
            let mut task = None;
            for tag in &tags {
                task = Some(task_api::remove_tag(&id, tag)?);
            }
            if let Some(task) = task {
                print_task_outcome(&task, cli.json, "Untagged")?;
            }
        }
        Command::Move {
            id,
            project,
            area,
            clear,
        } => {
            let task = match (project, area, clear) {
                (Some(project), None, false) => task_api::move_to_project(&id, &project)?,
                (None, Some(area), false) => task_api::move_to_area(&id, &area)?,
                (None, None, true) => task_api::clear_placement(&id)?,
                _ => {
                    return Err(AppError::invalid_input(
                        "one of --project, --area or --clear is required",
                    ));
                }
            };
            print_task_outcome(&task, cli.json, "Moved")?;
        }
        Command::Area { area } => match area {
            AreaCommand::Add { name } => {
                let area = task_api::add_area(&name)?;
                if cli.json {
                    print_json(&area)?;
                } else {
                    println!("Added area: {} ({})", area.name, area.id);
                }
            }
            AreaCommand::List => {
                let areas = task_api::list_areas()?;
                if cli.json {
                    print_json(&areas)?;
                } else {
                    print_areas_plain(&areas);
                }
            }
        },
        Command::Show { id } => {
            let task = task_api::get_task(&id)?;
            if cli.json {
                print_json(&task)?;
            } else {
                print_task_details(&task)?;
            }
        }
        Command::List {
            view,
            project,
            area,
            tag,
            all,
        } => {
            let narrowed = project.is_some() || area.is_some() || tag.is_some();
            let view = match view {
                Some(name) => Some(name.parse::<View>()?),
                None if all || narrowed => None,
                None => Some(config.default_view.unwrap_or(View::Today)),
            };
            let tasks = match view {
                Some(view) if !narrowed => task_api::list_view(view)?,
                view => task_api::list_tasks(&ListFilter {
                    view,
                    project,
                    area,
                    tag,
                })?,
            };
            if cli.json {
                print_json(&tasks)?;
            } else {
                print_tasks_plain(&tasks);
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let env_level = std::env::var(logging::LOG_ENV_VAR).ok();
    let level = logging::resolve_log_level(env_level.as_deref(), config.log_level.as_deref());
    if let Err(err) = logging::init_logging(&level) {
        eprintln!("WARNING: {err}");
    }
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let (cli, config) = match prepare(args, base) {
            Ok(Some(prepared)) => prepared,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if let Err(err) = run_command(cli, &config) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        eprintln!("WARNING: config ignored: {err}");
    }
    let base = loaded.config;

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    if args.is_empty() {
        init_logging(&base);
        if let Err(err) = run_interactive(&base) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let (cli, config) = match prepare(args, &base) {
        Ok(Some(prepared)) => prepared,
        Ok(None) => return,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    if let Err(err) = run_command(cli, &config) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
