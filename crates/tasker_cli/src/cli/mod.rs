use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tasker", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasker add "Water plants" --planned today --repeat "every 3 days"
    Add {
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Project name or id
        #[arg(long)]
        project: Option<String>,
        /// Area name or id
        #[arg(long, conflicts_with = "project")]
        area: Option<String>,
        #[arg(long, value_name = "DATE")]
        planned: Option<String>,
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        #[arg(long, value_name = "PHRASE")]
        repeat: Option<String>,
        #[arg(long, conflicts_with_all = ["planned", "due"])]
        someday: bool,
        /// Create a project instead of a plain task
        #[arg(long = "as-project")]
        as_project: bool,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Complete one or more tasks
    ///
    /// Example: tasker done 1f0c 9a2b
    Done {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Reopen a completed task
    ///
    /// Example: tasker undo 1f0c
    Undo { id: String },
    /// Move a task to someday
    ///
    /// Example: tasker defer 1f0c
    Defer { id: String },
    /// Bring a someday task back
    ///
    /// Example: tasker activate 1f0c
    Activate { id: String },
    /// Set or clear the planned date
    ///
    /// Example: tasker plan 1f0c "next fri"
    /// Example: tasker plan 1f0c --clear
    Plan {
        id: String,
        date: Option<String>,
        #[arg(long, conflicts_with = "date")]
        clear: bool,
    },
    /// Set or clear the due date
    ///
    /// Example: tasker due 1f0c 2025-03-01
    /// Example: tasker due 1f0c --clear
    Due {
        id: String,
        date: Option<String>,
        #[arg(long, conflicts_with = "date")]
        clear: bool,
    },
    /// Set, pause, resume or clear a recurrence
    ///
    /// Example: tasker repeat 1f0c "every mon,fri" --end 2025-06-30
    /// Example: tasker repeat 1f0c --pause
    Repeat {
        id: String,
        phrase: Option<String>,
        #[arg(long, value_name = "DATE", requires = "phrase")]
        end: Option<String>,
        #[arg(long, conflicts_with_all = ["phrase", "pause", "resume"])]
        clear: bool,
        #[arg(long, conflicts_with_all = ["phrase", "resume"])]
        pause: bool,
        #[arg(long, conflicts_with = "phrase")]
        resume: bool,
    },
    /// Add tags to a task
    ///
    /// Example: tasker tag 1f0c errand home
    Tag {
        id: String,
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,
    },
    /// Remove tags from a task
    ///
    /// Example: tasker untag 1f0c home
    Untag {
        id: String,
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,
    },
    /// Move a task into a project or area, or out of both
    ///
    /// Example: tasker move 1f0c --project Garden
    /// Example: tasker move 1f0c --clear
    Move {
        id: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long, conflicts_with = "project")]
        area: Option<String>,
        #[arg(long, conflicts_with_all = ["project", "area"])]
        clear: bool,
    },
    /// Manage areas
    ///
    /// Example: tasker area add Home
    Area {
        #[command(subcommand)]
        area: AreaCommand,
    },
    /// Show details of a task
    ///
    /// Example: tasker show 1f0c
    Show { id: String },
    /// List tasks in a view
    ///
    /// Example: tasker list today
    /// Example: tasker list --tag errand
    List {
        /// inbox, today, upcoming, anytime, someday or logbook
        view: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// List every task regardless of view
        #[arg(long, conflicts_with = "view")]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AreaCommand {
    /// Create an area
    ///
    /// Example: tasker area add Home
    Add { name: String },
    /// List areas
    ///
    /// Example: tasker area list
    List,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    LogLevel,
    DefaultView,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let scalar = |target: ConfigOverrideTarget| {
        if remainder.is_some() {
            Err(format!("{canonical_field} override cannot have subfields"))
        } else {
            Ok(ParsedConfigOverride {
                target,
                value: value.clone(),
            })
        }
    };

    match canonical_field.as_str() {
        "log_level" => scalar(ConfigOverrideTarget::LogLevel),
        "default_view" => scalar(ConfigOverrideTarget::DefaultView),
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

/// Collects raw override values from `args` ahead of clap, so aliases can be
/// expanded with overrides already applied.
pub fn scan_config_overrides(args: &[String]) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == CONFIG_OVERRIDE_FLAG {
            if let Some(value) = iter.next() {
                values.push(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(CONFIG_OVERRIDE_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            values.push(value.to_string());
        }
    }
    values
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, parse_config_override, scan_config_overrides,
    };
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Log-Level = DEBUG ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::LogLevel);
        assert_eq!(parsed.value, "DEBUG");

        let err = parse_config_override("defaultView=today").unwrap_err();
        assert!(err.contains("unknown config field 'defaultview'"));

        let parsed = parse_config_override("default view=today").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::DefaultView);
    }

    #[test]
    fn parse_config_override_rejects_subfields_on_scalars() {
        let err = parse_config_override("log_level.extra=info").unwrap_err();
        assert!(err.contains("cannot have subfields"));
    }

    #[test]
    fn parse_config_override_rejects_empty_alias_name() {
        let err = parse_config_override("aliases. = foo").unwrap_err();
        assert!(err.contains("aliases override requires an alias name"));
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("aliasesls").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_trims_whitespace_for_alias_names() {
        let parsed = parse_config_override("aliases. t = list today").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::Alias("t".to_string()));
        assert_eq!(parsed.value, "list today");
    }

    #[test]
    fn done_accepts_many_ids() {
        let cli = Cli::try_parse_from(["tasker", "done", "a", "b", "--json"]).unwrap();

        assert!(cli.json);
        match cli.command {
            Command::Done { ids } => assert_eq!(ids, vec!["a", "b"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn done_requires_an_id() {
        assert!(Cli::try_parse_from(["tasker", "done"]).is_err());
    }

    #[test]
    fn move_rejects_project_and_area_together() {
        let result =
            Cli::try_parse_from(["tasker", "move", "a", "--project", "p", "--area", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn repeat_end_requires_phrase() {
        assert!(Cli::try_parse_from(["tasker", "repeat", "a", "--end", "2025-06-30"]).is_err());
        assert!(Cli::try_parse_from(["tasker", "repeat", "a", "weekly", "--end", "+2m"]).is_ok());
    }

    #[test]
    fn scan_config_overrides_reads_both_flag_forms() {
        let args: Vec<String> = [
            "t",
            "--config-override",
            "aliases.t=list today",
            "--config-override=log_level=debug",
            "--json",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        assert_eq!(
            scan_config_overrides(&args),
            vec!["aliases.t=list today", "log_level=debug"]
        );
    }
}
