use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tasklist_core::filter::{DueBucket, FilterCriteria, PriorityFilter, TagFilter};
use tasklist_core::{Priority, TaskDraft, TaskId};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tasklist",
    version,
    about = "Local task list with filters and manual ordering",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Override a config value, e.g. `--rc timing.debounce_ms=500`.
    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a task: `add <title…> tags:a,b [due:YYYY-MM-DD] [priority:high] [desc:text]`.
    Add {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Show tasks matching the filters.
    List(FilterArgs),
    /// Flip a task's done flag.
    Done { id: TaskId },
    /// Delete a task.
    Delete { id: TaskId },
    /// Move a displayed task in front of another displayed task.
    Move {
        id: TaskId,
        #[arg(long)]
        before: TaskId,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List known tags.
    Tags,
    /// Print the stored collection as JSON.
    Export,
    /// Interactive session with live filters and timers.
    Shell,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    #[arg(long, short = 'p', default_value = "all")]
    pub priority: PriorityFilter,

    #[arg(long, short = 't', default_value = "all")]
    pub tag: TagFilter,

    #[arg(long, short = 'd', default_value = "all")]
    pub due: DueBucket,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            query: self.search.clone(),
            priority: self.priority,
            tag: self.tag.clone(),
            due: self.due,
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Splits `add` arguments into title words and `key:value` modifiers.
#[tracing::instrument(skip_all)]
pub fn parse_add_args(words: &[String]) -> anyhow::Result<TaskDraft> {
    let mut title = Vec::new();
    let mut tags = Vec::new();
    let mut draft = TaskDraft::default();

    for word in words {
        let Some((key, value)) = word.split_once(':') else {
            title.push(word.as_str());
            continue;
        };

        match key.to_ascii_lowercase().as_str() {
            "tag" | "tags" => tags.push(value.to_string()),
            "due" => draft.due_date_input = value.to_string(),
            "pri" | "priority" => draft.priority = value.parse::<Priority>()?,
            "desc" | "description" => draft.description = value.to_string(),
            _ => title.push(word.as_str()),
        }
    }

    draft.title = title.join(" ");
    draft.tags_input = tags.join(",");
    debug!(title = %draft.title, tags = %draft.tags_input, "parsed add arguments");
    Ok(draft)
}

/// Whitespace split honouring double and single quotes.
pub fn split_words(line: &str) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    out.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(anyhow!("unterminated {q} quote"));
    }
    if in_word {
        out.push(current);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn add_arguments_split_title_and_modifiers() {
        let draft = parse_add_args(&words(&[
            "Buy",
            "milk",
            "tags:home,errands",
            "due:2024-06-10",
            "priority:high",
            "desc:two liters",
        ]))
        .expect("parse");

        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.tags_input, "home,errands");
        assert_eq!(draft.due_date_input, "2024-06-10");
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.description, "two liters");
    }

    #[test]
    fn unknown_modifiers_stay_in_the_title() {
        let draft = parse_add_args(&words(&["Read", "ch:3", "tag:books", "tag:fun"])).expect("parse");
        assert_eq!(draft.title, "Read ch:3");
        assert_eq!(draft.tags_input, "books,fun");
    }

    #[test]
    fn bad_priority_is_an_error() {
        assert!(parse_add_args(&words(&["x", "priority:urgent"])).is_err());
    }

    #[test]
    fn quoted_words_stay_together() {
        assert_eq!(
            split_words(r#"add "Buy milk" desc:'two liters' tags:home"#).expect("split"),
            words(&["add", "Buy milk", "desc:two liters", "tags:home"])
        );
        assert_eq!(split_words("search \"\"").expect("split"), words(&["search", ""]));
        assert!(split_words("add \"open").is_err());
    }

    #[test]
    fn global_flags_parse_before_and_after_the_command() {
        let cli = GlobalCli::try_parse_from([
            "tasklist",
            "-v",
            "list",
            "--tag",
            "home",
            "--due",
            "overdue",
            "--rc",
            "color=off",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.rc_overrides.len(), 1);
        match cli.command {
            Some(Command::List(filters)) => {
                let criteria = filters.criteria();
                assert_eq!(criteria.tag, TagFilter::Only("home".to_string()));
                assert_eq!(criteria.due, DueBucket::Overdue);
                assert_eq!(criteria.priority, PriorityFilter::All);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
