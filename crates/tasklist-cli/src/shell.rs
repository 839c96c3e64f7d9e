//! Interactive session: stdin lines become events, and queued work
//! (debounced filters, delete delays, the persistence tick) runs between
//! them on this thread.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::anyhow;
use tasklist_core::filter::{DueBucket, PriorityFilter, TagFilter};
use tasklist_core::{Event, Outcome, TaskId};
use tracing::{debug, info, warn};

use crate::cli::{parse_add_args, split_words};
use crate::host::Host;
use crate::render::Renderer;

const IDLE_WAIT: Duration = Duration::from_secs(3600);

const HELP: &str = "\
commands:
  add <title…> tags:a,b [due:YYYY-MM-DD] [priority:low|medium|high] [desc:text]
  done <id>               toggle done
  delete <id>             delete after the exit delay
  move <id> before <id>   drag a displayed task in front of another
  search [text]           filter by title/description (empty clears)
  priority <p|all>        filter by priority
  tag <tag|all>           filter by tag
  due <all|overdue|today|future>
  list | tags | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Events(Vec<Event>),
    List,
    Tags,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    let words = split_words(line)?;
    let Some((head, rest)) = words.split_first() else {
        return Ok(None);
    };

    let one_id = |rest: &[String]| -> anyhow::Result<TaskId> {
        match rest {
            [id] => id.parse::<TaskId>().map_err(|e| anyhow!("invalid id {id}: {e}")),
            _ => Err(anyhow!("{head} expects one task id")),
        }
    };
    let one_value = |rest: &[String]| -> String { rest.join(" ") };

    let command = match head.as_str() {
        "add" => ShellCommand::Events(vec![Event::Submit(parse_add_args(rest)?)]),
        "done" => ShellCommand::Events(vec![Event::ToggleDone(one_id(rest)?)]),
        "delete" | "rm" => ShellCommand::Events(vec![Event::Delete(one_id(rest)?)]),
        "move" => match rest {
            [id, kw, target] if kw == "before" => {
                let id = id.parse::<TaskId>()?;
                let target = target.parse::<TaskId>()?;
                ShellCommand::Events(vec![
                    Event::DragStart(id),
                    Event::DragOver(target),
                    Event::DragEnd,
                ])
            }
            _ => return Err(anyhow!("usage: move <id> before <id>")),
        },
        "search" => ShellCommand::Events(vec![Event::SetQuery(one_value(rest))]),
        "priority" => ShellCommand::Events(vec![Event::SetPriority(
            one_value(rest).parse::<PriorityFilter>()?,
        )]),
        "tag" => {
            let Ok(tag) = one_value(rest).parse::<TagFilter>();
            ShellCommand::Events(vec![Event::SetTag(tag)])
        }
        "due" => ShellCommand::Events(vec![Event::SetDue(one_value(rest).parse::<DueBucket>()?)]),
        "list" | "ls" => ShellCommand::List,
        "tags" => ShellCommand::Tags,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(anyhow!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(command))
}

#[tracing::instrument(skip_all)]
pub fn run(host: &mut Host, renderer: &Renderer) -> anyhow::Result<()> {
    info!("shell started");
    let (tx, rx) = mpsc::channel::<String>();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    renderer.print_view(host.app().view())?;
    prompt()?;
    let mut shown = snapshot(host);

    loop {
        let wait = host.until_next().unwrap_or(IDLE_WAIT);
        match rx.recv_timeout(wait) {
            Ok(line) => match parse_line(&line) {
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => {
                    run_command(host, renderer, command)?;
                    shown = redraw_if_changed(host, renderer, shown)?;
                    prompt()?;
                }
                Ok(None) => prompt()?,
                Err(error) => {
                    eprintln!("{error:#}");
                    prompt()?;
                }
            },
            Err(RecvTimeoutError::Timeout) => {
                if host.advance() {
                    let before = shown.clone();
                    shown = redraw_if_changed(host, renderer, shown)?;
                    if shown != before {
                        prompt()?;
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                debug!("stdin closed");
                host.drain();
                break;
            }
        }
    }

    info!("shell finished");
    Ok(())
}

fn run_command(host: &mut Host, renderer: &Renderer, command: ShellCommand) -> anyhow::Result<()> {
    match command {
        ShellCommand::Events(events) => {
            for event in events {
                match host.handle(event) {
                    Outcome::Created(id) => println!("Created task {id}."),
                    Outcome::Rejected(error) => println!("! {error}"),
                    Outcome::Ignored => warn!("event had no effect"),
                    Outcome::Changed | Outcome::Scheduled => {}
                }
            }
            Ok(())
        }
        ShellCommand::List => renderer.print_view(host.app().view()),
        ShellCommand::Tags => renderer.write_tags(io::stdout().lock(), host.app().catalog()),
        ShellCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}

type Snapshot = Vec<(TaskId, bool, bool)>;

/// What the table shows, ignoring entry transitions.
fn snapshot(host: &Host) -> Snapshot {
    host.app()
        .view()
        .items()
        .iter()
        .map(|item| (item.id, item.done, host.app().is_leaving(item.id)))
        .collect()
}

fn redraw_if_changed(host: &Host, renderer: &Renderer, shown: Snapshot) -> anyhow::Result<Snapshot> {
    let current = snapshot(host);
    if current != shown {
        renderer.print_view(host.app().view())?;
    }
    Ok(current)
}

fn prompt() -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}
