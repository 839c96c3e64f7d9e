use std::io::{self, Write};

use anyhow::{Context, anyhow};
use tasklist_core::filter::FilterCriteria;
use tasklist_core::{Event, Outcome, TaskId};
use tracing::{debug, info, instrument};

use crate::cli::{Command, FilterArgs, parse_add_args};
use crate::host::Host;
use crate::render::Renderer;
use crate::shell;

#[instrument(skip(host, renderer, command))]
pub fn dispatch(host: &mut Host, renderer: &Renderer, command: Command) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    let result = match command {
        Command::Add { words } => cmd_add(host, &words),
        Command::List(filters) => cmd_list(host, renderer, &filters),
        Command::Done { id } => cmd_done(host, id),
        Command::Delete { id } => cmd_delete(host, id),
        Command::Move {
            id,
            before,
            filters,
        } => cmd_move(host, renderer, id, before, &filters),
        Command::Tags => renderer.write_tags(io::stdout().lock(), host.app().catalog()),
        Command::Export => cmd_export(host),
        Command::Shell => shell::run(host, renderer),
    };

    host.shutdown();
    result
}

fn cmd_add(host: &mut Host, words: &[String]) -> anyhow::Result<()> {
    info!("command add");
    let draft = parse_add_args(words)?;

    match host.handle(Event::Submit(draft)) {
        Outcome::Created(id) => {
            println!("Created task {id}.");
            Ok(())
        }
        Outcome::Rejected(error) => Err(anyhow!("{error}")),
        other => Err(anyhow!("unexpected outcome: {other:?}")),
    }
}

fn cmd_list(host: &mut Host, renderer: &Renderer, filters: &FilterArgs) -> anyhow::Result<()> {
    info!("command list");
    apply_filters(host, &filters.criteria());
    renderer.print_view(host.app().view())
}

fn cmd_done(host: &mut Host, id: TaskId) -> anyhow::Result<()> {
    info!(%id, "command done");
    match host.handle(Event::ToggleDone(id)) {
        Outcome::Changed => {
            let done = host.app().store().get(id).is_some_and(|t| t.done);
            println!(
                "Task {id} marked {}.",
                if done { "done" } else { "not done" }
            );
            Ok(())
        }
        _ => Err(anyhow!("no task with id {id}")),
    }
}

fn cmd_delete(host: &mut Host, id: TaskId) -> anyhow::Result<()> {
    info!(%id, "command delete");
    match host.handle(Event::Delete(id)) {
        Outcome::Scheduled => {
            host.drain();
            println!("Deleted task {id}.");
            Ok(())
        }
        _ => Err(anyhow!("no task with id {id}")),
    }
}

fn cmd_move(
    host: &mut Host,
    renderer: &Renderer,
    id: TaskId,
    before: TaskId,
    filters: &FilterArgs,
) -> anyhow::Result<()> {
    info!(%id, %before, "command move");
    apply_filters(host, &filters.criteria());

    for needed in [id, before] {
        if host.app().view().position(needed).is_none() {
            return Err(anyhow!("task {needed} is not displayed"));
        }
    }

    host.handle(Event::DragStart(id));
    host.handle(Event::DragOver(before));
    host.handle(Event::DragEnd);
    host.drain();
    renderer.print_view(host.app().view())
}

fn cmd_export(host: &Host) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(host.app().tasks()).context("failed to encode tasks")?;
    let mut out = io::stdout().lock();
    writeln!(out, "{json}")?;
    Ok(())
}

/// Pushes each active criterion through the debounced controls and waits
/// for the resulting render.
fn apply_filters(host: &mut Host, criteria: &FilterCriteria) {
    if !criteria.is_active() {
        return;
    }
    host.handle(Event::SetQuery(criteria.query.clone()));
    host.handle(Event::SetPriority(criteria.priority));
    host.handle(Event::SetTag(criteria.tag.clone()));
    host.handle(Event::SetDue(criteria.due));
    host.drain();
}
