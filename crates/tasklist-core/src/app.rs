use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::filter::{self, DueBucket, FilterCriteria, PriorityFilter, TagFilter};
use crate::reorder::{DragSession, merge_visible_order};
use crate::schedule::{Debouncer, Scheduler, TimerId};
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::tags::TagCatalog;
use crate::task::{Task, TaskDraft, TaskId, ValidationError};
use crate::view::ListView;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_DELETE_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_PERSIST_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub debounce: Duration,
    pub delete_delay: Duration,
    pub persist_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            delete_delay: DEFAULT_DELETE_DELAY,
            persist_interval: DEFAULT_PERSIST_INTERVAL,
        }
    }
}

/// The host's view of "now" when it delivers an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    /// Monotonic time since the host started.
    pub elapsed: Duration,
    /// Wall-clock milliseconds since the Unix epoch, used to seed new ids.
    pub epoch_ms: u64,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Submit(TaskDraft),
    ToggleDone(TaskId),
    Delete(TaskId),
    SetQuery(String),
    SetPriority(PriorityFilter),
    SetTag(TagFilter),
    SetDue(DueBucket),
    DragStart(TaskId),
    DragOver(TaskId),
    DragEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(TaskId),
    /// The view changed synchronously.
    Changed,
    /// Work was queued; call `advance` once the deadline passes.
    Scheduled,
    Rejected(ValidationError),
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Job {
    RunFilter,
    Settle,
    FinishDelete(TaskId),
    PersistTick,
}

/// Task collection, filters, and list view driven by one event thread.
pub struct App<S> {
    store: TaskStore<S>,
    criteria: FilterCriteria,
    catalog: TagCatalog,
    view: ListView,
    timing: Timing,
    scheduler: Scheduler<Job>,
    debounce: Debouncer,
    settle: Option<TimerId>,
    drag: Option<DragSession>,
    leaving: BTreeSet<TaskId>,
}

impl<S: KeyValueStore> App<S> {
    #[instrument(skip(store, timing))]
    pub fn start(store: TaskStore<S>, timing: Timing, now: Moment) -> Self {
        let mut app = Self {
            catalog: TagCatalog::from_tasks(store.tasks()),
            store,
            criteria: FilterCriteria::default(),
            view: ListView::default(),
            timing,
            scheduler: Scheduler::new(),
            debounce: Debouncer::new(timing.debounce),
            settle: None,
            drag: None,
            leaving: BTreeSet::new(),
        };

        if !timing.persist_interval.is_zero() {
            app.scheduler
                .every(now.elapsed, timing.persist_interval, Job::PersistTick);
        }
        app.rerender(now);

        info!(
            tasks = app.store.len(),
            tags = app.catalog.tags().len(),
            writes_held = app.store.is_held(),
            "task list started"
        );
        app
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn view(&self) -> &ListView {
        &self.view
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn dragging(&self) -> Option<TaskId> {
        self.drag.as_ref().map(DragSession::dragged)
    }

    pub fn is_leaving(&self, id: TaskId) -> bool {
        self.leaving.contains(&id)
    }

    /// Earliest moment `advance` has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Whether anything other than the persistence tick is queued.
    pub fn has_pending_work(&self) -> bool {
        self.debounce.is_pending(&self.scheduler)
            || self.settle.is_some()
            || !self.leaving.is_empty()
    }

    #[instrument(skip_all)]
    pub fn handle(&mut self, event: Event, now: Moment) -> Outcome {
        debug!(?event, elapsed_ms = now.elapsed.as_millis() as u64, "handling event");

        match event {
            Event::Submit(draft) => self.submit(&draft, now),
            Event::ToggleDone(id) => self.toggle_done(id, now),
            Event::Delete(id) => self.request_delete(id, now),
            Event::SetQuery(query) => {
                self.criteria.query = query;
                self.schedule_filter(now)
            }
            Event::SetPriority(priority) => {
                self.criteria.priority = priority;
                self.schedule_filter(now)
            }
            Event::SetTag(tag) => {
                self.criteria.tag = tag;
                self.schedule_filter(now)
            }
            Event::SetDue(due) => {
                self.criteria.due = due;
                self.schedule_filter(now)
            }
            Event::DragStart(id) => self.drag_start(id),
            Event::DragOver(target) => self.drag_over(target),
            Event::DragEnd => self.drag_end(now),
        }
    }

    /// Runs every job due at `now`. Returns whether the view changed.
    pub fn advance(&mut self, now: Moment) -> bool {
        let mut changed = false;

        for job in self.scheduler.due(now.elapsed) {
            match job {
                Job::RunFilter => {
                    debug!(criteria = ?self.criteria, "debounced filter fired");
                    self.rerender(now);
                    changed = true;
                }
                Job::Settle => {
                    self.settle = None;
                    changed |= self.view.settle();
                }
                Job::FinishDelete(id) => {
                    self.finish_delete(id, now);
                    changed = true;
                }
                Job::PersistTick => {
                    debug!("persistence tick");
                    self.store.persist();
                }
            }
        }

        changed
    }

    /// Final write before the host goes away.
    pub fn shutdown(&self) -> bool {
        info!(tasks = self.store.len(), "shutting down; final persist");
        self.store.persist()
    }

    fn submit(&mut self, draft: &TaskDraft, now: Moment) -> Outcome {
        match self.store.create(draft, now.epoch_ms) {
            Ok(task) => {
                info!(id = %task.id, title = %task.title, "task created");
                self.refresh_catalog();
                self.rerender(now);
                Outcome::Created(task.id)
            }
            Err(error) => {
                debug!(%error, "task rejected");
                Outcome::Rejected(error)
            }
        }
    }

    fn toggle_done(&mut self, id: TaskId, now: Moment) -> Outcome {
        let Some(done) = self.store.toggle_done(id) else {
            warn!(%id, "toggle for unknown task");
            return Outcome::Ignored;
        };
        debug!(%id, done, "toggled");
        self.store.persist();
        self.rerender(now);
        Outcome::Changed
    }

    fn request_delete(&mut self, id: TaskId, now: Moment) -> Outcome {
        if self.leaving.contains(&id) || self.store.get(id).is_none() {
            return Outcome::Ignored;
        }

        self.leaving.insert(id);
        let displayed = self.view.mark_leaving(id);
        self.scheduler
            .after(now.elapsed, self.timing.delete_delay, Job::FinishDelete(id));
        debug!(%id, displayed, "delete scheduled");
        Outcome::Scheduled
    }

    fn finish_delete(&mut self, id: TaskId, now: Moment) {
        self.leaving.remove(&id);
        self.view.remove(id);
        if self.store.remove(id).is_some() {
            info!(%id, "task deleted");
            self.store.persist();
            self.refresh_catalog();
        }
        self.rerender(now);
    }

    fn schedule_filter(&mut self, now: Moment) -> Outcome {
        self.debounce
            .trigger(&mut self.scheduler, now.elapsed, Job::RunFilter);
        Outcome::Scheduled
    }

    fn drag_start(&mut self, id: TaskId) -> Outcome {
        match DragSession::start(id, self.view.ids()) {
            Some(session) => {
                debug!(%id, "drag started");
                self.drag = Some(session);
                Outcome::Changed
            }
            None => Outcome::Ignored,
        }
    }

    fn drag_over(&mut self, target: TaskId) -> Outcome {
        let Some(session) = self.drag.as_mut() else {
            return Outcome::Ignored;
        };
        if !session.drag_over(target) {
            return Outcome::Ignored;
        }
        self.view.arrange(session.order());
        Outcome::Changed
    }

    /// Commits the dragged order into the collection.
    fn drag_end(&mut self, now: Moment) -> Outcome {
        let Some(session) = self.drag.take() else {
            return Outcome::Ignored;
        };

        let visible: Vec<TaskId> = session
            .finish()
            .into_iter()
            .filter(|id| self.store.get(*id).is_some())
            .collect();
        let merged = merge_visible_order(&self.store.ids(), &visible);

        match self.store.reorder(&merged) {
            Ok(()) => {
                debug!(order = ?merged, "reorder committed");
                self.store.persist();
            }
            Err(error) => warn!(%error, "discarding drag reorder"),
        }

        self.rerender(now);
        Outcome::Changed
    }

    /// Rebuilds the tag catalog. A selected tag that no longer exists falls
    /// back to `all`, so the tag control never shows an option it lacks.
    fn refresh_catalog(&mut self) {
        self.catalog = TagCatalog::from_tasks(self.store.tasks());
        if let TagFilter::Only(tag) = &self.criteria.tag
            && !self.catalog.contains(tag)
        {
            info!(%tag, "selected tag is gone; showing all tags");
            self.criteria.tag = TagFilter::All;
        }
    }

    fn rerender(&mut self, now: Moment) {
        let filtered = filter::apply(self.store.tasks(), &self.criteria, now.today);
        self.view.render(&filtered, now.today, &self.leaving);

        if self.view.has_entering() && self.settle.is_none() {
            self.settle = Some(self.scheduler.after(now.elapsed, Duration::ZERO, Job::Settle));
        }
    }
}
