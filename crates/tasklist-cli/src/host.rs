use std::time::{Duration, Instant};

use chrono::Utc;
use chrono_tz::Tz;
use tasklist_core::datetime::{resolve_timezone, today_in};
use tasklist_core::{App, Event, Moment, Outcome, TaskStore};
use tracing::debug;

use crate::config::Config;
use crate::file_store::FileStore;

/// Native event host: owns the app and supplies clock readings.
pub struct Host {
    app: App<FileStore>,
    started: Instant,
    tz: Tz,
}

impl Host {
    #[tracing::instrument(skip_all)]
    pub fn start(cfg: &Config, storage: FileStore) -> Self {
        let tz = resolve_timezone(cfg.timezone.as_deref());
        let started = Instant::now();
        let store = TaskStore::load(storage, &cfg.storage_key);
        let now = moment(started, tz);
        Self {
            app: App::start(store, cfg.timing(), now),
            started,
            tz,
        }
    }

    pub fn app(&self) -> &App<FileStore> {
        &self.app
    }

    pub fn now(&self) -> Moment {
        moment(self.started, self.tz)
    }

    pub fn handle(&mut self, event: Event) -> Outcome {
        let now = self.now();
        self.app.handle(event, now)
    }

    pub fn advance(&mut self) -> bool {
        let now = self.now();
        self.app.advance(now)
    }

    /// Time left until the next queued job, if any.
    pub fn until_next(&self) -> Option<Duration> {
        let deadline = self.app.next_deadline()?;
        Some(deadline.saturating_sub(self.started.elapsed()))
    }

    /// Blocks until debounced filters, settles, and pending deletes have run.
    /// The persistence tick alone does not keep this waiting.
    pub fn drain(&mut self) {
        while self.app.has_pending_work() {
            if let Some(wait) = self.until_next()
                && !wait.is_zero()
            {
                debug!(wait_ms = wait.as_millis() as u64, "waiting for queued work");
                std::thread::sleep(wait);
            }
            self.advance();
        }
    }

    pub fn shutdown(&self) -> bool {
        self.app.shutdown()
    }
}

fn moment(started: Instant, tz: Tz) -> Moment {
    let wall = Utc::now();
    Moment {
        elapsed: started.elapsed(),
        epoch_ms: u64::try_from(wall.timestamp_millis()).unwrap_or_default(),
        today: today_in(tz, wall),
    }
}
