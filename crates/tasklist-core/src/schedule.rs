//! Cooperative timer queue for a single event-processing thread.
//!
//! Time is a `Duration` measured from host start; the host supplies it on
//! every call, so nothing here reads a clock.

use std::time::Duration;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<J> {
    id: TimerId,
    deadline: Duration,
    period: Option<Duration>,
    job: J,
}

#[derive(Debug, Clone)]
pub struct Scheduler<J> {
    timers: Vec<Timer<J>>,
    next_id: u64,
}

impl<J> Default for Scheduler<J> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<J: Clone> Scheduler<J> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after(&mut self, now: Duration, delay: Duration, job: J) -> TimerId {
        self.push(now + delay, None, job)
    }

    /// Repeats every `period`, first firing one period from `now`.
    pub fn every(&mut self, now: Duration, period: Duration, job: J) -> TimerId {
        self.push(now + period, Some(period), job)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pops every job whose deadline has passed, earliest first; equal
    /// deadlines fire in scheduling order. Repeating timers are re-armed.
    pub fn due(&mut self, now: Duration) -> Vec<J> {
        let mut fired = Vec::new();

        loop {
            let Some(idx) = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.deadline <= now)
                .min_by_key(|(_, t)| (t.deadline, t.id))
                .map(|(idx, _)| idx)
            else {
                break;
            };

            let timer = self.timers.remove(idx);
            trace!(id = timer.id.0, deadline_ms = timer.deadline.as_millis() as u64, "timer fired");
            fired.push(timer.job.clone());

            if let Some(period) = timer.period
                && !period.is_zero()
            {
                self.timers.push(Timer {
                    deadline: timer.deadline + period,
                    ..timer
                });
            }
        }

        fired
    }

    fn push(&mut self, deadline: Duration, period: Option<Duration>, job: J) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            deadline,
            period,
            job,
        });
        id
    }
}

/// Trailing-edge debounce: only the last trigger in a burst fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TimerId>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn trigger<J: Clone>(&mut self, sched: &mut Scheduler<J>, now: Duration, job: J) -> TimerId {
        if let Some(prev) = self.pending.take() {
            sched.cancel(prev);
        }
        let id = sched.after(now, self.delay, job);
        self.pending = Some(id);
        id
    }

    pub fn is_pending<J: Clone>(&self, sched: &Scheduler<J>) -> bool {
        self.pending.is_some_and(|id| sched.is_pending(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn jobs_fire_in_deadline_order() {
        let mut sched = Scheduler::new();
        sched.after(ms(0), ms(300), "late");
        sched.after(ms(0), ms(100), "early");
        sched.after(ms(0), ms(100), "early-second");

        assert!(sched.due(ms(99)).is_empty());
        assert_eq!(sched.due(ms(300)), vec!["early", "early-second", "late"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn repeating_timer_rearms() {
        let mut sched = Scheduler::new();
        sched.every(ms(0), ms(30_000), "persist");
        assert!(sched.due(ms(29_999)).is_empty());
        assert_eq!(sched.due(ms(30_000)), vec!["persist"]);
        assert_eq!(sched.next_deadline(), Some(ms(60_000)));
        assert_eq!(sched.due(ms(95_000)), vec!["persist", "persist"]);
    }

    #[test]
    fn debounce_keeps_only_the_last_trigger() {
        let mut sched = Scheduler::new();
        let mut debounce = Debouncer::new(ms(300));

        debounce.trigger(&mut sched, ms(0), 1);
        debounce.trigger(&mut sched, ms(100), 2);
        debounce.trigger(&mut sched, ms(250), 3);

        assert!(sched.due(ms(549)).is_empty());
        assert!(debounce.is_pending(&sched));
        assert_eq!(sched.due(ms(550)), vec![3]);
        assert!(!debounce.is_pending(&sched));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut sched = Scheduler::new();
        let id = sched.after(ms(0), ms(10), ());
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        assert!(sched.due(ms(100)).is_empty());
    }
}
