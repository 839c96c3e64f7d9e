use crate::task::{Task, TaskId};

/// Hands out timestamp-seeded ids that never repeat, even when two tasks
/// are created within the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn seeded_from(tasks: &[Task]) -> Self {
        Self {
            last: tasks.iter().map(|t| t.id.0).max().unwrap_or(0),
        }
    }

    /// Returns `max(now_ms, last + 1)` without committing it.
    pub fn peek(&self, now_ms: u64) -> TaskId {
        TaskId(now_ms.max(self.last.saturating_add(1)))
    }

    pub fn commit(&mut self, id: TaskId) {
        self.last = self.last.max(id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut ids = IdAllocator::default();
        let a = ids.peek(1_000);
        ids.commit(a);
        let b = ids.peek(1_000);
        ids.commit(b);
        assert_eq!(a, TaskId(1_000));
        assert_eq!(b, TaskId(1_001));
    }

    #[test]
    fn clock_going_backwards_does_not_reuse_ids() {
        let mut ids = IdAllocator::default();
        ids.commit(TaskId(5_000));
        assert_eq!(ids.peek(4_000), TaskId(5_001));
        assert_eq!(ids.peek(9_000), TaskId(9_000));
    }
}
