use std::collections::HashSet;

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ids::IdAllocator;
use crate::storage::KeyValueStore;
use crate::task::{Task, TaskDraft, TaskId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("reorder lists {got} tasks but the collection holds {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("task {0} is not in the collection")]
    Unknown(TaskId),

    #[error("task {0} appears more than once")]
    Repeated(TaskId),
}

/// The authoritative, ordered task collection and its persisted mirror.
#[derive(Debug)]
pub struct TaskStore<S> {
    storage: S,
    key: String,
    tasks: Vec<Task>,
    ids: IdAllocator,
    /// Set when the stored payload could not be read in full. Writes are held
    /// until the collection is changed, so unread data is not overwritten.
    held: bool,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Reads the collection from `storage`. Records that fail to decode are
    /// skipped; missing, unreadable, or malformed data start an empty
    /// collection. Any lossy load holds writes until the first change.
    #[tracing::instrument(skip(storage))]
    pub fn load(storage: S, key: &str) -> Self {
        let (tasks, held) = match read_tasks(&storage, key) {
            Ok(Some(loaded)) => {
                let held = loaded.skipped > 0;
                if held {
                    warn!(
                        key,
                        skipped = loaded.skipped,
                        "some stored tasks could not be read; holding writes until the next change"
                    );
                }
                (loaded.tasks, held)
            }
            Ok(None) => {
                debug!(key, "no stored tasks; starting empty");
                (Vec::new(), false)
            }
            Err(error) => {
                warn!(key, error = %format!("{error:#}"), "failed to load tasks; starting empty");
                (Vec::new(), true)
            }
        };

        info!(key, count = tasks.len(), "loaded task collection");

        Self {
            storage,
            key: key.to_string(),
            ids: IdAllocator::seeded_from(&tasks),
            tasks,
            held,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether writes are held after a lossy load.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Validates `draft`, appends the new task, and persists.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn create(&mut self, draft: &TaskDraft, now_ms: u64) -> Result<Task, ValidationError> {
        let id = self.ids.peek(now_ms);
        let task = draft.validate(&self.tasks, id)?;
        self.append(task.clone());
        self.persist();
        Ok(task)
    }

    pub fn append(&mut self, task: Task) {
        self.ids.commit(task.id);
        self.held = false;
        debug!(id = %task.id, "appending task");
        self.tasks.push(task);
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        self.held = false;
        debug!(%id, "removing task");
        Some(self.tasks.remove(idx))
    }

    /// Flips `done` and returns the new value.
    pub fn toggle_done(&mut self, id: TaskId) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.done = !task.done;
        let done = task.done;
        self.held = false;
        debug!(%id, done, "toggled task");
        Some(done)
    }

    /// Replaces the ordering with `order`, which must be a permutation of the
    /// current ids.
    pub fn reorder(&mut self, order: &[TaskId]) -> Result<(), ReorderError> {
        if order.len() != self.tasks.len() {
            return Err(ReorderError::LengthMismatch {
                expected: self.tasks.len(),
                got: order.len(),
            });
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !seen.insert(*id) {
                return Err(ReorderError::Repeated(*id));
            }
            if self.get(*id).is_none() {
                return Err(ReorderError::Unknown(*id));
            }
        }

        let mut remaining = std::mem::take(&mut self.tasks);
        for id in order {
            if let Some(idx) = remaining.iter().position(|t| t.id == *id) {
                self.tasks.push(remaining.swap_remove(idx));
            }
        }
        self.held = false;
        debug!(count = self.tasks.len(), "reordered tasks");
        Ok(())
    }

    /// Writes the whole collection, logging instead of raising on failure.
    /// Returns false without writing while writes are held.
    pub fn persist(&self) -> bool {
        if self.held {
            debug!(key = %self.key, "writes held after a lossy load; skipping persist");
            return false;
        }
        match self.try_persist() {
            Ok(()) => true,
            Err(error) => {
                warn!(key = %self.key, error = %format!("{error:#}"), "failed to persist tasks");
                false
            }
        }
    }

    #[tracing::instrument(skip(self), fields(key = %self.key, count = self.tasks.len()))]
    pub fn try_persist(&self) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&self.tasks).context("failed to serialize tasks")?;
        self.storage
            .set(&self.key, &payload)
            .with_context(|| format!("failed to write key {}", self.key))?;
        debug!("persisted tasks");
        Ok(())
    }
}

struct Loaded {
    tasks: Vec<Task>,
    skipped: usize,
}

fn read_tasks<S: KeyValueStore>(storage: &S, key: &str) -> anyhow::Result<Option<Loaded>> {
    let Some(raw) = storage
        .get(key)
        .with_context(|| format!("failed to read key {key}"))?
    else {
        return Ok(None);
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }

    let records: Vec<serde_json::Value> =
        serde_json::from_str(&raw).with_context(|| format!("failed parsing key {key}"))?;

    let mut tasks = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Task>(record) {
            Ok(task) => tasks.push(task),
            Err(error) => {
                warn!(key, index, %error, "skipping unreadable task record");
                skipped += 1;
            }
        }
    }

    Ok(Some(Loaded { tasks, skipped }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DEFAULT_TASKS_KEY, MemoryStore};
    use crate::task::Priority;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow::anyhow!("quota exceeded"))
        }

        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            tags_input: "work".to_string(),
            priority: Priority::Low,
            ..TaskDraft::default()
        }
    }

    #[test]
    fn malformed_storage_loads_empty() {
        let storage = MemoryStore::with_entry(DEFAULT_TASKS_KEY, "{not json");
        let store = TaskStore::load(&storage, DEFAULT_TASKS_KEY);
        assert!(store.is_empty());
    }

    const MIXED: &str = r#"[
        {"id":1,"title":"keep me","description":"","tags":["home"],"dueDate":"","priority":"low","done":false},
        {"id":2,"title":"broken","description":"","tags":["home"],"dueDate":"","priority":"urgent","done":false},
        {"id":3,"title":"bad date","description":"","tags":["home"],"dueDate":"15/06/2024","priority":"high","done":false}
    ]"#;

    #[test]
    fn unreadable_records_are_skipped_and_writes_held() {
        let storage = MemoryStore::with_entry(DEFAULT_TASKS_KEY, MIXED);
        let mut store = TaskStore::load(&storage, DEFAULT_TASKS_KEY);

        assert_eq!(store.ids(), vec![TaskId(1)]);
        assert!(store.is_held());
        assert!(!store.persist());
        assert_eq!(
            storage.get(DEFAULT_TASKS_KEY).expect("get").as_deref(),
            Some(MIXED)
        );

        assert_eq!(store.toggle_done(TaskId(1)), Some(true));
        assert!(!store.is_held());
        assert!(store.persist());
        let saved: Vec<Task> =
            serde_json::from_str(&storage.get(DEFAULT_TASKS_KEY).expect("get").expect("saved"))
                .expect("json");
        assert_eq!(saved.len(), 1);
        assert!(saved[0].done);
    }

    #[test]
    fn malformed_storage_is_not_overwritten_until_changed() {
        let storage = MemoryStore::with_entry(DEFAULT_TASKS_KEY, "{not json");
        let mut store = TaskStore::load(&storage, DEFAULT_TASKS_KEY);
        assert!(!store.persist());
        assert_eq!(
            storage.get(DEFAULT_TASKS_KEY).expect("get").as_deref(),
            Some("{not json")
        );

        store.create(&draft("fresh"), 5).expect("valid draft");
        assert!(storage.get(DEFAULT_TASKS_KEY).expect("get").is_some_and(|raw| raw.contains("fresh")));
    }

    #[test]
    fn clean_load_does_not_hold_writes() {
        let storage = MemoryStore::new();
        let store = TaskStore::load(&storage, DEFAULT_TASKS_KEY);
        assert!(!store.is_held());
        assert!(store.persist());
    }

    #[test]
    fn storage_failures_do_not_touch_memory() {
        let mut store = TaskStore::load(BrokenStore, DEFAULT_TASKS_KEY);
        assert!(store.is_empty());

        let task = store.create(&draft("still here"), 10).expect("valid draft");
        assert!(!store.persist());
        assert_eq!(store.tasks(), &[task]);
    }

    #[test]
    fn rejected_create_leaves_collection_alone() {
        let storage = MemoryStore::new();
        let mut store = TaskStore::load(&storage, DEFAULT_TASKS_KEY);
        store.create(&draft("a"), 1).expect("valid draft");
        let before = storage.get(DEFAULT_TASKS_KEY).expect("get");

        let err = store.create(&draft("a"), 2).expect_err("duplicate");
        assert!(matches!(err, ValidationError::Duplicate { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(storage.get(DEFAULT_TASKS_KEY).expect("get"), before);
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let storage = MemoryStore::new();
        let mut store = TaskStore::load(&storage, DEFAULT_TASKS_KEY);
        let a = store.create(&draft("a"), 1).expect("a").id;
        let b = store.create(&draft("b"), 2).expect("b").id;

        assert_eq!(
            store.reorder(&[a]),
            Err(ReorderError::LengthMismatch { expected: 2, got: 1 })
        );
        assert_eq!(store.reorder(&[a, a]), Err(ReorderError::Repeated(a)));
        assert_eq!(
            store.reorder(&[a, TaskId(99)]),
            Err(ReorderError::Unknown(TaskId(99)))
        );
        assert_eq!(store.ids(), vec![a, b]);

        store.reorder(&[b, a]).expect("permutation");
        assert_eq!(store.ids(), vec![b, a]);
    }

    #[test]
    fn remove_of_unknown_id_is_a_no_op() {
        let storage = MemoryStore::new();
        let mut store = TaskStore::load(&storage, DEFAULT_TASKS_KEY);
        store.create(&draft("a"), 1).expect("a");
        assert_eq!(store.remove(TaskId(42)), None);
        assert_eq!(store.len(), 1);
    }
}
