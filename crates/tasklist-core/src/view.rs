//! The rendered list as a projection of the filtered tasks.
//!
//! Hosts draw whatever `ListView::items` holds; nothing is ever read back
//! from the drawn list into the collection.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::task::{Priority, Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Just inserted; settles on the next pass.
    Entering,
    Settled,
    /// Slated for deferred removal.
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub done: bool,
    pub overdue: bool,
    pub phase: Phase,
}

impl ItemView {
    fn project(task: &Task, today: NaiveDate, phase: Phase) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: task.priority,
            tags: task.tags.clone(),
            done: task.done,
            overdue: task.is_overdue(today),
            phase,
        }
    }

    pub fn classes(&self) -> Vec<&'static str> {
        let mut out = vec!["task-item"];
        if self.done {
            out.push("task-done");
        }
        if self.overdue {
            out.push("task-overdue");
        }
        out.push(match self.phase {
            Phase::Entering => "entering",
            Phase::Settled => "show",
            Phase::Leaving => "fade-out",
        });
        out
    }

    /// Element id of the title node; the row is labelled by it.
    pub fn title_element_id(&self) -> String {
        format!("task-title-{}", self.id)
    }

    /// Element id of the description node; the row is described by it.
    pub fn description_element_id(&self) -> String {
        format!("task-desc-{}", self.id)
    }

    pub fn done_button_label(&self) -> &'static str {
        if self.done {
            "Mark as not done"
        } else {
            "Mark as done"
        }
    }
}

pub const DELETE_BUTTON_LABEL: &str = "Delete task";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    items: Vec<ItemView>,
}

impl ListView {
    pub fn items(&self) -> &[ItemView] {
        &self.items
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.items.iter().map(|i| i.id).collect()
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    pub fn get(&self, id: TaskId) -> Option<&ItemView> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replaces the drawn items with one item per filtered task.
    pub fn render(&mut self, filtered: &[&Task], today: NaiveDate, leaving: &BTreeSet<TaskId>) {
        let previous = std::mem::take(&mut self.items);
        self.items = filtered
            .iter()
            .map(|task| {
                let phase = if leaving.contains(&task.id) {
                    Phase::Leaving
                } else {
                    match previous.iter().find(|i| i.id == task.id) {
                        Some(prev) if prev.phase != Phase::Leaving => prev.phase,
                        _ => Phase::Entering,
                    }
                };
                ItemView::project(task, today, phase)
            })
            .collect();
    }

    /// Second phase of insertion. Returns whether anything changed.
    pub fn settle(&mut self) -> bool {
        let mut changed = false;
        for item in &mut self.items {
            if item.phase == Phase::Entering {
                item.phase = Phase::Settled;
                changed = true;
            }
        }
        changed
    }

    pub fn has_entering(&self) -> bool {
        self.items.iter().any(|i| i.phase == Phase::Entering)
    }

    pub fn mark_leaving(&mut self, id: TaskId) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.phase = Phase::Leaving;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: TaskId) -> Option<ItemView> {
        let idx = self.position(id)?;
        Some(self.items.remove(idx))
    }

    /// Reflects a live drag by moving items to follow `order`. Ids missing
    /// from the view are ignored.
    pub fn arrange(&mut self, order: &[TaskId]) {
        let mut remaining = std::mem::take(&mut self.items);
        for id in order {
            if let Some(idx) = remaining.iter().position(|i| i.id == *id) {
                self.items.push(remaining.remove(idx));
            }
        }
        self.items.extend(remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).expect("date")
    }

    fn task(id: u64, due: Option<NaiveDate>, done: bool) -> Task {
        Task {
            id: TaskId(id),
            title: format!("t{id}"),
            description: String::new(),
            tags: vec!["x".to_string()],
            due_date: due,
            priority: Priority::Medium,
            done,
        }
    }

    #[test]
    fn accessibility_ids_and_labels_follow_the_task() {
        let open = task(7, None, false);
        let closed = task(8, None, true);
        let mut view = ListView::default();
        view.render(&[&open, &closed], today(), &BTreeSet::new());

        let first = &view.items()[0];
        assert_eq!(first.title_element_id(), "task-title-7");
        assert_eq!(first.description_element_id(), "task-desc-7");
        assert_eq!(first.done_button_label(), "Mark as done");
        assert_eq!(view.items()[1].done_button_label(), "Mark as not done");
    }

    #[test]
    fn new_items_enter_then_settle() {
        let a = task(1, None, false);
        let b = task(2, None, false);
        let mut view = ListView::default();

        view.render(&[&a], today(), &BTreeSet::new());
        assert_eq!(view.items()[0].phase, Phase::Entering);
        assert!(view.settle());
        assert!(!view.settle());

        view.render(&[&a, &b], today(), &BTreeSet::new());
        assert_eq!(view.get(TaskId(1)).map(|i| i.phase), Some(Phase::Settled));
        assert_eq!(view.get(TaskId(2)).map(|i| i.phase), Some(Phase::Entering));
    }

    #[test]
    fn leaving_items_survive_rerender() {
        let a = task(1, None, false);
        let mut view = ListView::default();
        view.render(&[&a], today(), &BTreeSet::new());
        view.settle();
        view.mark_leaving(a.id);

        let leaving = BTreeSet::from([a.id]);
        view.render(&[&a], today(), &leaving);
        assert_eq!(view.items()[0].phase, Phase::Leaving);
    }

    #[test]
    fn done_and_overdue_styles_combine() {
        let late_done = task(1, NaiveDate::from_ymd_opt(2024, 6, 1), true);
        let mut view = ListView::default();
        view.render(&[&late_done], today(), &BTreeSet::new());
        assert_eq!(
            view.items()[0].classes(),
            vec!["task-item", "task-done", "task-overdue", "entering"]
        );
    }

    #[test]
    fn arrange_follows_drag_order() {
        let (a, b, c) = (task(1, None, false), task(2, None, false), task(3, None, false));
        let mut view = ListView::default();
        view.render(&[&a, &b, &c], today(), &BTreeSet::new());
        view.arrange(&[TaskId(3), TaskId(1), TaskId(2)]);
        assert_eq!(view.ids(), vec![TaskId(3), TaskId(1), TaskId(2)]);
    }
}
