use std::collections::HashSet;

use crate::task::TaskId;

/// An in-progress drag over the displayed items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    dragged: TaskId,
    order: Vec<TaskId>,
}

impl DragSession {
    /// Starts dragging `dragged` within `visible`. Returns `None` when the
    /// item is not displayed.
    pub fn start(dragged: TaskId, visible: Vec<TaskId>) -> Option<Self> {
        visible.contains(&dragged).then_some(Self {
            dragged,
            order: visible,
        })
    }

    pub fn dragged(&self) -> TaskId {
        self.dragged
    }

    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// Moves the dragged item in front of `target`. Returns whether the order
    /// changed.
    pub fn drag_over(&mut self, target: TaskId) -> bool {
        if target == self.dragged {
            return false;
        }
        let Some(from) = self.order.iter().position(|id| *id == self.dragged) else {
            return false;
        };
        if !self.order.contains(&target) {
            return false;
        }

        let dragged = self.order.remove(from);
        let Some(to) = self.order.iter().position(|id| *id == target) else {
            self.order.insert(from, dragged);
            return false;
        };
        self.order.insert(to, dragged);
        to != from
    }

    pub fn finish(self) -> Vec<TaskId> {
        self.order
    }
}

/// Folds the new relative order of the visible items back into the full
/// collection order. Slots held by visible ids are refilled in sequence;
/// hidden ids keep their slots.
pub fn merge_visible_order(full: &[TaskId], visible_new: &[TaskId]) -> Vec<TaskId> {
    let visible: HashSet<TaskId> = visible_new.iter().copied().collect();
    let mut next_visible = visible_new.iter().copied();

    full.iter()
        .map(|id| {
            if visible.contains(id) {
                next_visible.next().unwrap_or(*id)
            } else {
                *id
            }
        })
        .collect()
}
