//! Ordered child list of a node.
//!
//! Holds child *ids*; the nodes themselves live in the document registry.
//! Emits the full ordered list after every change.

use crate::event_bus::{EventBus, Unsubscribe};
use crate::node::NodeId;

pub struct NodeChildren {
    children: Vec<NodeId>,
    emitter: EventBus<Vec<NodeId>>,
}

impl NodeChildren {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            emitter: EventBus::new("NodeChildren"),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeId> {
        self.children.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.children.iter().position(|child| child.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.children.iter()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.children
    }

    /// Insert at `at` (append when `None`), clamped to `[0, len]`
    pub fn insert(&mut self, id: NodeId, at: Option<usize>) -> usize {
        let index = at.unwrap_or(self.children.len()).min(self.children.len());
        self.children.insert(index, id);
        self.notify();
        index
    }

    /// Remove `id`, returning its former index
    pub fn delete(&mut self, id: &str) -> Option<usize> {
        let index = self.index_of(id)?;
        self.children.remove(index);
        self.notify();
        Some(index)
    }

    /// Replace `delete_count` children starting at `start` with `items`.
    ///
    /// `start` is clamped to `[0, len]`; returns the removed ids.
    pub fn splice(&mut self, start: usize, delete_count: usize, items: Vec<NodeId>) -> Vec<NodeId> {
        let start = start.min(self.children.len());
        let end = start.saturating_add(delete_count).min(self.children.len());
        let removed: Vec<NodeId> = self.children.splice(start..end, items).collect();
        self.notify();
        removed
    }

    /// Move `id` to position `to` (clamped); no-op when `id` is not a child
    pub fn reorder(&mut self, id: &str, to: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let item = self.children.remove(from);
        let to = to.min(self.children.len());
        self.children.insert(to, item);
        if from != to {
            self.notify();
        }
        true
    }

    pub(crate) fn take_all(&mut self) -> Vec<NodeId> {
        let taken = std::mem::take(&mut self.children);
        if !taken.is_empty() {
            self.notify();
        }
        taken
    }

    pub fn on_change(&self, listener: impl Fn(&Vec<NodeId>) + 'static) -> Unsubscribe {
        self.emitter.on(listener)
    }

    fn notify(&self) {
        self.emitter.emit(&self.children);
    }
}

impl Default for NodeChildren {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeChildren {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.children.iter()).finish()
    }
}
