//! # Tree Mutations
//!
//! Structural and property edits on a [`Document`], addressed by node id.
//!
//! ## Semantics
//!
//! ### Insert
//! - The node is unlinked from its current parent first, then spliced into
//!   the target's children (append by default, out-of-range clamps)
//! - Inserting into a strictly-leaf node is a no-op
//! - No cycle detection: inserting an ancestor into its own descendant is
//!   the caller's bug
//!
//! ### Remove vs unlink
//! - `unlink` detaches; the node stays registered and can be re-inserted
//! - `remove` detaches and, when the node was part of the live tree,
//!   notifies the document channel and the hub
//! - `remove_node` / `unlink_node` also purge the subtree and drop it from
//!   the registry (with and without notification)
//!
//! Unknown or purged ids make every operation a `false`/`None` no-op.

use serde_json::Value;
use tracing::debug;

use crate::document::{Document, DocumentEvent};
use crate::host::HubEvent;
use crate::node::{Node, NodeEvent, NodeId};
use crate::props::extra_key;
use crate::schema::{NodeSchema, TransformStage};

/// Input accepted by [`Document::insert_node`]
#[derive(Debug, Clone, PartialEq)]
pub enum Insertable {
    /// An existing node
    Node(NodeId),
    /// A subtree to build
    Schema(NodeSchema),
}

impl From<NodeSchema> for Insertable {
    fn from(schema: NodeSchema) -> Self {
        Insertable::Schema(schema)
    }
}

impl From<NodeId> for Insertable {
    fn from(id: NodeId) -> Self {
        Insertable::Node(id)
    }
}

impl Document {
    /// Move `node` under `parent` at `at` (append when `None`)
    pub fn insert(&mut self, parent: &str, node: &str, at: Option<usize>) -> bool {
        let inserted = self.insert_inner(parent, node, at);
        if inserted {
            self.commit();
        }
        inserted
    }

    /// Move `node` right before `reference`, which must be a child of `parent`
    pub fn insert_before(&mut self, parent: &str, node: &str, reference: &str) -> bool {
        self.insert_relative(parent, node, reference, 0)
    }

    /// Move `node` right after `reference`, which must be a child of `parent`
    pub fn insert_after(&mut self, parent: &str, node: &str, reference: &str) -> bool {
        self.insert_relative(parent, node, reference, 1)
    }

    fn insert_relative(&mut self, parent: &str, node: &str, reference: &str, offset: usize) -> bool {
        if node == reference {
            return false;
        }
        let is_child = self
            .live(parent)
            .and_then(Node::children)
            .is_some_and(|children| children.contains(reference));
        if !is_child {
            debug!(parent, reference, "reference is not a child of the target");
            return false;
        }
        if !self.can_insert(parent, node) {
            return false;
        }

        // the reference may shift once `node` leaves the same parent
        self.detach(node);
        let Some(index) = self
            .live(parent)
            .and_then(Node::children)
            .and_then(|children| children.index_of(reference))
        else {
            return false;
        };

        let inserted = self.link(parent, node, Some(index + offset));
        if inserted {
            self.commit();
        }
        inserted
    }

    fn can_insert(&self, parent: &str, node: &str) -> bool {
        if parent == node {
            debug!(node, "cannot insert a node into itself");
            return false;
        }
        let Some(target) = self.live(parent) else {
            debug!(parent, "insert into unknown node");
            return false;
        };
        if target.children().is_none() {
            debug!(parent, component = target.component_name(), "insert into leaf node");
            return false;
        }
        if self.live(node).is_none() {
            debug!(node, "insert of unknown node");
            return false;
        }
        true
    }

    pub(crate) fn insert_inner(&mut self, parent: &str, node: &str, at: Option<usize>) -> bool {
        if !self.can_insert(parent, node) {
            return false;
        }
        self.detach(node);
        self.link(parent, node, at)
    }

    fn link(&mut self, parent: &str, node: &str, at: Option<usize>) -> bool {
        if self.attach(parent, node, at).is_none() {
            return false;
        }
        self.post(HubEvent::NodeAdd {
            document_id: self.id().to_string(),
            node_id: NodeId::from(node),
        });
        true
    }

    /// Move `node` to position `to` within its current parent
    pub fn reorder(&mut self, node: &str, to: usize) -> bool {
        let Some(parent) = self.live(node).and_then(Node::parent_id).cloned() else {
            return false;
        };
        let moved = self
            .live_mut(parent.as_str())
            .and_then(Node::children_mut)
            .is_some_and(|children| children.reorder(node, to));
        if moved {
            self.commit();
        }
        moved
    }

    /// Detach `node` from its parent; it stays registered
    pub fn unlink(&mut self, node: &str) -> bool {
        if self.live(node).is_none() {
            return false;
        }
        let detached = self.detach(node).is_some();
        if detached {
            self.commit();
        }
        detached
    }

    /// Delete `node` from its parent's children; no-op when unparented
    pub fn remove(&mut self, node: &str) -> bool {
        let Some(target) = self.node(node) else {
            return false;
        };
        if target.parent_id().is_none() {
            debug!(node, "remove of unparented node");
            return false;
        }
        let linked = target.is_linked();

        self.detach(node);
        if linked {
            self.notify_removed(node);
        }
        self.commit();
        true
    }

    /// Remove, purge and unregister `node` with its subtree
    pub fn remove_node(&mut self, node: &str) -> bool {
        let removed = self.remove_node_inner(node);
        if removed {
            self.commit();
        }
        removed
    }

    fn remove_node_inner(&mut self, node: &str) -> bool {
        let Some(target) = self.node(node) else {
            return false;
        };
        let linked = target.is_linked();

        self.drop_subtree(node);
        if linked {
            self.notify_removed(node);
        }
        true
    }

    /// Remove several nodes as one history entry; returns how many were removed
    pub fn batch_remove_node(&mut self, nodes: &[&str]) -> usize {
        self.batch(|doc| {
            nodes
                .iter()
                .filter(|node| doc.remove_node_inner(node))
                .count()
        })
    }

    /// Purge and unregister `node` with its subtree, silently
    pub fn unlink_node(&mut self, node: &str) -> bool {
        if self.live(node).is_none() {
            return false;
        }
        self.drop_subtree(node);
        self.commit();
        true
    }

    /// Purge `node` with its subtree; the ids stay registered as purged
    pub fn purge_node(&mut self, node: &str) -> bool {
        if self.live(node).is_none() {
            return false;
        }
        self.purge_subtree(node);
        self.commit();
        true
    }

    fn notify_removed(&self, node: &str) {
        let node_id = NodeId::from(node);
        self.emit(DocumentEvent::NodeRemove(node_id.clone()));
        self.post(HubEvent::NodeRemove {
            document_id: self.id().to_string(),
            node_id,
        });
    }

    /// Insert an existing node or build one from a schema.
    ///
    /// With `copy`, the subtree is exported and rebuilt under fresh ids.
    pub fn insert_node(&mut self, parent: &str, thing: Insertable, at: Option<usize>, copy: bool) -> Option<NodeId> {
        self.batch(|doc| doc.insert_node_inner(parent, thing, at, copy))
    }

    /// Insert several nodes consecutively starting at `at`
    pub fn insert_nodes(&mut self, parent: &str, things: Vec<Insertable>, at: Option<usize>, copy: bool) -> Vec<NodeId> {
        self.batch(|doc| {
            let mut inserted = Vec::with_capacity(things.len());
            for thing in things {
                let at = at.map(|at| at + inserted.len());
                if let Some(id) = doc.insert_node_inner(parent, thing, at, copy) {
                    inserted.push(id);
                }
            }
            inserted
        })
    }

    fn insert_node_inner(&mut self, parent: &str, thing: Insertable, at: Option<usize>, copy: bool) -> Option<NodeId> {
        if self.live(parent).and_then(Node::children).is_none() {
            debug!(parent, "insert_node target cannot hold children");
            return None;
        }

        let id = match thing {
            Insertable::Node(id) if copy => {
                let mut schema = self.node(id.as_str())?.export(TransformStage::Serialize);
                schema.strip_ids();
                self.create_node_inner(schema, None)
            }
            Insertable::Node(id) => {
                self.live(id.as_str())?;
                id
            }
            Insertable::Schema(mut schema) => {
                if copy {
                    schema.strip_ids();
                }
                self.create_node_inner(schema, None)
            }
        };

        self.insert_inner(parent, id.as_str(), at).then_some(id)
    }

    // ----- props -----

    /// Set a prop path, creating missing intermediate objects
    pub fn set_prop_value(&mut self, node: &str, path: &str, value: Value) -> bool {
        let set = self
            .live_mut(node)
            .is_some_and(|target| target.props_mut().set(path, value, true));
        if set {
            self.commit();
        }
        set
    }

    pub fn clear_prop_value(&mut self, node: &str, path: &str) -> bool {
        let cleared = self
            .live_mut(node)
            .is_some_and(|target| target.props_mut().unset(path));
        if cleared {
            self.commit();
        }
        cleared
    }

    /// Set a framework extra; `isHidden` / `isLocked` also notify the node
    pub fn set_extra_prop_value(&mut self, node: &str, key: &str, value: Value) -> bool {
        match (key, value.as_bool()) {
            ("isHidden", Some(flag)) => self.hide(node, flag),
            ("isLocked", Some(flag)) => self.lock(node, flag),
            _ => self.set_prop_value(node, &extra_key(key), value),
        }
    }

    pub fn hide(&mut self, node: &str, flag: bool) -> bool {
        self.set_flag(node, "isHidden", flag, NodeEvent::VisibleChange(flag))
    }

    pub fn lock(&mut self, node: &str, flag: bool) -> bool {
        self.set_flag(node, "isLocked", flag, NodeEvent::LockChange(flag))
    }

    fn set_flag(&mut self, node: &str, key: &str, flag: bool, event: NodeEvent) -> bool {
        let Some(target) = self.live_mut(node) else {
            return false;
        };
        let changed = target.get_extra_prop_value(key).and_then(Value::as_bool) != Some(flag);
        target.props_mut().set(&extra_key(key), Value::Bool(flag), true);
        if changed {
            target.emit(event);
            self.commit();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Hub, NotificationHub};
    use crate::schema::DocumentSchema;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// R ─┬─ A
    ///    └─ B
    fn doc() -> Document {
        Document::new(Some(DocumentSchema::new(
            NodeSchema::new("Page")
                .with_id("R")
                .with_child(NodeSchema::new("Box").with_id("A"))
                .with_child(NodeSchema::new("Box").with_id("B")),
        )))
    }

    fn children(doc: &Document, id: &str) -> Vec<String> {
        doc.node(id)
            .unwrap()
            .child_ids()
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    #[test]
    fn test_insert_moves_between_parents() {
        let mut doc = doc();
        assert!(doc.insert("A", "B", None));

        assert_eq!(children(&doc, "R"), vec!["A"]);
        assert_eq!(children(&doc, "A"), vec!["B"]);
        assert_eq!(doc.node("B").unwrap().z_level(), 2);
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut doc = doc();
        let c = doc.create_node(NodeSchema::new("Box").with_id("C"));

        assert!(doc.insert("R", c.as_str(), Some(99)));
        assert_eq!(children(&doc, "R"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut doc = doc();
        doc.create_node(NodeSchema::new("Box").with_id("C"));

        assert!(doc.insert_before("R", "C", "A"));
        assert_eq!(children(&doc, "R"), vec!["C", "A", "B"]);

        assert!(doc.insert_after("R", "C", "B"));
        assert_eq!(children(&doc, "R"), vec!["A", "B", "C"]);

        // moving within the same parent accounts for the vacated slot
        assert!(doc.insert_after("R", "A", "B"));
        assert_eq!(children(&doc, "R"), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_insert_before_foreign_reference_is_noop() {
        let mut doc = doc();
        doc.create_node(NodeSchema::new("Box").with_id("C"));

        assert!(!doc.insert_before("A", "C", "B"));
        assert!(doc.node("C").unwrap().parent().is_none());
        assert_eq!(children(&doc, "R"), vec!["A", "B"]);
    }

    #[test]
    fn test_insert_misuse_is_noop() {
        let mut doc = doc();
        assert!(!doc.insert("missing", "A", None));
        assert!(!doc.insert("R", "missing", None));
        assert!(!doc.insert("A", "A", None));
        assert_eq!(children(&doc, "R"), vec!["A", "B"]);
    }

    #[test]
    fn test_remove_notifies_only_when_linked() {
        let mut doc = doc();
        let removed = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&removed);
        doc.on_node_remove(move |id| r.borrow_mut().push(id.to_string()));

        assert!(doc.remove("A"));
        assert!(!doc.remove("A"));
        assert!(doc.has_node("A"));
        assert_eq!(doc.node("B").unwrap().index(), Some(0));

        // a detached subtree is not part of the live tree
        doc.create_node(NodeSchema::new("Box").with_id("X").with_child(NodeSchema::new("Box").with_id("Y")));
        assert!(doc.remove("Y"));

        assert_eq!(*removed.borrow(), vec!["A".to_string()]);
    }

    #[test]
    fn test_remove_node_unregisters_subtree() {
        let mut doc = doc();
        doc.insert("A", "B", None);

        assert!(doc.remove_node("A"));
        assert!(!doc.has_node("A"));
        assert!(!doc.has_node("B"));
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn test_remove_node_on_root_clears_root() {
        let mut doc = doc();
        assert!(doc.remove_node("R"));
        assert!(doc.root_node().is_none());
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_purge_node_keeps_ids_unresolvable() {
        let mut doc = doc();
        assert!(doc.purge_node("A"));
        assert!(!doc.has_node("A"));
        assert!(!doc.purge_node("A"));
        assert_eq!(children(&doc, "R"), vec!["B"]);

        // a purged id may be allocated again
        let id = doc.create_node(NodeSchema::new("Text").with_id("A"));
        assert_eq!(id, "A");
        assert_eq!(doc.node("A").unwrap().component_name(), "Text");
    }

    #[test]
    fn test_unlink_keeps_node_registered() {
        let mut doc = doc();
        assert!(doc.unlink("A"));
        assert!(!doc.unlink("A"));
        assert!(doc.has_node("A"));
        assert!(!doc.node("A").unwrap().is_linked());

        assert!(doc.unlink_node("A"));
        assert!(!doc.has_node("A"));
    }

    #[test]
    fn test_batch_remove_node() {
        let mut doc = doc();
        let levels = doc.history().undo_levels();

        assert_eq!(doc.batch_remove_node(&["A", "B", "missing"]), 2);
        assert_eq!(doc.history().undo_levels(), levels + 1);
        assert!(children(&doc, "R").is_empty());
    }

    #[test]
    fn test_insert_node_copy_uses_fresh_ids() {
        let mut doc = doc();
        doc.set_prop_value("A", "title", json!("card"));

        let copy = doc.insert_node("R", Insertable::Node(NodeId::from("A")), None, true).unwrap();

        assert_ne!(copy, "A");
        assert_eq!(children(&doc, "R"), vec!["A".to_string(), "B".to_string(), copy.to_string()]);
        assert_eq!(doc.node(copy.as_str()).unwrap().get_prop_value("title"), Some(&json!("card")));
    }

    #[test]
    fn test_insert_nodes_consecutive() {
        let mut doc = doc();
        let ids = doc.insert_nodes(
            "R",
            vec![NodeSchema::new("Text").into(), NodeSchema::new("Image").into()],
            Some(1),
            false,
        );

        assert_eq!(ids.len(), 2);
        let order = children(&doc, "R");
        assert_eq!(order[1], ids[0].to_string());
        assert_eq!(order[2], ids[1].to_string());
        assert_eq!(order[3], "B");
    }

    #[test]
    fn test_insert_posts_to_hub() {
        let hub = Rc::new(Hub::new());
        let added = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::clone(&added);
        hub.on_event(
            "node:add",
            Box::new(move |event| {
                if let HubEvent::NodeAdd { node_id, .. } = event {
                    a.borrow_mut().push(node_id.to_string());
                }
            }),
        );

        let mut doc = Document::builder()
            .schema(DocumentSchema::new(NodeSchema::new("Page").with_id("R")))
            .hub(hub)
            .build();
        let c = doc.create_node(NodeSchema::new("Box").with_id("C"));
        doc.insert("R", c.as_str(), None);

        assert_eq!(*added.borrow(), vec!["C".to_string()]);
    }

    #[test]
    fn test_hide_and_lock_emit_on_change_only() {
        let mut doc = doc();
        let events = Rc::new(RefCell::new(Vec::new()));
        let e = Rc::clone(&events);
        doc.node("A").unwrap().on_visible_change(move |flag| e.borrow_mut().push(flag));

        assert!(doc.hide("A", true));
        assert!(doc.hide("A", true));
        assert!(doc.set_extra_prop_value("A", "isHidden", json!(false)));
        assert!(doc.lock("A", true));

        let a = doc.node("A").unwrap();
        assert!(!a.is_hidden());
        assert!(a.is_locked());
        assert_eq!(*events.borrow(), vec![true, false]);
    }

    #[test]
    fn test_prop_edits_record_history() {
        let mut doc = doc();
        assert!(doc.set_prop_value("A", "style.color", json!("red")));
        assert!(doc.clear_prop_value("A", "style.color"));
        assert!(!doc.clear_prop_value("A", "style.color"));
        assert!(!doc.set_prop_value("missing", "x", json!(1)));

        assert_eq!(doc.history().undo_levels(), 2);
    }

    #[test]
    fn test_reorder_within_parent() {
        let mut doc = doc();
        assert!(doc.reorder("B", 0));
        assert_eq!(children(&doc, "R"), vec!["B", "A"]);
        assert!(!doc.reorder("R", 0));
    }
}
