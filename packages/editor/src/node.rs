//! # Node
//!
//! One element of the document tree.
//!
//! Nodes are owned by the [`Document`] registry. A node owns its
//! [`Props`] and its [`NodeChildren`] (ordered child ids); `parent` is a
//! non-owning back-reference used for lookup only. All reparenting goes
//! through `Document::insert*` / `Document::unlink`, which keep both sides
//! of the link in sync.
//!
//! Read-only navigation (index, depth, siblings, containment) lives on
//! [`NodeRef`], a borrowed view pairing a node with its document. Derived
//! values are recomputed on every call.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::Document;
use crate::event_bus::{EventBus, Unsubscribe};
use crate::host::ComponentMeta;
use crate::node_children::NodeChildren;
use crate::position::{self, PositionNo};
use crate::props::{extra_key, PropChange, Props, BUILTIN_EXTRAS};
use crate::schema::{NodeSchema, TransformStage};

/// Node identifier, unique within a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Events on a node's own channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    VisibleChange(bool),
    LockChange(bool),
}

pub struct Node {
    id: NodeId,
    component_name: String,
    parent: Option<NodeId>,
    children: Option<NodeChildren>,
    props: Props,
    purged: bool,
    emitter: EventBus<NodeEvent>,
}

impl Node {
    /// `container == false` makes a strictly-leaf node without a child list
    pub(crate) fn new(
        id: NodeId,
        component_name: String,
        props: Map<String, Value>,
        extras: Map<String, Value>,
        container: bool,
    ) -> Self {
        let mut node = Self {
            id,
            component_name,
            parent: None,
            children: container.then(NodeChildren::new),
            props: Props::new(props, extras),
            purged: false,
            emitter: EventBus::new("Node"),
        };
        node.init_builtin_props();
        node
    }

    fn init_builtin_props(&mut self) {
        for (key, default) in BUILTIN_EXTRAS {
            self.props.seed(&extra_key(key), Value::Bool(default));
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> Option<&NodeChildren> {
        self.children.as_ref()
    }

    /// Child ids in order (empty for leaves)
    pub fn child_ids(&self) -> &[NodeId] {
        match &self.children {
            Some(children) => children.as_slice(),
            None => &[],
        }
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn is_purged(&self) -> bool {
        self.purged
    }

    /// Has at least one child
    pub fn is_parental(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_parental()
    }

    pub fn get_prop_value(&self, path: &str) -> Option<&Value> {
        self.props.get(path)
    }

    pub fn get_extra_prop_value(&self, key: &str) -> Option<&Value> {
        self.props.get(&extra_key(key))
    }

    pub fn is_hidden(&self) -> bool {
        self.flag("isHidden")
    }

    pub fn is_locked(&self) -> bool {
        self.flag("isLocked")
    }

    fn flag(&self, key: &str) -> bool {
        self.get_extra_prop_value(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn on_visible_change(&self, listener: impl Fn(bool) + 'static) -> Unsubscribe {
        self.emitter.on(move |event| {
            if let NodeEvent::VisibleChange(flag) = event {
                listener(*flag);
            }
        })
    }

    pub fn on_lock_change(&self, listener: impl Fn(bool) + 'static) -> Unsubscribe {
        self.emitter.on(move |event| {
            if let NodeEvent::LockChange(flag) = event {
                listener(*flag);
            }
        })
    }

    pub fn on_prop_change(&self, listener: impl Fn(&PropChange) + 'static) -> Unsubscribe {
        self.props.on_change(listener)
    }

    /// Strictly-leaf nodes never change children; they return an inert handle
    pub fn on_children_change(&self, listener: impl Fn(&Vec<NodeId>) + 'static) -> Unsubscribe {
        match &self.children {
            Some(children) => children.on_change(listener),
            None => Unsubscribe::noop(),
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn take_parent(&mut self) -> Option<NodeId> {
        self.parent.take()
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut NodeChildren> {
        self.children.as_mut()
    }

    pub(crate) fn props_mut(&mut self) -> &mut Props {
        &mut self.props
    }

    /// Replace props and extras wholesale, then re-seed built-ins
    pub(crate) fn import_props(&mut self, props: Map<String, Value>, extras: Map<String, Value>) {
        self.props.import(props, extras);
        self.init_builtin_props();
    }

    pub(crate) fn emit(&self, event: NodeEvent) {
        self.emitter.emit(&event);
    }

    /// Terminal; idempotent
    pub(crate) fn purge(&mut self) {
        if self.purged {
            return;
        }
        self.purged = true;
        self.props.purge();
        self.emitter.clear();
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("component_name", &self.component_name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("purged", &self.purged)
            .finish()
    }
}

/// Borrowed view of a node inside its document
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    document: &'a Document,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(document: &'a Document, node: &'a Node) -> Self {
        Self { document, node }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    fn at(&self, id: &NodeId) -> Option<NodeRef<'a>> {
        self.document.node(id.as_str())
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.as_ref().and_then(|id| self.at(id))
    }

    pub fn children_nodes(&self) -> Vec<NodeRef<'a>> {
        self.node.child_ids().iter().filter_map(|id| self.at(id)).collect()
    }

    /// Position among the parent's children; `None` when unparented
    pub fn index(&self) -> Option<usize> {
        self.parent()?.node.children()?.index_of(self.node.id.as_str())
    }

    /// Depth from the top of the parent chain (root = 0)
    pub fn z_level(&self) -> usize {
        position::z_level(self.document, self.node.id.as_str())
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        let index = self.index()?;
        let parent = self.parent()?;
        parent.node.children()?.get(index + 1).and_then(|id| self.at(id))
    }

    pub fn prev_sibling(&self) -> Option<NodeRef<'a>> {
        let index = self.index()?.checked_sub(1)?;
        let parent = self.parent()?;
        parent.node.children()?.get(index).and_then(|id| self.at(id))
    }

    pub fn is_root(&self) -> bool {
        self.document.root_id() == Some(&self.node.id)
    }

    pub fn root(&self) -> Option<NodeRef<'a>> {
        self.document.root_node()
    }

    /// Whether the parent chain reaches the document root
    pub fn is_linked(&self) -> bool {
        let mut current = Some(*self);
        while let Some(node) = current {
            if node.is_root() {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Ancestors from the parent upwards
    pub fn ancestors(&self) -> Vec<NodeRef<'a>> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            ancestors.push(node);
        }
        ancestors
    }

    /// Depth-first, pre-order
    pub fn descendants(&self) -> Vec<NodeRef<'a>> {
        let mut descendants = Vec::new();
        let mut stack: Vec<NodeRef<'a>> = self.children_nodes().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children_nodes().into_iter().rev());
            descendants.push(node);
        }
        descendants
    }

    /// Whether this node lies on `target`'s parent chain (a node counts as its own ancestor)
    pub fn is_ancestor_of(&self, target: &str) -> bool {
        let Some(target) = self.document.node(target) else {
            return false;
        };
        target.chain_contains(self.node.id.as_str())
    }

    /// Whether `target` lies on this node's parent chain, this node included
    pub fn is_descendant_of(&self, target: &str) -> bool {
        self.chain_contains(target)
    }

    fn chain_contains(&self, id: &str) -> bool {
        let mut current = Some(*self);
        while let Some(node) = current {
            if node.node.id == id {
                return true;
            }
            current = node.parent();
        }
        false
    }

    pub fn contains(&self, other: &str) -> bool {
        position::contains(self.document, self.node.id.as_str(), other)
    }

    pub fn compare_position(&self, other: &str) -> PositionNo {
        position::compare_position(self.document, self.node.id.as_str(), other)
    }

    pub fn get_z_level_top(&self, level: usize) -> Option<NodeRef<'a>> {
        let id = position::get_z_level_top(self.document, self.node.id.as_str(), level)?;
        self.document.node(id)
    }

    pub fn component_meta(&self) -> Option<ComponentMeta> {
        self.document.component_meta(&self.node.component_name)
    }

    pub fn export(&self, stage: TransformStage) -> NodeSchema {
        let (props, extras) = self.node.props.export(stage);
        NodeSchema {
            id: Some(self.node.id.to_string()),
            component_name: self.node.component_name.clone(),
            props,
            children: self.children_nodes().iter().map(|child| child.export(stage)).collect(),
            extras,
        }
    }
}

impl Deref for NodeRef<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document) && self.node.id == other.node.id
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.node.id).finish()
    }
}
