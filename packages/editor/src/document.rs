//! # Document
//!
//! One editable component tree plus its id registry and change history.
//!
//! The document is the arena: `nodes` owns every [`Node`] by id, including
//! nodes that are structurally unlinked but not yet purged, so ids stay
//! resolvable while history replays. The tree shape lives in each node's
//! child list and parent back-reference; both sides are only ever changed
//! together (see `mutations.rs`).
//!
//! ## Lifecycle
//!
//! ```text
//! schema ──build──→ Document ──mutate──→ commit ──→ History
//!                      ↑                               │
//!                      └────── import (replay) ←── undo/redo
//! ```
//!
//! Every public mutator ends with a commit that records an
//! `export(Serialize)` snapshot, unless it runs inside [`Document::batch`]
//! or during a history restore.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use easel_common::{next_document_id, EditorConfig, IdGenerator};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::EditorError;
use crate::event_bus::{EventBus, Unsubscribe};
use crate::extensions::Extensions;
use crate::history::History;
use crate::host::{ComponentMeta, ComponentMetaProvider, DocumentHost, HubEvent, NotificationHub};
use crate::node::{Node, NodeId, NodeRef};
use crate::position::TreeLookup;
use crate::schema::{ComponentMapEntry, DocumentData, DocumentSchema, NodeSchema, TransformStage, DATA_VERSION};

/// Events on a document's own channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A node was created (or re-imported in place)
    NodeAdd(NodeId),
    /// A linked node left the tree
    NodeRemove(NodeId),
    /// First open
    Open,
    OpenChange(bool),
    Remove,
}

/// Builder for [`Document`]; collaborators are optional
#[derive(Default)]
pub struct DocumentBuilder {
    schema: Option<DocumentSchema>,
    config: EditorConfig,
    host: Option<Rc<dyn DocumentHost>>,
    hub: Option<Rc<dyn NotificationHub>>,
    metas: Option<Rc<dyn ComponentMetaProvider>>,
    extensions: Extensions,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Parse and validate a JSON document schema
    pub fn schema_json(self, json: &str) -> Result<Self, EditorError> {
        let schema: DocumentSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(self.schema(schema))
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: Rc<dyn DocumentHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn hub(mut self, hub: Rc<dyn NotificationHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn component_metas(mut self, metas: Rc<dyn ComponentMetaProvider>) -> Self {
        self.metas = Some(metas);
        self
    }

    /// Attach a named capability extension
    pub fn extension<T: 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.extensions.register(name, value);
        self
    }

    pub fn build(self) -> Document {
        let Self {
            schema,
            config,
            host,
            hub,
            metas,
            extensions,
        } = self;

        let mut document = Document {
            id: next_document_id(),
            name: None,
            root: None,
            nodes: HashMap::new(),
            id_generator: IdGenerator::new(config.id_prefix.clone()),
            history: History::new(&config.history),
            opened: false,
            suspended: false,
            blank: true,
            batch_depth: 0,
            utils: Vec::new(),
            host,
            hub,
            metas,
            extensions,
            emitter: EventBus::new("Document"),
        };

        document.import_inner(schema, false);
        let initial = document.export(TransformStage::Serialize);
        document.history.record(initial);
        document.history.save_point();

        debug!(document = %document.id, nodes = document.nodes.len(), "document built");
        document
    }
}

pub struct Document {
    id: String,
    name: Option<String>,
    root: Option<NodeId>,
    pub(crate) nodes: HashMap<NodeId, Node>,
    id_generator: IdGenerator,
    history: History<DocumentSchema>,
    opened: bool,
    suspended: bool,
    blank: bool,
    batch_depth: usize,
    utils: Vec<Value>,
    host: Option<Rc<dyn DocumentHost>>,
    hub: Option<Rc<dyn NotificationHub>>,
    metas: Option<Rc<dyn ComponentMetaProvider>>,
    extensions: Extensions,
    emitter: EventBus<DocumentEvent>,
}

impl Document {
    /// Build a standalone document (no host, hub or component metadata)
    pub fn new(schema: Option<DocumentSchema>) -> Self {
        let builder = DocumentBuilder::new();
        match schema {
            Some(schema) => builder.schema(schema).build(),
            None => builder.build(),
        }
    }

    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Parse, validate and build; malformed input is refused
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(DocumentBuilder::new().schema_json(json)?.build())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, falling back to the id
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        self.commit();
    }

    // ----- lookup -----

    /// Live (non-purged) node by id
    pub fn node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.nodes
            .get(id)
            .filter(|node| !node.is_purged())
            .map(|node| NodeRef::new(self, node))
    }

    pub fn get_node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.node(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Live nodes in the registry, linked or not
    pub fn node_count(&self) -> usize {
        self.nodes.values().filter(|node| !node.is_purged()).count()
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub fn root_node(&self) -> Option<NodeRef<'_>> {
        self.root.as_ref().and_then(|id| self.node(id.as_str()))
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root_node()
    }

    /// Imported without a tree and never modified since
    pub fn is_blank(&self) -> bool {
        self.blank && !self.is_modified()
    }

    pub fn is_modified(&self) -> bool {
        !self.history.is_save_point()
    }

    pub(crate) fn live(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).filter(|node| !node.is_purged())
    }

    pub(crate) fn live_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id).filter(|node| !node.is_purged())
    }

    // ----- component metadata & extensions -----

    pub fn component_meta(&self, component_name: &str) -> Option<ComponentMeta> {
        self.metas.as_ref()?.component_meta(component_name)
    }

    fn is_container(&self, component_name: &str) -> bool {
        self.component_meta(component_name)
            .map_or(true, |meta| meta.is_container)
    }

    pub fn extension<T: 'static>(&self, name: &str) -> Option<&T> {
        self.extensions.get::<T>(name)
    }

    pub fn extension_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.extensions.get_mut::<T>(name)
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    // ----- node creation -----

    /// Create a node (and its subtree) from `schema`; it starts unparented.
    ///
    /// A schema id naming a live node of the same component re-imports that
    /// node in place (detached from its parent first); a live id of another
    /// component is dropped in favour of a fresh one.
    pub fn create_node(&mut self, schema: NodeSchema) -> NodeId {
        let id = self.create_node_inner(schema, None);
        self.commit();
        id
    }

    pub(crate) fn create_node_inner(&mut self, schema: NodeSchema, mut claimed: Option<&mut HashSet<NodeId>>) -> NodeId {
        let NodeSchema {
            id,
            component_name,
            props,
            children,
            extras,
        } = schema;

        let mut reuse = false;
        let requested = id.filter(|id| !id.is_empty()).map(NodeId::from).filter(|id| {
            if claimed.as_deref().is_some_and(|claimed| claimed.contains(id)) {
                debug!(node = %id, "id repeats within import, allocating a fresh one");
                return false;
            }
            match self.live(id.as_str()) {
                Some(node) if node.component_name() == component_name => {
                    reuse = true;
                    true
                }
                Some(node) => {
                    debug!(node = %id, existing = node.component_name(), "id collides with another component");
                    false
                }
                None => true,
            }
        });
        let id = match requested {
            Some(id) => id,
            None => self.fresh_id(),
        };
        if let Some(claimed) = claimed.as_deref_mut() {
            claimed.insert(id.clone());
        }

        let container = self.is_container(&component_name);
        if reuse {
            self.detach(id.as_str());
            let stale: Vec<NodeId> = match self.nodes.get_mut(&id) {
                Some(node) => {
                    node.import_props(props, extras);
                    node.children_mut().map(|c| c.take_all()).unwrap_or_default()
                }
                None => Vec::new(),
            };
            for child in &stale {
                if let Some(node) = self.nodes.get_mut(child) {
                    node.set_parent(None);
                }
            }

            let fresh = self.create_children(&id, children, container, claimed);
            for child in stale.iter().filter(|child| !fresh.contains(child)) {
                if self.live(child.as_str()).is_some_and(|node| node.parent_id().is_none()) {
                    self.drop_subtree(child.as_str());
                }
            }
        } else {
            let node = Node::new(id.clone(), component_name, props, extras, container);
            if let Some(mut previous) = self.nodes.insert(id.clone(), node) {
                previous.purge();
            }
            self.create_children(&id, children, container, claimed);
        }

        self.emitter.emit(&DocumentEvent::NodeAdd(id.clone()));
        id
    }

    fn create_children(
        &mut self,
        parent: &NodeId,
        children: Vec<NodeSchema>,
        container: bool,
        mut claimed: Option<&mut HashSet<NodeId>>,
    ) -> Vec<NodeId> {
        if !container {
            if !children.is_empty() {
                warn!(node = %parent, dropped = children.len(), "leaf component cannot hold children");
            }
            return Vec::new();
        }

        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            let child = self.create_node_inner(child, claimed.as_deref_mut());
            self.attach(parent.as_str(), child.as_str(), None);
            ids.push(child);
        }
        ids
    }

    fn fresh_id(&mut self) -> NodeId {
        let nodes = &self.nodes;
        NodeId::from(self.id_generator.new_id_where(|id| nodes.contains_key(id)))
    }

    // ----- structural primitives -----

    /// Cut `id` from its parent; returns the parent and former index
    pub(crate) fn detach(&mut self, id: &str) -> Option<(NodeId, usize)> {
        let parent = self.nodes.get_mut(id)?.take_parent()?;
        let index = self
            .nodes
            .get_mut(&parent)
            .and_then(|node| node.children_mut())
            .and_then(|children| children.delete(id));
        index.map(|index| (parent, index))
    }

    /// Splice `id` into `parent`'s children; `None` when `parent` is a leaf
    pub(crate) fn attach(&mut self, parent: &str, id: &str, at: Option<usize>) -> Option<usize> {
        let children = self.nodes.get_mut(parent)?.children_mut()?;
        let index = children.insert(NodeId::from(id), at);
        self.nodes.get_mut(id)?.set_parent(Some(NodeId::from(parent)));
        Some(index)
    }

    /// `id` followed by its descendants, pre-order
    pub(crate) fn subtree_ids(&self, id: &str) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut stack = vec![NodeId::from(id)];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.child_ids().iter().rev().cloned());
                ids.push(current);
            }
        }
        ids
    }

    /// Detach `id`, then purge its subtree and drop it from the registry
    pub(crate) fn drop_subtree(&mut self, id: &str) {
        self.detach(id);
        for child in self.subtree_ids(id) {
            if let Some(mut node) = self.nodes.remove(&child) {
                node.purge();
            }
        }
        if self.root.as_ref().is_some_and(|root| root == id) {
            self.root = None;
        }
    }

    /// Detach `id`, then purge its subtree; purged nodes stay registered
    pub(crate) fn purge_subtree(&mut self, id: &str) {
        self.detach(id);
        for child in self.subtree_ids(id) {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.purge();
            }
        }
        if self.root.as_ref().is_some_and(|root| root == id) {
            self.root = None;
        }
    }

    // ----- import / export -----

    /// Replace the whole tree with `schema`; `None` leaves a blank document.
    ///
    /// With `check_id`, an id appearing twice in `schema` is treated as a
    /// collision and the second occurrence gets a fresh id.
    pub fn import(&mut self, schema: Option<DocumentSchema>, check_id: bool) {
        self.import_inner(schema, check_id);
        self.commit();
    }

    #[instrument(skip(self, schema), fields(document = %self.id))]
    fn import_inner(&mut self, schema: Option<DocumentSchema>, check_id: bool) {
        let old_root = self.root.clone();

        let doomed: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|id| Some(*id) != old_root.as_ref())
            .cloned()
            .collect();
        for id in doomed {
            if let Some(mut node) = self.nodes.remove(&id) {
                node.purge();
            }
        }
        if let Some(root) = old_root.as_ref().and_then(|id| self.nodes.get_mut(id)) {
            if let Some(children) = root.children_mut() {
                children.take_all();
            }
        }

        let (root_schema, id, name) = match schema {
            Some(DocumentSchema { id, name, root_node }) => (root_node, id, name),
            None => (None, None, None),
        };
        if let Some(id) = id {
            self.id = id;
        }
        self.name = name;

        let mut claimed = HashSet::new();
        let claimed = check_id.then_some(&mut claimed);
        let new_root = root_schema.map(|root| self.create_node_inner(root, claimed));

        // the old root may have been reused as a nested node of the new tree
        if let Some(old) = old_root {
            let orphaned = self.live(old.as_str()).is_some_and(|node| node.parent_id().is_none());
            if new_root.as_ref() != Some(&old) && orphaned {
                if let Some(mut node) = self.nodes.remove(&old) {
                    node.purge();
                }
            }
        }

        self.blank = new_root.is_none();
        self.root = new_root;
        debug!(nodes = self.nodes.len(), blank = self.blank, "imported");
    }

    #[instrument(level = "trace", skip(self), fields(document = %self.id))]
    pub fn export(&self, stage: TransformStage) -> DocumentSchema {
        DocumentSchema {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            root_node: self.root_node().map(|root| root.export(stage)),
        }
    }

    pub fn to_json(&self, stage: TransformStage) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(&self.export(stage))?)
    }

    /// Every component used by the document, followed by `extra` names.
    ///
    /// Linked nodes come first in tree order, then unlinked ones by id.
    pub fn components_map(&self, extra: &[&str]) -> Vec<ComponentMapEntry> {
        let mut names: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();

        let mut linked: Vec<&Node> = Vec::new();
        if let Some(root) = self.root_node() {
            linked.push(root.node());
            linked.extend(root.descendants().into_iter().map(|node| node.node()));
        }
        let linked_ids: HashSet<&NodeId> = linked.iter().map(|node| node.id()).collect();
        let mut rest: Vec<&Node> = self
            .nodes
            .values()
            .filter(|node| !node.is_purged() && !linked_ids.contains(node.id()))
            .collect();
        rest.sort_by(|a, b| a.id().cmp(b.id()));

        for node in linked.into_iter().chain(rest) {
            if seen.insert(node.component_name()) {
                names.push(node.component_name());
            }
        }
        for &name in extra {
            if seen.insert(name) {
                names.push(name);
            }
        }

        names
            .into_iter()
            .map(|name| match self.component_meta(name).and_then(|meta| meta.package) {
                Some(package) => ComponentMapEntry::packaged(name, package),
                None => ComponentMapEntry::low_code(name),
            })
            .collect()
    }

    pub fn utils(&self) -> &[Value] {
        &self.utils
    }

    pub fn set_utils(&mut self, utils: Vec<Value>) {
        self.utils = utils;
    }

    /// Persisted form: components map, utils and the saved tree
    pub fn to_data(&self, extra: &[&str]) -> DocumentData {
        DocumentData {
            version: DATA_VERSION.to_string(),
            components_map: self.components_map(extra),
            utils: self.utils.clone(),
            components_tree: self
                .root_node()
                .map(|root| vec![root.export(TransformStage::Save)])
                .unwrap_or_default(),
        }
    }

    // ----- history -----

    pub fn history(&self) -> &History<DocumentSchema> {
        &self.history
    }

    /// Run several mutations as one history entry
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let out = f(self);
        self.batch_depth -= 1;
        self.commit();
        out
    }

    pub(crate) fn commit(&mut self) {
        if self.batch_depth > 0 || self.history.is_replaying() {
            return;
        }
        let snapshot = self.export(TransformStage::Serialize);
        self.history.record(snapshot);
    }

    pub fn undo(&mut self) -> bool {
        match self.history.step_back() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.step_forward() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: DocumentSchema) {
        debug!(document = %self.id, "restoring snapshot");
        self.history.enter_replay();
        self.import_inner(Some(snapshot.clone()), true);
        self.history.exit_replay();

        debug_assert_eq!(
            self.export(TransformStage::Serialize),
            snapshot,
            "restored document diverges from its snapshot"
        );
    }

    /// Mark the current state as unmodified
    pub fn save_point(&mut self) {
        self.history.save_point();
    }

    // ----- exclusivity -----

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Closed documents count as suspended
    pub fn is_suspended(&self) -> bool {
        self.suspended || !self.opened
    }

    pub fn is_active(&self) -> bool {
        self.opened && !self.suspended
    }

    pub fn open(&mut self) {
        let first = !self.opened;
        let changed = self.set_state(true, false);
        if first {
            self.emitter.emit(&DocumentEvent::Open);
            self.post(HubEvent::DocumentOpen {
                document_id: self.id.clone(),
            });
        }
        if changed {
            self.check_exclusive();
        }
    }

    pub fn close(&mut self) {
        if self.set_state(false, true) {
            self.check_exclusive();
        }
    }

    /// Keep open but inactive; no-op when closed
    pub fn suspense(&mut self) {
        if self.opened && self.set_state(true, true) {
            self.check_exclusive();
        }
    }

    /// Re-activate a suspended document; no-op when closed
    pub fn activate(&mut self) {
        if self.opened && self.set_state(true, false) {
            self.check_exclusive();
        }
    }

    fn set_state(&mut self, opened: bool, suspended: bool) -> bool {
        if self.opened == opened && self.suspended == suspended {
            return false;
        }
        let open_changed = self.opened != opened;
        self.opened = opened;
        self.suspended = suspended;
        if open_changed {
            self.emitter.emit(&DocumentEvent::OpenChange(opened));
        }
        true
    }

    fn check_exclusive(&self) {
        if let Some(host) = &self.host {
            host.check_exclusive(self);
        }
    }

    pub(crate) fn post(&self, event: HubEvent) {
        if let Some(hub) = &self.hub {
            hub.post_event(&event);
        }
    }

    pub(crate) fn emit(&self, event: DocumentEvent) {
        self.emitter.emit(&event);
    }

    // ----- teardown -----

    /// Purge every node and leave the registry empty
    pub fn purge(&mut self) {
        for (_, mut node) in self.nodes.drain() {
            node.purge();
        }
        self.root = None;
    }

    /// Purge and tell the host this document is gone
    pub fn dispose(&mut self) {
        self.post(HubEvent::DocumentRemove {
            document_id: self.id.clone(),
        });
        self.emitter.emit(&DocumentEvent::Remove);
        self.purge();
        if let Some(host) = self.host.clone() {
            host.remove_document(self);
        }
        debug!(document = %self.id, "document disposed");
    }

    // ----- listeners -----

    pub fn on_event(&self, listener: impl Fn(&DocumentEvent) + 'static) -> Unsubscribe {
        self.emitter.on(listener)
    }

    pub fn on_node_add(&self, listener: impl Fn(&NodeId) + 'static) -> Unsubscribe {
        self.emitter.on(move |event| {
            if let DocumentEvent::NodeAdd(id) = event {
                listener(id);
            }
        })
    }

    pub fn on_node_remove(&self, listener: impl Fn(&NodeId) + 'static) -> Unsubscribe {
        self.emitter.on(move |event| {
            if let DocumentEvent::NodeRemove(id) = event {
                listener(id);
            }
        })
    }

    /// Fires on the first open
    pub fn on_ready(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.emitter.on(move |event| {
            if matches!(event, DocumentEvent::Open) {
                listener();
            }
        })
    }

    pub fn on_open_change(&self, listener: impl Fn(bool) + 'static) -> Unsubscribe {
        self.emitter.on(move |event| {
            if let DocumentEvent::OpenChange(opened) = event {
                listener(*opened);
            }
        })
    }
}

impl TreeLookup for Document {
    fn parent_of(&self, id: &str) -> Option<&NodeId> {
        self.live(id)?.parent_id()
    }

    fn has_children(&self, id: &str) -> bool {
        self.live(id).is_some_and(Node::is_parental)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("opened", &self.opened)
            .field("history", &self.history)
            .field("extensions", &self.extensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ComponentMetaRegistry, Hub, ProjectHost};
    use serde_json::json;
    use std::cell::RefCell;

    fn sample() -> DocumentSchema {
        DocumentSchema::new(
            NodeSchema::new("Page")
                .with_id("root")
                .with_child(NodeSchema::new("Text").with_id("n1").with_prop("text", json!("hi")))
                .with_child(NodeSchema::new("Box").with_id("n2")),
        )
        .with_id("doc1")
    }

    #[test]
    fn test_build_from_schema() {
        let doc = Document::new(Some(sample()));

        assert_eq!(doc.id(), "doc1");
        assert_eq!(doc.name(), "doc1");
        assert_eq!(doc.node_count(), 3);
        assert_eq!(doc.root_id().map(NodeId::as_str), Some("root"));
        assert!(!doc.is_blank());
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_blank_document() {
        let doc = Document::new(None);
        assert!(doc.is_blank());
        assert!(doc.root_node().is_none());
        assert!(doc.id().starts_with("doc-"));
    }

    #[test]
    fn test_from_json_refuses_malformed_input() {
        let err = Document::from_json(r#"{"rootNode": {"componentName": ""}}"#).unwrap_err();
        assert!(matches!(err, EditorError::Schema(_)));

        assert!(matches!(Document::from_json("{nope"), Err(EditorError::Json(_))));
    }

    #[test]
    fn test_create_node_reuses_same_component() {
        let mut doc = Document::new(Some(sample()));

        let id = doc.create_node(NodeSchema::new("Text").with_id("n1").with_prop("text", json!("bye")));

        assert_eq!(id, "n1");
        let node = doc.node("n1").unwrap();
        assert!(node.parent().is_none());
        assert_eq!(node.get_prop_value("text"), Some(&json!("bye")));
        assert_eq!(doc.root_node().unwrap().child_ids(), &[NodeId::from("n2")]);
    }

    #[test]
    fn test_create_node_collision_with_other_component() {
        let mut doc = Document::new(Some(sample()));

        let id = doc.create_node(NodeSchema::new("Image").with_id("n1"));

        assert_ne!(id, "n1");
        assert_eq!(doc.node("n1").unwrap().component_name(), "Text");
        assert_eq!(doc.node(id.as_str()).unwrap().component_name(), "Image");
    }

    #[test]
    fn test_check_id_renames_repeated_ids() {
        let schema = DocumentSchema::new(
            NodeSchema::new("Page")
                .with_id("root")
                .with_child(NodeSchema::new("Text").with_id("dup"))
                .with_child(NodeSchema::new("Text").with_id("dup")),
        );

        let mut doc = Document::new(None);
        doc.import(Some(schema), true);

        let root = doc.root_node().unwrap();
        assert_eq!(root.child_ids().len(), 2);
        assert_eq!(root.child_ids()[0], "dup");
        assert_ne!(root.child_ids()[1], "dup");
    }

    #[test]
    fn test_leaf_component_has_no_children() {
        let metas = ComponentMetaRegistry::new().with(ComponentMeta::new("Text").leaf());
        let schema = DocumentSchema::new(
            NodeSchema::new("Page")
                .with_id("root")
                .with_child(NodeSchema::new("Text").with_id("t").with_child(NodeSchema::new("Box"))),
        );
        let doc = Document::builder()
            .schema(schema)
            .component_metas(Rc::new(metas))
            .build();

        let text = doc.node("t").unwrap();
        assert!(text.children().is_none());
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn test_import_replaces_tree() {
        let mut doc = Document::new(Some(sample()));
        let old_n1 = doc.node("n1").is_some();
        assert!(old_n1);

        doc.import(
            Some(DocumentSchema::new(NodeSchema::new("Page").with_id("root")).with_name("Home")),
            false,
        );

        assert!(doc.node("n1").is_none());
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.name(), "Home");
        assert!(doc.is_modified());
    }

    #[test]
    fn test_import_none_is_blank() {
        let mut doc = Document::new(Some(sample()));
        doc.import(None, false);
        assert!(doc.root_node().is_none());
        assert_eq!(doc.node_count(), 0);
        // the import itself is a modification
        assert!(!doc.is_blank());
    }

    #[test]
    fn test_export_round_trip() {
        let doc = Document::new(Some(sample()));
        let exported = doc.export(TransformStage::Save);

        assert_eq!(exported, sample());
        assert_eq!(Document::new(Some(exported.clone())).export(TransformStage::Save), exported);
    }

    #[test]
    fn test_components_map_order_and_extras() {
        let metas = ComponentMetaRegistry::new().with(ComponentMeta::new("Box").with_package("@ui/box"));
        let mut doc = Document::builder()
            .schema(sample())
            .component_metas(Rc::new(metas))
            .build();
        doc.create_node(NodeSchema::new("Image").with_id("loose"));

        let map = doc.components_map(&["Slot", "Page"]);
        let names: Vec<&str> = map.iter().map(|e| e.component_name.as_str()).collect();

        assert_eq!(names, vec!["Page", "Text", "Box", "Image", "Slot"]);
        assert_eq!(map[2].package.as_deref(), Some("@ui/box"));
        assert_eq!(map[0].dev_mode, Some(crate::schema::DevMode::LowCode));
    }

    #[test]
    fn test_to_data() {
        let doc = Document::new(Some(sample()));
        let data = doc.to_data(&[]);

        assert_eq!(data.version, DATA_VERSION);
        assert_eq!(data.components_tree.len(), 1);
        assert_eq!(data.components_tree[0].id.as_deref(), Some("root"));
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("componentsMap").is_some());
    }

    #[test]
    fn test_open_close_notifies_host() {
        let host = Rc::new(ProjectHost::new());
        let hub = Rc::new(Hub::new());
        let opened = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&opened);
        hub.on_event("document:open", Box::new(move |e| o.borrow_mut().push(e.document_id().to_string())));

        let mut a = Document::builder().schema(sample()).host(host.clone()).hub(hub.clone()).build();
        let mut b = Document::builder().host(host.clone()).hub(hub.clone()).build();

        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = Rc::clone(&changes);
        a.on_open_change(move |flag| c.borrow_mut().push(flag));

        a.open();
        a.open();
        assert_eq!(host.active_document().as_deref(), Some("doc1"));

        b.open();
        assert_eq!(host.active_document().as_deref(), Some(b.id()));
        assert_eq!(host.take_suspend_requests(), vec!["doc1".to_string()]);

        a.suspense();
        assert!(a.is_suspended());
        a.close();
        assert!(!a.is_opened());

        assert_eq!(*changes.borrow(), vec![true, false]);
        assert_eq!(opened.borrow().len(), 2);
    }

    #[test]
    fn test_dispose_notifies_host_and_hub() {
        let host = Rc::new(ProjectHost::new());
        let hub = Rc::new(Hub::new());
        let removed = Rc::new(RefCell::new(0));

        let r = Rc::clone(&removed);
        hub.on_event("document:remove", Box::new(move |_| *r.borrow_mut() += 1));

        let mut doc = Document::builder().schema(sample()).host(host.clone()).hub(hub).build();
        doc.open();
        doc.dispose();

        assert_eq!(*removed.borrow(), 1);
        assert_eq!(host.removed_documents(), vec!["doc1".to_string()]);
        assert_eq!(host.active_document(), None);
        assert_eq!(doc.node_count(), 0);
        assert!(doc.root_node().is_none());
    }

    #[test]
    fn test_extension_lookup() {
        let doc = Document::builder().extension("outline", vec![1u8, 2]).build();
        assert_eq!(doc.extension::<Vec<u8>>("outline"), Some(&vec![1, 2]));
        assert!(doc.extension::<String>("outline").is_none());
    }
}
