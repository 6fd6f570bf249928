//! # Host Collaborators
//!
//! Interfaces a [`Document`] calls out to, plus reference implementations
//! used by the CLI and the tests.
//!
//! - [`DocumentHost`]: project level; enforces the "one open document"
//!   policy and is told when a document goes away
//! - [`NotificationHub`]: designer level; merges node/document events from
//!   every document into one stream keyed by event name
//! - [`ComponentMetaProvider`]: component metadata lookup (title, whether the
//!   component accepts children)

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::event_bus::{EventBus, Unsubscribe};
use crate::node::NodeId;

pub trait DocumentHost {
    /// Called once from `Document::dispose`
    fn remove_document(&self, document: &Document);

    /// Called on every open/close/suspend/activate transition
    fn check_exclusive(&self, document: &Document);
}

/// Keeps at most one document open; suspends the previous one when another
/// opens.
///
/// A host cannot mutate documents while they notify it, so suspensions are
/// queued and drained with [`ProjectHost::take_suspend_requests`].
#[derive(Debug, Default)]
pub struct ProjectHost {
    active: RefCell<Option<String>>,
    removed: RefCell<Vec<String>>,
    suspend_requests: RefCell<Vec<String>>,
}

impl ProjectHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_document(&self) -> Option<String> {
        self.active.borrow().clone()
    }

    pub fn removed_documents(&self) -> Vec<String> {
        self.removed.borrow().clone()
    }

    /// Documents that should be suspended because another one opened
    pub fn take_suspend_requests(&self) -> Vec<String> {
        std::mem::take(&mut *self.suspend_requests.borrow_mut())
    }
}

impl DocumentHost for ProjectHost {
    fn remove_document(&self, document: &Document) {
        let id = document.id().to_string();
        let mut active = self.active.borrow_mut();
        if active.as_deref() == Some(id.as_str()) {
            *active = None;
        }
        tracing::debug!(document = %id, "document removed from project");
        self.removed.borrow_mut().push(id);
    }

    fn check_exclusive(&self, document: &Document) {
        let id = document.id();
        let mut active = self.active.borrow_mut();

        if document.is_active() {
            if let Some(previous) = active.replace(id.to_string()) {
                if previous != id {
                    tracing::debug!(previous = %previous, next = %id, "suspending previous document");
                    self.suspend_requests.borrow_mut().push(previous);
                }
            }
        } else if active.as_deref() == Some(id) {
            *active = None;
        }
    }
}

/// Cross-document events posted to a [`NotificationHub`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HubEvent {
    #[serde(rename_all = "camelCase")]
    NodeAdd { document_id: String, node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    NodeRemove { document_id: String, node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    DocumentOpen { document_id: String },
    #[serde(rename_all = "camelCase")]
    DocumentRemove { document_id: String },
}

impl HubEvent {
    /// Channel name listeners subscribe to
    pub fn name(&self) -> &'static str {
        match self {
            HubEvent::NodeAdd { .. } => "node:add",
            HubEvent::NodeRemove { .. } => "node:remove",
            HubEvent::DocumentOpen { .. } => "document:open",
            HubEvent::DocumentRemove { .. } => "document:remove",
        }
    }

    pub fn document_id(&self) -> &str {
        match self {
            HubEvent::NodeAdd { document_id, .. }
            | HubEvent::NodeRemove { document_id, .. }
            | HubEvent::DocumentOpen { document_id }
            | HubEvent::DocumentRemove { document_id } => document_id,
        }
    }
}

pub trait NotificationHub {
    fn post_event(&self, event: &HubEvent);

    fn on_event(&self, name: &str, listener: Box<dyn Fn(&HubEvent)>) -> Unsubscribe;
}

/// One named bus per event name
#[derive(Debug, Default)]
pub struct Hub {
    channels: RefCell<HashMap<String, EventBus<HubEvent>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, name: &str) -> EventBus<HubEvent> {
        self.channels
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| EventBus::new("Hub"))
            .clone()
    }
}

impl NotificationHub for Hub {
    fn post_event(&self, event: &HubEvent) {
        // clone the bus out so listeners may subscribe while it emits
        let bus = self.channels.borrow().get(event.name()).cloned();
        if let Some(bus) = bus {
            bus.emit(event);
        }
    }

    fn on_event(&self, name: &str, listener: Box<dyn Fn(&HubEvent)>) -> Unsubscribe {
        self.channel(name).on(listener)
    }
}

fn default_is_container() -> bool {
    true
}

/// Metadata describing a component type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    pub component_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Package providing the component; `None` for low-code components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// `false` makes nodes of this component strictly-leaf
    #[serde(default = "default_is_container")]
    pub is_container: bool,
}

impl ComponentMeta {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            title: None,
            package: None,
            is_container: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn leaf(mut self) -> Self {
        self.is_container = false;
        self
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.component_name)
    }
}

pub trait ComponentMetaProvider {
    fn component_meta(&self, component_name: &str) -> Option<ComponentMeta>;
}

#[derive(Debug, Default, Clone)]
pub struct ComponentMetaRegistry {
    metas: HashMap<String, ComponentMeta>,
}

impl ComponentMetaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, meta: ComponentMeta) {
        self.metas.insert(meta.component_name.clone(), meta);
    }

    pub fn with(mut self, meta: ComponentMeta) -> Self {
        self.register(meta);
        self
    }

    /// Load a JSON array of metas
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let metas: Vec<ComponentMeta> = serde_json::from_str(json)?;
        Ok(metas.into_iter().fold(Self::new(), Self::with))
    }

    pub fn is_leaf_component(&self, component_name: &str) -> bool {
        self.metas
            .get(component_name)
            .is_some_and(|meta| !meta.is_container)
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

impl ComponentMetaProvider for ComponentMetaRegistry {
    fn component_meta(&self, component_name: &str) -> Option<ComponentMeta> {
        self.metas.get(component_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_hub_routes_by_name() {
        let hub = Hub::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        hub.on_event("node:add", Box::new(move |event| s.borrow_mut().push(event.clone())));

        hub.post_event(&HubEvent::NodeAdd {
            document_id: "doc-1".into(),
            node_id: NodeId::from("n1"),
        });
        hub.post_event(&HubEvent::DocumentOpen {
            document_id: "doc-1".into(),
        });

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name(), "node:add");
        assert_eq!(seen[0].document_id(), "doc-1");
    }

    #[test]
    fn test_hub_unsubscribe() {
        let hub = Hub::new();
        let count = Rc::new(RefCell::new(0));

        let c = Rc::clone(&count);
        let handle = hub.on_event("document:remove", Box::new(move |_| *c.borrow_mut() += 1));
        let event = HubEvent::DocumentRemove {
            document_id: "doc-2".into(),
        };

        hub.post_event(&event);
        handle.unsubscribe();
        hub.post_event(&event);

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_hub_event_wire_format() {
        let event = HubEvent::NodeRemove {
            document_id: "doc-1".into(),
            node_id: NodeId::from("n2"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "nodeRemove", "documentId": "doc-1", "nodeId": "n2"})
        );
    }

    #[test]
    fn test_registry_marks_leaf_components() {
        let registry = ComponentMetaRegistry::from_json(
            r#"[
                {"componentName": "Page", "title": "Page"},
                {"componentName": "Text", "isContainer": false}
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.is_leaf_component("Text"));
        assert!(!registry.is_leaf_component("Page"));
        assert_eq!(registry.component_meta("Text").unwrap().title(), "Text");
        assert!(registry.component_meta("Missing").is_none());
    }

    #[test]
    fn test_reregister_as_container() {
        let mut registry = ComponentMetaRegistry::new().with(ComponentMeta::new("Img").leaf());
        registry.register(ComponentMeta::new("Img"));
        assert!(!registry.is_leaf_component("Img"));
    }
}
