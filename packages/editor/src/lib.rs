//! # Easel Editor
//!
//! In-memory document engine for the Easel page builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: JSON ⇄ NodeSchema / DocumentSchema  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: registry of Nodes + tree edits    │
//! │  - Props / NodeChildren per node            │
//! │  - position queries (z-level, containment)  │
//! │  - EventBus per node and per document       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ history: snapshot undo/redo                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The registry owns nodes**: children are ordered ids, the parent is a
//!    lookup-only back-reference
//! 2. **Derived values are recomputed**: depth, index and containment walk the
//!    live tree on every call
//! 3. **Explicit events**: every change is announced on a synchronous bus
//! 4. **Snapshots, not inverse ops**: undo restores a full serialized state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use easel_editor::{Document, NodeSchema, TransformStage};
//!
//! let mut doc = Document::from_json(r#"{"rootNode": {"componentName": "Page"}}"#)?;
//! let root = doc.root_id().cloned().unwrap();
//!
//! let text = doc.create_node(NodeSchema::new("Text"));
//! doc.insert(root.as_str(), text.as_str(), None);
//! doc.set_prop_value(text.as_str(), "content", "Hello".into());
//!
//! doc.undo();
//! let saved = doc.export(TransformStage::Save);
//! ```

mod document;
mod errors;
mod event_bus;
mod extensions;
mod history;
mod host;
mod mutations;
mod node;
mod node_children;
mod position;
mod props;
mod schema;

pub use document::{Document, DocumentBuilder, DocumentEvent};
pub use errors::{EditorError, SchemaError};
pub use event_bus::{EventBus, Unsubscribe};
pub use extensions::Extensions;
pub use history::{History, HistoryState, HistoryStatus};
pub use host::{
    ComponentMeta, ComponentMetaProvider, ComponentMetaRegistry, DocumentHost, Hub, HubEvent, NotificationHub,
    ProjectHost,
};
pub use mutations::Insertable;
pub use node::{Node, NodeEvent, NodeId, NodeRef};
pub use node_children::NodeChildren;
pub use position::{compare_position, contains, get_z_level_top, z_level, PositionNo, TreeLookup};
pub use props::{extra_key, is_extra_key, strip_extra_key, PropChange, Props, BUILTIN_EXTRAS, EXTRA_KEY_PREFIX};
pub use schema::{
    validate_node_schema, ComponentMapEntry, DevMode, DocumentData, DocumentSchema, NodeSchema, TransformStage,
    DATA_VERSION,
};

// Re-export common types for convenience
pub use easel_common::{EditorConfig, HistoryConfig};
