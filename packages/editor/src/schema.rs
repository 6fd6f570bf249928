//! # Schema Wire Format
//!
//! Serde types for the recursive `{id, componentName, props, children}`
//! structure consumed by [`Document::import`](crate::Document::import) and
//! produced by [`Document::export`](crate::Document::export).
//!
//! Any top-level key besides the four known ones is an *extra*
//! (framework/plugin metadata such as `isHidden`) and is kept in
//! [`NodeSchema::extras`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SchemaError;

/// Export mode selecting which derived/transient fields are serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformStage {
    /// Transient view handed to renderers
    Render,
    /// Exact state, used for history snapshots and copies
    Serialize,
    /// Persistence
    #[default]
    Save,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub component_name: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSchema>,

    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl NodeSchema {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            id: None,
            component_name: component_name.into(),
            props: Map::new(),
            children: Vec::new(),
            extras: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    pub fn with_child(mut self, child: NodeSchema) -> Self {
        self.children.push(child);
        self
    }

    /// Check the whole subtree for a usable component name
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.component_name.trim().is_empty() {
            return Err(SchemaError::MissingComponentName {
                id: self.id.clone(),
            });
        }
        if matches!(&self.id, Some(id) if id.is_empty()) {
            return Err(SchemaError::EmptyId);
        }
        self.children.iter().try_for_each(NodeSchema::validate)
    }

    /// Drop every id in the subtree so fresh ones get allocated on import
    pub fn strip_ids(&mut self) {
        self.id = None;
        for child in &mut self.children {
            child.strip_ids();
        }
    }

    /// Number of nodes in this subtree (including self)
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeSchema::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_node: Option<NodeSchema>,
}

impl DocumentSchema {
    pub fn new(root_node: NodeSchema) -> Self {
        Self {
            id: None,
            name: None,
            root_node: Some(root_node),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        match &self.root_node {
            Some(root) => root.validate(),
            None => Ok(()),
        }
    }
}

/// Shape check on untyped JSON: an object with a non-empty string
/// `componentName`, an object `props` (if any) and valid `children` (if any)
pub fn validate_node_schema(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let named = matches!(obj.get("componentName"), Some(Value::String(s)) if !s.trim().is_empty());
    let props_ok = match obj.get("props") {
        None | Some(Value::Object(_)) => true,
        _ => false,
    };
    let children_ok = match obj.get("children") {
        None => true,
        Some(Value::Array(items)) => items.iter().all(validate_node_schema),
        _ => false,
    };

    named && props_ok && children_ok
}

/// How a component in the components map is provided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DevMode {
    LowCode,
    ProCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMapEntry {
    pub component_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<DevMode>,
}

impl ComponentMapEntry {
    pub fn low_code(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            package: None,
            dev_mode: Some(DevMode::LowCode),
        }
    }

    pub fn packaged(component_name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            package: Some(package.into()),
            dev_mode: None,
        }
    }
}

pub const DATA_VERSION: &str = "1.0.0";

/// Full persisted form of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentData {
    pub version: String,
    pub components_map: Vec<ComponentMapEntry>,
    #[serde(default)]
    pub utils: Vec<Value>,
    pub components_tree: Vec<NodeSchema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extras_are_flattened() {
        let schema: NodeSchema = serde_json::from_value(json!({
            "id": "n1",
            "componentName": "Text",
            "props": { "content": "hi" },
            "isHidden": true,
            "title": "Greeting"
        }))
        .unwrap();

        assert_eq!(schema.id.as_deref(), Some("n1"));
        assert_eq!(schema.props["content"], json!("hi"));
        assert_eq!(schema.extras["isHidden"], json!(true));
        assert_eq!(schema.extras["title"], json!("Greeting"));
        assert!(schema.children.is_empty());

        let back = serde_json::to_value(&schema).unwrap();
        assert_eq!(back["isHidden"], json!(true));
        assert!(back.get("children").is_none());
    }

    #[test]
    fn test_validate_rejects_missing_component_name() {
        let schema = NodeSchema::new("Page").with_child(NodeSchema::new("  ").with_id("bad"));

        assert_eq!(
            schema.validate(),
            Err(SchemaError::MissingComponentName {
                id: Some("bad".to_string())
            })
        );
    }

    #[test]
    fn test_validate_node_schema_on_raw_json() {
        assert!(validate_node_schema(&json!({ "componentName": "Box" })));
        assert!(validate_node_schema(&json!({
            "componentName": "Box",
            "props": {},
            "children": [{ "componentName": "Text" }]
        })));

        assert!(!validate_node_schema(&json!({ "props": {} })));
        assert!(!validate_node_schema(&json!({ "componentName": "Box", "props": [] })));
        assert!(!validate_node_schema(&json!({
            "componentName": "Box",
            "children": [{ "id": "x" }]
        })));
        assert!(!validate_node_schema(&json!("Box")));
    }

    #[test]
    fn test_strip_ids_and_count() {
        let mut schema = NodeSchema::new("Page")
            .with_id("root")
            .with_child(NodeSchema::new("Box").with_id("a").with_child(NodeSchema::new("Text").with_id("t")));

        assert_eq!(schema.count(), 3);
        schema.strip_ids();
        assert!(schema.id.is_none());
        assert!(schema.children[0].children[0].id.is_none());
    }

    #[test]
    fn test_stage_default_is_save() {
        assert_eq!(TransformStage::default(), TransformStage::Save);
        assert_eq!(serde_json::to_value(TransformStage::Render).unwrap(), json!("render"));
    }
}
