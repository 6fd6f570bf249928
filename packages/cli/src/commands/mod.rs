pub mod components;
pub mod export;
pub mod init;
pub mod tree;

pub use components::{components, ComponentsArgs};
pub use export::{export, ExportArgs};
pub use init::{init, InitArgs};
pub use tree::{tree, TreeArgs};

use anyhow::{Context, Result};
use easel_common::EditorConfig;
use easel_editor::{ComponentMetaRegistry, Document};
use std::path::Path;
use std::rc::Rc;

/// Load a document schema file, honouring the project config and an
/// optional component metadata file (JSON array of metas)
pub fn load_document(path: &Path, metas: Option<&Path>, cwd: &Path) -> Result<Document> {
    let config = EditorConfig::load(cwd).context("failed to load easel.config.json")?;
    tracing::debug!(path = %path.display(), "loading document");

    let source = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut builder = Document::builder()
        .config(config)
        .schema_json(&source)
        .with_context(|| format!("invalid document schema in {}", path.display()))?;

    if let Some(metas) = metas {
        let json = std::fs::read_to_string(metas).with_context(|| format!("cannot read {}", metas.display()))?;
        let registry = ComponentMetaRegistry::from_json(&json)
            .with_context(|| format!("invalid component metadata in {}", metas.display()))?;
        builder = builder.component_metas(Rc::new(registry));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_document_with_metas() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("page.json");
        let metas_path = dir.path().join("metas.json");
        fs::write(
            &doc_path,
            r#"{"rootNode": {"componentName": "Page", "children": [{"componentName": "Text"}]}}"#,
        )
        .unwrap();
        fs::write(&metas_path, r#"[{"componentName": "Text", "isContainer": false}]"#).unwrap();
        fs::write(dir.path().join("easel.config.json"), r#"{"idPrefix": "el"}"#).unwrap();

        let doc = load_document(&doc_path, Some(&metas_path), dir.path()).unwrap();

        assert_eq!(doc.root_id().unwrap().as_str(), "el-1");
        assert!(doc.node("el-2").unwrap().children().is_none());
    }

    #[test]
    fn test_load_document_reports_bad_schema() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("page.json");
        fs::write(&doc_path, r#"{"rootNode": {"componentName": ""}}"#).unwrap();

        let err = load_document(&doc_path, None, dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid document schema"));
    }
}
