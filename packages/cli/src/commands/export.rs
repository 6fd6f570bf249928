use super::load_document;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use easel_editor::TransformStage;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Stage {
    Render,
    Serialize,
    Save,
}

impl From<Stage> for TransformStage {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Render => TransformStage::Render,
            Stage::Serialize => TransformStage::Serialize,
            Stage::Save => TransformStage::Save,
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Document schema (JSON)
    pub input: PathBuf,

    /// Transform stage selecting the exported fields
    #[arg(short, long, value_enum, default_value = "save")]
    pub stage: Stage,

    /// Component metadata (JSON array)
    #[arg(short, long)]
    pub metas: Option<PathBuf>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn export(args: ExportArgs, cwd: &Path) -> Result<()> {
    let doc = load_document(&cwd.join(&args.input), args.metas.as_deref().map(|p| cwd.join(p)).as_deref(), cwd)?;
    let json = doc.to_json(args.stage.into())?;

    match args.output {
        Some(output) => {
            let path = cwd.join(output);
            fs::write(&path, json)?;
            eprintln!("  {} Wrote {}", "✓".green(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_editor::DocumentSchema;

    #[test]
    fn test_export_to_file_drops_default_extras() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("page.json"),
            r#"{"id": "d", "rootNode": {"id": "r", "componentName": "Page", "isLocked": false, "loop": "items"}}"#,
        )
        .unwrap();

        export(
            ExportArgs {
                input: "page.json".into(),
                stage: Stage::Save,
                metas: None,
                output: Some("out.json".into()),
            },
            dir.path(),
        )
        .unwrap();

        let written: DocumentSchema =
            serde_json::from_str(&fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
        let root = written.root_node.unwrap();
        assert!(root.extras.get("isLocked").is_none());
        assert_eq!(root.extras.get("loop"), Some(&serde_json::json!("items")));
    }
}
