use super::load_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use easel_editor::DevMode;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ComponentsArgs {
    /// Document schema (JSON)
    pub input: PathBuf,

    /// Component metadata (JSON array)
    #[arg(short, long)]
    pub metas: Option<PathBuf>,

    /// Extra component names to include
    #[arg(short, long)]
    pub extra: Vec<String>,

    /// Print the full document data as JSON
    #[arg(long)]
    pub data: bool,
}

pub fn components(args: ComponentsArgs, cwd: &Path) -> Result<()> {
    let doc = load_document(&cwd.join(&args.input), args.metas.as_deref().map(|p| cwd.join(p)).as_deref(), cwd)?;
    let extra: Vec<&str> = args.extra.iter().map(String::as_str).collect();

    if args.data {
        println!("{}", serde_json::to_string_pretty(&doc.to_data(&extra))?);
        return Ok(());
    }

    for entry in doc.components_map(&extra) {
        let source = match (&entry.package, entry.dev_mode) {
            (Some(package), _) => package.bright_white().to_string(),
            (None, Some(DevMode::ProCode)) => "pro-code".yellow().to_string(),
            (None, _) => "low-code".dimmed().to_string(),
        };
        println!("  {} {} {}", "•".green(), entry.component_name.cyan().bold(), source);
    }
    Ok(())
}
