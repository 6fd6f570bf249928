use anyhow::Result;
use clap::Args;
use colored::Colorize;
use easel_common::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Prefix for generated node ids
    #[arg(long, default_value = "node")]
    pub id_prefix: String,

    /// Maximum number of undo levels
    #[arg(long, default_value_t = 100)]
    pub max_levels: usize,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = EditorConfig::path_in(cwd);

    if config_path.exists() && !args.force {
        println!("{} {} already exists", "⚠️".yellow(), DEFAULT_CONFIG_NAME.bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = EditorConfig::default();
    config.id_prefix = args.id_prefix;
    config.history.max_levels = args.max_levels;

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    Ok(())
}
