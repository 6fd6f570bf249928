mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{components, export, init, tree, ComponentsArgs, ExportArgs, InitArgs, TreeArgs};

/// Easel CLI - inspect and convert page documents
#[derive(Parser, Debug)]
#[command(name = "easel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default easel.config.json
    Init(InitArgs),

    /// Print the component tree of a document
    Tree(TreeArgs),

    /// Re-export a document at a transform stage
    Export(ExportArgs),

    /// Print the components map (or full document data)
    Components(ComponentsArgs),
}

fn main() {
    easel_common::init_tracing("warn");

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Tree(args) => tree(args, &cwd),
            Command::Export(args) => export(args, &cwd),
            Command::Components(args) => components(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
