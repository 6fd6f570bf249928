use super::load_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use easel_editor::NodeRef;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Document schema (JSON)
    pub input: PathBuf,

    /// Component metadata (JSON array)
    #[arg(short, long)]
    pub metas: Option<PathBuf>,

    /// Show props next to each node
    #[arg(short, long)]
    pub props: bool,
}

pub fn tree(args: TreeArgs, cwd: &Path) -> Result<()> {
    let doc = load_document(&cwd.join(&args.input), args.metas.as_deref().map(|p| cwd.join(p)).as_deref(), cwd)?;

    println!("{} {}", "📄".bright_blue(), doc.name().bright_white().bold());

    match doc.root_node() {
        Some(root) => {
            let mut lines = Vec::new();
            render(root, "", true, args.props, &mut lines);
            for line in lines {
                println!("{}", line);
            }
        }
        None => println!("   {}", "(blank document)".dimmed()),
    }

    println!();
    println!("   {} nodes", doc.node_count());
    Ok(())
}

fn render(node: NodeRef<'_>, prefix: &str, last: bool, show_props: bool, out: &mut Vec<String>) {
    let branch = if node.is_root() {
        ""
    } else if last {
        "└── "
    } else {
        "├── "
    };

    let mut line = format!(
        "{}{}{} {}",
        prefix,
        branch,
        node.component_name().cyan().bold(),
        format!("#{}", node.id()).dimmed()
    );
    if node.is_hidden() {
        line.push_str(&format!(" {}", "hidden".yellow()));
    }
    if node.is_locked() {
        line.push_str(&format!(" {}", "locked".red()));
    }
    if show_props {
        let (props, _) = node.props().export(Default::default());
        if !props.is_empty() {
            line.push_str(&format!(" {}", serde_json::Value::Object(props).to_string().dimmed()));
        }
    }
    out.push(line);

    let child_prefix = if node.is_root() {
        String::new()
    } else {
        format!("{}{}", prefix, if last { "    " } else { "│   " })
    };
    let children = node.children_nodes();
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        render(child, &child_prefix, i + 1 == count, show_props, out);
    }
}
