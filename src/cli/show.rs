//! `tally show` command - Print the configured tree shape

use clap::Parser;

use crate::cli::find_config_dir;
use crate::config::{load_config, DriveConfig};
use crate::drive;
use crate::tree::Role;

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ShowArgs) -> anyhow::Result<()> {
    let dir = find_config_dir()?;
    let cfg: DriveConfig = load_config(&dir)?.into();
    let tree = drive::build_tree(&cfg);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tree.snapshot())?);
        return Ok(());
    }

    let root = tree.root();
    for id in tree.flatten(root) {
        let marker = match tree.role(id) {
            Role::Leaf => "○",
            _ => "▸",
        };
        println!(
            "{}{} {}",
            "  ".repeat(tree.depth(id)),
            marker,
            tree.name(id).unwrap_or("")
        );
    }

    println!();
    println!(
        "Summary: {} nodes, {} leaves",
        tree.node_count(),
        tree.leaves(root).count()
    );

    Ok(())
}
