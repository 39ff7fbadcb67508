//! CLI command handlers

pub mod run;
pub mod show;

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive a demo tree to completion with simulated workers
    Run(run::RunArgs),

    /// Print the configured tree shape
    Show(show::ShowArgs),
}

pub async fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Run(args) => run::execute(args).await,
        Commands::Show(args) => show::execute(args).await,
    }
}

fn find_config_dir() -> anyhow::Result<PathBuf> {
    let current = std::env::current_dir()?;

    // Look for a .tally.toml up the directory chain
    for ancestor in current.ancestors() {
        if ancestor.join(".tally.toml").exists() {
            return Ok(PathBuf::from(ancestor));
        }
    }

    // Default to current directory
    Ok(current)
}
