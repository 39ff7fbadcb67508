//! `tally run` command - Drive a demo tree to completion

use clap::Parser;
use std::io::Write;
use std::sync::Arc;

use crate::cli::find_config_dir;
use crate::config::{load_config, DriveConfig};
use crate::display;
use crate::drive::{self, DriveResult};

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Number of groups under the root
    #[arg(short, long)]
    pub groups: Option<usize>,

    /// Leaves per group
    #[arg(short, long)]
    pub leaves: Option<usize>,

    /// Upper bound on steps per leaf
    #[arg(short, long)]
    pub steps: Option<u32>,

    /// Skip live rendering and print a final JSON snapshot
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let dir = find_config_dir()?;

    // Load and merge config
    let mut config = load_config(&dir)?;
    if let Some(groups) = args.groups {
        config.groups = groups;
    }
    if let Some(leaves) = args.leaves {
        config.leaves_per_group = leaves;
    }
    if let Some(steps) = args.steps {
        config.max_steps = steps;
    }

    let cfg: DriveConfig = config.into();
    let tree = Arc::new(drive::build_tree(&cfg));

    // Live observer: one consumer loop, subscribed before the first
    // producer starts, repainting on every (coalesced) change.
    let observer = if args.json {
        None
    } else {
        display::prepare_screen()?;
        let listener = tree.subscribe();
        Some(tokio::spawn(display::watch_loop(
            Arc::clone(&tree),
            listener,
            cfg.bar_width,
        )))
    };

    let result = drive::drive(Arc::clone(&tree), &cfg).await?;

    if let Some(observer) = observer {
        observer.abort();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tree.snapshot())?);
    } else {
        // One last paint so the final totals are on screen even if the
        // observer was aborted between the last update and its repaint.
        let mut stdout = std::io::stdout();
        display::paint(&mut stdout, &tree, cfg.bar_width)?;
        writeln!(stdout)?;
        print_results(&result);
    }

    Ok(())
}

fn print_results(result: &DriveResult) {
    println!("Done!");
    println!("{}", "━".repeat(40));
    println!("Duration: {:?}", result.duration);
    println!("Leaves:   {}", result.leaves);
    println!("Steps:    {}", result.steps_total);
}
