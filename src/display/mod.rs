//! Console rendering of progress snapshots
//!
//! The display side of the observer pattern: it owns no tree state, only a
//! change listener and the computed rows of a snapshot. Rendering runs in a
//! single consumer loop, so two repaints of the same observer can never
//! interleave.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::{cursor, execute, terminal};

use crate::notify::ChangeListener;
use crate::tree::aggregate::TreeSnapshot;
use crate::tree::ProgressTree;

/// Render a bar of `width` cells, filled proportionally to value/total.
pub fn progress_bar(width: usize, value: u64, total: u64) -> String {
    let fraction = value as f64 / total.max(1) as f64;
    let filled = ((fraction * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Write one row per node, indented by depth.
pub fn render_snapshot(out: &mut impl Write, snap: &TreeSnapshot, width: usize) -> io::Result<()> {
    for node in &snap.nodes {
        writeln!(
            out,
            "{} '{}' {} {} of {}",
            " ".repeat(node.depth),
            node.name.as_deref().unwrap_or(""),
            progress_bar(width, node.processed, node.total),
            node.processed,
            node.total
        )?;
    }
    Ok(())
}

/// Clear the screen ahead of the first paint.
pub fn prepare_screen() -> io::Result<()> {
    execute!(
        io::stdout(),
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    )
}

/// Repaint the whole tree from the top of the screen.
pub fn paint(out: &mut io::Stdout, tree: &ProgressTree, width: usize) -> io::Result<()> {
    execute!(out, cursor::MoveTo(0, 0))?;
    render_snapshot(out, &tree.snapshot(), width)?;
    out.flush()
}

/// Repaint on every change notification until the tree goes away or the
/// task is aborted. Coalesced wakeups are fine: each paint re-reads the
/// current aggregates.
pub async fn watch_loop(tree: Arc<ProgressTree>, mut listener: ChangeListener, width: usize) {
    let mut stdout = io::stdout();
    while listener.changed().await.is_some() {
        if paint(&mut stdout, &tree, width).is_err() {
            break;
        }
    }
}
