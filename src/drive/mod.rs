//! Simulated producers that drive a demo tree to completion
//!
//! This is the work-execution side the library itself stays out of: one
//! task per leaf reporting progress at its own pace, the way real workers
//! would. The tree only records what gets reported.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DriveConfig;
use crate::tree::{NodeId, ProgressTree, Role};

/// Outcome of one demo drive
#[derive(Debug, Clone)]
pub struct DriveResult {
    pub duration: Duration,
    pub leaves: usize,
    pub steps_total: u64,
}

/// Build the demo tree: `groups` children under the root, each with
/// `leaves_per_group` leaves.
pub fn build_tree(cfg: &DriveConfig) -> ProgressTree {
    let mut tree = ProgressTree::named("Root");
    for g in 0..cfg.groups {
        let group = tree.add_child(tree.root(), format!("Group {}", g + 1));
        for l in 0..cfg.leaves_per_group {
            tree.add_child(group, format!("Task {}.{}", g + 1, l + 1));
        }
    }
    tree
}

/// Spawn one producer per strict leaf. Each picks a step count and a pace,
/// announces its total, then reports values 1..=total with a sleep between
/// steps. Returns the per-producer step counts via the join handles.
pub fn spawn_producers(tree: &Arc<ProgressTree>, cfg: &DriveConfig) -> Vec<JoinHandle<u64>> {
    let leaves: Vec<NodeId> = tree
        .leaves(tree.root())
        .filter(|&id| tree.role(id) == Role::Leaf)
        .collect();

    let mut handles = Vec::with_capacity(leaves.len());

    for leaf in leaves {
        let tree = Arc::clone(tree);
        let (total, delay_ms) = {
            let mut rng = rand::rng();
            (
                rng.random_range(1..=cfg.max_steps),
                rng.random_range(cfg.min_step_delay.as_millis() as u64..=cfg.max_step_delay.as_millis() as u64),
            )
        };
        let delay = Duration::from_millis(delay_ms);

        handles.push(tokio::spawn(async move {
            if let Err(e) = tree.init_progress(leaf, total) {
                warn!(leaf = ?leaf, error = %e, "progress init rejected");
                return 0;
            }

            for value in 1..=total {
                tokio::time::sleep(delay).await;
                if let Err(e) = tree.set_progress(leaf, total, value) {
                    warn!(leaf = ?leaf, error = %e, "progress update rejected");
                    return 0;
                }
            }

            u64::from(total)
        }));
    }

    handles
}

/// Drive the tree to completion: spawn the producers and wait for all of
/// them.
pub async fn drive(tree: Arc<ProgressTree>, cfg: &DriveConfig) -> Result<DriveResult> {
    anyhow::ensure!(
        cfg.min_step_delay <= cfg.max_step_delay,
        "min step delay exceeds max step delay"
    );
    anyhow::ensure!(cfg.max_steps > 0, "max steps must be positive");

    let run_id = Uuid::new_v4();
    let started = Instant::now();

    let handles = spawn_producers(&tree, cfg);
    let leaves = handles.len();
    info!(run_id = %run_id, leaves, "starting drive");

    let mut steps_total = 0;
    for handle in handles {
        steps_total += handle.await?;
    }

    let result = DriveResult {
        duration: started.elapsed(),
        leaves,
        steps_total,
    };
    info!(run_id = %run_id, duration = ?result.duration, steps = steps_total, "drive complete");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn quick_config() -> DriveConfig {
        DriveConfig {
            groups: 2,
            leaves_per_group: 2,
            max_steps: 5,
            min_step_delay: Duration::from_millis(1),
            max_step_delay: Duration::from_millis(2),
            bar_width: 10,
        }
    }

    #[test]
    fn test_build_tree_shape() {
        let cfg = DriveConfig::from(Config::default());
        let tree = build_tree(&cfg);

        assert_eq!(tree.node_count(), 1 + 4 + 4 * 2);
        assert_eq!(tree.children(tree.root()).len(), 4);
        assert_eq!(tree.leaves(tree.root()).count(), 8);
        assert_eq!(tree.name(tree.root()), Some("Root"));
    }

    #[tokio::test]
    async fn test_drive_converges_to_full_completion() {
        let cfg = quick_config();
        let tree = Arc::new(build_tree(&cfg));

        let result = drive(Arc::clone(&tree), &cfg).await.unwrap();

        assert_eq!(result.leaves, 4);
        let root = tree.root();
        assert_eq!(tree.total_processed(root), tree.total_elements(root));
        assert_eq!(tree.total_processed(root), result.steps_total);
        assert!(result.steps_total >= 4);
    }

    #[tokio::test]
    async fn test_drive_rejects_inverted_delays() {
        let mut cfg = quick_config();
        cfg.min_step_delay = Duration::from_millis(5);
        cfg.max_step_delay = Duration::from_millis(1);

        let tree = Arc::new(build_tree(&cfg));
        assert!(drive(tree, &cfg).await.is_err());
    }

    #[tokio::test]
    async fn test_drive_on_single_node_tree_is_a_no_op() {
        let cfg = quick_config();
        let tree = Arc::new(ProgressTree::named("Root"));

        let result = drive(Arc::clone(&tree), &cfg).await.unwrap();
        assert_eq!(result.leaves, 0);
        assert_eq!(result.steps_total, 0);
        assert_eq!(tree.total_processed(tree.root()), 0);
    }
}
