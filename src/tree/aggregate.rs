//! Read-side aggregation over leaf progress

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{NodeId, ProgressTree};

impl ProgressTree {
    /// Sum of `total` over every leaf in the subtree rooted at `id`.
    ///
    /// A strict leaf is its own only leaf descendant, so the same summation
    /// serves root, internal and leaf nodes alike; internal nodes contribute
    /// nothing of their own and are never double counted.
    pub fn total_elements(&self, id: NodeId) -> u64 {
        self.leaves(id)
            .map(|leaf| u64::from(self.progress_bits(leaf).0))
            .sum()
    }

    /// Sum of `value` over every leaf in the subtree rooted at `id`.
    pub fn total_processed(&self, id: NodeId) -> u64 {
        self.leaves(id)
            .map(|leaf| u64::from(self.progress_bits(leaf).1))
            .sum()
    }

    /// Dump one display row per node, in [`flatten`] order.
    ///
    /// Leaf pairs are read without a tree-wide lock, so a snapshot taken
    /// while producers run may mix before and after states across leaves.
    /// Each individual pair is untorn, and totals are exact once producers
    /// are done.
    ///
    /// [`flatten`]: ProgressTree::flatten
    pub fn snapshot(&self) -> TreeSnapshot {
        let nodes = self
            .flatten(self.root())
            .map(|id| NodeProgress {
                name: self.name(id).map(str::to_owned),
                depth: self.depth(id),
                processed: self.total_processed(id),
                total: self.total_elements(id),
            })
            .collect();

        TreeSnapshot {
            taken_at: Utc::now(),
            nodes,
        }
    }
}

/// Point-in-time dump of per-node aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot {
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// One row per node, depth-first
    pub nodes: Vec<NodeProgress>,
}

/// One display row: a node plus the aggregates of its subtree.
#[derive(Debug, Clone, Serialize)]
pub struct NodeProgress {
    pub name: Option<String>,
    pub depth: usize,
    pub processed: u64,
    pub total: u64,
}
