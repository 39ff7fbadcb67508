//! Depth-first traversal and leaf discovery

use super::{NodeId, ProgressTree};

/// Pre-order depth-first iterator over a subtree.
///
/// Every call to [`ProgressTree::flatten`] builds a fresh iterator with its
/// own stack; nothing is shared or cached between traversals.
pub struct Flatten<'a> {
    tree: &'a ProgressTree,
    stack: Vec<NodeId>,
}

impl Iterator for Flatten<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Pushed reversed so siblings come out in insertion order.
        for &child in self.tree.children(id).iter().rev() {
            self.stack.push(child);
        }
        Some(id)
    }
}

impl ProgressTree {
    /// `from` followed by every descendant, depth-first, siblings in
    /// insertion order.
    pub fn flatten(&self, from: NodeId) -> Flatten<'_> {
        Flatten {
            tree: self,
            stack: vec![from],
        }
    }

    /// Every node in the subtree of `from` with no children of its own.
    ///
    /// A childless root qualifies, so a single-node tree yields its root.
    pub fn leaves(&self, from: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.flatten(from).filter(|&id| self.children(id).is_empty())
    }
}
