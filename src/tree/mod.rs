// tree/mod.rs - Core progress tree
// Arena-backed task hierarchy with concurrently updatable leaf counters

pub mod aggregate;
pub mod traverse;

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

use crate::notify::{ChangeListener, ChangeSignal};

// ============================================================================
// TYPES
// ============================================================================

/// Handle to a node in a [`ProgressTree`].
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Structural role of a node, derived from its links on every query rather
/// than stored as a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// No parent. A childless root doubles as the degenerate single-node
    /// tree; it still counts as its own leaf for aggregation.
    Root,
    /// Parent and at least one child.
    Internal,
    /// Parent and no children.
    Leaf,
}

/// A rejected progress update. The tree is left untouched.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("total must be positive")]
    TotalOutOfRange,

    #[error("value {value} outside 1..={total}")]
    ValueOutOfRange { value: u32, total: u32 },

    #[error("progress can only be set on a leaf node")]
    ProgressOnBranch,
}

#[derive(Debug)]
struct Node {
    name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    // Packed pair: total in the high 32 bits, value in the low 32. One
    // store replaces the pair, one load reads it, so a reader never sees
    // a total from one update combined with a value from another.
    progress: AtomicU64,
}

impl Node {
    fn new(name: Option<String>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            progress: AtomicU64::new(0),
        }
    }
}

fn pack(total: u32, value: u32) -> u64 {
    (u64::from(total) << 32) | u64::from(value)
}

fn unpack(bits: u64) -> (u32, u32) {
    ((bits >> 32) as u32, bits as u32)
}

// ============================================================================
// TREE
// ============================================================================

/// A tree of work units whose leaves report `(total, value)` progress.
///
/// Construction takes `&mut self`, updates and reads take `&self`: sharing
/// the tree behind an `Arc` freezes its shape while leaving [`set_progress`]
/// available to any number of producer tasks, one per leaf, with no lock
/// shared between distinct leaves.
///
/// [`set_progress`]: ProgressTree::set_progress
#[derive(Debug)]
pub struct ProgressTree {
    nodes: Vec<Node>,
    signal: ChangeSignal,
}

impl ProgressTree {
    /// Create a tree holding a single unnamed root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None)],
            signal: ChangeSignal::new(),
        }
    }

    /// Create a tree holding a single named root.
    pub fn named(root_name: impl Into<String>) -> Self {
        let mut tree = Self::new();
        tree.nodes[0].name = Some(root_name.into());
        tree
    }

    /// The root's id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new child under `parent` and return its id so callers can
    /// keep building the subtree. The parent's role may flip from leaf to
    /// internal; any progress it held stops counting from that moment.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Some(name.into()), Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Walk parent references from `id` until there are none. O(depth),
    /// uncached.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current
    }

    /// Number of edges between `id` and the root. Used for display
    /// indentation.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
            depth += 1;
        }
        depth
    }

    /// Display label, if one was given at creation.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].name.as_deref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Derive the structural role of `id`. The three cases are exhaustive,
    /// so classification cannot fail.
    pub fn role(&self, id: NodeId) -> Role {
        let node = &self.nodes[id.0];
        match (node.parent, node.children.is_empty()) {
            (None, _) => Role::Root,
            (Some(_), true) => Role::Leaf,
            (Some(_), false) => Role::Internal,
        }
    }

    /// Current `(total, value)` pair of a leaf, `None` for other roles.
    pub fn leaf_progress(&self, id: NodeId) -> Option<(u32, u32)> {
        match self.role(id) {
            Role::Leaf => Some(self.progress_bits(id)),
            _ => None,
        }
    }

    /// Announce a leaf's expected step count before any step completes,
    /// so observers see `0 of total` instead of `0 of 0`.
    ///
    /// Subject to the same role check as [`set_progress`]; raises the
    /// change signal on success.
    ///
    /// [`set_progress`]: ProgressTree::set_progress
    pub fn init_progress(&self, leaf: NodeId, total: u32) -> Result<(), ProgressError> {
        if total == 0 {
            return Err(ProgressError::TotalOutOfRange);
        }
        if self.role(leaf) != Role::Leaf {
            debug!(node = ?leaf, "rejecting progress init on non-leaf");
            return Err(ProgressError::ProgressOnBranch);
        }

        self.nodes[leaf.0].progress.store(pack(total, 0), Ordering::Relaxed);
        self.signal.raise();
        Ok(())
    }

    /// Replace a leaf's `(total, value)` pair and raise the root's change
    /// signal.
    ///
    /// The pair is replaced in a single step: a concurrent reader sees
    /// either the old pair or the new one, never a mix. Concurrent calls
    /// on the same leaf resolve to last write wins. Rejected calls leave
    /// the tree untouched and raise nothing.
    pub fn set_progress(&self, leaf: NodeId, total: u32, value: u32) -> Result<(), ProgressError> {
        if total == 0 {
            return Err(ProgressError::TotalOutOfRange);
        }
        if value == 0 || value > total {
            return Err(ProgressError::ValueOutOfRange { value, total });
        }
        if self.role(leaf) != Role::Leaf {
            debug!(node = ?leaf, "rejecting progress update on non-leaf");
            return Err(ProgressError::ProgressOnBranch);
        }

        self.nodes[leaf.0].progress.store(pack(total, value), Ordering::Relaxed);
        self.signal.raise();
        Ok(())
    }

    /// Subscribe to the change signal owned by the root.
    ///
    /// Wakeups coalesce: a slow observer is guaranteed at least one wakeup
    /// after the most recent change, not one per change. Observers re-read
    /// current aggregates; the signal carries no payload beyond a revision
    /// counter.
    pub fn subscribe(&self) -> ChangeListener {
        self.signal.subscribe()
    }

    pub(crate) fn progress_bits(&self, id: NodeId) -> (u32, u32) {
        unpack(self.nodes[id.0].progress.load(Ordering::Relaxed))
    }
}

impl Default for ProgressTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (ProgressTree, NodeId, NodeId, NodeId) {
        let mut tree = ProgressTree::named("Root");
        let group = tree.add_child(tree.root(), "Group 1");
        let leaf_a = tree.add_child(group, "Task 1A");
        let leaf_b = tree.add_child(group, "Task 1B");
        (tree, group, leaf_a, leaf_b)
    }

    #[test]
    fn test_roles_follow_structure() {
        let (tree, group, leaf_a, _) = sample_tree();
        assert_eq!(tree.role(tree.root()), Role::Root);
        assert_eq!(tree.role(group), Role::Internal);
        assert_eq!(tree.role(leaf_a), Role::Leaf);
    }

    #[test]
    fn test_single_node_tree_is_root() {
        let tree = ProgressTree::new();
        assert_eq!(tree.role(tree.root()), Role::Root);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.name(tree.root()), None);
    }

    #[test]
    fn test_add_child_flips_leaf_to_internal() {
        let mut tree = ProgressTree::new();
        let child = tree.add_child(tree.root(), "child");
        assert_eq!(tree.role(child), Role::Leaf);

        let grandchild = tree.add_child(child, "grandchild");
        assert_eq!(tree.role(child), Role::Internal);
        assert_eq!(tree.role(grandchild), Role::Leaf);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = ProgressTree::new();
        let a = tree.add_child(tree.root(), "a");
        let b = tree.add_child(tree.root(), "b");
        let c = tree.add_child(tree.root(), "c");
        assert_eq!(tree.children(tree.root()), &[a, b, c]);
    }

    #[test]
    fn test_root_of_and_depth() {
        let (tree, group, leaf_a, _) = sample_tree();
        assert_eq!(tree.root_of(leaf_a), tree.root());
        assert_eq!(tree.root_of(group), tree.root());
        assert_eq!(tree.root_of(tree.root()), tree.root());

        assert_eq!(tree.depth(tree.root()), 0);
        assert_eq!(tree.depth(group), 1);
        assert_eq!(tree.depth(leaf_a), 2);
    }

    #[test]
    fn test_set_progress_rejects_zero_total() {
        let (tree, _, leaf_a, _) = sample_tree();
        assert_eq!(
            tree.set_progress(leaf_a, 0, 1),
            Err(ProgressError::TotalOutOfRange)
        );
        assert_eq!(tree.leaf_progress(leaf_a), Some((0, 0)));
    }

    #[test]
    fn test_set_progress_rejects_value_out_of_range() {
        let (tree, _, leaf_a, _) = sample_tree();
        assert_eq!(
            tree.set_progress(leaf_a, 10, 0),
            Err(ProgressError::ValueOutOfRange { value: 0, total: 10 })
        );
        assert_eq!(
            tree.set_progress(leaf_a, 10, 11),
            Err(ProgressError::ValueOutOfRange { value: 11, total: 10 })
        );
        // Rejected calls leave the stored pair untouched.
        assert_eq!(tree.leaf_progress(leaf_a), Some((0, 0)));
    }

    #[test]
    fn test_set_progress_rejects_non_leaf() {
        let (tree, group, _, _) = sample_tree();
        assert_eq!(
            tree.set_progress(group, 10, 1),
            Err(ProgressError::ProgressOnBranch)
        );
        assert_eq!(
            tree.set_progress(tree.root(), 10, 1),
            Err(ProgressError::ProgressOnBranch)
        );
    }

    #[test]
    fn test_set_progress_rejects_childless_root() {
        let tree = ProgressTree::new();
        assert_eq!(
            tree.set_progress(tree.root(), 5, 1),
            Err(ProgressError::ProgressOnBranch)
        );
    }

    #[test]
    fn test_last_write_wins() {
        let (tree, _, leaf_a, _) = sample_tree();
        tree.set_progress(leaf_a, 10, 3).unwrap();
        tree.set_progress(leaf_a, 10, 7).unwrap();
        assert_eq!(tree.leaf_progress(leaf_a), Some((10, 7)));
    }

    #[test]
    fn test_init_progress_announces_total() {
        let (tree, _, leaf_a, _) = sample_tree();
        tree.init_progress(leaf_a, 25).unwrap();
        assert_eq!(tree.leaf_progress(leaf_a), Some((25, 0)));

        assert_eq!(
            tree.init_progress(leaf_a, 0),
            Err(ProgressError::TotalOutOfRange)
        );
        assert_eq!(
            tree.init_progress(tree.root(), 5),
            Err(ProgressError::ProgressOnBranch)
        );
    }

    #[test]
    fn test_leaf_progress_none_for_branches() {
        let (tree, group, leaf_a, leaf_b) = sample_tree();
        tree.set_progress(leaf_a, 4, 2).unwrap();
        tree.set_progress(leaf_b, 6, 1).unwrap();
        assert_eq!(tree.leaf_progress(group), None);
        assert_eq!(tree.leaf_progress(tree.root()), None);
    }

    #[test]
    fn test_pack_round_trip() {
        assert_eq!(unpack(pack(0, 0)), (0, 0));
        assert_eq!(unpack(pack(50, 17)), (50, 17));
        assert_eq!(unpack(pack(u32::MAX, u32::MAX)), (u32::MAX, u32::MAX));
    }
}
