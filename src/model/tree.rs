use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, warn};

slotmap::new_key_type! {
    /// Identifies a node in the layout tree. Ids handed to the rest of the
    /// crate as "pane ids" are node ids whose node is [`NodeKind::Pane`].
    pub struct NodeId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Which side of the split the freshly created pane lands on.
/// `Before` is top/left, `After` is bottom/right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Before,
    After,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
enum NodeKind {
    Pane,
    Split {
        orientation: Orientation,
        children: [NodeId; 2],
        /// Percentages; kept summing to 100.
        sizes: [f64; 2],
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Ids produced by [`LayoutTree::split_pane`]. The split pane's original id is
/// retired; `original` takes over its geometry slot, `new` is the empty
/// sibling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitOutcome {
    pub original: NodeId,
    pub new: NodeId,
}

#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The pane was removed and its parent split collapsed.
    Removed,
    /// The pane was the last one; the tree was reset to a single fresh empty
    /// pane with this id.
    Reset(NodeId),
    NotFound,
}

/// The recursive pane/split structure of the workspace.
///
/// Nodes live in a slotmap arena and are addressed by id; splits hold exactly
/// two ordered children. The tree never becomes empty: there is always at
/// least one pane.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LayoutTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            parent: None,
            kind: NodeKind::Pane,
        });
        LayoutTree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_pane(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(node) if node.kind == NodeKind::Pane)
    }

    pub fn is_split(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id),
            Some(Node {
                kind: NodeKind::Split { .. },
                ..
            })
        )
    }

    pub fn split_sizes(&self, id: NodeId) -> Option<[f64; 2]> {
        match self.nodes.get(id) {
            Some(Node {
                kind: NodeKind::Split { sizes, .. },
                ..
            }) => Some(*sizes),
            _ => None,
        }
    }

    pub fn split_children(&self, id: NodeId) -> Option<[NodeId; 2]> {
        match self.nodes.get(id) {
            Some(Node {
                kind: NodeKind::Split { children, .. },
                ..
            }) => Some(*children),
            _ => None,
        }
    }

    pub fn orientation(&self, id: NodeId) -> Option<Orientation> {
        match self.nodes.get(id) {
            Some(Node {
                kind: NodeKind::Split { orientation, .. },
                ..
            }) => Some(*orientation),
            _ => None,
        }
    }

    /// All pane ids in pre-order. Split ids never appear here.
    pub fn pane_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match &self.nodes[id].kind {
                NodeKind::Pane => out.push(id),
                NodeKind::Split { children, .. } => {
                    stack.push(children[1]);
                    stack.push(children[0]);
                }
            }
        }
        out
    }

    pub fn pane_count(&self) -> usize {
        self.pane_ids().len()
    }

    /// First pane in pre-order: the deterministic fallback when the active
    /// pane goes away.
    pub fn first_pane(&self) -> NodeId {
        let mut id = self.root;
        loop {
            match &self.nodes[id].kind {
                NodeKind::Pane => return id,
                NodeKind::Split { children, .. } => id = children[0],
            }
        }
    }

    /// Turns the targeted pane into a split with two fresh panes: `original`
    /// inherits the split pane's geometry slot, `new` is the empty sibling.
    /// The targeted id stays in the arena as the split node and stops being a
    /// pane. Returns `None` (leaving the tree untouched) when `pane` is not a
    /// live pane.
    pub fn split_pane(
        &mut self,
        pane: NodeId,
        orientation: Orientation,
        placement: Placement,
    ) -> Option<SplitOutcome> {
        if !self.is_pane(pane) {
            debug!(?pane, "split_pane: not a pane, ignoring");
            return None;
        }
        let original = self.nodes.insert(Node {
            parent: Some(pane),
            kind: NodeKind::Pane,
        });
        let new = self.nodes.insert(Node {
            parent: Some(pane),
            kind: NodeKind::Pane,
        });
        let children = match placement {
            Placement::Before => [new, original],
            Placement::After => [original, new],
        };
        self.nodes[pane].kind = NodeKind::Split {
            orientation,
            children,
            sizes: [50.0, 50.0],
        };
        Some(SplitOutcome { original, new })
    }

    /// Removes a pane. The parent split collapses: the surviving sibling
    /// subtree takes the split's place (the split id is discarded, the
    /// survivor keeps its own id). Closing the only pane resets the tree to a
    /// single fresh empty pane instead of underflowing.
    pub fn close_pane(&mut self, pane: NodeId) -> CloseOutcome {
        if !self.is_pane(pane) {
            debug!(?pane, "close_pane: not a pane, ignoring");
            return CloseOutcome::NotFound;
        }
        let Some(parent) = self.nodes[pane].parent else {
            // Root pane: the tree must never become empty.
            warn!(?pane, "refusing to close the last pane; resetting to a fresh pane");
            let _ = self.nodes.remove(pane);
            let fresh = self.nodes.insert(Node {
                parent: None,
                kind: NodeKind::Pane,
            });
            self.root = fresh;
            return CloseOutcome::Reset(fresh);
        };

        let NodeKind::Split { children, .. } = self.nodes[parent].kind else {
            warn!(?pane, ?parent, "close_pane: parent is not a split");
            return CloseOutcome::NotFound;
        };
        let survivor = if children[0] == pane { children[1] } else { children[0] };
        let grandparent = self.nodes[parent].parent;

        let _ = self.nodes.remove(pane);
        let _ = self.nodes.remove(parent);
        self.nodes[survivor].parent = grandparent;
        match grandparent {
            None => self.root = survivor,
            Some(gp) => {
                if let NodeKind::Split { children, .. } = &mut self.nodes[gp].kind {
                    for slot in children.iter_mut() {
                        if *slot == parent {
                            *slot = survivor;
                        }
                    }
                }
            }
        }
        CloseOutcome::Removed
    }

    /// Overwrites a split's size pair. The pair is normalized so it sums to
    /// 100; degenerate input (non-positive sum, NaN) is ignored.
    pub fn update_split_sizes(&mut self, split: NodeId, new_sizes: [f64; 2]) {
        let sum = new_sizes[0] + new_sizes[1];
        if !sum.is_finite() || sum <= 0.0 || new_sizes.iter().any(|s| *s < 0.0) {
            warn!(?split, ?new_sizes, "update_split_sizes: degenerate sizes, ignoring");
            return;
        }
        match self.nodes.get_mut(split) {
            Some(Node {
                kind: NodeKind::Split { sizes, .. },
                ..
            }) => {
                *sizes = [new_sizes[0] * 100.0 / sum, new_sizes[1] * 100.0 / sum];
            }
            _ => debug!(?split, "update_split_sizes: not a split, ignoring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_two_panes() -> (LayoutTree, NodeId, NodeId) {
        let mut tree = LayoutTree::new();
        let root_pane = tree.first_pane();
        let outcome = tree
            .split_pane(root_pane, Orientation::Horizontal, Placement::After)
            .unwrap();
        (tree, outcome.original, outcome.new)
    }

    mod splitting {
        use super::*;

        #[test]
        fn split_replaces_pane_with_two_fresh_panes() {
            let mut tree = LayoutTree::new();
            let pane = tree.first_pane();
            let outcome = tree
                .split_pane(pane, Orientation::Horizontal, Placement::After)
                .unwrap();

            assert!(!tree.is_pane(pane));
            assert!(tree.is_split(pane));
            assert_eq!(tree.pane_ids(), vec![outcome.original, outcome.new]);
            assert_eq!(tree.split_sizes(pane), Some([50.0, 50.0]));
            assert_eq!(tree.orientation(pane), Some(Orientation::Horizontal));
        }

        #[test]
        fn placement_before_puts_new_pane_first() {
            let mut tree = LayoutTree::new();
            let pane = tree.first_pane();
            let outcome = tree
                .split_pane(pane, Orientation::Vertical, Placement::Before)
                .unwrap();
            assert_eq!(tree.pane_ids(), vec![outcome.new, outcome.original]);
        }

        #[test]
        fn split_unknown_id_is_a_noop() {
            let (mut tree, original, _) = tree_with_two_panes();
            let split_id = tree.root();
            assert!(tree.split_pane(split_id, Orientation::Vertical, Placement::After).is_none());
            assert!(tree
                .split_pane(NodeId::default(), Orientation::Vertical, Placement::After)
                .is_none());
            assert!(tree.is_pane(original));
            assert_eq!(tree.pane_count(), 2);
        }

        #[test]
        fn nested_splits_keep_preorder() {
            let (mut tree, left, right) = tree_with_two_panes();
            let outcome = tree
                .split_pane(left, Orientation::Vertical, Placement::After)
                .unwrap();
            assert_eq!(tree.pane_ids(), vec![outcome.original, outcome.new, right]);
        }
    }

    mod closing {
        use super::*;

        #[test]
        fn closing_a_pane_collapses_its_split() {
            let (mut tree, left, right) = tree_with_two_panes();
            let split_id = tree.root();

            assert_eq!(tree.close_pane(right), CloseOutcome::Removed);
            assert_eq!(tree.pane_ids(), vec![left]);
            assert_eq!(tree.root(), left);
            assert!(!tree.is_split(split_id));
        }

        #[test]
        fn survivor_keeps_its_own_subtree() {
            let (mut tree, left, right) = tree_with_two_panes();
            let inner = tree
                .split_pane(right, Orientation::Vertical, Placement::After)
                .unwrap();

            assert_eq!(tree.close_pane(left), CloseOutcome::Removed);
            assert_eq!(tree.pane_ids(), vec![inner.original, inner.new]);
        }

        #[test]
        fn collapse_repoints_the_grandparent_child_slot() {
            let (mut tree, left, _right) = tree_with_two_panes();
            let inner = tree
                .split_pane(left, Orientation::Vertical, Placement::After)
                .unwrap();

            assert_eq!(tree.close_pane(inner.new), CloseOutcome::Removed);
            let children = tree.split_children(tree.root()).unwrap();
            assert_eq!(children[0], inner.original);
            assert_eq!(tree.pane_count(), 2);
        }

        #[test]
        fn closing_the_last_pane_resets_to_a_fresh_pane() {
            let mut tree = LayoutTree::new();
            let pane = tree.first_pane();
            let outcome = tree.close_pane(pane);
            let CloseOutcome::Reset(fresh) = outcome else {
                panic!("expected reset, got {outcome:?}");
            };
            assert_ne!(fresh, pane);
            assert_eq!(tree.pane_ids(), vec![fresh]);
        }

        #[test]
        fn close_unknown_id_is_a_noop() {
            let (mut tree, ..) = tree_with_two_panes();
            assert_eq!(tree.close_pane(NodeId::default()), CloseOutcome::NotFound);
            assert_eq!(tree.close_pane(tree.root()), CloseOutcome::NotFound);
            assert_eq!(tree.pane_count(), 2);
        }

        #[test]
        fn split_then_close_restores_leaf_count() {
            let mut tree = LayoutTree::new();
            let pane = tree.first_pane();
            let before = tree.pane_count();
            let outcome = tree
                .split_pane(pane, Orientation::Horizontal, Placement::After)
                .unwrap();
            assert_eq!(tree.close_pane(outcome.new), CloseOutcome::Removed);
            assert_eq!(tree.pane_count(), before);
            assert_eq!(tree.pane_ids(), vec![outcome.original]);
        }
    }

    mod sizes {
        use super::*;

        #[test]
        fn sizes_always_sum_to_one_hundred() {
            let (mut tree, ..) = tree_with_two_panes();
            let split = tree.root();

            tree.update_split_sizes(split, [30.0, 70.0]);
            assert_eq!(tree.split_sizes(split), Some([30.0, 70.0]));

            tree.update_split_sizes(split, [1.0, 3.0]);
            let sizes = tree.split_sizes(split).unwrap();
            assert!((sizes[0] + sizes[1] - 100.0).abs() < 1e-9);
            assert!((sizes[0] - 25.0).abs() < 1e-9);
        }

        #[test]
        fn degenerate_sizes_are_ignored() {
            let (mut tree, ..) = tree_with_two_panes();
            let split = tree.root();
            tree.update_split_sizes(split, [0.0, 0.0]);
            tree.update_split_sizes(split, [-10.0, 110.0]);
            tree.update_split_sizes(split, [f64::NAN, 50.0]);
            assert_eq!(tree.split_sizes(split), Some([50.0, 50.0]));
        }

        #[test]
        fn resizing_a_pane_id_is_a_noop() {
            let (mut tree, left, _) = tree_with_two_panes();
            tree.update_split_sizes(left, [30.0, 70.0]);
            assert_eq!(tree.split_sizes(left), None);
        }
    }

    mod traversal {
        use super::*;

        #[test]
        fn pane_ids_are_unique_leaves() {
            let (mut tree, left, right) = tree_with_two_panes();
            tree.split_pane(right, Orientation::Vertical, Placement::Before).unwrap();
            tree.split_pane(left, Orientation::Horizontal, Placement::After).unwrap();

            let ids = tree.pane_ids();
            assert_eq!(ids.len(), 4);
            for id in &ids {
                assert!(tree.is_pane(*id));
            }
            let mut deduped = ids.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), ids.len());
        }

        #[test]
        fn first_pane_is_preorder_first() {
            let (mut tree, left, _right) = tree_with_two_panes();
            let inner = tree
                .split_pane(left, Orientation::Vertical, Placement::Before)
                .unwrap();
            assert_eq!(tree.first_pane(), inner.new);
            assert_eq!(tree.first_pane(), tree.pane_ids()[0]);
        }
    }
}
