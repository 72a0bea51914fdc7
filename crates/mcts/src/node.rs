//! Search-tree node types.
//!
//! Nodes live in an arena ([`crate::tree::Tree`]) and are addressed by
//! index, avoiding Rc/RefCell overhead.

use std::hash::Hash;

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Visit/value statistics for a single node.
#[derive(Clone, Debug)]
pub struct NodeStats {
    /// Number of simulations that have passed through this node.
    pub visit_count: u32,

    /// Accumulated backed-up value across all visits.
    pub value_sum: f32,

    /// Prior probability assigned by the predictor to the action that led
    /// here, frozen at the parent's expansion time.
    pub prior: f32,
}

impl NodeStats {
    pub fn new(prior: f32) -> Self {
        Self {
            visit_count: 0,
            value_sum: 0.0,
            prior,
        }
    }

    /// Mean backed-up value (Q). Defined as 0.0 while unvisited.
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }
}

/// One decision point in the game tree or latent-state tree.
///
/// A child exists iff its action has been expanded at the parent; a node is
/// expanded exactly once, on its first visit as a leaf.
#[derive(Clone, Debug)]
pub struct Node<A: Clone + Copy + Eq + Hash> {
    /// Action that led to this node (`None` for the root).
    pub action: Option<A>,

    /// Player to act here, as a sign relative to the root (+1/-1). The
    /// latent variant is single-perspective and keeps +1 throughout.
    pub player: i8,

    /// Immediate reward attributed to the edge entering this node.
    /// Zero for board games; predicted in the latent variant.
    pub reward: f32,

    /// Hashable identifier of the underlying state, recorded at expansion.
    /// `None` for latent nodes, whose states are opaque handles.
    pub state_key: Option<u64>,

    pub stats: NodeStats,

    /// Children as (action, node) pairs, in ascending action-index order.
    pub children: Vec<(A, NodeId)>,

    /// Set exactly once, when the node is first visited as a leaf.
    pub expanded: bool,

    /// Whether this node holds a terminal game state (direct variant only).
    pub terminal: bool,

    /// Ground-truth outcome for a terminal node, from the perspective of
    /// the player to move here.
    pub terminal_value: Option<f32>,
}

impl<A: Clone + Copy + Eq + Hash> Node<A> {
    pub fn new(action: Option<A>, prior: f32, player: i8) -> Self {
        Self {
            action,
            player,
            reward: 0.0,
            state_key: None,
            stats: NodeStats::new(prior),
            children: Vec::new(),
            expanded: false,
            terminal: false,
            terminal_value: None,
        }
    }

    pub fn root() -> Self {
        Self::new(None, 1.0, 1)
    }

    /// Child id for an action, if that action has been expanded.
    pub fn child(&self, action: A) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, id)| *id)
    }
}
