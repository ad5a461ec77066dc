//! Search-time node records.

use grid_tactics_core::Point;

/// Handle of a node inside the arena of one search.
///
/// Handles are only meaningful for the [`crate::Zone`] (or search instance)
/// that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    pub(crate) fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Membership of a node in the open/closed bookkeeping of a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeList {
    /// Discovered but never queued; only produced by geometric queries.
    Unvisited,
    /// Queued for expansion.
    Open,
    /// Popped from the open list; its cost and parent chain are final.
    ///
    /// Zone leaves at or over the budget are closed without being expanded.
    Closed,
}

/// Best known way of reaching a point during one search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    /// Point represented by the node.
    pub point: Point,
    /// Accumulated cost from the search origin.
    pub cost: u32,
    /// Manhattan distance to the search target, zero when there is none.
    pub heuristic: u32,
    /// Node this one was reached from; `None` for the origin.
    pub parent: Option<NodeId>,
    /// Open/closed membership when the search stopped.
    pub list: NodeList,
}

impl Node {
    /// Ordering key of the open list: `cost + heuristic`.
    #[must_use]
    pub fn best_guess_distance(&self) -> u64 {
        u64::from(self.cost) + u64::from(self.heuristic)
    }
}
