//! Working set of a single search invocation.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use grid_tactics_core::Point;

use crate::node::{Node, NodeId, NodeList};
use crate::zone::Zone;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    priority: u64,
    sequence: u64,
    node: NodeId,
}

/// Arena of nodes plus the open list ordered by best-guess distance.
///
/// Relaxing a node pushes a fresh heap entry; outdated entries are dropped
/// when they surface. Ties pop in insertion order.
#[derive(Debug)]
pub(crate) struct Instance {
    end: Option<Point>,
    nodes: Vec<Node>,
    lookup: HashMap<Point, NodeId>,
    open: BinaryHeap<Reverse<OpenEntry>>,
    sequence: u64,
}

impl Instance {
    pub(crate) fn new(end: Option<Point>) -> Self {
        Self {
            end,
            nodes: Vec::new(),
            lookup: HashMap::new(),
            open: BinaryHeap::new(),
            sequence: 0,
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_at(&self, point: Point) -> Option<NodeId> {
        self.lookup.get(&point).copied()
    }

    /// Registers a newly discovered point and queues it.
    pub(crate) fn open(&mut self, point: Point, cost: u32, parent: Option<NodeId>) -> NodeId {
        let heuristic = self
            .end
            .map_or(0, |end| point.manhattan_distance(end));
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            point,
            cost,
            heuristic,
            parent,
            list: NodeList::Open,
        });
        let _ = self.lookup.insert(point, id);
        self.enqueue(id);
        id
    }

    /// Lowers the cost of an open node when `cost` is strictly cheaper.
    ///
    /// Closed nodes are never touched so their parent chains stay fixed.
    pub(crate) fn relax(&mut self, id: NodeId, cost: u32, parent: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            return false;
        };
        if node.list == NodeList::Closed || cost >= node.cost {
            return false;
        }

        node.cost = cost;
        node.parent = Some(parent);
        self.enqueue(id);
        true
    }

    /// Pops the open node with the lowest best-guess distance.
    pub(crate) fn pop(&mut self) -> Option<NodeId> {
        while let Some(Reverse(entry)) = self.open.pop() {
            let Some(node) = self.nodes.get(entry.node.index()) else {
                continue;
            };
            if node.list == NodeList::Open && node.best_guess_distance() == entry.priority {
                return Some(entry.node);
            }
        }
        None
    }

    pub(crate) fn close(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.list = NodeList::Closed;
        }
    }

    pub(crate) fn has_open_nodes(&self) -> bool {
        self.open.iter().any(|Reverse(entry)| {
            self.nodes.get(entry.node.index()).is_some_and(|node| {
                node.list == NodeList::Open && node.best_guess_distance() == entry.priority
            })
        })
    }

    pub(crate) fn into_zone(self) -> Zone {
        Zone::from_nodes(self.nodes)
    }

    fn enqueue(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id.index()) else {
            return;
        };
        let entry = OpenEntry {
            priority: node.best_guess_distance(),
            sequence: self.sequence,
            node: id,
        };
        self.sequence += 1;
        self.open.push(Reverse(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::Instance;
    use crate::node::NodeList;
    use grid_tactics_core::Point;

    #[test]
    fn pops_lowest_best_guess_first() {
        let mut instance = Instance::new(Some(Point::new(4, 0)));
        let far = instance.open(Point::new(0, 0), 0, None);
        let near = instance.open(Point::new(3, 0), 0, None);

        assert_eq!(instance.pop(), Some(near));
        instance.close(near);
        assert_eq!(instance.pop(), Some(far));
        assert_eq!(instance.pop(), None);
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut instance = Instance::new(None);
        let first = instance.open(Point::new(1, 0), 2, None);
        let second = instance.open(Point::new(0, 1), 2, None);

        assert_eq!(instance.pop(), Some(first));
        instance.close(first);
        assert_eq!(instance.pop(), Some(second));
    }

    #[test]
    fn relaxed_nodes_drop_stale_entries() {
        let mut instance = Instance::new(None);
        let origin = instance.open(Point::new(0, 0), 0, None);
        let other = instance.open(Point::new(5, 5), 9, None);
        assert_eq!(instance.pop(), Some(origin));
        instance.close(origin);

        assert!(instance.relax(other, 3, origin));
        assert!(!instance.relax(other, 3, origin));
        assert_eq!(instance.pop(), Some(other));
        instance.close(other);
        assert_eq!(instance.pop(), None);
        assert!(!instance.has_open_nodes());

        let node = instance.node(other).expect("node exists");
        assert_eq!(node.cost, 3);
        assert_eq!(node.parent, Some(origin));
        assert_eq!(node.list, NodeList::Closed);
    }

    #[test]
    fn closed_nodes_are_never_relaxed() {
        let mut instance = Instance::new(None);
        let origin = instance.open(Point::new(0, 0), 4, None);
        let _ = instance.pop();
        instance.close(origin);

        assert!(!instance.relax(origin, 1, origin));
        assert_eq!(instance.node(origin).map(|node| node.cost), Some(4));
    }
}
