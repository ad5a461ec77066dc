//! Finished search results keyed by point.

use std::collections::BTreeMap;

use grid_tactics_core::Point;

use crate::node::{Node, NodeId};

/// Set of nodes produced by a search or a geometric query.
///
/// Iteration follows row-major point order, independent of discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zone {
    nodes: Vec<Node>,
    index: BTreeMap<Point, NodeId>,
}

impl Zone {
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.point, NodeId::from_index(position)))
            .collect();
        Self { nodes, index }
    }

    /// Number of points in the zone.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Reports whether the zone holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Reports whether the zone holds the provided point.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.index.contains_key(&point)
    }

    /// Node recorded for the provided point.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<&Node> {
        self.index.get(&point).and_then(|id| self.node(*id))
    }

    /// Handle of the node recorded for the provided point.
    #[must_use]
    pub fn id_of(&self, point: Point) -> Option<NodeId> {
        self.index.get(&point).copied()
    }

    /// Node stored under the provided handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Iterates over every node in row-major point order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.index.values().filter_map(|id| self.node(*id))
    }

    /// Iterates over the points of the zone in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.index.keys().copied()
    }

    /// Iterates over the nodes whose cost does not exceed `max_cost`.
    pub fn within(&self, max_cost: u32) -> impl Iterator<Item = &Node> + '_ {
        self.iter().filter(move |node| node.cost <= max_cost)
    }

    /// Walks the parent chain from `end` back to its root, returned root first.
    ///
    /// Returns an empty vector for an unknown handle.
    #[must_use]
    pub fn build_path(&self, end: NodeId) -> Vec<Node> {
        let mut path = Vec::new();
        let mut cursor = self.node(end);
        while let Some(node) = cursor {
            path.push(*node);
            if path.len() > self.nodes.len() {
                break;
            }
            cursor = node.parent.and_then(|parent| self.node(parent));
        }
        path.reverse();
        path
    }

    /// Path from the zone's root to the provided point, if the zone holds it.
    #[must_use]
    pub fn path_to(&self, point: Point) -> Option<Vec<Node>> {
        self.id_of(point).map(|id| self.build_path(id))
    }
}

/// Point produced by growing a zone without walkability checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendedZonePoint {
    /// Location of the point.
    pub point: Point,
    /// Ring index that first reached the point; zero for original members.
    pub distance: u32,
    /// Point of the previous ring this one grew from.
    pub parent: Option<Point>,
}

/// Zone grown by additional geometric rings, keyed by point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtendedZone {
    points: BTreeMap<Point, ExtendedZonePoint>,
}

impl ExtendedZone {
    pub(crate) fn seeded(zone: &Zone) -> Self {
        let points = zone
            .points()
            .map(|point| {
                (
                    point,
                    ExtendedZonePoint {
                        point,
                        distance: 0,
                        parent: None,
                    },
                )
            })
            .collect();
        Self { points }
    }

    /// Grows every current point by one cardinal step tagged with `distance`.
    ///
    /// The first ring to reach a point wins; `accept` filters out-of-grid points.
    pub(crate) fn grow<F>(&mut self, distance: u32, accept: F)
    where
        F: Fn(Point) -> bool,
    {
        let snapshot: Vec<Point> = self.points.keys().copied().collect();
        for origin in snapshot {
            for neighbor in origin.cardinal_neighbors() {
                if !accept(neighbor) || self.points.contains_key(&neighbor) {
                    continue;
                }
                let _ = self.points.insert(
                    neighbor,
                    ExtendedZonePoint {
                        point: neighbor,
                        distance,
                        parent: Some(origin),
                    },
                );
            }
        }
    }

    /// Number of points, including the original zone members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether the extended zone holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reports whether the extended zone holds the provided point.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.points.contains_key(&point)
    }

    /// Entry recorded for the provided point.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<&ExtendedZonePoint> {
        self.points.get(&point)
    }

    /// Iterates over every entry in row-major point order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtendedZonePoint> + '_ {
        self.points.values()
    }

    /// Iterates over the points first reached by the provided ring.
    pub fn ring(&self, distance: u32) -> impl Iterator<Item = &ExtendedZonePoint> + '_ {
        self.iter().filter(move |entry| entry.distance == distance)
    }
}
