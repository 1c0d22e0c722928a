//! Undirected multigraph of block connections.
//!
//! Blocks are nodes keyed by [`BlockId`]; edges live in a flat table keyed by
//! [`ConnectionId`] with an adjacency index kept beside it. No node holds a
//! reference to another, so cycles in the structure are just cycles in the
//! index.
//!
//! Port occupancy flags belong to the blocks themselves. The graph reaches
//! them through [`PortOccupancy`] so that connecting and disconnecting always
//! update both sides together.
//!
//! All traversals visit nodes in ascending id order (which is insertion
//! order), so results are reproducible.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::block::{BlockId, PortIndex, PortRef};
use crate::error::StructuralError;

/// Identifier of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

/// An edge between two ports on two different blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// First endpoint.
    pub a: PortRef,
    /// Second endpoint.
    pub b: PortRef,
}

impl Connection {
    /// Whether either endpoint is on `block`.
    #[must_use]
    pub fn involves(&self, block: BlockId) -> bool {
        self.a.block == block || self.b.block == block
    }

    /// Whether this edge joins `x` and `y` (in either order).
    #[must_use]
    pub fn joins(&self, x: BlockId, y: BlockId) -> bool {
        (self.a.block == x && self.b.block == y) || (self.a.block == y && self.b.block == x)
    }

    /// The block on the far side from `block`.
    #[must_use]
    pub fn other(&self, block: BlockId) -> Option<BlockId> {
        if self.a.block == block {
            Some(self.b.block)
        } else if self.b.block == block {
            Some(self.a.block)
        } else {
            None
        }
    }

    /// The port this edge uses on `block`.
    #[must_use]
    pub fn port_on(&self, block: BlockId) -> Option<PortIndex> {
        if self.a.block == block {
            Some(self.a.port)
        } else if self.b.block == block {
            Some(self.b.port)
        } else {
            None
        }
    }
}

/// Access to per-block port occupancy flags.
pub trait PortOccupancy {
    /// Whether the port is occupied.
    ///
    /// # Errors
    ///
    /// Fails for an unknown block or an out-of-range port.
    fn is_port_occupied(&self, port: PortRef) -> Result<bool, StructuralError>;

    /// Mark the port occupied.
    ///
    /// # Errors
    ///
    /// Fails if the port is invalid or already occupied.
    fn occupy_port(&mut self, port: PortRef) -> Result<(), StructuralError>;

    /// Mark the port free.
    ///
    /// # Errors
    ///
    /// Fails if the port is invalid or already free.
    fn release_port(&mut self, port: PortRef) -> Result<(), StructuralError>;
}

/// Connection graph over the blocks of one ship.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    /// Adjacency index: incident edge ids per node.
    adjacency: BTreeMap<BlockId, BTreeSet<ConnectionId>>,
    /// Edge table.
    edges: BTreeMap<ConnectionId, Connection>,
    next_edge: u32,
}

impl ConnectionGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
            edges: BTreeMap::new(),
            next_edge: 1,
        }
    }

    /// Add an isolated node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, block: BlockId) {
        self.adjacency.entry(block).or_default();
    }

    /// Remove a node and every edge touching it, releasing the ports on both
    /// ends. Returns the removed edges.
    pub fn remove_node<P: PortOccupancy>(&mut self, ports: &mut P, block: BlockId) -> Vec<Connection> {
        let incident: Vec<ConnectionId> = self
            .adjacency
            .get(&block)
            .map(|edges| edges.iter().copied().collect())
            .unwrap_or_default();

        let removed = incident
            .into_iter()
            .filter_map(|id| self.remove_edge(ports, id))
            .collect();
        self.adjacency.remove(&block);
        removed
    }

    /// Whether the node exists.
    #[must_use]
    pub fn contains_node(&self, block: BlockId) -> bool {
        self.adjacency.contains_key(&block)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.adjacency.keys().copied()
    }

    /// All edges in creation order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.edges.iter().map(|(id, c)| (*id, c))
    }

    /// Look up an edge.
    #[must_use]
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.edges.get(&id)
    }

    /// Connect two ports.
    ///
    /// Both ports are marked occupied and the edge is recorded. Nothing
    /// changes if any check fails.
    ///
    /// # Errors
    ///
    /// - [`StructuralError::SelfConnection`] if both ports are on one block.
    /// - [`StructuralError::UnknownBlock`] if either block is not a node.
    /// - [`StructuralError::PortOutOfRange`] for an invalid port index.
    /// - [`StructuralError::PortOccupied`] if either port already has an edge.
    pub fn connect<P: PortOccupancy>(
        &mut self,
        ports: &mut P,
        a: PortRef,
        b: PortRef,
    ) -> Result<ConnectionId, StructuralError> {
        if a.block == b.block {
            return Err(StructuralError::SelfConnection(a.block));
        }
        for end in [a, b] {
            if !self.contains_node(end.block) {
                return Err(StructuralError::UnknownBlock(end.block));
            }
            if ports.is_port_occupied(end)? {
                return Err(StructuralError::PortOccupied {
                    block: end.block,
                    port: end.port,
                });
            }
        }

        ports.occupy_port(a)?;
        if let Err(e) = ports.occupy_port(b) {
            // Roll back the first half so occupancy never disagrees with edges.
            let _ = ports.release_port(a);
            return Err(e);
        }

        let id = ConnectionId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, Connection { a, b });
        self.adjacency.entry(a.block).or_default().insert(id);
        self.adjacency.entry(b.block).or_default().insert(id);
        tracing::trace!(?id, ?a, ?b, "Connected ports");
        Ok(id)
    }

    /// Remove every edge joining `x` and `y` and release their ports.
    ///
    /// Returns the removed edges; empty if none existed.
    pub fn disconnect<P: PortOccupancy>(
        &mut self,
        ports: &mut P,
        x: BlockId,
        y: BlockId,
    ) -> Vec<Connection> {
        let joining: Vec<ConnectionId> = self
            .adjacency
            .get(&x)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| self.edges.get(id).is_some_and(|c| c.joins(x, y)))
            .collect();

        joining
            .into_iter()
            .filter_map(|id| self.remove_edge(ports, id))
            .collect()
    }

    /// Remove one edge by id and release its ports.
    pub fn remove_edge<P: PortOccupancy>(
        &mut self,
        ports: &mut P,
        id: ConnectionId,
    ) -> Option<Connection> {
        let connection = self.edges.remove(&id)?;
        for end in [connection.a, connection.b] {
            if let Some(edges) = self.adjacency.get_mut(&end.block) {
                edges.remove(&id);
            }
            if let Err(e) = ports.release_port(end) {
                tracing::warn!(?end, error = %e, "Port was not occupied while removing edge");
            }
        }
        Some(connection)
    }

    /// Blocks one edge away from `block`.
    #[must_use]
    pub fn neighbors_of(&self, block: BlockId) -> BTreeSet<BlockId> {
        self.incident(block)
            .filter_map(|(_, c)| c.other(block))
            .collect()
    }

    /// Number of edges touching `block`.
    #[must_use]
    pub fn degree(&self, block: BlockId) -> usize {
        self.adjacency.get(&block).map_or(0, BTreeSet::len)
    }

    /// Edges touching `block`.
    #[must_use]
    pub fn connections_of(&self, block: BlockId) -> Vec<(ConnectionId, Connection)> {
        self.incident(block).map(|(id, c)| (id, *c)).collect()
    }

    /// Whether at least one edge joins `x` and `y` directly.
    #[must_use]
    pub fn are_connected(&self, x: BlockId, y: BlockId) -> bool {
        self.incident(x).any(|(_, c)| c.joins(x, y))
    }

    fn incident(&self, block: BlockId) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.adjacency
            .get(&block)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id).map(|c| (*id, c)))
    }

    /// Breadth-first search from `start`, returning nodes in visit order.
    fn bfs(&self, start: BlockId, visited: &mut BTreeSet<BlockId>) -> Vec<BlockId> {
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for next in self.neighbors_of(node) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// Whether `to` can be reached from `from` along edges.
    #[must_use]
    pub fn is_reachable(&self, from: BlockId, to: BlockId) -> bool {
        if !self.contains_node(from) || !self.contains_node(to) {
            return false;
        }
        let mut visited = BTreeSet::new();
        self.bfs(from, &mut visited);
        visited.contains(&to)
    }

    /// Partition all nodes into connected components.
    ///
    /// Components are ordered by their smallest id, and each component is
    /// sorted ascending.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<BlockId>> {
        let mut visited = BTreeSet::new();
        let mut components = Vec::new();

        for node in self.nodes() {
            if visited.contains(&node) {
                continue;
            }
            let mut component = self.bfs(node, &mut visited);
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    /// Nodes with no edges. Empty for graphs with fewer than two nodes.
    #[must_use]
    pub fn orphans(&self) -> Vec<BlockId> {
        if self.node_count() < 2 {
            return Vec::new();
        }
        self.adjacency
            .iter()
            .filter(|(_, edges)| edges.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Nodes whose removal would split their component.
    ///
    /// Iterative Tarjan low-link search. Parallel edges count as separate
    /// paths, so a pair joined twice is not a bridge.
    #[must_use]
    pub fn articulation_points(&self) -> BTreeSet<BlockId> {
        struct Frame {
            node: BlockId,
            via: Option<ConnectionId>,
            edges: Vec<(ConnectionId, BlockId)>,
            next: usize,
        }

        let mut discovery: HashMap<BlockId, u32> = HashMap::new();
        let mut low: HashMap<BlockId, u32> = HashMap::new();
        let mut points = BTreeSet::new();
        let mut time = 0u32;

        let frame_for = |node: BlockId, via: Option<ConnectionId>| Frame {
            node,
            via,
            edges: self
                .incident(node)
                .filter_map(|(id, c)| c.other(node).map(|other| (id, other)))
                .collect(),
            next: 0,
        };

        for root in self.nodes() {
            if discovery.contains_key(&root) {
                continue;
            }
            discovery.insert(root, time);
            low.insert(root, time);
            time += 1;

            let mut root_children = 0;
            let mut stack = vec![frame_for(root, None)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                if let Some(&(edge, next)) = frame.edges.get(frame.next) {
                    frame.next += 1;
                    if Some(edge) == frame.via {
                        continue;
                    }
                    if let Some(&seen) = discovery.get(&next) {
                        let current = low[&node];
                        low.insert(node, current.min(seen));
                    } else {
                        discovery.insert(next, time);
                        low.insert(next, time);
                        time += 1;
                        if node == root {
                            root_children += 1;
                        }
                        stack.push(frame_for(next, Some(edge)));
                    }
                } else {
                    stack.pop();
                    if let Some(parent) = stack.last() {
                        let parent = parent.node;
                        let child_low = low[&node];
                        let parent_low = low[&parent];
                        low.insert(parent, parent_low.min(child_low));
                        if parent != root && child_low >= discovery[&parent] {
                            points.insert(parent);
                        }
                    }
                }
            }

            if root_children > 1 {
                points.insert(root);
            }
        }

        points
    }

    /// Check that edges and occupancy flags agree.
    ///
    /// Every edge endpoint must be occupied and no port may carry more than
    /// one edge. Returns one message per violation.
    #[must_use]
    pub fn consistency_errors<P: PortOccupancy>(&self, ports: &P) -> Vec<String> {
        let mut errors = Vec::new();
        let mut used: HashMap<PortRef, ConnectionId> = HashMap::new();

        for (id, connection) in &self.edges {
            for end in [connection.a, connection.b] {
                if let Some(previous) = used.insert(end, *id) {
                    errors.push(format!(
                        "port {} of block {} used by {:?} and {:?}",
                        end.port, end.block, previous, id
                    ));
                }
                match ports.is_port_occupied(end) {
                    Ok(true) => {}
                    Ok(false) => errors.push(format!(
                        "port {} of block {} carries {:?} but is not marked occupied",
                        end.port, end.block, id
                    )),
                    Err(e) => errors.push(format!("{id:?}: {e}")),
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Occupancy table with a fixed number of ports per block.
    #[derive(Default)]
    struct Ports {
        flags: HashMap<BlockId, Vec<bool>>,
    }

    impl Ports {
        fn with_blocks(graph: &mut ConnectionGraph, count: u32, ports_each: usize) -> Self {
            let mut table = Self::default();
            for i in 1..=count {
                graph.add_node(BlockId(i));
                table.flags.insert(BlockId(i), vec![false; ports_each]);
            }
            table
        }

        fn slot(&mut self, port: PortRef) -> Result<&mut bool, StructuralError> {
            let flags = self
                .flags
                .get_mut(&port.block)
                .ok_or(StructuralError::UnknownBlock(port.block))?;
            let count = flags.len();
            flags.get_mut(port.port).ok_or(StructuralError::PortOutOfRange {
                block: port.block,
                port: port.port,
                port_count: count,
            })
        }
    }

    impl PortOccupancy for Ports {
        fn is_port_occupied(&self, port: PortRef) -> Result<bool, StructuralError> {
            let flags = self
                .flags
                .get(&port.block)
                .ok_or(StructuralError::UnknownBlock(port.block))?;
            flags
                .get(port.port)
                .copied()
                .ok_or(StructuralError::PortOutOfRange {
                    block: port.block,
                    port: port.port,
                    port_count: flags.len(),
                })
        }

        fn occupy_port(&mut self, port: PortRef) -> Result<(), StructuralError> {
            let slot = self.slot(port)?;
            if *slot {
                return Err(StructuralError::PortOccupied {
                    block: port.block,
                    port: port.port,
                });
            }
            *slot = true;
            Ok(())
        }

        fn release_port(&mut self, port: PortRef) -> Result<(), StructuralError> {
            let slot = self.slot(port)?;
            if !*slot {
                return Err(StructuralError::PortAlreadyFree {
                    block: port.block,
                    port: port.port,
                });
            }
            *slot = false;
            Ok(())
        }
    }

    fn p(block: u32, port: PortIndex) -> PortRef {
        PortRef::new(BlockId(block), port)
    }

    fn ids(raw: &[u32]) -> Vec<BlockId> {
        raw.iter().copied().map(BlockId).collect()
    }

    #[test]
    fn test_connect_marks_ports() {
        let mut graph = ConnectionGraph::new();
        let mut ports = Ports::with_blocks(&mut graph, 2, 4);

        graph.connect(&mut ports, p(1, 0), p(2, 2)).unwrap();
        assert_eq!(ports.is_port_occupied(p(1, 0)), Ok(true));
        assert_eq!(ports.is_port_occupied(p(2, 2)), Ok(true));
        assert_eq!(graph.neighbors_of(BlockId(1)), BTreeSet::from([BlockId(2)]));
        assert!(graph.consistency_errors(&ports).is_empty());
    }

    #[test]
    fn test_connect_rejects_occupied_and_self() {
        let mut graph = ConnectionGraph::new();
        let mut ports = Ports::with_blocks(&mut graph, 3, 4);

        graph.connect(&mut ports, p(1, 0), p(2, 2)).unwrap();
        assert_eq!(
            graph.connect(&mut ports, p(3, 0), p(2, 2)),
            Err(StructuralError::PortOccupied {
                block: BlockId(2),
                port: 2
            })
        );
        // The free side of a rejected request stays free.
        assert_eq!(ports.is_port_occupied(p(3, 0)), Ok(false));

        assert_eq!(
            graph.connect(&mut ports, p(1, 1), p(1, 2)),
            Err(StructuralError::SelfConnection(BlockId(1)))
        );
        assert!(matches!(
            graph.connect(&mut ports, p(1, 1), p(3, 7)),
            Err(StructuralError::PortOutOfRange { .. })
        ));
        assert_eq!(
            graph.connect(&mut ports, p(1, 1), p(9, 0)),
            Err(StructuralError::UnknownBlock(BlockId(9)))
        );
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_disconnect_releases_ports() {
        let mut graph = ConnectionGraph::new();
        let mut ports = Ports::with_blocks(&mut graph, 2, 4);

        graph.connect(&mut ports, p(1, 0), p(2, 2)).unwrap();
        graph.connect(&mut ports, p(1, 1), p(2, 3)).unwrap();
        let removed = graph.disconnect(&mut ports, BlockId(2), BlockId(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(ports.is_port_occupied(p(1, 0)), Ok(false));
        assert_eq!(ports.is_port_occupied(p(2, 3)), Ok(false));

        // No edge: no-op.
        assert!(graph.disconnect(&mut ports, BlockId(1), BlockId(2)).is_empty());
    }

    #[test]
    fn test_components_merge() {
        let mut graph = ConnectionGraph::new();
        let mut ports = Ports::with_blocks(&mut graph, 4, 4);

        graph.connect(&mut ports, p(1, 0), p(2, 2)).unwrap();
        graph.connect(&mut ports, p(3, 0), p(4, 2)).unwrap();
        assert_eq!(
            graph.connected_components(),
            vec![ids(&[1, 2]), ids(&[3, 4])]
        );
        assert!(!graph.is_reachable(BlockId(1), BlockId(4)));

        graph.connect(&mut ports, p(2, 0), p(3, 2)).unwrap();
        assert_eq!(graph.connected_components(), vec![ids(&[1, 2, 3, 4])]);
        assert!(graph.is_reachable(BlockId(1), BlockId(4)));
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut graph = ConnectionGraph::new();
        let mut ports = Ports::with_blocks(&mut graph, 3, 4);

        graph.connect(&mut ports, p(1, 0), p(2, 2)).unwrap();
        graph.connect(&mut ports, p(2, 0), p(3, 2)).unwrap();
        let removed = graph.remove_node(&mut ports, BlockId(2));
        assert_eq!(removed.len(), 2);
        assert!(!graph.contains_node(BlockId(2)));
        assert_eq!(ports.is_port_occupied(p(1, 0)), Ok(false));
        assert_eq!(ports.is_port_occupied(p(3, 2)), Ok(false));
        assert_eq!(graph.orphans(), ids(&[1, 3]));
    }

    #[test]
    fn test_articulation_points_chain_and_cycle() {
        let mut graph = ConnectionGraph::new();
        let mut ports = Ports::with_blocks(&mut graph, 4, 4);

        // Chain 1-2-3-4: the middle blocks hold it together.
        graph.connect(&mut ports, p(1, 0), p(2, 2)).unwrap();
        graph.connect(&mut ports, p(2, 0), p(3, 2)).unwrap();
        graph.connect(&mut ports, p(3, 0), p(4, 2)).unwrap();
        assert_eq!(
            graph.articulation_points(),
            BTreeSet::from([BlockId(2), BlockId(3)])
        );

        // Closing the loop removes every cut vertex.
        graph.connect(&mut ports, p(4, 0), p(1, 2)).unwrap();
        assert!(graph.articulation_points().is_empty());
    }

    #[test]
    fn test_parallel_edges_are_not_bridges() {
        let mut graph = ConnectionGraph::new();
        let mut ports = Ports::with_blocks(&mut graph, 3, 4);

        graph.connect(&mut ports, p(1, 0), p(2, 2)).unwrap();
        graph.connect(&mut ports, p(1, 1), p(2, 3)).unwrap();
        graph.connect(&mut ports, p(2, 0), p(3, 2)).unwrap();
        assert_eq!(graph.articulation_points(), BTreeSet::from([BlockId(2)]));
        assert_eq!(graph.degree(BlockId(2)), 3);
        assert_eq!(graph.neighbors_of(BlockId(2)).len(), 2);
    }

    #[test]
    fn test_orphans_trivial_graph() {
        let mut graph = ConnectionGraph::new();
        graph.add_node(BlockId(1));
        assert!(graph.orphans().is_empty());
        assert_eq!(graph.connected_components(), vec![ids(&[1])]);
    }
}
