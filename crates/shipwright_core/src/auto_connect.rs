//! Connection inference for blocks placed without explicit wiring.
//!
//! Greedy and per pair: for each unordered pair of nearby blocks, the two
//! free ports closest to each other are joined. This is not a global
//! minimum matching; a block's ports are consumed by earlier pairs first.
//! Pairs that are already joined still get their nearest free ports wired,
//! so each pass adds at most one edge per pair while free ports remain.

use crate::block::{BlockId, BlockInstance, PortIndex, PortRef};
use crate::graph::{ConnectionGraph, ConnectionId};
use crate::math::Fixed;
use crate::ship::BlockStore;

/// Joins nearby blocks through their closest free ports.
#[derive(Debug, Clone, Copy)]
pub struct AutoConnector {
    threshold: Fixed,
}

impl AutoConnector {
    /// Create a connector for blocks whose centers are at most `threshold`
    /// apart.
    #[must_use]
    pub const fn new(threshold: Fixed) -> Self {
        Self { threshold }
    }

    /// Maximum block-center distance considered.
    #[must_use]
    pub const fn threshold(&self) -> Fixed {
        self.threshold
    }

    /// Whether two blocks are close enough to be considered. A negative
    /// threshold matches nothing.
    #[must_use]
    pub fn within_range(&self, a: &BlockInstance, b: &BlockInstance) -> bool {
        self.threshold >= Fixed::ZERO
            && a.position().distance_squared(b.position()) <= self.threshold * self.threshold
    }

    /// Closest pair of free ports between two blocks.
    ///
    /// Ports are scanned in index order (`a` outer, `b` inner); on equal
    /// distances the first pair found wins.
    #[must_use]
    pub fn nearest_free_ports(
        a: &BlockInstance,
        b: &BlockInstance,
    ) -> Option<(PortIndex, PortIndex)> {
        let mut best: Option<(PortIndex, PortIndex, Fixed)> = None;
        for port_a in a.available_connection_points() {
            let Some(pos_a) = a.connection_point(port_a) else {
                continue;
            };
            for port_b in b.available_connection_points() {
                let Some(pos_b) = b.connection_point(port_b) else {
                    continue;
                };
                let distance = pos_a.distance_squared(pos_b);
                if best.map_or(true, |(_, _, d)| distance < d) {
                    best = Some((port_a, port_b, distance));
                }
            }
        }
        best.map(|(port_a, port_b, _)| (port_a, port_b))
    }

    /// Connect every eligible pair. Returns the new connections in the
    /// order they were made.
    pub fn connect_all(
        &self,
        blocks: &mut BlockStore,
        graph: &mut ConnectionGraph,
    ) -> Vec<ConnectionId> {
        let ids: Vec<BlockId> = blocks.ids().collect();
        let mut made = Vec::new();

        for (i, &first) in ids.iter().enumerate() {
            for &second in &ids[i + 1..] {
                let ports = match (blocks.get(first), blocks.get(second)) {
                    (Some(a), Some(b)) if self.within_range(a, b) => Self::nearest_free_ports(a, b),
                    _ => None,
                };
                let Some((port_a, port_b)) = ports else {
                    continue;
                };

                match graph.connect(
                    blocks,
                    PortRef::new(first, port_a),
                    PortRef::new(second, port_b),
                ) {
                    Ok(id) => made.push(id),
                    Err(e) => {
                        tracing::debug!(%first, %second, error = %e, "Auto-connect skipped pair");
                    }
                }
            }
        }

        tracing::debug!(connections = made.len(), "Auto-connect finished");
        made
    }
}
