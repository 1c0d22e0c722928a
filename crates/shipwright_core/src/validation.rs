//! Structural integrity checks.
//!
//! A ship is structurally sound when every block belongs to one connected
//! component. The validator is pure and linear in blocks plus connections,
//! so it is cheap enough to run every tick.
//!
//! Port geometry is checked too, but only as advisory warnings: a connection
//! between ports that do not face each other still holds the ship together.

use serde::Serialize;

use crate::block::{BlockId, BlockInstance, PortIndex};
use crate::graph::{ConnectionGraph, ConnectionId};
use crate::math::Fixed;
use crate::ship::{BlockStore, Ship};

/// Result of a structural validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StructuralReport {
    /// Whether all blocks form a single connected component.
    pub is_valid: bool,
    /// Human-readable problems, one per extra component.
    pub issues: Vec<String>,
    /// Number of connected components.
    pub components: usize,
    /// Block groups cut off from the main body (the component holding the
    /// lowest block id).
    pub orphaned_groups: Vec<Vec<BlockId>>,
    /// Connections whose ports do not face each other.
    pub misaligned: Vec<ConnectionId>,
    /// Human-readable geometry warnings, one per misaligned connection.
    pub warnings: Vec<String>,
}

/// Connectivity and port-geometry validator.
#[derive(Debug, Clone, Copy)]
pub struct StructuralValidator {
    alignment_tolerance: Fixed,
}

impl StructuralValidator {
    /// Create a validator with the given port alignment slack.
    #[must_use]
    pub const fn new(alignment_tolerance: Fixed) -> Self {
        Self {
            alignment_tolerance,
        }
    }

    /// Validate a ship.
    #[must_use]
    pub fn validate(&self, ship: &Ship) -> StructuralReport {
        self.validate_parts(ship.blocks(), ship.graph())
    }

    /// Validate a block table and its connection graph.
    #[must_use]
    pub fn validate_parts(&self, blocks: &BlockStore, graph: &ConnectionGraph) -> StructuralReport {
        let components = graph.connected_components();
        let orphaned_groups: Vec<Vec<BlockId>> = components.iter().skip(1).cloned().collect();
        let issues = orphaned_groups
            .iter()
            .map(|group| format!("Orphaned block group: {}", join_ids(group)))
            .collect();

        let mut misaligned = Vec::new();
        let mut warnings = Vec::new();
        for (id, connection) in graph.connections() {
            let (Some(a), Some(b)) = (blocks.get(connection.a.block), blocks.get(connection.b.block))
            else {
                continue;
            };
            if !ports_aligned(a, connection.a.port, b, connection.b.port, self.alignment_tolerance) {
                misaligned.push(id);
                warnings.push(format!(
                    "Connection {}:{} - {}:{} joins ports that do not face each other",
                    connection.a.block, connection.a.port, connection.b.block, connection.b.port
                ));
            }
        }

        StructuralReport {
            is_valid: components.len() <= 1,
            issues,
            components: components.len(),
            orphaned_groups,
            misaligned,
            warnings,
        }
    }
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self::new(Fixed::from_num(crate::config::ShipyardConfig::DEFAULT_ALIGNMENT_TOLERANCE))
    }
}

/// Validate a ship with its configured alignment tolerance.
#[must_use]
pub fn validate(ship: &Ship) -> StructuralReport {
    StructuralValidator::new(ship.config().port_alignment_tolerance).validate(ship)
}

/// Whether two ports face each other.
///
/// The facings must be opposite, and the vector from port `a` to port `b`
/// must run along `a`'s facing: sideways offset at most `tolerance`, and
/// not pointing back into block `a` by more than `tolerance`.
#[must_use]
pub fn ports_aligned(
    a: &BlockInstance,
    port_a: PortIndex,
    b: &BlockInstance,
    port_b: PortIndex,
    tolerance: Fixed,
) -> bool {
    let (Some(facing_a), Some(facing_b)) = (a.port_facing(port_a), b.port_facing(port_b)) else {
        return false;
    };
    let (Some(pos_a), Some(pos_b)) = (a.connection_point(port_a), b.connection_point(port_b))
    else {
        return false;
    };
    if facing_b != facing_a.opposite() {
        return false;
    }

    let dir = facing_a.unit_vector();
    let gap = pos_b - pos_a;
    dir.cross(gap).abs() <= tolerance && dir.dot(gap) >= -tolerance
}

fn join_ids(ids: &[BlockId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ShipyardConfig;
    use crate::data::{BlockDefinition, BlockKind};
    use crate::math::{Rotation, Vec2Fixed};

    fn hull() -> Arc<BlockDefinition> {
        Arc::new(
            BlockDefinition::new("hull", BlockKind::Structure, Fixed::from_num(10))
                .with_edge_ports(),
        )
    }

    fn ship_with(xs: &[i32]) -> (Ship, Vec<BlockId>) {
        let mut ship = Ship::new("test", ShipyardConfig::default());
        let ids = xs
            .iter()
            .map(|x| ship.add_block(hull(), Vec2Fixed::from_ints(*x, 0), Rotation::Deg0))
            .collect();
        (ship, ids)
    }

    #[test]
    fn test_empty_and_single_block_are_valid() {
        let (ship, _) = ship_with(&[]);
        assert!(validate(&ship).is_valid);

        let (ship, _) = ship_with(&[0]);
        let report = validate(&ship);
        assert!(report.is_valid);
        assert_eq!(report.components, 1);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_disconnected_groups_reported() {
        let (mut ship, ids) = ship_with(&[0, 32, 200, 232]);
        ship.connect(ids[0], 0, ids[1], 2).unwrap();
        ship.connect(ids[2], 0, ids[3], 2).unwrap();

        let report = validate(&ship);
        assert!(!report.is_valid);
        assert_eq!(report.components, 2);
        assert_eq!(report.orphaned_groups, vec![vec![ids[2], ids[3]]]);
        assert_eq!(report.issues, vec!["Orphaned block group: #3, #4".to_string()]);
    }

    #[test]
    fn test_aligned_ports_produce_no_warnings() {
        let (mut ship, ids) = ship_with(&[0, 32]);
        // East port of the left block meets the west port of the right one.
        ship.connect(ids[0], 0, ids[1], 2).unwrap();
        let report = validate(&ship);
        assert!(report.is_valid);
        assert!(report.misaligned.is_empty());
    }

    #[test]
    fn test_misaligned_ports_are_warnings_only() {
        let (mut ship, ids) = ship_with(&[0, 32]);
        // North port to south port on blocks side by side.
        let id = ship.connect(ids[0], 1, ids[1], 3).unwrap();
        let report = validate(&ship);
        assert!(report.is_valid);
        assert_eq!(report.misaligned, vec![id]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_ports_aligned_respects_tolerance() {
        let def = hull();
        let a = BlockInstance::new(BlockId(1), def.clone(), Vec2Fixed::ZERO, Rotation::Deg0);
        let b = BlockInstance::new(BlockId(2), def, Vec2Fixed::from_ints(34, 3), Rotation::Deg0);
        assert!(ports_aligned(&a, 0, &b, 2, Fixed::from_num(4)));
        assert!(!ports_aligned(&a, 0, &b, 2, Fixed::from_num(2)));
    }
}
