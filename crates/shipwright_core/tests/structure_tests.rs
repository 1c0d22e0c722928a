//! Structural behaviour of assembled ships: connectivity, auto-connect,
//! derived stats and the port occupancy invariant.

use std::sync::Arc;

use proptest::prelude::*;
use shipwright_core::prelude::*;
use shipwright_test_utils::determinism::strategies::arb_op_sequence;
use shipwright_test_utils::fixtures::{
    definition, fixed, line_ship_with_ids, scattered_hulls, three_hull_line, CELL, PORT_EAST,
    PORT_NORTH, PORT_SOUTH, PORT_WEST,
};

// =============================================================================
// Connectivity
// =============================================================================

#[test]
fn test_two_groups_merge_into_one_structure() {
    let hull = definition("hull");
    let mut ship = Ship::new("pairs", ShipyardConfig::default());
    let a = ship.add_block(Arc::clone(&hull), Vec2Fixed::ZERO, Rotation::Deg0);
    let b = ship.add_block(Arc::clone(&hull), Vec2Fixed::from_ints(CELL, 0), Rotation::Deg0);
    let c = ship.add_block(Arc::clone(&hull), Vec2Fixed::from_ints(0, CELL), Rotation::Deg0);
    let d = ship.add_block(hull, Vec2Fixed::from_ints(CELL, CELL), Rotation::Deg0);
    ship.connect(a, PORT_EAST, b, PORT_WEST).unwrap();
    ship.connect(c, PORT_EAST, d, PORT_WEST).unwrap();

    let report = ship.validate_structural_integrity();
    assert!(!report.is_valid);
    assert_eq!(report.components, 2);
    assert_eq!(report.orphaned_groups, vec![vec![c, d]]);
    assert_eq!(report.issues.len(), 1);
    assert!(!ship.is_constructed());

    ship.connect(a, PORT_NORTH, c, PORT_SOUTH).unwrap();
    let report = ship.validate_structural_integrity();
    assert!(report.is_valid);
    assert_eq!(report.components, 1);
    assert!(report.orphaned_groups.is_empty());
    assert!(report.misaligned.is_empty());
    assert!(ship.is_constructed());
}

#[test]
fn test_removing_a_bridge_splits_the_ship() {
    let (mut ship, ids) = line_ship_with_ids(&["cockpit", "hull", "ion_engine"]);
    assert!(ship.is_constructed());

    ship.remove_block(ids[1]).unwrap();
    assert!(!ship.is_constructed());
    assert_eq!(ship.validate_structural_integrity().components, 2);
    for id in [ids[0], ids[2]] {
        assert_eq!(ship.block(id).unwrap().occupied_count(), 0);
    }
    assert!(ship.consistency_errors().is_empty());
}

#[test]
fn test_disconnect_frees_both_ports() {
    let (mut ship, ids) = line_ship_with_ids(&["hull", "hull"]);
    assert_eq!(ship.disconnect(ids[0], ids[1]), 1);
    assert_eq!(ship.block(ids[0]).unwrap().is_occupied(PORT_EAST), Some(false));
    assert_eq!(ship.block(ids[1]).unwrap().is_occupied(PORT_WEST), Some(false));
    assert_eq!(ship.disconnect(ids[0], ids[1]), 0);
    assert!(!ship.is_constructed());
}

#[test]
fn test_rejected_connection_leaves_ship_unchanged() {
    let (mut ship, ids) = line_ship_with_ids(&["hull", "hull", "hull"]);
    let before = ship.state_hash();

    assert!(matches!(
        ship.connect(ids[0], PORT_EAST, ids[2], PORT_WEST),
        Err(ShipError::Structural(StructuralError::PortOccupied { .. }))
    ));
    assert!(matches!(
        ship.connect(ids[0], 9, ids[2], PORT_WEST),
        Err(ShipError::Structural(StructuralError::PortOutOfRange { .. }))
    ));
    assert!(matches!(
        ship.connect(ids[0], PORT_NORTH, BlockId(99), PORT_SOUTH),
        Err(ShipError::Structural(StructuralError::UnknownBlock(_)))
    ));
    assert_eq!(ship.state_hash(), before);
}

// =============================================================================
// Auto-connect
// =============================================================================

#[test]
fn test_auto_connect_joins_adjacent_blocks() {
    let hull = definition("hull");
    let mut ship = Ship::new("pair", ShipyardConfig::default());
    let a = ship.add_block(Arc::clone(&hull), Vec2Fixed::ZERO, Rotation::Deg0);
    let b = ship.add_block(hull, Vec2Fixed::from_ints(CELL, 0), Rotation::Deg0);

    assert_eq!(ship.auto_connect().len(), 1);
    assert!(ship.graph().are_connected(a, b));
    assert_eq!(ship.block(a).unwrap().is_occupied(PORT_EAST), Some(true));
    assert_eq!(ship.block(b).unwrap().is_occupied(PORT_WEST), Some(true));
    assert!(ship.is_constructed());

    // A second pass wires the next closest free ports of the same pair.
    assert_eq!(ship.auto_connect().len(), 1);
    assert_eq!(ship.graph().edge_count(), 2);
    assert_eq!(ship.block(a).unwrap().is_occupied(PORT_NORTH), Some(true));
    assert_eq!(ship.block(b).unwrap().is_occupied(PORT_NORTH), Some(true));
    assert!(ship.consistency_errors().is_empty());
}

#[test]
fn test_auto_connect_wires_facing_ports_of_joined_pair() {
    let hull = definition("hull");
    let mut ship = Ship::new("pair", ShipyardConfig::default());
    let a = ship.add_block(Arc::clone(&hull), Vec2Fixed::ZERO, Rotation::Deg0);
    let b = ship.add_block(hull, Vec2Fixed::from_ints(CELL, 0), Rotation::Deg0);
    ship.connect(a, PORT_NORTH, b, PORT_NORTH).unwrap();

    assert_eq!(ship.auto_connect().len(), 1);
    assert_eq!(ship.graph().edge_count(), 2);
    assert_eq!(ship.block(a).unwrap().is_occupied(PORT_EAST), Some(true));
    assert_eq!(ship.block(b).unwrap().is_occupied(PORT_WEST), Some(true));
    assert!(ship.consistency_errors().is_empty());
}

#[test]
fn test_auto_connect_ignores_distant_blocks() {
    let (mut ship, _) = scattered_hulls(3);
    assert!(ship.auto_connect().is_empty());
    assert_eq!(ship.validate_structural_integrity().components, 3);
}

// =============================================================================
// Stats
// =============================================================================

#[test]
fn test_three_hull_line_stats() {
    let mut ship = three_hull_line();
    let stats = ship.stats();

    assert_eq!(stats.block_count, 3);
    assert_eq!(stats.total_mass, fixed(30));
    assert_eq!(stats.center_of_mass, Vec2Fixed::ZERO);
    assert_eq!(stats.moment_of_inertia, fixed(20480));
    assert_eq!(stats.maneuverability, fixed(1000) / fixed(20480));
    assert_eq!(stats.total_thrust, Fixed::ZERO);
    assert_eq!(stats.acceleration, Fixed::ZERO);
    assert_eq!(stats.max_speed, Fixed::ZERO);
    assert_eq!(stats.total_armor, fixed(60));
}

#[test]
fn test_empty_ship_stats() {
    let mut ship = Ship::new("empty", ShipyardConfig::default());
    let stats = ship.stats();
    assert_eq!(stats.total_mass, Fixed::ZERO);
    assert_eq!(stats.center_of_mass, Vec2Fixed::ZERO);
    assert_eq!(stats.maneuverability, Fixed::ONE);
    assert!(!ship.is_constructed());
    assert!(ship.validate_structural_integrity().is_valid);
}

#[test]
fn test_utility_blocks_set_capacities() {
    let mut ship = shipwright_test_utils::fixtures::line_ship(&[
        "ion_engine",
        "reactor",
        "shield_generator",
        "cockpit",
    ]);
    let stats = ship.stats();
    assert_eq!(stats.max_fuel, fixed(150));
    assert_eq!(stats.max_power, fixed(300));
    assert_eq!(stats.max_shield, fixed(60));
    assert_eq!(stats.total_thrust, fixed(240));
    assert_eq!(stats.fuel_consumption, fixed(2));

    let resources = ship.resources();
    assert_eq!(resources.fuel, fixed(150));
    assert_eq!(resources.max_power, fixed(300));
    assert_eq!(resources.shield, fixed(60));
}

#[test]
fn test_stats_cache_invalidated_by_mutation() {
    let (mut ship, ids) = line_ship_with_ids(&["hull", "hull"]);
    let first = ship.stats();
    assert!(!ship.stats_dirty());

    ship.remove_block(ids[1]).unwrap();
    assert!(ship.stats_dirty());
    let second = ship.stats();
    assert_ne!(first, second);
    assert_eq!(second.total_mass, fixed(10));
}

// =============================================================================
// Resources and damage
// =============================================================================

#[test]
fn test_consume_fuel_is_all_or_nothing() {
    let mut ship = three_hull_line();
    assert!(ship.consume_fuel(fixed(40)));
    assert_eq!(ship.resources().fuel, fixed(60));
    assert!(!ship.consume_fuel(fixed(61)));
    assert_eq!(ship.resources().fuel, fixed(60));
    assert!(!ship.consume_fuel(fixed(-5)));

    ship.refuel(fixed(500));
    assert_eq!(ship.resources().fuel, fixed(100));
}

#[test]
fn test_ship_damage_uses_shield_then_armor() {
    let mut ship = shipwright_test_utils::fixtures::line_ship(&["shield_generator", "hull"]);
    assert_eq!(ship.resources().shield, fixed(60));

    // Fully absorbed.
    assert_eq!(ship.take_damage(fixed(50)), Fixed::ZERO);
    assert_eq!(ship.resources().shield, fixed(10));

    // 10 absorbed, armor 20 removes min(9, 1) = 1 of the remaining 90.
    assert_eq!(ship.take_damage(fixed(100)), fixed(89));
    assert_eq!(ship.resources().shield, Fixed::ZERO);
}

// =============================================================================
// Property tests
// =============================================================================

fn six_hulls() -> Ship {
    let hull = definition("hull");
    let mut ship = Ship::new("props", ShipyardConfig::default());
    for i in 0..6 {
        ship.add_block(
            Arc::clone(&hull),
            Vec2Fixed::from_ints(i * CELL, 0),
            Rotation::Deg0,
        );
    }
    ship
}

proptest! {
    /// Every occupied port is backed by exactly one edge after any edit
    /// sequence, and the constructed flag tracks validity.
    #[test]
    fn prop_occupancy_matches_graph(ops in arb_op_sequence(6, 40)) {
        let mut ship = six_hulls();
        for op in ops {
            op.apply(&mut ship);
            prop_assert!(ship.consistency_errors().is_empty(), "{:?}", ship.consistency_errors());
            let report = ship.validate_structural_integrity();
            prop_assert_eq!(
                ship.is_constructed(),
                report.is_valid && ship.block_count() > 0
            );
        }
    }

    /// Auto-connect never produces inconsistent occupancy, whatever was
    /// already wired.
    #[test]
    fn prop_auto_connect_preserves_occupancy(ops in arb_op_sequence(6, 20)) {
        let mut ship = six_hulls();
        for op in ops {
            op.apply(&mut ship);
        }
        ship.auto_connect();
        prop_assert!(ship.consistency_errors().is_empty());
    }

    /// Asking for more fuel than the tank holds fails and leaves the tank
    /// as it was.
    #[test]
    fn prop_overdraw_leaves_fuel_unchanged(
        spent in 0i32..=100,
        excess_bits in 1i64..(1i64 << 32),
    ) {
        let mut ship = three_hull_line();
        prop_assert!(ship.consume_fuel(fixed(spent)));
        let before = ship.resources().fuel;

        let amount = before + Fixed::from_bits(excess_bits);
        prop_assert!(!ship.consume_fuel(amount));
        prop_assert_eq!(ship.resources().fuel, before);
    }
}
