//! Test fixtures and helpers.
//!
//! A standard block catalog plus a few pre-built ships for consistent
//! testing. Every block type in the catalog is a 32-unit square with the
//! four edge ports East, North, West, South (indices 0 to 3).

use std::sync::Arc;

use shipwright_core::block::BlockId;
use shipwright_core::config::ShipyardConfig;
use shipwright_core::data::{BlockDefinition, BlockKind, BlueprintBlock, ShipBlueprint};
use shipwright_core::math::{Fixed, Rotation, Vec2Fixed};
use shipwright_core::registry::BlockRegistry;
use shipwright_core::ship::Ship;

/// East port index on standard blocks.
pub const PORT_EAST: usize = 0;
/// North port index on standard blocks.
pub const PORT_NORTH: usize = 1;
/// West port index on standard blocks.
pub const PORT_WEST: usize = 2;
/// South port index on standard blocks.
pub const PORT_SOUTH: usize = 3;

/// Spacing between neighbouring block centers.
pub const CELL: i32 = 32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// The standard test catalog.
///
/// | id | kind | mass | notes |
/// |----|------|------|-------|
/// | `hull` | structure | 10 | armor 20 |
/// | `cockpit` | cockpit | 8 | armor 10 |
/// | `ion_engine` | engine | 12 | thrust 240, fuel 2/s |
/// | `reactor` | reactor | 25 | capacity 150 |
/// | `shield_generator` | shield | 15 | capacity 60 |
/// | `cargo_pod` | cargo | 6 | capacity 200, no utility |
#[must_use]
pub fn standard_definitions() -> Vec<BlockDefinition> {
    vec![
        BlockDefinition::new("hull", BlockKind::Structure, fixed(10))
            .with_armor(fixed(20))
            .with_edge_ports(),
        BlockDefinition::new("cockpit", BlockKind::Cockpit, fixed(8))
            .with_armor(fixed(10))
            .with_edge_ports(),
        BlockDefinition::new("ion_engine", BlockKind::Engine, fixed(12))
            .with_thrust(fixed(240), fixed(2))
            .with_edge_ports(),
        BlockDefinition::new("reactor", BlockKind::Reactor, fixed(25))
            .with_capacity(fixed(150))
            .with_edge_ports(),
        BlockDefinition::new("shield_generator", BlockKind::Shield, fixed(15))
            .with_capacity(fixed(60))
            .with_edge_ports(),
        BlockDefinition::new("cargo_pod", BlockKind::Cargo, fixed(6))
            .with_capacity(fixed(200))
            .with_edge_ports(),
    ]
}

/// Registry holding [`standard_definitions`].
///
/// # Panics
///
/// Never in practice; the standard definitions are valid.
#[must_use]
pub fn standard_registry() -> Arc<BlockRegistry> {
    Arc::new(
        BlockRegistry::from_definitions(standard_definitions())
            .expect("standard catalog is valid"),
    )
}

/// Look up a standard definition.
///
/// # Panics
///
/// Panics if `block_type` is not in the standard catalog.
#[must_use]
pub fn definition(block_type: &str) -> Arc<BlockDefinition> {
    standard_registry()
        .definition(block_type)
        .expect("block type is in the standard catalog")
}

/// A ship with the given blocks laid out left to right, one cell apart,
/// each joined East-to-West to the next one. Fully supplied.
///
/// # Panics
///
/// Panics if a type is not in the standard catalog.
#[must_use]
pub fn line_ship(block_types: &[&str]) -> Ship {
    let (ship, _) = line_ship_with_ids(block_types);
    ship
}

/// Like [`line_ship`], also returning the ids in placement order.
///
/// # Panics
///
/// Panics if a type is not in the standard catalog.
#[must_use]
pub fn line_ship_with_ids(block_types: &[&str]) -> (Ship, Vec<BlockId>) {
    let registry = standard_registry();
    let mut ship = Ship::new("line", ShipyardConfig::default());
    let mut ids = Vec::with_capacity(block_types.len());
    let mut x = 0;
    for block_type in block_types {
        let definition = registry
            .definition(block_type)
            .expect("block type is in the standard catalog");
        ids.push(ship.add_block(definition, Vec2Fixed::from_ints(x, 0), Rotation::Deg0));
        x += CELL;
    }
    for pair in ids.windows(2) {
        ship.connect(pair[0], PORT_EAST, pair[1], PORT_WEST)
            .expect("adjacent line blocks connect");
    }
    ship.resupply();
    (ship, ids)
}

/// Three 10-mass hull blocks at x = -32, 0, 32, connected in a line.
///
/// Center of mass is the origin and the moment of inertia is
/// `10 * 32² * 2 = 20480`.
#[must_use]
pub fn three_hull_line() -> Ship {
    let hull = definition("hull");
    let mut ship = Ship::new("three", ShipyardConfig::default());
    let middle = ship.add_block(Arc::clone(&hull), Vec2Fixed::ZERO, Rotation::Deg0);
    let right = ship.add_block(Arc::clone(&hull), Vec2Fixed::from_ints(CELL, 0), Rotation::Deg0);
    let left = ship.add_block(hull, Vec2Fixed::from_ints(-CELL, 0), Rotation::Deg0);
    ship.connect(middle, PORT_EAST, right, PORT_WEST)
        .expect("fresh ports");
    ship.connect(left, PORT_EAST, middle, PORT_WEST)
        .expect("fresh ports");
    ship
}

/// `count` unconnected hulls 1000 units apart, far beyond the auto-connect
/// threshold, returned with their ids.
///
/// # Panics
///
/// Panics if `count` does not fit in an `i32`.
#[must_use]
pub fn scattered_hulls(count: usize) -> (Ship, Vec<BlockId>) {
    let hull = definition("hull");
    let mut ship = Ship::new("scattered", ShipyardConfig::default());
    let ids = (0..count)
        .map(|i| {
            let x = i32::try_from(i).expect("count fits in i32") * 1000;
            ship.add_block(Arc::clone(&hull), Vec2Fixed::from_ints(x, 0), Rotation::Deg0)
        })
        .collect();
    (ship, ids)
}

/// A small ship blueprint: cockpit in front, reactor and shield behind it,
/// an engine at the back, wired by auto-connect.
///
/// ```text
///            [shield]
/// [engine][reactor][cockpit]
/// ```
#[must_use]
pub fn scout_blueprint() -> ShipBlueprint {
    ShipBlueprint {
        name: "Scout".to_string(),
        blocks: vec![
            BlueprintBlock::new("cockpit", (1, 0)),
            BlueprintBlock::new("reactor", (0, 0)),
            BlueprintBlock::new("shield_generator", (0, 1)),
            BlueprintBlock::new("ion_engine", (-1, 0)),
        ],
        connections: Vec::new(),
        auto_connect: true,
    }
}

/// A square grid of hulls, `side` blocks per edge, auto-connected to
/// orthogonal neighbours only (the threshold is one cell, so diagonal
/// pairs are out of range).
#[must_use]
pub fn hull_grid(side: i32) -> Ship {
    let hull = definition("hull");
    let config = ShipyardConfig {
        auto_connect_threshold: fixed(CELL),
        ..ShipyardConfig::default()
    };
    let mut ship = Ship::new("grid", config);
    for y in 0..side {
        for x in 0..side {
            ship.add_block(
                Arc::clone(&hull),
                Vec2Fixed::from_ints(x * CELL, y * CELL),
                Rotation::Deg0,
            );
        }
    }
    ship.auto_connect();
    ship
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_loads() {
        let registry = standard_registry();
        assert_eq!(registry.len(), 6);
        assert!(registry.contains("ion_engine"));
    }

    #[test]
    fn test_line_ship_is_constructed() {
        let ship = line_ship(&["cockpit", "hull", "ion_engine"]);
        assert!(ship.is_constructed());
        assert_eq!(ship.graph().edge_count(), 2);
    }

    #[test]
    fn test_scout_assembles() {
        let ship = scout_blueprint()
            .assemble(&standard_registry(), ShipyardConfig::default())
            .unwrap();
        assert!(ship.is_constructed());
        assert_eq!(ship.block_count(), 4);
    }

    #[test]
    fn test_hull_grid_connects_every_neighbour() {
        let ship = hull_grid(3);
        // 3x3 grid: 6 horizontal and 6 vertical neighbours.
        assert_eq!(ship.graph().edge_count(), 12);
        assert!(ship.is_constructed());
    }
}
