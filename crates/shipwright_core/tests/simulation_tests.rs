//! Per-tick simulation against the recording physics world, plus the
//! editor and blueprint flows that feed it.

use proptest::prelude::*;
use shipwright_core::combat::mitigate_damage;
use shipwright_core::prelude::*;
use shipwright_core::simulation::tick_delta;
use shipwright_test_utils::determinism::strategies::{arb_armor, arb_damage, arb_shield};
use shipwright_test_utils::determinism::{
    find_first_divergence, run_parallel_flights, verify_flight_determinism,
    verify_snapshot_determinism, FlightRun,
};
use shipwright_test_utils::fixtures::{
    fixed, line_ship, scout_blueprint, standard_registry, three_hull_line,
};
use shipwright_test_utils::physics::RecordingPhysicsWorld;

type Sim = ShipSimulation<RecordingPhysicsWorld>;

fn scout() -> Ship {
    scout_blueprint()
        .assemble(&standard_registry(), ShipyardConfig::default())
        .unwrap()
}

// =============================================================================
// Ticking
// =============================================================================

#[test]
fn test_tick_at_full_resources_changes_nothing() {
    let mut world = RecordingPhysicsWorld::new();
    let mut sim = Sim::new(scout());
    sim.attach(&mut world);

    let resources = *sim.ship().resources();
    let first = sim.tick(&mut world, tick_delta());
    let second = sim.tick(&mut world, tick_delta());

    assert_eq!(*sim.ship().resources(), resources);
    assert_eq!(first.stats, second.stats);
    assert_eq!(first.drag, None);
    assert!(first.structural.is_valid);
    assert_eq!(sim.current_tick(), 2);
}

#[test]
fn test_tick_regenerates_shield() {
    let mut world = RecordingPhysicsWorld::new();
    let mut ship = scout();
    assert_eq!(ship.take_damage(fixed(30)), Fixed::ZERO);
    let mut sim = Sim::new(ship);

    // Default shield regeneration is 2 per second.
    let _ = sim.tick(&mut world, fixed(1));
    assert_eq!(sim.ship().resources().shield, fixed(32));

    for _ in 0..20 {
        let _ = sim.tick(&mut world, fixed(1));
    }
    assert_eq!(sim.ship().resources().shield, fixed(60));
}

#[test]
fn test_drag_opposes_velocity() {
    let mut world = RecordingPhysicsWorld::new();
    let mut sim = Sim::new(three_hull_line());
    let body = sim.attach(&mut world);
    world.set_velocity(body, Vec2Fixed::from_ints(50, 0));

    let report = sim.tick(&mut world, tick_delta());
    let drag = report.drag.unwrap();
    assert_eq!(drag, Vec2Fixed::new(fixed(-50) / fixed(100), Fixed::ZERO));
    assert_eq!(world.forces.len(), 1);
}

#[test]
fn test_disconnected_ship_gets_no_drag_or_thrust() {
    let mut world = RecordingPhysicsWorld::new();
    let mut ship = line_ship(&["ion_engine", "cockpit"]);
    let ids: Vec<BlockId> = ship.blocks().ids().collect();
    ship.disconnect(ids[0], ids[1]);
    let mut sim = Sim::new(ship);
    let body = sim.attach(&mut world);
    world.set_velocity(body, Vec2Fixed::from_ints(10, 0));

    let outcome = sim.apply_thrust(
        &mut world,
        Vec2Fixed::from_ints(1, 0),
        Fixed::ONE,
        tick_delta(),
    );
    assert_eq!(outcome, ThrustOutcome::NotConstructed);

    let report = sim.tick(&mut world, tick_delta());
    assert_eq!(report.drag, None);
    assert!(!report.structural.is_valid);
    assert!(world.forces.is_empty());
}

// =============================================================================
// Thrust
// =============================================================================

#[test]
fn test_thrust_spends_fuel_and_pushes_body() {
    let mut world = RecordingPhysicsWorld::new();
    let mut sim = Sim::new(line_ship(&["ion_engine", "reactor", "cockpit"]));
    let body = sim.attach(&mut world);

    let outcome = sim.apply_thrust(
        &mut world,
        Vec2Fixed::from_ints(0, 3),
        fixed(1) / fixed(2),
        fixed(1),
    );
    assert_eq!(
        outcome,
        ThrustOutcome::Applied {
            force: Vec2Fixed::from_ints(0, 120),
            fuel_used: fixed(1),
        }
    );
    assert_eq!(sim.ship().resources().fuel, fixed(149));
    assert_eq!(world.total_force(body), Vec2Fixed::from_ints(0, 120));
}

#[test]
fn test_thrust_refused_when_tank_is_dry() {
    let mut world = RecordingPhysicsWorld::new();
    let mut ship = line_ship(&["ion_engine", "cockpit"]);
    assert!(ship.consume_fuel(fixed(99)));
    let mut sim = Sim::new(ship);
    sim.attach(&mut world);

    // Two seconds at full throttle needs 4 fuel; only 1 is left.
    let outcome = sim.apply_thrust(&mut world, Vec2Fixed::from_ints(1, 0), Fixed::ONE, fixed(2));
    assert_eq!(outcome, ThrustOutcome::FuelExhausted);
    assert_eq!(sim.ship().resources().fuel, fixed(1));
    assert!(world.forces.is_empty());
}

#[test]
fn test_thrust_needs_a_body() {
    let mut world = RecordingPhysicsWorld::new();
    let mut sim = Sim::new(scout());
    assert_eq!(
        sim.apply_thrust(&mut world, Vec2Fixed::from_ints(1, 0), Fixed::ONE, tick_delta()),
        ThrustOutcome::Detached
    );
    assert!(matches!(sim.detach(&mut world), Err(ShipError::NoBody)));

    sim.attach(&mut world);
    sim.detach(&mut world).unwrap();
    assert_eq!(world.body_count(), 0);
}

#[test]
fn test_body_bounds_follow_ship() {
    let mut world = RecordingPhysicsWorld::new();
    let mut sim = Sim::new(three_hull_line());
    let body = sim.attach(&mut world);
    world.set_position(body, Vec2Fixed::from_ints(500, 500));

    assert!(sim.contains_point(&world, Vec2Fixed::from_ints(540, 500)));
    assert!(!sim.contains_point(&world, Vec2Fixed::from_ints(560, 500)));
    assert!(!sim.contains_point(&world, Vec2Fixed::ZERO));

    let ids: Vec<BlockId> = sim.ship().blocks().ids().collect();
    // Block 3 sits at x = -32 in ship coordinates.
    assert_eq!(
        sim.block_world_position(&world, ids[2]),
        Some(Vec2Fixed::from_ints(468, 500))
    );

    let ship = sim.into_ship(&mut world);
    assert_eq!(ship.block_count(), 3);
    assert_eq!(world.removed, vec![body]);
}

// =============================================================================
// Determinism
// =============================================================================

fn scout_flight() -> FlightRun {
    FlightRun::new(scout(), Vec2Fixed::from_ints(1, 1), fixed(3) / fixed(4))
}

#[test]
fn test_scout_flight_is_deterministic() {
    assert!(verify_flight_determinism(scout_flight, 200));
    assert_eq!(find_first_divergence(scout_flight, 100), None);
}

#[test]
fn test_parallel_scout_flights_match() {
    run_parallel_flights(scout_flight, 4, 100).assert_deterministic();
}

#[test]
fn test_scout_snapshot_rebuilds_identically() {
    assert!(verify_snapshot_determinism(&scout(), &standard_registry()));
}

// =============================================================================
// Editor and blueprints
// =============================================================================

#[test]
fn test_editor_builds_flyable_ship() {
    let mut editor = ShipEditor::new(standard_registry(), "Courier", ShipyardConfig::default()).unwrap();
    editor.add_block("cockpit", (1, 0), Rotation::Deg0).unwrap();
    editor.add_block("reactor", (0, 0), Rotation::Deg0).unwrap();
    editor.select_block_type("ion_engine").unwrap();
    editor
        .place_selected(Vec2Fixed::from_ints(-30, 4), Rotation::Deg0)
        .unwrap();
    assert!(!editor.validate_structural_integrity().is_valid);

    assert_eq!(editor.auto_connect().len(), 2);
    assert!(editor.validate_structural_integrity().is_valid);

    let ship = editor.into_ship();
    assert!(ship.is_constructed());
    assert_eq!(ship.resources().fuel, fixed(150));
}

#[test]
fn test_blueprint_ron_round_trip() {
    let ship = scout();
    let text = ship.to_blueprint().to_ron_string().unwrap();
    let rebuilt = ShipBlueprint::from_ron_str(&text, "scout.ron")
        .unwrap()
        .assemble(&standard_registry(), ShipyardConfig::default())
        .unwrap();
    assert_eq!(rebuilt.state_hash(), ship.state_hash());
}

#[test]
fn test_blueprint_overrides_apply() {
    let mut blueprint = scout_blueprint();
    blueprint.blocks[3].overrides.thrust = Some(fixed(400));
    let mut ship = blueprint
        .assemble(&standard_registry(), ShipyardConfig::default())
        .unwrap();
    assert_eq!(ship.stats().total_thrust, fixed(400));
    assert_eq!(ship.to_blueprint().blocks[3].overrides.thrust, Some(fixed(400)));
}

#[test]
fn test_blueprint_with_unknown_block_fails() {
    let mut blueprint = scout_blueprint();
    blueprint.blocks.push(BlueprintBlock::new("warp_core", (2, 0)));
    let result = blueprint.assemble(&standard_registry(), ShipyardConfig::default());
    assert!(matches!(result, Err(ShipError::UnknownBlockType(t)) if t == "warp_core"));
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    /// Shield, armor and pass-through always account for the whole hit.
    #[test]
    fn prop_damage_is_conserved(
        damage in arb_damage(),
        shield in arb_shield(),
        armor in arb_armor(),
    ) {
        let out = mitigate_damage(damage, shield, armor);
        prop_assert_eq!(out.absorbed_by_shield + out.reduced_by_armor + out.passed_through, damage);
        prop_assert!(out.absorbed_by_shield <= shield);
        prop_assert!(out.passed_through <= damage);
        prop_assert!(out.reduced_by_armor * fixed(10) <= damage - out.absorbed_by_shield);
    }

    /// Any throttle produces the same flight twice.
    #[test]
    fn prop_throttle_is_deterministic(percent in 0i32..=100, dx in -5i32..=5, dy in -5i32..=5) {
        let setup = move || {
            FlightRun::new(scout(), Vec2Fixed::from_ints(dx, dy), fixed(percent) / fixed(100))
        };
        prop_assert!(verify_flight_determinism(setup, 30));
    }
}
