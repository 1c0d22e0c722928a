//! Ship aggregate: blocks, their connections, resources and derived stats.
//!
//! Every topology or property change invalidates the cached [`ShipStats`],
//! re-applies resource capacities and re-runs the structural validator to
//! decide whether the ship is constructed. Stats themselves are recomputed
//! lazily on the next [`Ship::stats`] call.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auto_connect::AutoConnector;
use crate::block::{BlockId, BlockInstance, BlockProperties, PortIndex, PortRef};
use crate::combat::mitigate_damage;
use crate::config::ShipyardConfig;
use crate::data::{
    BlockDefinition, BlockKind, BlueprintBlock, BlueprintConnection, ShipBlueprint, UtilityRole,
};
use crate::error::{Result, ShipError, StructuralError};
use crate::graph::{ConnectionGraph, ConnectionId, PortOccupancy};
use crate::grid::BuildGrid;
use crate::math::{fixed_serde, fixed_sqrt, Fixed, Rotation, Vec2Fixed};
use crate::resources::ShipResources;
use crate::validation::{StructuralReport, StructuralValidator};

/// Fuel capacity of a ship without reactors.
pub const BASELINE_FUEL: i32 = 100;

/// Power capacity of a ship without reactors.
pub const BASELINE_POWER: i32 = 100;

/// Power provided per unit of reactor capacity.
pub const POWER_PER_REACTOR_CAPACITY: i32 = 2;

/// Numerator of the maneuverability formula `1000 / inertia`.
pub const MANEUVERABILITY_SCALE: i32 = 1000;

/// Factor under the root of the max speed formula `sqrt(acceleration * 100)`.
pub const MAX_SPEED_FACTOR: i32 = 100;

/// Block table keyed by id, iterated in ascending id order.
#[derive(Debug, Clone)]
pub struct BlockStore {
    blocks: BTreeMap<BlockId, BlockInstance>,
    next_id: u32,
}

impl BlockStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a block and return its id.
    pub fn insert(
        &mut self,
        definition: Arc<BlockDefinition>,
        position: Vec2Fixed,
        rotation: Rotation,
    ) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks
            .insert(id, BlockInstance::new(id, definition, position, rotation));
        id
    }

    /// Remove a block.
    pub fn remove(&mut self, id: BlockId) -> Option<BlockInstance> {
        self.blocks.remove(&id)
    }

    /// Get a block by id.
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&BlockInstance> {
        self.blocks.get(&id)
    }

    /// Get a mutable block by id.
    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut BlockInstance> {
        self.blocks.get_mut(&id)
    }

    /// Check if a block exists.
    #[must_use]
    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys().copied()
    }

    /// Iterate over blocks in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockInstance> {
        self.blocks.values()
    }

    fn slot(&mut self, port: PortRef) -> std::result::Result<&mut BlockInstance, StructuralError> {
        self.blocks
            .get_mut(&port.block)
            .ok_or(StructuralError::UnknownBlock(port.block))
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PortOccupancy for BlockStore {
    fn is_port_occupied(&self, port: PortRef) -> std::result::Result<bool, StructuralError> {
        let block = self
            .get(port.block)
            .ok_or(StructuralError::UnknownBlock(port.block))?;
        block
            .is_occupied(port.port)
            .ok_or(StructuralError::PortOutOfRange {
                block: port.block,
                port: port.port,
                port_count: block.port_count(),
            })
    }

    fn occupy_port(&mut self, port: PortRef) -> std::result::Result<(), StructuralError> {
        self.slot(port)?.occupy(port.port)
    }

    fn release_port(&mut self, port: PortRef) -> std::result::Result<(), StructuralError> {
        self.slot(port)?.release(port.port)
    }
}

/// Aggregate stats derived from a ship's blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShipStats {
    /// Number of blocks.
    pub block_count: usize,
    /// Sum of definition masses.
    #[serde(with = "fixed_serde")]
    pub total_mass: Fixed,
    /// Sum of engine thrust.
    #[serde(with = "fixed_serde")]
    pub total_thrust: Fixed,
    /// Sum of armor.
    #[serde(with = "fixed_serde")]
    pub total_armor: Fixed,
    /// Mass-weighted average of block positions.
    pub center_of_mass: Vec2Fixed,
    /// Sum of `mass * distance²` from the center of mass.
    #[serde(with = "fixed_serde")]
    pub moment_of_inertia: Fixed,
    /// Fuel burned per second by all engines at full throttle.
    #[serde(with = "fixed_serde")]
    pub fuel_consumption: Fixed,
    /// Fuel capacity.
    #[serde(with = "fixed_serde")]
    pub max_fuel: Fixed,
    /// Power capacity.
    #[serde(with = "fixed_serde")]
    pub max_power: Fixed,
    /// Shield capacity.
    #[serde(with = "fixed_serde")]
    pub max_shield: Fixed,
    /// Thrust per unit mass; zero for a massless ship.
    #[serde(with = "fixed_serde")]
    pub acceleration: Fixed,
    /// `sqrt(acceleration * 100)`.
    #[serde(with = "fixed_serde")]
    pub max_speed: Fixed,
    /// `1000 / inertia`, or 1 when inertia is zero.
    #[serde(with = "fixed_serde")]
    pub maneuverability: Fixed,
}

/// Capacities contributed by utility blocks, floored at the baselines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Capacities {
    fuel: Fixed,
    power: Fixed,
    shield: Fixed,
}

impl Capacities {
    fn of(blocks: &BlockStore) -> Self {
        let mut fuel = Fixed::ZERO;
        let mut power = Fixed::ZERO;
        let mut shield = Fixed::ZERO;
        for block in blocks.iter() {
            let capacity = block.properties().capacity;
            match block.properties().utility {
                UtilityRole::Reactor => {
                    fuel += capacity;
                    power += capacity * Fixed::from_num(POWER_PER_REACTOR_CAPACITY);
                }
                UtilityRole::Shield => shield += capacity,
                UtilityRole::Generic => {}
            }
        }
        Self {
            fuel: fuel.max(Fixed::from_num(BASELINE_FUEL)),
            power: power.max(Fixed::from_num(BASELINE_POWER)),
            shield: shield.max(Fixed::ZERO),
        }
    }
}

/// One vehicle: blocks, connections and resource state.
#[derive(Debug, Clone)]
pub struct Ship {
    name: String,
    config: ShipyardConfig,
    blocks: BlockStore,
    graph: ConnectionGraph,
    resources: ShipResources,
    /// `None` after any mutation.
    stats_cache: Option<ShipStats>,
    constructed: bool,
}

impl Ship {
    /// Create an empty ship. Fuel and power start full at the baseline.
    #[must_use]
    pub fn new(name: impl Into<String>, config: ShipyardConfig) -> Self {
        Self {
            name: name.into(),
            config,
            blocks: BlockStore::new(),
            graph: ConnectionGraph::new(),
            resources: ShipResources::full(
                Fixed::from_num(BASELINE_FUEL),
                Fixed::from_num(BASELINE_POWER),
                Fixed::ZERO,
            ),
            stats_cache: None,
            constructed: false,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settings this ship was built with.
    #[must_use]
    pub const fn config(&self) -> &ShipyardConfig {
        &self.config
    }

    /// Block table.
    #[must_use]
    pub const fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    /// Connection graph.
    #[must_use]
    pub const fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    /// Get a block by id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&BlockInstance> {
        self.blocks.get(id)
    }

    /// Number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Current resource levels.
    #[must_use]
    pub const fn resources(&self) -> &ShipResources {
        &self.resources
    }

    pub(crate) fn resources_mut(&mut self) -> &mut ShipResources {
        &mut self.resources
    }

    /// Whether the ship is a single connected structure with at least one
    /// block, and so eligible for simulation.
    #[must_use]
    pub const fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Add a block at a world position.
    pub fn add_block(
        &mut self,
        definition: Arc<BlockDefinition>,
        position: Vec2Fixed,
        rotation: Rotation,
    ) -> BlockId {
        let block_type = definition.id.clone();
        let id = self.blocks.insert(definition, position, rotation);
        self.graph.add_node(id);
        tracing::debug!(ship = %self.name, %id, %block_type, "Block added");
        self.structure_changed();
        id
    }

    /// Remove a block, dropping every connection that touches it and freeing
    /// the ports on the other ends.
    ///
    /// # Errors
    ///
    /// [`StructuralError::UnknownBlock`] if the id is not on this ship.
    pub fn remove_block(&mut self, id: BlockId) -> Result<BlockInstance> {
        if !self.blocks.contains(id) {
            return Err(StructuralError::UnknownBlock(id).into());
        }
        let dropped = self.graph.remove_node(&mut self.blocks, id);
        let block = self
            .blocks
            .remove(id)
            .ok_or(StructuralError::UnknownBlock(id))?;
        tracing::debug!(ship = %self.name, %id, connections = dropped.len(), "Block removed");
        self.structure_changed();
        Ok(block)
    }

    /// Connect port `port_a` of block `a` to port `port_b` of block `b`.
    ///
    /// # Errors
    ///
    /// Any [`StructuralError`] from the graph: self-connection, unknown
    /// block, out-of-range port or occupied port. The ship is unchanged on
    /// error.
    pub fn connect(
        &mut self,
        a: BlockId,
        port_a: PortIndex,
        b: BlockId,
        port_b: PortIndex,
    ) -> Result<ConnectionId> {
        let id = self.graph.connect(
            &mut self.blocks,
            PortRef::new(a, port_a),
            PortRef::new(b, port_b),
        )?;
        tracing::debug!(ship = %self.name, %a, port_a, %b, port_b, "Blocks connected");
        self.structure_changed();
        Ok(id)
    }

    /// Remove every connection between `a` and `b`. Returns how many were
    /// removed; zero (and no change) if they were not connected.
    pub fn disconnect(&mut self, a: BlockId, b: BlockId) -> usize {
        let removed = self.graph.disconnect(&mut self.blocks, a, b).len();
        if removed > 0 {
            tracing::debug!(ship = %self.name, %a, %b, removed, "Blocks disconnected");
            self.structure_changed();
        }
        removed
    }

    /// Run the auto-connector with the configured threshold.
    pub fn auto_connect(&mut self) -> Vec<ConnectionId> {
        let made = AutoConnector::new(self.config.auto_connect_threshold)
            .connect_all(&mut self.blocks, &mut self.graph);
        if !made.is_empty() {
            self.structure_changed();
        }
        made
    }

    /// Replace a block's property overlay.
    ///
    /// # Errors
    ///
    /// [`StructuralError::UnknownBlock`] if the id is not on this ship.
    pub fn set_block_properties(&mut self, id: BlockId, properties: BlockProperties) -> Result<()> {
        let block = self
            .blocks
            .get_mut(id)
            .ok_or(StructuralError::UnknownBlock(id))?;
        block.set_properties(properties);
        self.structure_changed();
        Ok(())
    }

    /// Set the local shield charge of one block.
    ///
    /// # Errors
    ///
    /// [`StructuralError::UnknownBlock`] if the id is not on this ship.
    pub fn set_block_shield(&mut self, id: BlockId, shield: Fixed) -> Result<()> {
        self.blocks
            .get_mut(id)
            .ok_or(StructuralError::UnknownBlock(id))?
            .set_shield(shield);
        Ok(())
    }

    /// Attach a renderer visual to a block.
    ///
    /// # Errors
    ///
    /// [`StructuralError::UnknownBlock`] if the id is not on this ship.
    pub fn set_block_visual(
        &mut self,
        id: BlockId,
        visual: Option<crate::render::VisualHandle>,
    ) -> Result<()> {
        self.blocks
            .get_mut(id)
            .ok_or(StructuralError::UnknownBlock(id))?
            .set_visual(visual);
        Ok(())
    }

    /// Check connectivity and port geometry.
    #[must_use]
    pub fn validate_structural_integrity(&self) -> StructuralReport {
        StructuralValidator::new(self.config.port_alignment_tolerance).validate(self)
    }

    /// Mismatches between connections and port occupancy flags. Always
    /// empty unless an invariant was broken.
    #[must_use]
    pub fn consistency_errors(&self) -> Vec<String> {
        let mut errors = self.graph.consistency_errors(&self.blocks);
        for block in self.blocks.iter() {
            let edges = self.graph.degree(block.id());
            if block.occupied_count() != edges {
                errors.push(format!(
                    "block {} has {} occupied ports but {} connections",
                    block.id(),
                    block.occupied_count(),
                    edges
                ));
            }
        }
        errors
    }

    fn structure_changed(&mut self) {
        self.stats_cache = None;

        let capacities = Capacities::of(&self.blocks);
        self.resources
            .set_capacities(capacities.fuel, capacities.power, capacities.shield);

        let constructed =
            !self.blocks.is_empty() && self.validate_structural_integrity().is_valid;
        if constructed != self.constructed {
            tracing::info!(ship = %self.name, constructed, "Construction state changed");
            self.constructed = constructed;
        }

        #[cfg(feature = "debug-validation")]
        {
            let errors = self.consistency_errors();
            debug_assert!(errors.is_empty(), "ship {} is inconsistent: {errors:?}", self.name);
        }
    }

    /// Cached stats, recomputed if anything changed since the last call.
    pub fn stats(&mut self) -> ShipStats {
        if let Some(stats) = self.stats_cache {
            return stats;
        }
        let stats = self.compute_stats();
        tracing::debug!(
            ship = %self.name,
            mass = %stats.total_mass,
            thrust = %stats.total_thrust,
            inertia = %stats.moment_of_inertia,
            "Stats recomputed"
        );
        self.stats_cache = Some(stats);
        stats
    }

    /// Whether [`stats`](Self::stats) would have to recompute.
    #[must_use]
    pub const fn stats_dirty(&self) -> bool {
        self.stats_cache.is_none()
    }

    /// Derive stats from the current blocks without touching the cache.
    #[must_use]
    pub fn compute_stats(&self) -> ShipStats {
        let mut total_mass = Fixed::ZERO;
        let mut total_thrust = Fixed::ZERO;
        let mut total_armor = Fixed::ZERO;
        let mut fuel_consumption = Fixed::ZERO;
        for block in self.blocks.iter() {
            total_mass += block.mass();
            total_armor += block.armor();
            if block.kind() == BlockKind::Engine {
                total_thrust += block.properties().thrust;
                fuel_consumption += block.properties().fuel_consumption;
            }
        }

        let center_of_mass = self.center_of_mass();
        let moment_of_inertia = self
            .blocks
            .iter()
            .map(|b| b.mass() * b.position().distance_squared(center_of_mass))
            .fold(Fixed::ZERO, |acc, v| acc + v);

        let acceleration = if total_mass > Fixed::ZERO {
            total_thrust / total_mass
        } else {
            Fixed::ZERO
        };
        let max_speed = fixed_sqrt(acceleration * Fixed::from_num(MAX_SPEED_FACTOR));
        let maneuverability = if moment_of_inertia > Fixed::ZERO {
            Fixed::from_num(MANEUVERABILITY_SCALE) / moment_of_inertia
        } else {
            Fixed::ONE
        };

        let capacities = Capacities::of(&self.blocks);
        ShipStats {
            block_count: self.blocks.len(),
            total_mass,
            total_thrust,
            total_armor,
            center_of_mass,
            moment_of_inertia,
            fuel_consumption,
            max_fuel: capacities.fuel,
            max_power: capacities.power,
            max_shield: capacities.shield,
            acceleration,
            max_speed,
            maneuverability,
        }
    }

    /// Mass-weighted average of block positions; the origin for a massless
    /// ship.
    #[must_use]
    pub fn center_of_mass(&self) -> Vec2Fixed {
        let mut total = Fixed::ZERO;
        let mut weighted = Vec2Fixed::ZERO;
        for block in self.blocks.iter() {
            total += block.mass();
            weighted += block.position().scale(block.mass());
        }
        if total == Fixed::ZERO {
            return Vec2Fixed::ZERO;
        }
        Vec2Fixed::new(weighted.x / total, weighted.y / total)
    }

    /// Total armor over all blocks.
    #[must_use]
    pub fn total_armor(&self) -> Fixed {
        self.blocks
            .iter()
            .map(BlockInstance::armor)
            .fold(Fixed::ZERO, |acc, v| acc + v)
    }

    /// Apply a hit to the ship as a whole: the ship shield pool absorbs
    /// first, then total armor reduces the rest. Returns the damage that
    /// passes through.
    pub fn take_damage(&mut self, amount: Fixed) -> Fixed {
        let outcome = mitigate_damage(amount, self.resources.shield, self.total_armor());
        self.resources.shield -= outcome.absorbed_by_shield;
        tracing::debug!(
            ship = %self.name,
            absorbed = %outcome.absorbed_by_shield,
            reduced = %outcome.reduced_by_armor,
            passed = %outcome.passed_through,
            "Ship hit"
        );
        outcome.passed_through
    }

    /// Deduct fuel if enough is available.
    #[must_use = "the fuel was only spent if this returns true"]
    pub fn consume_fuel(&mut self, amount: Fixed) -> bool {
        self.resources.consume_fuel(amount)
    }

    /// Deduct power if enough is available.
    #[must_use = "the power was only spent if this returns true"]
    pub fn consume_power(&mut self, amount: Fixed) -> bool {
        self.resources.consume_power(amount)
    }

    /// Add fuel, clamped to capacity.
    pub fn refuel(&mut self, amount: Fixed) {
        self.resources.refuel(amount);
    }

    /// Add power, clamped to capacity.
    pub fn recharge(&mut self, amount: Fixed) {
        self.resources.recharge(amount);
    }

    /// Fill fuel, power and shield to capacity.
    pub fn resupply(&mut self) {
        self.resources.replenish();
    }

    /// First block (by id) whose footprint contains a world point, in ship
    /// coordinates.
    #[must_use]
    pub fn block_at(&self, point: Vec2Fixed) -> Option<BlockId> {
        self.blocks
            .iter()
            .find(|b| b.contains_point(point))
            .map(BlockInstance::id)
    }

    /// Hash of everything the simulation depends on.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.blocks.len().hash(&mut hasher);
        for block in self.blocks.iter() {
            block.id().hash(&mut hasher);
            block.block_type().hash(&mut hasher);
            block.position().hash(&mut hasher);
            block.rotation().quarter_turns().hash(&mut hasher);
            block.properties().hash(&mut hasher);
            block.shield().hash(&mut hasher);
            block.available_connection_points().hash(&mut hasher);
        }

        self.graph.edge_count().hash(&mut hasher);
        for (id, connection) in self.graph.connections() {
            id.hash(&mut hasher);
            connection.hash(&mut hasher);
        }

        self.resources.hash(&mut hasher);
        self.constructed.hash(&mut hasher);
        hasher.finish()
    }

    /// Describe this ship as a blueprint: cells from the configured grid,
    /// overrides for every property that differs from the definition.
    #[must_use]
    pub fn to_blueprint(&self) -> ShipBlueprint {
        let grid = BuildGrid::new(self.config.grid);
        let index: BTreeMap<BlockId, usize> =
            self.blocks.ids().enumerate().map(|(i, id)| (id, i)).collect();

        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                let defaults = BlockProperties::from_definition(block.definition());
                BlueprintBlock {
                    block_type: block.block_type().to_string(),
                    cell: grid.world_to_cell(block.position()),
                    rotation: block.rotation(),
                    overrides: block.properties().diff(&defaults),
                }
            })
            .collect();

        let connections = self
            .graph
            .connections()
            .filter_map(|(_, c)| {
                Some(BlueprintConnection {
                    a: *index.get(&c.a.block)?,
                    port_a: c.a.port,
                    b: *index.get(&c.b.block)?,
                    port_b: c.b.port,
                })
            })
            .collect();

        ShipBlueprint {
            name: self.name.clone(),
            blocks,
            connections,
            auto_connect: false,
        }
    }

    /// Look up a block or fail with [`ShipError::Structural`].
    ///
    /// # Errors
    ///
    /// [`StructuralError::UnknownBlock`] if the id is not on this ship.
    pub fn require_block(&self, id: BlockId) -> Result<&BlockInstance> {
        self.blocks
            .get(id)
            .ok_or(ShipError::Structural(StructuralError::UnknownBlock(id)))
    }
}
