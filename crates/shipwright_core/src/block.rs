//! Block instances placed on a ship.
//!
//! A [`BlockInstance`] pairs a shared [`BlockDefinition`] with the state that
//! differs per placement: grid position, rotation, a property overlay, port
//! occupancy and a local shield charge.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combat::{mitigate_damage, DamageOutcome};
use crate::data::{BlockDefinition, BlockKind, Direction, PropertyOverrides, UtilityRole};
use crate::error::StructuralError;
use crate::math::{Fixed, Rotation, Vec2Fixed};
use crate::render::VisualHandle;

/// Identifier of a block within its ship.
///
/// Ids are handed out in increasing order and never reused, so sorting by id
/// is sorting by insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index into a definition's connection point list.
pub type PortIndex = usize;

/// A specific port on a specific block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortRef {
    /// Owning block.
    pub block: BlockId,
    /// Port index on that block.
    pub port: PortIndex,
}

impl PortRef {
    /// Create a port reference.
    #[must_use]
    pub const fn new(block: BlockId, port: PortIndex) -> Self {
        Self { block, port }
    }
}

/// Mutable per-instance properties, seeded from the definition.
///
/// Mass and armor are not part of the overlay; they always come from the
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockProperties {
    /// Which ship capacity `capacity` feeds.
    pub utility: UtilityRole,
    /// Resource capacity.
    pub capacity: Fixed,
    /// Fuel burned per second at full throttle.
    pub fuel_consumption: Fixed,
    /// Thrust (counted only for engine blocks).
    pub thrust: Fixed,
}

impl BlockProperties {
    /// Defaults taken from a definition.
    #[must_use]
    pub fn from_definition(definition: &BlockDefinition) -> Self {
        Self {
            utility: definition.utility(),
            capacity: definition.capacity,
            fuel_consumption: definition.fuel_consumption,
            thrust: definition.thrust,
        }
    }

    /// Apply blueprint overrides on top of these properties.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &PropertyOverrides) -> Self {
        if let Some(utility) = overrides.utility {
            self.utility = utility;
        }
        if let Some(capacity) = overrides.capacity {
            self.capacity = capacity;
        }
        if let Some(fuel) = overrides.fuel_consumption {
            self.fuel_consumption = fuel;
        }
        if let Some(thrust) = overrides.thrust {
            self.thrust = thrust;
        }
        self
    }

    /// Overrides that turn `defaults` into these properties.
    #[must_use]
    pub fn diff(&self, defaults: &Self) -> PropertyOverrides {
        PropertyOverrides {
            utility: (self.utility != defaults.utility).then_some(self.utility),
            capacity: (self.capacity != defaults.capacity).then_some(self.capacity),
            fuel_consumption: (self.fuel_consumption != defaults.fuel_consumption)
                .then_some(self.fuel_consumption),
            thrust: (self.thrust != defaults.thrust).then_some(self.thrust),
        }
    }
}

/// One placed block.
#[derive(Debug, Clone)]
pub struct BlockInstance {
    id: BlockId,
    definition: Arc<BlockDefinition>,
    position: Vec2Fixed,
    rotation: Rotation,
    properties: BlockProperties,
    /// One flag per connection point; length always equals the port count.
    occupied: Vec<bool>,
    shield: Fixed,
    visual: Option<VisualHandle>,
}

impl BlockInstance {
    /// Create an instance with default properties and all ports free.
    ///
    /// Shield-role blocks start fully charged.
    #[must_use]
    pub fn new(
        id: BlockId,
        definition: Arc<BlockDefinition>,
        position: Vec2Fixed,
        rotation: Rotation,
    ) -> Self {
        let properties = BlockProperties::from_definition(&definition);
        let occupied = vec![false; definition.port_count()];
        let mut block = Self {
            id,
            definition,
            position,
            rotation,
            properties,
            occupied,
            shield: Fixed::ZERO,
            visual: None,
        };
        block.shield = block.max_shield();
        block
    }

    /// Block id.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Shared definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<BlockDefinition> {
        &self.definition
    }

    /// Type id of the definition.
    #[must_use]
    pub fn block_type(&self) -> &str {
        &self.definition.id
    }

    /// Functional category.
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.definition.kind
    }

    /// Grid position of the block center.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Quarter-turn rotation.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Current property overlay.
    #[must_use]
    pub const fn properties(&self) -> &BlockProperties {
        &self.properties
    }

    /// Replace the property overlay. Shield charge is clamped to the new cap.
    pub(crate) fn set_properties(&mut self, properties: BlockProperties) {
        self.properties = properties;
        self.shield = self.shield.min(self.max_shield());
    }

    /// Mass (from the definition; the overlay never changes it).
    #[must_use]
    pub fn mass(&self) -> Fixed {
        self.definition.mass
    }

    /// Armor (from the definition).
    #[must_use]
    pub fn armor(&self) -> Fixed {
        self.definition.armor
    }

    /// Thrust this block contributes: its overlay thrust for engines, zero
    /// otherwise.
    #[must_use]
    pub fn effective_thrust(&self) -> Fixed {
        if self.kind() == BlockKind::Engine {
            self.properties.thrust
        } else {
            Fixed::ZERO
        }
    }

    /// Local shield capacity.
    #[must_use]
    pub fn max_shield(&self) -> Fixed {
        match self.properties.utility {
            UtilityRole::Shield => self.properties.capacity,
            UtilityRole::Reactor | UtilityRole::Generic => Fixed::ZERO,
        }
    }

    /// Current local shield charge.
    #[must_use]
    pub const fn shield(&self) -> Fixed {
        self.shield
    }

    /// Set the local shield charge, clamped to `[0, max_shield]`.
    pub fn set_shield(&mut self, shield: Fixed) {
        self.shield = shield.max(Fixed::ZERO).min(self.max_shield());
    }

    /// Visual handle assigned by the rendering collaborator.
    #[must_use]
    pub const fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }

    /// Attach a visual handle.
    pub fn set_visual(&mut self, visual: Option<VisualHandle>) {
        self.visual = visual;
    }

    /// Number of connection points.
    #[must_use]
    pub fn port_count(&self) -> usize {
        self.occupied.len()
    }

    /// Ports not yet occupied, in index order.
    #[must_use]
    pub fn available_connection_points(&self) -> Vec<PortIndex> {
        self.occupied
            .iter()
            .enumerate()
            .filter(|(_, occupied)| !**occupied)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of occupied ports.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|o| **o).count()
    }

    /// Whether a port is occupied; `None` for an invalid index.
    #[must_use]
    pub fn is_occupied(&self, port: PortIndex) -> Option<bool> {
        self.occupied.get(port).copied()
    }

    /// World position of a port: block position plus rotated local offset.
    ///
    /// Returns `None` for an invalid index.
    #[must_use]
    pub fn connection_point(&self, port: PortIndex) -> Option<Vec2Fixed> {
        self.definition
            .connection_points
            .get(port)
            .map(|spec| self.position + self.rotation.apply(spec.offset))
    }

    /// World-space facing of a port; `None` for an invalid index.
    #[must_use]
    pub fn port_facing(&self, port: PortIndex) -> Option<Direction> {
        self.definition
            .connection_points
            .get(port)
            .map(|spec| spec.facing.rotated(self.rotation))
    }

    fn check_port(&self, port: PortIndex) -> Result<(), StructuralError> {
        if port < self.occupied.len() {
            Ok(())
        } else {
            Err(StructuralError::PortOutOfRange {
                block: self.id,
                port,
                port_count: self.occupied.len(),
            })
        }
    }

    /// Mark a port occupied.
    ///
    /// # Errors
    ///
    /// Fails if the index is invalid or the port is already occupied.
    pub fn occupy(&mut self, port: PortIndex) -> Result<(), StructuralError> {
        self.check_port(port)?;
        if self.occupied[port] {
            return Err(StructuralError::PortOccupied {
                block: self.id,
                port,
            });
        }
        self.occupied[port] = true;
        Ok(())
    }

    /// Mark a port free.
    ///
    /// # Errors
    ///
    /// Fails if the index is invalid or the port is already free.
    pub fn release(&mut self, port: PortIndex) -> Result<(), StructuralError> {
        self.check_port(port)?;
        if !self.occupied[port] {
            return Err(StructuralError::PortAlreadyFree {
                block: self.id,
                port,
            });
        }
        self.occupied[port] = false;
        Ok(())
    }

    /// Apply a hit: local shield first, then armor.
    ///
    /// Returns the damage that passes through.
    pub fn take_damage(&mut self, amount: Fixed) -> Fixed {
        let DamageOutcome {
            absorbed_by_shield,
            passed_through,
            ..
        } = mitigate_damage(amount, self.shield, self.armor());
        self.shield -= absorbed_by_shield;
        passed_through
    }

    /// Whether a world point lies inside the block's square footprint.
    #[must_use]
    pub fn contains_point(&self, point: Vec2Fixed) -> bool {
        let h = self.definition.half_extent;
        let d = point - self.position;
        d.x.abs() <= h && d.y.abs() <= h
    }
}
