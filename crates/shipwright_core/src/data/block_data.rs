//! Block definition data structures.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Rotation, Vec2Fixed};

/// Functional category of a block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BlockKind {
    /// Plain hull plating.
    #[default]
    Structure,
    /// Command module.
    Cockpit,
    /// Thruster; the only kind that contributes to total thrust.
    Engine,
    /// Power plant; provides fuel and power capacity.
    Reactor,
    /// Shield generator; provides shield capacity.
    Shield,
    /// Weapon mount.
    Weapon,
    /// Cargo hold.
    Cargo,
}

impl BlockKind {
    /// Utility role a block of this kind plays unless overridden.
    #[must_use]
    pub const fn default_utility(self) -> UtilityRole {
        match self {
            Self::Reactor => UtilityRole::Reactor,
            Self::Shield => UtilityRole::Shield,
            Self::Structure | Self::Cockpit | Self::Engine | Self::Weapon | Self::Cargo => {
                UtilityRole::Generic
            }
        }
    }
}

/// Which ship-level capacity a block's `capacity` feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UtilityRole {
    /// Contributes no capacity.
    #[default]
    Generic,
    /// Capacity becomes fuel, and twice that becomes power.
    Reactor,
    /// Capacity becomes shield.
    Shield,
}

/// Facing of a connection point in block-local space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +Y.
    North,
    /// +X.
    East,
    /// -Y.
    South,
    /// -X.
    West,
}

impl Direction {
    /// Unit vector pointing along this direction.
    #[must_use]
    pub fn unit_vector(self) -> Vec2Fixed {
        match self {
            Self::North => Vec2Fixed::from_ints(0, 1),
            Self::East => Vec2Fixed::from_ints(1, 0),
            Self::South => Vec2Fixed::from_ints(0, -1),
            Self::West => Vec2Fixed::from_ints(-1, 0),
        }
    }

    /// The direction facing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Apply a quarter-turn rotation (counter-clockwise).
    #[must_use]
    pub const fn rotated(self, rotation: Rotation) -> Self {
        let mut dir = self;
        let mut turns = rotation.quarter_turns();
        while turns > 0 {
            dir = match dir {
                Self::North => Self::West,
                Self::West => Self::South,
                Self::South => Self::East,
                Self::East => Self::North,
            };
            turns -= 1;
        }
        dir
    }
}

/// One attachment slot on a block definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionPointSpec {
    /// Offset from the block center in block-local space.
    pub offset: Vec2Fixed,
    /// Outward facing; a mating port faces the opposite way.
    pub facing: Direction,
}

impl ConnectionPointSpec {
    /// Create a connection point spec.
    #[must_use]
    pub const fn new(offset: Vec2Fixed, facing: Direction) -> Self {
        Self { offset, facing }
    }
}

/// Data-driven block type definition.
///
/// Loaded once into the [`BlockRegistry`](crate::registry::BlockRegistry)
/// and shared by every instance of the type.
///
/// # Example RON
///
/// ```ron
/// BlockDefinition(
///     id: "ion_engine",
///     name: "Ion Engine",
///     kind: Engine,
///     mass: 12,
///     thrust: 400,
///     armor: 2,
///     fuel_consumption: 0.5,
///     connection_points: [
///         (offset: (x: 0, y: 16), facing: North),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// Unique string identifier for this block type.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Functional category.
    pub kind: BlockKind,

    /// Base mass.
    #[serde(with = "fixed_serde")]
    pub mass: Fixed,

    /// Base thrust (only counted for engines).
    #[serde(default, with = "fixed_serde")]
    pub thrust: Fixed,

    /// Base armor.
    #[serde(default, with = "fixed_serde")]
    pub armor: Fixed,

    /// Resource capacity, interpreted according to the utility role.
    #[serde(default, with = "fixed_serde")]
    pub capacity: Fixed,

    /// Fuel burned per second at full throttle.
    #[serde(default, with = "fixed_serde")]
    pub fuel_consumption: Fixed,

    /// Utility role; derived from `kind` when absent.
    #[serde(default)]
    pub utility: Option<UtilityRole>,

    /// Half the side length of the block's square footprint.
    #[serde(default = "default_half_extent", with = "fixed_serde")]
    pub half_extent: Fixed,

    /// Ordered connection points; port indices refer to this list.
    #[serde(default)]
    pub connection_points: Vec<ConnectionPointSpec>,
}

fn default_half_extent() -> Fixed {
    Fixed::from_num(16)
}

impl BlockDefinition {
    /// Create a definition with no ports and zero stats besides mass.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: BlockKind, mass: Fixed) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            mass,
            thrust: Fixed::ZERO,
            armor: Fixed::ZERO,
            capacity: Fixed::ZERO,
            fuel_consumption: Fixed::ZERO,
            utility: None,
            half_extent: default_half_extent(),
            connection_points: Vec::new(),
        }
    }

    /// Set thrust and per-second fuel consumption.
    #[must_use]
    pub fn with_thrust(mut self, thrust: Fixed, fuel_consumption: Fixed) -> Self {
        self.thrust = thrust;
        self.fuel_consumption = fuel_consumption;
        self
    }

    /// Set armor.
    #[must_use]
    pub fn with_armor(mut self, armor: Fixed) -> Self {
        self.armor = armor;
        self
    }

    /// Set resource capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: Fixed) -> Self {
        self.capacity = capacity;
        self
    }

    /// Override the utility role derived from `kind`.
    #[must_use]
    pub fn with_utility(mut self, utility: UtilityRole) -> Self {
        self.utility = Some(utility);
        self
    }

    /// Append a connection point.
    #[must_use]
    pub fn with_connection_point(mut self, offset: Vec2Fixed, facing: Direction) -> Self {
        self.connection_points
            .push(ConnectionPointSpec::new(offset, facing));
        self
    }

    /// Give the block one port at the middle of each edge of its footprint,
    /// in the order East, North, West, South.
    #[must_use]
    pub fn with_edge_ports(mut self) -> Self {
        let h = self.half_extent;
        let z = Fixed::ZERO;
        self.connection_points.extend([
            ConnectionPointSpec::new(Vec2Fixed::new(h, z), Direction::East),
            ConnectionPointSpec::new(Vec2Fixed::new(z, h), Direction::North),
            ConnectionPointSpec::new(Vec2Fixed::new(-h, z), Direction::West),
            ConnectionPointSpec::new(Vec2Fixed::new(z, -h), Direction::South),
        ]);
        self
    }

    /// Effective utility role.
    #[must_use]
    pub fn utility(&self) -> UtilityRole {
        self.utility.unwrap_or_else(|| self.kind.default_utility())
    }

    /// Number of connection points.
    #[must_use]
    pub fn port_count(&self) -> usize {
        self.connection_points.len()
    }

    /// Check the definition for values the engine cannot work with.
    ///
    /// Returns every problem found; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push("id must not be empty".to_string());
        }

        for (label, value) in [
            ("mass", self.mass),
            ("thrust", self.thrust),
            ("armor", self.armor),
            ("capacity", self.capacity),
            ("fuel_consumption", self.fuel_consumption),
        ] {
            if value < Fixed::ZERO {
                errors.push(format!("{label} must not be negative (got {value})"));
            }
        }

        if self.half_extent <= Fixed::ZERO {
            errors.push("half_extent must be positive".to_string());
        }

        for (i, point) in self.connection_points.iter().enumerate() {
            if point.offset.x.abs() > self.half_extent || point.offset.y.abs() > self.half_extent
            {
                errors.push(format!("connection point {i} lies outside the block footprint"));
            }
            if self.connection_points[..i]
                .iter()
                .any(|other| other.offset == point.offset)
            {
                errors.push(format!("connection point {i} duplicates an earlier offset"));
            }
        }

        errors
    }
}
