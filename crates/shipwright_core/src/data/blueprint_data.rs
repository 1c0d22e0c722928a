//! Ship blueprint data structures.

use serde::{Deserialize, Serialize};

use crate::block::PortIndex;
use crate::data::UtilityRole;
use crate::math::{option_fixed_serde, Fixed, Rotation};

/// Per-instance overrides of a definition's default properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyOverrides {
    /// Replacement utility role.
    #[serde(default)]
    pub utility: Option<UtilityRole>,
    /// Replacement capacity.
    #[serde(default, with = "option_fixed_serde")]
    pub capacity: Option<Fixed>,
    /// Replacement fuel consumption.
    #[serde(default, with = "option_fixed_serde")]
    pub fuel_consumption: Option<Fixed>,
    /// Replacement thrust.
    #[serde(default, with = "option_fixed_serde")]
    pub thrust: Option<Fixed>,
}

impl PropertyOverrides {
    /// Whether no property is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One block placed on the build grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintBlock {
    /// Type id in the block registry.
    pub block_type: String,
    /// Grid cell `(column, row)`.
    pub cell: (i32, i32),
    /// Quarter-turn rotation.
    #[serde(default)]
    pub rotation: Rotation,
    /// Property overrides.
    #[serde(default)]
    pub overrides: PropertyOverrides,
}

impl BlueprintBlock {
    /// Create an unrotated blueprint block with no overrides.
    #[must_use]
    pub fn new(block_type: impl Into<String>, cell: (i32, i32)) -> Self {
        Self {
            block_type: block_type.into(),
            cell,
            rotation: Rotation::Deg0,
            overrides: PropertyOverrides::default(),
        }
    }
}

/// An explicit connection between two blueprint blocks.
///
/// `a` and `b` index into [`ShipBlueprint::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintConnection {
    /// Index of the first block.
    pub a: usize,
    /// Port on the first block.
    pub port_a: PortIndex,
    /// Index of the second block.
    pub b: usize,
    /// Port on the second block.
    pub port_b: PortIndex,
}

/// Data-driven ship layout.
///
/// # Example RON
///
/// ```ron
/// ShipBlueprint(
///     name: "Scout",
///     blocks: [
///         (block_type: "cockpit", cell: (0, 0)),
///         (block_type: "ion_engine", cell: (-1, 0), rotation: Deg90),
///     ],
///     auto_connect: true,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShipBlueprint {
    /// Display name.
    pub name: String,
    /// Placed blocks; connection indices refer to this order.
    pub blocks: Vec<BlueprintBlock>,
    /// Explicit connections.
    #[serde(default)]
    pub connections: Vec<BlueprintConnection>,
    /// Run the auto-connector after explicit connections are made.
    #[serde(default)]
    pub auto_connect: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blueprint_ron() {
        let src = r#"
            ShipBlueprint(
                name: "Scout",
                blocks: [
                    (block_type: "cockpit", cell: (0, 0)),
                    (block_type: "ion_engine", cell: (-1, 0), rotation: Deg90,
                        overrides: (thrust: Some(250))),
                ],
                connections: [(a: 0, port_a: 2, b: 1, port_b: 3)],
            )
        "#;
        let blueprint: ShipBlueprint = ron::from_str(src).unwrap();
        assert_eq!(blueprint.blocks.len(), 2);
        assert_eq!(blueprint.blocks[1].rotation, Rotation::Deg90);
        assert_eq!(
            blueprint.blocks[1].overrides.thrust,
            Some(Fixed::from_num(250))
        );
        assert!(blueprint.blocks[0].overrides.is_empty());
        assert_eq!(blueprint.connections[0].port_b, 3);
        assert!(!blueprint.auto_connect);
    }
}
