//! Data structures for block catalogs and ship blueprints.
//!
//! This module contains pure data structures designed to be deserialized
//! from RON. It performs no IO; callers hand it strings.

mod block_data;
mod blueprint_data;

pub use block_data::{BlockDefinition, BlockKind, ConnectionPointSpec, Direction, UtilityRole};
pub use blueprint_data::{BlueprintBlock, BlueprintConnection, PropertyOverrides, ShipBlueprint};
