//! # Shipwright Core
//!
//! Deterministic ship assembly and structural integrity engine.
//!
//! A ship is a set of grid-placed blocks wired together through connection
//! points. This crate keeps the block graph consistent, checks that it forms
//! one structure, derives flight stats from it and feeds those into an
//! external rigid-body stepper each tick.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (data arrives as strings)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`block`] - Block instances and ports
//! - [`graph`] - Connection multigraph and connectivity queries
//! - [`ship`] - Ship aggregate, stats and resources
//! - [`auto_connect`] - Nearest-free-port connection inference
//! - [`validation`] - Structural validator
//! - [`simulation`] - Per-tick adapter over a [`physics::PhysicsWorld`]
//! - [`editor`] - Build-mode facade with a placement grid
//! - [`registry`] / [`data`] - Block catalog and blueprints
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod auto_connect;
pub mod block;
pub mod blueprint;
pub mod combat;
pub mod config;
pub mod data;
pub mod editor;
pub mod error;
pub mod graph;
pub mod grid;
pub mod math;
pub mod physics;
pub mod registry;
pub mod render;
pub mod resources;
pub mod ship;
pub mod simulation;
pub mod validation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::block::{BlockId, BlockInstance, BlockProperties, PortIndex, PortRef};
    pub use crate::config::{GridConfig, ShipyardConfig};
    pub use crate::data::{
        BlockDefinition, BlockKind, BlueprintBlock, BlueprintConnection, Direction,
        PropertyOverrides, ShipBlueprint, UtilityRole,
    };
    pub use crate::editor::ShipEditor;
    pub use crate::error::{Result, ShipError, StructuralError};
    pub use crate::graph::{Connection, ConnectionGraph, ConnectionId};
    pub use crate::math::{Fixed, Rotation, Vec2Fixed};
    pub use crate::physics::{BodyMaterial, BodyShape, Bounds, PhysicsWorld};
    pub use crate::registry::BlockRegistry;
    pub use crate::render::{BlockVisualSink, VisualHandle};
    pub use crate::resources::ShipResources;
    pub use crate::ship::{Ship, ShipStats};
    pub use crate::simulation::{ShipSimulation, ThrustOutcome, TickReport};
    pub use crate::validation::{StructuralReport, StructuralValidator};
}
