//! Error types for ship assembly.
//!
//! Only invalid requests are errors. Disconnected structures are reported
//! as data by [`crate::validation`], and running out of fuel or power is a
//! `false` return from the consume-style calls in [`crate::resources`].

use thiserror::Error;

use crate::block::{BlockId, PortIndex};

/// Result type alias using [`ShipError`].
pub type Result<T> = std::result::Result<T, ShipError>;

/// An invalid connection or occupancy request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The port already carries a connection.
    #[error("Port {port} of block {block} is already occupied")]
    PortOccupied {
        /// Block owning the port.
        block: BlockId,
        /// Port index on that block.
        port: PortIndex,
    },

    /// The port has no connection to release.
    #[error("Port {port} of block {block} is not occupied")]
    PortAlreadyFree {
        /// Block owning the port.
        block: BlockId,
        /// Port index on that block.
        port: PortIndex,
    },

    /// Both ends of the requested connection are the same block.
    #[error("Block {0} cannot connect to itself")]
    SelfConnection(BlockId),

    /// The port index exceeds the block definition's port count.
    #[error("Port {port} is out of range for block {block} ({port_count} ports)")]
    PortOutOfRange {
        /// Block the request targeted.
        block: BlockId,
        /// Requested port index.
        port: PortIndex,
        /// Number of ports the block's definition declares.
        port_count: usize,
    },

    /// No block with this id belongs to the ship.
    #[error("Block {0} does not exist")]
    UnknownBlock(BlockId),
}

/// Top-level error type for ship assembly and simulation.
#[derive(Debug, Error)]
pub enum ShipError {
    /// A connection or occupancy request was rejected.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// The block type is not present in the registry.
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    /// Two definitions share a type id.
    #[error("Duplicate block type: {0}")]
    DuplicateBlockType(String),

    /// A block definition failed validation.
    #[error("Invalid block definition '{block_type}': {errors:?}")]
    InvalidDefinition {
        /// Type id of the offending definition.
        block_type: String,
        /// Every problem found.
        errors: Vec<String>,
    },

    /// Data file parsing error.
    #[error("Failed to parse data '{path}': {message}")]
    DataParse {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A grid cell lies outside the build grid.
    #[error("Cell ({x}, {y}) is outside the build grid")]
    OutOfGrid {
        /// Cell column.
        x: i32,
        /// Cell row.
        y: i32,
    },

    /// A grid cell already holds a block.
    #[error("Cell ({x}, {y}) is already occupied by block {block}")]
    CellOccupied {
        /// Cell column.
        x: i32,
        /// Cell row.
        y: i32,
        /// Block occupying the cell.
        block: BlockId,
    },

    /// A blueprint refers to something it does not contain.
    #[error("Invalid blueprint '{name}': {message}")]
    InvalidBlueprint {
        /// Blueprint name.
        name: String,
        /// What is wrong.
        message: String,
    },

    /// No block type is selected in the editor.
    #[error("No block type selected")]
    NothingSelected,

    /// The ship has no rigid body in the physics world.
    #[error("Ship is not attached to a physics body")]
    NoBody,

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0:?}")]
    InvalidConfig(Vec<String>),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
