//! Boundary with the rendering collaborator.
//!
//! The renderer only ever receives positions; it never reads or mutates
//! ship state.

use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::math::{Rotation, Vec2Fixed};

/// Opaque handle to a renderer-owned visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// Receives per-block placement updates.
pub trait BlockVisualSink {
    /// Move the visual of `block` to a world position.
    fn place_block(
        &mut self,
        block: BlockId,
        visual: VisualHandle,
        position: Vec2Fixed,
        rotation: Rotation,
    );
}
