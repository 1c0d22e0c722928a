//! Boundary with the external physics stepper.
//!
//! The stepper owns rigid bodies: integration, collision and the
//! authoritative pose. This crate only computes masses and forces and reads
//! the pose back through [`PhysicsWorld`].

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower-left corner.
    pub min: Vec2Fixed,
    /// Upper-right corner.
    pub max: Vec2Fixed,
}

impl Bounds {
    /// Box spanning two corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec2Fixed, b: Vec2Fixed) -> Self {
        Self {
            min: Vec2Fixed::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2Fixed::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Whether a point lies inside or on the edge.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Vec2Fixed::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2Fixed::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// The same box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2Fixed) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// One square collider, relative to the body origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapePart {
    /// Center offset from the body origin.
    pub offset: Vec2Fixed,
    /// Half the side length.
    #[serde(with = "fixed_serde")]
    pub half_extent: Fixed,
}

/// Compound collider made of squares, one per block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BodyShape {
    /// Squares making up the shape.
    pub parts: Vec<ShapePart>,
}

impl BodyShape {
    /// Local bounds of the shape; `None` when it has no parts.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.parts
            .iter()
            .map(|part| {
                let half = Vec2Fixed::new(part.half_extent, part.half_extent);
                Bounds::from_corners(part.offset - half, part.offset + half)
            })
            .reduce(|a, b| a.union(&b))
    }
}

/// Mass properties handed to the stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyMaterial {
    /// Total mass.
    #[serde(with = "fixed_serde")]
    pub mass: Fixed,
    /// Moment of inertia about the body origin.
    #[serde(with = "fixed_serde")]
    pub moment_of_inertia: Fixed,
}

/// Rigid-body operations the simulation adapter relies on.
///
/// Bodies are referred to by an opaque handle. Reads on an unknown handle
/// return `None`; writes to one are ignored.
pub trait PhysicsWorld {
    /// Body handle.
    type Body: Copy + Eq + Debug;

    /// Create a body at the world origin.
    fn create_body(&mut self, shape: &BodyShape, material: &BodyMaterial) -> Self::Body;

    /// Destroy a body.
    fn remove_body(&mut self, body: Self::Body);

    /// Apply a force at a world point for the current step.
    fn apply_force(&mut self, body: Self::Body, point: Vec2Fixed, force: Vec2Fixed);

    /// Overwrite the linear velocity.
    fn set_velocity(&mut self, body: Self::Body, velocity: Vec2Fixed);

    /// World position of the body origin.
    fn position(&self, body: Self::Body) -> Option<Vec2Fixed>;

    /// Linear velocity.
    fn velocity(&self, body: Self::Body) -> Option<Vec2Fixed>;

    /// World-space bounding box, used for point hit tests.
    fn bounds(&self, body: Self::Body) -> Option<Bounds>;
}
