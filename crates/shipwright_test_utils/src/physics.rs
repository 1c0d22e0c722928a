//! A minimal deterministic physics world for tests.
//!
//! Bodies are point masses with a bounding box. Forces accumulate until
//! [`RecordingPhysicsWorld::step`] integrates them with explicit Euler, and
//! every applied force is also kept in a log for assertions.

use std::collections::BTreeMap;

use shipwright_core::math::{Fixed, Vec2Fixed};
use shipwright_core::physics::{BodyMaterial, BodyShape, Bounds, PhysicsWorld};

/// Handle to a body in [`RecordingPhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// State of one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyState {
    /// World position of the body origin.
    pub position: Vec2Fixed,
    /// Linear velocity.
    pub velocity: Vec2Fixed,
    /// Mass and inertia the body was created with.
    pub material: BodyMaterial,
    /// Local bounds of the shape.
    pub local_bounds: Option<Bounds>,
    /// Forces accumulated since the last step.
    pub pending_force: Vec2Fixed,
}

/// One `apply_force` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedForce {
    /// Target body.
    pub body: BodyId,
    /// World point the force acts at.
    pub point: Vec2Fixed,
    /// Force vector.
    pub force: Vec2Fixed,
}

/// Physics world that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingPhysicsWorld {
    bodies: BTreeMap<BodyId, BodyState>,
    next_id: u32,
    /// Every force applied, in call order.
    pub forces: Vec<AppliedForce>,
    /// Bodies removed, in call order.
    pub removed: Vec<BodyId>,
}

impl RecordingPhysicsWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Body state, if the body exists.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&BodyState> {
        self.bodies.get(&id)
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Move a body.
    pub fn set_position(&mut self, id: BodyId, position: Vec2Fixed) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
    }

    /// Integrate pending forces over `delta` seconds and clear them.
    ///
    /// Massless bodies keep their velocity.
    pub fn step(&mut self, delta: Fixed) {
        for body in self.bodies.values_mut() {
            if body.material.mass > Fixed::ZERO {
                let accel = Vec2Fixed::new(
                    body.pending_force.x / body.material.mass,
                    body.pending_force.y / body.material.mass,
                );
                body.velocity += accel.scale(delta);
            }
            body.position += body.velocity.scale(delta);
            body.pending_force = Vec2Fixed::ZERO;
        }
    }

    /// Sum of all logged forces applied to a body.
    #[must_use]
    pub fn total_force(&self, id: BodyId) -> Vec2Fixed {
        self.forces
            .iter()
            .filter(|f| f.body == id)
            .fold(Vec2Fixed::ZERO, |acc, f| acc + f.force)
    }
}

impl PhysicsWorld for RecordingPhysicsWorld {
    type Body = BodyId;

    fn create_body(&mut self, shape: &BodyShape, material: &BodyMaterial) -> BodyId {
        self.next_id += 1;
        let id = BodyId(self.next_id);
        self.bodies.insert(
            id,
            BodyState {
                position: Vec2Fixed::ZERO,
                velocity: Vec2Fixed::ZERO,
                material: *material,
                local_bounds: shape.bounds(),
                pending_force: Vec2Fixed::ZERO,
            },
        );
        id
    }

    fn remove_body(&mut self, body: BodyId) {
        if self.bodies.remove(&body).is_some() {
            self.removed.push(body);
        }
    }

    fn apply_force(&mut self, body: BodyId, point: Vec2Fixed, force: Vec2Fixed) {
        if let Some(state) = self.bodies.get_mut(&body) {
            state.pending_force += force;
            self.forces.push(AppliedForce { body, point, force });
        }
    }

    fn set_velocity(&mut self, body: BodyId, velocity: Vec2Fixed) {
        if let Some(state) = self.bodies.get_mut(&body) {
            state.velocity = velocity;
        }
    }

    fn position(&self, body: BodyId) -> Option<Vec2Fixed> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn velocity(&self, body: BodyId) -> Option<Vec2Fixed> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn bounds(&self, body: BodyId) -> Option<Bounds> {
        let state = self.bodies.get(&body)?;
        state.local_bounds.map(|b| b.translated(state.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::fixed;

    fn unit_mass_body(world: &mut RecordingPhysicsWorld) -> BodyId {
        world.create_body(
            &BodyShape::default(),
            &BodyMaterial {
                mass: fixed(2),
                moment_of_inertia: Fixed::ZERO,
            },
        )
    }

    #[test]
    fn test_step_integrates_forces() {
        let mut world = RecordingPhysicsWorld::new();
        let body = unit_mass_body(&mut world);
        world.apply_force(body, Vec2Fixed::ZERO, Vec2Fixed::from_ints(4, 0));
        world.step(fixed(1));

        assert_eq!(world.velocity(body), Some(Vec2Fixed::from_ints(2, 0)));
        assert_eq!(world.position(body), Some(Vec2Fixed::from_ints(2, 0)));
        assert_eq!(world.body(body).unwrap().pending_force, Vec2Fixed::ZERO);
        assert_eq!(world.total_force(body), Vec2Fixed::from_ints(4, 0));
    }

    #[test]
    fn test_unknown_body_is_ignored() {
        let mut world = RecordingPhysicsWorld::new();
        world.apply_force(BodyId(9), Vec2Fixed::ZERO, Vec2Fixed::from_ints(1, 1));
        assert!(world.forces.is_empty());
        assert_eq!(world.position(BodyId(9)), None);
    }
}
