//! Per-tick bridge between a ship and its rigid body.
//!
//! The adapter owns the [`Ship`] and a handle to the body the physics
//! stepper created for it. The embedding game loop calls
//! [`ShipSimulation::tick`] once per frame; nothing here registers itself
//! anywhere.

use crate::block::BlockId;
use crate::error::{Result, ShipError};
use crate::math::{ratio, Fixed, Vec2Fixed};
use crate::physics::{BodyMaterial, BodyShape, PhysicsWorld, ShapePart};
use crate::render::BlockVisualSink;
use crate::ship::{Ship, ShipStats};
use crate::validation::StructuralReport;

/// Ticks per second the embedding loop is expected to run at.
pub const TICK_RATE: u32 = 20;

/// Drag coefficient: 1% of speed, opposing velocity.
pub const DRAG_PERCENT: i32 = 1;

/// Speed below which no drag is applied, in tenths of a unit per second.
pub const DRAG_MIN_SPEED_TENTHS: i32 = 1;

/// Fixed tick length: `1 / TICK_RATE` seconds.
#[must_use]
pub fn tick_delta() -> Fixed {
    Fixed::ONE / Fixed::from_num(TICK_RATE)
}

/// What happened to a thrust request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "thrust may have been refused"]
pub enum ThrustOutcome {
    /// Force applied and fuel deducted.
    Applied {
        /// Force handed to the body.
        force: Vec2Fixed,
        /// Fuel consumed.
        fuel_used: Fixed,
    },
    /// Nothing to do: zero throttle, zero thrust or zero direction.
    Idle,
    /// The ship is not a single connected structure.
    NotConstructed,
    /// Not enough fuel for this tick's burn; nothing was consumed.
    FuelExhausted,
    /// The ship has no body in the physics world.
    Detached,
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number after this step.
    pub tick: u64,
    /// Drag force applied this tick, if any.
    pub drag: Option<Vec2Fixed>,
    /// Center of mass in ship coordinates.
    pub center_of_mass: Vec2Fixed,
    /// Validator output.
    pub structural: StructuralReport,
    /// Stats published for this tick.
    pub stats: ShipStats,
}

/// Drives one ship against an external physics world.
#[derive(Debug)]
pub struct ShipSimulation<W: PhysicsWorld> {
    ship: Ship,
    body: Option<W::Body>,
    tick: u64,
}

impl<W: PhysicsWorld> ShipSimulation<W> {
    /// Wrap a ship. It has no body until [`attach`](Self::attach).
    #[must_use]
    pub fn new(ship: Ship) -> Self {
        Self {
            ship,
            body: None,
            tick: 0,
        }
    }

    /// The simulated ship.
    #[must_use]
    pub const fn ship(&self) -> &Ship {
        &self.ship
    }

    /// Mutable access for changes between ticks.
    pub fn ship_mut(&mut self) -> &mut Ship {
        &mut self.ship
    }

    /// Body handle, if attached.
    #[must_use]
    pub const fn body(&self) -> Option<W::Body> {
        self.body
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Ask the world for a body matching the ship's current shape and mass.
    ///
    /// The body origin is the center of mass. Attaching twice returns the
    /// existing body.
    pub fn attach(&mut self, world: &mut W) -> W::Body {
        if let Some(body) = self.body {
            return body;
        }
        let stats = self.ship.stats();
        let shape = BodyShape {
            parts: self
                .ship
                .blocks()
                .iter()
                .map(|block| ShapePart {
                    offset: block.position() - stats.center_of_mass,
                    half_extent: block.definition().half_extent,
                })
                .collect(),
        };
        let material = BodyMaterial {
            mass: stats.total_mass,
            moment_of_inertia: stats.moment_of_inertia,
        };
        let body = world.create_body(&shape, &material);
        tracing::info!(
            ship = %self.ship.name(),
            ?body,
            parts = shape.parts.len(),
            "Ship attached"
        );
        self.body = Some(body);
        body
    }

    /// Remove the body from the world. The ship itself is kept.
    ///
    /// # Errors
    ///
    /// [`ShipError::NoBody`] if the ship was not attached.
    pub fn detach(&mut self, world: &mut W) -> Result<()> {
        let body = self.body.take().ok_or(ShipError::NoBody)?;
        world.remove_body(body);
        tracing::info!(ship = %self.ship.name(), ?body, "Ship detached");
        Ok(())
    }

    /// Detach if needed and hand the ship back.
    pub fn into_ship(mut self, world: &mut W) -> Ship {
        if let Some(body) = self.body.take() {
            world.remove_body(body);
        }
        self.ship
    }

    /// Push the ship along `direction` at `throttle` (clamped to `0..=1`)
    /// for `delta` seconds.
    ///
    /// Force is the unit direction times throttle times total thrust. Fuel
    /// burned is the engines' combined consumption times throttle times
    /// `delta`; if the tank cannot cover it no force is applied.
    pub fn apply_thrust(
        &mut self,
        world: &mut W,
        direction: Vec2Fixed,
        throttle: Fixed,
        delta: Fixed,
    ) -> ThrustOutcome {
        let Some(body) = self.body else {
            return ThrustOutcome::Detached;
        };
        if !self.ship.is_constructed() {
            return ThrustOutcome::NotConstructed;
        }

        let throttle = throttle.max(Fixed::ZERO).min(Fixed::ONE);
        let stats = self.ship.stats();
        let unit = direction.normalize();
        if throttle == Fixed::ZERO
            || stats.total_thrust == Fixed::ZERO
            || unit == Vec2Fixed::ZERO
        {
            return ThrustOutcome::Idle;
        }

        let fuel_used = stats.fuel_consumption * throttle * delta.max(Fixed::ZERO);
        if !self.ship.consume_fuel(fuel_used) {
            tracing::debug!(
                ship = %self.ship.name(),
                needed = %fuel_used,
                "Thrust refused: fuel exhausted"
            );
            return ThrustOutcome::FuelExhausted;
        }

        let force = unit.scale(stats.total_thrust * throttle);
        let point = world.position(body).unwrap_or(Vec2Fixed::ZERO);
        world.apply_force(body, point, force);
        ThrustOutcome::Applied { force, fuel_used }
    }

    /// Advance one step of `delta` seconds.
    ///
    /// Order:
    /// 1. Shield and power regeneration
    /// 2. Drag against the body's velocity (constructed ships only)
    /// 3. Center of mass
    /// 4. Structural validation; problems are logged, never acted on
    /// 5. Stats
    pub fn tick(&mut self, world: &mut W, delta: Fixed) -> TickReport {
        let config = *self.ship.config();
        self.ship.resources_mut().regenerate(
            delta,
            config.shield_regen_per_second,
            config.power_regen_per_second,
        );

        let drag = match self.body {
            Some(body) if self.ship.is_constructed() => Self::apply_drag(world, body),
            _ => None,
        };

        let center_of_mass = self.ship.center_of_mass();

        let structural = self.ship.validate_structural_integrity();
        if !structural.is_valid {
            tracing::warn!(
                ship = %self.ship.name(),
                tick = self.tick,
                issues = ?structural.issues,
                "Ship structure is not connected"
            );
        }

        let stats = self.ship.stats();
        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.ship.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Ship state hash");
        }

        TickReport {
            tick: self.tick,
            drag,
            center_of_mass,
            structural,
            stats,
        }
    }

    fn apply_drag(world: &mut W, body: W::Body) -> Option<Vec2Fixed> {
        let velocity = world.velocity(body)?;
        let speed = velocity.length();
        if speed <= ratio(DRAG_MIN_SPEED_TENTHS, 10) {
            return None;
        }
        let magnitude = speed * Fixed::from_num(DRAG_PERCENT) / Fixed::from_num(100);
        let force = -velocity.normalize().scale(magnitude);
        let point = world.position(body).unwrap_or(Vec2Fixed::ZERO);
        world.apply_force(body, point, force);
        Some(force)
    }

    /// World position of a block: body position plus the block's offset
    /// from the center of mass. Without a body, ship coordinates.
    #[must_use]
    pub fn block_world_position(&self, world: &W, block: BlockId) -> Option<Vec2Fixed> {
        let block = self.ship.block(block)?;
        let center = self.ship.center_of_mass();
        let origin = self
            .body
            .and_then(|body| world.position(body))
            .unwrap_or(center);
        Some(origin + (block.position() - center))
    }

    /// Send every block that has a visual to the renderer.
    pub fn sync_visuals<S: BlockVisualSink>(&self, sink: &mut S, world: &W) {
        for block in self.ship.blocks().iter() {
            let Some(visual) = block.visual() else {
                continue;
            };
            if let Some(position) = self.block_world_position(world, block.id()) {
                sink.place_block(block.id(), visual, position, block.rotation());
            }
        }
    }

    /// Hit test against the body's bounds. Always false when detached.
    #[must_use]
    pub fn contains_point(&self, world: &W, point: Vec2Fixed) -> bool {
        self.body
            .and_then(|body| world.bounds(body))
            .is_some_and(|bounds| bounds.contains(point))
    }
}
