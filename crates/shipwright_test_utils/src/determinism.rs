//! Determinism testing utilities.
//!
//! Provides a harness for verifying that ship assembly and the per-tick
//! simulation produce identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: stats, drag and damage use
//!   [`shipwright_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: blocks and connections live in ordered
//!   maps and are always walked in id order.
//!
//! - **System randomness**: none in the core; property tests use seeded
//!   proptest runners.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use shipwright_core::math::{Fixed, Vec2Fixed};
use shipwright_core::physics::PhysicsWorld;
use shipwright_core::ship::Ship;
use shipwright_core::simulation::{tick_delta, ShipSimulation};

use crate::physics::RecordingPhysicsWorld;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// A ship attached to a [`RecordingPhysicsWorld`], flying forward under
/// constant throttle.
#[derive(Debug)]
pub struct FlightRun {
    /// The simulated ship.
    pub sim: ShipSimulation<RecordingPhysicsWorld>,
    /// The world it flies in.
    pub world: RecordingPhysicsWorld,
    /// Thrust direction.
    pub direction: Vec2Fixed,
    /// Throttle applied every tick.
    pub throttle: Fixed,
}

impl FlightRun {
    /// Attach `ship` to a fresh world.
    #[must_use]
    pub fn new(ship: Ship, direction: Vec2Fixed, throttle: Fixed) -> Self {
        let mut world = RecordingPhysicsWorld::new();
        let mut sim = ShipSimulation::new(ship);
        sim.attach(&mut world);
        Self {
            sim,
            world,
            direction,
            throttle,
        }
    }

    /// Thrust, tick and integrate once at the fixed tick rate.
    pub fn step(&mut self) {
        let delta = tick_delta();
        let _ = self
            .sim
            .apply_thrust(&mut self.world, self.direction, self.throttle, delta);
        let _ = self.sim.tick(&mut self.world, delta);
        self.world.step(delta);
    }

    /// Hash of the ship state plus the body's position and velocity.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.sim.ship().state_hash().hash(&mut hasher);
        self.sim.current_tick().hash(&mut hasher);
        if let Some(body) = self.sim.body() {
            self.world.position(body).hash(&mut hasher);
            self.world.velocity(body).hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Fly a ship twice from the same setup and compare final hashes.
pub fn verify_flight_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> FlightRun,
{
    verify_determinism(2, num_ticks, &setup_fn, FlightRun::step, FlightRun::state_hash)
        .is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims, self.ticks, unique.len(), self.hashes
            );
        }
    }
}

/// Fly N ships on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_flights<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> FlightRun + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut run = setup_fn();
                    for _ in 0..num_ticks {
                        run.step();
                    }
                    run.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two flights tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs match, `Some(tick)` if they diverge at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> FlightRun,
{
    let mut run1 = setup_fn();
    let mut run2 = setup_fn();

    if run1.state_hash() != run2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        run1.step();
        run2.step();

        if run1.state_hash() != run2.state_hash() {
            tracing::debug!(tick, "Flights diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a blueprint snapshot rebuilds a ship with the same state.
///
/// The ship is exported, encoded with bincode, decoded and reassembled
/// against `registry`; the rebuilt ship is resupplied like the original
/// is expected to be.
pub fn verify_snapshot_determinism(
    ship: &Ship,
    registry: &shipwright_core::registry::BlockRegistry,
) -> bool {
    let blueprint = ship.to_blueprint();
    let Ok(bytes) = blueprint.to_bytes() else {
        return false;
    };
    let Ok(decoded) = shipwright_core::data::ShipBlueprint::from_bytes(&bytes) else {
        return false;
    };
    decoded
        .assemble(registry, *ship.config())
        .is_ok_and(|rebuilt| rebuilt.state_hash() == ship.state_hash())
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for structural and combat property tests.
pub mod strategies {
    use proptest::prelude::*;
    use shipwright_core::block::BlockId;
    use shipwright_core::math::Fixed;
    use shipwright_core::ship::Ship;

    /// One topology edit against a ship whose blocks have ids `1..=n`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum GraphOp {
        /// Try to join two ports.
        Connect {
            /// First block.
            a: u32,
            /// Port on the first block.
            port_a: usize,
            /// Second block.
            b: u32,
            /// Port on the second block.
            port_b: usize,
        },
        /// Drop every connection between two blocks.
        Disconnect {
            /// First block.
            a: u32,
            /// Second block.
            b: u32,
        },
        /// Remove a block.
        Remove {
            /// Block to remove.
            block: u32,
        },
    }

    impl GraphOp {
        /// Apply the edit, ignoring rejections.
        pub fn apply(self, ship: &mut Ship) {
            match self {
                Self::Connect { a, port_a, b, port_b } => {
                    let _ = ship.connect(BlockId(a), port_a, BlockId(b), port_b);
                }
                Self::Disconnect { a, b } => {
                    ship.disconnect(BlockId(a), BlockId(b));
                }
                Self::Remove { block } => {
                    let _ = ship.remove_block(BlockId(block));
                }
            }
        }
    }

    /// Generate an edit over blocks `1..=blocks` with four ports each.
    ///
    /// Ids and ports run one past the valid range so rejections are
    /// exercised too.
    pub fn arb_graph_op(blocks: u32) -> impl Strategy<Value = GraphOp> {
        let id = 1..=blocks + 1;
        let port = 0usize..5;
        prop_oneof![
            6 => (id.clone(), port.clone(), id.clone(), port)
                .prop_map(|(a, port_a, b, port_b)| GraphOp::Connect { a, port_a, b, port_b }),
            3 => (id.clone(), id.clone()).prop_map(|(a, b)| GraphOp::Disconnect { a, b }),
            1 => id.prop_map(|block| GraphOp::Remove { block }),
        ]
    }

    /// Generate a sequence of edits.
    pub fn arb_op_sequence(blocks: u32, max_len: usize) -> impl Strategy<Value = Vec<GraphOp>> {
        prop::collection::vec(arb_graph_op(blocks), 0..max_len)
    }

    /// Incoming damage: 0 to 1000.
    pub fn arb_damage() -> impl Strategy<Value = Fixed> {
        (0i32..=1000).prop_map(Fixed::from_num)
    }

    /// Shield pool: 0 to 500.
    pub fn arb_shield() -> impl Strategy<Value = Fixed> {
        (0i32..=500).prop_map(Fixed::from_num)
    }

    /// Armor value: 0 to 400.
    pub fn arb_armor() -> impl Strategy<Value = Fixed> {
        (0i32..=400).prop_map(Fixed::from_num)
    }
}
