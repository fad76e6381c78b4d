// The mutable state every control endpoint shares.
//
// `ControlState` owns the current universe, the seed it was built from, and
// the monotonic nanosecond counter fed to `Universe::step`. It lives behind
// one `RwLock`: `/observe` and `/world` read, everything else writes.
//
// Every universe this state creates (at startup and on reset) is stepped
// once at `INITIAL_NANOS` straight away. That first step only calibrates the
// kernel's clock, so the first `/step` afterwards advances time.

use std::sync::Arc;

use space_sim::Universe;
use tracing::info;

/// Clock epoch for a fresh universe. Non-zero so the calibration step is
/// distinguishable from an unset clock.
pub const INITIAL_NANOS: i64 = 1_000_000;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Builds a universe for a seed. Called at startup and on every reset.
pub type UniverseFactory = Arc<dyn Fn(i64) -> Universe + Send + Sync>;

pub struct ControlState {
    universe: Universe,
    seed: i64,
    current_nanos: i64,
    factory: UniverseFactory,
}

impl std::fmt::Debug for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlState")
            .field("seed", &self.seed)
            .field("current_nanos", &self.current_nanos)
            .field("now", &self.universe.now())
            .finish()
    }
}

impl ControlState {
    pub fn new(seed: i64, factory: UniverseFactory) -> Self {
        let universe = fresh_universe(&factory, seed);
        Self {
            universe,
            seed,
            current_nanos: INITIAL_NANOS,
            factory,
        }
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn universe_mut(&mut self) -> &mut Universe {
        &mut self.universe
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn current_nanos(&self) -> i64 {
        self.current_nanos
    }

    /// Advance the clock by `dt` seconds. Spans longer than the kernel's
    /// `max_valid_dt` are split into equal sub-steps that each fit under it.
    /// Returns the universe's new `now`.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let config = self.universe.config();
        let max_chunk = f64::from(config.max_valid_dt) / f64::from(config.time_scale);
        let total = f64::from(dt);
        let chunks = (total / max_chunk).ceil().max(1.0) as i64;
        let delta = (total * NANOS_PER_SECOND / chunks as f64) as i64;
        for _ in 0..chunks {
            self.advance_nanos(delta);
        }
        self.universe.now()
    }

    /// Move the counter forward by `delta` nanoseconds (at least one) and
    /// step the universe to it.
    pub fn advance_nanos(&mut self, delta: i64) -> f32 {
        self.current_nanos = self
            .current_nanos
            .saturating_add(delta)
            .max(self.current_nanos.saturating_add(1));
        self.universe.step(self.current_nanos);
        self.universe.now()
    }

    /// Replace the universe with a fresh one for `seed`, or for the current
    /// seed when `None`. Returns the seed in use.
    pub fn reset(&mut self, seed: Option<i64>) -> i64 {
        self.seed = seed.unwrap_or(self.seed);
        self.current_nanos = INITIAL_NANOS;
        self.universe = fresh_universe(&self.factory, self.seed);
        info!(seed = self.seed, "universe reset");
        self.seed
    }
}

fn fresh_universe(factory: &UniverseFactory, seed: i64) -> Universe {
    let mut universe = factory(seed);
    universe.step(INITIAL_NANOS);
    universe
}
