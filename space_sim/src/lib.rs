// space_sim: the orbital simulation library.
//
// This crate holds everything that moves: vector math, the fixed-step
// kernel, the star/planet/spacecraft bodies, the autopilot, and the
// `Universe` aggregate that ties them to a seed. It has no network or
// terminal dependencies and runs headless; the control server in
// `space_control` drives it over HTTP.
//
// Module overview:
// - `vec2.rs`:      Vec2, the 2D value type everything is built on.
// - `physics.rs`:   Body, Container, the World trait and the Simulator kernel
//                   (update -> solve -> post_update -> listeners).
// - `bodies.rs`:    Star, Planet, Spacecraft, gravity, landing and impacts.
// - `autopilot.rs`: Autopilot strategies, target selection, steering law.
// - `universe.rs`:  StarSystem (the kernel's World) and Universe (seed,
//                   generation, queries, autopilot toggle).
// - `config.rs`:    UniverseConfig, every tunable constant.
// - `prng`:         Re-exported from `space_prng`.
//
// **Critical constraint: determinism.** Given the same seed, namer and
// config, and the same sequence of commands and step timestamps, two
// universes produce bit-identical state. All randomness comes from the
// single `SpaceRng` owned by the kernel. No `HashMap`, no system time, no OS
// entropy.

pub mod autopilot;
pub mod bodies;
pub mod config;
pub mod physics;
pub use space_prng as prng;
pub mod universe;
pub mod vec2;

pub use autopilot::{Autopilot, Strategy};
pub use bodies::{Landing, Planet, PlanetId, ShipEvent, Spacecraft, Star, StarClass};
pub use config::{AutopilotConfig, ConfigError, UniverseConfig};
pub use physics::{Body, Container, ListenerHandle, Simulator, StepInfo, StepOutcome, World};
pub use universe::{StarSystem, Universe};
pub use vec2::Vec2;
