// space_control: HTTP control surface for the orbital simulation.
//
// Lets an external agent or test harness observe and drive one `Universe`
// over plain HTTP/JSON: read the ship and planets, set thrust and heading,
// advance time, reset to a seed, and toggle the autopilot. Response shapes
// come from `space_protocol`.
//
// Module overview:
// - `server.rs`:   tiny_http listener, worker pool, `Router` (path ->
//                  handler), `ControlConfig`, `start_control`, `ControlHandle`.
// - `state.rs`:    `ControlState`, the universe plus seed and nanosecond
//                  counter behind the shared `RwLock`.
// - `snapshot.rs`: Builders for `/observe` and `/world` bodies.
// - `query.rs`:    Query-string decoding and typed accessors.
// - `error.rs`:    `ControlError` and its HTTP status mapping.
// - `stepper.rs`:  Realtime background stepper with bounded shutdown.
// - `progress.rs`: Once-per-simulated-second craft status listener.
//
// The server can run as the standalone `spacectl` binary (`main.rs`) or be
// embedded in another process via `start_control`.

pub mod error;
pub mod progress;
pub mod query;
pub mod server;
pub mod snapshot;
pub mod state;
pub mod stepper;

pub use error::ControlError;
pub use server::{ControlConfig, ControlHandle, Router, start_control};
pub use state::{ControlState, INITIAL_NANOS, UniverseFactory};
