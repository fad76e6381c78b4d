// space_protocol: wire shapes of the orbital simulation's control protocol.
//
// This crate defines the JSON bodies the control server (`space_control`)
// returns and that test clients read back. It has no dependency on the sim
// crate; the server's snapshot builders translate sim state into these
// structs.
//
// Module overview:
// - `types.rs`:    `Fixed<D>` (`F2`, `F3`), floats rendered with a fixed
//                  number of decimals, non-finite as `null`.
// - `message.rs`:  One response struct per endpoint plus nested records.
//
// Design decisions:
// - **Fixed precision on the wire.** Byte-identical responses for identical
//   states make snapshot and determinism testing trivial.
// - **Serialize and Deserialize on every type.** The server only writes
//   them, but integration tests decode them with the same definitions.

pub mod message;
pub mod types;

pub use message::{
    AutopilotResponse, AutopilotState, ErrorResponse, Gravity, HealthResponse, LandingState,
    NearestPlanet, ObserveResponse, OkResponse, PlanetProximity, PlanetRecord, ResetResponse,
    ShipState, StarRecord, StepResponse, WorldConfig, WorldResponse,
};
pub use types::{F2, F3, Fixed};
