// Response bodies of the control protocol.
//
// One struct per endpoint response, plus the nested records they carry.
// Field names are camelCase on the wire. Numbers that describe simulation
// state use the fixed-precision types from `types.rs` so identical states
// render identically.
//
// `/observe` omits the `gravity` key entirely when the system has no
// planets, while `nearestPlanet` and `altitude` are present as `null`.

use serde::{Deserialize, Serialize};

use crate::types::{F2, F3};

/// `GET /health`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

/// `GET /observe`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveResponse {
    pub now: F3,
    pub ship: ShipState,
    pub nearest_planet: Option<NearestPlanet>,
    pub altitude: Option<F2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity: Option<Gravity>,
    /// Index of `nearest_planet`, or -1.
    pub nearest_planet_id: i64,
    pub nearest_planets: Vec<PlanetProximity>,
    pub landing: Option<LandingState>,
    /// `null` until the autopilot has been engaged once.
    pub autopilot: Option<AutopilotState>,
    /// Planets plus the star.
    pub bodies: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipState {
    pub x: F2,
    pub y: F2,
    pub vx: F2,
    pub vy: F2,
    pub angle: F3,
    pub fuel: F2,
    pub fuel_capacity: F2,
    pub hull: F2,
    pub hull_capacity: F2,
    /// Magnitude of the thrust vector, `[0, 1]`.
    pub thrust: F2,
    pub destroyed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestPlanet {
    pub id: usize,
    pub x: F2,
    pub y: F2,
    pub radius: F2,
    pub mass: F3,
    pub can_land: bool,
}

/// Gravitational pull of a planet on the ship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gravity {
    pub gx: F3,
    pub gy: F3,
}

/// One entry of the nearest-N list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetProximity {
    pub id: usize,
    pub x: F2,
    pub y: F2,
    pub radius: F2,
    pub distance: F2,
    /// Surface-to-hull distance: `distance - (ship radius + planet radius)`.
    pub altitude: F2,
    pub gx: F3,
    pub gy: F3,
    pub vx: F2,
    pub vy: F2,
    pub mass: F3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingState {
    pub planet_id: usize,
    pub planet_name: String,
    pub angle: F3,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutopilotState {
    pub enabled: bool,
    pub target: Option<usize>,
    pub strategy: String,
    pub telemetry: String,
}

/// `GET /world`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldResponse {
    pub now: F3,
    pub universe_range: f32,
    pub config: WorldConfig,
    pub star: StarRecord,
    pub planets: Vec<PlanetRecord>,
    pub explored_count: usize,
    pub bodies: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConfig {
    pub realtime: bool,
    pub time_scale: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarRecord {
    pub name: String,
    pub x: F2,
    pub y: F2,
    pub vx: F2,
    pub vy: F2,
    pub radius: F2,
    pub mass: F3,
    /// Spectral class letter.
    pub class: String,
    pub deadly: bool,
    pub collides: bool,
    pub can_land: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetRecord {
    pub id: usize,
    pub name: String,
    pub x: F2,
    pub y: F2,
    pub radius: F2,
    pub mass: F3,
    pub vx: F2,
    pub vy: F2,
    pub collides: bool,
    pub can_land: bool,
    pub explored: bool,
    pub description: String,
    pub atmosphere: String,
    pub flora: String,
    pub fauna: String,
}

/// `POST /step`, and `/step` in realtime mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    pub now: F3,
}

/// `POST /act`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// `POST /reset`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub ok: bool,
    pub seed: i64,
}

/// `POST /autopilot`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutopilotResponse {
    pub ok: bool,
    pub enabled: bool,
}

/// Body of every 4xx/5xx response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
