// Data-driven universe configuration.
//
// Every tunable constant of the simulation lives in `UniverseConfig`: the
// kernel clock limits, generation ranges for the star and planets, gravity,
// the spacecraft's engine and gauges, landing/impact rules, and the
// autopilot's steering parameters (grouped in `AutopilotConfig`). The sim
// never hard-codes these numbers; `Default` reproduces the stock values and
// `UniverseConfig::from_json` loads an override file, validating it.
//
// Ranges are `(low, high)` tuples. Float ranges are half-open `[low, high)`;
// `planet_count_range` is inclusive.
//
// Determinism: config values feed straight into generation and stepping, so
// two universes only replay identically if their configs are identical.

use serde::{Deserialize, Serialize};

/// Errors from loading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config field `{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Steering parameters for the autopilot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    /// Top approach speed relative to the target, units/s.
    pub cruise_speed: f32,
    /// Fraction of the main engine's acceleration budgeted for braking when
    /// planning the approach speed profile.
    pub brake_fraction: f32,
    /// Final approach speed as a fraction of `landing_speed_limit`.
    pub approach_margin: f32,
    /// Time constant of the velocity controller, seconds.
    pub response_time: f32,
    /// Altitude below which the pilot reports `Descend`.
    pub descent_altitude: f32,
    /// Seconds spent on the surface before picking the next target.
    pub sightseeing_time: f32,
    /// Seconds of full thrust along the surface normal after lift-off.
    pub launch_thrust_time: f32,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            cruise_speed: 2_000.0,
            brake_fraction: 0.3,
            approach_margin: 0.4,
            response_time: 0.25,
            descent_altitude: 1_000.0,
            sightseeing_time: 5.0,
            launch_thrust_time: 2.0,
        }
    }
}

/// Top-level universe configuration. Never mutated at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Simulation seconds per wall-clock second.
    pub time_scale: f32,
    /// Longest gap (simulated seconds) the kernel will integrate; longer
    /// gaps are treated as a pause.
    pub max_valid_dt: f32,
    /// Radius of the ring fence that keeps the craft in the system.
    pub universe_range: f32,

    pub gravitation: f32,
    /// Scales orbital periods: `period = sqrt(r³ / M_star) * kepler_constant`.
    pub kepler_constant: f32,
    /// Mass per unit area (`mass = density * π * r²`).
    pub star_density: f32,
    pub planet_density: f32,

    pub star_radius_range: (f32, f32),
    pub planet_radius_range: (f32, f32),
    /// Orbit radius range, measured from the star's center.
    pub planet_orbit_range: (f32, f32),
    /// Inclusive.
    pub planet_count_range: (u32, u32),

    pub craft_mass: f32,
    pub craft_radius: f32,
    /// Distance from the star at which the craft spawns.
    pub craft_spawn_distance: f32,
    /// Acceleration at full thrust, units/s².
    pub main_engine_accel: f32,
    pub craft_speed_limit: f32,
    pub fuel_capacity: f32,
    pub hull_capacity: f32,
    /// Fuel units per second at full thrust.
    pub fuel_burn_rate: f32,
    /// Fuel units per second while landed.
    pub refuel_rate: f32,
    /// Hull units per second while landed.
    pub repair_rate: f32,

    /// Highest relative speed at which contact with a planet is a landing
    /// rather than an impact.
    pub landing_speed_limit: f32,
    /// Hull damage per unit of speed above `landing_speed_limit`.
    pub impact_damage_factor: f32,
    /// Seconds after lift-off during which the departed planet's gravity is
    /// ignored (main engine cut-off).
    pub launch_meco: f32,
    /// Speed along the surface normal at lift-off, relative to the planet.
    pub launch_speed: f32,

    pub autopilot: AutopilotConfig,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_valid_dt: 1.0,
            universe_range: 200_000.0,
            gravitation: 1e-2,
            kepler_constant: 50.0,
            star_density: 0.5,
            planet_density: 2.5,
            star_radius_range: (1_000.0, 8_000.0),
            planet_radius_range: (50.0, 2_000.0),
            planet_orbit_range: (16_000.0, 150_000.0),
            planet_count_range: (1, 10),
            craft_mass: 10.0,
            craft_radius: 12.0,
            craft_spawn_distance: 160_000.0,
            main_engine_accel: 1_000.0,
            craft_speed_limit: 5_000.0,
            fuel_capacity: 100.0,
            hull_capacity: 100.0,
            fuel_burn_rate: 1.0,
            refuel_rate: 10.0,
            repair_rate: 5.0,
            landing_speed_limit: 500.0,
            impact_damage_factor: 0.05,
            launch_meco: 2.0,
            launch_speed: 100.0,
            autopilot: AutopilotConfig::default(),
        }
    }
}

impl UniverseConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: UniverseConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and the geometric relationships generation relies on:
    /// planets must orbit clear of the star, and the craft must spawn clear
    /// of every orbit and inside the ring fence.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("time_scale", self.time_scale),
            ("max_valid_dt", self.max_valid_dt),
            ("universe_range", self.universe_range),
            ("kepler_constant", self.kepler_constant),
            ("craft_radius", self.craft_radius),
            ("main_engine_accel", self.main_engine_accel),
            ("craft_speed_limit", self.craft_speed_limit),
            ("fuel_capacity", self.fuel_capacity),
            ("hull_capacity", self.hull_capacity),
            ("autopilot.cruise_speed", self.autopilot.cruise_speed),
            ("autopilot.response_time", self.autopilot.response_time),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }

        let ranges = [
            ("star_radius_range", self.star_radius_range),
            ("planet_radius_range", self.planet_radius_range),
            ("planet_orbit_range", self.planet_orbit_range),
        ];
        for (field, (low, high)) in ranges {
            if !(low.is_finite() && high.is_finite() && low > 0.0 && low <= high) {
                return Err(invalid(field, format!("need 0 < low <= high, got ({low}, {high})")));
            }
        }
        let (min_planets, max_planets) = self.planet_count_range;
        if min_planets > max_planets {
            return Err(invalid(
                "planet_count_range",
                format!("low {min_planets} exceeds high {max_planets}"),
            ));
        }

        if self.planet_orbit_range.0 <= self.star_radius_range.1 + self.planet_radius_range.1 {
            return Err(invalid(
                "planet_orbit_range",
                "innermost orbit would overlap the largest star",
            ));
        }
        let outermost = self.planet_orbit_range.1 + self.planet_radius_range.1 + self.craft_radius;
        if self.craft_spawn_distance <= outermost {
            return Err(invalid(
                "craft_spawn_distance",
                "craft would spawn inside the outermost orbit band",
            ));
        }
        if self.craft_spawn_distance + self.craft_radius > self.universe_range {
            return Err(invalid(
                "craft_spawn_distance",
                "craft would spawn outside the universe range",
            ));
        }
        if !(0.0..=1.0).contains(&self.autopilot.brake_fraction) {
            return Err(invalid("autopilot.brake_fraction", "must be within [0, 1]"));
        }
        Ok(())
    }
}
