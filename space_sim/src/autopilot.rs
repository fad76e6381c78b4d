// Autonomous pilot for the spacecraft.
//
// The autopilot is an entity of its own. It is registered with the kernel the
// first time it is engaged and removed again when disengaged. It acts in its
// `post_update`, after the spacecraft has integrated and resolved contact for
// the step, and writes the thrust the craft will use on the next step.
//
// Decision cycle while enabled:
//
//   landed, had a target        -> goal reached: clear target, sightsee
//   landed, sightseeing over    -> full thrust along the surface normal
//   in flight, launch burn      -> keep burning until the burn time is up
//   in flight, no target        -> nearest unexplored planet (or nearest)
//   in flight, target           -> velocity controller toward the target
//
// The approach controller wants a closing speed of
// `min(cruise, sqrt(v_floor² + 2·a_brake·alt))`, which decays to the floor
// speed (a fraction of the landing limit) at the surface. It converts the
// velocity error into an acceleration over `response_time`, cancels local
// gravity, and scales that into a thrust vector of at most full power.
//
// Everything it reads comes from the step's state and config, so for a given
// seed and input sequence its choices are deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bodies::{Planet, PlanetId, Spacecraft, Star, gravity_at};
use crate::config::UniverseConfig;
use crate::vec2::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Idle,
    Sightseeing,
    Launch,
    Cruise,
    Brake,
    Descend,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Idle => "idle",
            Strategy::Sightseeing => "sightseeing",
            Strategy::Launch => "launching",
            Strategy::Cruise => "cruising",
            Strategy::Brake => "braking",
            Strategy::Descend => "descending",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Autopilot {
    pub enabled: bool,
    pub target: Option<PlanetId>,
    pub strategy: Strategy,
    /// Multi-line status readout, rebuilt every step while enabled.
    pub telemetry: String,
    next_strategy_time: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}

impl Autopilot {
    /// A disengaged autopilot.
    pub fn new() -> Self {
        Self {
            enabled: false,
            target: None,
            strategy: Strategy::Idle,
            telemetry: String::new(),
            next_strategy_time: 0.0,
        }
    }

    pub fn engage(&mut self) {
        self.enabled = true;
    }

    /// Hand control back, cutting the engine in the same call.
    pub fn disengage(&mut self, ship: &mut Spacecraft) {
        self.enabled = false;
        self.target = None;
        self.strategy = Strategy::Idle;
        self.telemetry.clear();
        self.next_strategy_time = 0.0;
        ship.thrust = Vec2::ZERO;
    }

    pub fn steer(
        &mut self,
        now: f32,
        ship: &mut Spacecraft,
        star: &Star,
        planets: &[Planet],
        config: &UniverseConfig,
    ) {
        if !self.enabled {
            return;
        }
        self.decide(now, ship, star, planets, config);
        self.telemetry = self.readout(planets);
    }

    fn decide(
        &mut self,
        now: f32,
        ship: &mut Spacecraft,
        star: &Star,
        planets: &[Planet],
        config: &UniverseConfig,
    ) {
        let tuning = &config.autopilot;
        if ship.destroyed {
            self.target = None;
            self.strategy = Strategy::Idle;
            ship.thrust = Vec2::ZERO;
            return;
        }

        if let Some(landing) = &ship.landing {
            if self.target.take().is_some() {
                self.strategy = Strategy::Sightseeing;
                self.next_strategy_time = now + tuning.sightseeing_time;
                ship.thrust = Vec2::ZERO;
            } else if self.strategy == Strategy::Sightseeing && now < self.next_strategy_time {
                ship.thrust = Vec2::ZERO;
            } else {
                self.strategy = Strategy::Launch;
                self.next_strategy_time = now + tuning.launch_thrust_time;
                ship.thrust = Vec2::make_with_angle_mag(landing.angle, 1.0);
            }
            return;
        }

        if self.strategy == Strategy::Launch && now < self.next_strategy_time {
            return;
        }

        if self.target.is_none() {
            self.target = pick_target(ship, planets);
        }
        let Some(planet) = self.target.and_then(|id| planets.get(id.0)) else {
            self.target = None;
            self.strategy = Strategy::Idle;
            ship.thrust = Vec2::ZERO;
            return;
        };

        let to = planet.body.pos - ship.body.pos;
        let dist = to.mag();
        let dir = to.normalized();
        let altitude = dist - planet.body.radius - ship.body.radius;
        let relative = ship.body.velocity - planet.body.velocity;
        let closing = relative.dot(dir);

        let floor = config.landing_speed_limit * tuning.approach_margin;
        let brake = config.main_engine_accel * tuning.brake_fraction;
        let wanted = (floor * floor + 2.0 * brake * altitude.max(0.0))
            .sqrt()
            .min(tuning.cruise_speed);

        let gravity = gravity_at(ship.body.pos, star, planets, config.gravitation, None);
        let accel = (dir * wanted - relative) / tuning.response_time - gravity;
        ship.thrust = (accel / config.main_engine_accel).clamp_mag(1.0);

        self.strategy = if altitude < tuning.descent_altitude {
            Strategy::Descend
        } else if closing > wanted {
            Strategy::Brake
        } else {
            Strategy::Cruise
        };
    }

    fn readout(&self, planets: &[Planet]) -> String {
        let target = match self.target.and_then(|id| planets.get(id.0)) {
            Some(planet) => planet.body.name.to_uppercase(),
            None => String::from("SELECTING..."),
        };
        format!(
            "---- AUTOPILOT ENGAGED ----\nTGT: {target}\nEXE: {}",
            self.strategy.label().to_uppercase()
        )
    }
}

/// Nearest unexplored planet. If every planet has been explored, the nearest
/// one that is not the planet just left (unless it is the only one).
fn pick_target(ship: &Spacecraft, planets: &[Planet]) -> Option<PlanetId> {
    let nearest = |allow: &dyn Fn(usize, &Planet) -> bool| -> Option<PlanetId> {
        planets
            .iter()
            .enumerate()
            .filter(|(idx, p)| p.body.collides && allow(*idx, *p))
            .min_by(|(_, a), (_, b)| {
                let da = a.body.pos.distance(ship.body.pos);
                let db = b.body.pos.distance(ship.body.pos);
                da.total_cmp(&db)
            })
            .map(|(idx, _)| PlanetId(idx))
    };
    nearest(&|_, p| !p.explored)
        .or_else(|| nearest(&|idx, _| ship.launched_from != Some(PlanetId(idx))))
        .or_else(|| nearest(&|_, _| true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{Landing, StarClass, disc_mass};
    use crate::physics::Body;
    use space_namer::PlanetInfo;

    fn config() -> UniverseConfig {
        UniverseConfig::default()
    }

    fn star() -> Star {
        Star::new("Vega", StarClass::A, 1_000.0, 0.5)
    }

    fn planet(name: &str, pos: Vec2, radius: f32) -> Planet {
        let mut body = Body::new(name);
        body.pos = pos;
        body.radius = radius;
        body.mass = disc_mass(2.5, radius);
        Planet::orbiting(body, Vec2::ZERO, 0.0, PlanetInfo::default())
    }

    #[test]
    fn disabled_pilot_does_nothing() {
        let mut pilot = Autopilot::new();
        let mut ship = Spacecraft::new(&config());
        ship.thrust = Vec2::new(0.3, 0.0);
        pilot.steer(1.0, &mut ship, &star(), &[], &config());
        assert_eq!(ship.thrust, Vec2::new(0.3, 0.0));
        assert!(pilot.telemetry.is_empty());
    }

    #[test]
    fn picks_nearest_unexplored_target() {
        let planets = vec![
            planet("Vega 1", Vec2::new(30_000.0, 0.0), 500.0),
            planet("Vega 2", Vec2::new(60_000.0, 0.0), 500.0),
            planet("Vega 3", Vec2::new(90_000.0, 0.0), 500.0),
        ];
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(65_000.0, 0.0);
        assert_eq!(pick_target(&ship, &planets), Some(PlanetId(1)));

        let mut explored = planets.clone();
        explored[1].explored = true;
        assert_eq!(pick_target(&ship, &explored), Some(PlanetId(2)));

        for p in &mut explored {
            p.explored = true;
        }
        ship.launched_from = Some(PlanetId(1));
        assert_eq!(pick_target(&ship, &explored), Some(PlanetId(2)));
        assert_eq!(pick_target(&ship, &[]), None);
    }

    #[test]
    fn engaged_pilot_thrusts_toward_target_and_reports() {
        let planets = vec![planet("Vega 1", Vec2::new(60_000.0, 0.0), 500.0)];
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(60_000.0, 20_000.0);
        let mut pilot = Autopilot::new();
        pilot.engage();
        pilot.steer(0.5, &mut ship, &star(), &planets, &config());

        assert_eq!(pilot.target, Some(PlanetId(0)));
        assert_eq!(pilot.strategy, Strategy::Cruise);
        assert!((ship.thrust.mag() - 1.0).abs() < 1e-4);
        assert!(ship.thrust.y < -0.99, "should point down at the planet");
        assert_eq!(
            pilot.telemetry,
            "---- AUTOPILOT ENGAGED ----\nTGT: VEGA 1\nEXE: CRUISING"
        );
    }

    #[test]
    fn closing_too_fast_reports_braking() {
        let planets = vec![planet("Vega 1", Vec2::new(60_000.0, 0.0), 500.0)];
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(60_000.0, 5_000.0);
        ship.body.velocity = Vec2::new(0.0, -4_000.0);
        let mut pilot = Autopilot::new();
        pilot.engage();
        pilot.steer(0.5, &mut ship, &star(), &planets, &config());
        assert_eq!(pilot.strategy, Strategy::Brake);
        assert!(ship.thrust.y > 0.99, "should burn away from the planet");
    }

    #[test]
    fn landing_on_target_starts_sightseeing_then_launch() {
        let cfg = config();
        let planets = vec![planet("Vega 1", Vec2::new(60_000.0, 0.0), 500.0)];
        let mut ship = Spacecraft::new(&cfg);
        let mut pilot = Autopilot::new();
        pilot.engage();
        pilot.target = Some(PlanetId(0));
        ship.landing = Some(Landing {
            planet: PlanetId(0),
            angle: 0.0,
            text: String::from("surveying"),
        });

        pilot.steer(10.0, &mut ship, &star(), &planets, &cfg);
        assert_eq!(pilot.strategy, Strategy::Sightseeing);
        assert_eq!(pilot.target, None);
        assert_eq!(ship.thrust, Vec2::ZERO);

        pilot.steer(12.0, &mut ship, &star(), &planets, &cfg);
        assert_eq!(pilot.strategy, Strategy::Sightseeing);
        assert_eq!(ship.thrust, Vec2::ZERO);

        pilot.steer(15.5, &mut ship, &star(), &planets, &cfg);
        assert_eq!(pilot.strategy, Strategy::Launch);
        assert!((ship.thrust.x - 1.0).abs() < 1e-5);
        assert!(pilot.telemetry.ends_with("EXE: LAUNCHING"));
    }

    #[test]
    fn launch_burn_holds_before_retargeting() {
        let cfg = config();
        let planets = vec![
            planet("Vega 1", Vec2::new(60_000.0, 0.0), 500.0),
            planet("Vega 2", Vec2::new(-60_000.0, 0.0), 500.0),
        ];
        let mut ship = Spacecraft::new(&cfg);
        ship.body.pos = Vec2::new(60_600.0, 0.0);
        ship.thrust = Vec2::new(1.0, 0.0);
        let mut pilot = Autopilot::new();
        pilot.engage();
        pilot.strategy = Strategy::Launch;
        pilot.next_strategy_time = 3.0;

        pilot.steer(2.0, &mut ship, &star(), &planets, &cfg);
        assert_eq!(pilot.strategy, Strategy::Launch);
        assert_eq!(pilot.target, None);
        assert_eq!(ship.thrust, Vec2::new(1.0, 0.0));

        pilot.steer(3.5, &mut ship, &star(), &planets, &cfg);
        assert_eq!(pilot.target, Some(PlanetId(0)));
        assert!(pilot.telemetry.contains("TGT: VEGA 1"));
    }

    #[test]
    fn disengage_zeroes_thrust() {
        let planets = vec![planet("Vega 1", Vec2::new(60_000.0, 0.0), 500.0)];
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(60_000.0, 20_000.0);
        let mut pilot = Autopilot::new();
        pilot.engage();
        pilot.steer(0.5, &mut ship, &star(), &planets, &config());
        assert!(ship.thrust.mag() > 0.0);

        pilot.disengage(&mut ship);
        assert_eq!(ship.thrust, Vec2::ZERO);
        assert!(!pilot.enabled);
        assert!(pilot.telemetry.is_empty());
        assert_eq!(pilot.strategy, Strategy::Idle);
    }

    #[test]
    fn no_planets_means_idle() {
        let mut ship = Spacecraft::new(&config());
        ship.thrust = Vec2::new(0.5, 0.5);
        let mut pilot = Autopilot::new();
        pilot.engage();
        pilot.steer(1.0, &mut ship, &star(), &[], &config());
        assert_eq!(pilot.strategy, Strategy::Idle);
        assert_eq!(ship.thrust, Vec2::ZERO);
        assert!(pilot.telemetry.contains("SELECTING..."));
    }
}
