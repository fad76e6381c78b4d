// Domain bodies: the star, planets, and the spacecraft.
//
// Each wraps a kernel `Body` and supplies its own `update`/`post_update`,
// which `StarSystem` (universe.rs) dispatches to by entity key.
//
// - `Star`: sits at the origin, never moves. Touching it destroys the craft.
// - `Planet`: kinematic circular orbit around the star at constant linear
//   speed. `update` points velocity along the orbit tangent and integrates;
//   `post_update` projects the position back onto the orbit circle so float
//   drift never accumulates.
// - `Spacecraft`: the only dynamic body. `update` applies gravity from the
//   star and every planet (skipping the planet just departed during the
//   launch MECO window), then thrust, then the speed cap, then integrates.
//   `post_update` resolves contact after constraints have run: the star
//   destroys the craft, a planet either lands it (slow enough) or damages and
//   bounces it. While landed the craft rides the planet at its landing angle,
//   refuels and repairs, and lifts off on the first non-zero thrust.
//
// Planets are addressed by `PlanetId`, their index in the system's planet
// list, which is fixed once the system is generated.

use serde::{Deserialize, Serialize};
use space_namer::{Namer, PlanetInfo};
use space_prng::SpaceRng;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::fmt;

use crate::config::UniverseConfig;
use crate::physics::Body;
use crate::vec2::Vec2;

/// Index of a planet in its system's planet list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanetId(pub usize);

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Spectral class of the star.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
}

impl StarClass {
    pub const ALL: [StarClass; 7] = [
        StarClass::O,
        StarClass::B,
        StarClass::A,
        StarClass::F,
        StarClass::G,
        StarClass::K,
        StarClass::M,
    ];

    pub fn letter(self) -> &'static str {
        match self {
            StarClass::O => "O",
            StarClass::B => "B",
            StarClass::A => "A",
            StarClass::F => "F",
            StarClass::G => "G",
            StarClass::K => "K",
            StarClass::M => "M",
        }
    }
}

impl fmt::Display for StarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// `mass = density * π * r²`.
pub fn disc_mass(density: f32, radius: f32) -> f32 {
    density * std::f32::consts::PI * radius * radius
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Star {
    pub body: Body,
    pub class: StarClass,
}

impl Star {
    pub fn new(name: impl Into<String>, class: StarClass, radius: f32, density: f32) -> Self {
        let mut body = Body::new(name);
        body.radius = radius;
        body.mass = disc_mass(density, radius);
        body.collides = false;
        Self { body, class }
    }

    pub fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
    }

    pub fn post_update(&mut self, dt: f32) {
        self.body.derive_velocity(dt);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Planet {
    pub body: Body,
    pub orbit_center: Vec2,
    pub orbit_radius: f32,
    /// Linear speed along the orbit, units/s.
    pub orbit_speed: f32,
    pub info: PlanetInfo,
    pub explored: bool,
}

/// Linear speed of a circular orbit of radius `orbit_radius` around a star
/// of mass `star_mass`.
pub fn orbital_speed(orbit_radius: f32, star_mass: f32, kepler_constant: f32) -> f32 {
    if star_mass <= 0.0 || orbit_radius <= 0.0 {
        return 0.0;
    }
    let period = (orbit_radius.powi(3) / star_mass).sqrt() * kepler_constant;
    TAU * orbit_radius / period
}

impl Planet {
    /// A planet already placed on its orbit. `body.pos` must be set.
    pub fn orbiting(body: Body, orbit_center: Vec2, orbit_speed: f32, info: PlanetInfo) -> Self {
        let orbit_radius = (body.pos - orbit_center).mag();
        let mut planet = Self {
            body,
            orbit_center,
            orbit_radius,
            orbit_speed,
            info,
            explored: false,
        };
        planet.body.velocity = planet.tangent_velocity();
        planet
    }

    fn tangent_velocity(&self) -> Vec2 {
        let radial = self.body.pos - self.orbit_center;
        Vec2::make_with_angle_mag(radial.angle() + FRAC_PI_2, self.orbit_speed)
    }

    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.body.velocity = self.tangent_velocity();
        self.body.integrate(dt);
    }

    pub fn post_update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let radial = self.body.pos - self.orbit_center;
        self.body.pos = self.orbit_center + Vec2::make_with_angle_mag(radial.angle(), self.orbit_radius);
        self.body.derive_velocity(dt);
    }
}

/// The craft resting on a planet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landing {
    pub planet: PlanetId,
    /// Angle of the touch-down point, measured from the planet's center.
    pub angle: f32,
    /// What the crew is up to down there.
    pub text: String,
}

/// Notable things that happened to the craft during a step.
#[derive(Clone, Debug, PartialEq)]
pub enum ShipEvent {
    Landed(PlanetId),
    LiftOff(PlanetId),
    Impact { planet: PlanetId, damage: f32 },
    Destroyed,
}

/// Sum of gravitational accelerations at `pos` from the star and every
/// planet except `skip`.
pub fn gravity_at(
    pos: Vec2,
    star: &Star,
    planets: &[Planet],
    gravitation: f32,
    skip: Option<PlanetId>,
) -> Vec2 {
    let pull = |other: &Body| -> Vec2 {
        let to = other.pos - pos;
        let d2 = to.mag_squared();
        if d2 < 1e-6 {
            return Vec2::ZERO;
        }
        to.normalized() * (gravitation * other.mass / d2)
    };
    let mut accel = pull(&star.body);
    for (idx, planet) in planets.iter().enumerate() {
        if skip == Some(PlanetId(idx)) {
            continue;
        }
        accel += pull(&planet.body);
    }
    accel
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Spacecraft {
    pub body: Body,
    /// Desired thrust; magnitude in `[0, 1]` of full engine power.
    pub thrust: Vec2,
    pub fuel: f32,
    pub fuel_capacity: f32,
    pub hull: f32,
    pub hull_capacity: f32,
    pub landing: Option<Landing>,
    /// Planet most recently departed, and seconds since lift-off.
    pub launched_from: Option<PlanetId>,
    pub launch_clock: f32,
    pub destroyed: bool,
}

impl Spacecraft {
    pub fn new(config: &UniverseConfig) -> Self {
        let mut body = Body::new("Spacecraft");
        body.mass = config.craft_mass;
        body.radius = config.craft_radius;
        Self {
            body,
            thrust: Vec2::ZERO,
            fuel: config.fuel_capacity,
            fuel_capacity: config.fuel_capacity,
            hull: config.hull_capacity,
            hull_capacity: config.hull_capacity,
            landing: None,
            launched_from: None,
            launch_clock: 0.0,
            destroyed: false,
        }
    }

    /// Manual control input. The angle is applied first; a positive thrust
    /// then points along it, anything else cuts the engine.
    pub fn command(&mut self, angle: Option<f32>, thrust: Option<f32>) {
        if let Some(angle) = angle {
            self.body.angle = angle;
        }
        if let Some(t) = thrust {
            self.thrust = if t > 0.0 {
                Vec2::make_with_angle_mag(self.body.angle, t.clamp(0.0, 1.0))
            } else {
                Vec2::ZERO
            };
        }
    }

    pub fn is_landed(&self) -> bool {
        self.landing.is_some()
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.hull = 0.0;
        self.thrust = Vec2::ZERO;
        self.landing = None;
        let pos = self.body.pos;
        self.body.place(pos, Vec2::ZERO, 0.0);
    }

    pub fn update(
        &mut self,
        star: &Star,
        planets: &[Planet],
        config: &UniverseConfig,
        dt: f32,
    ) -> Option<ShipEvent> {
        if dt <= 0.0 {
            return None;
        }
        if self.destroyed {
            self.body.velocity = Vec2::ZERO;
            self.body.integrate(dt);
            return None;
        }

        let mut event = None;
        if let Some((id, angle)) = self.landing.as_ref().map(|l| (l.planet, l.angle)) {
            match planets.get(id.0) {
                None => self.landing = None,
                Some(planet) if self.thrust.mag() <= 0.0 => {
                    self.fuel = (self.fuel + config.refuel_rate * dt).min(self.fuel_capacity);
                    self.hull = (self.hull + config.repair_rate * dt).min(self.hull_capacity);
                    self.body.velocity = planet.body.velocity;
                    self.body.integrate(dt);
                    return None;
                }
                Some(planet) => {
                    let normal = Vec2::make_with_angle_mag(angle, 1.0);
                    self.body.velocity = planet.body.velocity + normal * config.launch_speed;
                    self.launched_from = Some(id);
                    self.launch_clock = 0.0;
                    self.landing = None;
                    event = Some(ShipEvent::LiftOff(id));
                }
            }
        }
        self.fly(star, planets, config, dt);
        event
    }

    fn fly(&mut self, star: &Star, planets: &[Planet], config: &UniverseConfig, dt: f32) {
        self.launch_clock += dt;
        let skip = self
            .launched_from
            .filter(|_| self.launch_clock < config.launch_meco);
        self.body.velocity += gravity_at(self.body.pos, star, planets, config.gravitation, skip) * dt;

        let power = self.thrust.mag();
        if power > 0.0 && self.fuel > 0.0 {
            self.body.velocity += self.thrust * (config.main_engine_accel * dt);
            self.fuel = (self.fuel - power * config.fuel_burn_rate * dt).max(0.0);
            self.body.angle = self.thrust.angle();
        }
        self.body.velocity = self.body.velocity.clamp_mag(config.craft_speed_limit);
        self.body.integrate(dt);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn post_update(
        &mut self,
        star: &Star,
        planets: &mut [Planet],
        namer: &mut dyn Namer,
        rng: &mut SpaceRng,
        config: &UniverseConfig,
        dt: f32,
    ) -> Option<ShipEvent> {
        if dt <= 0.0 {
            return None;
        }
        if self.destroyed {
            self.body.derive_velocity(dt);
            return None;
        }

        if let Some(landing) = &self.landing {
            if let Some(planet) = planets.get(landing.planet.0) {
                let surface = planet.body.radius + self.body.radius;
                let pos = planet.body.pos + Vec2::make_with_angle_mag(landing.angle, surface);
                self.body.angle = landing.angle;
                self.body.place(pos, planet.body.velocity, dt);
            }
            self.body.derive_velocity(dt);
            return None;
        }

        if self.body.pos.distance(star.body.pos) < star.body.radius + self.body.radius {
            self.destroy();
            return Some(ShipEvent::Destroyed);
        }

        for (idx, planet) in planets.iter_mut().enumerate() {
            if !planet.body.collides {
                continue;
            }
            let offset = self.body.pos - planet.body.pos;
            let dist = offset.mag();
            let contact = planet.body.radius + self.body.radius;
            if dist >= contact {
                continue;
            }
            let id = PlanetId(idx);
            let normal = if dist > 1e-6 {
                offset / dist
            } else {
                Vec2::new(1.0, 0.0)
            };
            let surface_pos = planet.body.pos + normal * contact;
            let relative = self.body.velocity - planet.body.velocity;
            let speed = relative.mag();

            if speed <= config.landing_speed_limit {
                let text = namer.describe_activity(rng, Some(&planet.info));
                planet.explored = true;
                self.thrust = Vec2::ZERO;
                self.body.angle = normal.angle();
                self.body.place(surface_pos, planet.body.velocity, dt);
                self.landing = Some(Landing {
                    planet: id,
                    angle: normal.angle(),
                    text,
                });
                self.launched_from = None;
                self.body.derive_velocity(dt);
                return Some(ShipEvent::Landed(id));
            }

            let damage = (speed - config.landing_speed_limit) * config.impact_damage_factor;
            self.hull = (self.hull - damage).max(0.0);
            if self.hull <= 0.0 {
                self.body.pos = surface_pos;
                self.destroy();
                return Some(ShipEvent::Destroyed);
            }
            let closing = relative.dot(normal);
            let bounced = if closing < 0.0 {
                relative - normal * (2.0 * closing)
            } else {
                relative
            };
            self.body.place(surface_pos, planet.body.velocity + bounced, dt);
            self.body.derive_velocity(dt);
            return Some(ShipEvent::Impact { planet: id, damage });
        }

        self.body.derive_velocity(dt);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use space_namer::MinimalNamer;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> UniverseConfig {
        UniverseConfig::default()
    }

    fn star() -> Star {
        Star::new("Sol", StarClass::G, 1_000.0, 0.5)
    }

    fn planet_at(pos: Vec2, radius: f32) -> Planet {
        let mut body = Body::new("Sol 1");
        body.pos = pos;
        body.radius = radius;
        body.mass = disc_mass(2.5, radius);
        Planet::orbiting(body, Vec2::ZERO, 0.0, PlanetInfo::default())
    }

    /// Run one full ship step the way the universe does.
    fn step_ship(ship: &mut Spacecraft, star: &Star, planets: &mut [Planet], dt: f32) -> Vec<ShipEvent> {
        let cfg = config();
        let mut rng = SpaceRng::new(1);
        let mut namer = MinimalNamer;
        let mut events = Vec::new();
        events.extend(ship.update(star, planets, &cfg, dt));
        events.extend(ship.post_update(star, planets, &mut namer, &mut rng, &cfg, dt));
        events
    }

    #[test]
    fn orbital_speed_follows_kepler() {
        let m = disc_mass(0.5, 1_000.0);
        let v1 = orbital_speed(20_000.0, m, 50.0);
        let v2 = orbital_speed(80_000.0, m, 50.0);
        // v ∝ r^-1/2: four times the radius, half the speed.
        assert!((v1 / v2 - 2.0).abs() < 1e-3);
        assert_eq!(orbital_speed(10.0, 0.0, 50.0), 0.0);
    }

    #[test]
    fn planet_stays_on_its_orbit() {
        let mut body = Body::new("p");
        body.pos = Vec2::new(30_000.0, 0.0);
        let mut planet = Planet::orbiting(body, Vec2::ZERO, 500.0, PlanetInfo::default());
        for _ in 0..600 {
            planet.update(DT);
            planet.post_update(DT);
        }
        assert!((planet.body.pos.mag() - 30_000.0).abs() < 0.5);
        assert!(planet.body.pos.y > 0.0, "orbits counter-clockwise");
        assert!((planet.body.velocity.mag() - 500.0).abs() < 1.0);
    }

    #[test]
    fn command_sets_angle_then_thrust() {
        let mut ship = Spacecraft::new(&config());
        ship.command(Some(FRAC_PI_2), Some(0.5));
        assert!((ship.thrust.mag() - 0.5).abs() < 1e-5);
        assert!((ship.thrust.angle() - FRAC_PI_2).abs() < 1e-5);

        ship.command(None, Some(0.0));
        assert_eq!(ship.thrust, Vec2::ZERO);
        assert!((ship.body.angle - FRAC_PI_2).abs() < 1e-6);

        ship.command(Some(1.0), None);
        assert_eq!(ship.thrust, Vec2::ZERO);
    }

    #[test]
    fn thrust_accelerates_and_burns_fuel() {
        let star = star();
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(20_000.0, 0.0);
        ship.command(Some(0.0), Some(1.0));
        for _ in 0..60 {
            step_ship(&mut ship, &star, &mut [], DT);
        }
        // ~1000 u/s² for one second.
        assert!((ship.body.velocity.x - 1_000.0).abs() < 5.0, "{:?}", ship.body.velocity);
        assert!((ship.fuel - 99.0).abs() < 1e-2, "fuel {}", ship.fuel);
    }

    #[test]
    fn no_fuel_no_thrust() {
        let star = star();
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(100_000.0, 0.0);
        ship.fuel = 0.0;
        ship.command(Some(0.0), Some(1.0));
        step_ship(&mut ship, &star, &mut [], DT);
        assert!(ship.body.velocity.x < 1.0);
    }

    #[test]
    fn speed_is_capped() {
        let star = star();
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(100_000.0, 0.0);
        ship.body.velocity = Vec2::new(0.0, 9_000.0);
        step_ship(&mut ship, &star, &mut [], DT);
        assert!(ship.body.velocity.mag() <= 5_000.0 + 1.0);
    }

    #[test]
    fn gravity_points_at_the_star() {
        let star = star();
        let g = gravity_at(Vec2::new(50_000.0, 0.0), &star, &[], 1e-2, None);
        assert!(g.x < 0.0 && g.y.abs() < 1e-9);
        let expected = 1e-2 * star.body.mass / (50_000.0f32 * 50_000.0);
        assert!((g.mag() - expected).abs() < expected * 1e-3);
    }

    #[test]
    fn gentle_contact_lands_and_explores() {
        let star = star();
        let mut planets = vec![planet_at(Vec2::new(50_000.0, 0.0), 1_000.0)];
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(51_013.0, 0.0);
        ship.body.velocity = Vec2::new(-120.0, 0.0);
        ship.command(Some(std::f32::consts::PI), Some(0.1));

        let events = step_ship(&mut ship, &star, &mut planets, DT);
        assert_eq!(events, vec![ShipEvent::Landed(PlanetId(0))]);
        let landing = ship.landing.as_ref().unwrap();
        assert_eq!(landing.planet, PlanetId(0));
        assert_eq!(landing.text, "scanning");
        assert!(landing.angle.abs() < 1e-4);
        assert!(planets[0].explored);
        assert_eq!(ship.thrust, Vec2::ZERO);
        assert!((ship.body.pos.x - 51_012.0).abs() < 1e-2);
    }

    #[test]
    fn hard_contact_damages_and_bounces() {
        let star = star();
        let mut planets = vec![planet_at(Vec2::new(50_000.0, 0.0), 1_000.0)];
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(51_020.0, 0.0);
        ship.body.velocity = Vec2::new(-1_200.0, 0.0);

        let events = step_ship(&mut ship, &star, &mut planets, DT);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ShipEvent::Impact { planet, damage } => {
                assert_eq!(*planet, PlanetId(0));
                assert!((damage - 35.0).abs() < 0.5, "damage {damage}");
            }
            other => panic!("expected impact, got {other:?}"),
        }
        assert!(ship.landing.is_none());
        assert!(!planets[0].explored);
        assert!(ship.body.velocity.x > 1_000.0, "bounced {:?}", ship.body.velocity);
        assert!((ship.hull - 65.0).abs() < 0.5);
    }

    #[test]
    fn fatal_impact_destroys() {
        let star = star();
        let mut planets = vec![planet_at(Vec2::new(50_000.0, 0.0), 1_000.0)];
        let mut ship = Spacecraft::new(&config());
        ship.hull = 10.0;
        ship.body.pos = Vec2::new(51_020.0, 0.0);
        ship.body.velocity = Vec2::new(-1_200.0, 0.0);
        let events = step_ship(&mut ship, &star, &mut planets, DT);
        assert_eq!(events, vec![ShipEvent::Destroyed]);
        assert!(ship.destroyed);
        assert_eq!(ship.hull, 0.0);
    }

    #[test]
    fn touching_the_star_destroys() {
        let star = star();
        let mut ship = Spacecraft::new(&config());
        ship.body.pos = Vec2::new(1_005.0, 0.0);
        ship.command(Some(0.0), Some(1.0));
        let events = step_ship(&mut ship, &star, &mut [], DT);
        assert_eq!(events, vec![ShipEvent::Destroyed]);
        assert_eq!(ship.thrust, Vec2::ZERO);
        assert_eq!(ship.body.velocity, Vec2::ZERO);

        let pos = ship.body.pos;
        ship.command(Some(0.0), Some(1.0));
        step_ship(&mut ship, &star, &mut [], DT);
        assert_eq!(ship.body.pos, pos, "a destroyed craft stays put");
    }

    #[test]
    fn landed_ship_refuels_then_lifts_off() {
        let star = star();
        let mut planets = vec![planet_at(Vec2::new(50_000.0, 0.0), 1_000.0)];
        let mut ship = Spacecraft::new(&config());
        ship.fuel = 10.0;
        ship.hull = 50.0;
        ship.body.pos = Vec2::new(51_012.0, 0.0);
        ship.landing = Some(Landing {
            planet: PlanetId(0),
            angle: 0.0,
            text: String::from("resting"),
        });

        for _ in 0..60 {
            assert!(step_ship(&mut ship, &star, &mut planets, DT).is_empty());
        }
        assert!((ship.fuel - 20.0).abs() < 0.05, "fuel {}", ship.fuel);
        assert!((ship.hull - 55.0).abs() < 0.05, "hull {}", ship.hull);
        assert!((ship.body.pos.x - 51_012.0).abs() < 1e-2);

        ship.command(Some(0.0), Some(1.0));
        let events = step_ship(&mut ship, &star, &mut planets, DT);
        assert_eq!(events, vec![ShipEvent::LiftOff(PlanetId(0))]);
        assert!(ship.landing.is_none());
        assert_eq!(ship.launched_from, Some(PlanetId(0)));
        assert!(ship.body.pos.x > 51_012.0);
        assert!(ship.body.velocity.x > 100.0);
    }
}
