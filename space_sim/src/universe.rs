// The universe aggregate: one star system plus the kernel that drives it.
//
// `StarSystem` is the kernel's `World`: it owns the star, the planets, the
// spacecraft, the optional autopilot, the ring-fence container, the namer and
// the config, and dispatches `update`/`solve`/`post_update` by key. Entity
// order is fixed at generation time: star, planets in orbit order, ship, then
// the autopilot once engaged. That order is part of the determinism
// contract.
//
// `Universe` pairs a `StarSystem` with its `Simulator` and the seed. It is
// the type the control server and the binary hold. Generation
// (`init_random`) draws everything from the simulator's RNG in a fixed
// order: star class, star radius, system name, planet count, then for each
// planet orbit radius, orbit angle, radius, and descriptive text. Planets
// are then sorted by orbit radius and named "<system> <n>".
//
// See also: `physics.rs` for the step pipeline, `bodies.rs` for per-body
// behavior, `autopilot.rs` for the pilot's decision cycle.

use space_namer::{Namer, PlanetInfo};
use std::f32::consts::TAU;
use tracing::debug;

use crate::autopilot::Autopilot;
use crate::bodies::{
    Planet, PlanetId, ShipEvent, Spacecraft, Star, StarClass, disc_mass, orbital_speed,
};
use crate::config::UniverseConfig;
use crate::physics::{
    Body, Container, ListenerHandle, Simulator, StepInfo, StepOutcome, World, WorldContext,
};
use crate::vec2::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKey {
    Star,
    Planet(PlanetId),
    Ship,
    Autopilot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKey {
    Ringfence,
}

/// Everything that lives in the simulated system.
pub struct StarSystem {
    star: Star,
    planets: Vec<Planet>,
    ship: Spacecraft,
    autopilot: Option<Autopilot>,
    ringfence: Container<EntityKey>,
    namer: Box<dyn Namer>,
    config: UniverseConfig,
}

impl std::fmt::Debug for StarSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarSystem")
            .field("star", &self.star.body.name)
            .field("planets", &self.planets.len())
            .field("ship", &self.ship.body.pos)
            .field("autopilot", &self.autopilot.as_ref().map(|a| a.enabled))
            .finish()
    }
}

impl StarSystem {
    fn empty(namer: Box<dyn Namer>, config: UniverseConfig) -> Self {
        let star = Star::new("Unknown", StarClass::G, config.star_radius_range.0, config.star_density);
        Self {
            star,
            planets: Vec::new(),
            ship: Spacecraft::new(&config),
            autopilot: None,
            ringfence: Container::new(config.universe_range),
            namer,
            config,
        }
    }

    pub fn star(&self) -> &Star {
        &self.star
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id.0)
    }

    pub fn ship(&self) -> &Spacecraft {
        &self.ship
    }

    pub fn autopilot(&self) -> Option<&Autopilot> {
        self.autopilot.as_ref()
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// The planet whose center is nearest the ship.
    pub fn closest_planet(&self) -> Option<(PlanetId, &Planet)> {
        let ship = self.ship.body.pos;
        self.planets
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.body
                    .pos
                    .distance(ship)
                    .total_cmp(&b.body.pos.distance(ship))
            })
            .map(|(idx, p)| (PlanetId(idx), p))
    }

    fn body_mut(&mut self, key: EntityKey) -> Option<&mut Body> {
        match key {
            EntityKey::Star => Some(&mut self.star.body),
            EntityKey::Planet(id) => self.planets.get_mut(id.0).map(|p| &mut p.body),
            EntityKey::Ship => Some(&mut self.ship.body),
            EntityKey::Autopilot => None,
        }
    }

    fn log_ship_event(&self, event: &ShipEvent) {
        let planet_name = |id: &PlanetId| {
            self.planets
                .get(id.0)
                .map(|p| p.body.name.clone())
                .unwrap_or_default()
        };
        match event {
            ShipEvent::Landed(id) => debug!(
                planet = %planet_name(id),
                activity = self.ship.landing.as_ref().map(|l| l.text.as_str()).unwrap_or(""),
                "craft landed"
            ),
            ShipEvent::LiftOff(id) => debug!(planet = %planet_name(id), "craft lifted off"),
            ShipEvent::Impact { planet, damage } => debug!(
                planet = %planet_name(planet),
                damage = *damage,
                hull = self.ship.hull,
                "craft hit a planet"
            ),
            ShipEvent::Destroyed => debug!(pos = ?self.ship.body.pos, "craft destroyed"),
        }
    }
}

impl World for StarSystem {
    type EntityKey = EntityKey;
    type ConstraintKey = ConstraintKey;

    fn update(&mut self, key: EntityKey, _ctx: &mut WorldContext<'_, Self>, dt: f32) {
        match key {
            EntityKey::Star => self.star.update(dt),
            EntityKey::Planet(id) => {
                if let Some(planet) = self.planets.get_mut(id.0) {
                    planet.update(dt);
                }
            }
            EntityKey::Ship => {
                if let Some(event) = self.ship.update(&self.star, &self.planets, &self.config, dt) {
                    self.log_ship_event(&event);
                }
            }
            EntityKey::Autopilot => {}
        }
    }

    fn solve(&mut self, key: ConstraintKey, _ctx: &mut WorldContext<'_, Self>, _dt: f32) {
        match key {
            ConstraintKey::Ringfence => {
                let fence = self.ringfence.clone();
                for &member in fence.members() {
                    if let Some(body) = self.body_mut(member) {
                        fence.confine(body);
                    }
                }
            }
        }
    }

    fn post_update(&mut self, key: EntityKey, ctx: &mut WorldContext<'_, Self>, dt: f32) {
        match key {
            EntityKey::Star => self.star.post_update(dt),
            EntityKey::Planet(id) => {
                if let Some(planet) = self.planets.get_mut(id.0) {
                    planet.post_update(dt);
                }
            }
            EntityKey::Ship => {
                let event = self.ship.post_update(
                    &self.star,
                    &mut self.planets,
                    self.namer.as_mut(),
                    ctx.rng,
                    &self.config,
                    dt,
                );
                if let Some(event) = event {
                    self.log_ship_event(&event);
                }
            }
            EntityKey::Autopilot => {
                if let Some(pilot) = self.autopilot.as_mut() {
                    pilot.steer(ctx.now, &mut self.ship, &self.star, &self.planets, &self.config);
                }
            }
        }
    }
}

/// A seeded star system and the kernel that advances it.
#[derive(Debug)]
pub struct Universe {
    sim: Simulator<StarSystem>,
    system: StarSystem,
    seed: i64,
}

impl Universe {
    /// An empty universe with default config. Call `init_random` to
    /// populate it.
    pub fn new(namer: Box<dyn Namer>, seed: i64) -> Self {
        Self::with_config(namer, seed, UniverseConfig::default())
    }

    pub fn with_config(namer: Box<dyn Namer>, seed: i64, config: UniverseConfig) -> Self {
        let sim = Simulator::new(seed, config.time_scale, config.max_valid_dt);
        Self {
            sim,
            system: StarSystem::empty(namer, config),
            seed,
        }
    }

    /// `with_config` followed by `init_random`.
    pub fn generate(namer: Box<dyn Namer>, seed: i64, config: UniverseConfig) -> Self {
        let mut universe = Self::with_config(namer, seed, config);
        universe.init_random();
        universe
    }

    /// Populate the star, planets and ship from the seed, replacing whatever
    /// was there, and register them with the kernel.
    pub fn init_random(&mut self) {
        let config = self.system.config.clone();
        let rng = self.sim.rng_mut();
        let namer = self.system.namer.as_mut();

        let class = *rng.choose(&StarClass::ALL).unwrap_or(&StarClass::G);
        let star_radius = rng.range_f32(config.star_radius_range.0, config.star_radius_range.1);
        let system_name = namer.name_system(rng);
        let star = Star::new(system_name.clone(), class, star_radius, config.star_density);

        let (min_planets, max_planets) = config.planet_count_range;
        let count = rng.range_usize_inclusive(min_planets as usize, max_planets as usize);
        let mut planets = Vec::with_capacity(count);
        for _ in 0..count {
            let orbit = rng.range_f32(config.planet_orbit_range.0, config.planet_orbit_range.1);
            let orbit_angle = rng.range_f32(0.0, TAU);
            let radius = rng.range_f32(config.planet_radius_range.0, config.planet_radius_range.1);
            let info = PlanetInfo {
                description: namer.describe_planet(rng),
                atmosphere: namer.describe_atmo(rng),
                flora: namer.describe_life(rng),
                fauna: namer.describe_life(rng),
            };
            let mut body = Body::new("");
            body.pos = Vec2::make_with_angle_mag(orbit_angle, orbit);
            body.prev_pos = body.pos;
            body.radius = radius;
            body.mass = disc_mass(config.planet_density, radius);
            let speed = orbital_speed(orbit, star.body.mass, config.kepler_constant);
            planets.push(Planet::orbiting(body, star.body.pos, speed, info));
        }
        planets.sort_by(|a, b| a.orbit_radius.total_cmp(&b.orbit_radius));
        for (idx, planet) in planets.iter_mut().enumerate() {
            planet.body.name = format!("{system_name} {}", idx + 1);
        }

        let mut ship = Spacecraft::new(&config);
        let spawn_angle = rng.range_f32(0.0, TAU);
        ship.body.pos = Vec2::make_with_angle_mag(spawn_angle, config.craft_spawn_distance);
        ship.body.prev_pos = ship.body.pos;
        ship.body.angle = spawn_angle + std::f32::consts::PI;
        ship.body.prev_angle = ship.body.angle;

        debug!(
            seed = self.seed,
            system = %system_name,
            class = %class,
            planets = planets.len(),
            "generated star system"
        );

        self.system.star = star;
        self.system.planets = planets;
        self.system.ship = ship;
        self.system.autopilot = None;
        self.system.ringfence = Container::new(config.universe_range);
        self.system.ringfence.add(EntityKey::Ship);

        self.sim.clear_registrations();
        self.sim.add_entity(EntityKey::Star);
        for idx in 0..self.system.planets.len() {
            self.sim.add_entity(EntityKey::Planet(PlanetId(idx)));
        }
        self.sim.add_entity(EntityKey::Ship);
        self.sim.add_constraint(ConstraintKey::Ringfence);
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn now(&self) -> f32 {
        self.sim.now()
    }

    pub fn dt(&self) -> f32 {
        self.sim.dt()
    }

    pub fn system(&self) -> &StarSystem {
        &self.system
    }

    pub fn star(&self) -> &Star {
        self.system.star()
    }

    pub fn planets(&self) -> &[Planet] {
        self.system.planets()
    }

    pub fn ship(&self) -> &Spacecraft {
        self.system.ship()
    }

    pub fn ship_mut(&mut self) -> &mut Spacecraft {
        &mut self.system.ship
    }

    pub fn autopilot(&self) -> Option<&Autopilot> {
        self.system.autopilot()
    }

    pub fn config(&self) -> &UniverseConfig {
        self.system.config()
    }

    pub fn closest_planet(&self) -> Option<(PlanetId, &Planet)> {
        self.system.closest_planet()
    }

    pub fn explored_count(&self) -> usize {
        self.system.planets.iter().filter(|p| p.explored).count()
    }

    /// Catalog header for this system, e.g. `UDC-42`.
    pub fn system_designation(&self) -> String {
        format!("UDC-{}", self.seed % 100_000)
    }

    /// Advance to wall-clock time `nanos`.
    pub fn step(&mut self, nanos: i64) -> StepOutcome {
        self.sim.step(nanos, &mut self.system)
    }

    /// Manual control. Ignored while the autopilot is flying.
    pub fn command(&mut self, angle: Option<f32>, thrust: Option<f32>) {
        if self.system.autopilot.as_ref().is_some_and(|a| a.enabled) {
            return;
        }
        self.system.ship.command(angle, thrust);
    }

    /// Engage or disengage the autopilot. Disengaging zeroes the ship's
    /// thrust immediately.
    pub fn set_autopilot(&mut self, enabled: bool) {
        if enabled {
            self.system
                .autopilot
                .get_or_insert_with(Autopilot::new)
                .engage();
            self.sim.add_entity(EntityKey::Autopilot);
        } else {
            if let Some(pilot) = self.system.autopilot.as_mut() {
                pilot.disengage(&mut self.system.ship);
            }
            self.sim.remove_entity(EntityKey::Autopilot);
        }
    }

    pub fn autopilot_enabled(&self) -> bool {
        self.system.autopilot.as_ref().is_some_and(|a| a.enabled)
    }

    pub fn add_step_listener(
        &mut self,
        listener: impl FnMut(&StarSystem, &StepInfo) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.sim.add_step_listener(listener)
    }

    pub fn remove_step_listener(&mut self, handle: ListenerHandle) -> bool {
        self.sim.remove_step_listener(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use space_namer::{CatalogNamer, MinimalNamer};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FRAME: i64 = 16_666_667;

    fn minimal(seed: i64) -> Universe {
        Universe::generate(Box::new(MinimalNamer), seed, UniverseConfig::default())
    }

    /// Prime the clock and run `frames` 60 Hz steps.
    fn run(universe: &mut Universe, start: i64, frames: i64) -> i64 {
        let mut t = start;
        universe.step(t);
        for _ in 0..frames {
            t += FRAME;
            universe.step(t);
        }
        t
    }

    #[test]
    fn stepping_increases_sim_time() {
        let mut u = minimal(1);
        let start = u.now();
        run(&mut u, 1_000_000, 10);
        assert!(u.now() > start);
        assert!((u.now() - 10.0 / 60.0).abs() < 1e-4);
    }

    #[test]
    fn init_random_creates_ship_and_planets() {
        let u = minimal(42);
        let cfg = UniverseConfig::default();
        let n = u.planets().len() as u32;
        assert!((cfg.planet_count_range.0..=cfg.planet_count_range.1).contains(&n));
        assert!(u.star().body.radius >= cfg.star_radius_range.0);
        assert!((u.ship().body.pos.mag() - cfg.craft_spawn_distance).abs() < 1.0);
        assert_eq!(u.ship().fuel, cfg.fuel_capacity);
    }

    #[test]
    fn planets_are_sorted_and_named_by_orbit() {
        let u = Universe::generate(Box::new(CatalogNamer::default()), 7, UniverseConfig::default());
        let star_name = &u.star().body.name;
        for (idx, planet) in u.planets().iter().enumerate() {
            assert_eq!(planet.body.name, format!("{star_name} {}", idx + 1));
            assert!(!planet.info.description.is_empty());
        }
        for pair in u.planets().windows(2) {
            assert!(pair[0].orbit_radius <= pair[1].orbit_radius);
        }
    }

    #[test]
    fn same_seed_same_layout_and_trajectory() {
        let mut a = Universe::generate(Box::new(CatalogNamer::default()), 99, UniverseConfig::default());
        let mut b = Universe::generate(Box::new(CatalogNamer::default()), 99, UniverseConfig::default());
        assert_eq!(a.star().body.name, b.star().body.name);
        for (pa, pb) in a.planets().iter().zip(b.planets()) {
            assert_eq!(pa.body.pos, pb.body.pos);
            assert_eq!(pa.info, pb.info);
        }
        a.command(Some(0.7), Some(0.8));
        b.command(Some(0.7), Some(0.8));
        run(&mut a, 1_000_000, 120);
        run(&mut b, 1_000_000, 120);
        assert_eq!(a.ship().body.pos, b.ship().body.pos);
        assert_eq!(a.ship().fuel, b.ship().fuel);
        assert_eq!(a.now(), b.now());
    }

    #[test]
    fn different_seeds_differ() {
        let a = minimal(1);
        let b = minimal(2);
        assert_ne!(a.ship().body.pos, b.ship().body.pos);
    }

    #[test]
    fn repeated_timestamp_changes_nothing() {
        let mut u = minimal(5);
        let t = run(&mut u, 1_000_000, 30);
        let pos = u.ship().body.pos;
        let planets: Vec<Vec2> = u.planets().iter().map(|p| p.body.pos).collect();
        u.step(t);
        assert_eq!(u.ship().body.pos, pos);
        assert_eq!(
            u.planets().iter().map(|p| p.body.pos).collect::<Vec<_>>(),
            planets
        );
    }

    #[test]
    fn closest_planet_is_nearest_center() {
        let mut u = minimal(3);
        let target = u.planets()[0].body.pos;
        let offset = u.planets()[0].body.radius + 50.0;
        u.ship_mut().body.pos = target + target.normalized() * offset;
        let (id, planet) = u.closest_planet().unwrap();
        assert_eq!(id, PlanetId(0));
        assert_eq!(planet.body.pos, target);
    }

    #[test]
    fn closest_planet_none_without_planets() {
        let u = Universe::new(Box::new(MinimalNamer), 1);
        assert!(u.closest_planet().is_none());
    }

    #[test]
    fn ringfence_keeps_ship_inside() {
        let mut u = minimal(8);
        let range = u.config().universe_range;
        u.ship_mut().body.pos = Vec2::new(range - 20.0, 0.0);
        u.ship_mut().body.velocity = Vec2::new(4_000.0, 0.0);
        run(&mut u, 1_000_000, 30);
        assert!(u.ship().body.pos.mag() + u.ship().body.radius <= range + 0.5);
    }

    #[test]
    fn listeners_see_each_step_and_can_be_removed() {
        let mut u = minimal(4);
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let handle = u.add_step_listener(move |system, info| {
            assert!(info.now > 0.0);
            assert!(!system.planets().is_empty());
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let t = run(&mut u, 1_000_000, 5);
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(u.remove_step_listener(handle));
        run(&mut u, t + FRAME, 5);
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn autopilot_toggle_registers_and_zeroes_thrust() {
        let mut u = minimal(11);
        u.set_autopilot(true);
        assert!(u.autopilot_enabled());
        assert!(u.sim.contains_entity(EntityKey::Autopilot));
        run(&mut u, 1_000_000, 3);
        assert!(u.ship().thrust.mag() > 0.0);
        assert!(u.autopilot().unwrap().telemetry.starts_with("---- AUTOPILOT ENGAGED ----"));

        u.set_autopilot(false);
        assert_eq!(u.ship().thrust, Vec2::ZERO);
        assert!(!u.autopilot_enabled());
        assert!(!u.sim.contains_entity(EntityKey::Autopilot));
        assert!(u.autopilot().unwrap().telemetry.is_empty());
    }

    #[test]
    fn manual_command_ignored_while_autopilot_flies() {
        let mut u = minimal(12);
        u.set_autopilot(true);
        let before = u.ship().body.angle;
        u.command(Some(before + 1.0), Some(0.5));
        assert_eq!(u.ship().body.angle, before);
        assert_eq!(u.ship().thrust, Vec2::ZERO);
        u.set_autopilot(false);
        u.command(Some(1.0), Some(0.5));
        assert!((u.ship().thrust.mag() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn autopilot_lands_on_a_nearby_planet() {
        let mut u = minimal(21);
        let planet = u.planets()[0].clone();
        let outward = planet.body.pos.normalized();
        let start = planet.body.pos + outward * (planet.body.radius + 3_000.0);
        let ship = u.ship_mut();
        ship.body.pos = start;
        ship.body.prev_pos = start;
        u.set_autopilot(true);

        let mut t = 1_000_000;
        u.step(t);
        let mut landed = false;
        for _ in 0..(60 * 60) {
            t += FRAME;
            u.step(t);
            if u.ship().landing.is_some() {
                landed = true;
                break;
            }
        }
        assert!(landed, "autopilot never landed; telemetry: {}", u.autopilot().unwrap().telemetry);
        assert!(u.explored_count() >= 1);
        assert!(!u.ship().destroyed);
        assert_eq!(u.ship().hull, u.ship().hull_capacity);
    }

    #[test]
    fn system_designation_uses_seed() {
        assert_eq!(Universe::new(Box::new(MinimalNamer), 42).system_designation(), "UDC-42");
        assert_eq!(
            Universe::new(Box::new(MinimalNamer), 1_234_567).system_designation(),
            "UDC-34567"
        );
    }
}
