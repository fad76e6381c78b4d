// Builders that turn universe state into protocol responses.
//
// Pure functions over `&Universe`; callers hold the read lock. Gravity
// reported here is the pull between the ship and one planet,
// `G * m_ship * m_planet / d²` along the ship-to-planet direction, with a
// zero vector when the two centers coincide.

use space_protocol::{
    AutopilotState, Gravity, LandingState, NearestPlanet, ObserveResponse, PlanetProximity,
    PlanetRecord, ShipState, StarRecord, WorldConfig, WorldResponse,
};
use space_sim::{Planet, Universe, Vec2};

pub const DEFAULT_NEAREST_N: i64 = 3;

/// Distance below which two centers count as coincident.
const MIN_DISTANCE: f32 = 1e-6;

struct Proximity {
    distance: f32,
    altitude: f32,
    pull: Vec2,
}

fn proximity(universe: &Universe, planet: &Planet) -> Proximity {
    let ship = &universe.ship().body;
    let offset = planet.body.pos - ship.pos;
    let distance = offset.mag();
    let altitude = distance - (ship.radius + planet.body.radius);
    let pull = if distance > MIN_DISTANCE {
        let g = universe.config().gravitation * (ship.mass * planet.body.mass)
            / (distance * distance);
        offset / distance * g
    } else {
        Vec2::ZERO
    };
    Proximity {
        distance,
        altitude,
        pull,
    }
}

/// `GET /observe`. `nearest_n` defaults to 3 and is clamped to
/// `[1, max(1, planet count)]`.
pub fn observe(universe: &Universe, nearest_n: Option<i64>) -> ObserveResponse {
    let planets = universe.planets();
    let limit = nearest_n
        .unwrap_or(DEFAULT_NEAREST_N)
        .clamp(1, planets.len().max(1) as i64) as usize;

    let ship = universe.ship();
    let ship_state = ShipState {
        x: ship.body.pos.x.into(),
        y: ship.body.pos.y.into(),
        vx: ship.body.velocity.x.into(),
        vy: ship.body.velocity.y.into(),
        angle: ship.body.angle.into(),
        fuel: ship.fuel.into(),
        fuel_capacity: ship.fuel_capacity.into(),
        hull: ship.hull.into(),
        hull_capacity: ship.hull_capacity.into(),
        thrust: ship.thrust.mag().into(),
        destroyed: ship.destroyed,
    };

    let closest = universe.closest_planet();
    let (nearest_planet, altitude, gravity) = match closest {
        Some((id, planet)) => {
            let near = proximity(universe, planet);
            (
                Some(NearestPlanet {
                    id: id.0,
                    x: planet.body.pos.x.into(),
                    y: planet.body.pos.y.into(),
                    radius: planet.body.radius.into(),
                    mass: planet.body.mass.into(),
                    can_land: planet.body.collides,
                }),
                Some(near.altitude.into()),
                Some(Gravity {
                    gx: near.pull.x.into(),
                    gy: near.pull.y.into(),
                }),
            )
        }
        None => (None, None, None),
    };

    let mut ranked: Vec<(usize, &Planet, Proximity)> = planets
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx, p, proximity(universe, p)))
        .collect();
    ranked.sort_by(|a, b| a.2.distance.total_cmp(&b.2.distance));
    let nearest_planets = ranked
        .into_iter()
        .take(limit)
        .map(|(idx, p, near)| PlanetProximity {
            id: idx,
            x: p.body.pos.x.into(),
            y: p.body.pos.y.into(),
            radius: p.body.radius.into(),
            distance: near.distance.into(),
            altitude: near.altitude.into(),
            gx: near.pull.x.into(),
            gy: near.pull.y.into(),
            vx: p.body.velocity.x.into(),
            vy: p.body.velocity.y.into(),
            mass: p.body.mass.into(),
        })
        .collect();

    let landing = ship.landing.as_ref().map(|l| LandingState {
        planet_id: l.planet.0,
        planet_name: planets
            .get(l.planet.0)
            .map(|p| p.body.name.clone())
            .unwrap_or_default(),
        angle: l.angle.into(),
        text: l.text.clone(),
    });

    let autopilot = universe.autopilot().map(|pilot| AutopilotState {
        enabled: pilot.enabled,
        target: pilot.target.map(|id| id.0),
        strategy: pilot.strategy.label().to_string(),
        telemetry: pilot.telemetry.clone(),
    });

    ObserveResponse {
        now: universe.now().into(),
        ship: ship_state,
        nearest_planet,
        altitude,
        gravity,
        nearest_planet_id: closest.map_or(-1, |(id, _)| id.0 as i64),
        nearest_planets,
        landing,
        autopilot,
        bodies: planets.len() + 1,
    }
}

/// `GET /world`.
pub fn world(universe: &Universe, realtime: bool) -> WorldResponse {
    let star = universe.star();
    let config = universe.config();
    let planets = universe
        .planets()
        .iter()
        .enumerate()
        .map(|(idx, p)| PlanetRecord {
            id: idx,
            name: p.body.name.clone(),
            x: p.body.pos.x.into(),
            y: p.body.pos.y.into(),
            radius: p.body.radius.into(),
            mass: p.body.mass.into(),
            vx: p.body.velocity.x.into(),
            vy: p.body.velocity.y.into(),
            collides: p.body.collides,
            can_land: p.body.collides,
            explored: p.explored,
            description: p.info.description.clone(),
            atmosphere: p.info.atmosphere.clone(),
            flora: p.info.flora.clone(),
            fauna: p.info.fauna.clone(),
        })
        .collect::<Vec<_>>();

    WorldResponse {
        now: universe.now().into(),
        universe_range: config.universe_range,
        config: WorldConfig {
            realtime,
            time_scale: config.time_scale,
        },
        star: StarRecord {
            name: star.body.name.clone(),
            x: star.body.pos.x.into(),
            y: star.body.pos.y.into(),
            vx: star.body.velocity.x.into(),
            vy: star.body.velocity.y.into(),
            radius: star.body.radius.into(),
            mass: star.body.mass.into(),
            class: star.class.letter().to_string(),
            deadly: true,
            collides: false,
            can_land: false,
        },
        bodies: planets.len() + 1,
        explored_count: universe.explored_count(),
        planets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use space_namer::{CatalogNamer, MinimalNamer};
    use space_sim::UniverseConfig;

    fn universe(seed: i64) -> Universe {
        let mut config = UniverseConfig::default();
        config.planet_count_range = (4, 4);
        Universe::generate(Box::new(MinimalNamer), seed, config)
    }

    #[test]
    fn nearest_n_defaults_and_clamps() {
        let u = universe(1);
        assert_eq!(observe(&u, None).nearest_planets.len(), 3);
        assert_eq!(observe(&u, Some(0)).nearest_planets.len(), 1);
        assert_eq!(observe(&u, Some(-5)).nearest_planets.len(), 1);
        assert_eq!(observe(&u, Some(99)).nearest_planets.len(), 4);
    }

    #[test]
    fn nearest_list_is_sorted_and_led_by_nearest_planet() {
        let u = universe(2);
        let obs = observe(&u, Some(4));
        let first = &obs.nearest_planets[0];
        assert_eq!(obs.nearest_planet.as_ref().unwrap().id, first.id);
        assert_eq!(obs.nearest_planet_id, first.id as i64);
        assert_eq!(obs.altitude, Some(first.altitude));
        for pair in obs.nearest_planets.windows(2) {
            assert!(pair[0].distance.value() <= pair[1].distance.value());
        }
        assert_eq!(obs.bodies, 5);
    }

    #[test]
    fn gravity_points_at_the_planet() {
        let u = universe(3);
        let obs = observe(&u, Some(1));
        let near = &obs.nearest_planets[0];
        let g = obs.gravity.unwrap();
        let to_planet = (near.x.value() - obs.ship.x.value(), near.y.value() - obs.ship.y.value());
        let dot = g.gx.value() * to_planet.0 + g.gy.value() * to_planet.1;
        assert!(dot >= 0.0);
    }

    #[test]
    fn empty_system_reports_nulls() {
        let u = Universe::new(Box::new(MinimalNamer), 9);
        let obs = observe(&u, None);
        assert!(obs.nearest_planet.is_none());
        assert!(obs.altitude.is_none());
        assert!(obs.gravity.is_none());
        assert_eq!(obs.nearest_planet_id, -1);
        assert!(obs.nearest_planets.is_empty());
        assert_eq!(obs.bodies, 1);
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains(r#""nearestPlanet":null,"altitude":null,"nearestPlanetId":-1"#));
    }

    #[test]
    fn autopilot_block_appears_once_engaged() {
        let mut u = universe(4);
        assert!(observe(&u, None).autopilot.is_none());
        u.set_autopilot(true);
        let pilot = observe(&u, None).autopilot.unwrap();
        assert!(pilot.enabled);
        assert_eq!(pilot.strategy, "idle");
    }

    #[test]
    fn world_lists_star_and_planets() {
        let u = Universe::generate(Box::new(CatalogNamer::default()), 5, UniverseConfig::default());
        let w = world(&u, true);
        assert!(w.config.realtime);
        assert_eq!(w.planets.len(), u.planets().len());
        assert_eq!(w.bodies, u.planets().len() + 1);
        assert_eq!(w.star.name, u.star().body.name);
        assert_eq!(w.star.class.len(), 1);
        assert!(w.star.deadly && !w.star.can_land && !w.star.collides);
        assert_eq!(w.explored_count, 0);
        for (idx, p) in w.planets.iter().enumerate() {
            assert_eq!(p.id, idx);
            assert!(p.can_land);
            assert!(!p.explored);
            assert!(!p.description.is_empty());
        }
    }

    #[test]
    fn identical_universes_render_identical_bytes() {
        let a = universe(77);
        let b = universe(77);
        assert_eq!(
            serde_json::to_string(&observe(&a, None)).unwrap(),
            serde_json::to_string(&observe(&b, None)).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&world(&a, false)).unwrap(),
            serde_json::to_string(&world(&b, false)).unwrap()
        );
    }
}
