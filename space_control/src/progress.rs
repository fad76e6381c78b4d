// Periodic craft status for the console.
//
// A `ProgressTracker` is fed every completed step and, at most once per
// simulated second, classifies what the craft is doing: landed, flying to
// an autopilot target (with distance, ETA and how much of the leg is done),
// waiting for the autopilot to pick a target, or under manual control.
// `listener` wraps a tracker as a step listener that logs each report at
// `debug!`.

use std::fmt;

use space_sim::{PlanetId, StarSystem, StepInfo};
use tracing::debug;

/// Simulated seconds between reports.
pub const UPDATE_INTERVAL: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    Landed {
        planet: String,
        activity: String,
    },
    EnRoute {
        planet: String,
        strategy: &'static str,
        /// Distance to the target's surface.
        distance: f32,
        eta: Option<f32>,
        /// Share of the leg covered since the target was picked, `[0, 1]`.
        fraction: f32,
    },
    Selecting,
    Manual,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Landed { planet, activity } => {
                write!(f, "landed: {planet}; currently: {activity}")
            }
            Progress::EnRoute {
                planet,
                strategy,
                distance,
                eta,
                ..
            } => {
                write!(f, "headed to: {planet}; autopilot is {strategy}; dist: {distance:.0}u // eta: ")?;
                match eta {
                    Some(eta) => write!(f, "{eta:.0}s"),
                    None => f.write_str("???"),
                }
            }
            Progress::Selecting => f.write_str("in space; selecting new target..."),
            Progress::Manual => f.write_str("in space; under manual control"),
        }
    }
}

#[derive(Debug)]
pub struct ProgressTracker {
    designation: String,
    last_update: f32,
    leg: Option<(PlanetId, f32)>,
}

impl ProgressTracker {
    pub fn new(designation: impl Into<String>) -> Self {
        Self {
            designation: designation.into(),
            last_update: 0.0,
            leg: None,
        }
    }

    pub fn designation(&self) -> &str {
        &self.designation
    }

    /// A report if at least `UPDATE_INTERVAL` has passed since the last one.
    pub fn observe(&mut self, system: &StarSystem, now: f32) -> Option<Progress> {
        if now - self.last_update < UPDATE_INTERVAL {
            return None;
        }
        self.last_update = now;
        let ship = system.ship();

        if let Some(landing) = &ship.landing {
            self.leg = None;
            let planet = system
                .planet(landing.planet)
                .map(|p| p.body.name.clone())
                .unwrap_or_default();
            return Some(Progress::Landed {
                planet,
                activity: landing.text.clone(),
            });
        }

        let Some(pilot) = system.autopilot().filter(|a| a.enabled) else {
            self.leg = None;
            return Some(Progress::Manual);
        };
        let Some((id, target)) = pilot.target.and_then(|id| system.planet(id).map(|p| (id, p))) else {
            self.leg = None;
            return Some(Progress::Selecting);
        };

        let distance = ((target.body.pos - ship.body.pos).mag() - target.body.radius).max(0.0);
        let initial = match self.leg {
            Some((leg_target, initial)) if leg_target == id => initial,
            _ => {
                self.leg = Some((id, distance));
                distance
            }
        };
        let speed = ship.body.velocity.mag();
        Some(Progress::EnRoute {
            planet: target.body.name.clone(),
            strategy: pilot.strategy.label(),
            distance,
            eta: (speed > 0.0).then(|| distance / speed),
            fraction: if initial > 0.0 {
                ((initial - distance) / initial).clamp(0.0, 1.0)
            } else {
                1.0
            },
        })
    }
}

/// A step listener that logs a progress line about once per simulated
/// second.
pub fn listener(designation: String) -> impl FnMut(&StarSystem, &StepInfo) + Send + Sync + 'static {
    let mut tracker = ProgressTracker::new(designation);
    move |system, info| {
        if let Some(progress) = tracker.observe(system, info.now) {
            let ship = system.ship();
            debug!(
                system = tracker.designation(),
                x = ship.body.pos.x,
                y = ship.body.pos.y,
                fuel = ship.fuel,
                hull = ship.hull,
                landed = ship.landing.is_some(),
                "{progress}"
            );
        }
    }
}
