// Fixed-step simulation kernel.
//
// The kernel is purely mechanical: it knows nothing about stars or ships.
// A `World` owns the actual state and exposes it through opaque entity and
// constraint keys; the `Simulator` owns the ordered key sets, the clock, the
// seeded RNG, and the step-listener table, and drives one step as:
//
//   1. convert the wall-clock `nanos` into `dt` (first call only calibrates,
//      over-long or backwards gaps are skipped but still re-baseline),
//   2. `now += dt`, then snapshot the entity and constraint keys,
//   3. `update` every snapshot entity, `solve` every snapshot constraint,
//      `post_update` every snapshot entity, all in insertion order,
//   4. apply registrations queued on the `StepContext` during the step,
//   5. notify listeners in registration order.
//
// Entities added or removed while a step runs therefore never affect that
// step's iteration. Listener handles carry a generation so a stale handle
// can never remove a listener that reused its slot.
//
// `Body` holds the generic kinematic state and the default integration:
// `update` caches the previous position and moves by `velocity * dt`;
// `post_update` recomputes velocity from the actual position change, so any
// correction a constraint made between the two shows up in the velocity.
// `Container` is the one constraint: it keeps member bodies inside a circle
// around the origin.
//
// No logging happens here; this runs every frame.

use serde::{Deserialize, Serialize};
use space_prng::SpaceRng;
use std::fmt;

use crate::vec2::Vec2;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// The kinematic state every simulated object carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub name: String,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub angle: f32,
    pub prev_angle: f32,
    pub radius: f32,
    pub collides: bool,
}

impl Default for Body {
    fn default() -> Self {
        Self::new("Unknown")
    }
}

impl Body {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pos: Vec2::ZERO,
            prev_pos: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mass: 0.0,
            angle: 0.0,
            prev_angle: 0.0,
            radius: 0.0,
            collides: true,
        }
    }

    /// Default entity `update`: cache the previous state and integrate.
    pub fn integrate(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.prev_pos = self.pos;
        self.prev_angle = self.angle;
        self.pos += self.velocity * dt;
    }

    /// Default entity `post_update`: derive velocity from the position delta.
    pub fn derive_velocity(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.velocity = (self.pos - self.prev_pos) / dt;
    }

    /// Move to `pos` and set `prev_pos` so the next `derive_velocity` yields
    /// `velocity`. Used when domain logic teleports a body mid-step.
    pub fn place(&mut self, pos: Vec2, velocity: Vec2, dt: f32) {
        self.pos = pos;
        self.velocity = velocity;
        self.prev_pos = if dt > 0.0 { pos - velocity * dt } else { pos };
    }
}

/// Keeps member bodies within `radius` of the origin.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Container<K> {
    radius: f32,
    softness: f32,
    members: Vec<K>,
}

impl<K: Copy + PartialEq> Container<K> {
    /// A rigid container.
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            softness: 0.0,
            members: Vec::new(),
        }
    }

    /// Blend factor toward the unconstrained position, clamped to `[0, 1]`.
    /// Zero is fully rigid.
    pub fn with_softness(mut self, softness: f32) -> Self {
        self.softness = softness.clamp(0.0, 1.0);
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn softness(&self) -> f32 {
        self.softness
    }

    pub fn members(&self) -> &[K] {
        &self.members
    }

    /// Returns `false` if `member` was already present.
    pub fn add(&mut self, member: K) -> bool {
        if self.members.contains(&member) {
            return false;
        }
        self.members.push(member);
        true
    }

    pub fn remove(&mut self, member: K) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != member);
        self.members.len() != before
    }

    /// Pull `body` back onto the boundary if it pokes out. Returns whether
    /// it was moved.
    pub fn confine(&self, body: &mut Body) -> bool {
        if body.pos.mag() + body.radius <= self.radius {
            return false;
        }
        let edge = Vec2::make_with_angle_mag(body.pos.angle(), self.radius - body.radius);
        body.pos = body.pos * self.softness + edge * (1.0 - self.softness);
        true
    }
}

/// State the kernel drives. Keys are cheap handles into the world's own
/// storage; the kernel only orders and snapshots them.
pub trait World: Sized {
    type EntityKey: Copy + PartialEq + fmt::Debug;
    type ConstraintKey: Copy + PartialEq + fmt::Debug;

    fn update(&mut self, key: Self::EntityKey, ctx: &mut WorldContext<'_, Self>, dt: f32);
    fn solve(&mut self, key: Self::ConstraintKey, ctx: &mut WorldContext<'_, Self>, dt: f32);
    fn post_update(&mut self, key: Self::EntityKey, ctx: &mut WorldContext<'_, Self>, dt: f32);
}

pub type WorldContext<'a, W> =
    StepContext<'a, <W as World>::EntityKey, <W as World>::ConstraintKey>;

/// A registration change requested during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Registration<E, C> {
    AddEntity(E),
    RemoveEntity(E),
    AddConstraint(C),
    RemoveConstraint(C),
}

/// What a world sees of the kernel while a step is running.
pub struct StepContext<'a, E, C> {
    pub now: f32,
    pub rng: &'a mut SpaceRng,
    pending: &'a mut Vec<Registration<E, C>>,
}

impl<E, C> StepContext<'_, E, C> {
    /// Queue an entity; it joins from the next step on.
    pub fn add_entity(&mut self, key: E) {
        self.pending.push(Registration::AddEntity(key));
    }

    pub fn remove_entity(&mut self, key: E) {
        self.pending.push(Registration::RemoveEntity(key));
    }

    pub fn add_constraint(&mut self, key: C) {
        self.pending.push(Registration::AddConstraint(key));
    }

    pub fn remove_constraint(&mut self, key: C) {
        self.pending.push(Registration::RemoveConstraint(key));
    }
}

/// Passed to step listeners after every completed step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepInfo {
    pub now: f32,
    pub dt: f32,
}

/// Result of one `Simulator::step` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// First call: only the clock baseline was recorded.
    Calibrated,
    /// The gap was negative or longer than the valid maximum.
    Skipped { dt: f32 },
    Advanced { dt: f32 },
}

pub type StepListener<W> = Box<dyn FnMut(&W, &StepInfo) + Send + Sync>;

/// Revocation token returned by `Simulator::add_step_listener`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    slot: usize,
    generation: u32,
}

struct ListenerSlot<W> {
    generation: u32,
    listener: Option<StepListener<W>>,
}

pub struct Simulator<W: World> {
    entities: Vec<W::EntityKey>,
    constraints: Vec<W::ConstraintKey>,
    now: f32,
    dt: f32,
    last_nanos: Option<i64>,
    time_scale: f32,
    max_valid_dt: f32,
    rng: SpaceRng,
    listeners: Vec<ListenerSlot<W>>,
}

impl<W: World> fmt::Debug for Simulator<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("entities", &self.entities)
            .field("constraints", &self.constraints)
            .field("now", &self.now)
            .field("dt", &self.dt)
            .field("last_nanos", &self.last_nanos)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<W: World> Simulator<W> {
    pub fn new(seed: i64, time_scale: f32, max_valid_dt: f32) -> Self {
        Self {
            entities: Vec::new(),
            constraints: Vec::new(),
            now: 0.0,
            dt: 0.0,
            last_nanos: None,
            time_scale,
            max_valid_dt,
            rng: SpaceRng::from_signed(seed),
            listeners: Vec::new(),
        }
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    /// The delta computed by the most recent step call, even if skipped.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn rng_mut(&mut self) -> &mut SpaceRng {
        &mut self.rng
    }

    pub fn entities(&self) -> &[W::EntityKey] {
        &self.entities
    }

    pub fn constraints(&self) -> &[W::ConstraintKey] {
        &self.constraints
    }

    /// Register an entity. Returns `false` if it was already registered.
    pub fn add_entity(&mut self, key: W::EntityKey) -> bool {
        if self.entities.contains(&key) {
            return false;
        }
        self.entities.push(key);
        true
    }

    pub fn remove_entity(&mut self, key: W::EntityKey) -> bool {
        let before = self.entities.len();
        self.entities.retain(|k| *k != key);
        self.entities.len() != before
    }

    pub fn contains_entity(&self, key: W::EntityKey) -> bool {
        self.entities.contains(&key)
    }

    pub fn add_constraint(&mut self, key: W::ConstraintKey) -> bool {
        if self.constraints.contains(&key) {
            return false;
        }
        self.constraints.push(key);
        true
    }

    pub fn remove_constraint(&mut self, key: W::ConstraintKey) -> bool {
        let before = self.constraints.len();
        self.constraints.retain(|k| *k != key);
        self.constraints.len() != before
    }

    /// Drop every entity and constraint registration. Clock, RNG and
    /// listeners are untouched.
    pub fn clear_registrations(&mut self) {
        self.entities.clear();
        self.constraints.clear();
    }

    pub fn add_step_listener(
        &mut self,
        listener: impl FnMut(&W, &StepInfo) + Send + Sync + 'static,
    ) -> ListenerHandle {
        let listener: StepListener<W> = Box::new(listener);
        if let Some(slot) = self.listeners.iter().position(|s| s.listener.is_none()) {
            let entry = &mut self.listeners[slot];
            entry.generation = entry.generation.wrapping_add(1);
            entry.listener = Some(listener);
            return ListenerHandle {
                slot,
                generation: entry.generation,
            };
        }
        self.listeners.push(ListenerSlot {
            generation: 0,
            listener: Some(listener),
        });
        ListenerHandle {
            slot: self.listeners.len() - 1,
            generation: 0,
        }
    }

    /// Returns `true` the first time a live handle is removed, `false` for
    /// stale or already-removed handles.
    pub fn remove_step_listener(&mut self, handle: ListenerHandle) -> bool {
        match self.listeners.get_mut(handle.slot) {
            Some(entry) if entry.generation == handle.generation && entry.listener.is_some() => {
                entry.listener = None;
                true
            }
            _ => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .iter()
            .filter(|s| s.listener.is_some())
            .count()
    }

    /// Advance the world to wall-clock time `nanos`.
    pub fn step(&mut self, nanos: i64, world: &mut W) -> StepOutcome {
        let Some(last) = self.last_nanos.replace(nanos) else {
            return StepOutcome::Calibrated;
        };
        let elapsed = nanos.saturating_sub(last) as f64 / NANOS_PER_SECOND;
        let dt = (elapsed * f64::from(self.time_scale)) as f32;
        self.dt = dt;
        if dt < 0.0 || dt > self.max_valid_dt {
            return StepOutcome::Skipped { dt };
        }
        self.now += dt;

        let entities = self.entities.clone();
        let constraints = self.constraints.clone();
        let mut pending = Vec::new();
        {
            let mut ctx = StepContext {
                now: self.now,
                rng: &mut self.rng,
                pending: &mut pending,
            };
            for &key in &entities {
                world.update(key, &mut ctx, dt);
            }
            for &key in &constraints {
                world.solve(key, &mut ctx, dt);
            }
            for &key in &entities {
                world.post_update(key, &mut ctx, dt);
            }
        }
        for change in pending {
            match change {
                Registration::AddEntity(k) => {
                    self.add_entity(k);
                }
                Registration::RemoveEntity(k) => {
                    self.remove_entity(k);
                }
                Registration::AddConstraint(k) => {
                    self.add_constraint(k);
                }
                Registration::RemoveConstraint(k) => {
                    self.remove_constraint(k);
                }
            }
        }

        let info = StepInfo { now: self.now, dt };
        for entry in &mut self.listeners {
            if let Some(listener) = entry.listener.as_mut() {
                listener(&*world, &info);
            }
        }
        StepOutcome::Advanced { dt }
    }
}
