// Seeded sampling primitives: `Bag` and `RandomTable`.
//
// `Bag<T>` draws without replacement until it runs dry, then reshuffles its
// working copy with the caller's RNG and starts over. Every item appears
// exactly once per full cycle, so a bag of N never repeats within N
// consecutive pulls that start on a cycle boundary. Storage is one fixed `Vec`
// plus a cursor; pulls never allocate.
//
// `RandomTable<T>` is a weighted discrete distribution. A roll draws
// `x ∈ [0, total)` and walks the entries in construction order, subtracting
// weights until `x` goes negative. If float rounding walks off the end the
// last entry wins.
//
// Both take `&mut SpaceRng` per call and hold no other randomness, so the
// same seed and the same call sequence always give the same draws.

use space_prng::SpaceRng;

/// Without-replacement sampler that reshuffles on exhaustion.
#[derive(Clone, Debug)]
pub struct Bag<T> {
    items: Vec<T>,
    next: usize,
}

impl<T> Bag<T> {
    /// Build a bag from its source items. The first pull shuffles.
    ///
    /// Panics if `items` is empty.
    pub fn new(items: Vec<T>) -> Self {
        assert!(!items.is_empty(), "Bag::new: a bag needs at least one item");
        let next = items.len();
        Self { items, next }
    }

    /// Draw the next item, reshuffling first if the current cycle is spent.
    pub fn pull(&mut self, rng: &mut SpaceRng) -> &T {
        if self.next >= self.items.len() {
            rng.shuffle(&mut self.items);
            self.next = 0;
        }
        let idx = self.next;
        self.next += 1;
        &self.items[idx]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items left before the next reshuffle.
    pub fn remaining(&self) -> usize {
        self.items.len() - self.next.min(self.items.len())
    }
}

/// Weighted table over arbitrary payloads.
#[derive(Clone, Debug)]
pub struct RandomTable<T> {
    entries: Vec<(f32, T)>,
    total: f32,
}

impl<T> RandomTable<T> {
    /// Build a table from `(weight, payload)` pairs, keeping their order.
    ///
    /// Panics if `entries` is empty.
    pub fn new(entries: Vec<(f32, T)>) -> Self {
        assert!(
            !entries.is_empty(),
            "RandomTable::new: a table needs at least one entry"
        );
        let total = entries.iter().map(|(w, _)| *w).sum();
        Self { entries, total }
    }

    pub fn total_weight(&self) -> f32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Roll and return the index of the chosen entry.
    pub fn roll_index(&self, rng: &mut SpaceRng) -> usize {
        let mut x = rng.next_f32() * self.total;
        for (idx, (weight, _)) in self.entries.iter().enumerate() {
            x -= weight;
            if x < 0.0 {
                return idx;
            }
        }
        self.entries.len() - 1
    }

    pub fn roll(&self, rng: &mut SpaceRng) -> &T {
        let idx = self.roll_index(rng);
        &self.entries[idx].1
    }

    /// Roll for a payload that must be mutated, such as a nested `Bag`.
    pub fn roll_mut(&mut self, rng: &mut SpaceRng) -> &mut T {
        let idx = self.roll_index(rng);
        &mut self.entries[idx].1
    }
}
