// Deterministic, portable pseudo-random number generator.
//
// xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64. Every
// random decision in the workspace draws from a `SpaceRng`: star class and
// planet layout in `space_sim`, word picks and bag shuffles in `space_namer`,
// and landing activity text at touch-down. Nothing else may feed randomness
// into the simulation.
//
// The control protocol promises that two universes built from the same seed
// and fed the same `/act` + `/step` sequence produce byte-identical `/observe`
// output, so this generator must give identical streams on every platform.
// The integer core never touches floating point; float helpers only scale
// integer bits.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG. One instance per universe; the namer borrows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRng {
    s: [u64; 4],
}

impl SpaceRng {
    /// Create a generator from a `u64` seed.
    ///
    /// SplitMix64 expands the seed into the 256-bit state. Equal seeds give
    /// equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a generator from the signed seeds used on the control surface.
    /// The bit pattern is reinterpreted, so `-1` and `u64::MAX` are the same seed.
    pub fn from_signed(seed: i64) -> Self {
        Self::new(seed as u64)
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f32` in [0, 1), built from the top 24 bits.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform `f64` in [0, 1), built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform `f32` in `[low, high)`. Returns `low` when the range is empty,
    /// which lets config ranges like `(1.0, 1.0)` pin a value.
    pub fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        let v = low + self.next_f32() * (high - low);
        // Rounding can land exactly on `high` for very wide ranges.
        if v >= high { low } else { v }
    }

    /// Uniform integer in `[low, high)` with rejection sampling.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `usize` in `[low, high]`. Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as usize
    }

    /// Uniform `u32` in `[low, high)`. Panics if `low >= high`.
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        self.range_u64(u64::from(low), u64::from(high)) as u32
    }

    /// `true` with probability `p`. `p <= 0` never fires, `p >= 1` always does.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        items.get(idx)
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_usize_inclusive(0, i);
            items.swap(i, j);
        }
    }
}

/// SplitMix64 step, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SpaceRng::new(42);
        let mut b = SpaceRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SpaceRng::new(42);
        let mut b = SpaceRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn signed_seed_matches_bit_pattern() {
        let mut a = SpaceRng::from_signed(-1);
        let mut b = SpaceRng::new(u64::MAX);
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f32_in_unit_range() {
        let mut rng = SpaceRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v), "f32 out of range: {v}");
        }
    }

    #[test]
    fn range_f32_within_bounds() {
        let mut rng = SpaceRng::new(777);
        for _ in 0..10_000 {
            let v = rng.range_f32(50.0, 2_000.0);
            assert!((50.0..2_000.0).contains(&v), "range_f32 out of range: {v}");
        }
    }

    #[test]
    fn range_f32_empty_range_pins_low() {
        let mut rng = SpaceRng::new(1);
        assert_eq!(rng.range_f32(3.0, 3.0), 3.0);
        assert_eq!(rng.range_f32(3.0, 1.0), 3.0);
    }

    #[test]
    fn range_u32_within_bounds() {
        let mut rng = SpaceRng::new(999);
        for _ in 0..10_000 {
            let v = rng.range_u32(2, 5039);
            assert!((2..5039).contains(&v), "range_u32 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_inclusive_reaches_upper_bound() {
        let mut rng = SpaceRng::new(1);
        let saw_max = (0..10_000).any(|_| rng.range_usize_inclusive(0, 1) == 1);
        assert!(saw_max, "range_usize_inclusive should reach the upper bound");
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = SpaceRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = SpaceRng::new(5);
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, sorted, "50 items should not shuffle into identity");
    }

    #[test]
    fn shuffle_is_deterministic() {
        let mut a = SpaceRng::new(9);
        let mut b = SpaceRng::new(9);
        let mut xs: Vec<u32> = (0..20).collect();
        let mut ys = xs.clone();
        a.shuffle(&mut xs);
        b.shuffle(&mut ys);
        assert_eq!(xs, ys);
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SpaceRng::new(3);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[7]), Some(&7));
    }

    #[test]
    fn serialization_roundtrip_continues_stream() {
        let mut rng = SpaceRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SpaceRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
