// A tiny fixed-vocabulary namer.
//
// Enough variety to tell planets apart in logs and test output without
// loading the word list file. Every draw still comes from the supplied RNG.

use space_prng::SpaceRng;

use crate::{Namer, PlanetInfo};

const PLANETS: [&str; 3] = ["lush", "barren", "rocky"];
const LIFE: [&str; 3] = ["microbial", "flora", "fauna"];
const ATMOS: [&str; 3] = ["thin", "thick", "toxic"];

#[derive(Clone, Copy, Debug, Default)]
pub struct MinimalNamer;

fn pick(rng: &mut SpaceRng, words: &[&str]) -> String {
    rng.choose(words).copied().unwrap_or_default().to_string()
}

impl Namer for MinimalNamer {
    fn describe_planet(&mut self, rng: &mut SpaceRng) -> String {
        pick(rng, &PLANETS)
    }

    fn describe_life(&mut self, rng: &mut SpaceRng) -> String {
        pick(rng, &LIFE)
    }

    fn name_system(&mut self, rng: &mut SpaceRng) -> String {
        let letter = char::from(b'A' + rng.range_u32(0, 26) as u8);
        let number = rng.range_u32(0, 999);
        format!("SYS-{letter}{number}")
    }

    fn describe_atmo(&mut self, rng: &mut SpaceRng) -> String {
        pick(rng, &ATMOS)
    }

    fn describe_activity(&mut self, _rng: &mut SpaceRng, _target: Option<&PlanetInfo>) -> String {
        String::from("scanning")
    }
}
