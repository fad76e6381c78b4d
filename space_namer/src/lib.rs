// Procedural content generator for the orbital simulation.
//
// Turns a seeded `SpaceRng` stream into descriptive strings: system names,
// planet descriptions, atmospheres, flora/fauna, and the activity text shown
// when the craft lands somewhere. Used by `space_sim` at universe creation and
// at touch-down. No I/O, no clocks.
//
// Architecture:
// - `sampling.rs`: `Bag` (shuffle-on-exhaustion sampler) and `RandomTable`
//   (weighted distribution). The building blocks every namer uses.
// - `template.rs`: `{flora}`/`{fauna}`/`{atmo}`/`{planet}` substitution.
// - `catalog.rs`: `CatalogNamer`, driven by the word lists in
//   `data/namer_words.json`.
// - `minimal.rs`: `MinimalNamer`, a tiny fixed vocabulary for tests and
//   headless control runs.
// - `lib.rs` (this file): the `Namer` trait, `PlanetInfo`, and `WordLists`
//   (JSON string in, typed struct out, like the sim's config loading).
//
// Determinism constraint: a namer may only consume randomness from the
// `SpaceRng` it is handed. Internal state (bag cursors) advances only in
// response to those calls, so two namers built the same way and fed the same
// call sequence on identically seeded streams return identical strings.

pub mod catalog;
pub mod minimal;
pub mod sampling;
pub mod template;

pub use catalog::CatalogNamer;
pub use minimal::MinimalNamer;
pub use sampling::{Bag, RandomTable};
pub use space_prng::SpaceRng;

use serde::{Deserialize, Serialize};

/// Descriptive fields of a planet, as handed to `Namer::describe_activity`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetInfo {
    pub description: String,
    pub atmosphere: String,
    pub flora: String,
    pub fauna: String,
}

/// Pluggable source of descriptive text.
///
/// Methods take `&mut self` because bag-based namers advance their cursors;
/// that state is fully determined by the sequence of calls.
pub trait Namer: Send + Sync {
    fn describe_planet(&mut self, rng: &mut SpaceRng) -> String;
    fn describe_life(&mut self, rng: &mut SpaceRng) -> String;
    fn name_system(&mut self, rng: &mut SpaceRng) -> String;
    fn describe_atmo(&mut self, rng: &mut SpaceRng) -> String;
    /// Text for what the crew is doing on `target`. Template placeholders
    /// fall back to generic words when there is no target.
    fn describe_activity(&mut self, rng: &mut SpaceRng, target: Option<&PlanetInfo>) -> String;
}

/// Errors from loading a word list file.
#[derive(Debug, thiserror::Error)]
pub enum NamerError {
    #[error("word list JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("word list `{0}` is empty")]
    EmptyList(&'static str),
    #[error("probability `{name}` must be within [0, 1], got {value}")]
    BadProbability { name: &'static str, value: f32 },
}

/// Probabilities that shape system names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NameOdds {
    /// Chance of drawing from a rare table instead of the common one.
    pub rare: f32,
    /// Chance a system name gets a suffix word.
    pub suffix: f32,
    /// Chance a system name gets a capital letter.
    pub letter: f32,
    /// Chance a system name gets a catalog number.
    pub number: f32,
}

/// A weighted delimiter between system-name parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedText {
    pub weight: f32,
    pub text: String,
}

/// Every vocabulary `CatalogNamer` draws from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WordLists {
    pub odds: NameOdds,
    pub planet_descriptors: Vec<String>,
    pub life_descriptors: Vec<String>,
    pub any_descriptors: Vec<String>,
    pub atmo_descriptors: Vec<String>,
    pub planet_types: Vec<String>,
    pub constellations: Vec<String>,
    pub constellations_rare: Vec<String>,
    pub suffixes: Vec<String>,
    pub suffixes_rare: Vec<String>,
    pub activities: Vec<String>,
    pub flora_plurals: Vec<String>,
    pub fauna_plurals: Vec<String>,
    pub atmo_plurals: Vec<String>,
    pub delimiters: Vec<WeightedText>,
}

impl WordLists {
    /// Parse and validate word lists from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, NamerError> {
        let lists: WordLists = serde_json::from_str(json)?;
        lists.validate()?;
        Ok(lists)
    }

    fn validate(&self) -> Result<(), NamerError> {
        let lists: [(&'static str, usize); 14] = [
            ("planet_descriptors", self.planet_descriptors.len()),
            ("life_descriptors", self.life_descriptors.len()),
            ("any_descriptors", self.any_descriptors.len()),
            ("atmo_descriptors", self.atmo_descriptors.len()),
            ("planet_types", self.planet_types.len()),
            ("constellations", self.constellations.len()),
            ("constellations_rare", self.constellations_rare.len()),
            ("suffixes", self.suffixes.len()),
            ("suffixes_rare", self.suffixes_rare.len()),
            ("activities", self.activities.len()),
            ("flora_plurals", self.flora_plurals.len()),
            ("fauna_plurals", self.fauna_plurals.len()),
            ("atmo_plurals", self.atmo_plurals.len()),
            ("delimiters", self.delimiters.len()),
        ];
        if let Some((name, _)) = lists.iter().find(|(_, len)| *len == 0) {
            return Err(NamerError::EmptyList(name));
        }
        let odds = [
            ("rare", self.odds.rare),
            ("suffix", self.odds.suffix),
            ("letter", self.odds.letter),
            ("number", self.odds.number),
        ];
        for (name, value) in odds {
            if !(0.0..=1.0).contains(&value) {
                return Err(NamerError::BadProbability { name, value });
            }
        }
        Ok(())
    }
}

/// The word lists embedded at compile time from `data/namer_words.json`.
///
/// Panics if the embedded JSON is malformed, which the tests below rule out.
pub fn default_word_lists() -> WordLists {
    let json = include_str!("../../data/namer_words.json");
    WordLists::from_json(json).expect("embedded namer_words.json is malformed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_word_lists_load() {
        let lists = default_word_lists();
        assert_eq!(lists.planet_types.len(), 20);
        assert_eq!(lists.delimiters.len(), 9);
        assert!((lists.odds.rare - 0.05).abs() < 1e-6);
    }

    #[test]
    fn empty_list_is_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(include_str!("../../data/namer_words.json")).unwrap();
        value["activities"] = serde_json::json!([]);
        let err = WordLists::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, NamerError::EmptyList("activities")));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(include_str!("../../data/namer_words.json")).unwrap();
        value["odds"]["letter"] = serde_json::json!(1.5);
        let err = WordLists::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, NamerError::BadProbability { name: "letter", .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            WordLists::from_json("{not json"),
            Err(NamerError::Json(_))
        ));
    }
}
