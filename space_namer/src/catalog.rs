// The full-vocabulary namer.
//
// `CatalogNamer` builds one `Bag` per word list and a handful of
// `RandomTable`s that choose between bags. Several tables share a bag (the
// "any" descriptors feed planets, life, and atmospheres alike), so tables
// hold a `Pool` tag instead of the bag itself and the namer resolves the tag
// against its own bag set. That keeps one cursor per list, which is what makes
// the no-repeat-within-a-cycle guarantee hold across all callers.
//
// System names: a constellation (rare list with probability `odds.rare`),
// then optionally a suffix word (same rare/common split, sometimes followed
// by a second rare suffix), a capital letter, and a catalog number, each
// gated on its own odd and joined by a weighted delimiter. Each gate draws
// `next_f32()` and fires when the draw is at or below the odd.

use space_prng::SpaceRng;

use crate::sampling::{Bag, RandomTable};
use crate::template::{Placeholder, fill};
use crate::{NameOdds, Namer, PlanetInfo, WordLists, default_word_lists};

/// Which shared bag a table entry refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pool {
    PlanetDescriptors,
    LifeDescriptors,
    AnyDescriptors,
    AtmoDescriptors,
    Constellations,
    ConstellationsRare,
    Suffixes,
    SuffixesRare,
}

#[derive(Clone, Debug)]
struct Pools {
    planet_descriptors: Bag<String>,
    life_descriptors: Bag<String>,
    any_descriptors: Bag<String>,
    atmo_descriptors: Bag<String>,
    constellations: Bag<String>,
    constellations_rare: Bag<String>,
    suffixes: Bag<String>,
    suffixes_rare: Bag<String>,
}

impl Pools {
    fn bag(&mut self, pool: Pool) -> &mut Bag<String> {
        match pool {
            Pool::PlanetDescriptors => &mut self.planet_descriptors,
            Pool::LifeDescriptors => &mut self.life_descriptors,
            Pool::AnyDescriptors => &mut self.any_descriptors,
            Pool::AtmoDescriptors => &mut self.atmo_descriptors,
            Pool::Constellations => &mut self.constellations,
            Pool::ConstellationsRare => &mut self.constellations_rare,
            Pool::Suffixes => &mut self.suffixes,
            Pool::SuffixesRare => &mut self.suffixes_rare,
        }
    }
}

/// Namer backed by `WordLists`.
#[derive(Clone, Debug)]
pub struct CatalogNamer {
    odds: NameOdds,
    pools: Pools,
    planet_types: Bag<String>,
    activities: Bag<String>,
    flora_plurals: Bag<String>,
    fauna_plurals: Bag<String>,
    atmo_plurals: Bag<String>,
    planet_table: RandomTable<Pool>,
    life_table: RandomTable<Pool>,
    atmo_table: RandomTable<Pool>,
    constellation_table: RandomTable<Pool>,
    suffix_table: RandomTable<Pool>,
    delimiters: RandomTable<String>,
}

impl Default for CatalogNamer {
    fn default() -> Self {
        Self::new(default_word_lists())
    }
}

impl CatalogNamer {
    /// Build from already-validated word lists (see `WordLists::from_json`).
    pub fn new(lists: WordLists) -> Self {
        let odds = lists.odds;
        Self {
            pools: Pools {
                planet_descriptors: Bag::new(lists.planet_descriptors),
                life_descriptors: Bag::new(lists.life_descriptors),
                any_descriptors: Bag::new(lists.any_descriptors),
                atmo_descriptors: Bag::new(lists.atmo_descriptors),
                constellations: Bag::new(lists.constellations),
                constellations_rare: Bag::new(lists.constellations_rare),
                suffixes: Bag::new(lists.suffixes),
                suffixes_rare: Bag::new(lists.suffixes_rare),
            },
            planet_types: Bag::new(lists.planet_types),
            activities: Bag::new(lists.activities),
            flora_plurals: Bag::new(lists.flora_plurals),
            fauna_plurals: Bag::new(lists.fauna_plurals),
            atmo_plurals: Bag::new(lists.atmo_plurals),
            planet_table: RandomTable::new(vec![
                (0.75, Pool::PlanetDescriptors),
                (0.25, Pool::AnyDescriptors),
            ]),
            life_table: RandomTable::new(vec![
                (0.75, Pool::LifeDescriptors),
                (0.25, Pool::AnyDescriptors),
            ]),
            atmo_table: RandomTable::new(vec![
                (0.75, Pool::AtmoDescriptors),
                (0.25, Pool::AnyDescriptors),
            ]),
            constellation_table: RandomTable::new(vec![
                (odds.rare, Pool::ConstellationsRare),
                (1.0 - odds.rare, Pool::Constellations),
            ]),
            suffix_table: RandomTable::new(vec![
                (odds.rare, Pool::SuffixesRare),
                (1.0 - odds.rare, Pool::Suffixes),
            ]),
            delimiters: RandomTable::new(
                lists
                    .delimiters
                    .into_iter()
                    .map(|d| (d.weight, d.text))
                    .collect(),
            ),
            odds,
        }
    }

    fn pull_from(&mut self, table: TableId, rng: &mut SpaceRng) -> String {
        let pool = match table {
            TableId::Planet => *self.planet_table.roll(rng),
            TableId::Life => *self.life_table.roll(rng),
            TableId::Atmo => *self.atmo_table.roll(rng),
            TableId::Constellation => *self.constellation_table.roll(rng),
            TableId::Suffix => *self.suffix_table.roll(rng),
        };
        self.pools.bag(pool).pull(rng).clone()
    }

    fn delimiter(&self, rng: &mut SpaceRng) -> &str {
        self.delimiters.roll(rng)
    }

    fn plural_phrase(
        field: Option<&str>,
        plurals: &mut Bag<String>,
        rng: &mut SpaceRng,
    ) -> String {
        let word = plurals.pull(rng);
        format!("{} {word}", field.unwrap_or("SOME"))
    }
}

#[derive(Clone, Copy)]
enum TableId {
    Planet,
    Life,
    Atmo,
    Constellation,
    Suffix,
}

impl Namer for CatalogNamer {
    fn describe_planet(&mut self, rng: &mut SpaceRng) -> String {
        let descriptor = self.pull_from(TableId::Planet, rng);
        let kind = self.planet_types.pull(rng);
        format!("{descriptor} {kind}")
    }

    fn describe_life(&mut self, rng: &mut SpaceRng) -> String {
        self.pull_from(TableId::Life, rng)
    }

    fn name_system(&mut self, rng: &mut SpaceRng) -> String {
        let mut name = self.pull_from(TableId::Constellation, rng);

        if rng.next_f32() <= self.odds.suffix {
            name.push_str(self.delimiter(rng));
            let suffix = self.pull_from(TableId::Suffix, rng);
            name.push_str(&suffix);
            if rng.next_f32() <= self.odds.rare {
                name.push(' ');
                name.push_str(self.pools.suffixes_rare.pull(rng));
            }
        }

        if rng.next_f32() <= self.odds.letter {
            name.push_str(self.delimiter(rng));
            name.push(char::from(b'A' + rng.range_u32(0, 26) as u8));
            if rng.next_f32() <= self.odds.rare {
                name.push_str(self.delimiter(rng));
            }
        }

        if rng.next_f32() <= self.odds.number {
            name.push_str(self.delimiter(rng));
            name.push_str(&rng.range_u32(2, 5039).to_string());
        }

        name
    }

    fn describe_atmo(&mut self, rng: &mut SpaceRng) -> String {
        self.pull_from(TableId::Atmo, rng)
    }

    fn describe_activity(&mut self, rng: &mut SpaceRng, target: Option<&PlanetInfo>) -> String {
        let template = self.activities.pull(rng).clone();
        let flora = &mut self.flora_plurals;
        let fauna = &mut self.fauna_plurals;
        let atmo = &mut self.atmo_plurals;
        fill(&template, |tag| match tag {
            Placeholder::Flora => {
                Self::plural_phrase(target.map(|t| t.flora.as_str()), flora, rng)
            }
            Placeholder::Fauna => {
                Self::plural_phrase(target.map(|t| t.fauna.as_str()), fauna, rng)
            }
            Placeholder::Atmo => {
                Self::plural_phrase(target.map(|t| t.atmosphere.as_str()), atmo, rng)
            }
            Placeholder::Planet => target
                .map(|t| t.description.clone())
                .unwrap_or_else(|| String::from("SOME BODY")),
        })
    }
}
