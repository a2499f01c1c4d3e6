//! Name generation for seeded NPCs.
//!
//! Each archetype draws from its own pool; the seed index is appended so
//! names stay unique within one seeding run.

use rand::Rng;

use crate::components::Archetype;

const BEAR_NAMES: &[&str] = &[
    "Ursa", "Grizzly", "Brown", "Black", "Polar", "Honey", "Teddy", "Growler", "Fuzzy", "Bruno",
];

const BITTERN_NAMES: &[&str] = &[
    "Wader", "Heron", "Egret", "Stork", "Crane", "Ibis", "Spoonbill", "Flamingo", "Pelican",
    "Grebe",
];

const DESMAN_NAMES: &[&str] = &[
    "Mole", "Shrew", "Vole", "Muskrat", "Beaver", "Otter", "Mink", "Weasel", "Ferret", "Badger",
];

fn pool(archetype: Archetype) -> &'static [&'static str] {
    match archetype {
        Archetype::Bear => BEAR_NAMES,
        Archetype::Bittern => BITTERN_NAMES,
        Archetype::Desman => DESMAN_NAMES,
    }
}

/// Deterministic name for the `index`-th seeded NPC, e.g. `Grizzly11`.
pub fn seed_name(archetype: Archetype, index: usize) -> String {
    let names = pool(archetype);
    format!("{}{}", names[index % names.len()], index)
}

/// Uniformly random archetype.
pub fn random_archetype<R: Rng + ?Sized>(rng: &mut R) -> Archetype {
    Archetype::ALL[rng.gen_range(0..Archetype::COUNT)]
}
