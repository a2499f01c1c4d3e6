//! Value types shared by the registry, the workers and the sinks.
//!
//! Entities are plain values: moving one means building a new `Entity` with
//! updated coordinates and publishing it through the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArenaError;

// ============================================================================
// Archetype
// ============================================================================

/// Combat archetype of an entity. The kill relation between archetypes lives
/// in [`crate::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    Bear,
    Bittern,
    Desman,
}

impl Archetype {
    pub const COUNT: usize = 3;

    /// Every archetype, in table order.
    pub const ALL: [Archetype; Archetype::COUNT] =
        [Archetype::Bear, Archetype::Bittern, Archetype::Desman];

    /// Row/column of this archetype in per-archetype tables.
    pub const fn index(self) -> usize {
        match self {
            Archetype::Bear => 0,
            Archetype::Bittern => 1,
            Archetype::Desman => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Archetype::Bear => "Bear",
            Archetype::Bittern => "Bittern",
            Archetype::Desman => "Desman",
        }
    }

    pub const fn plural(self) -> &'static str {
        match self {
            Archetype::Bear => "Bears",
            Archetype::Bittern => "Bitterns",
            Archetype::Desman => "Desmans",
        }
    }

    /// Single-character map symbol.
    pub const fn letter(self) -> char {
        match self {
            Archetype::Bear => 'B',
            Archetype::Bittern => 'I',
            Archetype::Desman => 'D',
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Archetype {
    type Err = ArenaError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(token))
            .ok_or_else(|| ArenaError::UnknownArchetype(token.to_string()))
    }
}

// ============================================================================
// Entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub archetype: Archetype,
}

impl Entity {
    pub fn new(archetype: Archetype, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            archetype,
        }
    }

    /// Same entity, new coordinates.
    pub fn with_position(&self, x: f64, y: f64) -> Self {
        Self {
            name: self.name.clone(),
            x,
            y,
            archetype: self.archetype,
        }
    }

    pub fn distance_to(&self, other: &Entity) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// ============================================================================
// Events & statistics
// ============================================================================

/// One kill discovered during a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KillEvent {
    pub killer: String,
    pub victim: String,
}

impl KillEvent {
    pub fn new(killer: impl Into<String>, victim: impl Into<String>) -> Self {
        Self {
            killer: killer.into(),
            victim: victim.into(),
        }
    }
}

/// Head count per archetype over some set of entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulationCounts {
    counts: [usize; Archetype::COUNT],
}

impl PopulationCounts {
    pub fn from_entities<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut counts = [0; Archetype::COUNT];
        for entity in entities {
            counts[entity.archetype.index()] += 1;
        }
        Self { counts }
    }

    pub fn get(&self, archetype: Archetype) -> usize {
        self.counts[archetype.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl fmt::Display for PopulationCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, archetype) in Archetype::ALL.into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", archetype.letter(), self.get(archetype))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_parse_is_case_insensitive() {
        assert_eq!("bear".parse::<Archetype>().unwrap(), Archetype::Bear);
        assert_eq!("BITTERN".parse::<Archetype>().unwrap(), Archetype::Bittern);
        assert_eq!("DeSmAn".parse::<Archetype>().unwrap(), Archetype::Desman);
    }

    #[test]
    fn test_unknown_archetype() {
        let err = "wolf".parse::<Archetype>().unwrap_err();
        assert!(matches!(err, ArenaError::UnknownArchetype(ref t) if t == "wolf"));
    }

    #[test]
    fn test_indices_match_all_order() {
        for (i, archetype) in Archetype::ALL.into_iter().enumerate() {
            assert_eq!(archetype.index(), i);
        }
    }

    #[test]
    fn test_with_position_keeps_identity() {
        let bear = Entity::new(Archetype::Bear, "Bear1", 10.0, 20.0);
        let moved = bear.with_position(30.0, 40.0);

        assert_eq!(moved.name, "Bear1");
        assert_eq!(moved.archetype, Archetype::Bear);
        assert_eq!((moved.x, moved.y), (30.0, 40.0));
        assert_eq!((bear.x, bear.y), (10.0, 20.0));
    }

    #[test]
    fn test_distance() {
        let a = Entity::new(Archetype::Bear, "a", 0.0, 0.0);
        let b = Entity::new(Archetype::Desman, "b", 3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_population_counts() {
        let entities = vec![
            Entity::new(Archetype::Bear, "a", 0.0, 0.0),
            Entity::new(Archetype::Bear, "b", 0.0, 0.0),
            Entity::new(Archetype::Desman, "c", 0.0, 0.0),
        ];
        let counts = PopulationCounts::from_entities(&entities);

        assert_eq!(counts.get(Archetype::Bear), 2);
        assert_eq!(counts.get(Archetype::Bittern), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.to_string(), "B=2 I=0 D=1");
    }
}
