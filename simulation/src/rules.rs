//! Combat policy: which archetype may kill which.
//!
//! The relation is a single table indexed by `(attacker, defender)`. It is not
//! symmetric: a Bear and a Desman can each kill the other, while a Bittern and
//! a Desman leave each other alone. Adding an archetype means adding one row
//! and one column here.

use crate::components::Archetype;

const KILL_TABLE: [[bool; Archetype::COUNT]; Archetype::COUNT] = [
    //             Bear   Bittern Desman   <- defender
    /* Bear    */ [false, true, true],
    /* Bittern */ [false, false, false],
    /* Desman  */ [true, false, false],
];

/// Whether `attacker` is able to kill `defender` at all. Dice and distance are
/// decided elsewhere.
pub const fn can_kill(attacker: Archetype, defender: Archetype) -> bool {
    KILL_TABLE[attacker.index()][defender.index()]
}

/// One human-readable line per archetype, derived from the table.
pub fn describe_rules() -> Vec<String> {
    Archetype::ALL
        .into_iter()
        .map(|attacker| {
            let victims: Vec<Archetype> = Archetype::ALL
                .into_iter()
                .filter(|&defender| can_kill(attacker, defender))
                .collect();
            let others: Vec<Archetype> = Archetype::ALL
                .into_iter()
                .filter(|&defender| defender != attacker)
                .collect();

            let target = if victims.is_empty() {
                "no one".to_string()
            } else if victims == others {
                format!("everyone except {}", attacker.plural())
            } else {
                victims
                    .iter()
                    .map(|a| a.plural())
                    .collect::<Vec<_>>()
                    .join(" and ")
            };
            format!("{} kills {}", attacker, target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Archetype::*;

    #[test]
    fn test_kill_table_all_pairs() {
        let expected = [
            (Bear, Bear, false),
            (Bear, Bittern, true),
            (Bear, Desman, true),
            (Bittern, Bear, false),
            (Bittern, Bittern, false),
            (Bittern, Desman, false),
            (Desman, Bear, true),
            (Desman, Bittern, false),
            (Desman, Desman, false),
        ];
        for (attacker, defender, kills) in expected {
            assert_eq!(
                can_kill(attacker, defender),
                kills,
                "{attacker} vs {defender}"
            );
        }
    }

    #[test]
    fn test_same_archetype_never_kills() {
        for a in Archetype::ALL {
            assert!(!can_kill(a, a));
        }
    }

    #[test]
    fn test_describe_rules() {
        assert_eq!(
            describe_rules(),
            vec![
                "Bear kills everyone except Bears",
                "Bittern kills no one",
                "Desman kills Bears",
            ]
        );
    }
}
