//! Turn-based battle used by the roster editor.
//!
//! No dice and no threads: every pair within `distance` fights in both
//! directions using only the kill table. A round's dead are removed together
//! and rounds repeat until one passes without a kill. Sinks are notified on
//! the calling thread once the battle has settled.

use std::collections::HashSet;

use tracing::debug;

use crate::components::{Entity, KillEvent};
use crate::notify::ObserverSet;
use crate::registry::Registry;
use crate::rules::can_kill;

/// Kills of a single round over `entities`, in discovery order.
fn resolve_round(entities: &[Entity], distance: f64) -> Vec<KillEvent> {
    let mut events = Vec::new();
    for (i, a) in entities.iter().enumerate() {
        for b in &entities[i + 1..] {
            if a.distance_to(b) > distance {
                continue;
            }
            if can_kill(a.archetype, b.archetype) {
                events.push(KillEvent::new(a.name.as_str(), b.name.as_str()));
            }
            if can_kill(b.archetype, a.archetype) {
                events.push(KillEvent::new(b.name.as_str(), a.name.as_str()));
            }
        }
    }
    events
}

/// Fight rounds over `entities` until nobody dies. Returns survivors and every
/// kill in order.
pub fn battle_to_rest(
    mut entities: Vec<Entity>,
    distance: f64,
) -> (Vec<Entity>, Vec<KillEvent>) {
    let mut history = Vec::new();
    loop {
        let events = resolve_round(&entities, distance);
        if events.is_empty() {
            return (entities, history);
        }
        let dead: HashSet<&str> = events.iter().map(|e| e.victim.as_str()).collect();
        entities.retain(|e| !dead.contains(e.name.as_str()));
        history.extend(events);
    }
}

/// Run the editor battle on `registry`, notifying `observers` of every kill.
/// Returns how many NPCs died.
pub fn run_battle(registry: &Registry, distance: f64, observers: &ObserverSet) -> usize {
    let (_, events) = battle_to_rest(registry.snapshot(), distance);
    if events.is_empty() {
        return 0;
    }

    for event in &events {
        observers.notify(event);
    }
    let dead: Vec<&str> = events.iter().map(|e| e.victim.as_str()).collect();
    let removed = registry.remove_by_names(dead.as_slice());
    debug!("Battle at distance {}: {} killed", distance, removed);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Archetype;
    use crate::notify::tests::RecordingObserver;
    use std::sync::Arc;

    fn setup(
        entities: &[(Archetype, &str, f64, f64)],
    ) -> (Registry, ObserverSet, Arc<RecordingObserver>) {
        let registry = Registry::for_editor();
        for &(archetype, name, x, y) in entities {
            registry.add(Entity::new(archetype, name, x, y)).unwrap();
        }
        let sink = Arc::new(RecordingObserver::default());
        let mut observers = ObserverSet::new();
        observers.add(sink.clone());
        (registry, observers, sink)
    }

    #[test]
    fn test_bear_kills_bittern() {
        let (registry, observers, sink) = setup(&[
            (Archetype::Bear, "Bear1", 0.0, 0.0),
            (Archetype::Bittern, "Bit1", 1.0, 1.0),
        ]);

        assert_eq!(run_battle(&registry, 5.0, &observers), 1);

        let survivors = registry.snapshot();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].name, "Bear1");
        assert_eq!(sink.events(), vec![KillEvent::new("Bear1", "Bit1")]);
    }

    #[test]
    fn test_bear_and_desman_kill_each_other() {
        let (registry, observers, sink) = setup(&[
            (Archetype::Bear, "Bear1", 0.0, 0.0),
            (Archetype::Desman, "Des1", 1.0, 1.0),
        ]);

        run_battle(&registry, 5.0, &observers);

        assert!(registry.is_empty());
        assert_eq!(
            sink.events(),
            vec![KillEvent::new("Bear1", "Des1"), KillEvent::new("Des1", "Bear1")]
        );
    }

    #[test]
    fn test_bitterns_never_kill() {
        let (registry, observers, sink) = setup(&[
            (Archetype::Bittern, "Bit1", 0.0, 0.0),
            (Archetype::Bittern, "Bit2", 1.0, 0.0),
            (Archetype::Desman, "Des1", 0.0, 1.0),
        ]);

        assert_eq!(run_battle(&registry, 10.0, &observers), 0);
        assert_eq!(registry.len(), 3);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_distance_limits_battle() {
        let (registry, observers, sink) = setup(&[
            (Archetype::Bear, "Bear1", 0.0, 0.0),
            (Archetype::Bittern, "Bit1", 10.0, 10.0),
        ]);

        run_battle(&registry, 5.0, &observers);
        assert_eq!(registry.len(), 2);
        assert!(sink.events().is_empty());

        run_battle(&registry, 20.0, &observers);
        assert_eq!(registry.len(), 1);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_zero_distance_same_spot() {
        let (registry, observers, _) = setup(&[
            (Archetype::Bear, "Bear1", 3.0, 3.0),
            (Archetype::Bittern, "Bit1", 3.0, 3.0),
        ]);
        run_battle(&registry, 0.0, &observers);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_registry_stays_empty() {
        let (registry, observers, sink) = setup(&[]);
        assert_eq!(run_battle(&registry, 10.0, &observers), 0);
        assert!(registry.is_empty());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_two_bears_one_bittern_dies_once() {
        let (registry, observers, sink) = setup(&[
            (Archetype::Bear, "Bear1", 0.0, 0.0),
            (Archetype::Bear, "Bear2", 1.0, 0.0),
            (Archetype::Bittern, "Bit1", 0.5, 0.5),
        ]);

        assert_eq!(run_battle(&registry, 5.0, &observers), 1);
        assert_eq!(registry.len(), 2);
        // Both bears strike in the same round.
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_battle_to_rest_returns_survivors() {
        let entities = vec![
            Entity::new(Archetype::Bear, "Bear1", 0.0, 0.0),
            Entity::new(Archetype::Bittern, "Bit1", 1.0, 0.0),
            Entity::new(Archetype::Desman, "Des1", 40.0, 40.0),
            Entity::new(Archetype::Bittern, "Bit2", 41.0, 40.0),
        ];
        let (survivors, history) = battle_to_rest(entities, 5.0);

        let names: Vec<&str> = survivors.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Bear1", "Des1", "Bit2"]);
        assert_eq!(history, vec![KillEvent::new("Bear1", "Bit1")]);
    }
}
