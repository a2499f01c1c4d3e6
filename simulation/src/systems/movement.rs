//! Movement: nudge one random NPC per iteration.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::{debug, trace};

use crate::components::Entity;
use crate::config::SimConfig;
use crate::registry::Registry;
use crate::systems::{sleep_random, WorkerContext};

/// Move one uniformly chosen NPC by up to its archetype's move distance on
/// each axis, clamped to the map. Returns the published entity, or `None` when
/// the registry is empty or the NPC died before the move could be published.
pub fn movement_step<R: Rng + ?Sized>(
    registry: &Registry,
    config: &SimConfig,
    rng: &mut R,
) -> Option<Entity> {
    let snapshot = registry.snapshot();
    let picked = snapshot.choose(rng)?;

    let reach = config.stats(picked.archetype).move_distance;
    let step = Uniform::new_inclusive(-reach, reach);
    let (x, y) = config
        .map_bounds()
        .clamp(picked.x + step.sample(rng), picked.y + step.sample(rng));

    let moved = picked.with_position(x, y);
    if registry.replace(&picked.name, moved.clone()) {
        Some(moved)
    } else {
        trace!("{} vanished before its move was published", picked.name);
        None
    }
}

pub fn run_movement_worker(ctx: WorkerContext) {
    let mut rng = rand::thread_rng();
    let mut moves = 0u64;

    while ctx.is_running() {
        sleep_random(ctx.config.movement_interval_ms, &mut rng);
        if !ctx.is_running() {
            break;
        }
        if movement_step(&ctx.registry, &ctx.config, &mut rng).is_some() {
            moves += 1;
        }
    }

    debug!("Movement worker stopped after {} moves", moves);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Archetype;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn map_registry(config: &SimConfig) -> Registry {
        Registry::new(config.map_bounds())
    }

    #[test]
    fn test_empty_registry_is_noop() {
        let config = SimConfig::default();
        let registry = map_registry(&config);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(movement_step(&registry, &config, &mut rng).is_none());
    }

    #[test]
    fn test_step_stays_within_reach_and_map() {
        let config = SimConfig::default();
        let registry = map_registry(&config);
        registry
            .add(Entity::new(Archetype::Desman, "Mole0", 1.0, 99.0))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let mut last = registry.get("Mole0").unwrap();
        for _ in 0..500 {
            let moved = movement_step(&registry, &config, &mut rng).unwrap();
            assert!((moved.x - last.x).abs() <= 5.0);
            assert!((moved.y - last.y).abs() <= 5.0);
            assert!(config.map_bounds().contains(moved.x, moved.y));
            assert_eq!(registry.get("Mole0").unwrap(), moved);
            last = moved;
        }
    }

    #[test]
    fn test_only_one_entity_moves_per_step() {
        let config = SimConfig::default();
        let registry = map_registry(&config);
        for (i, archetype) in Archetype::ALL.into_iter().enumerate() {
            registry
                .add(Entity::new(archetype, format!("n{i}"), 50.0, 50.0))
                .unwrap();
        }
        let mut rng = StdRng::seed_from_u64(3);
        let before = registry.snapshot();

        let moved = movement_step(&registry, &config, &mut rng).unwrap();
        let after = registry.snapshot();

        let changed: Vec<_> = before
            .iter()
            .zip(&after)
            .filter(|(b, a)| b != a)
            .map(|(_, a)| a.name.clone())
            .collect();
        assert!(changed.is_empty() || changed == vec![moved.name]);
        assert_eq!(after.len(), before.len());
    }

    #[test]
    fn test_zero_move_distance_keeps_position() {
        let mut config = SimConfig::default();
        config.archetypes.get_mut(Archetype::Bear).move_distance = 0.0;
        let registry = map_registry(&config);
        registry
            .add(Entity::new(Archetype::Bear, "Ursa0", 10.0, 10.0))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        let moved = movement_step(&registry, &config, &mut rng).unwrap();
        assert_eq!((moved.x, moved.y), (10.0, 10.0));
    }
}
