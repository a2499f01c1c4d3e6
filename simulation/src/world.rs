//! Simulation World - seeding and the supervised run

use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::{info, warn};

use crate::components::{Entity, PopulationCounts};
use crate::config::SimConfig;
use crate::error::Result;
use crate::names::{random_archetype, seed_name};
use crate::notify::{ConsoleObserver, FileObserver, ObserverSet};
use crate::registry::Registry;
use crate::runner::SimulationRunner;
use crate::systems::FinalReport;

pub struct SimulationWorld {
    registry: Arc<Registry>,
    config: Arc<SimConfig>,
}

impl SimulationWorld {
    /// Empty world whose registry admits positions inside the configured map.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(Registry::new(config.map_bounds())),
            config: Arc::new(config),
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seed `count` NPCs of random archetype at uniform positions on the map.
    /// Names already in the registry are skipped. Returns how many were added.
    pub fn seed_population<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<usize> {
        let bounds = self.config.map_bounds();
        let xs = Uniform::new_inclusive(0.0, bounds.width);
        let ys = Uniform::new_inclusive(0.0, bounds.height);

        let mut batch: Vec<Entity> = Vec::with_capacity(count);
        let mut index = self.registry.len();
        while batch.len() < count {
            let archetype = random_archetype(rng);
            let name = seed_name(archetype, index);
            index += 1;
            if self.registry.contains(&name) || batch.iter().any(|e| e.name == name) {
                continue;
            }
            batch.push(Entity::new(archetype, name, xs.sample(rng), ys.sample(rng)));
        }

        self.registry.extend(batch)?;
        info!(
            "Seeded {} NPCs ({})",
            count,
            PopulationCounts::from_entities(&self.registry.snapshot())
        );
        Ok(count)
    }

    /// Replace the population with a roster file.
    pub fn load_roster(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.registry.load_from_file(path)
    }

    pub fn population(&self) -> PopulationCounts {
        PopulationCounts::from_entities(&self.registry.snapshot())
    }

    /// Console sink plus, when configured, the append-only kill log.
    pub fn default_observers(&self) -> ObserverSet {
        let mut observers = ObserverSet::new();
        observers.add(Arc::new(ConsoleObserver));
        if let Some(path) = &self.config.kill_log_path {
            observers.add(Arc::new(FileObserver::new(path.clone())));
        }
        observers
    }

    /// Run the workers until the configured duration elapses, then build the
    /// final report and persist the survivors when a path is configured.
    pub fn run(&self, observers: ObserverSet) -> Result<FinalReport> {
        let initial = self.registry.len();

        let mut runner = SimulationRunner::new();
        runner.start(
            Arc::clone(&self.registry),
            Arc::clone(&self.config),
            observers,
        )?;
        let elapsed = runner.wait();

        let report = FinalReport::new(initial, self.registry.snapshot(), elapsed);
        info!(
            "Simulation finished: {} of {} survived",
            report.survivor_count(),
            initial
        );

        if let Some(path) = &self.config.final_state_path {
            if let Err(e) = report.persist(path) {
                warn!("Final state not saved to {}: {}", path.display(), e);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntervalMs;
    use crate::error::ArenaError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_config() -> SimConfig {
        SimConfig {
            duration_secs: 0.2,
            movement_interval_ms: IntervalMs::new(1, 10),
            combat_interval_ms: IntervalMs::new(1, 10),
            report_interval_ms: 50,
            print_map: false,
            final_state_path: None,
            kill_log_path: None,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimConfig {
            map_height: -1.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            SimulationWorld::new(config),
            Err(ArenaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_seed_population() {
        let world = SimulationWorld::new(test_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(world.seed_population(50, &mut rng).unwrap(), 50);
        assert_eq!(world.registry().len(), 50);
        assert_eq!(world.population().total(), 50);

        let bounds = world.config().map_bounds();
        for npc in world.registry().snapshot() {
            assert!(bounds.contains(npc.x, npc.y));
        }

        // A second batch never collides with the first.
        world.seed_population(10, &mut rng).unwrap();
        assert_eq!(world.registry().len(), 60);
    }

    #[test]
    fn test_seed_zero_is_noop() {
        let world = SimulationWorld::new(test_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(world.seed_population(0, &mut rng).unwrap(), 0);
        assert!(world.registry().is_empty());
    }

    #[test]
    fn test_default_observers_follow_config() {
        let world = SimulationWorld::new(test_config()).unwrap();
        assert_eq!(world.default_observers().len(), 1);

        let config = SimConfig {
            kill_log_path: Some("kills.log".into()),
            ..test_config()
        };
        let world = SimulationWorld::new(config).unwrap();
        assert_eq!(world.default_observers().len(), 2);
    }

    #[test]
    fn test_run_reports_registry_at_exit() {
        let dir = tempfile::tempdir().unwrap();
        let final_state = dir.path().join("final_state.txt");
        let config = SimConfig {
            final_state_path: Some(final_state.clone()),
            ..test_config()
        };
        let world = SimulationWorld::new(config).unwrap();
        world
            .seed_population(30, &mut StdRng::seed_from_u64(11))
            .unwrap();

        let report = world.run(ObserverSet::new()).unwrap();

        assert_eq!(report.initial, 30);
        assert_eq!(report.survivor_count(), world.registry().len());
        assert_eq!(report.killed(), 30 - world.registry().len());

        let reloaded = Registry::new(world.config().map_bounds());
        assert_eq!(
            reloaded.load_from_file(&final_state).unwrap(),
            report.survivor_count()
        );
        assert_eq!(reloaded.snapshot(), report.survivors);
    }
}
