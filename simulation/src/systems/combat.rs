//! Dice combat between NPCs that are close enough to fight.
//!
//! A resolution pass works on one snapshot. Every unordered pair `(i, j)`,
//! `i < j`, within kill radius rolls four d6: attack(i), defense(j),
//! attack(j), defense(i). A side kills when its attack beats the other's
//! defense, the kill table allows it and the pair is within the attacker's
//! own kill radius. An NPC that died earlier in the pass takes no further part
//! in it, neither as attacker nor as victim.

use std::collections::HashSet;

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::components::{Entity, KillEvent};
use crate::config::SimConfig;
use crate::notify::KillSender;
use crate::rules::can_kill;
use crate::systems::{sleep_random, WorkerContext};

/// Result of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatOutcome {
    /// Names of the dead, each once.
    pub dead: Vec<String>,
    /// Kills in discovery order.
    pub events: Vec<KillEvent>,
}

impl CombatOutcome {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn record(&mut self, killer: &Entity, victim: &Entity) {
        self.dead.push(victim.name.clone());
        self.events
            .push(KillEvent::new(killer.name.as_str(), victim.name.as_str()));
    }
}

/// Pairs within either member's kill radius, in `(i, j)` enumeration order.
fn engagements(snapshot: &[Entity], config: &SimConfig) -> Vec<(usize, usize, f64)> {
    let reach = move |e: &Entity| config.stats(e.archetype).kill_distance;

    (0..snapshot.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = &snapshot[i];
            snapshot[i + 1..]
                .iter()
                .enumerate()
                .filter_map(move |(offset, b)| {
                    let distance = a.distance_to(b);
                    (distance <= reach(a).max(reach(b))).then_some((i, i + 1 + offset, distance))
                })
        })
        .collect()
}

fn strikes(attacker: &Entity, defender: &Entity, distance: f64, config: &SimConfig) -> bool {
    can_kill(attacker.archetype, defender.archetype)
        && distance <= config.stats(attacker.archetype).kill_distance
}

/// Resolve every fight in `snapshot`. The registry is not touched; the caller
/// removes `dead` and publishes `events`.
pub fn resolve_pass<R: Rng + ?Sized>(
    snapshot: &[Entity],
    config: &SimConfig,
    rng: &mut R,
) -> CombatOutcome {
    let mut outcome = CombatOutcome::default();
    if snapshot.len() < 2 {
        return outcome;
    }

    let d6 = Uniform::new_inclusive(1u8, 6);
    let mut killed: HashSet<&str> = HashSet::new();

    for (i, j, distance) in engagements(snapshot, config) {
        let (a, b) = (&snapshot[i], &snapshot[j]);
        if killed.contains(a.name.as_str()) || killed.contains(b.name.as_str()) {
            continue;
        }

        let attack_a = d6.sample(rng);
        let defense_b = d6.sample(rng);
        let attack_b = d6.sample(rng);
        let defense_a = d6.sample(rng);

        let a_kills_b = attack_a > defense_b && strikes(a, b, distance, config);
        let b_kills_a = attack_b > defense_a && strikes(b, a, distance, config);

        if a_kills_b {
            killed.insert(&b.name);
            outcome.record(a, b);
        }
        if b_kills_a {
            killed.insert(&a.name);
            outcome.record(b, a);
        }
    }

    outcome
}

/// Combat loop: snapshot, resolve, remove the dead in one write, then queue
/// the kills for delivery.
pub fn run_combat_worker(ctx: WorkerContext, sink: KillSender) {
    let mut rng = rand::thread_rng();
    let mut passes = 0u64;
    let mut kills = 0usize;

    while ctx.is_running() {
        sleep_random(ctx.config.combat_interval_ms, &mut rng);
        if !ctx.is_running() {
            break;
        }

        let snapshot = ctx.registry.snapshot();
        if snapshot.len() < 2 {
            continue;
        }

        let outcome = resolve_pass(&snapshot, &ctx.config, &mut rng);
        passes += 1;
        if outcome.is_empty() {
            continue;
        }

        let removed = ctx.registry.remove_by_names(outcome.dead.as_slice());
        kills += removed;
        debug!(
            "Combat pass {}: {} killed, {} alive",
            passes,
            removed,
            snapshot.len() - removed
        );

        if sink.send(outcome.events).is_err() {
            warn!("Kill dispatcher closed; dropping events");
        }
    }

    debug!(
        "Combat worker stopped after {} passes, {} kills",
        passes, kills
    );
}
