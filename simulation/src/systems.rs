//! Simulation workers.
//!
//! Each worker is split into a pure step that takes an injectable RNG and a
//! loop that runs that step on its own thread until the shared run flag
//! clears.

pub mod battle;
pub mod combat;
pub mod movement;
pub mod reporting;

pub use battle::run_battle;
pub use combat::{resolve_pass, run_combat_worker, CombatOutcome};
pub use movement::{movement_step, run_movement_worker};
pub use reporting::{run_reporting_worker, FinalReport, MapFrame};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::{IntervalMs, SimConfig};
use crate::registry::Registry;

/// Everything a worker thread shares with the supervisor.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub registry: Arc<Registry>,
    pub config: Arc<SimConfig>,
    pub running: Arc<AtomicBool>,
    pub started: Instant,
}

impl WorkerContext {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Sleep for a uniformly drawn number of milliseconds within `interval`.
pub(crate) fn sleep_random<R: Rng + ?Sized>(interval: IntervalMs, rng: &mut R) {
    let ms = rng.gen_range(interval.range());
    thread::sleep(Duration::from_millis(ms));
}
