//! Simulation Runner - supervises the worker threads of one run

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::error::Result;
use crate::notify::{KillDispatcher, KillSender, ObserverSet};
use crate::registry::Registry;
use crate::systems::{run_combat_worker, run_movement_worker, run_reporting_worker, WorkerContext};

/// Longest stretch the timer sleeps before re-checking the run flag.
const TIMER_SLICE: Duration = Duration::from_millis(50);

/// Owns the run flag, the worker threads and the kill dispatcher.
pub struct SimulationRunner {
    is_running: Arc<AtomicBool>,
    workers: Vec<(&'static str, JoinHandle<()>)>,
    dispatcher: Option<KillDispatcher>,
    started: Option<Instant>,
}

impl SimulationRunner {
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
            dispatcher: None,
            started: None,
        }
    }

    /// Start movement, combat and reporting against `registry`, plus a timer
    /// that clears the run flag after `config.duration()`.
    ///
    /// Kill events go to `observers` from a separate delivery thread.
    pub fn start(
        &mut self,
        registry: Arc<Registry>,
        config: Arc<SimConfig>,
        observers: ObserverSet,
    ) -> Result<()> {
        if self.is_running() {
            warn!("Simulation runner already running");
            return Ok(());
        }
        // Leftovers of a run that ended on its own.
        self.wait();

        info!(
            "Starting simulation: {} NPCs for {:.1}s",
            registry.len(),
            config.duration_secs
        );

        let dispatcher = KillDispatcher::spawn(observers)?;
        let Some(sink) = dispatcher.sender() else {
            return Err(io::Error::other("kill dispatcher closed before start").into());
        };
        self.dispatcher = Some(dispatcher);

        let started = Instant::now();
        self.started = Some(started);
        self.is_running.store(true, Ordering::Release);

        let ctx = WorkerContext {
            registry,
            config: Arc::clone(&config),
            running: Arc::clone(&self.is_running),
            started,
        };

        // Too long to represent means run until stopped.
        let deadline = started.checked_add(config.duration());
        if let Err(e) = self.spawn_all(ctx, sink, deadline) {
            self.stop();
            return Err(e);
        }
        Ok(())
    }

    fn spawn_all(
        &mut self,
        ctx: WorkerContext,
        sink: KillSender,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let movement = ctx.clone();
        self.spawn_worker("movement", move || run_movement_worker(movement))?;
        let combat = ctx.clone();
        self.spawn_worker("combat", move || run_combat_worker(combat, sink))?;
        self.spawn_worker("reporting", move || run_reporting_worker(ctx))?;

        let running = Arc::clone(&self.is_running);
        self.spawn_worker("run-timer", move || run_timer(running, deadline))
    }

    fn spawn_worker<F>(&mut self, name: &'static str, body: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new().name(name.into()).spawn(body)?;
        self.workers.push((name, handle));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Join every thread of the current run, then drain the kill dispatcher.
    /// Returns the wall time since `start`.
    pub fn wait(&mut self) -> Duration {
        for (name, handle) in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("{} thread panicked", name);
            }
        }
        if let Some(mut dispatcher) = self.dispatcher.take() {
            dispatcher.shutdown();
        }
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Clear the run flag and join everything. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.workers.is_empty() && self.dispatcher.is_none() {
            return;
        }

        info!("Stopping simulation runner...");
        self.is_running.store(false, Ordering::Release);
        self.wait();
    }
}

impl Default for SimulationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_timer(running: Arc<AtomicBool>, deadline: Option<Instant>) {
    while running.load(Ordering::Acquire) {
        let left = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => TIMER_SLICE,
        };
        if left.is_zero() {
            info!("Run time elapsed");
            running.store(false, Ordering::Release);
            break;
        }
        thread::sleep(TIMER_SLICE.min(left));
    }
    debug!("Run timer stopped");
}
