//! Arena Simulation Engine
//!
//! Bears, Bitterns and Desmans wander a bounded map and fight whenever they
//! come within reach. Movement, combat and reporting each run on their own
//! thread against one shared registry until the run timer clears the shared
//! flag.

pub mod components;
pub mod config;
pub mod error;
pub mod names;
pub mod notify;
pub mod persistence;
pub mod registry;
pub mod rules;
pub mod runner;
pub mod systems;
pub mod world;

pub use components::*;
pub use config::{ArchetypeStats, IntervalMs, SimConfig};
pub use error::{AdmissionReason, ArenaError, Result};
pub use notify::{ConsoleObserver, FileObserver, KillDispatcher, KillObserver, ObserverSet};
pub use registry::{Bounds, Registry, EDITOR_BOUND};
pub use rules::can_kill;
pub use runner::SimulationRunner;
pub use systems::{FinalReport, MapFrame};
pub use world::SimulationWorld;
