//! Simulation parameters.
//!
//! Defaults reproduce the reference run: 50 NPCs on a 100x100 map for 30
//! seconds, every archetype moving up to 5 units and fighting within 20.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::Archetype;
use crate::error::{ArenaError, Result};
use crate::registry::Bounds;

/// Movement and engagement reach of one archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeStats {
    /// Largest per-axis displacement of a single move.
    pub move_distance: f64,
    /// Largest distance at which this archetype can kill.
    pub kill_distance: f64,
}

impl Default for ArchetypeStats {
    fn default() -> Self {
        Self {
            move_distance: 5.0,
            kill_distance: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeSettings {
    pub bear: ArchetypeStats,
    pub bittern: ArchetypeStats,
    pub desman: ArchetypeStats,
}

impl ArchetypeSettings {
    pub fn get(&self, archetype: Archetype) -> &ArchetypeStats {
        match archetype {
            Archetype::Bear => &self.bear,
            Archetype::Bittern => &self.bittern,
            Archetype::Desman => &self.desman,
        }
    }

    pub fn get_mut(&mut self, archetype: Archetype) -> &mut ArchetypeStats {
        match archetype {
            Archetype::Bear => &mut self.bear,
            Archetype::Bittern => &mut self.bittern,
            Archetype::Desman => &mut self.desman,
        }
    }
}

/// Inclusive range of sleep lengths, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalMs {
    pub min: u64,
    pub max: u64,
}

impl IntervalMs {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn range(&self) -> RangeInclusive<u64> {
        self.min..=self.max
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of NPCs seeded at start when no roster is supplied.
    pub initial_population: usize,
    /// Map extent along x; also the seeding admission bound.
    pub map_width: f64,
    /// Map extent along y.
    pub map_height: f64,
    pub archetypes: ArchetypeSettings,
    /// Wall-clock length of a run.
    pub duration_secs: f64,
    pub movement_interval_ms: IntervalMs,
    pub combat_interval_ms: IntervalMs,
    /// Pause between two map frames.
    pub report_interval_ms: u64,
    /// Cells per side of the rendered occupancy grid.
    pub grid_size: usize,
    /// Print map frames to stdout; when off they go to the debug log.
    pub print_map: bool,
    /// Where the surviving roster is written when the run ends.
    pub final_state_path: Option<PathBuf>,
    /// Append-only kill log used by the file sink.
    pub kill_log_path: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_population: 50,
            map_width: 100.0,
            map_height: 100.0,
            archetypes: ArchetypeSettings::default(),
            duration_secs: 30.0,
            movement_interval_ms: IntervalMs::new(50, 200),
            combat_interval_ms: IntervalMs::new(100, 300),
            report_interval_ms: 1000,
            grid_size: 10,
            print_map: true,
            final_state_path: Some(PathBuf::from("final_state.txt")),
            kill_log_path: Some(PathBuf::from("game_log.txt")),
        }
    }
}

impl SimConfig {
    /// Read a JSON config; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn map_bounds(&self) -> Bounds {
        Bounds::new(self.map_width, self.map_height)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn stats(&self, archetype: Archetype) -> &ArchetypeStats {
        self.archetypes.get(archetype)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ArenaError::InvalidConfig(msg));

        if !(self.map_width.is_finite()
            && self.map_height.is_finite()
            && self.map_width > 0.0
            && self.map_height > 0.0)
        {
            return invalid(format!(
                "map must have positive size, got {}x{}",
                self.map_width, self.map_height
            ));
        }
        if Duration::try_from_secs_f64(self.duration_secs).is_err() {
            return invalid(format!("duration {} is not usable", self.duration_secs));
        }
        for archetype in Archetype::ALL {
            let stats = self.stats(archetype);
            let usable = |d: f64| d.is_finite() && d >= 0.0;
            if !(usable(stats.move_distance) && usable(stats.kill_distance)) {
                return invalid(format!("{archetype} distances must be finite and non-negative"));
            }
        }
        for (label, interval) in [
            ("movement", self.movement_interval_ms),
            ("combat", self.combat_interval_ms),
        ] {
            if interval.min > interval.max {
                return invalid(format!(
                    "{label} interval {}..{} is inverted",
                    interval.min, interval.max
                ));
            }
            if interval.max == 0 {
                return invalid(format!("{label} interval must allow a pause"));
            }
        }
        if self.report_interval_ms == 0 {
            return invalid("report interval must be at least 1 ms".to_string());
        }
        if self.grid_size == 0 {
            return invalid("grid size must be at least 1".to_string());
        }
        Ok(())
    }
}
