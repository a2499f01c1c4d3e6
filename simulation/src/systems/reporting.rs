//! Periodic map frames and the end-of-run report.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::components::{Archetype, Entity, PopulationCounts};
use crate::error::Result;
use crate::persistence::write_records;
use crate::registry::Bounds;
use crate::systems::WorkerContext;

// ============================================================================
// Map frame
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSymbol {
    Empty,
    Single(Archetype),
    /// More than one archetype shares the cell.
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub symbol: CellSymbol,
    pub count: usize,
}

impl Cell {
    const EMPTY: Cell = Cell {
        symbol: CellSymbol::Empty,
        count: 0,
    };

    fn push(&mut self, archetype: Archetype) {
        self.count += 1;
        self.symbol = match self.symbol {
            CellSymbol::Empty => CellSymbol::Single(archetype),
            CellSymbol::Single(a) if a == archetype => CellSymbol::Single(a),
            _ => CellSymbol::Mixed,
        };
    }

    fn glyph(&self) -> char {
        match self.symbol {
            CellSymbol::Empty => '.',
            CellSymbol::Single(a) => a.letter(),
            CellSymbol::Mixed => 'X',
        }
    }
}

/// Coarse occupancy grid of one snapshot.
#[derive(Debug, Clone)]
pub struct MapFrame {
    pub update: u64,
    pub elapsed: Duration,
    pub grid_size: usize,
    /// Row-major, `grid_size * grid_size` cells.
    cells: Vec<Cell>,
    pub population: PopulationCounts,
}

impl MapFrame {
    pub fn from_snapshot(snapshot: &[Entity], bounds: Bounds, grid_size: usize) -> Self {
        let grid_size = grid_size.max(1);
        let mut cells = vec![Cell::EMPTY; grid_size * grid_size];
        let to_cell = |v: f64, extent: f64| -> usize {
            let scaled = (v / extent * grid_size as f64).floor();
            if scaled.is_nan() || scaled < 0.0 {
                0
            } else {
                (scaled as usize).min(grid_size - 1)
            }
        };

        for entity in snapshot {
            let col = to_cell(entity.x, bounds.width);
            let row = to_cell(entity.y, bounds.height);
            cells[row * grid_size + col].push(entity.archetype);
        }

        Self {
            update: 0,
            elapsed: Duration::ZERO,
            grid_size,
            cells,
            population: PopulationCounts::from_entities(snapshot),
        }
    }

    /// Stamp the frame with its sequence number and run time.
    pub fn at(mut self, update: u64, elapsed: Duration) -> Self {
        self.update = update;
        self.elapsed = elapsed;
        self
    }

    /// Cell at `(col, row)`, or `None` off the grid.
    pub fn cell(&self, col: usize, row: usize) -> Option<Cell> {
        if col >= self.grid_size || row >= self.grid_size {
            return None;
        }
        self.cells.get(row * self.grid_size + col).copied()
    }

    fn cell_at(&self, col: usize, row: usize) -> Cell {
        self.cells[row * self.grid_size + col]
    }
}

impl fmt::Display for MapFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Game Map Update #{} (Alive: {}, Time: {}s) ===",
            self.update,
            self.population.total(),
            self.elapsed.as_secs()
        )?;
        writeln!(f, "Stats: {}", self.population)?;

        write!(f, "    ")?;
        for col in 0..self.grid_size {
            write!(f, "{col:>2} ")?;
        }
        writeln!(f)?;

        for row in 0..self.grid_size {
            write!(f, "{row:>2}  ")?;
            for col in 0..self.grid_size {
                let cell = self.cell_at(col, row);
                write!(f, "{}", cell.glyph())?;
                if cell.count > 1 {
                    write!(f, "{}", cell.count)?;
                } else {
                    write!(f, " ")?;
                }
                write!(f, " ")?;
            }
            writeln!(f)?;
        }

        write!(
            f,
            "Legend: B=Bear, I=Bittern, D=Desman, X=Mixed, .=Empty, Number=Count"
        )
    }
}

// ============================================================================
// Final report
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FinalReport {
    /// Population when the run started.
    pub initial: usize,
    /// Registry contents at shutdown, in registry order.
    pub survivors: Vec<Entity>,
    pub elapsed: Duration,
}

impl FinalReport {
    pub fn new(initial: usize, survivors: Vec<Entity>, elapsed: Duration) -> Self {
        Self {
            initial,
            survivors,
            elapsed,
        }
    }

    pub fn survivor_count(&self) -> usize {
        self.survivors.len()
    }

    pub fn killed(&self) -> usize {
        self.initial.saturating_sub(self.survivors.len())
    }

    /// Survivors as a percentage of the initial population; 0 for an empty start.
    pub fn survival_rate(&self) -> f64 {
        if self.initial == 0 {
            0.0
        } else {
            self.survivors.len() as f64 * 100.0 / self.initial as f64
        }
    }

    pub fn population(&self) -> PopulationCounts {
        PopulationCounts::from_entities(&self.survivors)
    }

    pub fn survivors_of(&self, archetype: Archetype) -> impl Iterator<Item = &Entity> {
        self.survivors
            .iter()
            .filter(move |e| e.archetype == archetype)
    }

    /// Write the survivors as a loadable roster.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        write_records(&self.survivors, BufWriter::new(file))?;
        info!(
            "Final state ({} survivors) saved to {}",
            self.survivors.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "=== GAME OVER ===")?;
        writeln!(f, "Total time: {:.1} seconds", self.elapsed.as_secs_f64())?;
        writeln!(f, "Survivors ({}):", self.survivor_count())?;
        writeln!(f, "{}", "-".repeat(50))?;

        if self.survivors.is_empty() {
            writeln!(f, "No survivors! All NPCs were killed.")?;
        } else {
            for archetype in Archetype::ALL {
                let group: Vec<&Entity> = self.survivors_of(archetype).collect();
                if group.is_empty() {
                    continue;
                }
                writeln!(f, "\n{} ({}):", archetype.plural(), group.len())?;
                for entity in group {
                    writeln!(
                        f,
                        "  {:<15} at ({:<6.1}, {:<6.1})",
                        entity.name, entity.x, entity.y
                    )?;
                }
            }
        }
        writeln!(f, "{rule}")?;

        writeln!(f, "\nFinal Statistics:")?;
        writeln!(f, "Initial NPCs: {}", self.initial)?;
        writeln!(f, "Survivors: {}", self.survivor_count())?;
        writeln!(f, "Killed: {}", self.killed())?;
        write!(f, "Survival rate: {:.1}%", self.survival_rate())
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Render a frame every report interval until the run flag clears.
pub fn run_reporting_worker(ctx: WorkerContext) {
    let mut updates = 0u64;

    while ctx.is_running() {
        thread::sleep(ctx.config.report_interval());
        if !ctx.is_running() {
            break;
        }

        let snapshot = ctx.registry.snapshot();
        updates += 1;
        let frame = MapFrame::from_snapshot(&snapshot, ctx.config.map_bounds(), ctx.config.grid_size)
            .at(updates, ctx.elapsed());

        if ctx.config.print_map {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "\n{frame}");
        } else {
            debug!(
                "Map update #{}: {} alive ({})",
                frame.update,
                frame.population.total(),
                frame.population
            );
        }
    }

    debug!("Reporting worker stopped after {} frames", updates);
}
