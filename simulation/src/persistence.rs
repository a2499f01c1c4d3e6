//! Roster files: one NPC per line, `<Type> <Name> <X> <Y>`.
//!
//! Coordinates are written with Rust's shortest round-trip float formatting,
//! so a saved roster loads back bit-for-bit. Loading is all-or-nothing.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::components::{Archetype, Entity};
use crate::error::{ArenaError, Result};
use crate::registry::Registry;

/// Write one record per entity, in order.
pub fn write_records<W: Write>(entities: &[Entity], mut out: W) -> Result<()> {
    for entity in entities {
        writeln!(
            out,
            "{} {} {} {}",
            entity.archetype, entity.name, entity.x, entity.y
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Parse a roster. Blank lines are skipped; any other line must be a complete
/// record or the whole parse fails.
pub fn parse_records<R: BufRead>(input: R) -> Result<Vec<Entity>> {
    let mut entities = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entities.push(parse_record(&line, idx + 1)?);
    }
    Ok(entities)
}

fn parse_record(line: &str, line_no: usize) -> Result<Entity> {
    let bad = |message: String| ArenaError::Format {
        line: line_no,
        message,
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let &[kind, name, x, y] = tokens.as_slice() else {
        return Err(bad(format!(
            "expected `<Type> <Name> <X> <Y>`, found {} field(s)",
            tokens.len()
        )));
    };

    let archetype: Archetype = kind.parse()?;
    let x: f64 = x
        .parse()
        .map_err(|_| bad(format!("x coordinate `{x}` is not a number")))?;
    let y: f64 = y
        .parse()
        .map_err(|_| bad(format!("y coordinate `{y}` is not a number")))?;

    Ok(Entity::new(archetype, name, x, y))
}

impl Registry {
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let entities = self.snapshot();
        let file = File::create(path.as_ref())?;
        write_records(&entities, BufWriter::new(file))?;
        info!("Saved {} NPCs to {}", entities.len(), path.as_ref().display());
        Ok(entities.len())
    }

    /// Replace the registry contents with the roster at `path`. Format errors
    /// and admission failures abort the load and leave the registry as it was.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let file = File::open(path.as_ref())?;
        let entities = parse_records(BufReader::new(file))?;
        let count = entities.len();
        self.replace_all(entities)?;
        info!("Loaded {} NPCs from {}", count, path.as_ref().display());
        Ok(count)
    }

    /// Printable listing: a header line followed by one record per NPC.
    pub fn print_all<W: Write>(&self, mut out: W) -> Result<()> {
        let entities = self.snapshot();
        writeln!(out, "NPC list ({}):", entities.len())?;
        write_records(&entities, out)
    }
}
