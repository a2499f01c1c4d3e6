//! Arena command line
//!
//! Runs the threaded simulation or edits a roster file by hand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use simulation::rules::describe_rules;
use simulation::systems::run_battle;
use simulation::{
    Archetype, ConsoleObserver, Entity, FileObserver, ObserverSet, Registry, SimConfig,
    SimulationWorld,
};

#[derive(Parser)]
#[command(name = "arena")]
#[command(about = "Bears, Bitterns and Desmans fighting it out on a shared map")]
struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the multi-threaded simulation
    Simulate {
        /// JSON config file; missing fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of NPCs to seed
        #[arg(long)]
        population: Option<usize>,

        /// Run length in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Start from a roster file instead of seeding
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Do not print map frames
        #[arg(long)]
        no_map: bool,

        /// Where to write the survivors
        #[arg(long)]
        final_state: Option<PathBuf>,
    },
    /// Add one NPC to a roster file, creating it if needed
    Add {
        roster: PathBuf,
        #[arg(value_name = "TYPE")]
        archetype: Archetype,
        name: String,
        x: f64,
        y: f64,
    },
    /// Print every NPC in a roster file
    List { roster: PathBuf },
    /// Fight a turn-based battle over a roster and save the survivors
    Battle {
        roster: PathBuf,

        /// Largest distance at which two NPCs fight
        #[arg(long)]
        distance: f64,

        /// Append kills to this log file
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Print who kills whom
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Simulate {
            config,
            population,
            duration,
            roster,
            no_map,
            final_state,
        } => {
            let mut config = match config {
                Some(path) => SimConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => SimConfig::default(),
            };
            if let Some(population) = population {
                config.initial_population = population;
            }
            if let Some(duration) = duration {
                config.duration_secs = duration;
            }
            if no_map {
                config.print_map = false;
            }
            if final_state.is_some() {
                config.final_state_path = final_state;
            }
            simulate(config, roster.as_deref())
        }
        Commands::Add {
            roster,
            archetype,
            name,
            x,
            y,
        } => {
            let registry = open_roster(&roster)?;
            registry
                .add(Entity::new(archetype, name.as_str(), x, y))
                .with_context(|| format!("Could not add {name}"))?;
            registry
                .save_to_file(&roster)
                .with_context(|| format!("Failed to save {}", roster.display()))?;
            info!("Added {} {} at ({}, {})", archetype, name, x, y);
            Ok(())
        }
        Commands::List { roster } => {
            let registry = open_roster(&roster)?;
            registry.print_all(std::io::stdout().lock())?;
            Ok(())
        }
        Commands::Battle {
            roster,
            distance,
            log,
        } => {
            let registry = open_roster(&roster)?;
            let mut observers = ObserverSet::new();
            observers.add(Arc::new(ConsoleObserver));
            if let Some(log) = log {
                observers.add(Arc::new(FileObserver::new(log)));
            }

            let killed = run_battle(&registry, distance, &observers);
            println!("Battle over: {} killed, {} left", killed, registry.len());
            registry
                .save_to_file(&roster)
                .with_context(|| format!("Failed to save {}", roster.display()))?;
            Ok(())
        }
        Commands::Rules => {
            for line in describe_rules() {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn simulate(config: SimConfig, roster: Option<&Path>) -> Result<()> {
    let population = config.initial_population;
    let world = SimulationWorld::new(config).context("Invalid simulation config")?;

    match roster {
        Some(path) => {
            world
                .load_roster(path)
                .with_context(|| format!("Failed to load roster {}", path.display()))?;
        }
        None => {
            world.seed_population(population, &mut rand::thread_rng())?;
        }
    }

    println!("=== Combat rules ===");
    for line in describe_rules() {
        println!("{line}");
    }
    println!();

    let report = world.run(world.default_observers())?;
    println!("\n{report}");
    Ok(())
}

/// Editor registry filled from `path`, or empty when the file does not exist.
fn open_roster(path: &Path) -> Result<Registry> {
    let registry = Registry::for_editor();
    if path.exists() {
        registry
            .load_from_file(path)
            .with_context(|| format!("Failed to load roster {}", path.display()))?;
    }
    Ok(registry)
}
