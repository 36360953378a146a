//! Cubemorph
//!
//! Plays a 3x3x3 twisty puzzle that morphs between a cube, a 2x2, a
//! pyramorphix and a mirror cube. Runs an interactive 3D viewer by default,
//! or applies moves headlessly and prints the resulting permutation.

mod visualization;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cubemorph::animation::Easing;
use cubemorph::{EngineConfig, InitialShape, PuzzleEngine};

/// Plays and morphs a 3x3x3 twisty puzzle.
#[derive(Parser)]
#[command(name = "cubemorph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with engine settings; the options below override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seconds per slice turn.
    #[arg(long, global = true)]
    turn_duration: Option<f32>,
    /// Seconds per shape change step.
    #[arg(long, global = true)]
    shape_duration: Option<f32>,
    /// Seed for reproducible shuffles.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Starting shape: cube, 2x2, pyramorphix, mirrorcube or mirror-gold.
    #[arg(long, global = true)]
    shape: Option<InitialShape>,
    /// Animation curve: linear, ease-in, ease-out or ease-in-out.
    #[arg(long, global = true)]
    easing: Option<Easing>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive 3D viewer.
    View,
    /// Apply move tokens without animation and print the permutation.
    Play {
        /// Move tokens such as `r`, `U` or `f!`.
        moves: Vec<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Command::Play { moves }) => print!("{}", play_report(config, &moves)),
        Some(Command::View) | None => {
            println!("Controls: letters turn (shift inverse, alt wide), F1 help, F2-F5 shapes, F9 shuffle");
            visualization::display(config);
        }
    }
}

/// Loads the config file, if any, and applies the command-line overrides.
fn build_config(cli: &Cli) -> Result<EngineConfig, cubemorph::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seconds) = cli.turn_duration {
        config.turn_duration = seconds;
    }
    if let Some(seconds) = cli.shape_duration {
        config.shape_duration = seconds;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(shape) = cli.shape {
        config.initial_shape = shape;
    }
    if let Some(easing) = cli.easing {
        config.easing = easing;
    }
    Ok(config)
}

/// Plays the tokens one after another and describes the final state.
fn play_report(config: EngineConfig, tokens: &[String]) -> String {
    let mut engine = PuzzleEngine::new(config);
    for token in tokens {
        engine.submit_move(token);
        engine.run_until_idle();
    }

    let history: Vec<String> = engine.history().iter().map(|m| m.to_string()).collect();
    let mut output = format!("Moves: {}\n", history.join(" "));
    output.push_str(&format!(
        "Solved: {}\n\n",
        if engine.model().is_solved() { "yes" } else { "no" }
    ));
    output.push_str(&engine.model().layout());
    output
}
