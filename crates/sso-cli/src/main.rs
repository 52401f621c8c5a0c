//! CLI frontend for Soul Ship Odyssey.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sso",
    about = "Soul Ship Odyssey: chart a sector grid aboard a soul ship",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new world and write the save
    New {
        /// RNG seed for world generation
        #[arg(short, long)]
        seed: Option<u64>,

        /// Overwrite an existing save
        #[arg(short, long)]
        force: bool,

        /// Directory holding the save file
        #[arg(short = 'd', long, default_value = ".")]
        save_dir: PathBuf,
    },

    /// Load (or start) a game and play interactively
    Play {
        /// RNG seed used when no save exists
        #[arg(short, long)]
        seed: Option<u64>,

        /// Game-time speed factor (2.0 runs twice as fast as real time)
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// JSON file with game settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding the save file
        #[arg(short = 'd', long, default_value = ".")]
        save_dir: PathBuf,
    },

    /// Show the ship's stats from the save
    Status {
        /// Directory holding the save file
        #[arg(short = 'd', long, default_value = ".")]
        save_dir: PathBuf,
    },

    /// Show the sector map from the save
    Map {
        /// Directory holding the save file
        #[arg(short = 'd', long, default_value = ".")]
        save_dir: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::New {
            seed,
            force,
            save_dir,
        } => commands::new::run(&save_dir, seed, force),
        Commands::Play {
            seed,
            speed,
            config,
            save_dir,
        } => commands::play::run(&save_dir, seed, speed, config.as_deref()),
        Commands::Status { save_dir } => commands::status::run(&save_dir),
        Commands::Map { save_dir } => commands::map::run(&save_dir),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
