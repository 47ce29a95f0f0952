//! Civforge - Entry Point
//!
//! Headless runner: generates a world, simulates a number of turns with
//! every civilization under AI control, and prints the standings.

use std::path::PathBuf;

use clap::Parser;

use civforge::core::config::GameConfig;
use civforge::core::error::Result;
use civforge::data::GameData;
use civforge::save;
use civforge::sim::state::GameState;
use civforge::sim::turn::advance_turn;

#[derive(Parser, Debug)]
#[command(name = "civforge", about = "Turn-based strategy simulation engine")]
struct Args {
    /// Map width in tiles
    #[arg(long, default_value_t = 40)]
    width: u32,

    /// Map height in tiles
    #[arg(long, default_value_t = 30)]
    height: u32,

    /// World seed; the same seed reproduces the same game
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Number of turns to simulate
    #[arg(long, default_value_t = 50)]
    turns: u32,

    /// Directory of JSON data tables overriding the builtin ones
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Resume from a saved game instead of generating a world
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write a save snapshot when the run finishes
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "civforge=info".to_string()),
        )
        .init();

    let args = Args::parse();

    let data = match &args.data_dir {
        Some(dir) => GameData::load_dir(dir)?,
        None => GameData::builtin(),
    };

    let mut state = match &args.load {
        Some(path) => save::load_game(path)?,
        None => {
            let mut config = GameConfig {
                width: args.width,
                height: args.height,
                seed: args.seed,
                ..GameConfig::default()
            };
            // Nobody is at the keyboard in a headless run.
            for civ in &mut config.civs {
                civ.is_ai = true;
            }
            GameState::new(&config, &data)?
        }
    };

    for _ in 0..args.turns {
        advance_turn(&mut state, &data)?;
        // Events are for a front end; the headless runner discards them.
        state.drain_events();
        if state.living_civs().count() <= 1 {
            break;
        }
    }

    print_standings(&state, &data);

    if let Some(path) = &args.save {
        save::save_game(&state, path)?;
    }
    Ok(())
}

fn print_standings(state: &GameState, data: &GameData) {
    println!("\n=== standings after turn {} ===", state.turn);
    println!(
        "{:<12} {:<12} {:>6} {:>4} {:>5} {:>6} {:>8}",
        "civ", "leader", "cities", "pop", "techs", "gold", "military"
    );
    for civ in &state.civs {
        let status = if civ.is_defeated() { " (defeated)" } else { "" };
        println!(
            "{:<12} {:<12} {:>6} {:>4} {:>5} {:>6} {:>8}{}",
            civ.name,
            civ.leader,
            civ.cities.len(),
            state.total_population(civ.id),
            civ.technologies.len(),
            civ.gold,
            state.military_strength(civ.id, data),
            status
        );
    }
}
