use std::path::Path;

use colored::Colorize;
use sso_game::{FileStore, GameSession, StateStore, SystemClock};

pub fn run(dir: &Path, seed: Option<u64>, force: bool) -> Result<(), String> {
    let config = super::load_config(None, seed)?;
    let store = FileStore::new(dir);

    let existing = store.get(&config.save_key).map_err(|e| e.to_string())?;
    if existing.is_some() && !force {
        return Err(format!(
            "a saved game already exists in {}; pass --force to overwrite it",
            dir.display()
        ));
    }

    let seed = config.seed;
    let path = store.path_for(&config.save_key).map_err(|e| e.to_string())?;
    let mut session = GameSession::new(
        config,
        Box::new(SystemClock::new()),
        Box::new(store),
    )
    .map_err(|e| format!("failed to create game: {e}"))?;
    session.save().map_err(|e| e.to_string())?;

    println!("  {} a new voyage (seed {seed})", "Created".green().bold());
    println!("  Saved to {}", path.display());
    println!("  Run `sso play` to set sail.");
    Ok(())
}
