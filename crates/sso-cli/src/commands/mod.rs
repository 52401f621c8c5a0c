pub mod map;
pub mod new;
pub mod play;
pub mod status;

use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use sso_core::{Achievements, Grid, Ship, UpgradeKind, progression::xp_required};
use sso_game::{FileStore, GameConfig, Snapshot, StateStore};

/// Build the game config from an optional JSON file and a seed override.
fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<GameConfig, String> {
    let config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
            GameConfig::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => GameConfig::default(),
    };
    Ok(match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

/// Read the saved game in `dir`.
fn read_snapshot(dir: &Path) -> Result<Snapshot, String> {
    let key = GameConfig::default().save_key;
    let store = FileStore::new(dir);
    let json = store
        .get(&key)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            format!(
                "no saved game in {}; run `sso new` first",
                dir.display()
            )
        })?;
    Snapshot::from_json(&json).map_err(|e| format!("cannot read saved game: {e}"))
}

/// The ship's stats as a two-column table.
fn status_table(ship: &Ship, grid: &Grid, achievements: &Achievements) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Stat", "Value"]);

    let rows = [
        ("Class", ship.class.to_string()),
        ("Position", ship.position().to_string()),
        (
            "Status",
            if ship.is_traveling() {
                "Traveling".to_string()
            } else {
                "Idle".to_string()
            },
        ),
        ("Hull", format!("{}/{}", ship.hull, ship.max_hull)),
        ("Energy", format!("{}/{}", ship.energy, sso_core::ship::MAX_ENERGY)),
        ("Resources", ship.resources.to_string()),
        ("Souls", ship.souls.to_string()),
        (
            "Level",
            format!("{} ({}/{} XP)", ship.level, ship.xp, xp_required(ship.level)),
        ),
        ("Scans", format!("{}/{}", ship.scans, ship.max_scans)),
        (
            "Explored",
            format!(
                "{}/{}",
                grid.explored_count(),
                grid.width() * grid.height()
            ),
        ),
        (
            "Achievements",
            format!(
                "{}/{}",
                achievements.unlocked_count(),
                achievements.entries().len()
            ),
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    table
}

/// Upgrade levels and the price of the next level.
fn upgrade_table(ship: &Ship) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["System", "Level", "Next cost"]);
    for kind in UpgradeKind::ALL {
        let next = ship
            .upgrades
            .next_cost(kind)
            .map_or_else(|| "maxed".to_string(), |c| c.to_string());
        table.add_row(vec![
            kind.to_string(),
            format!("{}/{}", ship.upgrades.level(kind), sso_core::upgrade::MAX_LEVEL),
            next,
        ]);
    }
    table
}

/// The sector grid, one cell per sector, with the ship marked `^`.
fn map_table(grid: &Grid, ship: &Ship) -> Table {
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend((0..grid.width()).map(|x| x.to_string()));
    table.set_header(header);

    let rendered = grid.render(ship.position());
    for (y, line) in rendered.lines().enumerate() {
        let mut row = vec![y.to_string()];
        row.extend(line.chars().map(String::from));
        table.add_row(row);
    }
    table
}

/// Legend for [`map_table`].
fn map_legend() -> String {
    let kinds: Vec<String> = sso_core::SectorKind::ALL
        .iter()
        .map(|k| format!("{} {k}", k.glyph()))
        .collect();
    format!("  ^ ship  # uncharted  {}", kinds.join("  "))
}

/// Achievement list with lock state.
fn achievement_lines(achievements: &Achievements) -> String {
    let mut out = String::new();
    for entry in achievements.entries() {
        let mark = if entry.unlocked {
            "[x]".green().to_string()
        } else {
            "[ ]".dimmed().to_string()
        };
        out.push_str(&format!(
            "  {mark} {} - {} (+{} XP)\n",
            entry.id.title().bold(),
            entry.id.description(),
            entry.id.xp_reward()
        ));
    }
    out
}
