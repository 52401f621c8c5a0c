use std::path::Path;

use colored::Colorize;

pub fn run(dir: &Path) -> Result<(), String> {
    let snapshot = super::read_snapshot(dir)?;
    let ship = &snapshot.ship;

    println!("  {}", "Soul Ship Status".bold());
    println!("{}", super::status_table(ship, &snapshot.grid, &snapshot.achievements));
    println!("{}", super::upgrade_table(ship));
    if let Some(travel) = &snapshot.travel {
        println!(
            "  En route to {} ({:.0} s remaining)",
            travel.destination,
            travel.remaining_ms as f64 / 1000.0
        );
    }
    if let Some(saved_at) = snapshot.saved_at {
        println!("  Last saved {}", saved_at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}
