use std::path::Path;

pub fn run(dir: &Path) -> Result<(), String> {
    let snapshot = super::read_snapshot(dir)?;
    println!("{}", super::map_table(&snapshot.grid, &snapshot.ship));
    println!("{}", super::map_legend());
    println!(
        "  {} of {} sectors charted",
        snapshot.grid.explored_count(),
        snapshot.grid.width() * snapshot.grid.height()
    );
    Ok(())
}
