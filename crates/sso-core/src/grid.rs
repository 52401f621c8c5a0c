//! The sector grid and world generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::sector::{Sector, SectorKind};

/// A grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Create a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another coordinate, in sectors.
    pub fn distance(self, other: Coord) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        dx.hypot(dy)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Largest number of sectors a grid may hold.
pub const MAX_SECTORS: usize = 1 << 20;

/// Number of sectors in a `width` x `height` grid, if that size is allowed.
fn sector_count(width: i32, height: i32) -> CoreResult<usize> {
    let invalid = CoreError::InvalidGridSize { width, height };
    if width <= 0 || height <= 0 {
        return Err(invalid);
    }
    match width.checked_mul(height).and_then(|n| usize::try_from(n).ok()) {
        Some(n) if n <= MAX_SECTORS => Ok(n),
        _ => Err(invalid),
    }
}

/// A grid as stored, before its layout has been checked.
#[derive(Deserialize)]
struct GridRecord {
    width: i32,
    height: i32,
    sectors: Vec<Sector>,
}

impl TryFrom<GridRecord> for Grid {
    type Error = CoreError;

    fn try_from(record: GridRecord) -> CoreResult<Self> {
        let GridRecord {
            width,
            height,
            sectors,
        } = record;
        if sector_count(width, height)? != sectors.len() {
            return Err(CoreError::SectorCount {
                width,
                height,
                found: sectors.len(),
            });
        }
        for (i, sector) in sectors.iter().enumerate() {
            let i = i as i32;
            let expected = Coord::new(i % width, i / width);
            if sector.coord() != expected {
                return Err(CoreError::SectorMisplaced {
                    expected,
                    found: sector.coord(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            sectors,
        })
    }
}

/// The explorable world: a rectangular, row-major grid of sectors.
///
/// Deserialization checks the layout, so a loaded grid always holds exactly
/// `width * height` sectors in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRecord")]
pub struct Grid {
    width: i32,
    height: i32,
    sectors: Vec<Sector>,
}

impl Grid {
    /// Build a grid from explicit sector kinds, given row by row.
    ///
    /// Every row must have the same length. All sectors start unexplored.
    pub fn from_kinds(rows: &[Vec<SectorKind>]) -> CoreResult<Self> {
        let height = i32::try_from(rows.len()).unwrap_or(i32::MAX);
        let width = i32::try_from(rows.first().map_or(0, Vec::len)).unwrap_or(i32::MAX);
        sector_count(width, height)?;
        if rows.iter().any(|r| r.len() as i32 != width) {
            return Err(CoreError::InvalidGridSize { width, height });
        }

        let sectors = rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(x, kind)| Sector::new(x as i32, y as i32, *kind))
            })
            .collect();

        Ok(Self {
            width,
            height,
            sectors,
        })
    }

    /// Generate a fresh world.
    ///
    /// Kinds are drawn from the weighted table in [`SectorKind::weight`]. The
    /// starting sector is explored and owned by the player.
    pub fn generate<R: Rng + ?Sized>(
        width: i32,
        height: i32,
        start: Coord,
        rng: &mut R,
    ) -> CoreResult<Self> {
        let mut sectors = Vec::with_capacity(sector_count(width, height)?);
        for y in 0..height {
            for x in 0..width {
                sectors.push(Sector::new(x, y, roll_kind(rng)));
            }
        }

        let mut grid = Self {
            width,
            height,
            sectors,
        };
        grid.get_mut(start)?.explore();
        Ok(grid)
    }

    /// Grid width in sectors.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in sectors.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether the coordinate lies inside the grid.
    pub fn contains(&self, coord: Coord) -> bool {
        (0..self.width).contains(&coord.x) && (0..self.height).contains(&coord.y)
    }

    fn index(&self, coord: Coord) -> CoreResult<usize> {
        if self.contains(coord) {
            Ok((coord.y * self.width + coord.x) as usize)
        } else {
            Err(CoreError::OutOfBounds(coord))
        }
    }

    /// Look up a sector.
    pub fn get(&self, coord: Coord) -> CoreResult<&Sector> {
        let idx = self.index(coord)?;
        Ok(&self.sectors[idx])
    }

    /// Look up a sector mutably.
    pub fn get_mut(&mut self, coord: Coord) -> CoreResult<&mut Sector> {
        let idx = self.index(coord)?;
        Ok(&mut self.sectors[idx])
    }

    /// All sectors in row-major order.
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Number of explored sectors.
    pub fn explored_count(&self) -> usize {
        self.sectors.iter().filter(|s| s.explored).count()
    }

    /// Render the grid as text, one line per row.
    ///
    /// Explored sectors show their kind glyph, unexplored ones `#`, and the
    /// ship's sector `^`.
    pub fn render(&self, ship: Coord) -> String {
        let mut out = String::with_capacity(self.sectors.len() + self.height as usize);
        for row in self.sectors.chunks(self.width as usize) {
            for sector in row {
                let glyph = if sector.coord() == ship {
                    '^'
                } else if sector.explored {
                    sector.kind.glyph()
                } else {
                    '#'
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

fn roll_kind<R: Rng + ?Sized>(rng: &mut R) -> SectorKind {
    let total: u32 = SectorKind::ALL.iter().map(|k| k.weight()).sum();
    let mut roll = rng.random_range(0..total);
    for kind in SectorKind::ALL {
        if roll < kind.weight() {
            return kind;
        }
        roll -= kind.weight();
    }
    SectorKind::Empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::Owner;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn distance_is_euclidean() {
        let a = Coord::new(5, 5);
        assert!((a.distance(Coord::new(6, 5)) - 1.0).abs() < f64::EPSILON);
        assert!((a.distance(Coord::new(8, 9)) - 5.0).abs() < f64::EPSILON);
        assert!(a.distance(a).abs() < f64::EPSILON);
    }

    #[test]
    fn generate_marks_start_explored() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = Grid::generate(10, 10, Coord::new(5, 5), &mut rng).unwrap();
        assert_eq!(grid.sectors().len(), 100);
        assert_eq!(grid.explored_count(), 1);
        let start = grid.get(Coord::new(5, 5)).unwrap();
        assert!(start.explored);
        assert_eq!(start.owner, Owner::Player);
    }

    #[test]
    fn generate_is_deterministic_per_seed() {
        let a = Grid::generate(8, 8, Coord::new(0, 0), &mut StdRng::seed_from_u64(9)).unwrap();
        let b = Grid::generate(8, 8, Coord::new(0, 0), &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generate_uses_every_kind_on_large_grid() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = Grid::generate(40, 40, Coord::new(0, 0), &mut rng).unwrap();
        for kind in SectorKind::ALL {
            assert!(
                grid.sectors().iter().any(|s| s.kind == kind),
                "missing {kind}"
            );
        }
    }

    #[test]
    fn generate_rejects_bad_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Grid::generate(0, 5, Coord::new(0, 0), &mut rng).is_err());
        assert_eq!(
            Grid::generate(3, 3, Coord::new(5, 5), &mut rng).unwrap_err(),
            CoreError::OutOfBounds(Coord::new(5, 5))
        );
    }

    #[test]
    fn sectors_are_row_major() {
        let mut rng = StdRng::seed_from_u64(0);
        let grid = Grid::generate(4, 3, Coord::new(0, 0), &mut rng).unwrap();
        let s = grid.get(Coord::new(3, 2)).unwrap();
        assert_eq!((s.x, s.y), (3, 2));
        assert!(grid.get(Coord::new(4, 0)).is_err());
        assert!(grid.get(Coord::new(-1, 0)).is_err());
    }

    #[test]
    fn from_kinds_rejects_ragged_rows() {
        let rows = vec![
            vec![SectorKind::Empty, SectorKind::Nebula],
            vec![SectorKind::Empty],
        ];
        assert!(Grid::from_kinds(&rows).is_err());
        assert!(Grid::from_kinds(&[]).is_err());
    }

    #[test]
    fn render_shows_ship_and_explored() {
        use SectorKind::*;
        let mut grid = Grid::from_kinds(&[
            vec![StarSystem, Empty, Nebula],
            vec![Anomaly, BlackHole, AsteroidField],
        ])
        .unwrap();
        grid.get_mut(Coord::new(0, 0)).unwrap().explore();
        grid.get_mut(Coord::new(2, 1)).unwrap().explore();
        grid.get_mut(Coord::new(1, 1)).unwrap().explore();

        insta::assert_snapshot!(grid.render(Coord::new(1, 1)).replace('\n', "|"), @"*##|#^:|");
    }

    #[test]
    fn generate_rejects_oversized_grids() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            Grid::generate(i32::MAX, 2, Coord::new(0, 0), &mut rng).unwrap_err(),
            CoreError::InvalidGridSize {
                width: i32::MAX,
                height: 2
            }
        );
        assert!(Grid::generate(2048, 1024, Coord::new(0, 0), &mut rng).is_err());
    }

    #[test]
    fn deserialize_rejects_bad_layouts() {
        let empty = r#"{"width":0,"height":0,"sectors":[]}"#;
        let err = serde_json::from_str::<Grid>(empty).unwrap_err();
        assert!(err.to_string().contains("invalid grid size 0x0"), "{err}");

        let mut rng = StdRng::seed_from_u64(5);
        let grid = Grid::generate(3, 3, Coord::new(1, 1), &mut rng).unwrap();
        let mut value = serde_json::to_value(&grid).unwrap();

        let mut short = value.clone();
        short["sectors"].as_array_mut().unwrap().truncate(1);
        let err = serde_json::from_value::<Grid>(short).unwrap_err();
        assert!(err.to_string().contains("lists 1 sectors"), "{err}");

        value["sectors"].as_array_mut().unwrap().swap(0, 1);
        let err = serde_json::from_value::<Grid>(value).unwrap_err();
        assert!(err.to_string().contains("stored where (0, 0) belongs"), "{err}");
    }

    #[test]
    fn serde_roundtrip() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = Grid::generate(5, 5, Coord::new(2, 2), &mut rng).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(grid, back);
    }
}
