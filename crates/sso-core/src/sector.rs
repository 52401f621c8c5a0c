//! Sectors: the cells of the explorable grid.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::grid::Coord;

/// What occupies a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorKind {
    /// Nothing but vacuum.
    Empty,
    /// A star with orbiting bodies.
    StarSystem,
    /// A cloud of ionised gas.
    Nebula,
    /// A drifting rock field, rich in ore.
    AsteroidField,
    /// Something that should not be there.
    Anomaly,
    /// A collapsed star.
    BlackHole,
}

impl SectorKind {
    /// All kinds, in generation-table order.
    pub const ALL: [SectorKind; 6] = [
        Self::Empty,
        Self::StarSystem,
        Self::Nebula,
        Self::AsteroidField,
        Self::Anomaly,
        Self::BlackHole,
    ];

    /// Relative weight of this kind when generating a new grid.
    pub fn weight(self) -> u32 {
        match self {
            Self::Empty => 40,
            Self::StarSystem => 20,
            Self::Nebula => 15,
            Self::AsteroidField => 12,
            Self::Anomaly => 8,
            Self::BlackHole => 5,
        }
    }

    /// Single-character glyph for map rendering.
    pub fn glyph(self) -> char {
        match self {
            Self::Empty => '.',
            Self::StarSystem => '*',
            Self::Nebula => '~',
            Self::AsteroidField => ':',
            Self::Anomaly => '?',
            Self::BlackHole => '@',
        }
    }

    /// Parse a kind from a user-facing name (case-insensitive, spaces or underscores).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "empty" | "empty_space" => Ok(Self::Empty),
            "star_system" | "star" => Ok(Self::StarSystem),
            "nebula" => Ok(Self::Nebula),
            "asteroid_field" | "asteroids" => Ok(Self::AsteroidField),
            "anomaly" => Ok(Self::Anomaly),
            "black_hole" => Ok(Self::BlackHole),
            _ => Err(CoreError::UnknownName {
                what: "sector kind",
                name: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty Space"),
            Self::StarSystem => write!(f, "Star System"),
            Self::Nebula => write!(f, "Nebula"),
            Self::AsteroidField => write!(f, "Asteroid Field"),
            Self::Anomaly => write!(f, "Anomaly"),
            Self::BlackHole => write!(f, "Black Hole"),
        }
    }
}

/// Who holds a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// Unclaimed.
    #[default]
    Neutral,
    /// Claimed by the player's ship.
    Player,
}

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// What occupies the sector.
    pub kind: SectorKind,
    /// Whether the ship has arrived here at least once.
    pub explored: bool,
    /// Current owner.
    pub owner: Owner,
}

impl Sector {
    /// Create an unexplored, neutral sector.
    pub fn new(x: i32, y: i32, kind: SectorKind) -> Self {
        Self {
            x,
            y,
            kind,
            explored: false,
            owner: Owner::Neutral,
        }
    }

    /// The sector's coordinate.
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    /// Mark the sector explored and claim it for the player.
    ///
    /// Returns `true` if this call explored the sector for the first time.
    pub fn explore(&mut self) -> bool {
        let first = !self.explored;
        self.explored = true;
        self.owner = Owner::Player;
        first
    }
}
