//! The player's ship.

use serde::{Deserialize, Serialize};

use crate::effects::{Effects, StatChange, apply_delta};
use crate::error::{CoreError, CoreResult};
use crate::grid::Coord;
use crate::upgrade::{HULL_PER_LEVEL, SCANS_PER_LEVEL, UpgradeKind, Upgrades};

/// Energy is always within `0..=MAX_ENERGY`.
pub const MAX_ENERGY: u32 = 100;
/// Maximum hull of an unupgraded ship.
pub const BASE_HULL: u32 = 100;
/// Scan charges of an unupgraded ship.
pub const BASE_SCANS: u32 = 3;
/// Resources a new ship starts with.
pub const STARTING_RESOURCES: u64 = 100;

/// Whether the ship is moving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipStatus {
    /// Parked in a sector.
    #[default]
    Idle,
    /// On a travel leg.
    Traveling,
}

/// Cosmetic hull design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipClass {
    /// The default scout.
    #[default]
    Wayfarer,
    /// A heavy cruiser silhouette.
    Harbinger,
    /// A long-haul ark.
    Leviathan,
    /// A stealth frame.
    Wraith,
}

impl ShipClass {
    /// All classes.
    pub const ALL: [ShipClass; 4] = [Self::Wayfarer, Self::Harbinger, Self::Leviathan, Self::Wraith];

    /// Parse a class name (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownName {
                what: "ship class",
                name: s.to_string(),
            })
    }
}

impl std::fmt::Display for ShipClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wayfarer => write!(f, "Wayfarer"),
            Self::Harbinger => write!(f, "Harbinger"),
            Self::Leviathan => write!(f, "Leviathan"),
            Self::Wraith => write!(f, "Wraith"),
        }
    }
}

/// Ship state. Owned by exactly one game session.
///
/// `hull <= max_hull`, `energy <= MAX_ENERGY` and `scans <= max_scans` hold
/// after every operation in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Column of the sector the ship is in.
    pub x: i32,
    /// Row of the sector the ship is in.
    pub y: i32,
    /// Idle or traveling.
    pub status: ShipStatus,
    /// Current hull integrity.
    pub hull: u32,
    /// Maximum hull integrity.
    pub max_hull: u32,
    /// Current energy.
    pub energy: u32,
    /// Spendable resources.
    pub resources: u64,
    /// Souls gathered.
    #[serde(default)]
    pub souls: u64,
    /// Current level, starting at 1.
    pub level: u32,
    /// XP accumulated toward the next level.
    pub xp: u64,
    /// Remaining scan charges.
    pub scans: u32,
    /// Scan charge capacity.
    pub max_scans: u32,
    /// System upgrade levels.
    #[serde(default)]
    pub upgrades: Upgrades,
    /// Cosmetic hull design.
    #[serde(default)]
    pub class: ShipClass,
}

impl Ship {
    /// A fresh ship parked at `start`.
    pub fn new(start: Coord) -> Self {
        Self {
            x: start.x,
            y: start.y,
            status: ShipStatus::Idle,
            hull: BASE_HULL,
            max_hull: BASE_HULL,
            energy: MAX_ENERGY,
            resources: STARTING_RESOURCES,
            souls: 0,
            level: 1,
            xp: 0,
            scans: BASE_SCANS,
            max_scans: BASE_SCANS,
            upgrades: Upgrades::default(),
            class: ShipClass::default(),
        }
    }

    /// The sector the ship is in.
    pub fn position(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    /// Move the ship to a sector.
    pub fn move_to(&mut self, coord: Coord) {
        self.x = coord.x;
        self.y = coord.y;
    }

    /// Whether the ship is on a travel leg.
    pub fn is_traveling(&self) -> bool {
        self.status == ShipStatus::Traveling
    }

    /// Apply a stat delta, clamping every stat into its valid range.
    pub fn apply_effects(&mut self, effects: &Effects) -> StatChange {
        let (hull, energy, resources, souls) = (self.hull, self.energy, self.resources, self.souls);

        self.hull = apply_delta(u64::from(self.hull), effects.hull, u64::from(self.max_hull)) as u32;
        self.energy =
            apply_delta(u64::from(self.energy), effects.energy, u64::from(MAX_ENERGY)) as u32;
        self.resources = apply_delta(self.resources, effects.resources, u64::MAX);
        self.souls = apply_delta(self.souls, effects.souls, u64::MAX);

        StatChange {
            hull: i64::from(self.hull) - i64::from(hull),
            energy: i64::from(self.energy) - i64::from(energy),
            resources: signed_diff(self.resources, resources),
            souls: signed_diff(self.souls, souls),
        }
    }

    /// Spend one scan charge. Returns `false` when none are left.
    pub fn use_scan(&mut self) -> bool {
        if self.scans == 0 {
            return false;
        }
        self.scans -= 1;
        true
    }

    /// Buy the next level of a system.
    ///
    /// Deducts the cost and, for hull plating and scanner probes, raises the
    /// matching capacity and clamps the current value to it. Returns the new
    /// level.
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> CoreResult<u8> {
        let cost = self
            .upgrades
            .next_cost(kind)
            .ok_or(CoreError::UpgradeMaxed(kind))?;
        if self.resources < cost {
            return Err(CoreError::InsufficientResources {
                kind,
                cost,
                available: self.resources,
            });
        }

        self.resources -= cost;
        let level = self.upgrades.raise(kind);
        match kind {
            UpgradeKind::HullPlating => {
                self.max_hull += HULL_PER_LEVEL;
                self.hull = self.hull.min(self.max_hull);
            }
            UpgradeKind::ScannerProbes => {
                self.max_scans += SCANS_PER_LEVEL;
                self.scans = self.scans.min(self.max_scans);
            }
            UpgradeKind::EngineEfficiency | UpgradeKind::ResourceExtraction => {}
        }
        Ok(level)
    }
}

fn signed_diff(after: u64, before: u64) -> i64 {
    if after >= before {
        i64::try_from(after - before).unwrap_or(i64::MAX)
    } else {
        -i64::try_from(before - after).unwrap_or(i64::MAX)
    }
}
