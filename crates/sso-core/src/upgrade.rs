//! Upgradeable ship systems.
//!
//! Four systems level independently from 0 to [`MAX_LEVEL`]. Each level has a
//! fixed price in resources; two systems also raise a capacity stat.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Highest level any system can reach.
pub const MAX_LEVEL: u8 = 3;

/// Maximum hull gained per hull plating level.
pub const HULL_PER_LEVEL: u32 = 10;

/// Scan charges gained per scanner probe level.
pub const SCANS_PER_LEVEL: u32 = 1;

/// Travel-time multiplier by engine efficiency level.
pub const ENGINE_MULTIPLIERS: [f64; MAX_LEVEL as usize + 1] = [1.0, 0.85, 0.7, 0.55];

/// Resource gain multiplier by resource extraction level.
pub const EXTRACTION_MULTIPLIERS: [f64; MAX_LEVEL as usize + 1] = [1.0, 1.25, 1.5, 2.0];

/// An upgradeable ship system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Raises maximum hull.
    HullPlating,
    /// Shortens travel time.
    EngineEfficiency,
    /// Raises maximum scan charges.
    ScannerProbes,
    /// Scales resource gains.
    ResourceExtraction,
}

impl UpgradeKind {
    /// All systems, in display order.
    pub const ALL: [UpgradeKind; 4] = [
        Self::HullPlating,
        Self::EngineEfficiency,
        Self::ScannerProbes,
        Self::ResourceExtraction,
    ];

    /// Price table, indexed by current level.
    pub fn costs(self) -> [u64; MAX_LEVEL as usize] {
        match self {
            Self::HullPlating => [50, 100, 200],
            Self::EngineEfficiency => [75, 150, 300],
            Self::ScannerProbes => [60, 120, 240],
            Self::ResourceExtraction => [80, 160, 320],
        }
    }

    /// Parse a system from a user-facing name.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "hull" | "hull_plating" => Ok(Self::HullPlating),
            "engine" | "engines" | "engine_efficiency" => Ok(Self::EngineEfficiency),
            "scanner" | "scanners" | "scanner_probes" => Ok(Self::ScannerProbes),
            "extraction" | "resource_extraction" => Ok(Self::ResourceExtraction),
            _ => Err(CoreError::UnknownName {
                what: "ship system",
                name: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HullPlating => write!(f, "Hull Plating"),
            Self::EngineEfficiency => write!(f, "Engine Efficiency"),
            Self::ScannerProbes => write!(f, "Scanner Probes"),
            Self::ResourceExtraction => write!(f, "Resource Extraction"),
        }
    }
}

/// Current level of every system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    /// Hull plating level.
    pub hull_plating: u8,
    /// Engine efficiency level.
    pub engine_efficiency: u8,
    /// Scanner probe level.
    pub scanner_probes: u8,
    /// Resource extraction level.
    pub resource_extraction: u8,
}

impl Upgrades {
    /// Level of one system.
    pub fn level(&self, kind: UpgradeKind) -> u8 {
        match kind {
            UpgradeKind::HullPlating => self.hull_plating,
            UpgradeKind::EngineEfficiency => self.engine_efficiency,
            UpgradeKind::ScannerProbes => self.scanner_probes,
            UpgradeKind::ResourceExtraction => self.resource_extraction,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u8 {
        match kind {
            UpgradeKind::HullPlating => &mut self.hull_plating,
            UpgradeKind::EngineEfficiency => &mut self.engine_efficiency,
            UpgradeKind::ScannerProbes => &mut self.scanner_probes,
            UpgradeKind::ResourceExtraction => &mut self.resource_extraction,
        }
    }

    /// Price of the next level, or `None` when maxed.
    pub fn next_cost(&self, kind: UpgradeKind) -> Option<u64> {
        kind.costs().get(self.level(kind) as usize).copied()
    }

    /// Raise a system by one level. Returns the new level.
    pub(crate) fn raise(&mut self, kind: UpgradeKind) -> u8 {
        let level = self.level_mut(kind);
        *level = (*level + 1).min(MAX_LEVEL);
        *level
    }

    /// Whether any system has been bought at least once.
    pub fn any_purchased(&self) -> bool {
        UpgradeKind::ALL.iter().any(|k| self.level(*k) > 0)
    }

    /// Whether any system is at [`MAX_LEVEL`].
    pub fn any_maxed(&self) -> bool {
        UpgradeKind::ALL.iter().any(|k| self.level(*k) >= MAX_LEVEL)
    }

    /// Travel-time multiplier for the current engine level.
    pub fn engine_multiplier(&self) -> f64 {
        ENGINE_MULTIPLIERS[self.engine_efficiency.min(MAX_LEVEL) as usize]
    }

    /// Resource gain multiplier for the current extraction level.
    pub fn extraction_multiplier(&self) -> f64 {
        EXTRACTION_MULTIPLIERS[self.resource_extraction.min(MAX_LEVEL) as usize]
    }
}
