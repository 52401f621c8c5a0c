//! Achievements: one-shot rewards for reaching milestones.
//!
//! Each achievement is a pure predicate over the ship and grid. Unlocking is
//! monotonic and pays its XP reward exactly once.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::ship::Ship;

/// Identifies an achievement in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementId {
    /// Explore a second sector.
    Explorer1,
    /// Explore ten sectors.
    Explorer10,
    /// Explore twenty-five sectors.
    Cartographer,
    /// Buy any upgrade.
    FirstUpgrade,
    /// Max out any system.
    FullyUpgraded,
    /// Reach level 5.
    Level5,
    /// Hold 500 resources.
    Hoarder,
    /// Gather ten souls.
    SoulCollector,
}

impl AchievementId {
    /// The catalog, in display order.
    pub const ALL: [AchievementId; 8] = [
        Self::Explorer1,
        Self::Explorer10,
        Self::Cartographer,
        Self::FirstUpgrade,
        Self::FullyUpgraded,
        Self::Level5,
        Self::Hoarder,
        Self::SoulCollector,
    ];

    /// Stable identifier used in saves.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explorer1 => "explorer_1",
            Self::Explorer10 => "explorer_10",
            Self::Cartographer => "cartographer",
            Self::FirstUpgrade => "first_upgrade",
            Self::FullyUpgraded => "fully_upgraded",
            Self::Level5 => "level_5",
            Self::Hoarder => "hoarder",
            Self::SoulCollector => "soul_collector",
        }
    }

    /// Look up an id by its stable identifier.
    pub fn from_str_id(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    /// Player-facing title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Explorer1 => "First Steps",
            Self::Explorer10 => "Pathfinder",
            Self::Cartographer => "Cartographer",
            Self::FirstUpgrade => "Tinkerer",
            Self::FullyUpgraded => "Overclocked",
            Self::Level5 => "Seasoned Captain",
            Self::Hoarder => "Hoarder",
            Self::SoulCollector => "Soul Collector",
        }
    }

    /// What it takes to unlock.
    pub fn description(self) -> &'static str {
        match self {
            Self::Explorer1 => "Explore a second sector",
            Self::Explorer10 => "Explore 10 sectors",
            Self::Cartographer => "Explore 25 sectors",
            Self::FirstUpgrade => "Purchase any ship upgrade",
            Self::FullyUpgraded => "Bring any ship system to max level",
            Self::Level5 => "Reach level 5",
            Self::Hoarder => "Hold 500 resources at once",
            Self::SoulCollector => "Gather 10 souls",
        }
    }

    /// XP granted on unlock.
    pub fn xp_reward(self) -> u64 {
        match self {
            Self::Explorer1 | Self::FirstUpgrade => 25,
            Self::Hoarder | Self::SoulCollector => 50,
            Self::FullyUpgraded => 75,
            Self::Explorer10 | Self::Level5 => 100,
            Self::Cartographer => 250,
        }
    }

    /// Whether the unlock condition holds.
    pub fn is_met(self, ship: &Ship, grid: &Grid) -> bool {
        match self {
            Self::Explorer1 => grid.explored_count() >= 2,
            Self::Explorer10 => grid.explored_count() >= 10,
            Self::Cartographer => grid.explored_count() >= 25,
            Self::FirstUpgrade => ship.upgrades.any_purchased(),
            Self::FullyUpgraded => ship.upgrades.any_maxed(),
            Self::Level5 => ship.level >= 5,
            Self::Hoarder => ship.resources >= 500,
            Self::SoulCollector => ship.souls >= 10,
        }
    }
}

impl std::fmt::Display for AchievementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// One catalog entry and its unlock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    /// Which achievement.
    pub id: AchievementId,
    /// Whether it has been unlocked.
    pub unlocked: bool,
}

/// Saved form of one achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementRecord {
    /// Stable identifier, see [`AchievementId::as_str`].
    pub id: String,
    /// Whether it was unlocked.
    pub unlocked: bool,
}

/// The full catalog with unlock flags.
///
/// Saved records are reconciled against the catalog when loaded: unknown ids
/// are dropped and new catalog entries start locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AchievementRecord>", into = "Vec<AchievementRecord>")]
pub struct Achievements {
    entries: Vec<Achievement>,
}

impl Default for Achievements {
    fn default() -> Self {
        Self::new()
    }
}

impl Achievements {
    /// The full catalog, all locked.
    pub fn new() -> Self {
        Self {
            entries: AchievementId::ALL
                .into_iter()
                .map(|id| Achievement {
                    id,
                    unlocked: false,
                })
                .collect(),
        }
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[Achievement] {
        &self.entries
    }

    /// Whether an achievement is unlocked.
    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.entries.iter().any(|a| a.id == id && a.unlocked)
    }

    /// Number of unlocked achievements.
    pub fn unlocked_count(&self) -> usize {
        self.entries.iter().filter(|a| a.unlocked).count()
    }

    /// Evaluate every locked achievement and unlock those whose condition holds.
    ///
    /// Rewards are paid into the ship immediately. Since a reward can itself
    /// satisfy another condition (XP into level 5), evaluation repeats until
    /// nothing new unlocks. Returns the newly unlocked ids in unlock order.
    pub fn check(&mut self, ship: &mut Ship, grid: &Grid) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        loop {
            let before = unlocked.len();
            for entry in self.entries.iter_mut().filter(|a| !a.unlocked) {
                if entry.id.is_met(ship, grid) {
                    entry.unlocked = true;
                    ship.add_xp(entry.id.xp_reward());
                    unlocked.push(entry.id);
                }
            }
            if unlocked.len() == before {
                return unlocked;
            }
        }
    }
}

impl From<Vec<AchievementRecord>> for Achievements {
    fn from(records: Vec<AchievementRecord>) -> Self {
        let mut achievements = Self::new();
        for record in records {
            let entry = AchievementId::from_str_id(&record.id)
                .and_then(|id| achievements.entries.iter_mut().find(|a| a.id == id));
            if let Some(entry) = entry {
                entry.unlocked |= record.unlocked;
            }
        }
        achievements
    }
}

impl From<Achievements> for Vec<AchievementRecord> {
    fn from(achievements: Achievements) -> Self {
        achievements
            .entries
            .into_iter()
            .map(|a| AchievementRecord {
                id: a.id.as_str().to_string(),
                unlocked: a.unlocked,
            })
            .collect()
    }
}
