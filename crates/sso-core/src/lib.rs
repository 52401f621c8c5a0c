//! Core types for Soul Ship Odyssey: the sector grid, the ship, and progression.
//!
//! This crate holds the pure data model the game session mutates. Nothing here
//! knows about timers, persistence, or narrative text; every operation is a
//! plain function over owned state, so the rules can be exercised directly.

/// Achievement catalog and unlock evaluation.
pub mod achievement;
/// Stat deltas produced by events and scans, and their clamped application.
pub mod effects;
/// Error types used throughout the crate.
pub mod error;
/// The explorable sector grid and world generation.
pub mod grid;
/// XP accumulation and leveling.
pub mod progression;
/// Sector types, kinds, and ownership.
pub mod sector;
/// The player's ship and its stats.
pub mod ship;
/// Upgradeable ship systems and their cost tables.
pub mod upgrade;

/// Re-export achievement types.
pub use achievement::{Achievement, AchievementId, Achievements};
/// Re-export effect types.
pub use effects::{Effects, StatChange};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export grid types.
pub use grid::{Coord, Grid};
/// Re-export sector types.
pub use sector::{Owner, Sector, SectorKind};
/// Re-export ship types.
pub use ship::{Ship, ShipClass, ShipStatus};
/// Re-export upgrade types.
pub use upgrade::{UpgradeKind, Upgrades};
