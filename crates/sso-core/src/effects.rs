//! Stat deltas produced by events and scans.

use serde::{Deserialize, Serialize};

/// A requested change to the ship's stats. Missing fields deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effects {
    /// Hull delta.
    pub hull: i64,
    /// Energy delta.
    pub energy: i64,
    /// Resource delta.
    pub resources: i64,
    /// Soul delta.
    pub souls: i64,
}

impl Effects {
    /// Whether every delta is zero.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Scale resource gains by the extraction multiplier. Losses are not scaled.
    pub fn with_extraction(mut self, multiplier: f64) -> Self {
        if self.resources > 0 {
            self.resources = (self.resources as f64 * multiplier).round() as i64;
        }
        self
    }
}

impl std::fmt::Display for Effects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_deltas(
            f,
            [
                ("hull", self.hull),
                ("energy", self.energy),
                ("resources", self.resources),
                ("souls", self.souls),
            ],
        )
    }
}

/// The change actually applied after clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatChange {
    /// Applied hull change.
    pub hull: i64,
    /// Applied energy change.
    pub energy: i64,
    /// Applied resource change.
    pub resources: i64,
    /// Applied soul change.
    pub souls: i64,
}

impl std::fmt::Display for StatChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_deltas(
            f,
            [
                ("hull", self.hull),
                ("energy", self.energy),
                ("resources", self.resources),
                ("souls", self.souls),
            ],
        )
    }
}

fn write_deltas(f: &mut std::fmt::Formatter<'_>, deltas: [(&str, i64); 4]) -> std::fmt::Result {
    let parts: Vec<String> = deltas
        .iter()
        .filter(|(_, v)| *v != 0)
        .map(|(name, v)| format!("{v:+} {name}"))
        .collect();
    if parts.is_empty() {
        write!(f, "no effect")
    } else {
        write!(f, "{}", parts.join(", "))
    }
}

/// Add a signed delta to an unsigned stat, clamping into `[0, max]`.
pub(crate) fn apply_delta(value: u64, delta: i64, max: u64) -> u64 {
    let next = i128::from(value) + i128::from(delta);
    next.clamp(0, i128::from(max)) as u64
}
