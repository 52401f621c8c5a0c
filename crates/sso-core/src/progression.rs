//! XP and leveling.

use crate::ship::Ship;

/// XP per level step: level `L` needs `L * XP_BASE` to advance.
pub const XP_BASE: u64 = 100;

/// XP needed to advance from `level` to `level + 1`.
pub fn xp_required(level: u32) -> u64 {
    u64::from(level.max(1)) * XP_BASE
}

impl Ship {
    /// Grant XP, applying every level-up it pays for.
    ///
    /// Each level-up subtracts its threshold from the pool and refills scan
    /// charges. Returns the number of levels gained.
    pub fn add_xp(&mut self, amount: u64) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= xp_required(self.level) {
            self.xp -= xp_required(self.level);
            self.level += 1;
            self.scans = self.max_scans;
            gained += 1;
        }
        gained
    }

    /// Fraction of the way to the next level (0.0 to 1.0).
    pub fn level_progress(&self) -> f64 {
        self.xp as f64 / xp_required(self.level) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;

    #[test]
    fn exact_threshold_levels_once() {
        let mut s = Ship::new(Coord::new(0, 0));
        s.scans = 0;
        assert_eq!(s.add_xp(xp_required(1)), 1);
        assert_eq!(s.level, 2);
        assert_eq!(s.xp, 0);
        assert_eq!(s.scans, s.max_scans);
    }

    #[test]
    fn below_threshold_accumulates() {
        let mut s = Ship::new(Coord::new(0, 0));
        assert_eq!(s.add_xp(60), 0);
        assert_eq!(s.add_xp(30), 0);
        assert_eq!(s.level, 1);
        assert_eq!(s.xp, 90);
        assert!((s.level_progress() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn large_grant_levels_multiple_times() {
        let mut s = Ship::new(Coord::new(0, 0));
        // 100 (L1) + 200 (L2) + 300 (L3) = 600, plus 50 left over
        assert_eq!(s.add_xp(650), 3);
        assert_eq!(s.level, 4);
        assert_eq!(s.xp, 50);
    }

    #[test]
    fn threshold_scales_with_level() {
        assert_eq!(xp_required(1), 100);
        assert_eq!(xp_required(4), 400);
        assert_eq!(xp_required(0), 100);
    }
}
