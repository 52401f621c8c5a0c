//! Time sources for the session.
//!
//! The session never reads wall-clock time directly. It asks a [`Clock`] for
//! milliseconds since an arbitrary origin, which lets tests step time by hand
//! and lets the CLI run the game faster than real time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonic millisecond counter.
pub trait Clock: std::fmt::Debug {
    /// Milliseconds elapsed since the clock's origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Real time, optionally sped up.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    speed: f64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// A clock running at real speed, starting now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            speed: 1.0,
        }
    }

    /// A clock running `speed` times faster than real time. Non-positive
    /// speeds fall back to real time.
    pub fn with_speed(speed: f64) -> Self {
        Self {
            origin: Instant::now(),
            speed: if speed > 0.0 { speed } else { 1.0 },
        }
    }

    /// The speed factor.
    pub fn speed(&self) -> f64 {
        self.speed
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let elapsed = self.origin.elapsed().as_secs_f64() * 1000.0 * self.speed;
        elapsed as u64
    }
}

/// A hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock reading `start` milliseconds.
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time. Earlier times are ignored.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
