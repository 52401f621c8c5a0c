//! Travel legs and the session's travel state machine.

use serde::{Deserialize, Serialize};
use sso_core::Coord;

use crate::narrator::{InteractiveEvent, Ticket};

/// Time to cross the straight line between two sectors.
///
/// Never less than 1 ms, so a leg always has a future deadline.
pub fn travel_duration(from: Coord, to: Coord, ms_per_square: u64, engine_multiplier: f64) -> u64 {
    let ms = from.distance(to) * ms_per_square as f64 * engine_multiplier;
    (ms.round() as u64).max(1)
}

/// An active travel leg.
///
/// A leg suspended by an interactive event keeps its origin, destination and
/// total time; it resumes as a new segment covering only the remaining time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelInfo {
    /// Where the leg started.
    pub origin: Coord,
    /// Where the leg ends.
    pub destination: Coord,
    /// Clock time the current segment started.
    pub started_at: u64,
    /// Length of the current segment.
    pub duration_ms: u64,
    /// Length of the whole leg.
    pub total_ms: u64,
    /// Time left when last captured (at interrupt or save).
    pub remaining_ms: u64,
}

impl TravelInfo {
    /// A fresh leg starting at `now`.
    pub fn new(origin: Coord, destination: Coord, now: u64, duration_ms: u64) -> Self {
        Self {
            origin,
            destination,
            started_at: now,
            duration_ms,
            total_ms: duration_ms,
            remaining_ms: duration_ms,
        }
    }

    /// Start a new segment at `now` covering the captured remaining time.
    pub fn resumed(&self, now: u64) -> Self {
        Self {
            started_at: now,
            duration_ms: self.remaining_ms,
            ..self.clone()
        }
    }

    /// Clock time the ship arrives if nothing interrupts it.
    pub fn arrives_at(&self) -> u64 {
        self.started_at.saturating_add(self.duration_ms)
    }

    /// Time left at `now`.
    pub fn remaining_at(&self, now: u64) -> u64 {
        self.arrives_at().saturating_sub(now)
    }

    /// Fraction of the whole leg covered at `now` (0.0 to 1.0).
    pub fn progress(&self, now: u64) -> f64 {
        if self.total_ms == 0 {
            return 1.0;
        }
        let remaining = self.remaining_at(now).min(self.total_ms);
        1.0 - remaining as f64 / self.total_ms as f64
    }

    /// Fraction of the whole leg covered when `remaining_ms` was captured.
    pub fn captured_progress(&self) -> f64 {
        if self.total_ms == 0 {
            return 1.0;
        }
        1.0 - self.remaining_ms.min(self.total_ms) as f64 / self.total_ms as f64
    }

    /// Display position along the straight line from origin to destination.
    pub fn interpolated(&self, now: u64) -> (f64, f64) {
        self.point_at(self.progress(now))
    }

    /// The point a fraction `t` of the way along the leg.
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: i32, b: i32| f64::from(a) + (f64::from(b) - f64::from(a)) * t;
        (
            lerp(self.origin.x, self.destination.x),
            lerp(self.origin.y, self.destination.y),
        )
    }
}

/// Where an interactive event is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEvent {
    /// Waiting for the narrator to produce an event.
    Generating {
        /// The outstanding request.
        ticket: Ticket,
    },
    /// Shown to the player, waiting for a choice.
    AwaitingChoice {
        /// The event on screen.
        event: InteractiveEvent,
    },
    /// A choice was made, waiting for the narrator's outcome.
    Resolving {
        /// The outstanding request.
        ticket: Ticket,
        /// The event being resolved.
        event: InteractiveEvent,
        /// The choice made.
        choice: String,
    },
}

/// The session's travel state.
///
/// The ship's status is `Traveling` exactly when the phase is not `Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TravelPhase {
    /// Parked.
    #[default]
    Idle,
    /// Moving, with the next interrupt roll scheduled.
    Traveling {
        /// The active leg.
        travel: TravelInfo,
        /// Clock time of the next interrupt roll.
        next_roll_at: u64,
    },
    /// Suspended mid-leg by an interactive event.
    EventPending {
        /// The suspended leg, with its remaining time captured.
        travel: TravelInfo,
        /// Event state.
        event: PendingEvent,
    },
}

impl TravelPhase {
    /// The current leg, if any.
    pub fn travel(&self) -> Option<&TravelInfo> {
        match self {
            Self::Idle => None,
            Self::Traveling { travel, .. } | Self::EventPending { travel, .. } => Some(travel),
        }
    }

    /// Whether the phase is `Idle`.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether an event is pending.
    pub fn is_event_pending(&self) -> bool {
        matches!(self, Self::EventPending { .. })
    }
}
