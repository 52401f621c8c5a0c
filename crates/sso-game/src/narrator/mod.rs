//! External collaborators that produce narrative text and scan outcomes.
//!
//! The session never calls a collaborator directly. It queues a [`Request`]
//! stamped with a [`Ticket`]; the host fulfils it and hands back a
//! [`Response`]. This keeps slow or failing text generation from blocking
//! state changes, and lets the session drop results whose context is gone.

mod request;
mod tables;

use serde::{Deserialize, Serialize};
use sso_core::{Coord, Effects, SectorKind};
use thiserror::Error;

pub use request::{Request, RequestKind, Response, Ticket};
pub use tables::TableNarrator;

/// Result type for collaborator calls.
pub type NarrativeResult<T> = Result<T, NarrativeError>;

/// A collaborator call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    /// The service could not be reached or refused the request.
    #[error("narrative service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something unusable.
    #[error("malformed narrative response: {0}")]
    Malformed(String),
}

/// A mid-travel decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveEvent {
    /// What the crew sees.
    pub description: String,
    /// The options offered.
    pub choices: Vec<String>,
}

impl InteractiveEvent {
    /// Find an offered choice by text (case-insensitive) or 1-based number.
    pub fn find_choice(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        if let Ok(n) = input.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| self.choices.get(i))
                .map(String::as_str);
        }
        self.choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(input))
            .map(String::as_str)
    }
}

/// How a choice played out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Narrative of what happened.
    pub outcome: String,
    /// Stat changes, before extraction scaling and clamping.
    #[serde(default)]
    pub effects: Effects,
}

/// What a scan turned up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Narrative of the find or hazard.
    pub description: String,
    /// Stat changes, before extraction scaling and clamping.
    #[serde(default)]
    pub effects: Effects,
}

/// Produces sector descriptions and interactive events.
pub trait Narrator {
    /// Describe a sector the ship just arrived in.
    fn sector_event(&mut self, kind: SectorKind, coord: Coord) -> NarrativeResult<String>;

    /// Produce an interactive event, or `None` if nothing happens.
    fn interactive_event(&mut self) -> NarrativeResult<Option<InteractiveEvent>>;

    /// Play out a choice. `None` means the narrator has nothing to say.
    fn resolve_choice(
        &mut self,
        description: &str,
        choice: &str,
    ) -> NarrativeResult<Option<EventOutcome>>;
}

/// Produces scan outcomes.
pub trait ScanOracle {
    /// Roll a scan of a sector of the given kind.
    fn scan_result(&mut self, kind: SectorKind) -> NarrativeResult<Option<ScanResult>>;
}
