//! Ticketed collaborator requests.

use sso_core::{Coord, SectorKind};

use super::{EventOutcome, InteractiveEvent, NarrativeResult, Narrator, ScanOracle, ScanResult};

/// Identifies one collaborator request.
///
/// `generation` is the session's travel generation when the request was
/// issued. A response whose generation no longer matches is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// Unique per session.
    pub id: u64,
    /// Travel generation at issue time.
    pub generation: u64,
}

/// Which collaborator call a request or response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// [`Narrator::sector_event`].
    SectorNarrative,
    /// [`Narrator::interactive_event`].
    InteractiveEvent,
    /// [`Narrator::resolve_choice`].
    ResolveChoice,
    /// [`ScanOracle::scan_result`].
    Scan,
}

/// A collaborator call the session wants made.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Describe the sector just reached.
    SectorNarrative {
        /// Request ticket.
        ticket: Ticket,
        /// Kind of the sector.
        kind: SectorKind,
        /// Where it is.
        coord: Coord,
    },
    /// Generate an interactive event.
    InteractiveEvent {
        /// Request ticket.
        ticket: Ticket,
    },
    /// Resolve the player's choice.
    ResolveChoice {
        /// Request ticket.
        ticket: Ticket,
        /// Event text.
        description: String,
        /// The choice made.
        choice: String,
    },
    /// Scan the current sector.
    Scan {
        /// Request ticket.
        ticket: Ticket,
        /// Kind of the sector.
        kind: SectorKind,
    },
}

impl Request {
    /// The request's ticket.
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::SectorNarrative { ticket, .. }
            | Self::InteractiveEvent { ticket }
            | Self::ResolveChoice { ticket, .. }
            | Self::Scan { ticket, .. } => *ticket,
        }
    }

    /// Which call this is.
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::SectorNarrative { .. } => RequestKind::SectorNarrative,
            Self::InteractiveEvent { .. } => RequestKind::InteractiveEvent,
            Self::ResolveChoice { .. } => RequestKind::ResolveChoice,
            Self::Scan { .. } => RequestKind::Scan,
        }
    }

    /// Make the call against a collaborator.
    pub fn fulfil<N>(&self, narrator: &mut N) -> Response
    where
        N: Narrator + ScanOracle + ?Sized,
    {
        match self {
            Self::SectorNarrative { kind, coord, .. } => {
                Response::SectorNarrative(narrator.sector_event(*kind, *coord))
            }
            Self::InteractiveEvent { .. } => {
                Response::InteractiveEvent(narrator.interactive_event())
            }
            Self::ResolveChoice {
                description,
                choice,
                ..
            } => Response::ResolveChoice(narrator.resolve_choice(description, choice)),
            Self::Scan { kind, .. } => Response::Scan(narrator.scan_result(*kind)),
        }
    }
}

/// A collaborator's answer to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Answer to [`Request::SectorNarrative`].
    SectorNarrative(NarrativeResult<String>),
    /// Answer to [`Request::InteractiveEvent`].
    InteractiveEvent(NarrativeResult<Option<InteractiveEvent>>),
    /// Answer to [`Request::ResolveChoice`].
    ResolveChoice(NarrativeResult<Option<EventOutcome>>),
    /// Answer to [`Request::Scan`].
    Scan(NarrativeResult<Option<ScanResult>>),
}

impl Response {
    /// Which call this answers.
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::SectorNarrative(_) => RequestKind::SectorNarrative,
            Self::InteractiveEvent(_) => RequestKind::InteractiveEvent,
            Self::ResolveChoice(_) => RequestKind::ResolveChoice,
            Self::Scan(_) => RequestKind::Scan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrator::NarrativeError;

    struct Echo;

    impl Narrator for Echo {
        fn sector_event(&mut self, kind: SectorKind, coord: Coord) -> NarrativeResult<String> {
            Ok(format!("{kind} at {coord}"))
        }
        fn interactive_event(&mut self) -> NarrativeResult<Option<InteractiveEvent>> {
            Ok(None)
        }
        fn resolve_choice(
            &mut self,
            _description: &str,
            _choice: &str,
        ) -> NarrativeResult<Option<EventOutcome>> {
            Err(NarrativeError::Unavailable("offline".to_string()))
        }
    }

    impl ScanOracle for Echo {
        fn scan_result(&mut self, _kind: SectorKind) -> NarrativeResult<Option<ScanResult>> {
            Ok(None)
        }
    }

    #[test]
    fn fulfil_routes_to_matching_call() {
        let ticket = Ticket {
            id: 1,
            generation: 0,
        };
        let req = Request::SectorNarrative {
            ticket,
            kind: SectorKind::Nebula,
            coord: Coord::new(1, 2),
        };
        assert_eq!(req.ticket(), ticket);
        let resp = req.fulfil(&mut Echo);
        assert_eq!(resp.kind(), req.kind());
        assert_eq!(
            resp,
            Response::SectorNarrative(Ok("Nebula at (1, 2)".to_string()))
        );

        let req = Request::ResolveChoice {
            ticket,
            description: "x".to_string(),
            choice: "y".to_string(),
        };
        assert!(matches!(req.fulfil(&mut Echo), Response::ResolveChoice(Err(_))));
    }
}
