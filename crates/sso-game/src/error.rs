//! Error types for the game session.

use sso_core::{Coord, CoreError};
use thiserror::Error;

use crate::persistence::PersistError;

/// Result type for session operations.
pub type GameResult<T> = Result<T, GameError>;

/// Errors that stop a session from being created or saved.
#[derive(Debug, Error)]
pub enum GameError {
    /// The configuration is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A core model operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading or writing a snapshot failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Why a player action was ignored.
///
/// Rejections never change state and never raise a notification; the caller
/// decides whether to show them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    /// The target is outside the grid.
    #[error("sector {0} is outside the charted grid")]
    OutOfBounds(Coord),

    /// The ship is already in the target sector.
    #[error("already at {0}")]
    AlreadyHere(Coord),

    /// The ship is already heading to the target sector.
    #[error("already en route to {0}")]
    AlreadyEnRoute(Coord),

    /// An interactive event must be resolved first.
    #[error("an event is awaiting your decision")]
    EventPending,

    /// The action needs the ship to be parked.
    #[error("the ship is traveling")]
    Traveling,

    /// No scan charges left.
    #[error("no scan charges left")]
    NoScans,

    /// There is no event waiting for a choice.
    #[error("no event is awaiting a choice")]
    NoEvent,

    /// The choice is not one the event offers.
    #[error("'{0}' is not one of the offered choices")]
    InvalidChoice(String),

    /// The upgrade could not be bought.
    #[error(transparent)]
    Upgrade(#[from] CoreError),
}
