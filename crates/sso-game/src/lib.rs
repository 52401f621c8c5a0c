//! Game session controller for Soul Ship Odyssey.
//!
//! [`GameSession`] owns the world, the ship, and every timer. It is driven by
//! [`GameSession::update`], which reads an injectable [`Clock`] and fires
//! whichever deadline is due: arrival, the mid-travel interrupt roll,
//! autosave, or notification expiry. Narrative text and scan outcomes come
//! from external collaborators ([`Narrator`], [`ScanOracle`]) through
//! ticketed requests, so results that arrive after the player has moved on
//! are recognised as stale and dropped.

pub mod clock;
pub mod config;
pub mod error;
pub mod journal;
pub mod narrator;
pub mod notify;
pub mod persistence;
pub mod session;
pub mod travel;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GameConfig;
pub use error::{GameError, GameResult, Rejection};
pub use journal::{Journal, LogEntry, LogKind};
pub use narrator::{
    EventOutcome, InteractiveEvent, NarrativeError, Narrator, Request, Response, ScanOracle,
    ScanResult, TableNarrator, Ticket,
};
pub use notify::{Notification, NotificationKind, Notifications};
pub use persistence::{
    FileStore, MemoryStore, PersistError, PersistResult, SNAPSHOT_VERSION, Snapshot, StateStore,
};
pub use session::{Delivery, GameSession};
pub use travel::{PendingEvent, TravelInfo, TravelPhase};
