//! Short-lived notifications for the player.

use serde::{Deserialize, Serialize};

/// Tone of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Neutral information.
    Info,
    /// Something went well.
    Success,
    /// Something needs attention.
    Warning,
    /// Something failed.
    Error,
    /// An achievement unlocked.
    Achievement,
    /// The ship gained a level.
    LevelUp,
}

/// A message that disappears after a while.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Unique per session.
    pub id: u64,
    /// Tone.
    pub kind: NotificationKind,
    /// Text shown to the player.
    pub message: String,
    /// Session clock time after which it is gone.
    pub expires_at: u64,
}

/// The active notifications.
#[derive(Debug, Clone)]
pub struct Notifications {
    active: Vec<Notification>,
    ttl_ms: u64,
    next_id: u64,
}

impl Notifications {
    /// An empty set whose entries live for `ttl_ms`.
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            active: Vec::new(),
            ttl_ms,
            next_id: 1,
        }
    }

    /// Show a notification from `now` and return its id.
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>, now: u64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Notification {
            id,
            kind,
            message: message.into(),
            expires_at: now.saturating_add(self.ttl_ms),
        });
        id
    }

    /// Drop notifications that have expired by `now`. Returns how many.
    pub fn expire(&mut self, now: u64) -> usize {
        let before = self.active.len();
        self.active.retain(|n| n.expires_at > now);
        before - self.active.len()
    }

    /// Notifications still showing, oldest first.
    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    /// The earliest expiry, if any are showing.
    pub fn next_expiry(&self) -> Option<u64> {
        self.active.iter().map(|n| n.expires_at).min()
    }
}
