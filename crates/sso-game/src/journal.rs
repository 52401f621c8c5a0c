//! The captain's log.

use serde::{Deserialize, Serialize};

/// What a log line is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Session lifecycle: new game, load, save.
    System,
    /// Course changes and arrivals.
    Travel,
    /// A sector explored for the first time.
    Discovery,
    /// Narrator text describing a sector.
    Narrative,
    /// Interactive events and their outcomes.
    Event,
    /// Scan results.
    Scan,
    /// Upgrades and level-ups.
    Upgrade,
    /// Unlocked achievements.
    Achievement,
    /// Something went wrong but play continues.
    Warning,
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::Travel => "travel",
            Self::Discovery => "discovery",
            Self::Narrative => "narrative",
            Self::Event => "event",
            Self::Scan => "scan",
            Self::Upgrade => "upgrade",
            Self::Achievement => "achievement",
            Self::Warning => "warning",
        };
        f.pad(s)
    }
}

/// One line of the captain's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic id, unique within a save.
    pub id: u64,
    /// What the line is about.
    pub kind: LogKind,
    /// The text.
    pub text: String,
    /// Session clock time when written.
    #[serde(default)]
    pub at_ms: u64,
    /// Render with a typewriter effect.
    #[serde(default)]
    pub typing: bool,
}

/// A bounded, chronological log. Oldest entries are dropped first.
#[derive(Debug, Clone)]
pub struct Journal {
    entries: Vec<LogEntry>,
    next_id: u64,
    max_entries: usize,
}

impl Journal {
    /// An empty log holding at most `max_entries` (0 = unlimited).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            max_entries,
        }
    }

    /// Append a line and return its id.
    pub fn push(&mut self, kind: LogKind, text: impl Into<String>, at_ms: u64) -> u64 {
        self.append(kind, text.into(), at_ms, false)
    }

    /// Append a line rendered with the typewriter effect.
    pub fn push_typing(&mut self, kind: LogKind, text: impl Into<String>, at_ms: u64) -> u64 {
        self.append(kind, text.into(), at_ms, true)
    }

    fn append(&mut self, kind: LogKind, text: String, at_ms: u64, typing: bool) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.entries.push(LogEntry {
            id,
            kind,
            text,
            at_ms,
            typing,
        });
        if self.max_entries > 0 && self.entries.len() > self.max_entries {
            let drain_count = self.entries.len() - self.max_entries;
            self.entries.drain(..drain_count);
        }
        id
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries with an id greater than `id`.
    pub fn since(&self, id: u64) -> &[LogEntry] {
        let start = self.entries.partition_point(|e| e.id <= id);
        &self.entries[start..]
    }

    /// The newest `n` entries, oldest first.
    pub fn last(&self, n: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// The id the next entry will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the contents with restored entries.
    ///
    /// The id counter never moves backwards past a restored entry.
    pub fn restore(&mut self, mut entries: Vec<LogEntry>, next_id: u64) {
        entries.sort_by_key(|e| e.id);
        let floor = entries.last().map_or(1, |e| e.id.saturating_add(1));
        self.next_id = next_id.max(floor);
        if self.max_entries > 0 && entries.len() > self.max_entries {
            let drain_count = entries.len() - self.max_entries;
            entries.drain(..drain_count);
        }
        self.entries = entries;
    }

    /// Plain-text export, one line per entry.
    pub fn export_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let secs = entry.at_ms / 1000;
            out.push_str(&format!(
                "[{:02}:{:02}] {:<11} {}\n",
                secs / 60,
                secs % 60,
                entry.kind,
                entry.text
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut log = Journal::new(0);
        let a = log.push(LogKind::System, "one", 0);
        let b = log.push_typing(LogKind::Narrative, "two", 10);
        assert_eq!((a, b), (1, 2));
        assert!(log.entries()[1].typing);
        assert_eq!(log.next_id(), 3);
    }

    #[test]
    fn oldest_entries_dropped() {
        let mut log = Journal::new(3);
        for i in 0..5 {
            log.push(LogKind::Travel, format!("leg {i}"), i);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].text, "leg 2");
        assert_eq!(log.next_id(), 6);
    }

    #[test]
    fn since_and_last() {
        let mut log = Journal::new(0);
        for i in 0..4 {
            log.push(LogKind::Scan, format!("{i}"), 0);
        }
        assert_eq!(log.since(2).len(), 2);
        assert_eq!(log.since(2)[0].id, 3);
        assert_eq!(log.last(1)[0].id, 4);
        assert_eq!(log.last(10).len(), 4);
    }

    #[test]
    fn restore_keeps_counter_ahead() {
        let mut log = Journal::new(0);
        let entries = vec![
            LogEntry {
                id: 7,
                kind: LogKind::System,
                text: "old".to_string(),
                at_ms: 0,
                typing: false,
            },
            LogEntry {
                id: 9,
                kind: LogKind::Travel,
                text: "older".to_string(),
                at_ms: 0,
                typing: false,
            },
        ];
        log.restore(entries, 3);
        assert_eq!(log.next_id(), 10);
        assert_eq!(log.push(LogKind::System, "new", 0), 10);
    }

    #[test]
    fn restore_at_id_ceiling_does_not_overflow() {
        let mut log = Journal::new(0);
        let entry = LogEntry {
            id: u64::MAX,
            kind: LogKind::System,
            text: "last".to_string(),
            at_ms: 0,
            typing: false,
        };
        log.restore(vec![entry], 0);
        assert_eq!(log.next_id(), u64::MAX);
        assert_eq!(log.push(LogKind::System, "again", 0), u64::MAX);
    }

    #[test]
    fn export_text_format() {
        let mut log = Journal::new(0);
        log.push(LogKind::Travel, "Course set for (6, 5).", 61_000);
        insta::assert_snapshot!(log.export_text().trim_end(), @"[01:01] travel      Course set for (6, 5).");
    }
}
