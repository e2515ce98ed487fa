//! Core note data structures.
//!
//! A note is identified by an opaque [`NoteId`]. Ids are issued by
//! [`IdGenerator`], which is seeded from the existing collection and never
//! hands out the same value twice, even when several notes are created within
//! the same millisecond.
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Title given to freshly added notes.
pub const PLACEHOLDER_TITLE: &str = "New memo";

/// Content given to freshly added notes.
pub const PLACEHOLDER_CONTENT: &str = "Click to edit...";

/// Title of the note shown when nothing usable was persisted.
pub const WELCOME_TITLE: &str = "Welcome to the memo widget!";

/// Content of the note shown when nothing usable was persisted.
pub const WELCOME_CONTENT: &str = "Right-click the widget and choose \"Unlock\" to move it or edit notes.\n\nWhen you are done, right-click again and choose \"Lock\" to pin it to the desktop.";

/// Opaque, unique note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for NoteId {
    fn from(raw: i64) -> Self {
        NoteId(raw)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(NoteId)
    }
}

/// Represents a single note on the widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier for the note
    pub id: NoteId,
    /// Note title
    pub title: String,
    /// Free text content
    pub content: String,
    /// Opaque image reference, carried through edits untouched
    #[serde(default)]
    pub image: Option<String>,
    /// Creation time in Unix milliseconds; only used for ordering
    pub date: i64,
}

impl Note {
    /// Creates a placeholder note ready to be edited
    pub fn placeholder(id: NoteId, date: i64) -> Self {
        Note {
            id,
            title: PLACEHOLDER_TITLE.to_string(),
            content: PLACEHOLDER_CONTENT.to_string(),
            image: None,
            date,
        }
    }

    /// The note shown on first launch or after the persisted collection was lost
    pub fn welcome(id: NoteId, date: i64) -> Self {
        Note {
            id,
            title: WELCOME_TITLE.to_string(),
            content: WELCOME_CONTENT.to_string(),
            image: None,
            date,
        }
    }
}

/// Millisecond wall clock used for ids and note dates.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Issues strictly increasing note ids.
///
/// An id is the current time in milliseconds unless that would not be larger
/// than the last id handed out, in which case it is the last id plus one.
/// Once `i64::MAX` has been issued (or loaded) there is no larger id left and
/// every later call returns `None`.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: Option<i64>,
}

impl IdGenerator {
    /// Seeds the generator so it never reissues any id in `existing`.
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a Note>) -> Self {
        IdGenerator {
            last: existing.into_iter().map(|n| n.id.0).max(),
        }
    }

    pub fn next_id(&mut self, now_ms: i64) -> Option<NoteId> {
        let candidate = match self.last {
            Some(last) if now_ms <= last => last.checked_add(1)?,
            _ => now_ms,
        };
        self.last = Some(candidate);
        Some(NoteId(candidate))
    }
}
