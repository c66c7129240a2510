//! Transient, dismissible learner notices.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    /// Example answers are being shown instead of service suggestions.
    SuggestionFallback,
    /// A forward move was blocked by unanswered questions.
    IncompleteQuestions,
}

/// A short-lived message for the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Identifier used to dismiss the notice.
    pub id: u64,
    /// What the notice is about.
    pub kind: NoticeKind,
    /// Text shown to the learner.
    pub message: String,
    /// When the notice was raised.
    pub created_at: DateTime<Utc>,
    /// When the notice stops being shown.
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    /// Returns `true` if the notice is still visible at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Holds notices until they expire or are dismissed.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    next_id: u64,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    /// Creates an empty board whose notices live for `ttl`.
    #[must_use]
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(5)),
            next_id: 1,
            notices: Vec::new(),
        }
    }

    /// Raises a notice and returns a copy of it.
    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>) -> Notice {
        self.push_at(kind, message, Utc::now())
    }

    fn push_at(&mut self, kind: NoticeKind, message: impl Into<String>, now: DateTime<Utc>) -> Notice {
        self.prune(now);
        // One notice per kind; a repeat replaces the old one.
        self.notices.retain(|n| n.kind != kind);

        let notice = Notice {
            id: self.next_id,
            kind,
            message: message.into(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.next_id += 1;
        self.notices.push(notice.clone());
        notice
    }

    /// Returns notices still visible now.
    #[must_use]
    pub fn active(&self) -> Vec<Notice> {
        self.active_at(Utc::now())
    }

    /// Returns notices still visible at `now`.
    #[must_use]
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Notice> {
        self.notices
            .iter()
            .filter(|n| n.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Removes a notice. Returns `false` if it was not present.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    /// Drops notices that expired before `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.notices.retain(|n| n.is_active_at(now));
    }
}
