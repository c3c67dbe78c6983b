//! Absence request models

use chrono::NaiveDateTime;
use serde::Serialize;

/// Canonical decision state of an absence request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AbsenceStatus {
    /// Fold a source spelling into a canonical status.
    ///
    /// Total: unrecognized values (and the pending synonyms) become `Pending`.
    pub fn from_source(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "approved" | "aprovado" => AbsenceStatus::Approved,
            "rejected" | "rejeitado" => AbsenceStatus::Rejected,
            _ => AbsenceStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AbsenceStatus::Pending => "pending",
            AbsenceStatus::Approved => "approved",
            AbsenceStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected are terminal.
    pub fn is_decided(&self) -> bool {
        !matches!(self, AbsenceStatus::Pending)
    }
}

impl std::fmt::Display for AbsenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who an absence record refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum SubjectRef {
    /// Explicit user identifier from the source.
    Id(String),
    /// Email only; matched case-insensitively.
    Email(String),
    /// Neither identifier nor email was supplied. Never matches a user.
    Unknown,
}

impl SubjectRef {
    /// The lookup key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            SubjectRef::Id(k) | SubjectRef::Email(k) => Some(k),
            SubjectRef::Unknown => None,
        }
    }
}

/// A canonical absence request.
///
/// Invariant: `end >= start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceRecord {
    pub id: String,
    pub subject: SubjectRef,
    /// Display label for the subject (name, else email, else "unnamed").
    pub subject_name: String,
    /// Free-form label such as "Folga" or "Ausência Parcial".
    pub kind: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: AbsenceStatus,
    pub reason: Option<String>,
    pub requested_at: NaiveDateTime,
}

impl AbsenceRecord {
    /// Inclusive on both ends: `start <= now <= end`.
    pub fn covers(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }

    /// Approved and covering `now`.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.status == AbsenceStatus::Approved && self.covers(now)
    }
}
