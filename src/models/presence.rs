//! Derived presence models

use serde::Serialize;

use super::{AbsenceRecord, User};

/// A roster member with derived availability. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceView {
    #[serde(flatten)]
    pub user: User,
    pub is_online: bool,
    pub active_absence: Option<AbsenceRecord>,
}

/// Headline counts for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub online: usize,
    pub members: usize,
    pub pending: usize,
    pub approved: usize,
}
