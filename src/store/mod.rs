//! In-memory dashboard state.
//!
//! `Squad` owns the last roster and absence snapshot fetched from the
//! webhooks. Mutations are optimistic: they change local state immediately
//! and hand back whatever the caller needs to notify the webhook. A failed
//! notification is never reconciled. Every change bumps a revision counter
//! published on a watch channel so views can redraw.

use anyhow::Result;
use chrono::NaiveDateTime;
use thiserror::Error;
use tokio::sync::watch;

use crate::models::{AbsenceRecord, AbsenceStatus, PresenceView, Role, Summary, User};
use crate::presence;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Lookup miss, with a message fit for display.
    #[error("{message}")]
    NotFound { message: String },
    #[error("absence {id} is already {status}")]
    AlreadyDecided { id: String, status: AbsenceStatus },
    #[error("invalid member: {0}")]
    InvalidMember(String),
}

/// Progress of the most recent load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// At least one fetch failed; the previous snapshot was kept.
    Failed { message: String },
}

pub struct Squad {
    users: Vec<User>,
    absences: Vec<AbsenceRecord>,
    load_state: LoadState,
    revision: watch::Sender<u64>,
}

impl Default for Squad {
    fn default() -> Self {
        Self::new()
    }
}

impl Squad {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            users: Vec::new(),
            absences: Vec::new(),
            load_state: LoadState::Idle,
            revision,
        }
    }

    /// Seed with a known snapshot.
    pub fn with_snapshot(users: Vec<User>, absences: Vec<AbsenceRecord>) -> Self {
        let mut squad = Self::new();
        squad.users = users;
        squad.absences = absences;
        squad.load_state = LoadState::Loaded;
        squad
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn absences(&self) -> &[AbsenceRecord] {
        &self.absences
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Current revision. Increases on every change.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receive a notification on every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn touch(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub fn begin_load(&mut self) {
        self.load_state = LoadState::Loading;
        self.touch();
    }

    /// Replace the roster, or keep the previous one on failure.
    pub fn apply_users(&mut self, result: Result<Vec<User>>) -> Result<(), String> {
        match result {
            Ok(users) => {
                tracing::debug!("Roster replaced ({} members)", users.len());
                self.users = users;
                self.touch();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Roster fetch failed, keeping previous snapshot: {:#}", e);
                Err(format!("roster: {:#}", e))
            }
        }
    }

    /// Replace the absence list, or keep the previous one on failure.
    pub fn apply_absences(&mut self, result: Result<Vec<AbsenceRecord>>) -> Result<(), String> {
        match result {
            Ok(absences) => {
                tracing::debug!("Absences replaced ({} records)", absences.len());
                self.absences = absences;
                self.touch();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Absence fetch failed, keeping previous snapshot: {:#}", e);
                Err(format!("absences: {:#}", e))
            }
        }
    }

    /// Apply both halves of a reload and settle the load state.
    pub fn finish_load(
        &mut self,
        users: Result<Vec<User>>,
        absences: Result<Vec<AbsenceRecord>>,
    ) -> &LoadState {
        let errors: Vec<String> = [self.apply_users(users), self.apply_absences(absences)]
            .into_iter()
            .filter_map(|r| r.err())
            .collect();

        self.load_state = if errors.is_empty() {
            LoadState::Loaded
        } else {
            LoadState::Failed {
                message: errors.join("; "),
            }
        };
        self.touch();
        &self.load_state
    }

    /// Approve a pending request. Returns the updated record.
    pub fn approve(&mut self, id: &str) -> Result<AbsenceRecord, StoreError> {
        self.decide(id, AbsenceStatus::Approved)
    }

    /// Reject a pending request. Returns the updated record.
    pub fn reject(&mut self, id: &str) -> Result<AbsenceRecord, StoreError> {
        self.decide(id, AbsenceStatus::Rejected)
    }

    fn decide(&mut self, id: &str, status: AbsenceStatus) -> Result<AbsenceRecord, StoreError> {
        let record = self
            .absences
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound {
                message: format!("No absence request with id '{}'", id),
            })?;

        if record.status.is_decided() {
            return Err(StoreError::AlreadyDecided {
                id: id.to_string(),
                status: record.status,
            });
        }

        record.status = status;
        let updated = record.clone();
        tracing::info!("Absence {} marked {}", id, status);
        self.touch();
        Ok(updated)
    }

    /// Register a new employee with a fresh id.
    pub fn add_member(&mut self, name: &str, email: &str) -> Result<User, StoreError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidMember("name is required".into()));
        }
        if !is_plausible_email(email) {
            return Err(StoreError::InvalidMember(format!(
                "'{}' is not an email address",
                email
            )));
        }
        if self.users.iter().any(|u| u.matches_email(email)) {
            return Err(StoreError::InvalidMember(format!(
                "{} is already on the roster",
                email
            )));
        }

        let user = User {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Employee,
        };
        self.users.push(user.clone());
        tracing::info!("Added member {} ({})", user.name, user.id);
        self.touch();
        Ok(user)
    }

    /// Drop a member from the roster.
    pub fn remove_member(&mut self, id: &str) -> Result<User, StoreError> {
        let pos = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| StoreError::NotFound {
                message: format!("No member with id '{}'", id),
            })?;
        let user = self.users.remove(pos);
        tracing::info!("Removed member {} ({})", user.name, user.id);
        self.touch();
        Ok(user)
    }

    /// Look a member up by id, then by case-insensitive email.
    pub fn find_user(&self, query: &str) -> Result<&User, StoreError> {
        let query = query.trim();
        self.users
            .iter()
            .find(|u| u.matches_id(query))
            .or_else(|| self.users.iter().find(|u| u.matches_email(query)))
            .ok_or_else(|| StoreError::NotFound {
                message: format!("No member matches '{}'", query),
            })
    }

    /// Requests awaiting a decision, in source order.
    pub fn pending(&self) -> Vec<&AbsenceRecord> {
        self.absences
            .iter()
            .filter(|a| a.status == AbsenceStatus::Pending)
            .collect()
    }

    /// Decided requests, most recently requested first.
    pub fn history(&self) -> Vec<&AbsenceRecord> {
        let mut decided: Vec<&AbsenceRecord> = self
            .absences
            .iter()
            .filter(|a| a.status.is_decided())
            .collect();
        decided.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        decided
    }

    pub fn presence(&self, now: NaiveDateTime) -> Vec<PresenceView> {
        presence::resolve(&self.users, &self.absences, now)
    }

    pub fn summary(&self, now: NaiveDateTime) -> Summary {
        presence::summarize(&self.presence(now), &self.absences)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectRef;
    use anyhow::anyhow;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: id.into(),
            email: email.into(),
            role: Role::Employee,
        }
    }

    fn absence(id: &str, user_id: &str, status: AbsenceStatus, requested_hours: i64) -> AbsenceRecord {
        AbsenceRecord {
            id: id.into(),
            subject: SubjectRef::Id(user_id.into()),
            subject_name: user_id.into(),
            kind: "Folga".into(),
            start: t0(),
            end: t0() + Duration::hours(8),
            status,
            reason: None,
            requested_at: t0() + Duration::hours(requested_hours),
        }
    }

    fn squad() -> Squad {
        Squad::with_snapshot(
            vec![user("u1", "ana@x.com"), user("u2", "bia@x.com")],
            vec![
                absence("a1", "u1", AbsenceStatus::Pending, 0),
                absence("a2", "u2", AbsenceStatus::Approved, 1),
                absence("a3", "u2", AbsenceStatus::Rejected, 2),
            ],
        )
    }

    #[test]
    fn test_approve_is_optimistic() {
        let mut squad = squad();
        let updated = squad.approve("a1").unwrap();
        assert_eq!(updated.status, AbsenceStatus::Approved);
        assert_eq!(squad.absences()[0].status, AbsenceStatus::Approved);
        assert!(!squad.presence(t0())[0].is_online);
    }

    #[test]
    fn test_decisions_are_terminal() {
        let mut squad = squad();
        assert_eq!(
            squad.reject("a2"),
            Err(StoreError::AlreadyDecided {
                id: "a2".into(),
                status: AbsenceStatus::Approved
            })
        );
        assert_eq!(squad.absences()[1].status, AbsenceStatus::Approved);
    }

    #[test]
    fn test_decide_unknown_id() {
        let mut squad = squad();
        let err = squad.approve("nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_failed_fetch_keeps_snapshot() {
        let mut squad = squad();
        squad.begin_load();
        assert_eq!(squad.load_state(), &LoadState::Loading);

        let state = squad
            .finish_load(Err(anyhow!("connection refused")), Ok(vec![]))
            .clone();
        assert!(matches!(state, LoadState::Failed { ref message } if message.contains("connection refused")));
        assert_eq!(squad.users().len(), 2);
        assert!(squad.absences().is_empty());
    }

    #[test]
    fn test_successful_load() {
        let mut squad = Squad::new();
        let state = squad
            .finish_load(Ok(vec![user("u9", "z@x.com")]), Ok(vec![]))
            .clone();
        assert_eq!(state, LoadState::Loaded);
        assert_eq!(squad.users()[0].id, "u9");
    }

    #[test]
    fn test_add_member_validation() {
        let mut squad = squad();
        assert!(matches!(squad.add_member("", "c@x.com"), Err(StoreError::InvalidMember(_))));
        assert!(matches!(squad.add_member("Cau", "not-an-email"), Err(StoreError::InvalidMember(_))));
        assert!(matches!(squad.add_member("Ana 2", "ANA@x.com"), Err(StoreError::InvalidMember(_))));

        let added = squad.add_member("  Cau ", "cau@x.com").unwrap();
        assert_eq!(added.name, "Cau");
        assert_eq!(added.role, Role::Employee);
        assert_eq!(added.id.len(), 32);
        assert_eq!(squad.users().len(), 3);
    }

    #[test]
    fn test_remove_member() {
        let mut squad = squad();
        assert_eq!(squad.remove_member("u1").unwrap().email, "ana@x.com");
        assert_eq!(squad.users().len(), 1);
        assert!(matches!(squad.remove_member("u1"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_find_user_id_then_email() {
        let squad = squad();
        assert_eq!(squad.find_user("u2").unwrap().id, "u2");
        assert_eq!(squad.find_user("ANA@X.COM").unwrap().id, "u1");
        let err = squad.find_user("ghost").unwrap_err();
        assert_eq!(err.to_string(), "No member matches 'ghost'");
    }

    #[test]
    fn test_pending_and_history() {
        let squad = squad();
        let pending: Vec<&str> = squad.pending().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(pending, vec!["a1"]);
        let history: Vec<&str> = squad.history().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(history, vec!["a3", "a2"]);
    }

    #[test]
    fn test_summary() {
        let squad = squad();
        let summary = squad.summary(t0());
        assert_eq!(summary.members, 2);
        assert_eq!(summary.online, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.approved, 1);
    }

    #[tokio::test]
    async fn test_changes_are_published() {
        let mut squad = squad();
        let mut rx = squad.subscribe();
        let before = squad.revision();

        squad.approve("a1").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), before + 1);

        // Rejected decisions do not publish.
        let _ = squad.approve("a1");
        assert!(!rx.has_changed().unwrap());
    }
}
