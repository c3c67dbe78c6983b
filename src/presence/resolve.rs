//! Presence resolution: who is online at a given instant.

use chrono::NaiveDateTime;

use crate::models::{AbsenceRecord, AbsenceStatus, PresenceView, Summary, User};

/// Whether a subject `key` binds to `user` through the email address.
///
/// A subject resolves by id first. Only when no roster member carries that id
/// does it fall back to a case-insensitive email match.
fn binds_by_email(user: &User, roster: &[User], key: &str) -> bool {
    user.matches_email(key) && !roster.iter().any(|other| other.matches_id(key))
}

/// Find the approved absence that explains why `user` is away at `now`.
///
/// Records naming the user by id win over records bound to them by email.
/// Within each tier the first record in input order wins.
pub fn active_absence<'a>(
    user: &User,
    roster: &[User],
    absences: &'a [AbsenceRecord],
    now: NaiveDateTime,
) -> Option<&'a AbsenceRecord> {
    let mut active = absences.iter().filter(|a| a.is_active_at(now));
    let by_id = active
        .clone()
        .find(|a| a.subject.key().is_some_and(|key| user.matches_id(key)));
    by_id.or_else(|| {
        active.find(|a| {
            a.subject
                .key()
                .is_some_and(|key| binds_by_email(user, roster, key))
        })
    })
}

/// Resolve presence for every user, preserving roster order.
///
/// Duplicate users yield independent entries.
pub fn resolve(users: &[User], absences: &[AbsenceRecord], now: NaiveDateTime) -> Vec<PresenceView> {
    users
        .iter()
        .map(|user| {
            let absence = active_absence(user, users, absences, now);
            PresenceView {
                user: user.clone(),
                is_online: absence.is_none(),
                active_absence: absence.cloned(),
            }
        })
        .collect()
}

/// Headline counts for a presence snapshot.
pub fn summarize(presence: &[PresenceView], absences: &[AbsenceRecord]) -> Summary {
    Summary {
        online: presence.iter().filter(|p| p.is_online).count(),
        members: presence.len(),
        pending: absences
            .iter()
            .filter(|a| a.status == AbsenceStatus::Pending)
            .count(),
        approved: absences
            .iter()
            .filter(|a| a.status == AbsenceStatus::Approved)
            .count(),
    }
}
