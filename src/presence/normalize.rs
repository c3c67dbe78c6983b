//! Normalization of loosely-typed webhook payloads.
//!
//! Every function here is total: malformed input is repaired with defaults,
//! never rejected. Field names follow the source schema (`dataIni`,
//! `horaIni`, `motivo`, `nome`, ...), with English aliases accepted.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SubsecRound};
use serde_json::{json, Map, Value};

use super::dates;
use crate::models::{AbsenceRecord, AbsenceStatus, Role, SubjectRef, User};

/// Label used when a payload names nobody.
pub const UNNAMED: &str = "unnamed";
/// Kind used when a payload carries no type label.
pub const DEFAULT_KIND: &str = "Ausência";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Treat a response body as a collection.
///
/// A bare object is a one-element collection; `null` is empty. Elements that
/// are not objects are dropped.
pub fn collection_items(body: Value) -> Vec<(usize, Map<String, Value>)> {
    let items = match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(map) => Some((index, map)),
            other => {
                tracing::warn!("Skipping non-object item #{} in payload: {}", index, other);
                None
            }
        })
        .collect()
}

/// First usable string among `keys`. Numbers are stringified; empty strings
/// and the "null" sentinel count as missing.
fn field(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) => dates::present(Some(s)).map(str::to_owned),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Normalize one absence item.
///
/// `index` is the item's position in the source collection and seeds the
/// fallback id. `now` supplies the fallback start and request timestamps as
/// well as the zone that offset-qualified timestamps are converted into.
pub fn normalize_absence(
    raw: &Map<String, Value>,
    index: usize,
    now: DateTime<FixedOffset>,
) -> AbsenceRecord {
    let offset = *now.offset();
    let now_local = now.naive_local().trunc_subsecs(0);

    let id = field(raw, &["id", "absenceId"]).unwrap_or_else(|| format!("absence-{}", index));

    let email = field(raw, &["email"]);
    let subject = match (field(raw, &["userId", "user_id"]), &email) {
        (Some(user_id), _) => SubjectRef::Id(user_id),
        (None, Some(email)) => SubjectRef::Email(email.clone()),
        (None, None) => SubjectRef::Unknown,
    };
    let subject_name = field(raw, &["nome", "name", "userName"])
        .or(email)
        .unwrap_or_else(|| UNNAMED.to_string());

    let start = timestamp(raw, "dataIni", "horaIni", offset).unwrap_or_else(|| {
        tracing::debug!("Absence {} has no usable start date, using now", id);
        now_local
    });
    let end = match timestamp(raw, "dataFim", "horaFim", offset) {
        Some(end) if end >= start => end,
        Some(end) => {
            tracing::debug!("Absence {} ends before it starts ({}), clamping", id, end);
            start
        }
        None => start,
    };

    let status = field(raw, &["status"])
        .map(|s| AbsenceStatus::from_source(&s))
        .unwrap_or_default();

    let requested_at = field(raw, &["requestedAt", "requested_at"])
        .and_then(|s| dates::parse_timestamp(&s, offset))
        .map(|t| t.trunc_subsecs(0))
        .unwrap_or(now_local);

    AbsenceRecord {
        id,
        subject,
        subject_name,
        kind: field(raw, &["tipo", "type", "kind"]).unwrap_or_else(|| DEFAULT_KIND.to_string()),
        start,
        end,
        status,
        reason: field(raw, &["motivo", "reason"]),
        requested_at,
    }
}

fn timestamp(
    raw: &Map<String, Value>,
    date_key: &str,
    time_key: &str,
    offset: FixedOffset,
) -> Option<NaiveDateTime> {
    let date = field(raw, &[date_key]);
    let time = field(raw, &[time_key]);
    dates::combine(date.as_deref(), time.as_deref(), offset).map(|t| t.trunc_subsecs(0))
}

/// Normalize every absence in a response body.
pub fn normalize_absences(body: Value, now: DateTime<FixedOffset>) -> Vec<AbsenceRecord> {
    collection_items(body)
        .iter()
        .map(|(index, raw)| normalize_absence(raw, *index, now))
        .collect()
}

/// Render a canonical record back into the source schema.
///
/// Normalizing the result yields the same record.
pub fn source_payload(record: &AbsenceRecord) -> Value {
    let mut payload = json!({
        "id": record.id,
        "nome": record.subject_name,
        "tipo": record.kind,
        "dataIni": dates::format_date(&record.start),
        "horaIni": dates::format_time(&record.start),
        "dataFim": dates::format_date(&record.end),
        "horaFim": dates::format_time(&record.end),
        "status": record.status.as_str(),
        "motivo": record.reason,
        "requestedAt": record.requested_at.format(TIMESTAMP_FORMAT).to_string(),
    });
    match &record.subject {
        SubjectRef::Id(id) => payload["userId"] = json!(id),
        SubjectRef::Email(email) => payload["email"] = json!(email),
        SubjectRef::Unknown => {}
    }
    payload
}

/// Normalize one roster entry.
///
/// The id falls back to the lowercased email so that it stays stable across
/// reloads, then to the position.
pub fn normalize_user(raw: &Map<String, Value>, index: usize) -> User {
    let email = field(raw, &["email"]).unwrap_or_default();
    let id = field(raw, &["id", "userId"]).unwrap_or_else(|| {
        if email.is_empty() {
            format!("user-{}", index)
        } else {
            email.to_lowercase()
        }
    });
    let name = field(raw, &["name", "nome"]).unwrap_or_else(|| {
        if email.is_empty() {
            UNNAMED.to_string()
        } else {
            email.clone()
        }
    });
    let role = field(raw, &["role"])
        .map(|r| Role::from_source(&r))
        .unwrap_or_default();

    User {
        id,
        name,
        email,
        role,
    }
}

/// Normalize every roster entry in a response body.
pub fn normalize_users(body: Value) -> Vec<User> {
    collection_items(body)
        .iter()
        .map(|(index, raw)| normalize_user(raw, *index))
        .collect()
}
