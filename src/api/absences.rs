//! Absence requests: listing and decisions

use anyhow::Result;

use super::client::WebhookClient;
use super::load_squad;
use super::presence::fit;
use crate::config::Config;
use crate::models::{AbsenceRecord, AbsenceStatus};
use crate::presence::dates;

/// One request row for terminal output.
pub(crate) fn absence_line(a: &AbsenceRecord) -> String {
    format!(
        "{} {} {} {} - {} {}",
        fit(&a.id, 12),
        fit(&a.subject_name, 24),
        fit(&a.kind, 18),
        dates::format_short(&a.start),
        dates::format_short(&a.end),
        a.status
    )
}

/// List requests awaiting a decision.
pub async fn list_pending(config: &Config) -> Result<()> {
    let (_client, squad) = load_squad(config).await?;
    let pending = squad.pending();

    println!("\nPending Requests:");
    println!("{:-<60}", "");

    if pending.is_empty() {
        println!("  (nothing to review)");
        return Ok(());
    }

    for a in pending {
        println!("{}", absence_line(a));
        if let Some(ref reason) = a.reason {
            println!("  Reason: {}", reason);
        }
        println!("  Requested: {}", dates::format_date(&a.requested_at));
    }

    Ok(())
}

/// List approved and rejected requests.
pub async fn list_history(config: &Config) -> Result<()> {
    let (_client, squad) = load_squad(config).await?;
    let history = squad.history();

    println!("\nDecided Requests:");
    println!("{:-<60}", "");

    if history.is_empty() {
        println!("  (no decisions yet)");
        return Ok(());
    }

    for a in history {
        println!("{}", absence_line(a));
    }

    Ok(())
}

/// Approve or reject a request and notify the webhook.
///
/// The local decision stands even when the notification fails.
pub async fn decide(config: &Config, id: &str, status: AbsenceStatus) -> Result<()> {
    let (client, mut squad) = load_squad(config).await?;
    let record = match status {
        AbsenceStatus::Approved => squad.approve(id)?,
        _ => squad.reject(id)?,
    };

    notify_decision(&client, &record).await;
    println!("{} {} ({})", record.id, record.status, record.subject_name);
    Ok(())
}

/// Send a decision, logging instead of failing.
async fn notify_decision(client: &WebhookClient, record: &AbsenceRecord) {
    if let Err(e) = client.update_absence(record).await {
        tracing::warn!(
            "Decision for {} not confirmed by webhook: {:#}",
            record.id,
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectRef;
    use chrono::NaiveDate;

    #[test]
    fn test_absence_line() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let record = AbsenceRecord {
            id: "a1".into(),
            subject: SubjectRef::Email("t@x.com".into()),
            subject_name: "Tacio Santos".into(),
            kind: "Ausência Parcial".into(),
            start: day.and_hms_opt(9, 0, 0).unwrap(),
            end: day.and_hms_opt(10, 0, 0).unwrap(),
            status: AbsenceStatus::Pending,
            reason: None,
            requested_at: day.and_hms_opt(8, 0, 0).unwrap(),
        };
        let line = absence_line(&record);
        assert!(line.starts_with("a1 "));
        assert!(line.contains("Tacio Santos"));
        assert!(line.ends_with("15/03 09:00 - 15/03 10:00 pending"));
    }
}
