//! Who is online right now

use anyhow::Result;
use unicode_width::UnicodeWidthChar;

use super::load_squad;
use crate::config::Config;
use crate::models::PresenceView;
use crate::presence::dates;

/// Pad or cut `text` to exactly `width` terminal columns.
pub(crate) fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

/// One presence row for terminal output.
pub(crate) fn presence_line(view: &PresenceView) -> String {
    let (state, detail) = match &view.active_absence {
        None => ("online", "-".to_string()),
        Some(a) => ("away", format!("{} until {}", a.kind, dates::format_short(&a.end))),
    };
    format!("{} {} {}", fit(&view.user.name, 28), fit(state, 7), detail)
}

/// Print every member's current availability.
pub async fn show_status(config: &Config, json: bool) -> Result<()> {
    let (_client, squad) = load_squad(config).await?;
    let now = config.now();
    let presence = squad.presence(now.naive_local());

    if json {
        println!("{}", serde_json::to_string_pretty(&presence)?);
        return Ok(());
    }

    println!("\nStatus at {}:", dates::format_local(&now.naive_local()));
    println!("{:-<60}", "");

    if presence.is_empty() {
        println!("  (no members)");
        return Ok(());
    }

    for view in &presence {
        println!("{}", presence_line(view));
    }

    Ok(())
}

/// Print the headline counts.
pub async fn show_summary(config: &Config, json: bool) -> Result<()> {
    let (_client, squad) = load_squad(config).await?;
    let summary = squad.summary(config.now().naive_local());

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\nSquad Overview:");
    println!("  Online:   {} of {}", summary.online, summary.members);
    println!("  Pending:  {}", summary.pending);
    println!("  Approved: {}", summary.approved);
    println!("  Members:  {}", summary.members);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbsenceRecord, AbsenceStatus, Role, SubjectRef, User};
    use chrono::NaiveDate;

    fn view(absent: bool) -> PresenceView {
        let start = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        PresenceView {
            user: User {
                id: "u1".into(),
                name: "Brenda Costa".into(),
                email: "b@x.com".into(),
                role: Role::Employee,
            },
            is_online: !absent,
            active_absence: absent.then(|| AbsenceRecord {
                id: "a1".into(),
                subject: SubjectRef::Id("u1".into()),
                subject_name: "Brenda Costa".into(),
                kind: "Folga".into(),
                start,
                end: start,
                status: AbsenceStatus::Approved,
                reason: None,
                requested_at: start,
            }),
        }
    }

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 3), "abc");
        assert_eq!(fit("Joã", 4), "Joã ");
    }

    #[test]
    fn test_presence_json_shape() {
        let value = serde_json::to_value(view(true)).unwrap();
        assert_eq!(value["id"], "u1");
        assert_eq!(value["isOnline"], false);
        assert_eq!(value["activeAbsence"]["subject"]["by"], "id");
        assert_eq!(value["activeAbsence"]["status"], "approved");
        assert_eq!(value["activeAbsence"]["start"], "2024-03-15T09:00:00");
    }

    #[test]
    fn test_presence_line() {
        let online = presence_line(&view(false));
        assert!(online.starts_with("Brenda Costa"));
        assert!(online.contains("online"));

        let away = presence_line(&view(true));
        assert!(away.contains("away"));
        assert!(away.ends_with("Folga until 15/03 09:00"));
    }
}
