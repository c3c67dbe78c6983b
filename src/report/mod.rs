//! Monthly absence report, as a spreadsheet-friendly CSV.
//!
//! Semicolon separated, UTF-8 with a byte-order mark so that spreadsheet
//! software picks the right encoding.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, FixedOffset};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AbsenceRecord;
use crate::presence::dates;

const BOM: char = '\u{feff}';
const HEADER: &str = "Colaborador;Tipo;Inicio;Fim;Status;Solicitado Em";

/// File name for a report generated at `at`: `historico_mensal_3_2024.csv`.
pub fn file_name(at: DateTime<FixedOffset>) -> String {
    format!("historico_mensal_{}_{}.csv", at.month(), at.year())
}

/// Keep a value inside its cell.
fn cell(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            ';' | '\n' | '\r' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Render every record, one row each, in input order.
pub fn render_csv(absences: &[AbsenceRecord]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(HEADER);
    for a in absences {
        out.push('\n');
        out.push_str(
            &[
                cell(&a.subject_name),
                cell(&a.kind),
                dates::format_local(&a.start),
                dates::format_local(&a.end),
                a.status.as_str().to_string(),
                dates::format_date(&a.requested_at),
            ]
            .join(";"),
        );
    }
    out
}

/// Write the report into `dir` and return the full path.
pub fn write_report(
    absences: &[AbsenceRecord],
    dir: &Path,
    at: DateTime<FixedOffset>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(file_name(at));
    fs::write(&path, render_csv(absences))
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    tracing::info!("Wrote {} records to {}", absences.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbsenceStatus, SubjectRef};
    use chrono::{NaiveDate, TimeZone};

    fn record(name: &str, kind: &str) -> AbsenceRecord {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        AbsenceRecord {
            id: "a1".into(),
            subject: SubjectRef::Id("u1".into()),
            subject_name: name.into(),
            kind: kind.into(),
            start: day.and_hms_opt(9, 0, 0).unwrap(),
            end: day.and_hms_opt(18, 30, 0).unwrap(),
            status: AbsenceStatus::Approved,
            reason: Some("ignored".into()),
            requested_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_render_csv() {
        let csv = render_csv(&[record("Tacio Santos", "Ausência Parcial")]);
        assert!(csv.starts_with('\u{feff}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "Tacio Santos;Ausência Parcial;15/03/2024 09:00:00;15/03/2024 18:30:00;approved;01/03/2024"
        );
    }

    #[test]
    fn test_render_csv_empty() {
        assert_eq!(render_csv(&[]), format!("\u{feff}{}", HEADER));
    }

    #[test]
    fn test_cells_cannot_break_rows() {
        let csv = render_csv(&[record("Ana;Maria\nSilva", "Folga")]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Ana Maria Silva;Folga;"));
    }

    #[test]
    fn test_file_name() {
        let at = FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 31, 23, 0, 0)
            .unwrap();
        assert_eq!(file_name(at), "historico_mensal_3_2024.csv");
    }

    #[test]
    fn test_write_report() {
        let dir = std::env::temp_dir().join(format!("squad-board-report-{}", uuid::Uuid::new_v4()));
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 12, 2, 10, 0, 0)
            .unwrap();
        let path = write_report(&[record("Ana", "Folga")], &dir, at).unwrap();
        assert!(path.ends_with("historico_mensal_12_2024.csv"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Ana;Folga;"));
        let _ = fs::remove_dir_all(&dir);
    }
}
