//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Tabs, Widget},
    Frame,
};

use super::app::{App, Tab};
use super::form;
use crate::models::{AbsenceRecord, AbsenceStatus, PresenceView};
use crate::presence::dates;
use crate::store::LoadState;

/// Returns status indicator symbol and color based on online state
fn status_indicator(is_online: bool) -> (&'static str, Color) {
    if is_online {
        ("*", Color::Green)
    } else {
        ("o", Color::Red)
    }
}

fn status_color(status: AbsenceStatus) -> Color {
    match status {
        AbsenceStatus::Pending => Color::Yellow,
        AbsenceStatus::Approved => Color::Green,
        AbsenceStatus::Rejected => Color::Red,
    }
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD)
}

fn selected_style() -> Style {
    Style::default().bg(Color::Blue).fg(Color::White)
}

fn pane(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
}

fn period(a: &AbsenceRecord) -> String {
    format!("{} - {}", dates::format_short(&a.start), dates::format_short(&a.end))
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let presence = app.presence();

    // Layout: header + tab bar + content + status bar
    let [header_area, tabs_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app, &presence);
    render_tabs(tabs_area, frame.buffer_mut(), app);

    match app.tab {
        Tab::Dashboard => render_dashboard(main_area, frame.buffer_mut(), app, &presence),
        Tab::Status => render_status_board(main_area, frame, &presence),
        Tab::Pending => render_pending(main_area, frame, app),
        Tab::History => render_history(main_area, frame, app),
        Tab::Report => render_report(main_area, frame, app),
        Tab::Members => render_members(main_area, frame, app),
        Tab::Activity => render_activity(main_area, frame.buffer_mut(), app),
    }

    render_status(status_area, frame.buffer_mut(), app);

    if let Some(ref member_form) = app.form {
        form::render(frame, member_form);
    }
}

/// Render the header bar
fn render_header(area: Rect, buf: &mut Buffer, app: &App, presence: &[PresenceView]) {
    let title = Span::styled(
        " Squad Board",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let online = presence.iter().filter(|p| p.is_online).count();
    let (symbol, color) = status_indicator(online == presence.len());
    let online_text = format!(" {} {}/{} online ", symbol, online, presence.len());

    let clock_text = format!(
        " {} (UTC{}) ",
        app.now.format("%d/%m/%Y %H:%M"),
        app.now.offset()
    );

    let padding_width = (area.width as usize)
        .saturating_sub(" Squad Board".len() + online_text.len() + clock_text.len());

    let header_line = Line::from(vec![
        title,
        Span::raw(" ".repeat(padding_width)),
        Span::styled(online_text, Style::default().fg(color)),
        Span::styled(clock_text, Style::default().fg(Color::Cyan)),
    ]);

    Paragraph::new(header_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

fn render_tabs(area: Rect, buf: &mut Buffer, app: &App) {
    let pending = app.squad.pending().len();
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let label = match tab {
                Tab::Pending if pending > 0 => format!("{} {} ({})", i + 1, tab.title(), pending),
                _ => format!("{} {}", i + 1, tab.title()),
            };
            Line::from(label)
        })
        .collect();

    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled("|", Style::default().fg(Color::DarkGray)))
        .render(area, buf);
}

fn stat_card(area: Rect, buf: &mut Buffer, title: &str, value: String, sub: String, color: Color) {
    let block = pane(title);
    let inner = block.inner(area);
    block.render(area, buf);
    Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(sub, Style::default().fg(Color::DarkGray))),
    ])
    .render(inner, buf);
}

fn render_dashboard(area: Rect, buf: &mut Buffer, app: &App, presence: &[PresenceView]) {
    let summary = crate::presence::summarize(presence, app.squad.absences());

    let [cards_area, today_area] =
        Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(area);
    let [online_card, pending_card, approved_card, members_card] =
        Layout::horizontal([Constraint::Fill(1); 4]).areas(cards_area);

    stat_card(
        online_card,
        buf,
        "Online",
        summary.online.to_string(),
        format!("of {} total", summary.members),
        Color::Green,
    );
    stat_card(
        pending_card,
        buf,
        "Pending",
        summary.pending.to_string(),
        "awaiting decision".to_string(),
        if summary.pending > 0 {
            Color::LightRed
        } else {
            Color::Yellow
        },
    );
    stat_card(
        approved_card,
        buf,
        "Approved",
        summary.approved.to_string(),
        "see History".to_string(),
        Color::Blue,
    );
    stat_card(
        members_card,
        buf,
        "Members",
        summary.members.to_string(),
        "see Members".to_string(),
        Color::Magenta,
    );

    let block = pane("Today");
    let inner = block.inner(today_area);
    block.render(today_area, buf);

    let lines: Vec<Line> = presence
        .iter()
        .map(|p| {
            let (symbol, color) = status_indicator(p.is_online);
            let detail = match &p.active_absence {
                Some(a) => format!("  {}", a.kind),
                None => String::new(),
            };
            Line::from(vec![
                Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
                Span::raw(p.user.name.clone()),
                Span::styled(detail, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();
    Paragraph::new(lines).render(inner, buf);
}

fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    header: &[&str],
    rows: Vec<Row>,
    widths: &[Constraint],
    selected: Option<usize>,
) {
    let empty = rows.is_empty();
    let table = Table::new(rows, widths.to_vec())
        .header(Row::new(header.to_vec()).style(header_style()))
        .block(pane(title))
        .row_highlight_style(selected_style());

    let mut state = TableState::default();
    if !empty {
        state.select(selected);
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_status_board(area: Rect, frame: &mut Frame, presence: &[PresenceView]) {
    let rows: Vec<Row> = presence
        .iter()
        .map(|p| {
            let (symbol, color) = status_indicator(p.is_online);
            let (state, kind, until) = match &p.active_absence {
                None => ("available", String::from("-"), String::from("-")),
                Some(a) => ("away", a.kind.clone(), dates::format_short(&a.end)),
            };
            Row::new(vec![
                Cell::from(Span::styled(symbol, Style::default().fg(color))),
                Cell::from(p.user.name.clone()),
                Cell::from(Span::styled(state, Style::default().fg(color))),
                Cell::from(kind),
                Cell::from(until),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        "Who is online",
        &["", "Member", "State", "Absence", "Until"],
        rows,
        &[
            Constraint::Length(2),
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Fill(1),
            Constraint::Length(12),
        ],
        None,
    );
}

fn render_pending(area: Rect, frame: &mut Frame, app: &App) {
    let rows: Vec<Row> = app
        .squad
        .pending()
        .into_iter()
        .map(|a| {
            Row::new(vec![
                a.subject_name.clone(),
                a.kind.clone(),
                period(a),
                a.reason.clone().unwrap_or_default(),
                dates::format_date(&a.requested_at),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        "Pending requests  [a] approve  [r] reject",
        &["Member", "Kind", "Period", "Reason", "Requested"],
        rows,
        &[
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(25),
            Constraint::Fill(2),
            Constraint::Length(11),
        ],
        Some(app.selected),
    );
}

fn status_cell(status: AbsenceStatus) -> Cell<'static> {
    Cell::from(Span::styled(
        status.as_str(),
        Style::default().fg(status_color(status)),
    ))
}

fn render_history(area: Rect, frame: &mut Frame, app: &App) {
    let rows: Vec<Row> = app
        .squad
        .history()
        .into_iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(a.subject_name.clone()),
                Cell::from(a.kind.clone()),
                Cell::from(period(a)),
                status_cell(a.status),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        "Decided requests",
        &["Member", "Kind", "Period", "Status"],
        rows,
        &[
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(25),
            Constraint::Length(10),
        ],
        Some(app.selected),
    );
}

fn render_report(area: Rect, frame: &mut Frame, app: &App) {
    let rows: Vec<Row> = app
        .squad
        .absences()
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(a.subject_name.clone()),
                Cell::from(a.kind.clone()),
                Cell::from(dates::format_local(&a.start)),
                Cell::from(dates::format_local(&a.end)),
                status_cell(a.status),
                Cell::from(dates::format_date(&a.requested_at)),
            ])
        })
        .collect();

    let title = format!(
        "Monthly report  [e] export to {}",
        app.export_dir.join(crate::report::file_name(app.now)).display()
    );
    render_table(
        frame,
        area,
        &title,
        &["Member", "Kind", "Start", "End", "Status", "Requested"],
        rows,
        &[
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(20),
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(11),
        ],
        Some(app.selected),
    );
}

fn render_members(area: Rect, frame: &mut Frame, app: &App) {
    let rows: Vec<Row> = app
        .squad
        .users()
        .iter()
        .map(|u| {
            Row::new(vec![
                u.name.clone(),
                u.email.clone(),
                u.role.as_str().to_string(),
                u.id.clone(),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        "Members  [n] new  [d] delete",
        &["Name", "Email", "Role", "Id"],
        rows,
        &[
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(9),
            Constraint::Fill(2),
        ],
        Some(app.selected),
    );
}

/// Colorize a captured log line by its level.
fn colorize_log_line(line: &str) -> Line<'static> {
    let color = if line.contains("ERROR") {
        Color::Red
    } else if line.contains("WARN") {
        Color::Yellow
    } else if line.contains("INFO") {
        Color::Green
    } else {
        Color::DarkGray
    };
    Line::from(Span::styled(line.to_owned(), Style::default().fg(color)))
}

fn render_activity(area: Rect, buf: &mut Buffer, app: &App) {
    let block = pane("Activity");
    let inner = block.inner(area);
    block.render(area, buf);

    // Newest lines at the bottom; selection scrolls back from the end.
    let visible = inner.height as usize;
    let end = app.activity.len().saturating_sub(app.selected);
    let start = end.saturating_sub(visible);
    let lines: Vec<Line> = app.activity[start..end]
        .iter()
        .map(|l| colorize_log_line(l))
        .collect();
    Paragraph::new(lines).render(inner, buf);
}

fn load_label(state: &LoadState) -> (&'static str, Color) {
    match state {
        LoadState::Idle => ("idle", Color::Gray),
        LoadState::Loading => ("loading...", Color::Yellow),
        LoadState::Loaded => ("synced", Color::Green),
        LoadState::Failed { .. } => ("stale", Color::Red),
    }
}

/// Render the status bar
fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    if let Some(ref notice) = app.notice {
        let style = if notice.is_error {
            Style::default().fg(Color::Red).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green).bg(Color::DarkGray)
        };
        let line = Line::from(Span::styled(format!(" {} ", notice.text), style));
        Paragraph::new(line)
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
        return;
    }

    let (label, color) = load_label(app.squad.load_state());
    let sep_style = Style::default().fg(Color::Gray);
    let status_line = Line::from(vec![
        Span::styled(format!(" {} ", label), Style::default().fg(color)),
        Span::styled(" | ", sep_style),
        Span::styled("Tab/1-7: switch", Style::default().fg(Color::Gray)),
        Span::styled(" | ", sep_style),
        Span::styled("j/k: move", Style::default().fg(Color::Gray)),
        Span::styled(" | ", sep_style),
        Span::styled("R/F5: reload", Style::default().fg(Color::Gray)),
        Span::styled(" | ", sep_style),
        Span::styled("q: quit", Style::default().fg(Color::Gray)),
    ]);

    Paragraph::new(status_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{Role, SubjectRef, User};
    use crate::store::Squad;
    use crate::tui::log_capture::ActivityLog;
    use chrono::Duration;
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        let config = Config::default();
        let now = config.now().naive_local();
        let squad = Squad::with_snapshot(
            vec![
                User {
                    id: "u1".into(),
                    name: "Tacio Santos".into(),
                    email: "t@x.com".into(),
                    role: Role::Employee,
                },
                User {
                    id: "u3".into(),
                    name: "Brenda Costa".into(),
                    email: "b@x.com".into(),
                    role: Role::Employee,
                },
            ],
            vec![AbsenceRecord {
                id: "a2".into(),
                subject: SubjectRef::Id("u3".into()),
                subject_name: "Brenda Costa".into(),
                kind: "Folga".into(),
                start: now - Duration::hours(1),
                end: now + Duration::hours(23),
                status: AbsenceStatus::Approved,
                reason: None,
                requested_at: now,
            }],
        );
        App::new(config, squad, ActivityLog::new(), std::env::temp_dir())
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_dashboard_counts() {
        let text = screen(&app());
        assert!(text.contains("Squad Board"));
        assert!(text.contains("1/2 online"));
        assert!(text.contains("of 2 total"));
    }

    #[test]
    fn test_status_board_shows_absence() {
        let mut app = app();
        app.tab = Tab::Status;
        let text = screen(&app);
        assert!(text.contains("Brenda Costa"));
        assert!(text.contains("away"));
        assert!(text.contains("available"));
    }

    #[test]
    fn test_failed_reload_marks_status_bar_stale() {
        let mut app = app();
        app.squad.finish_load(
            Err(anyhow::anyhow!("timeout")),
            Err(anyhow::anyhow!("timeout")),
        );
        let text = screen(&app);
        assert!(text.contains("stale"));
        assert!(text.contains("Brenda Costa"));
    }

    #[test]
    fn test_every_tab_renders() {
        let mut app = app();
        app.activity.push(" WARN roster fetch failed".into());
        for tab in Tab::ALL {
            app.tab = tab;
            screen(&app);
        }
        app.form = Some(Default::default());
        let text = screen(&app);
        assert!(text.contains("New Member"));
    }
}
