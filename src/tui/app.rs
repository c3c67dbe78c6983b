//! TUI application state and main event loop

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio_stream::wrappers::IntervalStream;

use super::backend::{Backend, BackendCommand, BackendResponse};
use super::form::MemberForm;
use super::log_capture::ActivityLog;
use super::ui;
use crate::api::client::WebhookClient;
use crate::config::Config;
use crate::models::{AbsenceRecord, PresenceView, User};
use crate::report;
use crate::store::{Squad, StoreError};

/// Activity lines kept for scrollback.
const MAX_ACTIVITY_LINES: usize = 1000;

/// Dashboard tabs, in display order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Dashboard,
    Status,
    Pending,
    History,
    Report,
    Members,
    Activity,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Dashboard,
        Tab::Status,
        Tab::Pending,
        Tab::History,
        Tab::Report,
        Tab::Members,
        Tab::Activity,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Status => "Status",
            Tab::Pending => "Pending",
            Tab::History => "History",
            Tab::Report => "Report",
            Tab::Members => "Members",
            Tab::Activity => "Activity",
        }
    }

    fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Transient message in the status bar.
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Application state
pub struct App {
    pub config: Config,
    pub squad: Squad,
    pub tab: Tab,
    /// Row selected in the current tab's list.
    pub selected: usize,
    /// Wall-clock time, advanced on every tick.
    pub now: DateTime<FixedOffset>,
    pub should_exit: bool,
    pub form: Option<MemberForm>,
    /// Member id awaiting delete confirmation.
    pub confirm_delete: Option<String>,
    pub notice: Option<Notice>,
    pub activity: Vec<String>,
    pub export_dir: PathBuf,
    log: ActivityLog,
}

impl App {
    pub fn new(config: Config, squad: Squad, log: ActivityLog, export_dir: PathBuf) -> Self {
        let now = config.now();
        Self {
            config,
            squad,
            tab: Tab::default(),
            selected: 0,
            now,
            should_exit: false,
            form: None,
            confirm_delete: None,
            notice: None,
            activity: Vec::new(),
            export_dir,
            log,
        }
    }

    /// Presence at the current tick.
    pub fn presence(&self) -> Vec<PresenceView> {
        self.squad.presence(self.now.naive_local())
    }

    /// Advance the clock. Presence is derived on the next draw.
    pub fn tick(&mut self) {
        self.now = self.config.now();
    }

    /// Pull captured log lines into the Activity tab.
    pub fn refresh_activity(&mut self) {
        let new_lines = self.log.drain();
        if new_lines.is_empty() {
            return;
        }
        self.activity.extend(new_lines);
        if self.activity.len() > MAX_ACTIVITY_LINES {
            let excess = self.activity.len() - MAX_ACTIVITY_LINES;
            self.activity.drain(..excess);
        }
    }

    fn notify(&mut self, text: impl Into<String>, is_error: bool) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error,
        });
    }

    /// Rows selectable in the current tab.
    fn row_count(&self) -> usize {
        match self.tab {
            Tab::Dashboard | Tab::Status | Tab::Members => self.squad.users().len(),
            Tab::Pending => self.squad.pending().len(),
            Tab::History => self.squad.history().len(),
            Tab::Report => self.squad.absences().len(),
            Tab::Activity => self.activity.len(),
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.row_count();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.selected = 0;
        self.confirm_delete = None;
    }

    pub fn selected_pending(&self) -> Option<&AbsenceRecord> {
        self.squad.pending().get(self.selected).copied()
    }

    pub fn selected_member(&self) -> Option<&User> {
        self.squad.users().get(self.selected)
    }

    /// Start a reload; the backend delivers the snapshot later.
    pub fn request_reload(&mut self) -> BackendCommand {
        self.squad.begin_load();
        BackendCommand::Reload
    }

    /// Handle one key press. Returns a command for the backend, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<BackendCommand> {
        if self.form.is_some() {
            return self.handle_form_key(key);
        }
        if let Some(id) = self.confirm_delete.take() {
            return self.handle_confirm_key(key, id);
        }

        self.notice = None;
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_exit = true;
            }
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.prev()),
            KeyCode::Char(c @ '1'..='7') => {
                let index = c as usize - '1' as usize;
                self.switch_tab(Tab::ALL[index]);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.row_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::F(5) | KeyCode::Char('R') => return Some(self.request_reload()),
            KeyCode::Char('a') if self.tab == Tab::Pending => return self.decide(true),
            KeyCode::Char('r') if self.tab == Tab::Pending => return self.decide(false),
            KeyCode::Char('e') if self.tab == Tab::Report => self.export(),
            KeyCode::Char('n') if self.tab == Tab::Members => {
                self.form = Some(MemberForm::default());
            }
            KeyCode::Char('d') if self.tab == Tab::Members => {
                if let Some(user) = self.selected_member() {
                    let (id, name) = (user.id.clone(), user.name.clone());
                    self.confirm_delete = Some(id);
                    self.notify(format!("Delete {}? (y/n)", name), false);
                }
            }
            _ => {}
        }
        None
    }

    fn decide(&mut self, approve: bool) -> Option<BackendCommand> {
        let id = self.selected_pending()?.id.clone();
        let result = if approve {
            self.squad.approve(&id)
        } else {
            self.squad.reject(&id)
        };
        match result {
            Ok(record) => {
                self.notify(format!("{} {}", record.subject_name, record.status), false);
                self.clamp_selection();
                Some(BackendCommand::Decide(record))
            }
            Err(e) => {
                self.notify(e.to_string(), true);
                None
            }
        }
    }

    fn export(&mut self) {
        match report::write_report(self.squad.absences(), &self.export_dir, self.now) {
            Ok(path) => self.notify(format!("Report written to {}", path.display()), false),
            Err(e) => self.notify(format!("Export failed: {:#}", e), true),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent, id: String) -> Option<BackendCommand> {
        if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            self.notify("Delete cancelled", false);
            return None;
        }
        match self.squad.remove_member(&id) {
            Ok(user) => {
                self.notify(format!("Removed {}", user.name), false);
                self.clamp_selection();
                Some(BackendCommand::DeleteUser(user.id))
            }
            Err(e) => {
                self.notify(e.to_string(), true);
                None
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<BackendCommand> {
        let form = self.form.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.form = None;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter if !form.is_complete() => form.toggle_focus(),
            KeyCode::Enter => {
                let (name, email) = (form.name.clone(), form.email.clone());
                return match self.squad.add_member(&name, &email) {
                    Ok(user) => {
                        self.form = None;
                        self.notify(format!("Added {}", user.name), false);
                        Some(BackendCommand::SaveUser(user))
                    }
                    Err(StoreError::InvalidMember(reason)) => {
                        form.error = Some(reason);
                        None
                    }
                    Err(e) => {
                        form.error = Some(e.to_string());
                        None
                    }
                };
            }
            KeyCode::Char(c) => form.insert_char(c),
            _ => {}
        }
        None
    }

    /// Apply a backend response.
    pub fn handle_response(&mut self, resp: BackendResponse) {
        match resp {
            // Fetch failures are already logged; the status bar marks the
            // snapshot stale.
            BackendResponse::Snapshot { users, absences } => {
                self.squad.finish_load(users, absences);
                self.clamp_selection();
            }
            BackendResponse::Confirmed { action, result } => match result {
                Ok(()) => tracing::info!("Webhook confirmed {}", action),
                Err(e) => {
                    tracing::warn!("Webhook did not confirm {}: {:#}", action, e);
                    self.notify(format!("Not confirmed: {}", action), true);
                }
            },
        }
    }
}

/// Run the dashboard until the user quits.
///
/// `ratatui::init` installs a panic hook that restores the terminal.
pub async fn run(config: Config, log: ActivityLog, export_dir: PathBuf) -> Result<()> {
    let client = WebhookClient::new(config.clone())?;
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, client, config, log, export_dir).await;
    ratatui::restore();
    result
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    client: WebhookClient,
    config: Config,
    log: ActivityLog,
    export_dir: PathBuf,
) -> Result<()> {
    let mut ticks = IntervalStream::new(tokio::time::interval(config.tick()));
    let mut backend = Backend::start(client);
    let mut app = App::new(config, Squad::new(), log, export_dir);
    let mut events = EventStream::new();
    let mut changes = app.squad.subscribe();

    backend.send(app.request_reload());

    while !app.should_exit {
        app.refresh_activity();
        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if let Some(cmd) = app.handle_key(key) {
                        backend.send(cmd);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(resp) = backend.recv() => app.handle_response(resp),
            Some(_) = ticks.next() => app.tick(),
            Ok(()) = changes.changed() => {
                tracing::debug!("State revision {}", app.squad.revision());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbsenceStatus, Role, SubjectRef};
    use crate::store::LoadState;
    use anyhow::anyhow;
    use chrono::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let config = Config::default();
        let now = config.now().naive_local();
        let users = vec![
            User {
                id: "u1".into(),
                name: "Tacio Santos".into(),
                email: "tsantos@x.com".into(),
                role: Role::Employee,
            },
            User {
                id: "u2".into(),
                name: "Brenda Costa".into(),
                email: "bcosta@x.com".into(),
                role: Role::Admin,
            },
        ];
        let absences = vec![AbsenceRecord {
            id: "a1".into(),
            subject: SubjectRef::Id("u1".into()),
            subject_name: "Tacio Santos".into(),
            kind: "Ausência Parcial".into(),
            start: now - Duration::minutes(5),
            end: now + Duration::hours(1),
            status: AbsenceStatus::Pending,
            reason: Some("Consulta".into()),
            requested_at: now,
        }];
        App::new(
            config,
            Squad::with_snapshot(users, absences),
            ActivityLog::new(),
            std::env::temp_dir(),
        )
    }

    #[test]
    fn test_tab_cycling() {
        let mut app = app();
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.tab, Tab::Activity);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.tab, Tab::Dashboard);
        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.tab, Tab::Pending);
    }

    #[test]
    fn test_approve_updates_presence_and_emits_command() {
        let mut app = app();
        assert!(app.presence()[0].is_online);

        app.handle_key(key(KeyCode::Char('3')));
        let cmd = app.handle_key(key(KeyCode::Char('a')));
        match cmd {
            Some(BackendCommand::Decide(record)) => {
                assert_eq!(record.id, "a1");
                assert_eq!(record.status, AbsenceStatus::Approved);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!app.presence()[0].is_online);
        assert!(app.squad.pending().is_empty());

        // Nothing left to decide.
        assert!(app.handle_key(key(KeyCode::Char('r'))).is_none());
    }

    #[test]
    fn test_decision_keys_only_on_pending_tab() {
        let mut app = app();
        assert!(app.handle_key(key(KeyCode::Char('a'))).is_none());
        assert_eq!(app.squad.pending().len(), 1);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('6')));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.confirm_delete.as_deref(), Some("u2"));

        assert!(app.handle_key(key(KeyCode::Char('n'))).is_none());
        assert_eq!(app.squad.users().len(), 2);

        app.handle_key(key(KeyCode::Char('d')));
        let cmd = app.handle_key(key(KeyCode::Char('y')));
        assert!(matches!(cmd, Some(BackendCommand::DeleteUser(ref id)) if id == "u2"));
        assert_eq!(app.squad.users().len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_member_form_flow() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('6')));
        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.form.is_some());

        for c in "Luciano".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        // Enter on an incomplete form moves to the next field.
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        for c in "bad-email".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert!(app.form.as_ref().unwrap().error.is_some());

        for _ in 0.."bad-email".len() {
            app.handle_key(key(KeyCode::Backspace));
        }
        for c in "lm@x.com".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let cmd = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(cmd, Some(BackendCommand::SaveUser(ref u)) if u.email == "lm@x.com"));
        assert!(app.form.is_none());
        assert_eq!(app.squad.users().len(), 3);
    }

    #[test]
    fn test_quit_ignored_while_typing() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('6')));
        app.handle_key(key(KeyCode::Char('n')));
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.should_exit);
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_exit);
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let mut app = app();
        let cmd = app.handle_key(key(KeyCode::F(5)));
        assert!(matches!(cmd, Some(BackendCommand::Reload)));
        assert_eq!(app.squad.load_state(), &LoadState::Loading);

        app.handle_response(BackendResponse::Snapshot {
            users: Err(anyhow!("timeout")),
            absences: Err(anyhow!("timeout")),
        });
        assert_eq!(app.squad.users().len(), 2);
        assert!(matches!(app.squad.load_state(), LoadState::Failed { .. }));
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_unconfirmed_mutation_is_not_rolled_back() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('3')));
        app.handle_key(key(KeyCode::Char('r')));
        app.handle_response(BackendResponse::Confirmed {
            action: "rejected a1".into(),
            result: Err(anyhow!("HTTP 500")),
        });
        assert_eq!(app.squad.absences()[0].status, AbsenceStatus::Rejected);
    }

    #[test]
    fn test_refresh_activity_caps_lines() {
        let mut app = app();
        for i in 0..400 {
            app.log.push(format!("line {}", i));
        }
        app.refresh_activity();
        app.activity.extend((0..700).map(|i| format!("old {}", i)));
        for i in 0..10 {
            app.log.push(format!("new {}", i));
        }
        app.refresh_activity();
        assert_eq!(app.activity.len(), MAX_ACTIVITY_LINES);
        assert_eq!(app.activity.last().map(String::as_str), Some("new 9"));
    }
}
