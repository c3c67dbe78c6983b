//! New-member form: two single-line inputs in a popup.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

const POPUP_WIDTH: u16 = 56;
const POPUP_HEIGHT: u16 = 9;

/// Which input has focus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    #[default]
    Name,
    Email,
}

/// State of the new-member form.
#[derive(Debug, Default)]
pub struct MemberForm {
    pub name: String,
    pub email: String,
    pub focus: Field,
    /// Validation message from the last submit attempt.
    pub error: Option<String>,
}

impl MemberForm {
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.focused_mut().push(c);
        self.error = None;
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Name => Field::Email,
            Field::Email => Field::Name,
        };
    }

    /// Both fields filled in.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }
}

/// Centered rectangle of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn input_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{:<7}", label), label_style),
        Span::styled(value, Style::default().fg(Color::White)),
        Span::styled(cursor, Style::default().fg(Color::Cyan)),
    ])
}

/// Render the form popup over the current view.
pub fn render(frame: &mut Frame, form: &MemberForm) {
    let area = centered(frame.area(), POPUP_WIDTH, POPUP_HEIGHT);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " New Member ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [name_area, email_area, _, error_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(input_line("Name", &form.name, form.focus == Field::Name)),
        name_area,
    );
    frame.render_widget(
        Paragraph::new(input_line("Email", &form.email, form.focus == Field::Email)),
        email_area,
    );
    if let Some(ref error) = form.error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
            error_area,
        );
    }
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Tab: switch field  Enter: save  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
        hint_area,
    );
}
