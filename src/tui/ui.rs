//! Top-level layout: status bar, transcript, compose box, notice line.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::app::{App, InputMode};
use super::compose::{self, ChipsLine, COMPOSE_HEIGHT};
use super::messages;

pub fn render(frame: &mut Frame, app: &App) {
    let [status_area, messages_area, compose_area, notice_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(COMPOSE_HEIGHT),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_status_bar(status_area, frame, app);
    messages::render(messages_area, frame.buffer_mut(), &app.messages);

    let attachments = app.pending_attachments();
    let chips = if app.recorder.is_recording() {
        ChipsLine::Recording {
            elapsed_secs: app.recorder.elapsed_secs(),
        }
    } else {
        ChipsLine::Attachments(&attachments)
    };
    let attach_prompt = match app.mode {
        InputMode::AttachPath => Some(app.attach_input.as_str()),
        InputMode::Compose => None,
    };
    compose::render(compose_area, frame, &app.compose, chips, attach_prompt);

    render_notice(notice_area, frame, app);
}

fn render_status_bar(area: Rect, frame: &mut Frame, app: &App) {
    use crate::speech::ReadAloudState;
    let read_aloud = if !app.read_aloud.is_supported() {
        "read-aloud unavailable"
    } else {
        match app.read_aloud.state() {
            ReadAloudState::Idle => "read-aloud on",
            ReadAloudState::Speaking => "speaking (Ctrl+P pause)",
            ReadAloudState::Paused => "paused (Ctrl+P resume)",
        }
    };
    let line = Line::from(vec![
        Span::styled(
            " VITA ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" clinical assistant", Style::default().fg(Color::White)),
        Span::styled(
            format!("  \u{00B7} {}  \u{00B7} Esc quit", read_aloud),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_notice(area: Rect, frame: &mut Frame, app: &App) {
    let Some(notice) = &app.notice else {
        return;
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", notice),
            Style::default().fg(Color::Yellow),
        ))),
        area,
    );
}
