//! Compose box: text input plus attachment chips and the recording indicator.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};

use crate::media::progress::format_size;
use crate::media::store::Attachment;

/// State for the compose box text input.
#[derive(Default)]
pub struct ComposeState {
    /// Current input text.
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
}

impl ComposeState {
    /// Insert a character at the current cursor position.
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let prev_byte_pos = self.char_to_byte(self.cursor_pos - 1);
            self.input.drain(prev_byte_pos..byte_pos);
            self.cursor_pos -= 1;
        }
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let next_byte_pos = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(byte_pos..next_byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
        }
    }

    pub fn move_right(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            self.cursor_pos += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    /// Clear all input text (Ctrl+U).
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    /// Take the current text and clear the box. The composer decides whether
    /// the (possibly empty) text plus pending attachments amount to a send.
    pub fn take(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }

    /// Convert a char-based cursor position to a byte offset.
    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Height of the compose box: borders + chips line + input line.
pub const COMPOSE_HEIGHT: u16 = 4;

/// What the chips line should show.
pub enum ChipsLine<'a> {
    Attachments(&'a [Attachment]),
    Recording { elapsed_secs: u64 },
}

/// Render the compose box: top border, chips/recording line, input line,
/// bottom border. Uses `Frame` so the cursor can be positioned.
pub fn render(
    area: Rect,
    frame: &mut Frame,
    state: &ComposeState,
    chips: ChipsLine<'_>,
    attach_prompt: Option<&str>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let chips_area = Rect::new(inner.x, inner.y, inner.width, 1);
    render_chips(chips_area, frame.buffer_mut(), &chips);

    if inner.height >= 2 {
        let input_area = Rect::new(inner.x, inner.y + 1, inner.width, 1);

        if let Some(path) = attach_prompt {
            render_attach_prompt(input_area, frame, path);
            return;
        }

        let cursor = compute_cursor_position(input_area, state);
        render_input(input_area, frame.buffer_mut(), state);
        if let Some((cx, cy)) = cursor {
            frame.set_cursor_position((cx, cy));
        }
    }
}

/// Attachment chips, or the live recording indicator.
fn render_chips(area: Rect, buf: &mut Buffer, chips: &ChipsLine<'_>) {
    let line = match chips {
        ChipsLine::Recording { elapsed_secs } => Line::from(vec![
            Span::styled(
                " \u{25CF} Recording ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format_clock(*elapsed_secs),
                Style::default().fg(Color::Red),
            ),
            Span::styled(
                "  (Ctrl+R to stop)",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        ChipsLine::Attachments(attachments) if attachments.is_empty() => Line::from(Span::styled(
            " Ctrl+O attach \u{00B7} Ctrl+R record",
            Style::default().fg(Color::DarkGray),
        )),
        ChipsLine::Attachments(attachments) => {
            let mut spans = vec![Span::styled(
                format!(" \u{1F4CE} {} ", attachments.len()),
                Style::default().fg(Color::Cyan),
            )];
            for att in attachments.iter() {
                spans.push(Span::styled(
                    format!(
                        "[{} {} ({})] ",
                        att.category.icon(),
                        att.file_name,
                        format_size(att.size)
                    ),
                    Style::default().fg(Color::White),
                ));
            }
            Line::from(spans)
        }
    };

    Paragraph::new(line).render(area, buf);
}

/// Render the input line (placeholder or typed text, with scrolling).
fn render_input(area: Rect, buf: &mut Buffer, state: &ComposeState) {
    let w = area.width as usize;

    if state.input.is_empty() {
        let placeholder = " Ask a clinical question...";
        let truncated: String = placeholder.chars().take(w).collect();
        Paragraph::new(Line::from(Span::styled(
            truncated,
            Style::default().fg(Color::DarkGray),
        )))
        .render(area, buf);
    } else {
        let display = display_text(&state.input, state.cursor_pos, w);
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", display.visible),
            Style::default().fg(Color::White),
        )))
        .render(area, buf);
    }
}

/// Path-entry prompt shown while attaching a file.
fn render_attach_prompt(area: Rect, frame: &mut Frame, path: &str) {
    let w = area.width as usize;
    let display = display_text(path, path.chars().count(), w.saturating_sub(14));
    let line = Line::from(vec![
        Span::styled(" Attach file: ", Style::default().fg(Color::Yellow)),
        Span::styled(display.visible.clone(), Style::default().fg(Color::White)),
    ]);
    let cursor_x = area.x + 14 + display.cursor_offset as u16;
    frame.render_widget(Paragraph::new(line), area);
    frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y));
}

fn compute_cursor_position(input_area: Rect, state: &ComposeState) -> Option<(u16, u16)> {
    if state.input.is_empty() {
        Some((input_area.x + 1, input_area.y))
    } else {
        let w = input_area.width as usize;
        let display = display_text(&state.input, state.cursor_pos, w);
        Some((input_area.x + 1 + display.cursor_offset as u16, input_area.y))
    }
}

/// Elapsed recording time as m:ss.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Information about what text to display and where the cursor is.
struct DisplayText {
    visible: String,
    /// Cursor offset within the visible text, in columns.
    cursor_offset: usize,
}

/// Compute the visible window of a single-line input, scrolling horizontally
/// to keep the cursor in view.
fn display_text(input: &str, cursor_pos: usize, width: usize) -> DisplayText {
    let avail = width.saturating_sub(1);
    if avail == 0 {
        return DisplayText {
            visible: String::new(),
            cursor_offset: 0,
        };
    }

    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let cursor = cursor_pos.min(len);

    if len <= avail {
        DisplayText {
            visible: input.to_string(),
            cursor_offset: cursor,
        }
    } else {
        let scroll_start = if cursor < avail { 0 } else { cursor - avail + 1 };
        let end = (scroll_start + avail).min(len);
        DisplayText {
            visible: chars[scroll_start..end].iter().collect(),
            cursor_offset: cursor - scroll_start,
        }
    }
}
