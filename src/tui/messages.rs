//! Message transcript pane.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::media::progress::format_size;
use crate::models::message::{ChatMessage, Sender};

/// Render the transcript, pinned to the most recent messages.
pub fn render(area: Rect, buf: &mut Buffer, messages: &[ChatMessage]) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();

    for msg in messages {
        lines.push(header_line(msg));
        for text_line in msg.text.lines() {
            for wrapped in wrap_line(text_line, width) {
                lines.push(Line::from(Span::raw(format!(" {}", wrapped))));
            }
        }
        for att in &msg.attachments {
            lines.push(Line::from(Span::styled(
                format!(
                    " \u{1F4CE} {} {} ({})",
                    att.category.icon(),
                    att.file_name,
                    format_size(att.size)
                ),
                Style::default().fg(Color::Cyan),
            )));
        }
        lines.push(Line::default());
    }

    // Keep the tail visible.
    let visible = area.height as usize;
    let skip = lines.len().saturating_sub(visible);
    let tail: Vec<Line> = lines.into_iter().skip(skip).collect();

    Paragraph::new(tail).render(area, buf);
}

fn header_line(msg: &ChatMessage) -> Line<'static> {
    let (label, color) = match msg.sender {
        Sender::User => ("You", Color::Yellow),
        Sender::Assistant => ("Vita", Color::Green),
    };
    Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            msg.created_at.format("%H:%M").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Greedy word wrap; words longer than the width are split hard.
fn wrap_line(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_w = 0usize;

    for word in text.split_whitespace() {
        let mut word_w = unicode_width::UnicodeWidthStr::width(word);
        let mut word = word.to_string();

        // Hard-split words wider than the pane.
        while word_w > width {
            let mut taken = String::new();
            let mut taken_w = 0;
            for ch in word.chars() {
                let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
                if taken_w + cw > width {
                    break;
                }
                taken.push(ch);
                taken_w += cw;
            }
            // A single char wider than the pane must still be consumed, or
            // the split never advances.
            if taken.is_empty() {
                if let Some(ch) = word.chars().next() {
                    taken.push(ch);
                }
            }
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
                current_w = 0;
            }
            out.push(taken.clone());
            word = word[taken.len()..].to_string();
            word_w = unicode_width::UnicodeWidthStr::width(word.as_str());
        }

        let sep = usize::from(!current.is_empty());
        if current_w + sep + word_w > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_w = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_w += 1;
        }
        current.push_str(&word);
        current_w += word_w;
    }

    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}
