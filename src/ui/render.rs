use crate::state::{DisplayMessage, Role};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// One screen row of the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptRow {
    Header(Role),
    Body(Role, String),
    Spacer,
}

/// Hard-wrap the transcript to `width` columns.
pub fn transcript_rows(messages: &[DisplayMessage], width: usize) -> Vec<TranscriptRow> {
    let mut rows = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        if index > 0 {
            rows.push(TranscriptRow::Spacer);
        }
        rows.push(TranscriptRow::Header(message.role()));

        let body_width = match message.role() {
            Role::Code => width.saturating_sub(2),
            _ => width,
        };
        for line in message.text.split('\n') {
            for wrapped in wrap_line(line, body_width) {
                rows.push(TranscriptRow::Body(message.role(), wrapped));
            }
        }
    }
    rows
}

pub fn render_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    messages: &[DisplayMessage],
    scroll_from_bottom: usize,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let rows = transcript_rows(messages, area.width as usize);
    let height = area.height as usize;
    let end = rows.len().saturating_sub(scroll_from_bottom);
    let start = end.saturating_sub(height);

    let lines: Vec<Line<'static>> = rows[start..end].iter().map(styled_row).collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn styled_row(row: &TranscriptRow) -> Line<'static> {
    match row {
        TranscriptRow::Header(role) => {
            let (label, color) = match role {
                Role::User => ("you", Color::Cyan),
                Role::Assistant => ("assistant", Color::Green),
                Role::Code => ("code", Color::Yellow),
            };
            Line::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        }
        TranscriptRow::Body(Role::Code, text) => Line::styled(
            format!("│ {text}"),
            Style::default().fg(Color::Gray).bg(Color::Rgb(30, 30, 30)),
        ),
        TranscriptRow::Body(_, text) => Line::from(text.clone()),
        TranscriptRow::Spacer => Line::from(""),
    }
}

pub fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    input: &str,
    cursor_byte: usize,
    locked: bool,
) {
    if area.height < 3 || area.width <= 2 {
        return;
    }

    let title = if locked { "waiting for assistant" } else { "message" };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    let style = if locked {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };

    let width = inner.width.max(1) as usize;
    let cursor_col = display_width(&input[..cursor_byte.min(input.len())]);
    let offset = cursor_col.saturating_sub(width.saturating_sub(1));
    let visible = skip_columns(input, offset);

    frame.render_widget(Paragraph::new(visible).style(style).block(block), area);
    if !locked {
        let cursor_x = inner.x.saturating_add((cursor_col - offset) as u16);
        frame.set_cursor_position((cursor_x, inner.y));
    }
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_to_width(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut used = 0usize;
    for ch in line.chars() {
        if ch == '\r' {
            continue;
        }
        let ch_width = char_width(ch);
        if used + ch_width > width && used > 0 {
            rows.push(String::new());
            used = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(ch);
        }
        used += ch_width;
    }
    rows
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_width(ch);
        if used + ch_width > budget {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push_str("...");
    out
}

fn skip_columns(text: &str, columns: usize) -> String {
    let mut skipped = 0usize;
    text.chars()
        .skip_while(|ch| {
            if skipped >= columns {
                return false;
            }
            skipped += char_width(*ch);
            true
        })
        .collect()
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}
