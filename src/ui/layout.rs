use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatLayout {
    pub status: Rect,
    pub transcript: Rect,
    pub input: Rect,
}

/// Status bar on top, transcript in the middle, a framed input box below.
pub fn split_chat_layout(area: Rect) -> ChatLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    ChatLayout {
        status: chunks[0],
        transcript: chunks[1],
        input: chunks[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_reserves_status_and_input_rows() {
        let panes = split_chat_layout(Rect::new(0, 0, 80, 20));

        assert_eq!(panes.status.height, 1);
        assert_eq!(panes.transcript.height, 16);
        assert_eq!(panes.input.height, 3);
        assert_eq!(panes.transcript.y, 1);
        assert_eq!(panes.input.y, 17);
    }
}
