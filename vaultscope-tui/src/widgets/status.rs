//! Bottom status line: keybinding hints or the latest notification on the
//! left, load-origin status on the right.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct StatusLine {
    pub left: String,
    pub left_style: Style,
    pub right: String,
    pub right_style: Style,
}

impl StatusLine {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(30)])
            .split(inner);

        f.render_widget(
            Paragraph::new(self.left.as_str()).style(self.left_style),
            columns[0],
        );
        f.render_widget(
            Paragraph::new(self.right.as_str())
                .style(self.right_style)
                .alignment(ratatui::layout::Alignment::Right),
            columns[1],
        );
    }
}
