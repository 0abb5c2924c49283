//! Progress gauge for bulk cache warming.

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Gauge},
    Frame,
};

pub struct BulkGauge {
    pub completed: usize,
    pub total: usize,
    pub current: String,
    pub style: Style,
}

impl BulkGauge {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let ratio = if self.total == 0 {
            1.0
        } else {
            (self.completed as f64 / self.total as f64).clamp(0.0, 1.0)
        };
        let label = if self.completed == self.total {
            format!("{}/{} done", self.completed, self.total)
        } else {
            format!("{}/{} {}", self.completed, self.total, self.current)
        };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title("Warming cache [x to cancel]")
                    .borders(Borders::ALL),
            )
            .gauge_style(self.style)
            .ratio(ratio)
            .label(label);
        f.render_widget(gauge, area);
    }
}
