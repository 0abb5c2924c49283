//! The secret-value panel under the browser panes.

use crate::orchestrator::LoadPhase;
use crate::state::App;
use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let title = match &app.browser.value.secret_name {
        Some(name) if app.reveal_value => format!("Value: {} [v to hide]", name),
        Some(name) => format!("Value: {} [v to reveal, y to copy]", name),
        None => "Value".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let (text, style) = match &app.browser.value.phase {
        LoadPhase::Idle => (String::new(), Style::default().fg(app.theme.text_dim)),
        LoadPhase::Loading => (
            "loading...".to_string(),
            Style::default().fg(app.theme.text_dim),
        ),
        LoadPhase::Failed(message) => (message.clone(), Style::default().fg(app.theme.error)),
        LoadPhase::Loaded => {
            let body = app.value_display().unwrap_or_default();
            let content_type = app
                .browser
                .value
                .value
                .as_ref()
                .and_then(|v| v.content_type.as_deref());
            let text = match content_type {
                Some(ct) => format!("{}\n[{}]", body, ct),
                None => body,
            };
            (text, Style::default().fg(app.theme.text))
        }
    };

    let paragraph = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(paragraph, area);
}
