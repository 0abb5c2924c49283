//! View rendering dispatch.

pub mod browser;
pub mod helpers;
pub mod modal;
pub mod value;

use crate::notifications::NotificationLevel;
use crate::state::App;
use crate::widgets::{BulkGauge, StatusLine};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App) {
    let show_gauge = app.bulk.as_ref().is_some_and(|bulk| !bulk.is_done());
    let constraints = if show_gauge {
        vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(3),
        ]
    } else {
        vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ]
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.size());

    render_header(f, app, layout[0]);

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(layout[1]);
    browser::render_panes(f, app, body[0]);
    value::render(f, app, body[1]);

    if show_gauge {
        if let Some(bulk) = &app.bulk {
            BulkGauge {
                completed: bulk.completed,
                total: bulk.total,
                current: bulk.current.clone(),
                style: Style::default().fg(app.theme.secondary),
            }
            .render(f, layout[2]);
        }
    }

    render_footer(f, app, layout[layout.len() - 1]);

    if let Some(modal) = &app.modal {
        modal::render(f, app, modal);
    }
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let account = app
        .browser
        .accounts
        .selected_item()
        .map(|a| a.name.as_str())
        .unwrap_or("-");
    let vault = app
        .browser
        .vaults
        .selected_item()
        .map(|v| v.name.as_str())
        .unwrap_or("-");
    let title = format!("vaultscope | Account: {} | Vault: {}", account, vault);
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().fg(app.theme.primary),
    ));
    f.render_widget(block, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = "h/j/k/l move \u{2022} Enter select \u{2022} r refresh \u{2022} R refresh all \u{2022} n new \u{2022} e edit \u{2022} d delete \u{2022} v reveal \u{2022} ? help \u{2022} q quit";
    let (left, left_style) = if let Some(note) = app.last_notification() {
        let (label, color) = match note.level {
            NotificationLevel::Info => ("INFO", app.theme.info),
            NotificationLevel::Warning => ("WARN", app.theme.warning),
            NotificationLevel::Error => ("ERROR", app.theme.error),
            NotificationLevel::Success => ("SUCCESS", app.theme.success),
        };
        (
            format!("{}: {}", label, note.message),
            Style::default().fg(color),
        )
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };

    StatusLine {
        left,
        left_style,
        right: app.status.clone(),
        right_style: Style::default().fg(app.theme.text_dim),
    }
    .render(f, area);
}
