//! The four cascading selection panes.

use crate::orchestrator::{LoadPhase, PaneState};
use crate::state::{App, Focus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

pub fn render_panes(f: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    render_pane(
        f,
        app,
        columns[0],
        "Accounts",
        app.focus == Focus::Accounts,
        &app.browser.accounts,
        |account| {
            if account.is_default {
                format!("{} *", account.name)
            } else {
                account.name.clone()
            }
        },
    );
    render_pane(
        f,
        app,
        columns[1],
        "Subscriptions",
        app.focus == Focus::Subscriptions,
        &app.browser.subscriptions,
        |group| {
            if group.is_single() {
                group.members[0].name.clone()
            } else {
                format!("{} ({})", group.base, group.members.len())
            }
        },
    );
    render_pane(
        f,
        app,
        columns[2],
        "Vaults",
        app.focus == Focus::Vaults,
        &app.browser.vaults,
        |vault| vault.name.clone(),
    );
    render_pane(
        f,
        app,
        columns[3],
        "Secrets",
        app.focus == Focus::Secrets,
        &app.browser.secrets,
        |secret| {
            if secret.enabled {
                secret.name.clone()
            } else {
                format!("{} (disabled)", secret.name)
            }
        },
    );
}

fn render_pane<T>(
    f: &mut Frame<'_>,
    app: &App,
    area: Rect,
    title: &str,
    focused: bool,
    pane: &PaneState<T>,
    format_item: impl Fn(&T) -> String,
) {
    let title = match &pane.phase {
        LoadPhase::Loading if pane.show_indicator => format!("{} (loading...)", title),
        LoadPhase::Failed(_) => format!("{} (error)", title),
        _ => title.to_string(),
    };
    let border_style = if focused {
        Style::default().fg(app.theme.primary)
    } else {
        Style::default().fg(app.theme.text_dim)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    // A failed level renders its error message, never an empty list that
    // could read as "zero items".
    if let LoadPhase::Failed(message) = &pane.phase {
        let error = Paragraph::new(message.as_str())
            .style(Style::default().fg(app.theme.error))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(error, area);
        return;
    }

    let items: Vec<ListItem<'_>> = pane
        .items
        .iter()
        .map(|item| ListItem::new(format_item(item)))
        .collect();
    let list = List::new(items)
        .block(block)
        .style(Style::default().fg(app.theme.text))
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(pane.selected);
    f.render_stateful_widget(list, area, &mut state);
}
