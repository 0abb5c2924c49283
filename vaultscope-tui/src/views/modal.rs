//! Modal overlays: secret editor, delete confirmation, help.

use crate::state::{App, EditorField, EditorModal, Modal};
use crate::views::helpers::centered_rect;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, modal: &Modal) {
    match modal {
        Modal::Editor(editor) => render_editor(f, app, editor),
        Modal::ConfirmDelete {
            vault_name,
            secret_name,
        } => render_confirm_delete(f, app, vault_name, secret_name),
        Modal::Help => render_help(f, app),
    }
}

fn render_editor(f: &mut Frame<'_>, app: &App, editor: &EditorModal) {
    let area = centered_rect(70, 60, f.size());
    f.render_widget(Clear, area);

    let title = if editor.is_new {
        format!("New secret in {}", editor.vault_name)
    } else {
        format!("Edit {} in {}", editor.secret_name(), editor.vault_name)
    };
    let frame_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.primary))
        .title(title);
    let inner = frame_block.inner(area);
    f.render_widget(frame_block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    render_field(f, app, rows[0], "Name", &editor.name, editor.field == EditorField::Name);
    render_field(f, app, rows[1], "Value", &editor.value, editor.field == EditorField::Value);

    let hint = if editor.is_new {
        "Tab switch field \u{2022} Ctrl+s save \u{2022} Esc cancel"
    } else {
        "Ctrl+s save \u{2022} Esc cancel"
    };
    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(app.theme.text_dim)),
        rows[2],
    );
}

fn render_field(
    f: &mut Frame<'_>,
    app: &App,
    area: Rect,
    title: &str,
    textarea: &tui_textarea::TextArea<'static>,
    active: bool,
) {
    let style = if active {
        Style::default().fg(app.theme.primary)
    } else {
        Style::default().fg(app.theme.text_dim)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(textarea, inner);
}

fn render_confirm_delete(f: &mut Frame<'_>, app: &App, vault_name: &str, secret_name: &str) {
    let area = centered_rect(50, 20, f.size());
    f.render_widget(Clear, area);

    let text = format!(
        "Delete secret '{}' from vault '{}'?\n\nEnter to confirm \u{2022} Esc to cancel",
        secret_name, vault_name
    );
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(app.theme.warning))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.warning))
                .title("Confirm delete"),
        );
    f.render_widget(paragraph, area);
}

fn render_help(f: &mut Frame<'_>, app: &App) {
    let area = centered_rect(60, 70, f.size());
    f.render_widget(Clear, area);

    let text = "\
h/l, Left/Right   move pane focus
j/k, Up/Down      move cursor
Enter             select item, load next level
r                 refresh focused pane (invalidate + reload)
R, Ctrl+r         clear the whole cache and restart
n                 new secret in selected vault
e                 edit selected secret
d                 delete selected secret
v                 reveal / hide secret value
y                 copy value to the internal buffer
x                 cancel running bulk load
?                 this help
q, Ctrl+c         quit";

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.primary))
                .title("Help [Esc to close]"),
        );
    f.render_widget(paragraph, area);
}
