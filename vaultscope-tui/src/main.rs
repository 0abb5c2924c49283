//! vaultscope entry point and event loop.
//!
//! All UI state lives on this task. Loads run as spawned tasks holding a
//! fetcher clone; their results come back over the event channel carrying
//! the load token, and re-enter through `Browser::apply`, which discards
//! anything whose selection has been superseded.

use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use vaultscope_cache::{
    BulkLoader, CancelFlag, Clock, Fetched, Origin, ProgressEvent, ResourceCache, SecretFetcher,
    SystemClock, TokenCache,
};
use vaultscope_core::naming::group_subscriptions;
use vaultscope_core::SecretValue;
use vaultscope_tui::arm::{ArmSource, CliTokenIssuer};
use vaultscope_tui::config::TuiConfig;
use vaultscope_tui::error::TuiError;
use vaultscope_tui::events::{MutationKind, TuiEvent};
use vaultscope_tui::keys::{map_key, Action};
use vaultscope_tui::notifications::NotificationLevel;
use vaultscope_tui::orchestrator::{LoadOutcome, LoadRequest, LoadTarget};
use vaultscope_tui::persistence::{self, PersistedState};
use vaultscope_tui::state::{App, BulkProgress, Modal};
use vaultscope_tui::views;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = match config.cache_ttl_secs {
        Some(secs) => Arc::new(ResourceCache::with_default_ttl(
            clock.clone(),
            chrono::Duration::seconds(secs as i64),
        )),
        None => Arc::new(ResourceCache::new(clock.clone())),
    };
    let tokens = Arc::new(TokenCache::new(clock));
    let source = Arc::new(ArmSource::new(&config, tokens, Arc::new(CliTokenIssuer))?);
    let fetcher = SecretFetcher::new(cache, source.clone());

    let restore = persistence::load(&config.persistence_path)
        .ok()
        .flatten()
        .map(Into::into)
        .unwrap_or_default();
    let mut app = App::new(config, fetcher, restore);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    spawn_input_reader(event_tx.clone());

    let request = app.browser.start();
    dispatch(&mut app, &source, request, &event_tx);

    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal.draw(|f| views::render(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                let _ = event_tx.send(TuiEvent::Tick).await;
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, &source, event, &event_tx) {
                    break;
                }
            }
        }
    }

    let persisted = PersistedState::from(app.browser.selection_path());
    let _ = persistence::save(&app.config.persistence_path, &persisted);

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                match evt {
                    CrosstermEvent::Key(key) => {
                        let _ = sender.blocking_send(TuiEvent::Input(key));
                    }
                    CrosstermEvent::Resize(width, height) => {
                        let _ = sender.blocking_send(TuiEvent::Resize { width, height });
                    }
                    _ => {}
                }
            }
        }
    });
}

/// Execute a load request on a spawned task. The result re-enters the
/// event loop as `TuiEvent::Loaded` carrying the token captured here.
fn dispatch(
    app: &mut App,
    source: &Arc<ArmSource>,
    request: LoadRequest,
    sender: &mpsc::Sender<TuiEvent>,
) {
    let fetcher = app.fetcher.clone();
    let sender = sender.clone();
    match request {
        LoadRequest::Accounts { token } => {
            tokio::spawn(async move {
                let outcome = LoadOutcome::Accounts(fetcher.accounts().await);
                let _ = sender.send(TuiEvent::Loaded { token, outcome }).await;
            });
        }
        LoadRequest::Subscriptions { token, tenant_id } => {
            let source = source.clone();
            tokio::spawn(async move {
                // Account switch: the data plane authenticates against
                // this tenant from now on, and old tokens are dropped.
                source.set_active_tenant(tenant_id).await;
                let result = fetcher.subscriptions(tenant_id).await.map(|fetched| Fetched {
                    value: group_subscriptions(&fetched.value),
                    origin: fetched.origin,
                });
                let outcome = LoadOutcome::Subscriptions(result);
                let _ = sender.send(TuiEvent::Loaded { token, outcome }).await;
            });
        }
        LoadRequest::Vaults {
            token,
            subscription_id,
        } => {
            tokio::spawn(async move {
                let outcome = LoadOutcome::Vaults(fetcher.vaults(subscription_id).await);
                let _ = sender.send(TuiEvent::Loaded { token, outcome }).await;
            });
        }
        LoadRequest::VaultsForGroup { token, members } => {
            let cancel = CancelFlag::new();
            app.bulk = Some(BulkProgress {
                completed: 0,
                total: members.len(),
                current: String::new(),
                cancel: cancel.clone(),
            });
            let concurrency = app.config.bulk_concurrency;
            tokio::spawn(async move {
                let (progress_tx, mut progress_rx) = mpsc::channel::<ProgressEvent>(64);
                let forward = sender.clone();
                tokio::spawn(async move {
                    while let Some(event) = progress_rx.recv().await {
                        let _ = forward.send(TuiEvent::Progress(event)).await;
                    }
                });

                let loader = BulkLoader::new(concurrency);
                let result = loader
                    .load_group_vaults(&fetcher, members, progress_tx, cancel)
                    .await;
                let outcome = LoadOutcome::Vaults(result);
                let _ = sender.send(TuiEvent::Loaded { token, outcome }).await;
            });
        }
        LoadRequest::Secrets { token, vault_name } => {
            tokio::spawn(async move {
                let outcome = LoadOutcome::Secrets(fetcher.secrets(&vault_name).await);
                let _ = sender.send(TuiEvent::Loaded { token, outcome }).await;
            });
        }
        LoadRequest::SecretValue {
            token,
            vault_name,
            secret_name,
        } => {
            tokio::spawn(async move {
                let outcome =
                    LoadOutcome::SecretValue(fetcher.secret_value(&vault_name, &secret_name).await);
                let _ = sender.send(TuiEvent::Loaded { token, outcome }).await;
            });
        }
    }
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Cache => "(cached)",
        Origin::Remote => "(fetched)",
    }
}

fn status_for(outcome: &LoadOutcome) -> Option<String> {
    match outcome {
        LoadOutcome::Accounts(Ok(f)) => {
            Some(format!("{} accounts {}", f.value.len(), origin_label(f.origin)))
        }
        LoadOutcome::Subscriptions(Ok(f)) => Some(format!(
            "{} subscriptions {}",
            f.value.len(),
            origin_label(f.origin)
        )),
        LoadOutcome::Vaults(Ok(f)) => {
            Some(format!("{} vaults {}", f.value.len(), origin_label(f.origin)))
        }
        LoadOutcome::Secrets(Ok(f)) => {
            Some(format!("{} secrets {}", f.value.len(), origin_label(f.origin)))
        }
        LoadOutcome::SecretValue(Ok(f)) => Some(format!("value {}", origin_label(f.origin))),
        _ => None,
    }
}

fn error_of(outcome: &LoadOutcome) -> Option<String> {
    match outcome {
        LoadOutcome::Accounts(Err(e))
        | LoadOutcome::Vaults(Err(e))
        | LoadOutcome::Secrets(Err(e)) => Some(e.to_string()),
        LoadOutcome::Subscriptions(Err(e)) => Some(e.to_string()),
        LoadOutcome::SecretValue(Err(e)) => Some(e.to_string()),
        _ => None,
    }
}

/// Returns true when the app should exit.
fn handle_event(
    app: &mut App,
    source: &Arc<ArmSource>,
    event: TuiEvent,
    sender: &mpsc::Sender<TuiEvent>,
) -> bool {
    match event {
        TuiEvent::Input(key) => {
            if app.modal.is_some() {
                handle_modal_input(app, key, sender);
                return false;
            }
            if let Some(action) = map_key(key) {
                return handle_action(app, source, action, sender);
            }
        }
        TuiEvent::Loaded { token, outcome } => {
            let fresh = token.generation == app.browser.generation(token.target);
            let status = status_for(&outcome);
            let error = error_of(&outcome);
            let follow_ups = app.browser.apply(token, outcome);
            if fresh {
                if let Some(status) = status {
                    app.set_status(status);
                }
                if let Some(message) = error {
                    app.notify(NotificationLevel::Error, message);
                }
            }
            for request in follow_ups {
                app.suppress_indicator_if_cached(&request);
                dispatch(app, source, request, sender);
            }
        }
        TuiEvent::Progress(progress) => {
            app.apply_progress(progress);
        }
        TuiEvent::Mutated {
            kind,
            vault_name,
            secret_name,
            result,
        } => {
            app.mutation_in_flight = false;
            match result {
                Ok(()) => {
                    let verb = match kind {
                        MutationKind::Set => "saved",
                        MutationKind::Delete => "deleted",
                    };
                    app.notify(
                        NotificationLevel::Success,
                        format!("Secret '{}' {} in {}", secret_name, verb, vault_name),
                    );
                    // The mutation evicted the vault's cache entries;
                    // reload the listing from the source.
                    if let Some(request) = app.browser.reload(LoadTarget::Secrets) {
                        dispatch(app, source, request, sender);
                    }
                }
                Err(err) => {
                    app.notify(NotificationLevel::Error, err.to_string());
                }
            }
        }
        TuiEvent::Resize { .. } | TuiEvent::Tick => {}
    }
    false
}

fn handle_action(
    app: &mut App,
    source: &Arc<ArmSource>,
    action: Action,
    sender: &mpsc::Sender<TuiEvent>,
) -> bool {
    match action {
        Action::Quit => return true,
        Action::MoveLeft => app.focus_left(),
        Action::MoveRight => app.focus_right(),
        Action::MoveUp => app.cursor_up(),
        Action::MoveDown => app.cursor_down(),
        Action::Confirm | Action::Select => {
            if let Some(request) = app.activate() {
                dispatch(app, source, request, sender);
            }
        }
        Action::Refresh => {
            if let Some(request) = app.refresh_focused() {
                dispatch(app, source, request, sender);
            }
        }
        Action::HardRefresh => {
            let request = app.hard_refresh();
            dispatch(app, source, request, sender);
        }
        Action::NewSecret => app.open_create_editor(),
        Action::EditSecret => app.open_edit_editor(),
        Action::DeleteSecret => app.open_delete_confirm(),
        Action::RevealValue => app.toggle_reveal(),
        Action::CopyValue => app.yank_value(),
        Action::CancelBulk => app.cancel_bulk(),
        Action::OpenHelp => app.modal = Some(Modal::Help),
        Action::Cancel => {}
    }
    false
}

fn handle_modal_input(
    app: &mut App,
    key: crossterm::event::KeyEvent,
    sender: &mpsc::Sender<TuiEvent>,
) {
    use crossterm::event::{KeyCode, KeyModifiers};

    enum ModalKind {
        Editor,
        ConfirmDelete,
        Help,
    }

    let kind = match &app.modal {
        Some(Modal::Editor(_)) => ModalKind::Editor,
        Some(Modal::ConfirmDelete { .. }) => ModalKind::ConfirmDelete,
        Some(Modal::Help) => ModalKind::Help,
        None => return,
    };

    match kind {
        ModalKind::Editor => match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => app.close_modal(),
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => submit_editor(app, sender),
            _ => {
                if let Some(Modal::Editor(editor)) = app.modal.as_mut() {
                    if key.code == KeyCode::Tab {
                        editor.toggle_field();
                    } else {
                        editor.active_textarea_mut().input(key);
                    }
                }
            }
        },
        ModalKind::ConfirmDelete => match key.code {
            KeyCode::Enter => submit_delete(app, sender),
            KeyCode::Esc => app.close_modal(),
            _ => {}
        },
        ModalKind::Help => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                app.close_modal();
            }
        }
    }
}

fn submit_editor(app: &mut App, sender: &mpsc::Sender<TuiEvent>) {
    let Some(Modal::Editor(editor)) = app.modal.take() else {
        return;
    };
    let secret_name = editor.secret_name().trim().to_string();
    if secret_name.is_empty() {
        app.notify(NotificationLevel::Warning, "Secret name is required");
        app.modal = Some(Modal::Editor(editor));
        return;
    }
    let vault_name = editor.vault_name.clone();
    let value = SecretValue {
        value: editor.secret_value(),
        content_type: None,
    };

    app.mutation_in_flight = true;
    let fetcher = app.fetcher.clone();
    let sender = sender.clone();
    tokio::spawn(async move {
        let result = fetcher.set_secret(&vault_name, &secret_name, &value).await;
        let _ = sender
            .send(TuiEvent::Mutated {
                kind: MutationKind::Set,
                vault_name,
                secret_name,
                result,
            })
            .await;
    });
}

fn submit_delete(app: &mut App, sender: &mpsc::Sender<TuiEvent>) {
    let Some(Modal::ConfirmDelete {
        vault_name,
        secret_name,
    }) = app.modal.take()
    else {
        return;
    };

    app.mutation_in_flight = true;
    let fetcher = app.fetcher.clone();
    let sender = sender.clone();
    tokio::spawn(async move {
        let result = fetcher.delete_secret(&vault_name, &secret_name).await;
        let _ = sender
            .send(TuiEvent::Mutated {
                kind: MutationKind::Delete,
                vault_name,
                secret_name,
                result,
            })
            .await;
    });
}
