//! Application state and modal definitions.

use crate::config::TuiConfig;
use crate::notifications::{Notification, NotificationLevel};
use crate::orchestrator::{Browser, LoadPhase, LoadRequest, LoadTarget, RestorePath};
use crate::theme::Theme;
use tui_textarea::TextArea;
use vaultscope_cache::{keys, CancelFlag, ProgressEvent, SecretFetcher};

/// Which browser pane has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Accounts,
    Subscriptions,
    Vaults,
    Secrets,
}

impl Focus {
    pub fn right(self) -> Focus {
        match self {
            Focus::Accounts => Focus::Subscriptions,
            Focus::Subscriptions => Focus::Vaults,
            Focus::Vaults => Focus::Secrets,
            Focus::Secrets => Focus::Secrets,
        }
    }

    pub fn left(self) -> Focus {
        match self {
            Focus::Accounts => Focus::Accounts,
            Focus::Subscriptions => Focus::Accounts,
            Focus::Vaults => Focus::Subscriptions,
            Focus::Secrets => Focus::Vaults,
        }
    }
}

/// Which field of the editor modal is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Name,
    Value,
}

/// Secret create/edit modal backed by two text areas.
pub struct EditorModal {
    pub vault_name: String,
    pub name: TextArea<'static>,
    pub value: TextArea<'static>,
    pub field: EditorField,
    pub is_new: bool,
}

impl EditorModal {
    pub fn create(vault_name: impl Into<String>) -> Self {
        Self {
            vault_name: vault_name.into(),
            name: TextArea::default(),
            value: TextArea::default(),
            field: EditorField::Name,
            is_new: true,
        }
    }

    pub fn edit(
        vault_name: impl Into<String>,
        secret_name: &str,
        current_value: &str,
    ) -> Self {
        Self {
            vault_name: vault_name.into(),
            name: TextArea::new(vec![secret_name.to_string()]),
            value: TextArea::new(current_value.lines().map(String::from).collect()),
            field: EditorField::Value,
            is_new: false,
        }
    }

    /// The secret name is single-line; joining guards against pasted
    /// newlines.
    pub fn secret_name(&self) -> String {
        self.name.lines().join("")
    }

    pub fn secret_value(&self) -> String {
        self.value.lines().join("\n")
    }

    pub fn toggle_field(&mut self) {
        // Existing secrets cannot be renamed; the name field stays locked.
        if self.is_new {
            self.field = match self.field {
                EditorField::Name => EditorField::Value,
                EditorField::Value => EditorField::Name,
            };
        }
    }

    pub fn active_textarea_mut(&mut self) -> &mut TextArea<'static> {
        match self.field {
            EditorField::Name => &mut self.name,
            EditorField::Value => &mut self.value,
        }
    }
}

pub enum Modal {
    Editor(EditorModal),
    ConfirmDelete {
        vault_name: String,
        secret_name: String,
    },
    Help,
}

/// Progress of the bulk warmer currently on screen, if any.
#[derive(Debug, Clone)]
pub struct BulkProgress {
    pub completed: usize,
    pub total: usize,
    pub current: String,
    pub cancel: CancelFlag,
}

impl BulkProgress {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

pub struct App {
    pub config: TuiConfig,
    pub theme: Theme,
    pub fetcher: SecretFetcher,
    pub browser: Browser,
    pub focus: Focus,
    pub reveal_value: bool,
    /// Internal copy buffer filled by the yank binding.
    pub clipboard: Option<String>,
    pub modal: Option<Modal>,
    pub notifications: Vec<Notification>,
    pub bulk: Option<BulkProgress>,
    /// Right-hand status text, e.g. "12 secrets (cached)".
    pub status: String,
    pub mutation_in_flight: bool,
}

impl App {
    pub fn new(config: TuiConfig, fetcher: SecretFetcher, restore: RestorePath) -> Self {
        Self {
            config,
            theme: Theme::default(),
            fetcher,
            browser: Browser::with_restore(restore),
            focus: Focus::Accounts,
            reveal_value: false,
            clipboard: None,
            modal: None,
            notifications: Vec::new(),
            bulk: None,
            status: String::new(),
            mutation_in_flight: false,
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    pub fn focus_left(&mut self) {
        self.focus = self.focus.left();
    }

    pub fn focus_right(&mut self) {
        self.focus = self.focus.right();
    }

    pub fn cursor_down(&mut self) {
        match self.focus {
            Focus::Accounts => self.browser.accounts.cursor_next(),
            Focus::Subscriptions => self.browser.subscriptions.cursor_next(),
            Focus::Vaults => self.browser.vaults.cursor_next(),
            Focus::Secrets => self.browser.secrets.cursor_next(),
        }
    }

    pub fn cursor_up(&mut self) {
        match self.focus {
            Focus::Accounts => self.browser.accounts.cursor_previous(),
            Focus::Subscriptions => self.browser.subscriptions.cursor_previous(),
            Focus::Vaults => self.browser.vaults.cursor_previous(),
            Focus::Secrets => self.browser.secrets.cursor_previous(),
        }
    }

    /// Confirm the focused pane's cursor as the selection and produce the
    /// downstream load, with the loading indicator suppressed when the
    /// answer is already cached.
    pub fn activate(&mut self) -> Option<LoadRequest> {
        let request = match self.focus {
            Focus::Accounts => {
                let index = self.browser.accounts.selected?;
                self.browser.select_account(index)
            }
            Focus::Subscriptions => {
                let index = self.browser.subscriptions.selected?;
                self.browser.select_subscription(index)
            }
            Focus::Vaults => {
                let index = self.browser.vaults.selected?;
                self.browser.select_vault(index)
            }
            Focus::Secrets => {
                let index = self.browser.secrets.selected?;
                self.browser.select_secret(index)
            }
        }?;
        self.suppress_indicator_if_cached(&request);
        Some(request)
    }

    /// Invalidate the focused pane's cache entry and reload it.
    pub fn refresh_focused(&mut self) -> Option<LoadRequest> {
        let target = match self.focus {
            Focus::Accounts => {
                self.fetcher.cache().invalidate(&keys::accounts());
                LoadTarget::Accounts
            }
            Focus::Subscriptions => {
                if let Some(tenant_id) = self.browser.active_tenant() {
                    self.fetcher.cache().invalidate(&keys::subscriptions(tenant_id));
                }
                LoadTarget::Subscriptions
            }
            Focus::Vaults => {
                if let Some(group) = self.browser.subscriptions.selected_item() {
                    for member in &group.members {
                        self.fetcher.invalidate_subscription(member.subscription_id);
                    }
                }
                LoadTarget::Vaults
            }
            Focus::Secrets => {
                if let Some(vault) = self.browser.vaults.selected_item() {
                    let name = vault.name.clone();
                    self.fetcher.invalidate_vault(&name);
                }
                LoadTarget::Secrets
            }
        };
        self.browser.reload(target)
    }

    /// Full refresh: drop the whole cache and restart the cascade.
    pub fn hard_refresh(&mut self) -> LoadRequest {
        self.fetcher.clear();
        self.browser.start()
    }

    /// Turn off the loading spinner for a request whose answer is already
    /// in cache; the response will land on the next event-loop pass.
    pub fn suppress_indicator_if_cached(&mut self, request: &LoadRequest) {
        let cached = match request {
            LoadRequest::Accounts { .. } => self.fetcher.accounts_cached(),
            LoadRequest::Subscriptions { tenant_id, .. } => {
                self.fetcher.subscriptions_cached(*tenant_id)
            }
            LoadRequest::Vaults {
                subscription_id, ..
            } => self.fetcher.vaults_cached(*subscription_id),
            LoadRequest::VaultsForGroup { members, .. } => members
                .iter()
                .all(|id| self.fetcher.vaults_cached(*id)),
            LoadRequest::Secrets { vault_name, .. } => self.fetcher.secrets_cached(vault_name),
            LoadRequest::SecretValue {
                vault_name,
                secret_name,
                ..
            } => self.fetcher.secret_value_cached(vault_name, secret_name),
        };
        if !cached {
            return;
        }
        match request.token().target {
            LoadTarget::Accounts => self.browser.accounts.show_indicator = false,
            LoadTarget::Subscriptions => self.browser.subscriptions.show_indicator = false,
            LoadTarget::Vaults => self.browser.vaults.show_indicator = false,
            LoadTarget::Secrets => self.browser.secrets.show_indicator = false,
            LoadTarget::Value => {}
        }
    }

    pub fn apply_progress(&mut self, event: ProgressEvent) {
        if let Some(error) = &event.error {
            self.notify(
                NotificationLevel::Warning,
                format!("{}: {}", event.current, error),
            );
        }
        if let Some(bulk) = &mut self.bulk {
            bulk.completed = event.completed;
            bulk.total = event.total;
            bulk.current = event.current;
        }
    }

    pub fn cancel_bulk(&mut self) {
        // A cancelled run skips its pending items without reporting them,
        // so `completed` never reaches `total`; drop the gauge here instead
        // of waiting for a final event that will not come.
        if let Some(bulk) = self.bulk.take() {
            bulk.cancel.cancel();
            self.notify(NotificationLevel::Info, "Bulk load cancelled");
        }
    }

    /// The value panel text, redacted unless reveal is on.
    pub fn value_display(&self) -> Option<String> {
        let value = self.browser.value.value.as_ref()?;
        if self.reveal_value {
            Some(value.value.clone())
        } else {
            Some("\u{2022}".repeat(value.value.chars().count().min(32)))
        }
    }

    pub fn toggle_reveal(&mut self) {
        self.reveal_value = !self.reveal_value;
    }

    pub fn yank_value(&mut self) {
        if let Some(value) = self.browser.value.value.as_ref() {
            self.clipboard = Some(value.value.clone());
            self.notify(NotificationLevel::Success, "Value copied");
        }
    }

    /// Open the editor for a brand-new secret in the selected vault.
    pub fn open_create_editor(&mut self) {
        if self.mutation_in_flight {
            return;
        }
        if let Some(vault) = self.browser.vaults.selected_item() {
            self.modal = Some(Modal::Editor(EditorModal::create(vault.name.clone())));
        } else {
            self.notify(NotificationLevel::Warning, "Select a vault first");
        }
    }

    /// Open the editor prefilled with the selected secret. Requires the
    /// value to be loaded; editing a value we have not seen would clobber
    /// it with an empty body.
    pub fn open_edit_editor(&mut self) {
        if self.mutation_in_flight {
            return;
        }
        let Some(secret) = self.browser.secrets.selected_item() else {
            self.notify(NotificationLevel::Warning, "Select a secret first");
            return;
        };
        let loaded = self.browser.value.phase == LoadPhase::Loaded
            && self.browser.value.secret_name.as_deref() == Some(secret.name.as_str());
        let Some(value) = self.browser.value.value.as_ref().filter(|_| loaded) else {
            self.notify(NotificationLevel::Warning, "Value still loading");
            return;
        };
        self.modal = Some(Modal::Editor(EditorModal::edit(
            secret.vault_name.clone(),
            &secret.name,
            &value.value,
        )));
    }

    pub fn open_delete_confirm(&mut self) {
        if self.mutation_in_flight {
            return;
        }
        if let Some(secret) = self.browser.secrets.selected_item() {
            self.modal = Some(Modal::ConfirmDelete {
                vault_name: secret.vault_name.clone(),
                secret_name: secret.name.clone(),
            });
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }
}

// ============================================================================
// TESTS
// ============================================================================
