//! Selection-guarded cascading loader.
//!
//! The [`Browser`] owns the four selection panes and a generation counter
//! per load target. Selecting an item clears every deeper pane, bumps the
//! deeper generations, and emits a [`LoadRequest`] for the event loop to
//! run asynchronously. When the result comes back, [`Browser::apply`]
//! compares the [`LoadToken`] captured at dispatch against the current
//! generation and silently discards anything stale, so a slow fetch for a
//! superseded selection can never overwrite the current view.
//!
//! The orchestrator performs no IO itself. Requests out, outcomes in; the
//! event loop owns every spawn and channel.

use vaultscope_cache::Fetched;
use vaultscope_core::naming::SubscriptionGroup;
use vaultscope_core::{
    Account, FetchError, FetchResult, SecretMeta, SecretValue, SubscriptionId, TenantId, Vault,
};

/// The five things an async load can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Accounts,
    Subscriptions,
    Vaults,
    Secrets,
    Value,
}

const TARGET_COUNT: usize = 5;

impl LoadTarget {
    fn index(self) -> usize {
        match self {
            LoadTarget::Accounts => 0,
            LoadTarget::Subscriptions => 1,
            LoadTarget::Vaults => 2,
            LoadTarget::Secrets => 3,
            LoadTarget::Value => 4,
        }
    }
}

/// Staleness marker captured when a load is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken {
    pub target: LoadTarget,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// One selection pane: its items, cursor, and load phase.
#[derive(Debug, Clone)]
pub struct PaneState<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
    pub phase: LoadPhase,
    /// Whether a spinner should be drawn while `phase` is `Loading`.
    /// Suppressed when the answer is already cached, to avoid flicker.
    pub show_indicator: bool,
}

impl<T> Default for PaneState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            phase: LoadPhase::Idle,
            show_indicator: false,
        }
    }
}

impl<T> PaneState<T> {
    pub fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|index| self.items.get(index))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Move the cursor down without dispatching anything.
    pub fn cursor_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let next = match self.selected {
            Some(index) if index + 1 < self.items.len() => index + 1,
            Some(index) => index,
            None => 0,
        };
        self.selected = Some(next);
    }

    /// Move the cursor up without dispatching anything.
    pub fn cursor_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let previous = match self.selected {
            Some(index) if index > 0 => index - 1,
            Some(index) => index,
            None => 0,
        };
        self.selected = Some(previous);
    }

    fn reset(&mut self) {
        self.items.clear();
        self.selected = None;
        self.phase = LoadPhase::Idle;
        self.show_indicator = false;
    }

    fn begin_loading(&mut self) {
        self.phase = LoadPhase::Loading;
        self.show_indicator = true;
    }

    fn finish(&mut self, items: Vec<T>) {
        self.items = items;
        self.phase = LoadPhase::Loaded;
        self.show_indicator = false;
    }

    fn fail(&mut self, err: &FetchError) {
        self.phase = LoadPhase::Failed(err.to_string());
        self.show_indicator = false;
    }
}

/// The secret-value panel. Not a list pane; holds at most one value.
#[derive(Debug, Clone, Default)]
pub struct ValueState {
    pub secret_name: Option<String>,
    pub value: Option<SecretValue>,
    pub phase: LoadPhase,
}

impl ValueState {
    fn reset(&mut self) {
        self.secret_name = None;
        self.value = None;
        self.phase = LoadPhase::Idle;
    }
}

/// Persisted selection indices, consumed once per level during the first
/// auto-cascade. An index that is out of bounds for the freshly loaded
/// list falls back to the first item.
#[derive(Debug, Clone, Default)]
pub struct RestorePath {
    pub account: Option<usize>,
    pub subscription: Option<usize>,
    pub vault: Option<usize>,
    pub secret: Option<usize>,
}

/// A load the event loop must execute.
#[derive(Debug, Clone)]
pub enum LoadRequest {
    Accounts {
        token: LoadToken,
    },
    Subscriptions {
        token: LoadToken,
        tenant_id: TenantId,
    },
    Vaults {
        token: LoadToken,
        subscription_id: SubscriptionId,
    },
    /// Group node: warm every member through the bulk loader, merge the
    /// vault lists, and deliver one `Vaults` outcome for the whole group.
    VaultsForGroup {
        token: LoadToken,
        members: Vec<SubscriptionId>,
    },
    Secrets {
        token: LoadToken,
        vault_name: String,
    },
    SecretValue {
        token: LoadToken,
        vault_name: String,
        secret_name: String,
    },
}

impl LoadRequest {
    pub fn token(&self) -> LoadToken {
        match self {
            LoadRequest::Accounts { token }
            | LoadRequest::Subscriptions { token, .. }
            | LoadRequest::Vaults { token, .. }
            | LoadRequest::VaultsForGroup { token, .. }
            | LoadRequest::Secrets { token, .. }
            | LoadRequest::SecretValue { token, .. } => *token,
        }
    }
}

/// The result of executing a [`LoadRequest`].
#[derive(Debug)]
pub enum LoadOutcome {
    Accounts(FetchResult<Fetched<Vec<Account>>>),
    Subscriptions(FetchResult<Fetched<Vec<SubscriptionGroup>>>),
    Vaults(FetchResult<Fetched<Vec<Vault>>>),
    Secrets(FetchResult<Fetched<Vec<SecretMeta>>>),
    SecretValue(FetchResult<Fetched<SecretValue>>),
}

/// The cascading selection state machine.
#[derive(Debug, Default)]
pub struct Browser {
    pub accounts: PaneState<Account>,
    pub subscriptions: PaneState<SubscriptionGroup>,
    pub vaults: PaneState<Vault>,
    pub secrets: PaneState<SecretMeta>,
    pub value: ValueState,
    generations: [u64; TARGET_COUNT],
    restore: RestorePath,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_restore(restore: RestorePath) -> Self {
        Self {
            restore,
            ..Self::default()
        }
    }

    pub fn generation(&self, target: LoadTarget) -> u64 {
        self.generations[target.index()]
    }

    fn token_for(&self, target: LoadTarget) -> LoadToken {
        LoadToken {
            target,
            generation: self.generations[target.index()],
        }
    }

    /// Clear every pane deeper than `target` and bump their generations so
    /// in-flight loads for those levels are discarded on arrival.
    fn clear_below(&mut self, target: LoadTarget) {
        let from = target.index() + 1;
        for generation in self.generations.iter_mut().skip(from) {
            *generation += 1;
        }
        if from <= LoadTarget::Subscriptions.index() {
            self.subscriptions.reset();
        }
        if from <= LoadTarget::Vaults.index() {
            self.vaults.reset();
        }
        if from <= LoadTarget::Secrets.index() {
            self.secrets.reset();
        }
        if from <= LoadTarget::Value.index() {
            self.value.reset();
        }
    }

    /// Begin (or restart) the cascade from the top. Clears everything.
    pub fn start(&mut self) -> LoadRequest {
        self.generations[LoadTarget::Accounts.index()] += 1;
        self.accounts.reset();
        self.clear_below(LoadTarget::Accounts);
        self.accounts.begin_loading();
        LoadRequest::Accounts {
            token: self.token_for(LoadTarget::Accounts),
        }
    }

    /// Select an account; returns the subscription load for its tenant.
    pub fn select_account(&mut self, index: usize) -> Option<LoadRequest> {
        let tenant_id = self.accounts.items.get(index)?.tenant_id;
        self.accounts.selected = Some(index);
        self.clear_below(LoadTarget::Accounts);
        self.subscriptions.begin_loading();
        Some(LoadRequest::Subscriptions {
            token: self.token_for(LoadTarget::Subscriptions),
            tenant_id,
        })
    }

    /// Select a subscription entry. A single-member group loads directly;
    /// a multi-member group fans out across every member.
    pub fn select_subscription(&mut self, index: usize) -> Option<LoadRequest> {
        let group = self.subscriptions.items.get(index)?;
        let members: Vec<SubscriptionId> = group
            .members
            .iter()
            .map(|sub| sub.subscription_id)
            .collect();
        let single = group.is_single();

        self.subscriptions.selected = Some(index);
        self.clear_below(LoadTarget::Subscriptions);
        self.vaults.begin_loading();
        let token = self.token_for(LoadTarget::Vaults);

        Some(if single {
            LoadRequest::Vaults {
                token,
                subscription_id: members[0],
            }
        } else {
            LoadRequest::VaultsForGroup { token, members }
        })
    }

    pub fn select_vault(&mut self, index: usize) -> Option<LoadRequest> {
        let vault_name = self.vaults.items.get(index)?.name.clone();
        self.vaults.selected = Some(index);
        self.clear_below(LoadTarget::Vaults);
        self.secrets.begin_loading();
        Some(LoadRequest::Secrets {
            token: self.token_for(LoadTarget::Secrets),
            vault_name,
        })
    }

    pub fn select_secret(&mut self, index: usize) -> Option<LoadRequest> {
        let secret = self.secrets.items.get(index)?;
        let vault_name = secret.vault_name.clone();
        let secret_name = secret.name.clone();
        self.secrets.selected = Some(index);
        self.clear_below(LoadTarget::Secrets);
        self.value.secret_name = Some(secret_name.clone());
        self.value.phase = LoadPhase::Loading;
        Some(LoadRequest::SecretValue {
            token: self.token_for(LoadTarget::Value),
            vault_name,
            secret_name,
        })
    }

    /// Re-dispatch the load that fills the given pane, keeping the current
    /// upstream selection. Used after a cache invalidation.
    pub fn reload(&mut self, target: LoadTarget) -> Option<LoadRequest> {
        match target {
            LoadTarget::Accounts => Some(self.start()),
            LoadTarget::Subscriptions => self.accounts.selected.and_then(|i| self.select_account(i)),
            LoadTarget::Vaults => self
                .subscriptions
                .selected
                .and_then(|i| self.select_subscription(i)),
            LoadTarget::Secrets => self.vaults.selected.and_then(|i| self.select_vault(i)),
            LoadTarget::Value => self.secrets.selected.and_then(|i| self.select_secret(i)),
        }
    }

    /// Pop the persisted index for a level, falling back to the first item
    /// when absent or out of bounds.
    fn restore_index(&mut self, target: LoadTarget, len: usize) -> usize {
        let slot = match target {
            LoadTarget::Accounts => &mut self.restore.account,
            LoadTarget::Subscriptions => &mut self.restore.subscription,
            LoadTarget::Vaults => &mut self.restore.vault,
            LoadTarget::Secrets => &mut self.restore.secret,
            LoadTarget::Value => return 0,
        };
        match slot.take() {
            Some(index) if index < len => index,
            _ => 0,
        }
    }

    /// Apply an async load result. The staleness guard: a token whose
    /// generation no longer matches the level's current generation belongs
    /// to a superseded selection and is dropped without touching state.
    /// Returns follow-up requests produced by the auto-cascade.
    pub fn apply(&mut self, token: LoadToken, outcome: LoadOutcome) -> Vec<LoadRequest> {
        if token.generation != self.generations[token.target.index()] {
            return Vec::new();
        }
        match (token.target, outcome) {
            (LoadTarget::Accounts, LoadOutcome::Accounts(result)) => match result {
                Ok(fetched) => {
                    self.accounts.finish(fetched.value);
                    let index = self.restore_index(LoadTarget::Accounts, self.accounts.len());
                    self.select_account(index).into_iter().collect()
                }
                Err(err) => {
                    self.accounts.fail(&err);
                    Vec::new()
                }
            },
            (LoadTarget::Subscriptions, LoadOutcome::Subscriptions(result)) => match result {
                Ok(fetched) => {
                    self.subscriptions.finish(fetched.value);
                    let index =
                        self.restore_index(LoadTarget::Subscriptions, self.subscriptions.len());
                    self.select_subscription(index).into_iter().collect()
                }
                Err(err) => {
                    self.subscriptions.fail(&err);
                    Vec::new()
                }
            },
            (LoadTarget::Vaults, LoadOutcome::Vaults(result)) => match result {
                Ok(fetched) => {
                    self.vaults.finish(fetched.value);
                    let index = self.restore_index(LoadTarget::Vaults, self.vaults.len());
                    self.select_vault(index).into_iter().collect()
                }
                Err(err) => {
                    self.vaults.fail(&err);
                    Vec::new()
                }
            },
            (LoadTarget::Secrets, LoadOutcome::Secrets(result)) => match result {
                Ok(fetched) => {
                    self.secrets.finish(fetched.value);
                    let index = self.restore_index(LoadTarget::Secrets, self.secrets.len());
                    self.select_secret(index).into_iter().collect()
                }
                Err(err) => {
                    self.secrets.fail(&err);
                    Vec::new()
                }
            },
            (LoadTarget::Value, LoadOutcome::SecretValue(result)) => match result {
                Ok(fetched) => {
                    self.value.value = Some(fetched.value);
                    self.value.phase = LoadPhase::Loaded;
                    Vec::new()
                }
                Err(err) => {
                    self.value.phase = LoadPhase::Failed(err.to_string());
                    Vec::new()
                }
            },
            // Token and payload disagree on the target; nothing safe to do.
            _ => Vec::new(),
        }
    }

    /// The tenant of the currently selected account, if any.
    pub fn active_tenant(&self) -> Option<TenantId> {
        self.accounts.selected_item().map(|account| account.tenant_id)
    }

    /// Selection indices for persistence on exit.
    pub fn selection_path(&self) -> RestorePath {
        RestorePath {
            account: self.accounts.selected,
            subscription: self.subscriptions.selected,
            vault: self.vaults.selected,
            secret: self.secrets.selected,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vaultscope_core::{FetchErrorKind, Subscription, SubscriptionState};

    fn tenant(n: u128) -> TenantId {
        TenantId::new(Uuid::from_u128(n))
    }

    fn sub_id(n: u128) -> SubscriptionId {
        SubscriptionId::new(Uuid::from_u128(n))
    }

    fn account(name: &str, tenant_n: u128) -> Account {
        Account {
            name: name.to_string(),
            tenant_id: tenant(tenant_n),
            is_default: false,
        }
    }

    fn subscription(name: &str, id_n: u128) -> Subscription {
        Subscription {
            subscription_id: sub_id(id_n),
            name: name.to_string(),
            tenant_id: tenant(1),
            state: SubscriptionState::Enabled,
        }
    }

    fn single_group(name: &str, id_n: u128) -> SubscriptionGroup {
        SubscriptionGroup {
            base: name.to_string(),
            members: vec![subscription(name, id_n)],
        }
    }

    fn vault(name: &str, sub_n: u128) -> Vault {
        Vault {
            name: name.to_string(),
            subscription_id: sub_id(sub_n),
            uri: format!("https://{}.vault.example.net", name),
            location: "westeurope".to_string(),
        }
    }

    fn secret(name: &str, vault_name: &str) -> SecretMeta {
        SecretMeta {
            name: name.to_string(),
            vault_name: vault_name.to_string(),
            enabled: true,
            updated_at: None,
        }
    }

    fn ok<T>(value: T) -> FetchResult<Fetched<T>> {
        Ok(Fetched::from_remote(value))
    }

    /// Walk a fresh browser down to a loaded vault list with two
    /// subscription entries, returning the pending secrets request.
    fn browser_at_vaults() -> (Browser, LoadRequest) {
        let mut browser = Browser::new();
        let req = browser.start();

        let mut pending = browser.apply(
            req.token(),
            LoadOutcome::Accounts(ok(vec![account("work", 1)])),
        );
        let req = pending.remove(0);

        let mut pending = browser.apply(
            req.token(),
            LoadOutcome::Subscriptions(ok(vec![
                single_group("alpha", 10),
                single_group("beta", 11),
            ])),
        );
        let req = pending.remove(0);

        let mut pending = browser.apply(
            req.token(),
            LoadOutcome::Vaults(ok(vec![vault("alpha-kv", 10)])),
        );
        (browser, pending.remove(0))
    }

    #[test]
    fn test_start_emits_accounts_request() {
        let mut browser = Browser::new();
        let req = browser.start();
        assert!(matches!(req, LoadRequest::Accounts { .. }));
        assert_eq!(browser.accounts.phase, LoadPhase::Loading);
        assert!(browser.accounts.show_indicator);
    }

    #[test]
    fn test_auto_cascade_selects_first_item_per_level() {
        let (browser, req) = browser_at_vaults();
        assert_eq!(browser.accounts.selected, Some(0));
        assert_eq!(browser.subscriptions.selected, Some(0));
        assert_eq!(browser.vaults.selected, Some(0));
        assert_eq!(browser.secrets.phase, LoadPhase::Loading);
        match req {
            LoadRequest::Secrets { vault_name, .. } => assert_eq!(vault_name, "alpha-kv"),
            other => panic!("expected secrets request, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_result_does_not_overwrite_newer_selection() {
        let (mut browser, _secrets_req) = browser_at_vaults();

        // Dispatch vaults for subscription A, then switch to B before it
        // resolves.
        let stale_req = browser.select_subscription(0).unwrap();
        let fresh_req = browser.select_subscription(1).unwrap();

        let pending = browser.apply(
            stale_req.token(),
            LoadOutcome::Vaults(ok(vec![vault("alpha-kv", 10)])),
        );
        assert!(pending.is_empty());
        assert!(browser.vaults.is_empty());
        assert_eq!(browser.vaults.phase, LoadPhase::Loading);

        // The fresh result still lands.
        let _ = browser.apply(
            fresh_req.token(),
            LoadOutcome::Vaults(ok(vec![vault("beta-kv", 11)])),
        );
        assert_eq!(browser.vaults.items[0].name, "beta-kv");
        assert_eq!(browser.vaults.phase, LoadPhase::Loaded);
    }

    #[test]
    fn test_upstream_selection_clears_deeper_levels() {
        let (mut browser, secrets_req) = browser_at_vaults();
        let _ = browser.apply(
            secrets_req.token(),
            LoadOutcome::Secrets(ok(vec![secret("db-password", "alpha-kv")])),
        );
        assert!(!browser.secrets.is_empty());

        browser.select_account(0).unwrap();

        assert!(browser.subscriptions.is_empty());
        assert!(browser.vaults.is_empty());
        assert!(browser.secrets.is_empty());
        assert_eq!(browser.vaults.phase, LoadPhase::Idle);
        assert_eq!(browser.secrets.phase, LoadPhase::Idle);
        assert!(browser.value.value.is_none());
        assert_eq!(browser.subscriptions.phase, LoadPhase::Loading);
    }

    #[test]
    fn test_in_flight_deep_load_dropped_after_upstream_change() {
        let (mut browser, secrets_req) = browser_at_vaults();

        // Upstream change while the secrets load is in flight.
        browser.select_account(0).unwrap();

        let pending = browser.apply(
            secrets_req.token(),
            LoadOutcome::Secrets(ok(vec![secret("db-password", "alpha-kv")])),
        );
        assert!(pending.is_empty());
        assert!(browser.secrets.is_empty());
    }

    #[test]
    fn test_restore_index_used_when_in_bounds() {
        let mut browser = Browser::with_restore(RestorePath {
            subscription: Some(1),
            ..RestorePath::default()
        });
        let req = browser.start();
        let mut pending = browser.apply(
            req.token(),
            LoadOutcome::Accounts(ok(vec![account("work", 1)])),
        );
        let req = pending.remove(0);
        let _ = browser.apply(
            req.token(),
            LoadOutcome::Subscriptions(ok(vec![
                single_group("alpha", 10),
                single_group("beta", 11),
            ])),
        );
        assert_eq!(browser.subscriptions.selected, Some(1));
    }

    #[test]
    fn test_restore_index_out_of_bounds_falls_back_to_first() {
        let mut browser = Browser::with_restore(RestorePath {
            subscription: Some(5),
            ..RestorePath::default()
        });
        let req = browser.start();
        let mut pending = browser.apply(
            req.token(),
            LoadOutcome::Accounts(ok(vec![account("work", 1)])),
        );
        let req = pending.remove(0);
        let _ = browser.apply(
            req.token(),
            LoadOutcome::Subscriptions(ok(vec![single_group("alpha", 10)])),
        );
        assert_eq!(browser.subscriptions.selected, Some(0));
    }

    #[test]
    fn test_group_selection_fans_out_to_members() {
        let (mut browser, _req) = browser_at_vaults();
        browser.subscriptions.items = vec![SubscriptionGroup {
            base: "myapp".to_string(),
            members: vec![subscription("dev-myapp", 20), subscription("myapp-prd", 21)],
        }];

        let req = browser.select_subscription(0).unwrap();
        match req {
            LoadRequest::VaultsForGroup { members, .. } => {
                assert_eq!(members, vec![sub_id(20), sub_id(21)]);
            }
            other => panic!("expected group request, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_marks_level_without_touching_ancestors() {
        let (mut browser, secrets_req) = browser_at_vaults();
        let err = FetchError::new(FetchErrorKind::AccessDenied, "forbidden");

        let pending = browser.apply(secrets_req.token(), LoadOutcome::Secrets(Err(err)));

        assert!(pending.is_empty());
        assert!(matches!(browser.secrets.phase, LoadPhase::Failed(_)));
        assert_eq!(browser.vaults.phase, LoadPhase::Loaded);
        assert_eq!(browser.accounts.phase, LoadPhase::Loaded);
    }

    #[test]
    fn test_empty_listing_ends_cascade() {
        let (mut browser, secrets_req) = browser_at_vaults();
        let pending = browser.apply(secrets_req.token(), LoadOutcome::Secrets(ok(vec![])));
        assert!(pending.is_empty());
        assert_eq!(browser.secrets.phase, LoadPhase::Loaded);
        assert_eq!(browser.secrets.selected, None);
    }

    #[test]
    fn test_mismatched_outcome_variant_is_ignored() {
        let (mut browser, secrets_req) = browser_at_vaults();
        let pending = browser.apply(
            secrets_req.token(),
            LoadOutcome::Vaults(ok(vec![vault("rogue", 99)])),
        );
        assert!(pending.is_empty());
        assert!(browser.secrets.is_empty());
    }

    #[test]
    fn test_reload_keeps_upstream_selection() {
        let (mut browser, _req) = browser_at_vaults();
        let req = browser.reload(LoadTarget::Secrets).unwrap();
        match req {
            LoadRequest::Secrets { vault_name, .. } => assert_eq!(vault_name, "alpha-kv"),
            other => panic!("expected secrets request, got {:?}", other),
        }
        assert_eq!(browser.vaults.selected, Some(0));
    }

    #[test]
    fn test_cursor_movement_clamps_at_ends() {
        let mut pane: PaneState<Account> = PaneState::default();
        pane.items = vec![account("a", 1), account("b", 2)];
        pane.cursor_next();
        assert_eq!(pane.selected, Some(0));
        pane.cursor_next();
        pane.cursor_next();
        assert_eq!(pane.selected, Some(1));
        pane.cursor_previous();
        pane.cursor_previous();
        assert_eq!(pane.selected, Some(0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The cursor stays in bounds for any movement sequence.
            #[test]
            fn cursor_never_leaves_bounds(len in 0usize..8, steps in proptest::collection::vec(any::<bool>(), 0..32)) {
                let mut pane: PaneState<u32> = PaneState::default();
                pane.items = (0..len as u32).collect();
                for down in steps {
                    if down {
                        pane.cursor_next();
                    } else {
                        pane.cursor_previous();
                    }
                    match pane.selected {
                        Some(index) => prop_assert!(index < pane.items.len()),
                        None => prop_assert!(pane.items.is_empty()),
                    }
                }
            }

            /// A result whose generation does not match is never applied,
            /// whatever the generation gap.
            #[test]
            fn mismatched_generation_never_applied(offset in 1u64..64) {
                let mut browser = Browser::new();
                let req = browser.start();
                let stale = LoadToken {
                    target: LoadTarget::Accounts,
                    generation: req.token().generation + offset,
                };
                let pending = browser.apply(
                    stale,
                    LoadOutcome::Accounts(Ok(Fetched::from_remote(vec![account("work", 1)]))),
                );
                prop_assert!(pending.is_empty());
                prop_assert!(browser.accounts.is_empty());
                prop_assert_eq!(browser.accounts.phase.clone(), LoadPhase::Loading);
            }
        }
    }
}
