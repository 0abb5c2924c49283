//! Cache key scheme.
//!
//! Keys are composed of a namespace segment plus identifier segments.
//! Prefix invalidation relies on these being literal string prefixes: a
//! vault's secret listing and all of its per-secret value entries can be
//! evicted together after a mutation.

use vaultscope_core::{SubscriptionId, TenantId};

pub fn accounts() -> String {
    "accounts".to_string()
}

pub fn subscriptions(tenant_id: TenantId) -> String {
    format!("subscriptions:{}", tenant_id)
}

pub fn vaults(subscription_id: SubscriptionId) -> String {
    format!("vaults:{}", subscription_id)
}

pub fn secrets(vault_name: &str) -> String {
    format!("secrets:{}", vault_name)
}

pub fn secret_value(vault_name: &str, secret_name: &str) -> String {
    format!("secretvalue:{}:{}", vault_name, secret_name)
}

/// Prefix shared by every secret value entry of one vault.
pub fn secret_value_prefix(vault_name: &str) -> String {
    format!("secretvalue:{}:", vault_name)
}
