//! Remote collaborator seam.
//!
//! Everything the cache engine knows about the cloud is behind this trait:
//! the TUI wires in a REST-backed implementation, tests wire in mocks.

use async_trait::async_trait;
use vaultscope_core::{
    Account, FetchResult, SecretMeta, SecretValue, Subscription, SubscriptionId, TenantId, Vault,
};

#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Enumerate signed-in accounts.
    async fn list_accounts(&self) -> FetchResult<Vec<Account>>;

    /// Enumerate subscriptions visible in a tenant.
    async fn list_subscriptions(&self, tenant_id: TenantId) -> FetchResult<Vec<Subscription>>;

    /// Enumerate vaults within a subscription.
    async fn list_vaults(&self, subscription_id: SubscriptionId) -> FetchResult<Vec<Vault>>;

    /// Enumerate secret metadata within a vault. An empty vault returns an
    /// empty list; inaccessible vaults return an error, never an empty
    /// list.
    async fn list_secrets(&self, vault_name: &str) -> FetchResult<Vec<SecretMeta>>;

    /// Fetch one secret's current value.
    async fn get_secret_value(&self, vault_name: &str, secret_name: &str)
        -> FetchResult<SecretValue>;

    /// Create or replace one named secret. Touches only the named secret;
    /// sibling secrets in the vault are never read or rewritten.
    async fn set_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &SecretValue,
    ) -> FetchResult<()>;

    /// Delete one named secret.
    async fn delete_secret(&self, vault_name: &str, secret_name: &str) -> FetchResult<()>;
}
