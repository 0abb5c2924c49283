//! Cache-aside fetchers over the remote secret source.
//!
//! Every read follows the same template: build the key, try the cache,
//! fall back to the source on miss, populate the cache on success. The
//! caller can see whether a result came from cache (it changes status text
//! and suppresses the loading indicator). Failures come back as typed
//! errors, never as an empty list masquerading as "zero items".

use crate::keys;
use crate::source::SecretSource;
use crate::ttl::TtlCache;
use std::sync::Arc;
use vaultscope_core::{
    Account, FetchResult, SecretMeta, SecretValue, Subscription, SubscriptionId, TenantId, Vault,
};

/// Union of the payload shapes held in the resource cache.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Accounts(Vec<Account>),
    Subscriptions(Vec<Subscription>),
    Vaults(Vec<Vault>),
    Secrets(Vec<SecretMeta>),
    Secret(SecretValue),
}

pub type ResourceCache = TtlCache<CachedValue>;

/// Where a fetched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Remote,
}

/// A fetch result with its origin attached.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Fetched<T> {
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            origin: Origin::Cache,
        }
    }

    pub fn from_remote(value: T) -> Self {
        Self {
            value,
            origin: Origin::Remote,
        }
    }

    pub fn was_cached(&self) -> bool {
        self.origin == Origin::Cache
    }
}

#[derive(Clone)]
pub struct SecretFetcher {
    cache: Arc<ResourceCache>,
    source: Arc<dyn SecretSource>,
}

impl SecretFetcher {
    pub fn new(cache: Arc<ResourceCache>, source: Arc<dyn SecretSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    // ------------------------------------------------------------------------
    // Reads (cache-aside)
    // ------------------------------------------------------------------------

    pub async fn accounts(&self) -> FetchResult<Fetched<Vec<Account>>> {
        let key = keys::accounts();
        if let Some(CachedValue::Accounts(accounts)) = self.cache.get(&key) {
            return Ok(Fetched::from_cache(accounts));
        }
        let accounts = self.source.list_accounts().await?;
        self.cache.insert(key, CachedValue::Accounts(accounts.clone()));
        Ok(Fetched::from_remote(accounts))
    }

    pub async fn subscriptions(
        &self,
        tenant_id: TenantId,
    ) -> FetchResult<Fetched<Vec<Subscription>>> {
        let key = keys::subscriptions(tenant_id);
        if let Some(CachedValue::Subscriptions(subs)) = self.cache.get(&key) {
            return Ok(Fetched::from_cache(subs));
        }
        let subs = self.source.list_subscriptions(tenant_id).await?;
        self.cache.insert(key, CachedValue::Subscriptions(subs.clone()));
        Ok(Fetched::from_remote(subs))
    }

    pub async fn vaults(&self, subscription_id: SubscriptionId) -> FetchResult<Fetched<Vec<Vault>>> {
        let key = keys::vaults(subscription_id);
        if let Some(CachedValue::Vaults(vaults)) = self.cache.get(&key) {
            return Ok(Fetched::from_cache(vaults));
        }
        let vaults = self.source.list_vaults(subscription_id).await?;
        self.cache.insert(key, CachedValue::Vaults(vaults.clone()));
        Ok(Fetched::from_remote(vaults))
    }

    pub async fn secrets(&self, vault_name: &str) -> FetchResult<Fetched<Vec<SecretMeta>>> {
        let key = keys::secrets(vault_name);
        if let Some(CachedValue::Secrets(secrets)) = self.cache.get(&key) {
            return Ok(Fetched::from_cache(secrets));
        }
        let secrets = self.source.list_secrets(vault_name).await?;
        self.cache.insert(key, CachedValue::Secrets(secrets.clone()));
        Ok(Fetched::from_remote(secrets))
    }

    pub async fn secret_value(
        &self,
        vault_name: &str,
        secret_name: &str,
    ) -> FetchResult<Fetched<SecretValue>> {
        let key = keys::secret_value(vault_name, secret_name);
        if let Some(CachedValue::Secret(value)) = self.cache.get(&key) {
            return Ok(Fetched::from_cache(value));
        }
        let value = self.source.get_secret_value(vault_name, secret_name).await?;
        self.cache.insert(key, CachedValue::Secret(value.clone()));
        Ok(Fetched::from_remote(value))
    }

    // ------------------------------------------------------------------------
    // Probes (cache presence without fetching)
    // ------------------------------------------------------------------------

    pub fn accounts_cached(&self) -> bool {
        self.cache.contains(&keys::accounts())
    }

    pub fn subscriptions_cached(&self, tenant_id: TenantId) -> bool {
        self.cache.contains(&keys::subscriptions(tenant_id))
    }

    pub fn vaults_cached(&self, subscription_id: SubscriptionId) -> bool {
        self.cache.contains(&keys::vaults(subscription_id))
    }

    pub fn secrets_cached(&self, vault_name: &str) -> bool {
        self.cache.contains(&keys::secrets(vault_name))
    }

    pub fn secret_value_cached(&self, vault_name: &str, secret_name: &str) -> bool {
        self.cache.contains(&keys::secret_value(vault_name, secret_name))
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Create or replace one secret, then evict the vault's listing and
    /// value entries so the next read refetches.
    pub async fn set_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &SecretValue,
    ) -> FetchResult<()> {
        self.source.set_secret(vault_name, secret_name, value).await?;
        self.invalidate_vault(vault_name);
        Ok(())
    }

    /// Delete one secret, with the same eviction as `set_secret`.
    pub async fn delete_secret(&self, vault_name: &str, secret_name: &str) -> FetchResult<()> {
        self.source.delete_secret(vault_name, secret_name).await?;
        self.invalidate_vault(vault_name);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------------

    /// Evict a vault's secret listing and every cached secret value.
    pub fn invalidate_vault(&self, vault_name: &str) {
        self.cache.invalidate(&keys::secrets(vault_name));
        self.cache.invalidate_prefix(&keys::secret_value_prefix(vault_name));
    }

    /// Evict a subscription's vault listing.
    pub fn invalidate_subscription(&self, subscription_id: SubscriptionId) {
        self.cache.invalidate(&keys::vaults(subscription_id));
    }

    /// Full user-requested refresh: drop everything.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
