//! Per-tenant bearer token cache.
//!
//! Tokens are reused until within five minutes of expiry, then refreshed
//! through the issuing collaborator. Refreshes for one tenant are
//! serialized so concurrent callers coalesce into a single issuance;
//! different tenants refresh independently.

use crate::clock::Clock;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use vaultscope_core::{FetchResult, TenantId, Timestamp};

/// A bearer token with its expiry instant.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub expires_on: Timestamp,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// External token-issuing collaborator (CLI credential, device code, ...).
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, tenant_id: TenantId, scope: &str) -> FetchResult<Token>;
}

/// Remaining lifetime below which a token is treated as expired.
fn refresh_margin() -> chrono::Duration {
    chrono::Duration::minutes(5)
}

type TokenSlot = Arc<tokio::sync::Mutex<Option<Token>>>;

pub struct TokenCache {
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<TenantId, TokenSlot>>,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return a live token for the tenant, refreshing through `issuer` if
    /// the cached one is absent or within the refresh margin of expiry.
    ///
    /// The per-tenant async mutex is held across the issuance, so a second
    /// caller for the same tenant waits and then reuses the fresh token
    /// instead of triggering a redundant issuance.
    pub async fn get<I>(&self, issuer: &I, tenant_id: TenantId, scope: &str) -> FetchResult<Token>
    where
        I: TokenIssuer + ?Sized,
    {
        let slot = self.slot(tenant_id);
        let mut guard = slot.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.expires_on - self.clock.now() > refresh_margin() {
                return Ok(token.clone());
            }
        }

        let fresh = issuer.issue(tenant_id, scope).await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drop all cached tokens; the next use per tenant re-issues.
    pub fn clear(&self) {
        self.lock_slots().clear();
    }

    fn slot(&self, tenant_id: TenantId) -> TokenSlot {
        self.lock_slots().entry(tenant_id).or_default().clone()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<TenantId, TokenSlot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// TESTS
// ============================================================================
