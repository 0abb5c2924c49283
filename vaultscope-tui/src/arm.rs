//! REST plumbing: the management-plane / data-plane implementation of
//! `SecretSource`, and the CLI-backed token issuer.
//!
//! Everything here is a thin wrapper over `reqwest` and the `az` process;
//! failures classify through `FetchError::from_http_status` so the cache
//! layer and the UI stay transport-agnostic.

use crate::config::TuiConfig;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use vaultscope_cache::{SecretSource, Token, TokenCache, TokenIssuer};
use vaultscope_core::{
    Account, FetchError, FetchErrorKind, FetchResult, SecretMeta, SecretValue, Subscription,
    SubscriptionId, SubscriptionState, TenantId, Vault,
};

const MANAGEMENT_API_VERSION: &str = "2022-12-01";
const RESOURCES_API_VERSION: &str = "2021-04-01";
const VAULT_API_VERSION: &str = "7.4";

// ----------------------------------------------------------------------------
// CLI token issuer
// ----------------------------------------------------------------------------

/// Issues bearer tokens by shelling out to the cloud CLI.
pub struct CliTokenIssuer;

#[derive(Debug, Deserialize)]
struct CliTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Unix seconds.
    expires_on: i64,
}

#[async_trait]
impl TokenIssuer for CliTokenIssuer {
    async fn issue(&self, tenant_id: TenantId, scope: &str) -> FetchResult<Token> {
        let output = tokio::process::Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--tenant",
                &tenant_id.to_string(),
                "--scope",
                scope,
                "--output",
                "json",
            ])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                FetchError::new(
                    FetchErrorKind::NotAuthenticated,
                    format!("failed to run az: {}", e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::new(
                FetchErrorKind::NotAuthenticated,
                format!("az get-access-token failed: {}", stderr.trim()),
            ));
        }

        let parsed: CliTokenResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::transient(format!("bad token response: {}", e)))?;
        let expires_on = Utc
            .timestamp_opt(parsed.expires_on, 0)
            .single()
            .ok_or_else(|| FetchError::transient("token expiry out of range"))?;

        Ok(Token {
            access_token: parsed.access_token,
            expires_on,
        })
    }
}

// ----------------------------------------------------------------------------
// Wire types
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Page<T> {
    value: Vec<T>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CliAccountEntry {
    name: String,
    #[serde(rename = "tenantId")]
    tenant_id: uuid::Uuid,
    #[serde(rename = "isDefault", default)]
    is_default: bool,
}

#[derive(Debug, Deserialize)]
struct WireSubscription {
    #[serde(rename = "subscriptionId")]
    subscription_id: uuid::Uuid,
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(rename = "tenantId")]
    tenant_id: uuid::Uuid,
    state: SubscriptionState,
}

#[derive(Debug, Deserialize)]
struct WireResource {
    name: String,
    location: String,
}

#[derive(Debug, Deserialize)]
struct WireSecretItem {
    id: String,
    #[serde(default)]
    attributes: WireSecretAttributes,
}

#[derive(Debug, Deserialize)]
struct WireSecretAttributes {
    #[serde(default = "default_enabled")]
    enabled: bool,
    /// Unix seconds.
    updated: Option<i64>,
}

// A listing entry with no attributes object at all is still enabled.
impl Default for WireSecretAttributes {
    fn default() -> Self {
        Self {
            enabled: true,
            updated: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct WireSecretBundle {
    value: String,
    #[serde(rename = "contentType")]
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: Option<WireErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: Option<String>,
}

/// Secret identifiers look like `https://<vault>.../secrets/<name>[/<version>]`.
fn secret_name_from_id(id: &str) -> Option<&str> {
    let rest = id.split("/secrets/").nth(1)?;
    let name = rest.split('/').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Pull the service's human-readable message out of an error body, falling
/// back to the raw text.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<WireErrorBody>(body) {
        if let Some(message) = parsed.error.and_then(|d| d.message) {
            return message;
        }
    }
    format!("HTTP {}: {}", status, body.trim())
}

/// Map raw CLI account entries to accounts, one per tenant, defaults first.
fn accounts_from_entries(mut entries: Vec<CliAccountEntry>) -> Vec<Account> {
    entries.sort_by_key(|entry| !entry.is_default);
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.tenant_id))
        .map(|entry| Account {
            name: entry.name,
            tenant_id: TenantId::new(entry.tenant_id),
            is_default: entry.is_default,
        })
        .collect()
}

// ----------------------------------------------------------------------------
// ArmSource
// ----------------------------------------------------------------------------

/// `SecretSource` over the management plane (subscriptions, vaults) and the
/// vault data plane (secrets). Accounts come from the CLI profile list.
pub struct ArmSource {
    http: reqwest::Client,
    management_endpoint: String,
    vault_dns_suffix: String,
    scope_management: String,
    scope_vault: String,
    tokens: Arc<TokenCache>,
    issuer: Arc<dyn TokenIssuer>,
    active_tenant: RwLock<Option<TenantId>>,
}

impl ArmSource {
    pub fn new(
        config: &TuiConfig,
        tokens: Arc<TokenCache>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| FetchError::transient(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            management_endpoint: config.management_endpoint.trim_end_matches('/').to_string(),
            vault_dns_suffix: config.vault_dns_suffix.clone(),
            scope_management: config.token_scope_management.clone(),
            scope_vault: config.token_scope_vault.clone(),
            tokens,
            issuer,
            active_tenant: RwLock::new(None),
        })
    }

    /// Switch tenants. Cached tokens are dropped because assumptions from
    /// the previous tenant no longer hold.
    pub async fn set_active_tenant(&self, tenant_id: TenantId) {
        *self.active_tenant.write().await = Some(tenant_id);
        self.tokens.clear();
    }

    async fn active_tenant(&self) -> FetchResult<TenantId> {
        let tenant = *self.active_tenant.read().await;
        tenant.ok_or_else(|| FetchError::new(FetchErrorKind::NotAuthenticated, "no account selected"))
    }

    async fn bearer(&self, tenant_id: TenantId, scope: &str) -> FetchResult<Token> {
        self.tokens.get(self.issuer.as_ref(), tenant_id, scope).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &Token,
    ) -> FetchResult<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| {
                FetchError::new(FetchErrorKind::NetworkOrThrottling, e.to_string())
            })?;
        parse_response(response).await
    }

    /// Fetch every page of a list endpoint, following `nextLink`.
    async fn get_all_pages<T: serde::de::DeserializeOwned>(
        &self,
        first_url: String,
        token: &Token,
    ) -> FetchResult<Vec<T>> {
        let mut items = Vec::new();
        let mut url = Some(first_url);
        while let Some(current) = url {
            let page: Page<T> = self.get_json(&current, token).await?;
            items.extend(page.value);
            url = page.next_link;
        }
        Ok(items)
    }

    fn vault_base_url(&self, vault_name: &str) -> String {
        format!("https://{}.{}", vault_name, self.vault_dns_suffix)
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> FetchResult<T> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::transient(format!("decode error: {}", e)))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(FetchError::from_http_status(
            status.as_u16(),
            error_message(status.as_u16(), &body),
        ))
    }
}

async fn expect_success(response: reqwest::Response) -> FetchResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(FetchError::from_http_status(
            status.as_u16(),
            error_message(status.as_u16(), &body),
        ))
    }
}

#[async_trait]
impl SecretSource for ArmSource {
    async fn list_accounts(&self) -> FetchResult<Vec<Account>> {
        let output = tokio::process::Command::new("az")
            .args(["account", "list", "--output", "json"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                FetchError::new(
                    FetchErrorKind::NotAuthenticated,
                    format!("failed to run az: {}", e),
                )
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::new(
                FetchErrorKind::NotAuthenticated,
                format!("az account list failed: {}", stderr.trim()),
            ));
        }
        let entries: Vec<CliAccountEntry> = serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::transient(format!("bad account list: {}", e)))?;
        Ok(accounts_from_entries(entries))
    }

    async fn list_subscriptions(&self, tenant_id: TenantId) -> FetchResult<Vec<Subscription>> {
        let token = self.bearer(tenant_id, &self.scope_management).await?;
        let url = format!(
            "{}/subscriptions?api-version={}",
            self.management_endpoint, MANAGEMENT_API_VERSION
        );
        let wire: Vec<WireSubscription> = self.get_all_pages(url, &token).await?;
        Ok(wire
            .into_iter()
            .map(|sub| Subscription {
                subscription_id: SubscriptionId::new(sub.subscription_id),
                name: sub.display_name,
                tenant_id: TenantId::new(sub.tenant_id),
                state: sub.state,
            })
            .collect())
    }

    async fn list_vaults(&self, subscription_id: SubscriptionId) -> FetchResult<Vec<Vault>> {
        let tenant_id = self.active_tenant().await?;
        let token = self.bearer(tenant_id, &self.scope_management).await?;
        let url = format!(
            "{}/subscriptions/{}/resources?$filter=resourceType eq 'Microsoft.KeyVault/vaults'&api-version={}",
            self.management_endpoint, subscription_id, RESOURCES_API_VERSION
        );
        let wire: Vec<WireResource> = self.get_all_pages(url, &token).await?;
        Ok(wire
            .into_iter()
            .map(|resource| Vault {
                uri: self.vault_base_url(&resource.name),
                name: resource.name,
                subscription_id,
                location: resource.location,
            })
            .collect())
    }

    async fn list_secrets(&self, vault_name: &str) -> FetchResult<Vec<SecretMeta>> {
        let tenant_id = self.active_tenant().await?;
        let token = self.bearer(tenant_id, &self.scope_vault).await?;
        let url = format!(
            "{}/secrets?api-version={}",
            self.vault_base_url(vault_name),
            VAULT_API_VERSION
        );
        let wire: Vec<WireSecretItem> = self.get_all_pages(url, &token).await?;
        Ok(wire
            .iter()
            .filter_map(|item| {
                let name = secret_name_from_id(&item.id)?;
                Some(SecretMeta {
                    name: name.to_string(),
                    vault_name: vault_name.to_string(),
                    enabled: item.attributes.enabled,
                    updated_at: item
                        .attributes
                        .updated
                        .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
                })
            })
            .collect())
    }

    async fn get_secret_value(
        &self,
        vault_name: &str,
        secret_name: &str,
    ) -> FetchResult<SecretValue> {
        let tenant_id = self.active_tenant().await?;
        let token = self.bearer(tenant_id, &self.scope_vault).await?;
        let url = format!(
            "{}/secrets/{}?api-version={}",
            self.vault_base_url(vault_name),
            secret_name,
            VAULT_API_VERSION
        );
        let bundle: WireSecretBundle = self.get_json(&url, &token).await?;
        Ok(SecretValue {
            value: bundle.value,
            content_type: bundle.content_type,
        })
    }

    /// Single-secret upsert. Only the named secret is written; sibling
    /// secrets in the vault are never read or rewritten.
    async fn set_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
        value: &SecretValue,
    ) -> FetchResult<()> {
        let tenant_id = self.active_tenant().await?;
        let token = self.bearer(tenant_id, &self.scope_vault).await?;
        let url = format!(
            "{}/secrets/{}?api-version={}",
            self.vault_base_url(vault_name),
            secret_name,
            VAULT_API_VERSION
        );
        let body = serde_json::json!({
            "value": value.value,
            "contentType": value.content_type,
        });
        let response = self
            .http
            .put(&url)
            .bearer_auth(&token.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                FetchError::new(FetchErrorKind::NetworkOrThrottling, e.to_string())
            })?;
        expect_success(response).await
    }

    async fn delete_secret(&self, vault_name: &str, secret_name: &str) -> FetchResult<()> {
        let tenant_id = self.active_tenant().await?;
        let token = self.bearer(tenant_id, &self.scope_vault).await?;
        let url = format!(
            "{}/secrets/{}?api-version={}",
            self.vault_base_url(vault_name),
            secret_name,
            VAULT_API_VERSION
        );
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| {
                FetchError::new(FetchErrorKind::NetworkOrThrottling, e.to_string())
            })?;
        expect_success(response).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_name_extracted_from_id() {
        assert_eq!(
            secret_name_from_id("https://kv.vault.example.net/secrets/db-password"),
            Some("db-password")
        );
        assert_eq!(
            secret_name_from_id("https://kv.vault.example.net/secrets/db-password/abc123"),
            Some("db-password")
        );
        assert_eq!(secret_name_from_id("https://kv.vault.example.net/keys/k1"), None);
        assert_eq!(secret_name_from_id("https://kv.vault.example.net/secrets/"), None);
    }

    #[test]
    fn test_error_message_prefers_service_detail() {
        let body = r#"{"error":{"code":"Forbidden","message":"Caller is not authorized"}}"#;
        assert_eq!(error_message(403, body), "Caller is not authorized");
        assert_eq!(error_message(500, "oops"), "HTTP 500: oops");
    }

    #[test]
    fn test_accounts_deduped_per_tenant_defaults_first() {
        let tenant_a = uuid::Uuid::from_u128(1);
        let tenant_b = uuid::Uuid::from_u128(2);
        let entries = vec![
            CliAccountEntry {
                name: "work-dev".to_string(),
                tenant_id: tenant_a,
                is_default: false,
            },
            CliAccountEntry {
                name: "work-prod".to_string(),
                tenant_id: tenant_a,
                is_default: true,
            },
            CliAccountEntry {
                name: "personal".to_string(),
                tenant_id: tenant_b,
                is_default: false,
            },
        ];

        let accounts = accounts_from_entries(entries);

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "work-prod");
        assert!(accounts[0].is_default);
        assert_eq!(accounts[1].name, "personal");
    }

    #[test]
    fn test_subscription_page_deserializes() {
        let json = r#"{
            "value": [{
                "subscriptionId": "00000000-0000-0000-0000-000000000007",
                "displayName": "dev-myapp",
                "tenantId": "00000000-0000-0000-0000-000000000001",
                "state": "Enabled"
            }],
            "nextLink": "https://example.net/page2"
        }"#;
        let page: Page<WireSubscription> = serde_json::from_str(json).unwrap();
        assert_eq!(page.value.len(), 1);
        assert_eq!(page.value[0].display_name, "dev-myapp");
        assert_eq!(page.next_link.as_deref(), Some("https://example.net/page2"));
    }

    #[test]
    fn test_secret_item_defaults_enabled_when_attributes_missing() {
        let json = r#"{"value":[{"id":"https://kv.v.example/secrets/s1"}]}"#;
        let page: Page<WireSecretItem> = serde_json::from_str(json).unwrap();
        assert!(page.value[0].attributes.enabled);
    }

    #[test]
    fn test_cli_token_response_parses() {
        let json = r#"{
            "accessToken": "eyJ0...",
            "expiresOn": "2026-08-23 12:00:00.000000",
            "expires_on": 1787654321,
            "subscription": "sub",
            "tenant": "t",
            "tokenType": "Bearer"
        }"#;
        let parsed: CliTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.expires_on, 1787654321);
        assert_eq!(parsed.access_token, "eyJ0...");
    }
}
