//! Vaultscope Core - Domain Types
//!
//! Pure data structures with no behavior beyond construction and display.
//! The cache engine and the TUI both depend on this crate; it contains no
//! async code and performs no IO.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod error;
pub mod naming;

pub use error::{FetchError, FetchErrorKind, FetchResult};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Directory (tenant) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Subscription identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// RESOURCE TYPES
// ============================================================================

/// A signed-in account (CLI profile or service principal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub tenant_id: TenantId,
    pub is_default: bool,
}

/// Lifecycle state reported by the management plane for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SubscriptionState {
    Enabled,
    Disabled,
    Warned,
    PastDue,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: SubscriptionId,
    pub name: String,
    pub tenant_id: TenantId,
    pub state: SubscriptionState,
}

/// A key vault resource within a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub name: String,
    pub subscription_id: SubscriptionId,
    pub uri: String,
    pub location: String,
}

/// Listing metadata for a secret; carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMeta {
    pub name: String,
    pub vault_name: String,
    pub enabled: bool,
    pub updated_at: Option<Timestamp>,
}

/// A fetched secret value.
///
/// The `Debug` impl redacts the payload so values cannot leak through
/// panics, notifications, or log formatting.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretValue {
    pub value: String,
    pub content_type: Option<String>,
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("value", &"<redacted>")
            .field("content_type", &self.content_type)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_display_roundtrip() {
        let id = Uuid::new_v4();
        let tenant = TenantId::new(id);
        assert_eq!(tenant.to_string(), id.to_string());
        assert_eq!(tenant.as_uuid(), id);
    }

    #[test]
    fn test_secret_value_debug_is_redacted() {
        let secret = SecretValue {
            value: "hunter2".to_string(),
            content_type: Some("text/plain".to_string()),
        };
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("text/plain"));
    }

    #[test]
    fn test_subscription_state_serde_pascal_case() {
        let json = serde_json::to_string(&SubscriptionState::PastDue).unwrap();
        assert_eq!(json, "\"PastDue\"");
        let parsed: SubscriptionState = serde_json::from_str("\"Enabled\"").unwrap();
        assert_eq!(parsed, SubscriptionState::Enabled);
    }

    #[test]
    fn test_subscription_id_serde_transparent() {
        let id = SubscriptionId::new(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
