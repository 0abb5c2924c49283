//! Subscription base-name normalization and grouping.
//!
//! Subscriptions in most estates come in environment families
//! (`dev-myapp`, `myapp-prd`, `sub-myapp-stg`). Stripping the environment
//! tokens from the hyphen-delimited name yields a base name that the UI
//! uses to aggregate a family into a single group node.

use crate::Subscription;
use std::collections::BTreeMap;

/// Environment tokens stripped from hyphen-delimited subscription names.
const ENV_TOKENS: &[&str] = &[
    "dev",
    "tst",
    "test",
    "stg",
    "stage",
    "staging",
    "prd",
    "prod",
    "production",
    "sub",
    "liv",
    "live",
];

/// Normalize a subscription name to its environment-free base name.
///
/// Splits on `-`, drops every segment that is an environment token
/// (case-insensitive), and rejoins the rest. Dropping segments collapses
/// the double hyphens that interior tokens would otherwise leave behind
/// and trims leading/trailing ones. Idempotent: a name with no environment
/// tokens comes back unchanged apart from lowercasing.
///
/// A name consisting solely of environment tokens normalizes to itself
/// (lowercased) so it can still form a stable group key.
pub fn base_name(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    let kept: Vec<&str> = lowered
        .split('-')
        .filter(|segment| !segment.is_empty() && !ENV_TOKENS.contains(segment))
        .collect();
    if kept.is_empty() {
        lowered
    } else {
        kept.join("-")
    }
}

/// A family of subscriptions sharing one base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionGroup {
    pub base: String,
    pub members: Vec<Subscription>,
}

impl SubscriptionGroup {
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Bucket subscriptions by base name, ordered by base name.
pub fn group_subscriptions(subscriptions: &[Subscription]) -> Vec<SubscriptionGroup> {
    let mut buckets: BTreeMap<String, Vec<Subscription>> = BTreeMap::new();
    for sub in subscriptions {
        buckets
            .entry(base_name(&sub.name))
            .or_default()
            .push(sub.clone());
    }
    buckets
        .into_iter()
        .map(|(base, members)| SubscriptionGroup { base, members })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SubscriptionId, SubscriptionState, TenantId};
    use uuid::Uuid;

    fn sub(name: &str) -> Subscription {
        Subscription {
            subscription_id: SubscriptionId::new(Uuid::new_v4()),
            name: name.to_string(),
            tenant_id: TenantId::new(Uuid::nil()),
            state: SubscriptionState::Enabled,
        }
    }

    #[test]
    fn test_strips_leading_token() {
        assert_eq!(base_name("dev-myapp"), "myapp");
    }

    #[test]
    fn test_strips_trailing_token() {
        assert_eq!(base_name("myapp-prd"), "myapp");
    }

    #[test]
    fn test_strips_multiple_tokens() {
        assert_eq!(base_name("sub-myapp-stg"), "myapp");
    }

    #[test]
    fn test_interior_token_collapses_hyphens() {
        assert_eq!(base_name("myapp-prod-payments"), "myapp-payments");
    }

    #[test]
    fn test_no_token_is_identity() {
        assert_eq!(base_name("myapp"), "myapp");
    }

    #[test]
    fn test_idempotent() {
        let once = base_name("dev-myapp-stg");
        assert_eq!(base_name(&once), once);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(base_name("DEV-MyApp"), "myapp");
    }

    #[test]
    fn test_token_only_name_keeps_itself() {
        assert_eq!(base_name("prod"), "prod");
        assert_eq!(base_name("dev-prd"), "dev-prd");
    }

    #[test]
    fn test_token_must_match_whole_segment() {
        // "developer" contains "dev" but is not an environment token.
        assert_eq!(base_name("developer-tools"), "developer-tools");
    }

    #[test]
    fn test_group_subscriptions_buckets_family() {
        let subs = vec![sub("dev-myapp"), sub("myapp-prd"), sub("other")];
        let groups = group_subscriptions(&subs);
        assert_eq!(groups.len(), 2);
        let myapp = groups.iter().find(|g| g.base == "myapp").unwrap();
        assert_eq!(myapp.members.len(), 2);
        assert!(!myapp.is_single());
        let other = groups.iter().find(|g| g.base == "other").unwrap();
        assert!(other.is_single());
    }

    #[test]
    fn test_group_order_is_stable() {
        let subs = vec![sub("zeta"), sub("alpha-prd"), sub("dev-alpha")];
        let groups = group_subscriptions(&subs);
        let bases: Vec<&str> = groups.iter().map(|g| g.base.as_str()).collect();
        assert_eq!(bases, vec!["alpha", "zeta"]);
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Normalization is idempotent for any hyphenated ASCII name.
        #[test]
        fn prop_base_name_idempotent(name in "[a-z0-9]{0,8}(-[a-z0-9]{0,8}){0,4}") {
            let once = base_name(&name);
            prop_assert_eq!(base_name(&once), once);
        }

        /// The result never starts or ends with a hyphen and never
        /// contains a double hyphen (unless the input was token-only and
        /// came back verbatim).
        #[test]
        fn prop_base_name_well_formed(name in "[a-z]{1,6}(-[a-z]{1,6}){0,4}") {
            let base = base_name(&name);
            if base != name {
                prop_assert!(!base.starts_with('-'));
                prop_assert!(!base.ends_with('-'));
                prop_assert!(!base.contains("--"));
            }
        }
    }
}
