//! Generic key-value store with per-entry expiry and prefix invalidation.
//!
//! Entries are immutable once written; a write is an unconditional replace.
//! Expired entries are purged lazily on the next read. The cache never
//! errors: a miss is the only observable outcome of a failed lookup, and a
//! delete racing a lookup resolves to a miss.

use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use vaultscope_core::Timestamp;

/// Default entry lifetime: effectively "until explicit invalidation".
const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Timestamp,
}

pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    clock: Arc<dyn Clock>,
    default_ttl: chrono::Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_default_ttl(clock, chrono::Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>, default_ttl: chrono::Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            default_ttl,
        }
    }

    /// Store a value under `key` with the default TTL, replacing any
    /// previous entry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value with an explicit TTL.
    pub fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: chrono::Duration) {
        let entry = Entry {
            value,
            expires_at: self.clock.now() + ttl,
        };
        self.write().insert(key.into(), entry);
    }

    /// Fetch a live value. Expired entries are removed and reported as a
    /// miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = self.read();
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Entry was present but expired: purge it, re-checking under the
        // write lock in case a concurrent insert replaced it.
        let mut entries = self.write();
        if let Some(entry) = entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Probe for a live entry without cloning the value.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.read()
            .get(key)
            .is_some_and(|entry| now < entry.expires_at)
    }

    /// Remove one entry unconditionally.
    pub fn invalidate(&self, key: &str) {
        self.write().remove(key);
    }

    /// Remove every entry whose key starts with `prefix`. Returns the
    /// number of entries removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of entries currently stored, expired or not.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A poisoned lock would require a panic inside HashMap operations;
    // recover with whatever state is there rather than propagating.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Set-then-get returns the value unchanged for arbitrary strings.
        #[test]
        fn prop_round_trip(key in "[a-z:]{1,20}", value in ".{0,64}") {
            let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
            let cache = TtlCache::new(clock as Arc<dyn Clock>);
            cache.insert(key.clone(), value.clone());
            prop_assert_eq!(cache.get(&key), Some(value));
        }

        /// Prefix invalidation removes exactly the matching keys.
        #[test]
        fn prop_prefix_invalidation_partition(
            keys in prop::collection::hash_set("[a-c]:[a-z]{1,4}", 1..20),
            prefix in "[a-c]:"
        ) {
            let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
            let cache = TtlCache::new(clock as Arc<dyn Clock>);
            for key in &keys {
                cache.insert(key.clone(), 1u8);
            }
            cache.invalidate_prefix(&prefix);
            for key in &keys {
                let survived = cache.get(key).is_some();
                prop_assert_eq!(survived, !key.starts_with(&prefix));
            }
        }
    }
}
