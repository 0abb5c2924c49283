//! Parallel cache warmer with bounded concurrency.
//!
//! Warms the resource cache for many subscriptions (or vaults) at once.
//! Already-cached ids are filtered out up front, the remainder run through
//! a bounded worker pool, and a progress event is emitted after each
//! completion, in completion order. The loader has no return value; its
//! effect is cache population, so any number of consumers can read the
//! results afterwards without re-fetching.

use crate::fetch::{Fetched, SecretFetcher};
use futures_util::stream::{self, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use vaultscope_core::{FetchError, FetchResult, SubscriptionId, Vault};

/// One progress tick from a bulk load.
///
/// `completed` is monotonically non-decreasing and equals `total` exactly
/// once every non-skipped item has finished. Per-item failures ride along
/// in `error`; they never abort the run.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub current: String,
    pub error: Option<FetchError>,
}

impl ProgressEvent {
    pub fn is_final(&self) -> bool {
        self.completed == self.total
    }
}

/// Tally of one bulk run, returned to the caller alongside the progress
/// events it streamed out.
#[derive(Debug, Clone, Default)]
pub struct BulkSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub last_error: Option<FetchError>,
}

/// Cooperative cancellation handle.
///
/// Cancelling skips fetches that have not yet started; fetches already in
/// flight run to completion and still populate the cache.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BulkLoader {
    concurrency: usize,
}

impl BulkLoader {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Warm the vault listings for a set of subscriptions.
    pub async fn warm_vault_lists(
        &self,
        fetcher: &SecretFetcher,
        subscription_ids: Vec<SubscriptionId>,
        progress: mpsc::Sender<ProgressEvent>,
        cancel: CancelFlag,
    ) -> BulkSummary {
        let pending: Vec<SubscriptionId> = subscription_ids
            .into_iter()
            .filter(|id| !fetcher.vaults_cached(*id))
            .collect();
        self.run(
            pending,
            |id| {
                let fetcher = fetcher.clone();
                async move { (id.to_string(), fetcher.vaults(id).await.err()) }
            },
            progress,
            cancel,
        )
        .await
    }

    /// Warm the secret listings for a set of vaults.
    pub async fn warm_secret_lists(
        &self,
        fetcher: &SecretFetcher,
        vault_names: Vec<String>,
        progress: mpsc::Sender<ProgressEvent>,
        cancel: CancelFlag,
    ) -> BulkSummary {
        let pending: Vec<String> = vault_names
            .into_iter()
            .filter(|name| !fetcher.secrets_cached(name))
            .collect();
        self.run(
            pending,
            |name| {
                let fetcher = fetcher.clone();
                async move {
                    let error = fetcher.secrets(&name).await.err();
                    (name, error)
                }
            },
            progress,
            cancel,
        )
        .await
    }

    /// Warm and merge the vault listings of a whole subscription group.
    ///
    /// The group loads as a unit: members whose fetch failed or was skipped
    /// by cancellation contribute nothing to the merge (their errors went
    /// out as progress events), but when no member produced a listing the
    /// load as a whole is an error, so an all-members-down group is never
    /// mistaken for one that simply has no vaults.
    pub async fn load_group_vaults(
        &self,
        fetcher: &SecretFetcher,
        members: Vec<SubscriptionId>,
        progress: mpsc::Sender<ProgressEvent>,
        cancel: CancelFlag,
    ) -> FetchResult<Fetched<Vec<Vault>>> {
        let all_cached = members.iter().all(|id| fetcher.vaults_cached(*id));
        let summary = self
            .warm_vault_lists(fetcher, members.clone(), progress, cancel)
            .await;

        let mut vaults = Vec::new();
        let mut listed = 0usize;
        for id in &members {
            if !fetcher.vaults_cached(*id) {
                continue;
            }
            if let Ok(fetched) = fetcher.vaults(*id).await {
                listed += 1;
                vaults.extend(fetched.value);
            }
        }

        if listed == 0 && !members.is_empty() {
            return Err(summary.last_error.unwrap_or_else(|| {
                FetchError::transient("bulk load cancelled before any member finished")
            }));
        }

        vaults.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(if all_cached {
            Fetched::from_cache(vaults)
        } else {
            Fetched::from_remote(vaults)
        })
    }

    async fn run<K, F, Fut>(
        &self,
        pending: Vec<K>,
        op: F,
        progress: mpsc::Sender<ProgressEvent>,
        cancel: CancelFlag,
    ) -> BulkSummary
    where
        K: Send,
        F: Fn(K) -> Fut + Sync,
        Fut: Future<Output = (String, Option<FetchError>)> + Send,
    {
        let mut summary = BulkSummary::default();
        let total = pending.len();
        if total == 0 {
            // Everything was already cached; report completion immediately.
            let _ = progress
                .send(ProgressEvent {
                    completed: 0,
                    total: 0,
                    current: String::new(),
                    error: None,
                })
                .await;
            return summary;
        }

        let op = &op;
        let mut results = stream::iter(pending.into_iter().map(|id| {
            let cancel = cancel.clone();
            async move {
                // Checked at fetch start: cancellation skips items that
                // have not begun, never aborts one mid-flight.
                if cancel.is_cancelled() {
                    return None;
                }
                Some(op(id).await)
            }
        }))
        .buffer_unordered(self.concurrency);

        let mut completed = 0usize;
        while let Some(outcome) = results.next().await {
            let Some((current, error)) = outcome else {
                continue;
            };
            completed += 1;
            match &error {
                Some(err) => {
                    summary.failed += 1;
                    summary.last_error = Some(err.clone());
                }
                None => summary.succeeded += 1,
            }
            let _ = progress
                .send(ProgressEvent {
                    completed,
                    total,
                    current,
                    error,
                })
                .await;
        }
        summary
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::fetch::ResourceCache;
    use crate::source::SecretSource;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use uuid::Uuid;
    use vaultscope_core::{
        Account, FetchResult, SecretMeta, SecretValue, Subscription, TenantId, Vault,
    };

    struct SlowSource {
        vault_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay_ms: u64,
        cancel_after_first: Option<CancelFlag>,
    }

    impl SlowSource {
        fn new(delay_ms: u64) -> Self {
            Self {
                vault_calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay_ms,
                cancel_after_first: None,
            }
        }
    }

    #[async_trait]
    impl SecretSource for SlowSource {
        async fn list_accounts(&self) -> FetchResult<Vec<Account>> {
            Ok(Vec::new())
        }

        async fn list_subscriptions(&self, _tenant_id: TenantId) -> FetchResult<Vec<Subscription>> {
            Ok(Vec::new())
        }

        async fn list_vaults(&self, subscription_id: SubscriptionId) -> FetchResult<Vec<Vault>> {
            let calls = self.vault_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if calls == 0 {
                if let Some(flag) = &self.cancel_after_first {
                    flag.cancel();
                }
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![Vault {
                name: format!("vault-{}", subscription_id),
                subscription_id,
                uri: String::new(),
                location: "westeurope".to_string(),
            }])
        }

        async fn list_secrets(&self, _vault_name: &str) -> FetchResult<Vec<SecretMeta>> {
            Ok(Vec::new())
        }

        async fn get_secret_value(
            &self,
            _vault_name: &str,
            _secret_name: &str,
        ) -> FetchResult<SecretValue> {
            Ok(SecretValue {
                value: String::new(),
                content_type: None,
            })
        }

        async fn set_secret(
            &self,
            _vault_name: &str,
            _secret_name: &str,
            _value: &SecretValue,
        ) -> FetchResult<()> {
            Ok(())
        }

        async fn delete_secret(&self, _vault_name: &str, _secret_name: &str) -> FetchResult<()> {
            Ok(())
        }
    }

    fn fetcher_over(source: Arc<SlowSource>) -> SecretFetcher {
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let cache = Arc::new(ResourceCache::new(clock as Arc<dyn Clock>));
        SecretFetcher::new(cache, source)
    }

    fn sub_ids(n: u128) -> Vec<SubscriptionId> {
        (1..=n).map(|i| SubscriptionId::new(Uuid::from_u128(i))).collect()
    }

    async fn drain(mut rx: mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_reaches_total() {
        let source = Arc::new(SlowSource::new(2));
        let fetcher = fetcher_over(source.clone());
        let loader = BulkLoader::new(3);
        let (tx, rx) = mpsc::channel(32);

        loader
            .warm_vault_lists(&fetcher, sub_ids(5), tx, CancelFlag::new())
            .await;
        let events = drain(rx).await;

        assert_eq!(events.len(), 5);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.completed, i + 1);
            assert_eq!(event.total, 5);
            assert!(event.error.is_none());
        }
        assert!(events.last().unwrap().is_final());
        assert_eq!(source.vault_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_second_run_over_cached_set_fetches_nothing() {
        let source = Arc::new(SlowSource::new(0));
        let fetcher = fetcher_over(source.clone());
        let loader = BulkLoader::new(3);

        let (tx, rx) = mpsc::channel(32);
        loader
            .warm_vault_lists(&fetcher, sub_ids(4), tx, CancelFlag::new())
            .await;
        drain(rx).await;
        assert_eq!(source.vault_calls.load(Ordering::SeqCst), 4);

        let (tx, rx) = mpsc::channel(32);
        loader
            .warm_vault_lists(&fetcher, sub_ids(4), tx, CancelFlag::new())
            .await;
        let events = drain(rx).await;

        // No remote calls, and completion still reported exactly once.
        assert_eq!(source.vault_calls.load(Ordering::SeqCst), 4);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_final());
        assert_eq!(events[0].total, 0);
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let source = Arc::new(SlowSource::new(10));
        let fetcher = fetcher_over(source.clone());
        let loader = BulkLoader::new(2);
        let (tx, rx) = mpsc::channel(32);

        loader
            .warm_vault_lists(&fetcher, sub_ids(6), tx, CancelFlag::new())
            .await;
        drain(rx).await;

        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_cancel_before_start_skips_everything() {
        let source = Arc::new(SlowSource::new(0));
        let fetcher = fetcher_over(source.clone());
        let loader = BulkLoader::new(2);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let (tx, rx) = mpsc::channel(32);
        loader.warm_vault_lists(&fetcher, sub_ids(5), tx, cancel).await;
        let events = drain(rx).await;

        assert_eq!(source.vault_calls.load(Ordering::SeqCst), 0);
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_run_lets_started_fetch_finish() {
        let cancel = CancelFlag::new();
        let mut inner = SlowSource::new(0);
        inner.cancel_after_first = Some(cancel.clone());
        let source = Arc::new(inner);
        let fetcher = fetcher_over(source.clone());
        // Sequential, so the first fetch cancels the rest before they start.
        let loader = BulkLoader::new(1);

        let (tx, rx) = mpsc::channel(32);
        loader.warm_vault_lists(&fetcher, sub_ids(3), tx, cancel).await;
        let events = drain(rx).await;

        assert_eq!(source.vault_calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.len(), 1);
        // The started fetch ran to completion and populated the cache.
        assert!(fetcher.vaults_cached(SubscriptionId::new(Uuid::from_u128(1))));
    }

    #[tokio::test]
    async fn test_failed_items_report_error_but_do_not_abort() {
        struct FlakySource;

        #[async_trait]
        impl SecretSource for FlakySource {
            async fn list_accounts(&self) -> FetchResult<Vec<Account>> {
                Ok(Vec::new())
            }
            async fn list_subscriptions(
                &self,
                _tenant_id: TenantId,
            ) -> FetchResult<Vec<Subscription>> {
                Ok(Vec::new())
            }
            async fn list_vaults(
                &self,
                subscription_id: SubscriptionId,
            ) -> FetchResult<Vec<Vault>> {
                if subscription_id == SubscriptionId::new(Uuid::from_u128(2)) {
                    return Err(vaultscope_core::FetchError::transient("boom"));
                }
                Ok(Vec::new())
            }
            async fn list_secrets(&self, _vault_name: &str) -> FetchResult<Vec<SecretMeta>> {
                Ok(Vec::new())
            }
            async fn get_secret_value(
                &self,
                _vault_name: &str,
                _secret_name: &str,
            ) -> FetchResult<SecretValue> {
                Err(vaultscope_core::FetchError::transient("unused"))
            }
            async fn set_secret(
                &self,
                _vault_name: &str,
                _secret_name: &str,
                _value: &SecretValue,
            ) -> FetchResult<()> {
                Ok(())
            }
            async fn delete_secret(
                &self,
                _vault_name: &str,
                _secret_name: &str,
            ) -> FetchResult<()> {
                Ok(())
            }
        }

        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let cache = Arc::new(ResourceCache::new(clock as Arc<dyn Clock>));
        let fetcher = SecretFetcher::new(cache, Arc::new(FlakySource));
        let loader = BulkLoader::new(2);

        let (tx, rx) = mpsc::channel(32);
        let summary = loader
            .warm_vault_lists(&fetcher, sub_ids(3), tx, CancelFlag::new())
            .await;
        let events = drain(rx).await;

        assert_eq!(events.len(), 3);
        assert_eq!(events.iter().filter(|e| e.error.is_some()).count(), 1);
        assert!(events.last().unwrap().is_final());
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.last_error.is_some());
    }

    /// Vault source for group tests: subscription 2 always fails, the rest
    /// return one vault each, and `fail_all` makes every member fail.
    struct GroupSource {
        fail_all: bool,
    }

    #[async_trait]
    impl SecretSource for GroupSource {
        async fn list_accounts(&self) -> FetchResult<Vec<Account>> {
            Ok(Vec::new())
        }

        async fn list_subscriptions(&self, _tenant_id: TenantId) -> FetchResult<Vec<Subscription>> {
            Ok(Vec::new())
        }

        async fn list_vaults(&self, subscription_id: SubscriptionId) -> FetchResult<Vec<Vault>> {
            if self.fail_all || subscription_id == SubscriptionId::new(Uuid::from_u128(2)) {
                return Err(vaultscope_core::FetchError::transient("listing down"));
            }
            Ok(vec![Vault {
                name: format!("vault-{}", subscription_id),
                subscription_id,
                uri: String::new(),
                location: "westeurope".to_string(),
            }])
        }

        async fn list_secrets(&self, _vault_name: &str) -> FetchResult<Vec<SecretMeta>> {
            Ok(Vec::new())
        }

        async fn get_secret_value(
            &self,
            _vault_name: &str,
            _secret_name: &str,
        ) -> FetchResult<SecretValue> {
            Err(vaultscope_core::FetchError::transient("unused"))
        }

        async fn set_secret(
            &self,
            _vault_name: &str,
            _secret_name: &str,
            _value: &SecretValue,
        ) -> FetchResult<()> {
            Ok(())
        }

        async fn delete_secret(&self, _vault_name: &str, _secret_name: &str) -> FetchResult<()> {
            Ok(())
        }
    }

    fn group_fetcher(fail_all: bool) -> SecretFetcher {
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let cache = Arc::new(ResourceCache::new(clock as Arc<dyn Clock>));
        SecretFetcher::new(cache, Arc::new(GroupSource { fail_all }))
    }

    #[tokio::test]
    async fn test_group_load_fails_when_every_member_fails() {
        let fetcher = group_fetcher(true);
        let loader = BulkLoader::new(2);
        let (tx, rx) = mpsc::channel(32);

        let result = loader
            .load_group_vaults(&fetcher, sub_ids(3), tx, CancelFlag::new())
            .await;
        let events = drain(rx).await;

        // All members down is an error, not an empty listing.
        assert!(result.is_err());
        assert_eq!(events.iter().filter(|e| e.error.is_some()).count(), 3);
    }

    #[tokio::test]
    async fn test_group_load_merges_surviving_members_on_partial_failure() {
        let fetcher = group_fetcher(false);
        let loader = BulkLoader::new(2);
        let (tx, rx) = mpsc::channel(32);

        let fetched = loader
            .load_group_vaults(&fetcher, sub_ids(3), tx, CancelFlag::new())
            .await
            .unwrap();
        drain(rx).await;

        assert_eq!(fetched.origin, crate::fetch::Origin::Remote);
        let names: Vec<&str> = fetched.value.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
        assert!(!names
            .iter()
            .any(|n| n.ends_with(&Uuid::from_u128(2).to_string())));
    }

    #[tokio::test]
    async fn test_group_load_reports_cache_origin_when_fully_warm() {
        let fetcher = group_fetcher(false);
        let loader = BulkLoader::new(2);
        let members = vec![
            SubscriptionId::new(Uuid::from_u128(1)),
            SubscriptionId::new(Uuid::from_u128(3)),
        ];

        let (tx, rx) = mpsc::channel(32);
        loader
            .load_group_vaults(&fetcher, members.clone(), tx, CancelFlag::new())
            .await
            .unwrap();
        drain(rx).await;

        let (tx, rx) = mpsc::channel(32);
        let fetched = loader
            .load_group_vaults(&fetcher, members, tx, CancelFlag::new())
            .await
            .unwrap();
        let events = drain(rx).await;

        assert_eq!(fetched.origin, crate::fetch::Origin::Cache);
        assert_eq!(fetched.value.len(), 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].total, 0);
    }
}
