//! Vaultscope cache engine.
//!
//! This crate carries the concurrency-sensitive core of the tool: the
//! time-to-live resource cache, the per-tenant credential token cache, the
//! cache-aside fetchers wrapping the remote secret source, and the
//! bounded-parallelism bulk loader used to warm the cache for many
//! subscriptions at once. The TUI layers selection handling on top; nothing
//! in here touches terminal or view state.

pub mod bulk;
pub mod clock;
pub mod fetch;
pub mod keys;
pub mod source;
pub mod token;
pub mod ttl;

pub use bulk::{BulkLoader, BulkSummary, CancelFlag, ProgressEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use fetch::{CachedValue, Fetched, Origin, ResourceCache, SecretFetcher};
pub use source::SecretSource;
pub use token::{Token, TokenCache, TokenIssuer};
pub use ttl::TtlCache;
