//! Atomic claim protocol and the guard wrapper.
//!
//! **Atomicity contract:** a `ClaimStore` implementation must make
//! "if key absent, set it with TTL" a single indivisible operation against
//! the store. A plain existence check followed by a separate set-with-expiry
//! is unsafe under concurrent callers: two of them can both observe "absent"
//! and both proceed. Cross-process serialization is the store's obligation;
//! the guard holds no in-process lock across the store round-trip.
//!
//! **Fail policy:** when the store round-trip fails, fail-closed (reject the
//! call) is the default. Fail-open (allow execution) is an explicit opt-in
//! for deployments where availability outranks duplicate-safety.
//!
//! There is no unclaim path. A marker set for an operation that later fails
//! expires naturally at TTL; fast retries of a failed operation are exactly
//! the duplicate-submission pattern being suppressed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::{GuardDefaults, GuardOverrides, resolve_guard_config};
use crate::error::GuardError;
use crate::key::{CallContext, KeySource, build_claim_key};

/// Sentinel marker value. Only the marker's existence matters.
pub const CLAIM_SENTINEL: &str = "1";

// ─── Claim outcome ──────────────────────────────────────────────────────

/// Result of an atomic claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This call is the first within the TTL window. Caller proceeds.
    Claimed,
    /// A live marker already exists. Caller must abort, not retry or wait.
    Duplicate,
}

// ─── Store protocol ─────────────────────────────────────────────────────

/// Error returned when the store round-trip could not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreUnavailable {
    /// Underlying failure description.
    pub reason: String,
}

impl fmt::Display for StoreUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "claim store unavailable: {}", self.reason)
    }
}

impl std::error::Error for StoreUnavailable {}

/// Atomic conditional-set-with-expiry against a shared key-value store.
///
/// Implementations perform exactly one blocking round-trip per call and
/// must be safe to invoke concurrently from independent clients against the
/// same store.
pub trait ClaimStore: Send + Sync {
    /// Atomically: if `key` is absent, set it with `ttl` and report
    /// `Claimed`; otherwise report `Duplicate`. No interleaving may be
    /// observable between the absence check and the write.
    fn try_claim(&self, key: &str, ttl: Duration) -> Result<ClaimOutcome, StoreUnavailable>;
}

// ─── Store failure policy ───────────────────────────────────────────────

/// What the guard does when the store round-trip fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFailurePolicy {
    /// Reject the call. Degrades availability under store outage but never
    /// silently admits duplicates.
    #[default]
    FailClosed,
    /// Allow the call to execute unguarded. Opt-in only.
    FailOpen,
}

// ─── Metrics ────────────────────────────────────────────────────────────

/// Observability counters for the guard.
#[derive(Debug, Default)]
pub struct GuardMetrics {
    /// `guard_claims_total`: successful first claims.
    claims_total: AtomicU64,
    /// `guard_duplicates_total`: rejected duplicate calls.
    duplicates_total: AtomicU64,
    /// `guard_store_errors_total`: failed store round-trips.
    store_errors_total: AtomicU64,
    /// `guard_fail_open_allows_total`: calls admitted unguarded under
    /// store outage with the fail-open policy.
    fail_open_allows_total: AtomicU64,
}

impl GuardMetrics {
    /// Create a new metrics tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_claim(&self) {
        self.claims_total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duplicate(&self) {
        self.duplicates_total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_store_error(&self) {
        self.store_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_fail_open_allow(&self) {
        self.fail_open_allows_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of `guard_claims_total`.
    pub fn claims_total(&self) -> u64 {
        self.claims_total.load(Ordering::Relaxed)
    }

    /// Current value of `guard_duplicates_total`.
    pub fn duplicates_total(&self) -> u64 {
        self.duplicates_total.load(Ordering::Relaxed)
    }

    /// Current value of `guard_store_errors_total`.
    pub fn store_errors_total(&self) -> u64 {
        self.store_errors_total.load(Ordering::Relaxed)
    }

    /// Current value of `guard_fail_open_allows_total`.
    pub fn fail_open_allows_total(&self) -> u64 {
        self.fail_open_allows_total.load(Ordering::Relaxed)
    }
}

// ─── Guard ──────────────────────────────────────────────────────────────

/// Single-shot "seen-before" marker over a shared claim store.
///
/// Not a distributed lock: no renewal, no reentrancy, no unlock. One claim
/// per key per TTL window, resolved by the store's atomicity guarantee.
pub struct IdempotencyGuard {
    store: Arc<dyn ClaimStore>,
    defaults: GuardDefaults,
    policy: StoreFailurePolicy,
    metrics: GuardMetrics,
}

impl fmt::Debug for IdempotencyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdempotencyGuard")
            .field("defaults", &self.defaults)
            .field("policy", &self.policy)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl IdempotencyGuard {
    /// Create a guard with the fail-closed default policy.
    pub fn new(store: Arc<dyn ClaimStore>, defaults: GuardDefaults) -> Self {
        Self::with_policy(store, defaults, StoreFailurePolicy::FailClosed)
    }

    /// Create a guard with an explicit store-failure policy.
    pub fn with_policy(
        store: Arc<dyn ClaimStore>,
        defaults: GuardDefaults,
        policy: StoreFailurePolicy,
    ) -> Self {
        Self {
            store,
            defaults,
            policy,
            metrics: GuardMetrics::new(),
        }
    }

    /// Observability counters.
    pub fn metrics(&self) -> &GuardMetrics {
        &self.metrics
    }

    /// Process-wide defaults this guard resolves overrides against.
    pub fn defaults(&self) -> &GuardDefaults {
        &self.defaults
    }

    /// Attempt the atomic claim for `key` with the given window.
    ///
    /// `Ok(Claimed)` means this call is the first in the window and may
    /// proceed. `Ok(Duplicate)` means a live marker exists. A store fault
    /// resolves per policy: fail-closed surfaces `StoreUnavailable`,
    /// fail-open admits the call as `Claimed`.
    pub fn try_claim(&self, key: &str, ttl: Duration) -> Result<ClaimOutcome, GuardError> {
        match self.store.try_claim(key, ttl) {
            Ok(ClaimOutcome::Claimed) => {
                self.metrics.record_claim();
                Ok(ClaimOutcome::Claimed)
            }
            Ok(ClaimOutcome::Duplicate) => {
                self.metrics.record_duplicate();
                tracing::debug!("DuplicateClaim key={key} ttl_ms={}", ttl.as_millis());
                Ok(ClaimOutcome::Duplicate)
            }
            Err(err) => {
                self.metrics.record_store_error();
                match self.policy {
                    StoreFailurePolicy::FailClosed => {
                        tracing::warn!("ClaimStoreDown key={key} policy=fail_closed: {err}");
                        Err(GuardError::StoreUnavailable { reason: err.reason })
                    }
                    StoreFailurePolicy::FailOpen => {
                        self.metrics.record_fail_open_allow();
                        tracing::warn!("ClaimStoreDown key={key} policy=fail_open, admitting unguarded: {err}");
                        Ok(ClaimOutcome::Claimed)
                    }
                }
            }
        }
    }

    /// Guard one invocation of `op`.
    ///
    /// Resolves the merged config, builds the claim key, and attempts the
    /// claim. `op` runs only on a successful claim; a duplicate returns
    /// `GuardError::DuplicateRejected` with the resolved message before
    /// `op` executes. `op`'s own output is returned unchanged. A call whose
    /// key cannot be built never reaches the store.
    pub fn protect<T, F>(
        &self,
        overrides: &GuardOverrides,
        source: KeySource<'_>,
        context: &CallContext<'_>,
        op: F,
    ) -> Result<T, GuardError>
    where
        F: FnOnce() -> T,
    {
        let resolved = resolve_guard_config(&self.defaults, overrides)?;
        let key = build_claim_key(&resolved.prefix, source, context)?;
        match self.try_claim(&key, resolved.ttl)? {
            ClaimOutcome::Claimed => Ok(op()),
            ClaimOutcome::Duplicate => Err(GuardError::DuplicateRejected {
                message: resolved.message,
            }),
        }
    }
}
