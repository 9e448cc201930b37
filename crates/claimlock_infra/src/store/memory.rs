//! In-process claim store with TTL-expiring markers.
//!
//! Insert-if-absent is atomic under the store mutex, which only serializes
//! callers inside this process. Suitable for tests and single-node
//! deployments; multi-process deployments need a shared backend
//! (see [`crate::store::redis`]).
//!
//! Expired markers are treated as absent and replaced on the next claim;
//! nothing deletes a live marker early.
//!
//! Time is injected via `_at` suffixed methods for deterministic testing.
//! The [`ClaimStore`] impl uses the wall clock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use claimlock_core::guard::{ClaimOutcome, ClaimStore, StoreUnavailable};

// ─── Stats ──────────────────────────────────────────────────────────────

/// Counter snapshot for the memory store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStoreStats {
    /// Successful first claims, including reclaims of expired markers.
    pub claims_total: u64,
    /// Claims rejected because a live marker existed.
    pub duplicates_total: u64,
    /// Claims that replaced an expired marker.
    pub expired_reclaims_total: u64,
}

// ─── Store ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryState {
    /// Marker key → expiry deadline in epoch milliseconds.
    markers: HashMap<String, u64>,
    stats: MemoryStoreStats,
}

/// Mutex-guarded in-process claim store.
#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    state: Mutex<MemoryState>,
}

impl MemoryClaimStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic claim attempt at an explicit instant.
    ///
    /// A marker whose deadline is at or before `now_ms` is expired and
    /// treated as absent.
    pub fn try_claim_at(&self, key: &str, ttl: Duration, now_ms: u64) -> ClaimOutcome {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let deadline = now_ms.saturating_add(ttl_ms);

        let mut state = self.state.lock().expect("memory claim store mutex poisoned");
        match state.markers.get(key) {
            Some(&existing) if now_ms < existing => {
                state.stats.duplicates_total += 1;
                ClaimOutcome::Duplicate
            }
            Some(_) => {
                state.stats.expired_reclaims_total += 1;
                state.stats.claims_total += 1;
                state.markers.insert(key.to_string(), deadline);
                ClaimOutcome::Claimed
            }
            None => {
                state.stats.claims_total += 1;
                state.markers.insert(key.to_string(), deadline);
                ClaimOutcome::Claimed
            }
        }
    }

    /// Whether a live (unexpired) marker exists for `key` at `now_ms`.
    pub fn contains_at(&self, key: &str, now_ms: u64) -> bool {
        self.state
            .lock()
            .expect("memory claim store mutex poisoned")
            .markers
            .get(key)
            .is_some_and(|&deadline| now_ms < deadline)
    }

    /// Drop expired markers, returning how many were removed.
    ///
    /// Purely a memory-reclaim helper; claim correctness never depends on
    /// it because expired markers already read as absent.
    pub fn purge_expired_at(&self, now_ms: u64) -> usize {
        let mut state = self.state.lock().expect("memory claim store mutex poisoned");
        let before = state.markers.len();
        state.markers.retain(|_, &mut deadline| now_ms < deadline);
        before - state.markers.len()
    }

    /// Number of markers currently held, live or expired.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .expect("memory claim store mutex poisoned")
            .markers
            .len()
    }

    /// Whether the store holds no markers at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counter snapshot.
    pub fn stats(&self) -> MemoryStoreStats {
        self.state
            .lock()
            .expect("memory claim store mutex poisoned")
            .stats
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

impl ClaimStore for MemoryClaimStore {
    fn try_claim(&self, key: &str, ttl: Duration) -> Result<ClaimOutcome, StoreUnavailable> {
        Ok(self.try_claim_at(key, ttl, wall_clock_ms()))
    }
}
