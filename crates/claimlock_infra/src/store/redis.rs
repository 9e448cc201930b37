//! Redis-backed claim store.
//!
//! Uses Redis's native conditional-set-with-expiry:
//! `SET key "1" NX EX ttl` — one command, atomic server-side, safe under
//! concurrent claims from independent processes and hosts. No existence
//! check ever runs separately from the write.
//!
//! One blocking round-trip per claim. A failed round-trip drops the cached
//! connection so the next claim reconnects; the store itself never retries.

use std::sync::Mutex;
use std::time::Duration;

use claimlock_core::guard::{CLAIM_SENTINEL, ClaimOutcome, ClaimStore, StoreUnavailable};

/// Claim store backed by a shared Redis instance.
pub struct RedisClaimStore {
    client: redis::Client,
    /// Lazily established connection, dropped on the first failed command.
    connection: Mutex<Option<redis::Connection>>,
}

impl std::fmt::Debug for RedisClaimStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClaimStore").finish_non_exhaustive()
    }
}

/// Round a TTL to whole seconds for `EX`, clamping sub-second windows up
/// to 1 s rather than down to an instantly-expiring marker.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn store_unavailable(err: &redis::RedisError) -> StoreUnavailable {
    StoreUnavailable {
        reason: err.to_string(),
    }
}

impl RedisClaimStore {
    /// Create a store for the given Redis URL (e.g. `redis://127.0.0.1/`).
    ///
    /// Validates the URL only; the connection is established on the first
    /// claim so a momentarily unreachable store surfaces as
    /// `StoreUnavailable` per claim, not as a startup failure.
    pub fn open(url: &str) -> Result<Self, StoreUnavailable> {
        let client = redis::Client::open(url).map_err(|e| store_unavailable(&e))?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    fn claim_once(
        connection: &mut redis::Connection,
        key: &str,
        ttl_s: u64,
    ) -> redis::RedisResult<ClaimOutcome> {
        // SET ... NX replies OK when the key was set, nil when it existed.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(CLAIM_SENTINEL)
            .arg("NX")
            .arg("EX")
            .arg(ttl_s)
            .query(connection)?;
        Ok(if reply.is_some() {
            ClaimOutcome::Claimed
        } else {
            ClaimOutcome::Duplicate
        })
    }
}

impl ClaimStore for RedisClaimStore {
    fn try_claim(&self, key: &str, ttl: Duration) -> Result<ClaimOutcome, StoreUnavailable> {
        let mut slot = self
            .connection
            .lock()
            .expect("redis claim store mutex poisoned");

        if slot.is_none() {
            let connection = self
                .client
                .get_connection()
                .map_err(|e| store_unavailable(&e))?;
            *slot = Some(connection);
        }
        let connection = slot.as_mut().expect("connection populated above");

        match Self::claim_once(connection, key, ttl_seconds(ttl)) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // Connection state is unknown after a failed command.
                *slot = None;
                Err(store_unavailable(&err))
            }
        }
    }
}
