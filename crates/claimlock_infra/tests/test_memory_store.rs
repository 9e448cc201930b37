//! Tests for the in-process claim store.
//!
//! Mutual exclusion under concurrent claims and window correctness with
//! injected time.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use claimlock_core::guard::{ClaimOutcome, ClaimStore};
use claimlock_infra::store::MemoryClaimStore;

const TTL: Duration = Duration::from_secs(5);

// --- Mutual exclusion ---------------------------------------------------

#[test]
fn test_exactly_one_of_many_concurrent_claims_wins() {
    let store = Arc::new(MemoryClaimStore::new());
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store
                    .try_claim("contended", Duration::from_secs(60))
                    .expect("memory store never reports unavailable")
            })
        })
        .collect();

    let outcomes: Vec<ClaimOutcome> = handles
        .into_iter()
        .map(|h| h.join().expect("claim thread panicked"))
        .collect();

    let winners = outcomes
        .iter()
        .filter(|&&o| o == ClaimOutcome::Claimed)
        .count();
    assert_eq!(winners, 1, "outcomes: {outcomes:?}");
    assert_eq!(store.stats().claims_total, 1);
    assert_eq!(store.stats().duplicates_total, threads as u64 - 1);
}

#[test]
fn test_concurrent_claims_on_distinct_keys_all_win() {
    let store = Arc::new(MemoryClaimStore::new());
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store
                    .try_claim(&format!("key-{i}"), TTL)
                    .expect("memory store never reports unavailable")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ClaimOutcome::Claimed);
    }
    assert_eq!(store.len(), threads);
}

// --- Window correctness -------------------------------------------------

#[test]
fn test_claim_window_rejects_within_ttl_and_reopens_after() {
    let store = MemoryClaimStore::new();

    assert_eq!(store.try_claim_at("k", TTL, 1_000), ClaimOutcome::Claimed);
    // Inside the window.
    assert_eq!(store.try_claim_at("k", TTL, 1_001), ClaimOutcome::Duplicate);
    assert_eq!(store.try_claim_at("k", TTL, 5_999), ClaimOutcome::Duplicate);
    // Past the window.
    assert_eq!(store.try_claim_at("k", TTL, 6_001), ClaimOutcome::Claimed);
    // The reclaim opens a fresh window from its own claim instant.
    assert_eq!(store.try_claim_at("k", TTL, 10_000), ClaimOutcome::Duplicate);
    assert_eq!(store.try_claim_at("k", TTL, 11_002), ClaimOutcome::Claimed);
}

#[test]
fn test_each_override_window_is_honored_independently() {
    let store = MemoryClaimStore::new();
    let short = Duration::from_secs(1);

    assert_eq!(store.try_claim_at("short", short, 0), ClaimOutcome::Claimed);
    assert_eq!(store.try_claim_at("long", TTL, 0), ClaimOutcome::Claimed);

    // At 1.5 s the short marker is gone, the long one still live.
    assert_eq!(store.try_claim_at("short", short, 1_500), ClaimOutcome::Claimed);
    assert_eq!(store.try_claim_at("long", TTL, 1_500), ClaimOutcome::Duplicate);
}

#[test]
fn test_stats_track_reclaims_separately() {
    let store = MemoryClaimStore::new();
    store.try_claim_at("k", TTL, 0);
    store.try_claim_at("k", TTL, 100);
    store.try_claim_at("k", TTL, 6_000);

    let stats = store.stats();
    assert_eq!(stats.claims_total, 2);
    assert_eq!(stats.duplicates_total, 1);
    assert_eq!(stats.expired_reclaims_total, 1);
}

#[test]
fn test_purge_is_cosmetic_for_claim_semantics() {
    let store = MemoryClaimStore::new();
    store.try_claim_at("k", TTL, 0);

    // Whether or not the expired marker was purged, a late claim wins.
    assert_eq!(store.purge_expired_at(4_000), 0);
    assert_eq!(store.purge_expired_at(6_000), 1);
    assert!(store.is_empty());
    assert_eq!(store.try_claim_at("k", TTL, 6_500), ClaimOutcome::Claimed);
}
