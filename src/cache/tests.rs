// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::model::{SessionTree, WorkoutId};

use super::{CacheSource, Fingerprint, SuggestionCache};

const TTL: Duration = Duration::from_secs(300);

fn fp(intention: &str) -> Fingerprint {
    Fingerprint::of(WorkoutId::new(1), Some(intention), &SessionTree::new())
}

fn session() -> WorkoutId {
    WorkoutId::new(1)
}

async fn counted(
    cache: &SuggestionCache<Vec<String>, String>,
    fingerprint: Fingerprint,
    calls: &AtomicUsize,
) -> Result<super::Cached<Vec<String>>, String> {
    cache
        .get_or_compute(session(), fingerprint, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["add a set".to_owned()])
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn hit_within_ttl_shares_payload() {
    let cache = SuggestionCache::new(TTL);
    let calls = AtomicUsize::new(0);

    let first = counted(&cache, fp("a"), &calls).await.expect("first");
    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    let second = counted(&cache, fp("a"), &calls).await.expect("second");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.source, CacheSource::Computed);
    assert_eq!(second.source, CacheSource::Hit);
    assert!(Arc::ptr_eq(&first.payload, &second.payload));
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_recomputed() {
    let cache = SuggestionCache::new(TTL);
    let calls = AtomicUsize::new(0);

    counted(&cache, fp("a"), &calls).await.expect("first");
    tokio::time::advance(TTL).await;
    let again = counted(&cache, fp("a"), &calls).await.expect("again");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(again.source, CacheSource::Computed);
}

#[tokio::test(start_paused = true)]
async fn new_fingerprint_evicts_previous_entry() {
    let cache = SuggestionCache::new(TTL);
    let calls = AtomicUsize::new(0);

    counted(&cache, fp("a"), &calls).await.expect("a");
    counted(&cache, fp("b"), &calls).await.expect("b");
    let back = counted(&cache, fp("a"), &calls).await.expect("a again");

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(back.source, CacheSource::Computed);
    assert_eq!(cache.peek(session()).map(|(fingerprint, _)| fingerprint), Some(fp("a")));
}

#[tokio::test(start_paused = true)]
async fn errors_are_not_cached() {
    let cache: SuggestionCache<Vec<String>, String> = SuggestionCache::new(TTL);

    let err = cache
        .get_or_compute(session(), fp("a"), || async { Err("engine down".to_owned()) })
        .await
        .expect_err("failure");
    assert_eq!(err, "engine down");
    assert!(cache.peek(session()).is_none());

    let calls = AtomicUsize::new(0);
    let ok = counted(&cache, fp("a"), &calls).await.expect("retry");
    assert_eq!(ok.source, CacheSource::Computed);
    assert_eq!(cache.stats().failures, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_share_one_computation() {
    let cache: SuggestionCache<Vec<String>, String> = SuggestionCache::new(TTL);
    let calls = AtomicUsize::new(0);
    let counter = &calls;

    let compute = || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(vec!["go heavier".to_owned()])
    };
    let (a, b) = tokio::join!(
        cache.get_or_compute(session(), fp("a"), compute),
        cache.get_or_compute(session(), fp("a"), compute),
    );
    let (a, b) = (a.expect("a"), b.expect("b"));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a.payload, &b.payload));
    assert_eq!(b.source, CacheSource::Joined);
    assert_eq!(cache.stats().joins, 1);
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_compute_discards_result() {
    let cache: SuggestionCache<Vec<String>, String> = SuggestionCache::new(TTL);

    let slow = cache.get_or_compute(session(), fp("a"), || async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec!["stale".to_owned()])
    });
    let mutate = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cache.invalidate(session())
    };
    let (result, generation) = tokio::join!(slow, mutate);

    let result = result.expect("waiter still answered");
    assert_eq!(*result.payload, vec!["stale".to_owned()]);
    assert_eq!(generation, 1);
    assert!(cache.peek(session()).is_none());
    assert_eq!(cache.stats().stale_discarded, 1);

    let calls = AtomicUsize::new(0);
    counted(&cache, fp("a"), &calls).await.expect("fresh");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_generation_is_never_stored() {
    let cache: SuggestionCache<Vec<String>, String> = SuggestionCache::new(TTL);
    cache.invalidate(session());

    cache
        .get_or_compute_at(session(), fp("a"), 0, || async { Ok(vec!["old view".to_owned()]) })
        .await
        .expect("computed");

    assert!(cache.peek(session()).is_none());
}

#[tokio::test(start_paused = true)]
async fn sweep_drops_expired_entries_only() {
    let cache: SuggestionCache<Vec<String>, String> = SuggestionCache::new(TTL);
    let calls = AtomicUsize::new(0);
    counted(&cache, fp("a"), &calls).await.expect("a");
    cache
        .get_or_compute(WorkoutId::new(2), fp("b"), || async { Ok(Vec::new()) })
        .await
        .expect("b");

    assert_eq!(cache.sweep_expired(), 0);
    tokio::time::advance(TTL).await;
    assert_eq!(cache.sweep_expired(), 2);
}
