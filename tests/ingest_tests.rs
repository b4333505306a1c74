//! Bulk ingestion against the in-memory store

mod common;

use std::collections::HashSet;

use common::{create_engine, MemoryStore, Script, CREATE_CHARGE};
use docbench::metrics::aggregate_run;
use docbench::BenchError;

#[tokio::test]
async fn test_zero_count_makes_no_calls() {
    let store = MemoryStore::new(Script::AcceptAll);
    let mut engine = create_engine(store.clone(), 5);

    let run = engine.insert(0, 100).await.unwrap();

    assert_eq!(run.requested, 0);
    assert_eq!(run.successes, 0);
    assert_eq!(run.request_charge, 0.0);
    assert_eq!(run.elapsed_ms, 0);
    assert!(run.batches.is_empty());
    assert_eq!(store.create_calls(), 0);
    assert_eq!(store.count_calls(), 0);
}

#[tokio::test]
async fn test_limit_above_total_is_one_batch() {
    let store = MemoryStore::new(Script::AcceptAll);
    let mut engine = create_engine(store.clone(), 5);

    let run = engine.insert(25, 5000).await.unwrap();

    assert_eq!(run.batches.len(), 1);
    assert_eq!(run.batches[0].batch_size, 25);
    assert_eq!(run.successes, 25);
    assert_eq!(run.generations, 1);
    assert_eq!(store.stored(), 25);
}

#[tokio::test]
async fn test_batches_follow_limit() {
    let store = MemoryStore::new(Script::AcceptAll);
    let mut engine = create_engine(store.clone(), 5);

    let run = engine.insert(45, 20).await.unwrap();

    let sizes: Vec<usize> = run.batches.iter().map(|b| b.batch_size).collect();
    assert_eq!(sizes, vec![20, 20, 5]);
    assert_eq!(run.successes, 45);
    assert_eq!(run.request_charge, 45.0 * CREATE_CHARGE);
}

#[tokio::test]
async fn test_in_flight_never_exceeds_limit() {
    let store = MemoryStore::new(Script::AcceptAll);
    let mut engine = create_engine(store.clone(), 5);

    engine.insert(30, 8).await.unwrap();

    assert_eq!(store.max_in_flight(), 8);
}

#[tokio::test]
async fn test_shortfall_retried_with_fresh_documents() {
    let store = MemoryStore::new(Script::FailFirst(7));
    let mut engine = create_engine(store.clone(), 5);

    let run = engine.insert(20, 10).await.unwrap();

    assert!(run.is_complete());
    assert_eq!(run.successes, 20);
    assert_eq!(run.generations, 2);
    assert_eq!(run.attempted(), 27);
    assert_eq!(store.create_calls(), 27);
    assert_eq!(store.stored(), 20);

    // Retry generation is sized by the shortfall only
    let retry: Vec<usize> = run
        .batches
        .iter()
        .filter(|b| b.generation == 1)
        .map(|b| b.batch_size)
        .collect();
    assert_eq!(retry, vec![7]);
}

#[tokio::test]
async fn test_all_failures_stop_at_generation_cap() {
    let store = MemoryStore::new(Script::FailAlways);
    let mut engine = create_engine(store.clone(), 3);

    let run = engine.insert(12, 5).await.unwrap();

    assert_eq!(run.successes, 0);
    assert_eq!(run.shortfall(), 12);
    assert_eq!(run.generations, 3);
    assert_eq!(run.request_charge, 0.0);
    // Each generation retries the full amount
    assert_eq!(store.create_calls(), 36);
    assert!(run.batches.iter().all(|b| b.successes == 0));
}

#[tokio::test]
async fn test_successes_never_exceed_request() {
    for (total, limit) in [(1, 1), (13, 4), (50, 7), (64, 64)] {
        let store = MemoryStore::new(Script::FailEvery(3));
        let mut engine = create_engine(store.clone(), 10);

        let run = engine.insert(total, limit).await.unwrap();

        assert!(run.successes <= total);
        assert_eq!(run.successes, total);
        assert_eq!(store.stored(), total);
    }
}

#[tokio::test]
async fn test_run_totals_are_sum_of_batches() {
    let store = MemoryStore::new(Script::FailEvery(4));
    let mut engine = create_engine(store.clone(), 6);

    let run = engine.insert(40, 9).await.unwrap();

    let charge: f64 = run.batches.iter().map(|b| b.request_charge).sum();
    let elapsed: u64 = run.batches.iter().map(|b| b.elapsed_ms).sum();
    let successes: usize = run.batches.iter().map(|b| b.successes).sum();
    assert_eq!(run.request_charge, charge);
    assert_eq!(run.elapsed_ms, elapsed);
    assert_eq!(run.successes, successes);
    assert_eq!(aggregate_run(run.requested, &run.batches), run);
}

#[tokio::test]
async fn test_generated_ids_do_not_collide() {
    let store = MemoryStore::new(Script::AcceptAll);
    let mut engine = create_engine(store.clone(), 1);

    engine.insert(300, 100).await.unwrap();
    engine.insert(300, 100).await.unwrap();

    let ids: HashSet<String> = store.ids().into_iter().collect();
    assert_eq!(ids.len(), 600);
}

#[tokio::test]
async fn test_zero_limit_rejected() {
    let store = MemoryStore::new(Script::AcceptAll);
    let mut engine = create_engine(store.clone(), 5);

    let result = engine.insert(10, 0).await;

    assert!(matches!(result, Err(BenchError::InvalidArgument(_))));
    assert_eq!(store.create_calls(), 0);
}
