use std::collections::HashSet;
use std::sync::Arc;

use burrow_cache::{MokaCache, NoopCache};
use burrow_core::{OriginalUrl, Repository, ShortCode, Shortener, ShortenerError};
use burrow_generator::RandomGenerator;
use burrow_shortener::ShortenerService;
use burrow_storage::{CachedRepository, InMemoryRepository, SqliteRepository};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn url(s: &str) -> OriginalUrl {
    OriginalUrl::parse(s).unwrap()
}

fn seeded(seed: u64) -> RandomGenerator<StdRng> {
    RandomGenerator::with_rng(StdRng::seed_from_u64(seed))
}

async fn links_rows(repo: &SqliteRepository) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links")
        .fetch_one(repo.pool())
        .await
        .unwrap()
}

/// Runs the same sequence of calls and records every outcome.
async fn transcript<S: Shortener>(service: &S) -> Vec<String> {
    let mut out = Vec::new();

    for page in ["a", "b", "a", "c", "b"] {
        let original = url(&format!("https://example.com/{page}"));
        let code = service.shorten(&original).await.unwrap();
        out.push(format!("shorten {original} -> {code}"));

        let resolved = service.resolve(&code).await.unwrap();
        out.push(format!("resolve {code} -> {resolved}"));
    }

    match service.resolve(&ShortCode::new("0000000000").unwrap()).await {
        Err(ShortenerError::OriginalNotFound(code)) => out.push(format!("resolve {code} -> not found")),
        other => panic!("unexpected outcome {other:?}"),
    }

    out
}

#[tokio::test]
async fn sqlite_round_trip_and_idempotence() {
    let repo = SqliteRepository::in_memory().await.unwrap();
    let service = ShortenerService::new(repo, RandomGenerator::new());
    let original = url("example.com/docs");

    let code = service.shorten(&original).await.unwrap();
    assert_eq!(original.as_str(), "https://example.com/docs");
    assert_eq!(service.shorten(&original).await.unwrap(), code);
    assert_eq!(service.resolve(&code).await.unwrap(), original);
    assert_eq!(links_rows(service.repository()).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_shorten_on_sqlite_persists_one_row() {
    let repo = SqliteRepository::in_memory().await.unwrap();
    let service = Arc::new(ShortenerService::new(repo, RandomGenerator::new()));
    let original = url("https://example.com/race");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&service);
            let original = original.clone();
            tokio::spawn(async move { service.shorten(&original).await })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        codes.insert(handle.await.unwrap().unwrap());
    }

    assert_eq!(codes.len(), 1);
    assert_eq!(links_rows(service.repository()).await, 1);
}

#[tokio::test]
async fn disabling_the_cache_changes_no_output() {
    let cached = ShortenerService::new(
        CachedRepository::new(InMemoryRepository::new(), MokaCache::new()),
        seeded(2024),
    );
    let uncached = ShortenerService::new(
        CachedRepository::new(InMemoryRepository::new(), NoopCache),
        seeded(2024),
    );
    let bare = ShortenerService::new(InMemoryRepository::new(), seeded(2024));

    let expected = transcript(&bare).await;
    assert_eq!(transcript(&cached).await, expected);
    assert_eq!(transcript(&uncached).await, expected);
}

#[tokio::test]
async fn in_memory_and_sqlite_agree() {
    let memory = ShortenerService::new(InMemoryRepository::new(), seeded(7));
    let sqlite = ShortenerService::new(SqliteRepository::in_memory().await.unwrap(), seeded(7));

    assert_eq!(transcript(&memory).await, transcript(&sqlite).await);
}

#[tokio::test]
async fn service_works_behind_trait_objects() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let service: Arc<dyn Shortener> = Arc::new(ShortenerService::new(repo, RandomGenerator::new()));
    let original = url("https://example.com/dyn");

    let code = service.shorten(&original).await.unwrap();
    assert_eq!(service.resolve(&code).await.unwrap(), original);
}
