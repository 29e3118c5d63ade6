use std::collections::HashSet;
use std::time::Duration;

use burrow_cache::MokaCache;
use burrow_core::{OriginalUrl, ShortCode};
use burrow_storage::{CachedRepository, PostgresRepository, Repository, StorageError};
use burrow_test_infra::postgres::{PostgresConfig, PostgresServer};
use sqlx::postgres::PgPoolOptions;

struct Fixture {
    _postgres: PostgresServer,
    repo: PostgresRepository,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::new(PostgresConfig::builder().build())
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let pool = connect_with_retry(&url).await;

        let repo = PostgresRepository::new(pool);
        repo.migrate().await.expect("create schema");

        Self {
            _postgres: postgres,
            repo,
        }
    }

    async fn row_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links")
            .fetch_one(self.repo.pool())
            .await
            .unwrap()
    }
}

async fn connect_with_retry(url: &str) -> sqlx::PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(8).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn url(value: &str) -> OriginalUrl {
    OriginalUrl::new_unchecked(value)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn create_and_lookup_both_directions() {
    let fixture = Fixture::start().await;
    let original = url("https://example.com/a");
    let c = code("Ab12Cd34_9");

    let stored = fixture
        .repo
        .create_or_get_shortened(&original, &c)
        .await
        .unwrap();

    assert_eq!(stored, c);
    assert_eq!(
        fixture.repo.get_original_by_shortened(&c).await.unwrap(),
        original
    );
    assert_eq!(
        fixture.repo.get_shortened_by_original(&original).await.unwrap(),
        c
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn upsert_returns_first_committed_code() {
    let fixture = Fixture::start().await;
    let original = url("https://example.com/a");

    fixture
        .repo
        .create_or_get_shortened(&original, &code("Ab12Cd34_9"))
        .await
        .unwrap();
    let stored = fixture
        .repo
        .create_or_get_shortened(&original, &code("Zz98Yy76_0"))
        .await
        .unwrap();

    assert_eq!(stored.as_str(), "Ab12Cd34_9");
    assert_eq!(fixture.row_count().await, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn taken_code_conflicts() {
    let fixture = Fixture::start().await;
    let c = code("Ab12Cd34_9");

    fixture
        .repo
        .create_or_get_shortened(&url("https://one.example"), &c)
        .await
        .unwrap();
    let err = fixture
        .repo
        .create_or_get_shortened(&url("https://two.example"), &c)
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn missing_rows_are_typed_not_found() {
    let fixture = Fixture::start().await;

    assert!(matches!(
        fixture
            .repo
            .get_original_by_shortened(&code("0000000000"))
            .await,
        Err(StorageError::OriginalNotFound(_))
    ));
    assert!(matches!(
        fixture
            .repo
            .get_shortened_by_original(&url("https://example.com"))
            .await,
        Err(StorageError::ShortenedNotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn concurrent_commits_keep_one_row() {
    let fixture = Fixture::start().await;
    let original = url("https://example.com/race");

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let repo = fixture.repo.clone();
            let original = original.clone();
            tokio::spawn(async move {
                repo.create_or_get_shortened(&original, &code(&format!("race{i:06}")))
                    .await
            })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        codes.insert(handle.await.unwrap().unwrap());
    }

    assert_eq!(codes.len(), 1);
    assert_eq!(fixture.row_count().await, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn cached_repository_over_postgres() {
    let fixture = Fixture::start().await;
    let repo = CachedRepository::new(fixture.repo.clone(), MokaCache::new());
    let original = url("https://example.com/a");
    let c = code("Ab12Cd34_9");

    repo.create_or_get_shortened(&original, &c).await.unwrap();

    awaitility::at_most(Duration::from_secs(5))
        .poll_interval(Duration::from_millis(50))
        .until_async(|| async {
            use burrow_core::Cache;
            repo.cache().get("code:Ab12Cd34_9").await.unwrap().is_some()
        })
        .await;

    assert_eq!(repo.get_original_by_shortened(&c).await.unwrap(), original);
}
