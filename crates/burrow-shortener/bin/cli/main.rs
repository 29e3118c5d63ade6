mod cli;

use crate::cli::{CacheBackendArg, Command, StorageBackendArg, CLI};
use anyhow::Context;
use burrow_cache::{LayeredCache, MokaCache, MokaCacheConfig, NoopCache, RedisCache};
use burrow_core::{Cache, OriginalUrl, Repository, ShortCode, Shortener};
use burrow_generator::RandomGenerator;
use burrow_shortener::{ServiceSettings, ShortenerService};
use burrow_storage::{
    CacheSettings, CachedRepository, InMemoryRepository, PostgresRepository, SqliteRepository,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

type CliRepository = CachedRepository<Arc<dyn Repository>, Arc<dyn Cache>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    burrow_telemetry::init(config.log_format.into())?;

    info!(
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        operation_timeout_ms = config.operation_timeout_ms,
        "starting burrow"
    );

    match &config.command {
        Command::Migrate => migrate(&config).await,
        Command::Shorten { urls } => {
            let service = build_service(&config).await?;
            for input in urls {
                let original = OriginalUrl::parse(input)?;
                let code = service
                    .shorten(&original)
                    .await
                    .with_context(|| format!("failed to shorten {original}"))?;
                let short = match &config.base_url {
                    Some(base_url) => code.to_url(base_url),
                    None => code.to_string(),
                };
                println!("{short}\t{original}");
            }
            service.repository().flush().await;
            Ok(())
        }
        Command::Resolve { codes } => {
            let service = build_service(&config).await?;
            for input in codes {
                let code = ShortCode::new(input)?;
                let original = service
                    .resolve(&code)
                    .await
                    .with_context(|| format!("failed to resolve {code}"))?;
                println!("{code}\t{original}");
            }
            service.repository().flush().await;
            Ok(())
        }
    }
}

async fn build_service(
    config: &CLI,
) -> anyhow::Result<ShortenerService<CliRepository, RandomGenerator>> {
    let durable = open_storage(config).await?;
    let cache = open_cache(config).await?;
    let cache_settings = CacheSettings {
        ttl: config.cache_ttl_secs.map(Duration::from_secs),
        read_timeout: Duration::from_millis(config.cache_read_timeout_ms),
        write_timeout: Duration::from_millis(config.cache_write_timeout_ms),
    };
    let repository = CachedRepository::with_settings(durable, cache, cache_settings);

    let settings = ServiceSettings::builder()
        .operation_timeout(Duration::from_millis(config.operation_timeout_ms))
        .build();
    Ok(ShortenerService::with_settings(
        repository,
        RandomGenerator::new(),
        settings,
    ))
}

fn database_url(config: &CLI) -> anyhow::Result<&str> {
    config
        .database_url
        .as_deref()
        .with_context(|| format!("--database-url is required for {} storage", config.storage))
}

async fn migrate(config: &CLI) -> anyhow::Result<()> {
    match config.storage {
        StorageBackendArg::InMemory => {
            info!("in-memory storage has no schema, nothing to migrate");
        }
        StorageBackendArg::Sqlite => {
            SqliteRepository::connect(database_url(config)?)
                .await?
                .migrate()
                .await?;
            info!("sqlite schema migrated");
        }
        StorageBackendArg::Postgres => {
            PostgresRepository::connect(database_url(config)?)
                .await?
                .migrate()
                .await?;
            info!("postgres schema migrated");
        }
    }
    Ok(())
}

async fn open_storage(config: &CLI) -> anyhow::Result<Arc<dyn Repository>> {
    let repository: Arc<dyn Repository> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(match config.partitions {
            Some(partitions) => InMemoryRepository::with_partitions(partitions),
            None => InMemoryRepository::new(),
        }),
        StorageBackendArg::Sqlite => {
            Arc::new(SqliteRepository::connect(database_url(config)?).await?)
        }
        StorageBackendArg::Postgres => {
            Arc::new(PostgresRepository::connect(database_url(config)?).await?)
        }
    };
    Ok(repository)
}

fn moka_cache(config: &CLI) -> MokaCache {
    MokaCacheConfig::builder()
        .max_capacity(config.cache_capacity)
        .build()
        .into()
}

async fn redis_cache(config: &CLI) -> anyhow::Result<RedisCache> {
    let redis_url = config
        .redis_url
        .as_deref()
        .with_context(|| format!("--redis-url is required for the {} cache", config.cache))?;
    Ok(RedisCache::connect(redis_url).await?)
}

async fn open_cache(config: &CLI) -> anyhow::Result<Arc<dyn Cache>> {
    let cache: Arc<dyn Cache> = match config.cache {
        CacheBackendArg::None => Arc::new(NoopCache),
        CacheBackendArg::Memory => Arc::new(moka_cache(config)),
        CacheBackendArg::Redis => Arc::new(redis_cache(config).await?),
        CacheBackendArg::Layered => {
            let layered = LayeredCache::new(moka_cache(config), redis_cache(config).await?);
            match config.cache_ttl_secs {
                Some(secs) => Arc::new(layered.with_backfill_ttl(Duration::from_secs(secs))),
                None => Arc::new(layered),
            }
        }
    };
    Ok(cache)
}
