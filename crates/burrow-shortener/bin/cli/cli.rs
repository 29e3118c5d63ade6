use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "BURROW_DATABASE_URL";
pub const PARTITIONS_ENV: &str = "BURROW_PARTITIONS";
pub const CACHE_BACKEND_ENV: &str = "BURROW_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "BURROW_REDIS_URL";
pub const CACHE_TTL_SECS_ENV: &str = "BURROW_CACHE_TTL_SECS";
pub const CACHE_READ_TIMEOUT_MS_ENV: &str = "BURROW_CACHE_READ_TIMEOUT_MS";
pub const CACHE_WRITE_TIMEOUT_MS_ENV: &str = "BURROW_CACHE_WRITE_TIMEOUT_MS";
pub const CACHE_CAPACITY_ENV: &str = "BURROW_CACHE_CAPACITY";
pub const OPERATION_TIMEOUT_MS_ENV: &str = "BURROW_OPERATION_TIMEOUT_MS";
pub const BASE_URL_ENV: &str = "BURROW_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

pub const DEFAULT_CACHE_READ_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_CACHE_WRITE_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "none")]
    None,
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
    /// In-process cache in front of Redis.
    #[value(name = "layered")]
    Layered,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::None => write!(f, "none"),
            CacheBackendArg::Memory => write!(f, "memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for burrow_telemetry::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => burrow_telemetry::LogFormat::Text,
            LogFormatArg::Json => burrow_telemetry::LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "burrow", version, about = "Shorten URLs and resolve short codes")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(
        long,
        env = DATABASE_URL_ENV,
        required_if_eq_any([("storage", "sqlite"), ("storage", "postgres")])
    )]
    pub database_url: Option<String>,

    /// Partition count of the in-memory store (default: two per CPU).
    #[arg(long, env = PARTITIONS_ENV)]
    pub partitions: Option<usize>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::None
    )]
    pub cache: CacheBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    #[arg(long, env = CACHE_TTL_SECS_ENV)]
    pub cache_ttl_secs: Option<u64>,

    #[arg(
        long,
        env = CACHE_READ_TIMEOUT_MS_ENV,
        default_value_t = DEFAULT_CACHE_READ_TIMEOUT_MS
    )]
    pub cache_read_timeout_ms: u64,

    #[arg(
        long,
        env = CACHE_WRITE_TIMEOUT_MS_ENV,
        default_value_t = DEFAULT_CACHE_WRITE_TIMEOUT_MS
    )]
    pub cache_write_timeout_ms: u64,

    #[arg(
        long,
        env = CACHE_CAPACITY_ENV,
        default_value_t = DEFAULT_CACHE_CAPACITY
    )]
    pub cache_capacity: u64,

    #[arg(
        long,
        env = OPERATION_TIMEOUT_MS_ENV,
        default_value_t = DEFAULT_OPERATION_TIMEOUT_MS
    )]
    pub operation_timeout_ms: u64,

    /// Prints full short links under this base instead of bare codes.
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prints the short code of each URL, creating codes on first use.
    Shorten {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Prints the original URL of each short code.
    Resolve {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Creates the `links` table of the relational backends.
    Migrate,
}
