//! Helpers shared by the relational repositories.

use burrow_core::repository::Result;
use burrow_core::{ShortCode, StorageError};

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

/// Maps the outcome of the get-or-create upsert.
///
/// The upsert resolves conflicts on the original link, so the only unique
/// violation it can still raise is on the short code.
pub(crate) fn upsert_outcome(
    outcome: std::result::Result<String, sqlx::Error>,
    candidate: &ShortCode,
) -> Result<ShortCode> {
    match outcome {
        Ok(raw) => decode_code(raw),
        Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(candidate.clone())),
        Err(err) => Err(map_sqlx_error(err)),
    }
}

pub(crate) fn decode_code(raw: String) -> Result<ShortCode> {
    ShortCode::new(raw.trim_end())
        .map_err(|e| StorageError::InvalidData(format!("stored short code: {e}")))
}
