//! TTL cache for web-search results, backed by the `search_cache` table.
//!
//! Keys are lowercased queries. An entry is readable only while its expiry
//! lies in the future; expired rows are ignored on read and removed by the
//! periodic sweep.

use crate::database::now_ts;
use crate::error::AppError;
use crate::models::SearchHit;
use sqlx::sqlite::SqlitePool;
use tracing::warn;

const SECONDS_PER_HOUR: i64 = 3_600;

/// Cached results for a query, or `None` on miss or expiry.
pub async fn get(pool: &SqlitePool, query: &str) -> Result<Option<Vec<SearchHit>>, AppError> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT results FROM search_cache WHERE query = ? AND expires_at > ?",
    )
    .bind(query.to_lowercase())
    .bind(now_ts())
    .fetch_optional(pool)
    .await?;

    match row {
        Some((serialized,)) => match serde_json::from_str(&serialized) {
            Ok(hits) => Ok(Some(hits)),
            Err(e) => {
                warn!("Discarding unreadable cache entry for {:?}: {}", query, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Store results for a query, replacing any previous entry.
pub async fn put(
    pool: &SqlitePool,
    query: &str,
    results: &[SearchHit],
    ttl_hours: i64,
) -> Result<(), AppError> {
    let now = now_ts();
    let serialized = serde_json::to_string(results)?;

    sqlx::query(
        "INSERT OR REPLACE INTO search_cache (query, results, cached_at, expires_at) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(query.to_lowercase())
    .bind(serialized)
    .bind(now)
    .bind(now + ttl_hours * SECONDS_PER_HOUR)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete every expired entry. Returns the number of rows removed.
pub async fn purge_expired(pool: &SqlitePool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM search_cache WHERE expires_at < ?")
        .bind(now_ts())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
