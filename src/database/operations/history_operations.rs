use crate::error::IndexError;
use crate::types::IndexEntry;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

pub struct HistoryOperations;

impl HistoryOperations {
    /// Full series for one index variant, newest-first. A variant that
    /// has never completed a cycle yields an empty series, not an error.
    pub async fn load_series(
        pool: &PgPool,
        index_name: &str,
    ) -> Result<Vec<IndexEntry>, IndexError> {
        let row: Option<Json<Vec<IndexEntry>>> =
            sqlx::query_scalar("SELECT entries FROM index_price_history WHERE index_name = $1")
                .bind(index_name)
                .fetch_optional(pool)
                .await
                .map_err(|e| IndexError::StoreRead(e.to_string()))?;

        Ok(row.map(|Json(entries)| entries).unwrap_or_default())
    }

    /// Prepends the entry and overwrites the document in one statement,
    /// so readers observe the old or the new series, never a torn one.
    /// Returns the new series for the caller's cache overwrite.
    pub async fn append_entry(
        pool: &PgPool,
        index_name: &str,
        entry: IndexEntry,
    ) -> Result<Vec<IndexEntry>, IndexError> {
        let mut series = Self::load_series(pool, index_name).await?;
        series.insert(0, entry);
        Self::store_series(pool, index_name, &series).await?;
        Ok(series)
    }

    /// Drops entries older than the retention cutoff. Returns how many
    /// were removed.
    pub async fn prune_older_than(
        pool: &PgPool,
        index_name: &str,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> Result<usize, IndexError> {
        let series = Self::load_series(pool, index_name).await?;
        let cutoff = now - chrono::Duration::days(retention_days);

        let retained: Vec<IndexEntry> = series
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .cloned()
            .collect();

        let dropped = series.len() - retained.len();
        if dropped > 0 {
            Self::store_series(pool, index_name, &retained).await?;
        }
        Ok(dropped)
    }

    async fn store_series(
        pool: &PgPool,
        index_name: &str,
        series: &[IndexEntry],
    ) -> Result<(), IndexError> {
        sqlx::query(
            r#"
            INSERT INTO index_price_history (index_name, entries, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (index_name)
            DO UPDATE SET entries = EXCLUDED.entries, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(index_name)
        .bind(Json(series))
        .execute(pool)
        .await
        .map_err(|e| IndexError::StoreWrite(e.to_string()))?;

        Ok(())
    }
}
