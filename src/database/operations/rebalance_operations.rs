use crate::error::IndexError;
use crate::types::RebalanceEntry;
use sqlx::types::Json;
use sqlx::PgPool;

pub struct RebalanceOperations;

impl RebalanceOperations {
    pub async fn load_series(
        pool: &PgPool,
        index_name: &str,
    ) -> Result<Vec<RebalanceEntry>, IndexError> {
        let row: Option<Json<Vec<RebalanceEntry>>> = sqlx::query_scalar(
            "SELECT entries FROM index_rebalance_history WHERE index_name = $1",
        )
        .bind(index_name)
        .fetch_optional(pool)
        .await
        .map_err(|e| IndexError::StoreRead(e.to_string()))?;

        Ok(row.map(|Json(entries)| entries).unwrap_or_default())
    }

    pub async fn append_entry(
        pool: &PgPool,
        index_name: &str,
        entry: RebalanceEntry,
    ) -> Result<Vec<RebalanceEntry>, IndexError> {
        let mut series = Self::load_series(pool, index_name).await?;
        series.insert(0, entry);

        sqlx::query(
            r#"
            INSERT INTO index_rebalance_history (index_name, entries, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (index_name)
            DO UPDATE SET entries = EXCLUDED.entries, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(index_name)
        .bind(Json(&series))
        .execute(pool)
        .await
        .map_err(|e| IndexError::StoreWrite(e.to_string()))?;

        Ok(series)
    }
}
