pub mod history_operations;
pub mod rebalance_operations;

pub use history_operations::HistoryOperations;
pub use rebalance_operations::RebalanceOperations;

use anyhow::Result;
use sqlx::PgPool;

/// One document row per index variant: the full newest-first series as
/// JSONB, overwritten atomically on every append.
pub async fn create_tables(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_price_history (
            index_name TEXT PRIMARY KEY,
            entries JSONB NOT NULL DEFAULT '[]'::jsonb,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_rebalance_history (
            index_name TEXT PRIMARY KEY,
            entries JSONB NOT NULL DEFAULT '[]'::jsonb,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
