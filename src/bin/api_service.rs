use anyhow::Result;
use index_monitor::{
    cache::SeriesCache, config::Config, database::Database, index::IndexPolicy,
    services::ApiService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("🔧 starting API service...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    let database = Arc::new(Database::new(pool));
    database.create_tables().await?;
    info!("Database connected and tables created");

    let cache = Arc::new(SeriesCache::new(Duration::from_secs(config.jobs.cache_ttl)));
    let policies = Arc::new(IndexPolicy::builtin());

    let api_service = ApiService::new(config, database, cache, policies);
    api_service.start().await?;

    Ok(())
}
