use anyhow::Result;
use index_monitor::{
    cache::SeriesCache,
    config::Config,
    database::Database,
    index::IndexPolicy,
    provider::ProviderClient,
    scheduler::Scheduler,
    services::{ApiService, IndexService, MarketDataService},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    // Connect to database
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    let database = Arc::new(Database::new(pool.clone()));
    database.create_tables().await?;
    info!("Database connected and tables created");

    // Shared components
    let provider = Arc::new(ProviderClient::new(&config.provider)?);
    let cache = Arc::new(SeriesCache::new(Duration::from_secs(config.jobs.cache_ttl)));
    let policies = Arc::new(IndexPolicy::builtin());
    let market = Arc::new(MarketDataService::new(
        Arc::clone(&provider),
        Duration::from_secs(config.jobs.market_refresh_interval),
    ));

    // Background aggregation pipeline
    let index_service = Arc::new(IndexService::new(
        pool,
        provider,
        Arc::clone(&cache),
        Arc::clone(&market),
        policies.as_ref().clone(),
        &config.jobs,
    ));

    let mut scheduler = Scheduler::new();
    market.register_jobs(
        &mut scheduler,
        Duration::from_secs(config.jobs.market_refresh_interval),
    );
    index_service.register_jobs(&mut scheduler, &config.jobs);

    // Read API
    let api_service = ApiService::new(config, database, cache, policies);
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api_service.start().await {
            tracing::error!("API service error: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining scheduled jobs...");
    scheduler.shutdown().await;
    api_handle.abort();

    Ok(())
}
