use anyhow::Result;
use index_monitor::{
    cache::SeriesCache,
    config::Config,
    database::Database,
    index::IndexPolicy,
    provider::ProviderClient,
    scheduler::Scheduler,
    services::{IndexService, MarketDataService},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("🔧 starting scheduler service...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    let database = Arc::new(Database::new(pool.clone()));
    database.create_tables().await?;
    info!("Database connected and tables created");

    let provider = Arc::new(ProviderClient::new(&config.provider)?);
    let cache = Arc::new(SeriesCache::new(Duration::from_secs(config.jobs.cache_ttl)));

    let market = Arc::new(MarketDataService::new(
        Arc::clone(&provider),
        Duration::from_secs(config.jobs.market_refresh_interval),
    ));
    let index_service = Arc::new(IndexService::new(
        pool,
        provider,
        cache,
        Arc::clone(&market),
        IndexPolicy::builtin(),
        &config.jobs,
    ));

    let mut scheduler = Scheduler::new();
    market.register_jobs(
        &mut scheduler,
        Duration::from_secs(config.jobs.market_refresh_interval),
    );
    index_service.register_jobs(&mut scheduler, &config.jobs);

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining scheduled jobs...");
    scheduler.shutdown().await;

    Ok(())
}
