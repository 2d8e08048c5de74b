use crate::error::IndexError;
use crate::provider::ProviderClient;
use crate::scheduler::Scheduler;
use crate::types::RawCoin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;

/// How deep into the ranked listing the universe snapshot goes. Rank
/// rules only ever take the top handful, so this leaves ample slack for
/// tag exclusions.
const UNIVERSE_LIMIT: usize = 200;

struct UniverseSnapshot {
    coins: Vec<RawCoin>,
    fetched_at: Instant,
}

/// Secondary market-data cache: the ranked listings universe, refreshed
/// on its own shorter interval so price cycles don't depend on a
/// listings call succeeding at that exact instant.
pub struct MarketDataService {
    provider: Arc<ProviderClient>,
    max_age: Duration,
    snapshot: RwLock<Option<UniverseSnapshot>>,
}

impl MarketDataService {
    pub fn new(provider: Arc<ProviderClient>, refresh_interval: Duration) -> Self {
        Self {
            provider,
            // tolerate one missed refresh before forcing an inline fetch
            max_age: refresh_interval * 2,
            snapshot: RwLock::new(None),
        }
    }

    pub fn register_jobs(self: Arc<Self>, scheduler: &mut Scheduler, interval: Duration) {
        let service = self;
        scheduler.spawn_interval("market-universe", interval, move || {
            let service = Arc::clone(&service);
            async move { service.refresh().await }
        });
    }

    pub async fn refresh(&self) -> Result<(), IndexError> {
        let coins = self.provider.listings_latest(UNIVERSE_LIMIT).await?;
        info!("🔄 market universe refreshed: {} coins", coins.len());

        let mut snapshot = self.snapshot.write().await;
        *snapshot = Some(UniverseSnapshot {
            coins,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// The cached universe, fetching inline only when the snapshot is
    /// missing or stale.
    pub async fn universe(&self) -> Result<Vec<RawCoin>, IndexError> {
        {
            let snapshot = self.snapshot.read().await;
            if let Some(snap) = snapshot.as_ref() {
                if snap.fetched_at.elapsed() < self.max_age {
                    return Ok(snap.coins.clone());
                }
            }
        }

        self.refresh().await?;
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .map(|snap| snap.coins.clone())
            .ok_or_else(|| IndexError::fetch("coinmarketcap", "universe refresh yielded nothing"))
    }
}
