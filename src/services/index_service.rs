use super::MarketDataService;
use crate::cache::SeriesCache;
use crate::config::JobConfig;
use crate::database::{HistoryOperations, RebalanceOperations};
use crate::error::IndexError;
use crate::index::{Aggregator, BasketSelector, IndexPolicy, RebalanceEngine, SelectionRule};
use crate::provider::ProviderClient;
use crate::scheduler::Scheduler;
use crate::types::{CoinQuote, RawCoin};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const CATEGORY_LIMIT: usize = 100;

/// One parametrized pipeline instantiated per index variant: fetch the
/// universe, select the basket, aggregate, append, overwrite the cache.
/// The weekly rebalance re-derives baskets and records the membership
/// diff.
pub struct IndexService {
    pool: PgPool,
    provider: Arc<ProviderClient>,
    cache: Arc<SeriesCache>,
    market: Arc<MarketDataService>,
    policies: Vec<IndexPolicy>,
    rebalance_lookback_days: i64,
    retention_days: Option<i64>,
}

impl IndexService {
    pub fn new(
        pool: PgPool,
        provider: Arc<ProviderClient>,
        cache: Arc<SeriesCache>,
        market: Arc<MarketDataService>,
        policies: Vec<IndexPolicy>,
        jobs: &JobConfig,
    ) -> Self {
        Self {
            pool,
            provider,
            cache,
            market,
            policies,
            rebalance_lookback_days: (jobs.rebalance_interval / 86_400).max(1) as i64,
            retention_days: jobs.retention_days,
        }
    }

    pub fn register_jobs(self: Arc<Self>, scheduler: &mut Scheduler, jobs: &JobConfig) {
        for policy in &self.policies {
            let service = Arc::clone(&self);
            let p = policy.clone();
            scheduler.spawn_interval(
                &format!("{}-price", policy.name),
                Duration::from_secs(jobs.price_refresh_interval),
                move || {
                    let service = Arc::clone(&service);
                    let p = p.clone();
                    async move { service.run_price_cycle(&p).await }
                },
            );

            let service = Arc::clone(&self);
            let p = policy.clone();
            scheduler.spawn_interval(
                &format!("{}-rebalance", policy.name),
                Duration::from_secs(jobs.rebalance_interval),
                move || {
                    let service = Arc::clone(&service);
                    let p = p.clone();
                    async move { service.run_rebalance_cycle(&p).await }
                },
            );
        }

        if self.retention_days.is_some() {
            let service = Arc::clone(&self);
            scheduler.spawn_interval(
                "history-retention",
                Duration::from_secs(86_400),
                move || {
                    let service = Arc::clone(&service);
                    async move { service.run_retention_cycle().await }
                },
            );
        }
    }

    /// One aggregation tick for one variant. Any failure skips the cycle
    /// without appending; the next tick retries naturally.
    pub async fn run_price_cycle(&self, policy: &IndexPolicy) -> Result<(), IndexError> {
        let constituents = self.current_constituents(policy).await?;
        let entry = Aggregator::aggregate(policy, constituents, Utc::now());

        let series = HistoryOperations::append_entry(&self.pool, &policy.name, entry).await?;
        // overwrite, not invalidate: reads between cycles stay cache-hits
        self.cache.put(&policy.name, series.clone()).await;

        if let Some(latest) = series.first() {
            info!(
                "✅ {} index updated: {} ({} constituents)",
                policy.name,
                latest.index_price,
                latest.constituents.len()
            );
        }
        Ok(())
    }

    /// Re-derives the basket from the policy rule, commits it as a fresh
    /// history entry, then records the membership diff against the
    /// lookback snapshot.
    pub async fn run_rebalance_cycle(&self, policy: &IndexPolicy) -> Result<(), IndexError> {
        let raw = self.fetch_universe(policy).await?;
        let constituents = BasketSelector::select(&raw, policy)?;
        let entry = Aggregator::aggregate(policy, constituents, Utc::now());

        let series = HistoryOperations::append_entry(&self.pool, &policy.name, entry).await?;
        self.cache.put(&policy.name, series.clone()).await;

        let diff = RebalanceEngine::compute_rebalance(&series, self.rebalance_lookback_days, Utc::now())?;
        info!(
            "⚖️ {} rebalance: {} added, {} removed",
            policy.name,
            diff.new_token.len(),
            diff.old_token.len()
        );

        RebalanceOperations::append_entry(&self.pool, &policy.name, diff).await?;
        Ok(())
    }

    async fn run_retention_cycle(&self) -> Result<(), IndexError> {
        let Some(retention_days) = self.retention_days else {
            return Ok(());
        };

        for policy in &self.policies {
            let dropped = HistoryOperations::prune_older_than(
                &self.pool,
                &policy.name,
                retention_days,
                Utc::now(),
            )
            .await?;
            if dropped > 0 {
                info!("🧹 {}: pruned {} entries past retention", policy.name, dropped);
            }
        }
        Ok(())
    }

    /// The basket for this cycle. Fixed-basket variants re-quote the
    /// committed constituents by id instead of re-running the rule; the
    /// rule runs on the first-ever cycle (nothing committed yet) and at
    /// rebalance time.
    async fn current_constituents(&self, policy: &IndexPolicy) -> Result<Vec<CoinQuote>, IndexError> {
        if policy.fixed_basket {
            let series = HistoryOperations::load_series(&self.pool, &policy.name).await?;
            if let Some(latest) = series.iter().find(|e| !e.constituents.is_empty()) {
                return self.requote_committed(policy, &latest.constituents).await;
            }
        }

        let raw = self.fetch_universe(policy).await?;
        BasketSelector::select(&raw, policy)
    }

    async fn requote_committed(
        &self,
        policy: &IndexPolicy,
        committed: &[CoinQuote],
    ) -> Result<Vec<CoinQuote>, IndexError> {
        let ids: Vec<u64> = committed.iter().map(|c| c.id).collect();
        let fetched = self.provider.quotes_by_id(&ids).await?;

        let requoted = Self::match_committed(committed, &fetched);
        if requoted.len() < policy.min_constituents {
            return Err(IndexError::DegradedBasket {
                index: policy.name.clone(),
                found: requoted.len(),
                required: policy.min_constituents,
            });
        }
        Ok(requoted)
    }

    /// Committed basket order is preserved; constituents the provider no
    /// longer quotes are dropped (and may trip the degraded threshold).
    fn match_committed(committed: &[CoinQuote], fetched: &[RawCoin]) -> Vec<CoinQuote> {
        committed
            .iter()
            .filter_map(|c| fetched.iter().find(|raw| raw.id == c.id))
            .map(|raw| raw.clone().into_quote())
            .collect()
    }

    async fn fetch_universe(&self, policy: &IndexPolicy) -> Result<Vec<RawCoin>, IndexError> {
        match &policy.rule {
            SelectionRule::TopByMarketCap { .. } => self.market.universe().await,
            SelectionRule::SymbolAllowlist { symbols, .. } => {
                let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
                self.provider.quotes_by_symbol(&refs).await
            }
            SelectionRule::CategoryAllowlist { category_id, .. } => {
                self.provider
                    .category_listings(category_id, CATEGORY_LIMIT)
                    .await
            }
        }
    }
}
