use crate::error::IndexError;
use crate::types::{CoinQuote, IndexEntry, RebalanceEntry};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub struct RebalanceEngine;

impl RebalanceEngine {
    /// Membership diff between the newest entry dated today and the
    /// newest entry dated `lookback_days` ago, keyed by coin id. Either
    /// snapshot missing is a no-comparison-data condition, not a guess.
    pub fn compute_rebalance(
        series: &[IndexEntry],
        lookback_days: i64,
        now: DateTime<Utc>,
    ) -> Result<RebalanceEntry, IndexError> {
        let today = now.date_naive();
        let prior_date = today - chrono::Duration::days(lookback_days);

        // Series is newest-first, so the first match per date is the most
        // recent entry on that date.
        let current = series
            .iter()
            .find(|e| e.timestamp.date_naive() == today)
            .ok_or_else(|| {
                IndexError::NoComparisonData(format!("no entry on current date {}", today))
            })?;
        let prior = series
            .iter()
            .find(|e| e.timestamp.date_naive() == prior_date)
            .ok_or_else(|| {
                IndexError::NoComparisonData(format!(
                    "no entry on comparison date {} ({} days prior)",
                    prior_date, lookback_days
                ))
            })?;

        let mut prior_map: HashMap<u64, &CoinQuote> =
            prior.constituents.iter().map(|c| (c.id, c)).collect();

        let mut new_token = Vec::new();
        for constituent in &current.constituents {
            if prior_map.remove(&constituent.id).is_none() {
                new_token.push(constituent.clone());
            }
        }

        // Whatever survived the retained pass was dropped from the basket.
        let old_token: Vec<CoinQuote> = prior
            .constituents
            .iter()
            .filter(|c| prior_map.contains_key(&c.id))
            .cloned()
            .collect();

        Ok(RebalanceEntry {
            timestamp: now,
            number_of_token_changed: new_token.len() as u32,
            new_token,
            old_token,
        })
    }
}
