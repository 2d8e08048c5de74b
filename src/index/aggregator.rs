use super::IndexPolicy;
use crate::types::{CoinQuote, IndexEntry};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub struct Aggregator;

impl Aggregator {
    /// Composite price: arithmetic mean of constituent prices, divided by
    /// the variant's scale divisor when one is configured. An empty
    /// basket short-circuits to zero. The timestamp is the aggregation
    /// instant, not any constituent's quote time.
    pub fn aggregate(
        policy: &IndexPolicy,
        constituents: Vec<CoinQuote>,
        now: DateTime<Utc>,
    ) -> IndexEntry {
        let index_price = if constituents.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = constituents.iter().map(|c| c.price).sum();
            let mean = sum / Decimal::from(constituents.len() as u64);
            match policy.scale_divisor {
                Some(divisor) => mean / divisor,
                None => mean,
            }
        };

        IndexEntry {
            timestamp: now,
            index_price,
            constituents,
        }
    }
}
