use super::CoinQuote;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One aggregation cycle's output: the composite price and the basket
/// it was computed from. Series are persisted newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub timestamp: DateTime<Utc>,
    pub index_price: Decimal,
    pub constituents: Vec<CoinQuote>,
}

/// Membership diff between two basket snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceEntry {
    pub timestamp: DateTime<Utc>,
    pub number_of_token_changed: u32,
    pub new_token: Vec<CoinQuote>,
    pub old_token: Vec<CoinQuote>,
}

/// Entries within the last `days` days, boundary inclusive.
/// Input ordering (newest-first) is preserved.
pub fn filter_by_window(entries: &[IndexEntry], days: i64, now: DateTime<Utc>) -> Vec<IndexEntry> {
    let cutoff = now - chrono::Duration::days(days);
    entries
        .iter()
        .filter(|e| e.timestamp >= cutoff)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(ts: DateTime<Utc>) -> IndexEntry {
        IndexEntry {
            timestamp: ts,
            index_price: Decimal::from(1),
            constituents: vec![],
        }
    }

    #[test]
    fn test_filter_by_window_day_one() {
        let now = Utc::now();
        let entries = vec![
            entry_at(now),
            entry_at(now - chrono::Duration::days(2)),
            entry_at(now - chrono::Duration::days(10)),
        ];

        let filtered = filter_by_window(&entries, 1, now);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].timestamp, now);
    }

    #[test]
    fn test_filter_by_window_boundary_inclusive() {
        let now = Utc::now();
        let boundary = now - chrono::Duration::days(7);
        let entries = vec![entry_at(now), entry_at(boundary)];

        let filtered = filter_by_window(&entries, 7, now);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_preserves_newest_first_order() {
        let now = Utc::now();
        let entries = vec![
            entry_at(now),
            entry_at(now - chrono::Duration::hours(1)),
            entry_at(now - chrono::Duration::hours(2)),
        ];

        let filtered = filter_by_window(&entries, 7, now);
        assert_eq!(filtered.len(), 3);
        for pair in filtered.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let entry = IndexEntry {
            timestamp: Utc::now(),
            index_price: Decimal::from(20),
            constituents: vec![CoinQuote {
                id: 1,
                name: "Bitcoin".to_string(),
                symbol: "BTC".to_string(),
                price: Decimal::from(20),
                token_address: None,
                chain: None,
            }],
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("indexPrice").is_some());
        assert!(json.get("constituents").is_some());
        // absent optionals are skipped, not serialized as null
        assert!(json["constituents"][0].get("tokenAddress").is_none());

        let rebalance = RebalanceEntry {
            timestamp: Utc::now(),
            number_of_token_changed: 0,
            new_token: vec![],
            old_token: vec![],
        };
        let json = serde_json::to_value(&rebalance).unwrap();
        assert!(json.get("numberOfTokenChanged").is_some());
        assert!(json.get("newToken").is_some());
        assert!(json.get("oldToken").is_some());
    }
}
