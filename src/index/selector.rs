use super::{IndexPolicy, SelectionRule};
use crate::error::IndexError;
use crate::types::{CoinQuote, RawCoin};

pub struct BasketSelector;

impl BasketSelector {
    /// Applies the policy rule to the provider universe. Fewer matches
    /// than the policy minimum is a degraded basket: the caller skips the
    /// cycle rather than averaging over fewer tokens.
    pub fn select(raw_coins: &[RawCoin], policy: &IndexPolicy) -> Result<Vec<CoinQuote>, IndexError> {
        let selected = match &policy.rule {
            SelectionRule::TopByMarketCap { count, exclude_tag } => {
                Self::top_by_market_cap(raw_coins, *count, exclude_tag.as_deref())
            }
            SelectionRule::SymbolAllowlist {
                symbols,
                chain,
                max,
            } => Self::allowlist(raw_coins, symbols, chain.as_deref(), *max),
            SelectionRule::CategoryAllowlist { symbols, max, .. } => {
                Self::allowlist(raw_coins, symbols, None, *max)
            }
        };

        if selected.len() < policy.min_constituents {
            return Err(IndexError::DegradedBasket {
                index: policy.name.clone(),
                found: selected.len(),
                required: policy.min_constituents,
            });
        }

        Ok(selected)
    }

    fn top_by_market_cap(
        raw_coins: &[RawCoin],
        count: usize,
        exclude_tag: Option<&str>,
    ) -> Vec<CoinQuote> {
        let mut candidates: Vec<&RawCoin> = raw_coins
            .iter()
            .filter(|coin| match exclude_tag {
                Some(tag) => !coin.has_tag(tag),
                None => true,
            })
            .collect();

        // Unranked coins sort last.
        candidates.sort_by_key(|coin| coin.rank.unwrap_or(i32::MAX));

        candidates
            .into_iter()
            .take(count)
            .map(|coin| coin.clone().into_quote())
            .collect()
    }

    /// Intersection in allowlist order, so the basket ordering is stable
    /// across cycles regardless of provider response ordering.
    fn allowlist(
        raw_coins: &[RawCoin],
        symbols: &[String],
        chain: Option<&str>,
        max: usize,
    ) -> Vec<CoinQuote> {
        symbols
            .iter()
            .filter_map(|symbol| {
                raw_coins.iter().find(|coin| {
                    coin.symbol.eq_ignore_ascii_case(symbol)
                        && match chain {
                            Some(chain) => coin.chain.as_deref() == Some(chain),
                            None => true,
                        }
                })
            })
            .take(max)
            .map(|coin| coin.clone().into_quote())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn raw(id: u64, symbol: &str, rank: i32, tags: &[&str], chain: Option<&str>) -> RawCoin {
        RawCoin {
            id,
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            price: Decimal::from(id),
            rank: Some(rank),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            token_address: None,
            chain: chain.map(String::from),
        }
    }

    fn policy(rule: SelectionRule, min: usize) -> IndexPolicy {
        IndexPolicy {
            name: "test".to_string(),
            rule,
            scale_divisor: None,
            min_constituents: min,
            fixed_basket: false,
        }
    }

    #[test]
    fn test_top_by_market_cap_excludes_tag_and_ranks() {
        let universe = vec![
            raw(3, "USDT", 3, &["stablecoin"], None),
            raw(2, "ETH", 2, &[], None),
            raw(1, "BTC", 1, &[], None),
            raw(4, "BNB", 4, &[], None),
        ];
        let p = policy(
            SelectionRule::TopByMarketCap {
                count: 2,
                exclude_tag: Some("stablecoin".to_string()),
            },
            2,
        );

        let basket = BasketSelector::select(&universe, &p).unwrap();
        let symbols: Vec<&str> = basket.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH"]);
    }

    #[test]
    fn test_allowlist_respects_chain_filter_and_order() {
        let universe = vec![
            raw(10, "ORDI", 60, &[], Some("Bitcoin")),
            raw(11, "SATS", 70, &[], Some("Bitcoin")),
            raw(12, "ORDI", 500, &[], Some("Ethereum")), // wrapped copy, wrong chain
        ];
        let p = policy(
            SelectionRule::SymbolAllowlist {
                symbols: vec!["SATS".to_string(), "ORDI".to_string()],
                chain: Some("Bitcoin".to_string()),
                max: 5,
            },
            2,
        );

        let basket = BasketSelector::select(&universe, &p).unwrap();
        assert_eq!(basket.len(), 2);
        // allowlist order, not provider order
        assert_eq!(basket[0].symbol, "SATS");
        assert_eq!(basket[1].id, 10);
    }

    #[test]
    fn test_allowlist_caps_at_max() {
        let universe = vec![
            raw(1, "A", 1, &[], None),
            raw(2, "B", 2, &[], None),
            raw(3, "C", 3, &[], None),
        ];
        let p = policy(
            SelectionRule::SymbolAllowlist {
                symbols: vec!["A".into(), "B".into(), "C".into()],
                chain: None,
                max: 2,
            },
            1,
        );

        let basket = BasketSelector::select(&universe, &p).unwrap();
        assert_eq!(basket.len(), 2);
    }

    #[test]
    fn test_degraded_basket_is_signaled() {
        let universe = vec![raw(1, "BTC", 1, &[], None)];
        let p = policy(
            SelectionRule::TopByMarketCap {
                count: 10,
                exclude_tag: None,
            },
            10,
        );

        let err = BasketSelector::select(&universe, &p).unwrap_err();
        match err {
            IndexError::DegradedBasket {
                found, required, ..
            } => {
                assert_eq!(found, 1);
                assert_eq!(required, 10);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
