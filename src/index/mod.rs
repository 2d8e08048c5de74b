pub mod aggregator;
pub mod rebalance;
pub mod selector;

pub use aggregator::Aggregator;
pub use rebalance::RebalanceEngine;
pub use selector::BasketSelector;

use rust_decimal::Decimal;

/// How a variant picks its basket from the provider universe.
#[derive(Debug, Clone)]
pub enum SelectionRule {
    /// Top `count` by provider market-cap rank, optionally dropping a tag
    /// (e.g. stablecoins).
    TopByMarketCap {
        count: usize,
        exclude_tag: Option<String>,
    },
    /// Fixed symbol allowlist, optionally restricted to coins issued on
    /// one chain. First `max` matches in allowlist order.
    SymbolAllowlist {
        symbols: Vec<String>,
        chain: Option<String>,
        max: usize,
    },
    /// Provider category universe intersected with a supported-symbol
    /// allowlist.
    CategoryAllowlist {
        category_id: String,
        symbols: Vec<String>,
        max: usize,
    },
}

/// Per-variant pipeline configuration. One parametrized pipeline runs
/// every variant; only these values differ.
#[derive(Debug, Clone)]
pub struct IndexPolicy {
    pub name: String,
    pub rule: SelectionRule,
    /// Extra divisor applied after the mean, a per-variant constant.
    pub scale_divisor: Option<Decimal>,
    /// Below this the cycle is skipped instead of averaging fewer tokens.
    pub min_constituents: usize,
    /// When set, the basket is re-derived only at rebalance time; price
    /// cycles re-quote the committed constituents by id.
    pub fixed_basket: bool,
}

impl IndexPolicy {
    /// The built-in index variants.
    pub fn builtin() -> Vec<IndexPolicy> {
        vec![
            IndexPolicy {
                name: "top".to_string(),
                rule: SelectionRule::TopByMarketCap {
                    count: 10,
                    exclude_tag: Some("stablecoin".to_string()),
                },
                scale_divisor: Some(Decimal::from(1000)),
                min_constituents: 10,
                fixed_basket: false,
            },
            IndexPolicy {
                name: "defi".to_string(),
                rule: SelectionRule::CategoryAllowlist {
                    category_id: "605e2ce9d41eae1066535f7c".to_string(),
                    symbols: vec![
                        "UNI", "AAVE", "LINK", "MKR", "CRV", "COMP", "SNX", "SUSHI", "YFI",
                        "1INCH",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                    max: 10,
                },
                scale_divisor: None,
                min_constituents: 6,
                fixed_basket: false,
            },
            IndexPolicy {
                name: "brc20".to_string(),
                rule: SelectionRule::SymbolAllowlist {
                    symbols: vec!["ORDI", "SATS", "RATS", "MUBI", "TRAC"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    chain: Some("Bitcoin".to_string()),
                    max: 5,
                },
                scale_divisor: None,
                min_constituents: 3,
                fixed_basket: false,
            },
            IndexPolicy {
                name: "meme".to_string(),
                rule: SelectionRule::CategoryAllowlist {
                    category_id: "6051a82166fc1b42617d6dc6".to_string(),
                    symbols: vec!["DOGE", "SHIB", "PEPE", "WIF", "FLOKI", "BONK"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    max: 6,
                },
                scale_divisor: None,
                min_constituents: 4,
                fixed_basket: true,
            },
        ]
    }
}
