use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One underlying asset whose price contributes to an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinQuote {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

/// Provider-normalized coin record, before basket selection.
/// Carries the ranking/tag metadata the selection rules filter on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCoin {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    pub price: Decimal,
    pub rank: Option<i32>,
    pub tags: Vec<String>,
    pub token_address: Option<String>,
    pub chain: Option<String>,
}

impl RawCoin {
    pub fn into_quote(self) -> CoinQuote {
        CoinQuote {
            id: self.id,
            name: self.name,
            symbol: self.symbol,
            price: self.price,
            token_address: self.token_address,
            chain: self.chain,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
