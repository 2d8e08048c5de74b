use crate::config::ProviderConfig;
use crate::error::IndexError;
use crate::types::RawCoin;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

const PROVIDER_NAME: &str = "coinmarketcap";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

#[derive(Debug, Deserialize)]
struct ApiStatus {
    error_code: i32,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct QuoteMap {
    #[serde(rename = "USD")]
    usd: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct PlatformData {
    name: Option<String>,
    token_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinData {
    id: u64,
    name: String,
    symbol: String,
    cmc_rank: Option<i32>,
    #[serde(default)]
    tags: Vec<String>,
    platform: Option<PlatformData>,
    quote: QuoteMap,
}

#[derive(Debug, Deserialize)]
struct ListingsResponse {
    status: ApiStatus,
    data: Vec<CoinData>,
}

#[derive(Debug, Deserialize)]
struct CategoryData {
    coins: Vec<CoinData>,
}

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    status: ApiStatus,
    data: CategoryData,
}

#[derive(Debug, Deserialize)]
struct QuotesByIdResponse {
    status: ApiStatus,
    data: HashMap<String, CoinData>,
}

#[derive(Debug, Deserialize)]
struct QuotesBySymbolResponse {
    status: ApiStatus,
    data: HashMap<String, Vec<CoinData>>,
}

/// Client for the market-data provider. All fetches share one pooled
/// HTTP client with a bounded timeout; a stalled provider fails the
/// tick instead of blocking the scheduler.
pub struct ProviderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout))
            .build()
            .map_err(|e| IndexError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Market-cap-ranked listing of the coin universe.
    pub async fn listings_latest(&self, limit: usize) -> Result<Vec<RawCoin>, IndexError> {
        let url = format!(
            "{}/v1/cryptocurrency/listings/latest?limit={}&convert=USD",
            self.base_url, limit
        );
        let response: ListingsResponse = self.get_json(&url).await?;
        check_status(&response.status)?;
        Ok(normalize(response.data))
    }

    /// Coins belonging to a provider-defined category (e.g. DeFi, meme).
    pub async fn category_listings(
        &self,
        category_id: &str,
        limit: usize,
    ) -> Result<Vec<RawCoin>, IndexError> {
        let url = format!(
            "{}/v1/cryptocurrency/category?id={}&limit={}&convert=USD",
            self.base_url, category_id, limit
        );
        let response: CategoryResponse = self.get_json(&url).await?;
        check_status(&response.status)?;
        Ok(normalize(response.data.coins))
    }

    /// Point quotes for a previously committed basket.
    pub async fn quotes_by_id(&self, ids: &[u64]) -> Result<Vec<RawCoin>, IndexError> {
        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/v2/cryptocurrency/quotes/latest?id={}&convert=USD",
            self.base_url, id_list
        );
        let response: QuotesByIdResponse = self.get_json(&url).await?;
        check_status(&response.status)?;
        Ok(normalize(response.data.into_values().collect()))
    }

    pub async fn quotes_by_symbol(&self, symbols: &[&str]) -> Result<Vec<RawCoin>, IndexError> {
        let url = format!(
            "{}/v2/cryptocurrency/quotes/latest?symbol={}&convert=USD",
            self.base_url,
            symbols.join(",")
        );
        let response: QuotesBySymbolResponse = self.get_json(&url).await?;
        check_status(&response.status)?;
        Ok(normalize(
            response.data.into_values().flatten().collect(),
        ))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, IndexError> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| IndexError::fetch(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(IndexError::fetch(
                PROVIDER_NAME,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| IndexError::fetch(PROVIDER_NAME, format!("malformed payload: {}", e)))
    }
}

fn check_status(status: &ApiStatus) -> Result<(), IndexError> {
    if status.error_code != 0 {
        return Err(IndexError::fetch(
            PROVIDER_NAME,
            format!(
                "provider error {}: {}",
                status.error_code,
                status.error_message.as_deref().unwrap_or("unknown")
            ),
        ));
    }
    Ok(())
}

/// Drops records without a usable USD price; the basket selector only
/// ever sees quotable coins.
fn normalize(coins: Vec<CoinData>) -> Vec<RawCoin> {
    coins
        .into_iter()
        .filter_map(|coin| {
            let price = match coin.quote.usd.and_then(|q| q.price) {
                Some(p) if p >= Decimal::ZERO => p,
                Some(p) => {
                    warn!("skipping {}: negative price {}", coin.symbol, p);
                    return None;
                }
                None => return None,
            };
            if coin.symbol.is_empty() {
                return None;
            }
            let (chain, token_address) = match coin.platform {
                Some(platform) => (platform.name, platform.token_address),
                None => (None, None),
            };
            Some(RawCoin {
                id: coin.id,
                name: coin.name,
                symbol: coin.symbol,
                price,
                rank: coin.cmc_rank,
                tags: coin.tags,
                token_address,
                chain,
            })
        })
        .collect()
}
