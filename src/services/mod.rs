pub mod api_service;
pub mod index_service;
pub mod market_service;

pub use api_service::ApiService;
pub use index_service::IndexService;
pub use market_service::MarketDataService;
