use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error from {provider}: {reason}")]
    Fetch { provider: String, reason: String },

    #[error("Degraded basket for {index}: found {found} constituents, policy requires {required}")]
    DegradedBasket {
        index: String,
        found: usize,
        required: usize,
    },

    #[error("Store read error: {0}")]
    StoreRead(String),

    #[error("Store write error: {0}")]
    StoreWrite(String),

    #[error("No data available for comparison: {0}")]
    NoComparisonData(String),
}

impl IndexError {
    pub fn fetch(provider: &str, reason: impl std::fmt::Display) -> Self {
        IndexError::Fetch {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
