pub mod handlers;
pub mod routes;

pub use routes::create_router;

use crate::cache::SeriesCache;
use crate::database::Database;
use crate::index::IndexPolicy;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct ApiState {
    pub database: Arc<Database>,
    pub cache: Arc<SeriesCache>,
    pub policies: Arc<Vec<IndexPolicy>>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(
        database: Arc<Database>,
        cache: Arc<SeriesCache>,
        policies: Arc<Vec<IndexPolicy>>,
    ) -> Self {
        Self {
            database,
            cache,
            policies,
            started_at: Instant::now(),
        }
    }

    pub fn policy(&self, name: &str) -> Option<&IndexPolicy> {
        self.policies.iter().find(|p| p.name == name)
    }
}
