use crate::api::{create_router, ApiState};
use crate::cache::SeriesCache;
use crate::config::Config;
use crate::database::Database;
use crate::index::IndexPolicy;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct ApiService {
    config: Config,
    state: ApiState,
}

impl ApiService {
    pub fn new(
        config: Config,
        database: Arc<Database>,
        cache: Arc<SeriesCache>,
        policies: Arc<Vec<IndexPolicy>>,
    ) -> Self {
        let state = ApiState::new(database, cache, policies);
        Self { config, state }
    }

    pub async fn start(&self) -> Result<()> {
        let app = create_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(format!(
            "{}:{}",
            self.config.server.host, self.config.server.port
        ))
        .await?;

        info!(
            "🚀 API server starting on {}:{}",
            self.config.server.host, self.config.server.port
        );
        axum::serve(listener, app).await?;

        Ok(())
    }
}
