pub mod config;
pub mod core;
pub mod logging;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{AppConfig, ConfigError};
use crate::core::news::{NewsClient, NewsError, NewsSource};
use crate::core::query::{QueryClient, QueryHandle, QueryOptions};
use crate::core::store::{FileStorage, NewsStore};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build news client: {0}")]
    Client(#[from] NewsError),
}

/// The client-side state store and the query cache, wired together.
#[derive(Clone)]
pub struct NewsApp {
    store: NewsStore,
    queries: QueryClient,
}

impl NewsApp {
    pub fn bootstrap(config: &AppConfig) -> Result<Self, AppError> {
        let store = NewsStore::open(FileStorage::new(&config.data_dir));
        let client = NewsClient::new(&config.base_url, &config.api_key, config.timeout)?;
        let options = QueryOptions {
            stale_time: config.stale_time,
            ..QueryOptions::default()
        };
        info!(
            data_dir = %config.data_dir.display(),
            base_url = %config.base_url,
            "news app ready"
        );
        Ok(Self::with_parts(store, Arc::new(client), options))
    }

    pub fn with_parts(store: NewsStore, source: Arc<dyn NewsSource>, options: QueryOptions) -> Self {
        Self {
            store,
            queries: QueryClient::from_shared(source, options),
        }
    }

    pub fn store(&self) -> &NewsStore {
        &self.store
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    /// Single-page query for the current filters. Entries left behind by
    /// earlier filters are collected once they outlive the cache time.
    pub fn latest(&self) -> QueryHandle {
        self.queries.collect_garbage();
        self.queries.latest(&self.store.filters())
    }

    /// Cursor-chain query for the current filters.
    pub fn latest_pages(&self) -> QueryHandle {
        self.queries.collect_garbage();
        self.queries.infinite(&self.store.filters())
    }

    /// Bookmarks an article already loaded for the current filters. Returns
    /// false when it is not in the cache or is already saved.
    pub fn bookmark_article(&self, article_id: &str) -> bool {
        match self.queries.find_article(&self.store.filters(), article_id) {
            Some(article) => self.store.add_bookmark(&article),
            None => {
                debug!(article_id, "article not found in cached feeds");
                false
            }
        }
    }
}
