use std::sync::Arc;

use crate::{
    config::Config,
    db::{MemoryRecommendationStore, RecommendationStore},
    services::RecommendationService,
};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationService,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn RecommendationStore>, config: &Config) -> Self {
        Self {
            recommendations: RecommendationService::new(store),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// State over an empty in-memory store with default settings
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryRecommendationStore::new()),
            &Config::default(),
        )
    }
}
