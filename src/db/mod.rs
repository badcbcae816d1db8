pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryRecommendationStore;
pub use postgres::{create_pool, run_migrations, PgRecommendationStore};
pub use store::{RecommendationFilter, RecommendationStore, SortOrder};
