pub mod recommendations;

pub use recommendations::RecommendationService;
