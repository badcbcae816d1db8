mod actions;
pub mod page;
pub mod patch;
pub mod recommendation;
pub mod validation;

pub use page::{Page, PageRequest};
pub use patch::RecommendationPatch;
pub use recommendation::{Recommendation, RecommendationStatus, RecommendationType};
