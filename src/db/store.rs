use std::{fmt::Display, str::FromStr};

use crate::{
    error::AppResult,
    models::{Recommendation, RecommendationStatus, RecommendationType},
};

/// Direction for queries sorted by `recommendation_weight`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Anything other than `asc` sorts descending
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Equality filters, combined with AND. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationFilter {
    pub source_item_id: Option<i64>,
    pub target_item_id: Option<i64>,
    pub recommendation_type: Option<RecommendationType>,
    pub status: Option<RecommendationStatus>,
}

impl RecommendationFilter {
    pub fn matches(&self, rec: &Recommendation) -> bool {
        self.source_item_id.map_or(true, |v| rec.source_item_id == v)
            && self.target_item_id.map_or(true, |v| rec.target_item_id == v)
            && self
                .recommendation_type
                .map_or(true, |v| rec.recommendation_type == v)
            && self.status.map_or(true, |v| rec.status == v)
    }
}

/// Persistence backend for recommendations.
///
/// Every method runs to completion against the backend; there is no locking
/// across calls, so read-modify-write sequences built from `get` and
/// `update` are last-write-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Persists a new row, ignoring any id or timestamps on `new`, and
    /// returns it with the store-assigned id and `created_at == updated_at`
    async fn insert(&self, new: &Recommendation) -> AppResult<Recommendation>;

    /// Overwrites the row with `recommendation.id`, refreshing `updated_at`.
    /// Returns `None` if the row does not exist.
    async fn update(&self, recommendation: &Recommendation) -> AppResult<Option<Recommendation>>;

    /// Removes the row; missing ids are not an error
    async fn delete(&self, id: i64) -> AppResult<()>;

    async fn get(&self, id: i64) -> AppResult<Option<Recommendation>>;

    /// All matching rows, by id or by weight (ties broken by id)
    async fn list(
        &self,
        filter: &RecommendationFilter,
        order: Option<SortOrder>,
    ) -> AppResult<Vec<Recommendation>>;

    /// One id-ordered slice of the matching rows plus the total match count
    async fn page(
        &self,
        filter: &RecommendationFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Recommendation>, i64)>;

    /// Name for logging
    fn name(&self) -> &'static str;
}
