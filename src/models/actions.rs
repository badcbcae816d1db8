//! State transitions on a single recommendation.
//!
//! These only change the in-memory value; callers persist the result with
//! `RecommendationService::update`. The read-modify-write is not atomic, so
//! two concurrent actions on the same id race and the last write wins.

use serde_json::json;

use crate::error::DataValidationError;

use super::{validation, Recommendation, RecommendationStatus};

impl Recommendation {
    /// Adds one like. Fails without mutating if the current count is corrupt.
    pub fn like(&mut self) -> Result<&mut Self, DataValidationError> {
        let mut data = self.serialize();
        let likes = validation::non_negative_int("number_of_likes", &data["number_of_likes"])?;
        let next = likes
            .checked_add(1)
            .ok_or_else(|| DataValidationError::InvalidField {
                field: "number_of_likes",
                reason: "overflowed".to_string(),
            })?;

        data["number_of_likes"] = json!(next);
        self.deserialize(&data)
    }

    /// Marks the recommendation deprecated regardless of its current status
    pub fn deactivate(&mut self) -> &mut Self {
        self.status = RecommendationStatus::Deprecated;
        self
    }

    /// Sets any status. The allow-list of re-activation targets is enforced
    /// by the HTTP layer, see [`RecommendationStatus::is_activation_target`].
    pub fn activate(&mut self, status: RecommendationStatus) -> &mut Self {
        self.status = status;
        self
    }
}
