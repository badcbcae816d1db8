use serde_json::Value;

use crate::error::DataValidationError;

use super::{validation, Recommendation, RecommendationStatus, RecommendationType};

/// Partial update of a recommendation. Only fields that are `Some` change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationPatch {
    pub source_item_id: Option<i64>,
    pub target_item_id: Option<i64>,
    pub recommendation_type: Option<RecommendationType>,
    pub recommendation_weight: Option<f64>,
    pub status: Option<RecommendationStatus>,
    pub number_of_likes: Option<i64>,
}

impl RecommendationPatch {
    /// Validates every supplied key of a JSON object.
    ///
    /// Unknown keys are ignored, as are `id` and the timestamps, which a
    /// patch never changes.
    pub fn from_json(data: &Value) -> Result<Self, DataValidationError> {
        let fields = validation::object(data)?;
        let mut patch = Self::default();

        if let Some(v) = fields.get("source_item_id") {
            patch.source_item_id = Some(validation::non_negative_int("source_item_id", v)?);
        }
        if let Some(v) = fields.get("target_item_id") {
            patch.target_item_id = Some(validation::non_negative_int("target_item_id", v)?);
        }
        if let Some(v) = fields.get("recommendation_type") {
            patch.recommendation_type = Some(validation::enum_name("recommendation_type", v)?);
        }
        if let Some(v) = fields.get("recommendation_weight") {
            patch.recommendation_weight = Some(validation::weight("recommendation_weight", v)?);
        }
        if let Some(v) = fields.get("status") {
            patch.status = Some(validation::enum_name("status", v)?);
        }
        if let Some(v) = fields.get("number_of_likes") {
            patch.number_of_likes = Some(validation::non_negative_int("number_of_likes", v)?);
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, target: &mut Recommendation) {
        if let Some(v) = self.source_item_id {
            target.source_item_id = v;
        }
        if let Some(v) = self.target_item_id {
            target.target_item_id = v;
        }
        if let Some(v) = self.recommendation_type {
            target.recommendation_type = v;
        }
        if let Some(v) = self.recommendation_weight {
            target.recommendation_weight = v;
        }
        if let Some(v) = self.status {
            target.status = v;
        }
        if let Some(v) = self.number_of_likes {
            target.number_of_likes = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_supplied_fields_change() {
        let mut rec = Recommendation::new(1, 2, RecommendationType::Accessory, 0.3);
        let patch = RecommendationPatch::from_json(&json!({
            "status": "deprecated",
            "recommendation_weight": 0.9,
            "id": 1234,
            "something_else": true,
        }))
        .unwrap();

        patch.apply(&mut rec);

        assert_eq!(rec.status, RecommendationStatus::Deprecated);
        assert_eq!(rec.recommendation_weight, 0.9);
        assert_eq!(rec.recommendation_type, RecommendationType::Accessory);
        assert_eq!(rec.source_item_id, 1);
        assert_eq!(rec.id, None);
    }

    #[test]
    fn test_empty_object_is_empty_patch() {
        assert!(RecommendationPatch::from_json(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_field_rejected() {
        assert!(RecommendationPatch::from_json(&json!({ "number_of_likes": -1 })).is_err());
        assert!(RecommendationPatch::from_json(&json!({ "status": "male" })).is_err());
        assert_eq!(
            RecommendationPatch::from_json(&json!([1, 2])),
            Err(DataValidationError::NotAnObject)
        );
    }
}
