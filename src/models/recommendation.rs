use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

use crate::error::DataValidationError;

use super::{patch::RecommendationPatch, validation};

/// Kind of association between the source and target items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    #[default]
    Unknown,
    UpSell,
    CrossSell,
    Accessory,
    Complementary,
    Substitute,
}

impl RecommendationType {
    pub const ALL: [RecommendationType; 6] = [
        RecommendationType::Unknown,
        RecommendationType::UpSell,
        RecommendationType::CrossSell,
        RecommendationType::Accessory,
        RecommendationType::Complementary,
        RecommendationType::Substitute,
    ];

    /// Symbolic name, as stored and sent over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Unknown => "UNKNOWN",
            RecommendationType::UpSell => "UP_SELL",
            RecommendationType::CrossSell => "CROSS_SELL",
            RecommendationType::Accessory => "ACCESSORY",
            RecommendationType::Complementary => "COMPLEMENTARY",
            RecommendationType::Substitute => "SUBSTITUTE",
        }
    }
}

impl Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationType {
    type Err = DataValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| DataValidationError::UnknownVariant {
                field: "recommendation_type",
                value: s.to_string(),
            })
    }
}

/// Availability state of a recommendation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationStatus {
    #[default]
    Unknown,
    Valid,
    OutOfStock,
    Deprecated,
}

impl RecommendationStatus {
    pub const ALL: [RecommendationStatus; 4] = [
        RecommendationStatus::Unknown,
        RecommendationStatus::Valid,
        RecommendationStatus::OutOfStock,
        RecommendationStatus::Deprecated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Unknown => "UNKNOWN",
            RecommendationStatus::Valid => "VALID",
            RecommendationStatus::OutOfStock => "OUT_OF_STOCK",
            RecommendationStatus::Deprecated => "DEPRECATED",
        }
    }

    /// Parses a status from a query string, also accepting `out-of-stock`
    pub fn parse_lenient(s: &str) -> Result<Self, DataValidationError> {
        s.replace('-', "_").parse().map_err(|_| DataValidationError::UnknownVariant {
            field: "status",
            value: s.to_string(),
        })
    }

    /// Statuses a deprecated recommendation may be re-activated into.
    ///
    /// Checked by the HTTP layer only; [`Recommendation::activate`] itself
    /// accepts any status.
    pub fn is_activation_target(&self) -> bool {
        matches!(
            self,
            RecommendationStatus::Valid | RecommendationStatus::OutOfStock
        )
    }
}

impl Display for RecommendationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationStatus {
    type Err = DataValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == upper)
            .ok_or_else(|| DataValidationError::UnknownVariant {
                field: "status",
                value: s.to_string(),
            })
    }
}

/// A stored association between a source item and a target item.
///
/// `id` and the timestamps are `None` until the store has persisted the
/// record, and they are omitted from the serialized form in that case.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Recommendation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub source_item_id: i64,
    pub target_item_id: i64,
    pub recommendation_type: RecommendationType,
    pub recommendation_weight: f64,
    pub status: RecommendationStatus,
    pub number_of_likes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    /// Builds an unpersisted recommendation with default status and no likes
    pub fn new(
        source_item_id: i64,
        target_item_id: i64,
        recommendation_type: RecommendationType,
        recommendation_weight: f64,
    ) -> Self {
        Self {
            source_item_id,
            target_item_id,
            recommendation_type,
            recommendation_weight,
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: RecommendationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Serializes into a JSON object keyed by field name
    pub fn serialize(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Validates `data` and assigns its fields to this recommendation.
    ///
    /// `source_item_id`, `target_item_id` and `recommendation_weight` are
    /// required. An `id` is only adopted when this recommendation has none,
    /// and timestamps are only parsed when not already set. Nothing is
    /// assigned unless every field validates.
    pub fn deserialize(&mut self, data: &Value) -> Result<&mut Self, DataValidationError> {
        let fields = validation::object(data)?;
        let patch = RecommendationPatch::from_json(data)?;

        for required in ["source_item_id", "target_item_id", "recommendation_weight"] {
            if !fields.contains_key(required) {
                return Err(DataValidationError::MissingField(required));
            }
        }

        let id = match (self.id, fields.get("id")) {
            (None, Some(v)) if !v.is_null() => Some(validation::non_negative_int("id", v)?),
            (current, _) => current,
        };
        let created_at = match (self.created_at, fields.get("created_at")) {
            (None, Some(v)) => Some(validation::timestamp("created_at", v)?),
            (current, _) => current,
        };
        let updated_at = match (self.updated_at, fields.get("updated_at")) {
            (None, Some(v)) => Some(validation::timestamp("updated_at", v)?),
            (current, _) => current,
        };

        patch.apply(self);
        self.id = id;
        self.created_at = created_at;
        self.updated_at = updated_at;

        Ok(self)
    }

    /// Checks the field invariants that the store relies on
    pub fn validate(&self) -> Result<(), DataValidationError> {
        for (field, value) in [
            ("source_item_id", self.source_item_id),
            ("target_item_id", self.target_item_id),
            ("number_of_likes", self.number_of_likes),
        ] {
            if value < 0 {
                return Err(DataValidationError::InvalidField {
                    field,
                    reason: format!("must not be negative, got {}", value),
                });
            }
        }
        validation::check_weight("recommendation_weight", self.recommendation_weight)?;
        Ok(())
    }
}

impl TryFrom<&Value> for Recommendation {
    type Error = DataValidationError;

    fn try_from(data: &Value) -> Result<Self, Self::Error> {
        let mut recommendation = Recommendation::default();
        recommendation.deserialize(data)?;
        Ok(recommendation)
    }
}
