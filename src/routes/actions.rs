use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Recommendation, RecommendationStatus},
    state::AppState,
};

use super::recommendations::query_params;

#[derive(Debug, Deserialize)]
pub struct ActivationQuery {
    status: Option<String>,
}

/// PUT /recommendations/:id/like
pub async fn like(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Recommendation>> {
    let mut recommendation = state.recommendations.find_or_404(id).await?;
    recommendation.like()?;
    state.recommendations.update(&mut recommendation).await?;

    tracing::info!(id, likes = recommendation.number_of_likes, "Recommendation liked");
    Ok(Json(recommendation))
}

/// PUT /recommendations/:id/deactivation
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Recommendation>> {
    let mut recommendation = state.recommendations.find_or_404(id).await?;
    recommendation.deactivate();
    state.recommendations.update(&mut recommendation).await?;

    tracing::info!(id, "Recommendation deactivated");
    Ok(Json(recommendation))
}

/// PUT /recommendations/:id/activation?status=VALID|OUT_OF_STOCK
///
/// The allow-list lives here; the model's `activate` takes any status.
pub async fn activate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    query: Result<Query<ActivationQuery>, QueryRejection>,
) -> AppResult<Json<Recommendation>> {
    let params = query_params(query)?;
    let mut recommendation = state.recommendations.find_or_404(id).await?;

    let target = params
        .status
        .as_deref()
        .and_then(|s| RecommendationStatus::parse_lenient(s).ok())
        .filter(RecommendationStatus::is_activation_target)
        .ok_or_else(|| {
            tracing::warn!(id, status = ?params.status, "Rejected activation status");
            AppError::BadRequest(
                "status query parameter must be VALID or OUT_OF_STOCK".to_string(),
            )
        })?;

    recommendation.activate(target);
    state.recommendations.update(&mut recommendation).await?;

    tracing::info!(id, status = %target, "Recommendation activated");
    Ok(Json(recommendation))
}
