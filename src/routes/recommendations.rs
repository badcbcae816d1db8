use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    db::SortOrder,
    error::{AppError, AppResult},
    models::{
        Page, PageRequest, Recommendation, RecommendationPatch, RecommendationStatus,
        RecommendationType,
    },
    state::AppState,
};

use super::json_body;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "page-index")]
    page_index: Option<i64>,
    #[serde(rename = "page-size")]
    page_size: Option<i64>,
    #[serde(rename = "type")]
    recommendation_type: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SourceItemQuery {
    source_item_id: Option<i64>,
    status: Option<String>,
    sort_order: Option<String>,
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// GET /recommendations
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Page<Recommendation>>> {
    let params = query_params(query)?;

    let recommendation_type = params
        .recommendation_type
        .as_deref()
        .map(str::parse::<RecommendationType>)
        .transpose()?;
    let status = params
        .status
        .as_deref()
        .map(RecommendationStatus::parse_lenient)
        .transpose()?;

    let size = params
        .page_size
        .unwrap_or(state.default_page_size)
        .min(state.max_page_size);
    let request = PageRequest::new(params.page_index.unwrap_or(1), size)?;

    let page = state
        .recommendations
        .paginate(request, recommendation_type, status)
        .await?;

    tracing::info!(returned = page.items.len(), total = page.total, "Returning recommendations");
    Ok(Json(page))
}

/// GET /recommendations/source-product
pub async fn by_source_item(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SourceItemQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let params = query_params(query)?;

    let source_item_id = params
        .source_item_id
        .ok_or_else(|| AppError::BadRequest("source_item_id is required".to_string()))?;
    let order = SortOrder::parse_or_default(params.sort_order.as_deref());

    let recommendations = match params.status.as_deref() {
        None => {
            state
                .recommendations
                .find_by_source_item_id(source_item_id, order)
                .await?
        }
        Some(raw) => match RecommendationStatus::parse_lenient(raw)? {
            RecommendationStatus::Valid => {
                state
                    .recommendations
                    .find_valid_by_source_item_id(source_item_id, order)
                    .await?
            }
            other => {
                return Err(AppError::BadRequest(format!(
                    "status filter only supports VALID, got {}",
                    other
                )))
            }
        },
    };

    Ok(Json(recommendations))
}

/// GET /recommendations/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Recommendation>> {
    tracing::info!(id, "Request for recommendation");
    let recommendation = state.recommendations.find_or_404(id).await?;
    Ok(Json(recommendation))
}

/// POST /recommendations
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let data = json_body(&headers, &body)?;

    let mut recommendation = Recommendation::try_from(&data)?;
    let id = state.recommendations.create(&mut recommendation).await?;

    let location = format!("/recommendations/{}", id);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(recommendation),
    ))
}

/// PUT /recommendations/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Recommendation>> {
    let data = json_body(&headers, &body)?;

    let mut recommendation = state.recommendations.find_or_404(id).await?;
    let patch = RecommendationPatch::from_json(&data)?;
    state
        .recommendations
        .update_with(&mut recommendation, &patch)
        .await?;

    tracing::info!(id, "Recommendation updated");
    Ok(Json(recommendation))
}

/// DELETE /recommendations/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.recommendations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
