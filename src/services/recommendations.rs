use std::sync::Arc;

use crate::{
    db::{RecommendationFilter, RecommendationStore, SortOrder},
    error::{AppError, AppResult, DataValidationError},
    models::{
        Page, PageRequest, Recommendation, RecommendationPatch, RecommendationStatus,
        RecommendationType,
    },
};

/// Lifecycle and query operations over the recommendation table.
///
/// Each call acquires what it needs from the injected store and releases it
/// before returning. Nothing here serializes concurrent writers: two updates
/// to the same id race and the last one wins.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn RecommendationStore>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn RecommendationStore>) -> Self {
        Self { store }
    }

    /// Persists a new recommendation and returns its id.
    ///
    /// Any id or timestamps already on `recommendation` are discarded; on
    /// success it holds the stored values. Storage failures surface as
    /// [`DataValidationError::Persistence`].
    pub async fn create(&self, recommendation: &mut Recommendation) -> AppResult<i64> {
        tracing::info!(
            store = self.store.name(),
            source_item_id = recommendation.source_item_id,
            target_item_id = recommendation.target_item_id,
            "Creating recommendation"
        );

        recommendation.id = None;
        recommendation.created_at = None;
        recommendation.updated_at = None;
        recommendation.validate()?;

        let saved = self.store.insert(recommendation).await.map_err(|e| {
            tracing::error!(error = %e, "Error creating recommendation");
            DataValidationError::Persistence(e.to_string())
        })?;

        let id = saved
            .id
            .ok_or_else(|| AppError::Internal("store returned no id".to_string()))?;
        *recommendation = saved;

        tracing::info!(id, "Recommendation created");
        Ok(id)
    }

    /// Re-persists the current field values under the existing id
    pub async fn update(&self, recommendation: &mut Recommendation) -> AppResult<()> {
        let id = recommendation.id.ok_or(DataValidationError::NotPersisted)?;
        recommendation.validate()?;

        tracing::info!(id, "Saving recommendation");

        let saved = self
            .store
            .update(recommendation)
            .await
            .map_err(|e| {
                tracing::error!(id, error = %e, "Error updating recommendation");
                DataValidationError::Persistence(e.to_string())
            })?
            .ok_or_else(|| not_found(id))?;

        *recommendation = saved;
        Ok(())
    }

    /// Merges `patch` into the recommendation, then persists it.
    /// `recommendation` is left unchanged if the update fails.
    pub async fn update_with(
        &self,
        recommendation: &mut Recommendation,
        patch: &RecommendationPatch,
    ) -> AppResult<()> {
        let mut merged = recommendation.clone();
        patch.apply(&mut merged);
        self.update(&mut merged).await?;
        *recommendation = merged;
        Ok(())
    }

    /// Permanently removes a recommendation; unknown ids are ignored
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        tracing::info!(id, "Deleting recommendation");
        self.store.delete(id).await
    }

    pub async fn find(&self, id: i64) -> AppResult<Option<Recommendation>> {
        tracing::debug!(id, "Processing lookup");
        self.store.get(id).await
    }

    pub async fn find_or_404(&self, id: i64) -> AppResult<Recommendation> {
        self.find(id).await?.ok_or_else(|| not_found(id))
    }

    /// Every recommendation, in id order
    pub async fn all(&self) -> AppResult<Vec<Recommendation>> {
        tracing::debug!("Processing all recommendations");
        self.store.list(&RecommendationFilter::default(), None).await
    }

    /// One page of the recommendations matching both optional filters.
    /// A page past the end has no items.
    pub async fn paginate(
        &self,
        request: PageRequest,
        recommendation_type: Option<RecommendationType>,
        status: Option<RecommendationStatus>,
    ) -> AppResult<Page<Recommendation>> {
        let filter = RecommendationFilter {
            recommendation_type,
            status,
            ..Default::default()
        };

        let (items, total) = self
            .store
            .page(&filter, request.offset(), request.size)
            .await?;

        tracing::debug!(
            page = request.index,
            per_page = request.size,
            total,
            returned = items.len(),
            "Paginated recommendations"
        );

        Ok(Page::new(request, total, items))
    }

    /// Recommendations for a source item, sorted by weight
    pub async fn find_by_source_item_id(
        &self,
        source_item_id: i64,
        order: SortOrder,
    ) -> AppResult<Vec<Recommendation>> {
        tracing::debug!(source_item_id, %order, "Processing source item query");
        let filter = RecommendationFilter {
            source_item_id: Some(source_item_id),
            ..Default::default()
        };
        self.store.list(&filter, Some(order)).await
    }

    /// Like [`Self::find_by_source_item_id`], restricted to `VALID` status
    pub async fn find_valid_by_source_item_id(
        &self,
        source_item_id: i64,
        order: SortOrder,
    ) -> AppResult<Vec<Recommendation>> {
        tracing::debug!(source_item_id, %order, "Processing valid source item query");
        let filter = RecommendationFilter {
            source_item_id: Some(source_item_id),
            status: Some(RecommendationStatus::Valid),
            ..Default::default()
        };
        self.store.list(&filter, Some(order)).await
    }

    pub async fn find_by_target_item_id(
        &self,
        target_item_id: i64,
    ) -> AppResult<Vec<Recommendation>> {
        tracing::debug!(target_item_id, "Processing target item query");
        let filter = RecommendationFilter {
            target_item_id: Some(target_item_id),
            ..Default::default()
        };
        self.store.list(&filter, None).await
    }

    pub async fn find_by_recommendation_type(
        &self,
        recommendation_type: RecommendationType,
    ) -> AppResult<Vec<Recommendation>> {
        tracing::debug!(%recommendation_type, "Processing type query");
        let filter = RecommendationFilter {
            recommendation_type: Some(recommendation_type),
            ..Default::default()
        };
        self.store.list(&filter, None).await
    }

    pub async fn filter_all_by_status(
        &self,
        status: RecommendationStatus,
    ) -> AppResult<Vec<Recommendation>> {
        tracing::debug!(%status, "Processing status query");
        let filter = RecommendationFilter {
            status: Some(status),
            ..Default::default()
        };
        self.store.list(&filter, None).await
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Recommendation with id '{}' was not found.", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{store::MockRecommendationStore, MemoryRecommendationStore};
    use tokio_test::{assert_err, assert_ok};

    fn memory_service() -> RecommendationService {
        RecommendationService::new(Arc::new(MemoryRecommendationStore::new()))
    }

    fn rec(source: i64, weight: f64) -> Recommendation {
        Recommendation::new(source, source + 100, RecommendationType::CrossSell, weight)
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_id() {
        let service = memory_service();
        let mut first = rec(1, 0.5);
        first.id = Some(42);

        let id = service.create(&mut first).await.unwrap();
        assert_eq!(first.id, Some(id));
        assert_ne!(id, 42);
        assert_eq!(first.created_at, first.updated_at);

        let mut second = rec(1, 0.5);
        let second_id = service.create(&mut second).await.unwrap();
        assert_ne!(second_id, id);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_entity() {
        let service = memory_service();
        let mut bad = rec(1, 1.8);
        let err = service.create(&mut bad).await.unwrap_err();
        assert!(matches!(err, AppError::DataValidation(_)));
        assert!(service.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_store_failure_becomes_validation_error() {
        let mut store = MockRecommendationStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::Internal("null value in column".to_string())));

        let service = RecommendationService::new(Arc::new(store));
        let mut draft = rec(1, 0.2);
        let err = service.create(&mut draft).await.unwrap_err();

        match err {
            AppError::DataValidation(DataValidationError::Persistence(cause)) => {
                assert!(cause.contains("null value"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(draft.id, None);
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        // No expectations: touching the store would panic
        let service = RecommendationService::new(Arc::new(MockRecommendationStore::new()));
        let mut draft = rec(1, 0.2);
        let err = service.update(&mut draft).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::DataValidation(DataValidationError::NotPersisted)
        ));
    }

    #[tokio::test]
    async fn test_paginate_with_unbounded_page_size() {
        let service = memory_service();
        service.create(&mut rec(1, 0.1)).await.unwrap();
        service.create(&mut rec(2, 0.2)).await.unwrap();

        let page = service
            .paginate(PageRequest::new(1, i64::MAX).unwrap(), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.pages, 1);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_update_store_failure_becomes_validation_error() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_update()
            .times(2)
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));

        let service = RecommendationService::new(Arc::new(store));
        let mut saved = rec(1, 0.2);
        saved.id = Some(5);

        let err = service.update(&mut saved).await.unwrap_err();
        match err {
            AppError::DataValidation(DataValidationError::Persistence(cause)) => {
                assert!(cause.contains("connection reset"))
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let before = saved.clone();
        let patch = RecommendationPatch {
            recommendation_weight: Some(0.9),
            status: Some(RecommendationStatus::Deprecated),
            ..Default::default()
        };
        let err = service.update_with(&mut saved, &patch).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::DataValidation(DataValidationError::Persistence(_))
        ));
        assert_eq!(saved, before);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_advances_updated_at() {
        let service = memory_service();
        let mut r = rec(1, 0.2);
        let id = service.create(&mut r).await.unwrap();
        let before = r.updated_at;

        r.recommendation_weight = 0.9;
        assert_ok!(service.update(&mut r).await);

        assert_eq!(r.id, Some(id));
        assert!(r.updated_at >= before);
        assert_eq!(service.find_or_404(id).await.unwrap().recommendation_weight, 0.9);
    }

    #[tokio::test]
    async fn test_update_with_patch() {
        let service = memory_service();
        let mut r = rec(1, 0.2);
        service.create(&mut r).await.unwrap();

        let patch = RecommendationPatch {
            status: Some(RecommendationStatus::Deprecated),
            ..Default::default()
        };
        assert_ok!(service.update_with(&mut r, &patch).await);
        assert_eq!(r.status, RecommendationStatus::Deprecated);
        assert_eq!(r.recommendation_weight, 0.2);
    }

    #[tokio::test]
    async fn test_update_deleted_row_is_not_found() {
        let service = memory_service();
        let mut r = rec(1, 0.2);
        let id = service.create(&mut r).await.unwrap();
        service.delete(id).await.unwrap();

        let err = service.update(&mut r).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let service = memory_service();
        let mut r = rec(1, 0.2);
        let id = service.create(&mut r).await.unwrap();

        assert_ok!(service.delete(id).await);
        assert_ok!(service.delete(id).await);
        assert_eq!(service.find(id).await.unwrap(), None);
        assert_err!(service.find_or_404(id).await);
    }

    #[tokio::test]
    async fn test_paginate() {
        let service = memory_service();
        for i in 0..14 {
            service.create(&mut rec(i, 0.1)).await.unwrap();
        }
        let mut up_sell = Recommendation::new(99, 1, RecommendationType::UpSell, 0.3)
            .with_status(RecommendationStatus::Valid);
        service.create(&mut up_sell).await.unwrap();

        let page = service
            .paginate(PageRequest::new(1, 5).unwrap(), None, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!((page.total, page.pages), (15, 3));

        let page = service
            .paginate(PageRequest::new(2, 10).unwrap(), None, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);

        let page = service
            .paginate(PageRequest::new(9, 10).unwrap(), None, None)
            .await
            .unwrap();
        assert!(page.items.is_empty());

        let page = service
            .paginate(
                PageRequest::new(1, 10).unwrap(),
                Some(RecommendationType::UpSell),
                None,
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let page = service
            .paginate(
                PageRequest::new(1, 10).unwrap(),
                Some(RecommendationType::UpSell),
                Some(RecommendationStatus::Deprecated),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_find_by_source_item_id_sorted() {
        let service = memory_service();
        for w in [0.4, 0.9, 0.1, 0.4] {
            service.create(&mut rec(7, w)).await.unwrap();
        }
        service.create(&mut rec(8, 0.5)).await.unwrap();

        let asc = service.find_by_source_item_id(7, SortOrder::Asc).await.unwrap();
        let weights: Vec<f64> = asc.iter().map(|r| r.recommendation_weight).collect();
        assert_eq!(weights, vec![0.1, 0.4, 0.4, 0.9]);
        assert!(asc[1].id < asc[2].id);

        let desc = service.find_by_source_item_id(7, SortOrder::Desc).await.unwrap();
        let weights: Vec<f64> = desc.iter().map(|r| r.recommendation_weight).collect();
        assert_eq!(weights, vec![0.9, 0.4, 0.4, 0.1]);
        assert!(desc.iter().all(|r| r.source_item_id == 7));
    }

    #[tokio::test]
    async fn test_find_valid_by_source_item_id() {
        let service = memory_service();
        let mut valid = rec(3, 0.3).with_status(RecommendationStatus::Valid);
        let mut stale = rec(3, 0.6).with_status(RecommendationStatus::Deprecated);
        service.create(&mut valid).await.unwrap();
        service.create(&mut stale).await.unwrap();

        let found = service
            .find_valid_by_source_item_id(3, SortOrder::Desc)
            .await
            .unwrap();
        assert_eq!(found, vec![valid]);
    }

    #[tokio::test]
    async fn test_equality_filters() {
        let service = memory_service();
        let mut a = Recommendation::new(1, 50, RecommendationType::Accessory, 0.2)
            .with_status(RecommendationStatus::OutOfStock);
        let mut b = Recommendation::new(2, 50, RecommendationType::Substitute, 0.2);
        service.create(&mut a).await.unwrap();
        service.create(&mut b).await.unwrap();

        assert_eq!(
            service
                .find_by_recommendation_type(RecommendationType::Accessory)
                .await
                .unwrap(),
            vec![a.clone()]
        );
        assert_eq!(
            service
                .filter_all_by_status(RecommendationStatus::OutOfStock)
                .await
                .unwrap(),
            vec![a]
        );
        assert_eq!(service.find_by_target_item_id(50).await.unwrap().len(), 2);
        assert_eq!(service.all().await.unwrap().len(), 2);
    }
}
