use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::Recommendation,
};

use super::store::{RecommendationFilter, RecommendationStore, SortOrder};

/// Process-local store, keyed by id so iteration follows insertion order
#[derive(Clone, Default)]
pub struct MemoryRecommendationStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    rows: BTreeMap<i64, Recommendation>,
    last_id: i64,
}

impl MemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecommendationStore for MemoryRecommendationStore {
    async fn insert(&self, new: &Recommendation) -> AppResult<Recommendation> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = inner.last_id;

        let now = Utc::now();
        let row = Recommendation {
            id: Some(id),
            created_at: Some(now),
            updated_at: Some(now),
            ..new.clone()
        };

        inner.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, recommendation: &Recommendation) -> AppResult<Option<Recommendation>> {
        let id = recommendation
            .id
            .ok_or_else(|| AppError::Internal("update without id".to_string()))?;

        let mut inner = self.inner.write().await;
        let Some(existing) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };

        *existing = Recommendation {
            id: Some(id),
            created_at: existing.created_at,
            updated_at: existing.updated_at.max(Some(Utc::now())),
            ..recommendation.clone()
        };
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        self.inner.write().await.rows.remove(&id);
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Option<Recommendation>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &RecommendationFilter,
        order: Option<SortOrder>,
    ) -> AppResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Recommendation> = inner
            .rows
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        // sort_by is stable, so equal weights stay in id order
        match order {
            Some(SortOrder::Asc) => {
                rows.sort_by(|a, b| a.recommendation_weight.total_cmp(&b.recommendation_weight))
            }
            Some(SortOrder::Desc) => {
                rows.sort_by(|a, b| b.recommendation_weight.total_cmp(&a.recommendation_weight))
            }
            None => {}
        }

        Ok(rows)
    }

    async fn page(
        &self,
        filter: &RecommendationFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Recommendation>, i64)> {
        let inner = self.inner.read().await;
        let matching: Vec<&Recommendation> =
            inner.rows.values().filter(|r| filter.matches(r)).collect();

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect();

        Ok((items, total))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecommendationStatus, RecommendationType};

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids_and_timestamps() {
        let store = MemoryRecommendationStore::new();
        let mut draft = Recommendation::new(1, 2, RecommendationType::UpSell, 0.5);
        draft.id = Some(77);

        let first = store.insert(&draft).await.unwrap();
        let second = store.insert(&draft).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(first.created_at, first.updated_at);
        assert!(first.created_at.is_some());
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let store = MemoryRecommendationStore::new();
        let saved = store
            .insert(&Recommendation::new(1, 2, RecommendationType::UpSell, 0.5))
            .await
            .unwrap();

        let mut changed = saved.clone();
        changed.status = RecommendationStatus::Valid;
        changed.created_at = None;

        let updated = store.update(&changed).await.unwrap().unwrap();
        assert_eq!(updated.created_at, saved.created_at);
        assert!(updated.updated_at >= saved.updated_at);
        assert_eq!(updated.status, RecommendationStatus::Valid);
    }

    #[tokio::test]
    async fn test_update_never_moves_updated_at_backwards() {
        let store = MemoryRecommendationStore::new();
        let saved = store
            .insert(&Recommendation::new(1, 2, RecommendationType::UpSell, 0.5))
            .await
            .unwrap();
        let id = saved.id.unwrap();

        // Stored stamp ahead of the wall clock
        let ahead = Utc::now() + chrono::Duration::hours(1);
        store.inner.write().await.rows.get_mut(&id).unwrap().updated_at = Some(ahead);

        let updated = store.update(&saved).await.unwrap().unwrap();
        assert_eq!(updated.updated_at, Some(ahead));
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let store = MemoryRecommendationStore::new();
        let mut ghost = Recommendation::new(1, 2, RecommendationType::UpSell, 0.5);
        ghost.id = Some(10);
        assert_eq!(store.update(&ghost).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_page_slices_in_id_order() {
        let store = MemoryRecommendationStore::new();
        for i in 0..7 {
            store
                .insert(&Recommendation::new(i, 0, RecommendationType::Unknown, 0.1))
                .await
                .unwrap();
        }

        let (items, total) = store
            .page(&RecommendationFilter::default(), 5, 5)
            .await
            .unwrap();
        assert_eq!(total, 7);
        assert_eq!(
            items.iter().map(|r| r.source_item_id).collect::<Vec<_>>(),
            vec![5, 6]
        );

        let (items, total) = store
            .page(&RecommendationFilter::default(), 50, 5)
            .await
            .unwrap();
        assert_eq!(total, 7);
        assert!(items.is_empty());
    }
}
