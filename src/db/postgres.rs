use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult, DataValidationError},
    models::Recommendation,
};

use super::store::{RecommendationFilter, RecommendationStore, SortOrder};

const COLUMNS: &str = "id, source_item_id, target_item_id, recommendation_type, \
     recommendation_weight, status, number_of_likes, created_at, updated_at";

/// Creates a PostgreSQL connection pool
///
/// Connections are checked out per operation and returned to the pool when
/// the operation finishes, whether it succeeded or not.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Row shape of the `recommendation` table; enums are stored by name
#[derive(Debug, FromRow)]
struct RecommendationRow {
    id: i64,
    source_item_id: i64,
    target_item_id: i64,
    recommendation_type: String,
    recommendation_weight: f64,
    status: String,
    number_of_likes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecommendationRow> for Recommendation {
    type Error = AppError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        let corrupt =
            |e: DataValidationError| AppError::Internal(format!("Corrupt row {}: {}", row.id, e));

        Ok(Recommendation {
            id: Some(row.id),
            source_item_id: row.source_item_id,
            target_item_id: row.target_item_id,
            recommendation_type: row.recommendation_type.parse().map_err(corrupt)?,
            recommendation_weight: row.recommendation_weight,
            status: row.status.parse().map_err(corrupt)?,
            number_of_likes: row.number_of_likes,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &RecommendationFilter) {
    qb.push(" WHERE TRUE");
    if let Some(v) = filter.source_item_id {
        qb.push(" AND source_item_id = ").push_bind(v);
    }
    if let Some(v) = filter.target_item_id {
        qb.push(" AND target_item_id = ").push_bind(v);
    }
    if let Some(v) = filter.recommendation_type {
        qb.push(" AND recommendation_type = ").push_bind(v.as_str());
    }
    if let Some(v) = filter.status {
        qb.push(" AND status = ").push_bind(v.as_str());
    }
}

fn into_models(rows: Vec<RecommendationRow>) -> AppResult<Vec<Recommendation>> {
    rows.into_iter().map(Recommendation::try_from).collect()
}

/// Recommendation store backed by the `recommendation` table
#[derive(Clone)]
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn insert(&self, new: &Recommendation) -> AppResult<Recommendation> {
        // Dropping the transaction on any error path rolls it back
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RecommendationRow>(&format!(
            "INSERT INTO recommendation \
             (source_item_id, target_item_id, recommendation_type, recommendation_weight, status, number_of_likes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        ))
        .bind(new.source_item_id)
        .bind(new.target_item_id)
        .bind(new.recommendation_type.as_str())
        .bind(new.recommendation_weight)
        .bind(new.status.as_str())
        .bind(new.number_of_likes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn update(&self, recommendation: &Recommendation) -> AppResult<Option<Recommendation>> {
        let id = recommendation
            .id
            .ok_or_else(|| AppError::Internal("update without id".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RecommendationRow>(&format!(
            "UPDATE recommendation SET \
             source_item_id = $2, target_item_id = $3, recommendation_type = $4, \
             recommendation_weight = $5, status = $6, number_of_likes = $7, \
             updated_at = GREATEST(now(), updated_at) \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(recommendation.source_item_id)
        .bind(recommendation.target_item_id)
        .bind(recommendation.recommendation_type.as_str())
        .bind(recommendation.recommendation_weight)
        .bind(recommendation.status.as_str())
        .bind(recommendation.number_of_likes)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        row.map(Recommendation::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendation WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Option<Recommendation>> {
        let row = sqlx::query_as::<_, RecommendationRow>(&format!(
            "SELECT {COLUMNS} FROM recommendation WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Recommendation::try_from).transpose()
    }

    async fn list(
        &self,
        filter: &RecommendationFilter,
        order: Option<SortOrder>,
    ) -> AppResult<Vec<Recommendation>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM recommendation"));
        push_filter(&mut qb, filter);
        qb.push(match order {
            Some(SortOrder::Asc) => " ORDER BY recommendation_weight ASC, id ASC",
            Some(SortOrder::Desc) => " ORDER BY recommendation_weight DESC, id ASC",
            None => " ORDER BY id ASC",
        });

        let rows = qb
            .build_query_as::<RecommendationRow>()
            .fetch_all(&self.pool)
            .await?;
        into_models(rows)
    }

    async fn page(
        &self,
        filter: &RecommendationFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Recommendation>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recommendation");
        push_filter(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM recommendation"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build_query_as::<RecommendationRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok((into_models(rows)?, total))
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
