use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{POST_ENGAGEMENT_COLUMNS, PostgresRepositories, map_sqlx_error, util::counter};
use crate::application::repos::{FeaturedPostsRepo, RepoError};
use crate::domain::entities::PostMetrics;

#[derive(sqlx::FromRow)]
pub(crate) struct PostMetricsRow {
    pub(crate) id: Uuid,
    pub(crate) views: i64,
    pub(crate) featured: bool,
    pub(crate) published_at: OffsetDateTime,
    pub(crate) like_count: i64,
    pub(crate) comment_count: i64,
    pub(crate) bookmark_count: i64,
}

impl TryFrom<PostMetricsRow> for PostMetrics {
    type Error = RepoError;

    fn try_from(row: PostMetricsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            views: counter("views", row.views)?,
            like_count: counter("like_count", row.like_count)?,
            comment_count: counter("comment_count", row.comment_count)?,
            bookmark_count: counter("bookmark_count", row.bookmark_count)?,
            featured: row.featured,
            published_at: row.published_at,
        })
    }
}

impl PostgresRepositories {
    async fn fetch_post_metrics(
        &self,
        condition: &str,
        bound: OffsetDateTime,
    ) -> Result<Vec<PostMetrics>, RepoError> {
        let sql = format!(
            "SELECT {POST_ENGAGEMENT_COLUMNS} FROM posts p \
             WHERE p.status = 'published' AND {condition} \
             ORDER BY p.published_at, p.id"
        );

        let rows = sqlx::query_as::<_, PostMetricsRow>(&sql)
            .bind(bound)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(PostMetrics::try_from).collect()
    }
}

#[async_trait]
impl FeaturedPostsRepo for PostgresRepositories {
    async fn list_candidate_posts(
        &self,
        published_after: OffsetDateTime,
    ) -> Result<Vec<PostMetrics>, RepoError> {
        self.fetch_post_metrics("p.featured = FALSE AND p.published_at >= $1", published_after)
            .await
    }

    async fn list_featured_posts(
        &self,
        published_before: OffsetDateTime,
    ) -> Result<Vec<PostMetrics>, RepoError> {
        self.fetch_post_metrics("p.featured = TRUE AND p.published_at < $1", published_before)
            .await
    }

    async fn set_featured(&self, post_id: Uuid, featured: bool) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE posts SET featured = $2, updated_at = now() WHERE id = $1",
        )
        .bind(post_id)
        .bind(featured)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
