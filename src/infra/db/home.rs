use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{POST_ENGAGEMENT_COLUMNS, PostgresRepositories, map_sqlx_error, util::counter};
use crate::application::repos::{HomeFeedRepo, RepoError};
use crate::domain::entities::{PlatformStats, PostSummary, TagShowcase, TrendingTag};

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
    id: Uuid,
    slug: String,
    title: String,
    excerpt: Option<String>,
    featured: bool,
    views: i64,
    like_count: i64,
    comment_count: i64,
    bookmark_count: i64,
    published_at: OffsetDateTime,
}

impl TryFrom<PostSummaryRow> for PostSummary {
    type Error = RepoError;

    fn try_from(row: PostSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            excerpt: row.excerpt,
            featured: row.featured,
            views: counter("views", row.views)?,
            like_count: counter("like_count", row.like_count)?,
            comment_count: counter("comment_count", row.comment_count)?,
            bookmark_count: counter("bookmark_count", row.bookmark_count)?,
            published_at: row.published_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PlatformStatsRow {
    total_posts: i64,
    total_writers: i64,
    total_readers: i64,
}

#[derive(sqlx::FromRow)]
struct TrendingTagRow {
    id: Uuid,
    name: String,
    slug: String,
    post_count: i64,
    showcase_id: Option<Uuid>,
    showcase_title: Option<String>,
    showcase_slug: Option<String>,
    showcase_cover_image: Option<String>,
    showcase_excerpt: Option<String>,
}

impl TryFrom<TrendingTagRow> for TrendingTag {
    type Error = RepoError;

    fn try_from(row: TrendingTagRow) -> Result<Self, Self::Error> {
        let showcase_post = match (
            row.showcase_id,
            row.showcase_title,
            row.showcase_slug,
            row.showcase_cover_image,
        ) {
            (Some(id), Some(title), Some(slug), Some(cover_image)) => Some(TagShowcase {
                id,
                title,
                slug,
                cover_image,
                excerpt: row.showcase_excerpt,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            post_count: counter("post_count", row.post_count)?,
            showcase_post,
        })
    }
}

fn summaries(rows: Vec<PostSummaryRow>) -> Result<Vec<PostSummary>, RepoError> {
    rows.into_iter().map(PostSummary::try_from).collect()
}

#[async_trait]
impl HomeFeedRepo for PostgresRepositories {
    async fn list_featured(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError> {
        let sql = format!(
            "SELECT {POST_ENGAGEMENT_COLUMNS}, p.slug, p.title, p.excerpt FROM posts p \
             WHERE p.status = 'published' AND p.featured = TRUE \
             ORDER BY p.published_at DESC, p.id \
             LIMIT $1"
        );

        let rows = sqlx::query_as::<_, PostSummaryRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        summaries(rows)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError> {
        let sql = format!(
            "SELECT {POST_ENGAGEMENT_COLUMNS}, p.slug, p.title, p.excerpt FROM posts p \
             WHERE p.status = 'published' \
             ORDER BY p.published_at DESC, p.id \
             LIMIT $1"
        );

        let rows = sqlx::query_as::<_, PostSummaryRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        summaries(rows)
    }

    async fn list_trending(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostSummary>, RepoError> {
        let sql = format!(
            "SELECT {POST_ENGAGEMENT_COLUMNS}, p.slug, p.title, p.excerpt FROM posts p \
             WHERE p.status = 'published' AND p.published_at >= $1 \
             ORDER BY p.views DESC, like_count DESC, p.id \
             LIMIT $2"
        );

        let rows = sqlx::query_as::<_, PostSummaryRow>(&sql)
            .bind(since)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        summaries(rows)
    }

    async fn list_trending_tags(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<TrendingTag>, RepoError> {
        let rows = sqlx::query_as::<_, TrendingTagRow>(
            "SELECT t.id, t.name, t.slug, \
                (SELECT COUNT(*) FROM post_tags c WHERE c.tag_id = t.id) AS post_count, \
                s.id AS showcase_id, s.title AS showcase_title, s.slug AS showcase_slug, \
                s.cover_image AS showcase_cover_image, s.excerpt AS showcase_excerpt \
             FROM tags t \
             LEFT JOIN LATERAL ( \
                SELECT p.id, p.title, p.slug, p.cover_image, p.excerpt \
                FROM posts p JOIN post_tags pt ON pt.post_id = p.id \
                WHERE pt.tag_id = t.id AND p.status = 'published' AND p.cover_image IS NOT NULL \
                ORDER BY p.published_at DESC, p.views DESC \
                LIMIT 1 \
             ) s ON TRUE \
             WHERE EXISTS ( \
                SELECT 1 FROM post_tags r JOIN posts rp ON rp.id = r.post_id \
                WHERE r.tag_id = t.id AND rp.status = 'published' AND rp.published_at >= $1 \
             ) \
             ORDER BY post_count DESC, t.name \
             LIMIT $2",
        )
        .bind(since)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TrendingTag::try_from).collect()
    }

    async fn platform_stats(&self) -> Result<PlatformStats, RepoError> {
        let row = sqlx::query_as::<_, PlatformStatsRow>(
            "SELECT \
                (SELECT COUNT(*) FROM posts WHERE status = 'published') AS total_posts, \
                (SELECT COUNT(*) FROM users u \
                    WHERE EXISTS (SELECT 1 FROM posts a WHERE a.author_id = u.id)) AS total_writers, \
                (SELECT COUNT(*) FROM users) AS total_readers",
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PlatformStats {
            total_posts: counter("total_posts", row.total_posts)?,
            total_writers: counter("total_writers", row.total_writers)?,
            total_readers: counter("total_readers", row.total_readers)?,
        })
    }
}
