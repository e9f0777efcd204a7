//! Postgres-backed repository implementations.

mod featured;
mod home;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{RepoError, StoreHealth};

/// Engagement projection shared by every post listing: the raw `views`
/// column plus correlated counts of likes, comments and bookmarks.
const POST_ENGAGEMENT_COLUMNS: &str = "p.id, p.views, p.featured, p.published_at, \
    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count, \
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count, \
    (SELECT COUNT(*) FROM bookmarks b WHERE b.post_id = p.id) AS bookmark_count";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}

#[async_trait]
impl StoreHealth for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
