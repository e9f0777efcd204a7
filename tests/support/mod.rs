//! In-memory store shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use spotlight::application::repos::{FeaturedPostsRepo, HomeFeedRepo, RepoError, StoreHealth};
use spotlight::domain::entities::{
    PlatformStats, PostMetrics, PostSummary, TagShowcase, TrendingTag,
};
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::Notify;
use uuid::Uuid;

pub const NOW: OffsetDateTime = datetime!(2026-06-01 12:00 UTC);

pub fn post(
    id: u128,
    age_days: i64,
    views: u64,
    likes: u64,
    comments: u64,
    bookmarks: u64,
) -> PostMetrics {
    PostMetrics {
        id: Uuid::from_u128(id),
        views,
        like_count: likes,
        comment_count: comments,
        bookmark_count: bookmarks,
        featured: false,
        published_at: NOW - Duration::days(age_days),
    }
}

pub fn featured(mut post: PostMetrics) -> PostMetrics {
    post.featured = true;
    post
}

pub fn tag(id: u128, name: &str, post_count: u64, showcase: Option<u128>) -> TrendingTag {
    TrendingTag {
        id: Uuid::from_u128(id),
        name: name.to_string(),
        slug: name.to_lowercase(),
        post_count,
        showcase_post: showcase.map(|post_id| TagShowcase {
            id: Uuid::from_u128(post_id),
            title: format!("Post {post_id}"),
            slug: format!("post-{post_id}"),
            cover_image: format!("/covers/{post_id}.png"),
            excerpt: None,
        }),
    }
}

/// Shift a fixture built against [`NOW`] so its age holds against the wall clock.
pub fn aged_from_wall_clock(mut post: PostMetrics) -> PostMetrics {
    let age = NOW - post.published_at;
    post.published_at = OffsetDateTime::now_utc() - age;
    post
}

#[derive(Default)]
pub struct InMemoryStore {
    posts: Mutex<Vec<PostMetrics>>,
    tags: Mutex<Vec<TrendingTag>>,
    fail_candidate_reads: AtomicBool,
    fail_featured_reads: AtomicBool,
    fail_writes_for: Mutex<HashSet<Uuid>>,
    block_candidate_reads: AtomicBool,
    pub candidate_read_entered: Notify,
    pub candidate_read_release: Notify,
    pub writes: AtomicUsize,
    pub featured_list_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub tag_list_calls: AtomicUsize,
    ping_fails: AtomicBool,
}

impl InMemoryStore {
    pub fn with_posts(posts: impl IntoIterator<Item = PostMetrics>) -> Self {
        let store = Self::default();
        store
            .posts
            .lock()
            .expect("store lock")
            .extend(posts);
        store
    }

    /// Tags returned by the trending-tags listing, already ranked.
    pub fn with_tags(self, tags: impl IntoIterator<Item = TrendingTag>) -> Self {
        self.tags.lock().expect("store lock").extend(tags);
        self
    }

    pub fn is_featured(&self, id: u128) -> bool {
        self.posts
            .lock()
            .expect("store lock")
            .iter()
            .find(|post| post.id == Uuid::from_u128(id))
            .is_some_and(|post| post.featured)
    }

    pub fn featured_ids(&self) -> Vec<u128> {
        let mut ids: Vec<u128> = self
            .posts
            .lock()
            .expect("store lock")
            .iter()
            .filter(|post| post.featured)
            .map(|post| post.id.as_u128())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn fail_candidate_reads(&self) {
        self.fail_candidate_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_featured_reads(&self) {
        self.fail_featured_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes_for(&self, id: u128) {
        self.fail_writes_for
            .lock()
            .expect("store lock")
            .insert(Uuid::from_u128(id));
    }

    pub fn block_candidate_reads(&self) {
        self.block_candidate_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_ping(&self) {
        self.ping_fails.store(true, Ordering::SeqCst);
    }

    fn snapshot(&self, keep: impl Fn(&PostMetrics) -> bool) -> Vec<PostMetrics> {
        self.posts
            .lock()
            .expect("store lock")
            .iter()
            .filter(|post| keep(post))
            .cloned()
            .collect()
    }

    fn summaries(posts: Vec<PostMetrics>) -> Vec<PostSummary> {
        posts
            .into_iter()
            .map(|post| PostSummary {
                id: post.id,
                slug: format!("post-{}", post.id.as_u128()),
                title: format!("Post {}", post.id.as_u128()),
                excerpt: None,
                featured: post.featured,
                views: post.views,
                like_count: post.like_count,
                comment_count: post.comment_count,
                bookmark_count: post.bookmark_count,
                published_at: post.published_at,
            })
            .collect()
    }
}

#[async_trait]
impl FeaturedPostsRepo for InMemoryStore {
    async fn list_candidate_posts(
        &self,
        published_after: OffsetDateTime,
    ) -> Result<Vec<PostMetrics>, RepoError> {
        if self.block_candidate_reads.load(Ordering::SeqCst) {
            self.candidate_read_entered.notify_one();
            self.candidate_read_release.notified().await;
        }
        if self.fail_candidate_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(self.snapshot(|post| !post.featured && post.published_at >= published_after))
    }

    async fn list_featured_posts(
        &self,
        published_before: OffsetDateTime,
    ) -> Result<Vec<PostMetrics>, RepoError> {
        if self.fail_featured_reads.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection reset"));
        }
        Ok(self.snapshot(|post| post.featured && post.published_at < published_before))
    }

    async fn set_featured(&self, post_id: Uuid, featured: bool) -> Result<(), RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self
            .fail_writes_for
            .lock()
            .expect("store lock")
            .contains(&post_id)
        {
            return Err(RepoError::from_persistence("write rejected"));
        }

        let mut posts = self.posts.lock().expect("store lock");
        let post = posts
            .iter_mut()
            .find(|post| post.id == post_id)
            .ok_or(RepoError::NotFound)?;
        post.featured = featured;
        Ok(())
    }
}

#[async_trait]
impl HomeFeedRepo for InMemoryStore {
    async fn list_featured(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError> {
        self.featured_list_calls.fetch_add(1, Ordering::SeqCst);
        let mut posts = self.snapshot(|post| post.featured);
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.truncate(limit as usize);
        Ok(Self::summaries(posts))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError> {
        let mut posts = self.snapshot(|_| true);
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.truncate(limit as usize);
        Ok(Self::summaries(posts))
    }

    async fn list_trending(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostSummary>, RepoError> {
        let mut posts = self.snapshot(|post| post.published_at >= since);
        posts.sort_by(|a, b| b.views.cmp(&a.views));
        posts.truncate(limit as usize);
        Ok(Self::summaries(posts))
    }

    async fn list_trending_tags(
        &self,
        _since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<TrendingTag>, RepoError> {
        self.tag_list_calls.fetch_add(1, Ordering::SeqCst);
        let mut tags = self.tags.lock().expect("store lock").clone();
        tags.truncate(limit as usize);
        Ok(tags)
    }

    async fn platform_stats(&self) -> Result<PlatformStats, RepoError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let total_posts = self.posts.lock().expect("store lock").len() as u64;
        Ok(PlatformStats {
            total_posts,
            total_writers: 1,
            total_readers: 10,
        })
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.ping_fails.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("database unreachable"));
        }
        Ok(())
    }
}
