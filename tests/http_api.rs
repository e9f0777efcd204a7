mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::AUTHORIZATION},
};
use serde_json::Value;
use spotlight::application::{
    auto_feature::{AutoFeatureService, FeaturePolicy},
    home::HomeFeedService,
};
use spotlight::cache::{CacheConfig, QueryCache};
use spotlight::infra::http::{HttpState, build_router};
use tower::ServiceExt;

use support::{InMemoryStore, aged_from_wall_clock, featured, post, tag};

const TOKEN: &str = "admin-secret";

fn app(store: &Arc<InMemoryStore>) -> Router {
    app_with_token(store, Some(TOKEN))
}

fn app_with_token(store: &Arc<InMemoryStore>, admin_token: Option<&str>) -> Router {
    let cache = Arc::new(QueryCache::default());
    let state = HttpState {
        home: Arc::new(HomeFeedService::new(
            store.clone(),
            Arc::clone(&cache),
            CacheConfig::default(),
        )),
        auto_feature: Arc::new(
            AutoFeatureService::new(store.clone(), FeaturePolicy::default()).with_cache(cache),
        ),
        health: store.clone(),
        admin_token: admin_token.map(Arc::from),
    };
    build_router(state)
}

fn auto_feature_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/auto-feature");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be json")
}

#[tokio::test]
async fn auto_feature_requires_bearer_token() {
    let store = Arc::new(InMemoryStore::default());
    let app = app(&store);

    for token in [None, Some("wrong-token")] {
        let response = app
            .clone()
            .oneshot(auto_feature_request(token))
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Unauthorized");
    }
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auto_feature_is_rejected_when_no_admin_token_is_configured() {
    let store = Arc::new(InMemoryStore::with_posts([aged_from_wall_clock(post(
        1, 2, 800, 0, 0, 0,
    ))]));

    let response = app_with_token(&store, None)
        .oneshot(auto_feature_request(Some(TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Unauthorized");
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    assert!(!store.is_featured(1));
}

#[tokio::test]
async fn auto_feature_reports_counts() {
    let store = Arc::new(InMemoryStore::with_posts([
        aged_from_wall_clock(post(1, 2, 800, 0, 0, 0)),
        aged_from_wall_clock(post(2, 3, 900, 0, 0, 0)),
        aged_from_wall_clock(featured(post(3, 90, 10, 0, 0, 0))),
    ]));

    let response = app(&store)
        .oneshot(auto_feature_request(Some(TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["featured"], 2);
    assert_eq!(body["unfeatured"], 1);
    assert_eq!(
        body["message"],
        "Auto-featured 2 posts and unfeatured 1 old posts"
    );
    assert_eq!(store.featured_ids(), vec![1, 2]);
}

#[tokio::test]
async fn auto_feature_store_failure_is_a_500_with_zero_counts() {
    let store = Arc::new(InMemoryStore::with_posts([aged_from_wall_clock(post(
        1, 2, 800, 0, 0, 0,
    ))]));
    store.fail_candidate_reads();

    let response = app(&store)
        .oneshot(auto_feature_request(Some(TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["featured"], 0);
    assert_eq!(body["unfeatured"], 0);
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn overlapping_auto_feature_requests_conflict() {
    let store = Arc::new(InMemoryStore::with_posts([aged_from_wall_clock(post(
        1, 2, 800, 0, 0, 0,
    ))]));
    store.block_candidate_reads();
    let app = app(&store);

    let first = tokio::spawn(
        app.clone()
            .oneshot(auto_feature_request(Some(TOKEN))),
    );
    store.candidate_read_entered.notified().await;

    let second = app
        .clone()
        .oneshot(auto_feature_request(Some(TOKEN)))
        .await
        .expect("router should respond");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(second).await["message"],
        "Auto-feature run already in progress"
    );

    store.candidate_read_release.notify_one();
    let first = first
        .await
        .expect("task joins")
        .expect("router should respond");
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(json_body(first).await["featured"], 1);
}

#[tokio::test]
async fn featured_section_is_served_from_cache() {
    let store = Arc::new(InMemoryStore::with_posts([
        featured(post(1, 2, 800, 0, 0, 0)),
        post(2, 2, 10, 0, 0, 0),
    ]));
    let app = app(&store);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/api/home/featured"))
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    assert_eq!(store.featured_list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn auto_feature_run_refreshes_featured_section() {
    let store = Arc::new(InMemoryStore::with_posts([aged_from_wall_clock(post(
        1, 2, 800, 0, 0, 0,
    ))]));
    let app = app(&store);

    let before = app
        .clone()
        .oneshot(get("/api/home/featured"))
        .await
        .expect("router should respond");
    assert_eq!(json_body(before).await.as_array().map(Vec::len), Some(0));

    let run = app
        .clone()
        .oneshot(auto_feature_request(Some(TOKEN)))
        .await
        .expect("router should respond");
    assert_eq!(run.status(), StatusCode::OK);

    let after = app
        .clone()
        .oneshot(get("/api/home/featured"))
        .await
        .expect("router should respond");
    assert_eq!(json_body(after).await.as_array().map(Vec::len), Some(1));
    assert_eq!(store.featured_list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn home_sections_bundle_every_list() {
    let store = Arc::new(
        InMemoryStore::with_posts([
            aged_from_wall_clock(featured(post(1, 1, 800, 0, 0, 0))),
            aged_from_wall_clock(post(2, 2, 300, 0, 0, 0)),
            aged_from_wall_clock(post(3, 20, 900, 0, 0, 0)),
        ])
        .with_tags([tag(10, "Rust", 3, Some(1))]),
    );

    let response = app(&store)
        .oneshot(get("/api/home"))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["featured_posts"].as_array().map(Vec::len), Some(1));
    // Post 3 is outside the seven-day trending window.
    assert_eq!(body["trending_posts"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["recent_posts"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["trending_tags"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["stats"]["total_posts"], 3);
}

#[tokio::test]
async fn trending_tags_are_served_from_cache() {
    let store = Arc::new(InMemoryStore::default().with_tags(
        (0..9).map(|n| tag(n, &format!("tag-{n}"), 10 - n as u64, (n % 2 == 0).then_some(n))),
    ));
    let app = app(&store);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/api/home/tags"))
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let tags = body.as_array().expect("tag list");
        assert_eq!(tags.len(), 7);
        assert_eq!(tags[0]["name"], "tag-0");
        assert_eq!(tags[0]["post_count"], 10);
        assert_eq!(tags[0]["showcase_post"]["cover_image"], "/covers/0.png");
        assert!(tags[1]["showcase_post"].is_null());
    }

    assert_eq!(store.tag_list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn health_reflects_store_reachability() {
    let store = Arc::new(InMemoryStore::default());
    let app = app(&store);

    let healthy = app
        .clone()
        .oneshot(get("/health"))
        .await
        .expect("router should respond");
    assert_eq!(healthy.status(), StatusCode::NO_CONTENT);

    store.fail_ping();
    let unhealthy = app
        .oneshot(get("/health"))
        .await
        .expect("router should respond");
    assert_eq!(unhealthy.status(), StatusCode::SERVICE_UNAVAILABLE);
}
