//! HTTP surface: cached home-feed reads, the admin auto-feature trigger and
//! a database health probe.

mod admin;
mod home;
mod middleware;
mod state;

pub use admin::AutoFeatureResponse;
pub use state::HttpState;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::application::{error::ErrorReport, repos::RepoError};

pub fn build_router(state: HttpState) -> Router {
    let admin = Router::new()
        .route("/api/admin/auto-feature", post(admin::run_auto_feature))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/api/home", get(home::sections))
        .route("/api/home/featured", get(home::featured))
        .route("/api/home/trending", get(home::trending))
        .route("/api/home/recent", get(home::recent))
        .route("/api/home/tags", get(home::tags))
        .route("/api/home/stats", get(home::stats))
        .route("/health", get(health))
        .merge(admin)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
