use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::application::error::HttpError;

use super::state::HttpState;

/// `GET /api/home`
pub async fn sections(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let sections = state.home.sections().await?;
    Ok(Json(sections).into_response())
}

/// `GET /api/home/featured`
pub async fn featured(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let posts = state.home.featured_posts().await?;
    Ok(Json(posts).into_response())
}

/// `GET /api/home/trending`
pub async fn trending(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let posts = state.home.trending_posts().await?;
    Ok(Json(posts).into_response())
}

/// `GET /api/home/recent`
pub async fn recent(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let posts = state.home.recent_posts().await?;
    Ok(Json(posts).into_response())
}

/// `GET /api/home/tags`
pub async fn tags(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let tags = state.home.trending_tags().await?;
    Ok(Json(tags).into_response())
}

/// `GET /api/home/stats`
pub async fn stats(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let stats = state.home.platform_stats().await?;
    Ok(Json(stats).into_response())
}
