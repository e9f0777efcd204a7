use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::{
    auto_feature::{AutoFeatureError, AutoFeatureReport},
    error::ErrorReport,
};

use super::state::HttpState;

const SOURCE: &str = "infra::http::admin::run_auto_feature";

#[derive(Debug, Serialize)]
pub struct AutoFeatureResponse {
    pub success: bool,
    pub featured: usize,
    pub unfeatured: usize,
    pub message: String,
}

impl AutoFeatureResponse {
    fn completed(report: &AutoFeatureReport) -> Self {
        Self {
            success: true,
            featured: report.promoted,
            unfeatured: report.demoted,
            message: report.summary(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            featured: 0,
            unfeatured: 0,
            message: message.into(),
        }
    }
}

/// `POST /api/admin/auto-feature`
pub async fn run_auto_feature(State(state): State<HttpState>) -> Response {
    match state.auto_feature.run().await {
        Ok(report) => Json(AutoFeatureResponse::completed(&report)).into_response(),
        Err(err) => auto_feature_error_response(err),
    }
}

fn auto_feature_error_response(err: AutoFeatureError) -> Response {
    let (status, message) = match &err {
        AutoFeatureError::AlreadyRunning => (
            StatusCode::CONFLICT,
            "Auto-feature run already in progress",
        ),
        AutoFeatureError::Store { .. } | AutoFeatureError::PartialWrite { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    };

    let mut report = ErrorReport::from_error(SOURCE, status, &err);
    report.messages.extend(
        err.failed_post_ids()
            .into_iter()
            .map(|post_id| format!("featured flag write failed for post {post_id}")),
    );

    let mut response = (status, Json(AutoFeatureResponse::failed(message))).into_response();
    report.attach(&mut response);
    response
}
