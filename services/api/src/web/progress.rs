//! services/api/src/web/progress.rs
//!
//! REST handlers that record and remove lesson completions.

use crate::web::{
    rest::{ApiJson, ApiQuery, RestResult},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use lesson_planner_core::{
    payloads::{ApiErrorBody, ProgressAward, ProgressRequest, SuccessResponse},
    progress::award_for,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ProgressQuery {
    pub student_id: i64,
    pub lesson_id: i64,
}

/// Mark a lesson complete for a student and award the lesson's points.
#[utoipa::path(
    post,
    path = "/api/progress",
    request_body = ProgressRequest,
    responses(
        (status = 201, description = "Completion recorded", body = ProgressAward),
        (status = 404, description = "Unknown student or lesson", body = ApiErrorBody),
        (status = 409, description = "Lesson already completed", body = ApiErrorBody)
    )
)]
pub async fn mark_complete(
    State(app_state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ProgressRequest>,
) -> RestResult<impl IntoResponse> {
    let record = app_state
        .repo
        .record_completion(request.student_id, request.lesson_id)
        .await?;
    info!(
        "Student {} completed lesson {} for {} points",
        request.student_id, request.lesson_id, record.points_earned
    );
    Ok((StatusCode::CREATED, Json(award_for(&record))))
}

#[utoipa::path(
    delete,
    path = "/api/progress",
    params(ProgressQuery),
    responses(
        (status = 200, description = "Progress record removed", body = SuccessResponse),
        (status = 404, description = "No such progress record", body = ApiErrorBody)
    )
)]
pub async fn remove_progress(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ProgressQuery>,
) -> RestResult<impl IntoResponse> {
    app_state
        .repo
        .remove_progress(query.student_id, query.lesson_id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}
