//! services/api/src/web/lessons.rs
//!
//! REST handlers for lesson plans.

use crate::web::{
    rest::{require_text, ApiJson, ApiQuery, IdQuery, RestResult},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lesson_planner_core::{
    domain::LessonPlan,
    payloads::{ApiErrorBody, CreatedResponse, LessonPlanInput, LessonPlanPatch, SuccessResponse},
    views,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive text matched against title, description and category.
    #[serde(default)]
    pub q: String,
}

/// List every lesson, or read one when `id` is given.
#[utoipa::path(
    get,
    path = "/api/lessons",
    params(IdQuery),
    responses(
        (status = 200, description = "All lessons, newest first, or the single lesson when `id` is set", body = Vec<LessonPlan>),
        (status = 404, description = "Unknown lesson id", body = ApiErrorBody)
    )
)]
pub async fn get_lessons(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<Response> {
    match query.id {
        Some(id) => Ok(Json(app_state.repo.get_lesson(id).await?).into_response()),
        None => Ok(Json(app_state.repo.list_lessons().await?).into_response()),
    }
}

/// Search lessons by title, description or category.
#[utoipa::path(
    get,
    path = "/api/lessons/search",
    params(SearchQuery),
    responses((status = 200, description = "Matching lessons", body = Vec<LessonPlan>))
)]
pub async fn search_lessons(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> RestResult<impl IntoResponse> {
    let lessons = app_state.repo.list_lessons().await?;
    Ok(Json(views::search_lessons(&lessons, &query.q)))
}

/// Create a lesson together with its steps, challenges and project.
#[utoipa::path(
    post,
    path = "/api/lessons",
    request_body = LessonPlanInput,
    responses(
        (status = 201, description = "Lesson created", body = CreatedResponse),
        (status = 400, description = "Missing title or unknown folder", body = ApiErrorBody)
    )
)]
pub async fn create_lesson(
    State(app_state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<LessonPlanInput>,
) -> RestResult<impl IntoResponse> {
    require_text(&input.title, "Title")?;
    let lesson = app_state.repo.create_lesson(input).await?;
    info!("Created lesson {}", lesson.id);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: lesson.id,
        }),
    ))
}

/// Update a lesson. Absent fields are left alone; present child collections
/// replace the stored ones.
#[utoipa::path(
    put,
    path = "/api/lessons",
    params(IdQuery),
    request_body = LessonPlanPatch,
    responses(
        (status = 200, description = "Lesson updated", body = SuccessResponse),
        (status = 400, description = "Missing id or invalid field", body = ApiErrorBody),
        (status = 404, description = "Unknown lesson id", body = ApiErrorBody)
    )
)]
pub async fn update_lesson(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(patch): ApiJson<LessonPlanPatch>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    if let Some(title) = &patch.title {
        require_text(title, "Title")?;
    }
    app_state.repo.update_lesson(id, patch).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Delete a lesson and its progress records.
#[utoipa::path(
    delete,
    path = "/api/lessons",
    params(IdQuery),
    responses(
        (status = 200, description = "Lesson deleted", body = SuccessResponse),
        (status = 404, description = "Unknown lesson id", body = ApiErrorBody)
    )
)]
pub async fn delete_lesson(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    app_state.repo.delete_lesson(id).await?;
    info!("Deleted lesson {}", id);
    Ok(Json(SuccessResponse { success: true }))
}
