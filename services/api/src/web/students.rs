//! services/api/src/web/students.rs
//!
//! REST handlers for students. Responses carry the joined group name, the
//! language list, progress records and the derived totals.

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
    domain::Student,
    payloads::{ApiErrorBody, CreatedResponse, StudentInput, StudentPatch, SuccessResponse},
};
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/students",
    params(IdQuery),
    responses(
        (status = 200, description = "All students by name, or the single student when `id` is set", body = Vec<Student>),
        (status = 404, description = "Unknown student id", body = ApiErrorBody)
    )
)]
pub async fn get_students(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<Response> {
    match query.id {
        Some(id) => Ok(Json(app_state.repo.get_student(id).await?).into_response()),
        None => Ok(Json(app_state.repo.list_students().await?).into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = StudentInput,
    responses(
        (status = 201, description = "Student created", body = CreatedResponse),
        (status = 400, description = "Missing name or unknown group", body = ApiErrorBody)
    )
)]
pub async fn create_student(
    State(app_state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<StudentInput>,
) -> RestResult<impl IntoResponse> {
    require_text(&input.name, "Name")?;
    let student = app_state.repo.create_student(input).await?;
    info!("Created student {}", student.id);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: student.id,
        }),
    ))
}

/// Update a student. A present `languages` list replaces the stored one.
#[utoipa::path(
    put,
    path = "/api/students",
    params(IdQuery),
    request_body = StudentPatch,
    responses(
        (status = 200, description = "Student updated", body = SuccessResponse),
        (status = 400, description = "Missing id or unknown group", body = ApiErrorBody),
        (status = 404, description = "Unknown student id", body = ApiErrorBody)
    )
)]
pub async fn update_student(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(patch): ApiJson<StudentPatch>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    if let Some(name) = &patch.name {
        require_text(name, "Name")?;
    }
    app_state.repo.update_student(id, patch).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    delete,
    path = "/api/students",
    params(IdQuery),
    responses(
        (status = 200, description = "Student deleted", body = SuccessResponse),
        (status = 404, description = "Unknown student id", body = ApiErrorBody)
    )
)]
pub async fn delete_student(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    app_state.repo.delete_student(id).await?;
    info!("Deleted student {}", id);
    Ok(Json(SuccessResponse { success: true }))
}
