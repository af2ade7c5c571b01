//! services/api/src/web/snippets.rs
//!
//! REST handlers for the code snippet library.

use crate::web::{
    rest::{require_text, ApiJson, ApiPath, ApiQuery, IdQuery, RestResult},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lesson_planner_core::{
    domain::CodeSnippet,
    payloads::{ApiErrorBody, CreatedResponse, SnippetInput, SnippetPatch, SuccessResponse},
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/snippets",
    params(IdQuery),
    responses(
        (status = 200, description = "All snippets, or the single snippet when `id` is set", body = Vec<CodeSnippet>),
        (status = 404, description = "Unknown snippet id", body = ApiErrorBody)
    )
)]
pub async fn get_snippets(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<Response> {
    match query.id {
        Some(id) => Ok(Json(app_state.repo.get_snippet(id).await?).into_response()),
        None => Ok(Json(app_state.repo.list_snippets().await?).into_response()),
    }
}

/// Snippets whose language matches, ignoring case.
#[utoipa::path(
    get,
    path = "/api/snippets/language/{language}",
    params(("language" = String, Path, description = "Programming language, e.g. python")),
    responses((status = 200, description = "Matching snippets", body = Vec<CodeSnippet>))
)]
pub async fn snippets_by_language(
    State(app_state): State<Arc<AppState>>,
    ApiPath(language): ApiPath<String>,
) -> RestResult<impl IntoResponse> {
    let snippets: Vec<CodeSnippet> = app_state
        .repo
        .list_snippets()
        .await?
        .into_iter()
        .filter(|s| s.language.eq_ignore_ascii_case(&language))
        .collect();
    Ok(Json(snippets))
}

#[utoipa::path(
    post,
    path = "/api/snippets",
    request_body = SnippetInput,
    responses(
        (status = 201, description = "Snippet created", body = CreatedResponse),
        (status = 400, description = "Missing title", body = ApiErrorBody)
    )
)]
pub async fn create_snippet(
    State(app_state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<SnippetInput>,
) -> RestResult<impl IntoResponse> {
    require_text(&input.title, "Title")?;
    let snippet = app_state.repo.create_snippet(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: snippet.id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/snippets",
    params(IdQuery),
    request_body = SnippetPatch,
    responses(
        (status = 200, description = "Snippet updated", body = SuccessResponse),
        (status = 404, description = "Unknown snippet id", body = ApiErrorBody)
    )
)]
pub async fn update_snippet(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(patch): ApiJson<SnippetPatch>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    if let Some(title) = &patch.title {
        require_text(title, "Title")?;
    }
    app_state.repo.update_snippet(id, patch).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    delete,
    path = "/api/snippets",
    params(IdQuery),
    responses(
        (status = 200, description = "Snippet deleted", body = SuccessResponse),
        (status = 404, description = "Unknown snippet id", body = ApiErrorBody)
    )
)]
pub async fn delete_snippet(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    app_state.repo.delete_snippet(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
