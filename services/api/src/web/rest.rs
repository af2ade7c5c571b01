//! services/api/src/web/rest.rs
//!
//! Shared pieces of the REST layer: the master definition for the OpenAPI
//! specification, the error response every handler returns, and the request
//! extractors whose rejections are rendered as that same error body.

use crate::web::{ai, folders, groups, lessons, progress, snippets, students};
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use lesson_planner_core::{
    domain::{
        ChallengeDifficulty, CodeSnippet, Difficulty, LessonChallenge, LessonFolder, LessonPlan,
        LessonProject, LessonStep, ProficiencyLevel, ProgressStatus, Student, StudentGroup,
        StudentLanguage, StudentProgress,
    },
    payloads::{
        AiGenerateRequest, ApiErrorBody, CreatedResponse, FolderInput, FolderPatch, GroupInput,
        GroupPatch, LessonPlanInput, LessonPlanPatch, ProgressAward, ProgressRequest,
        SnippetInput, SnippetPatch, StudentInput, StudentPatch, SuccessResponse,
    },
    ports::PortError,
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{error, warn};
use utoipa::{IntoParams, OpenApi};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        lessons::get_lessons,
        lessons::search_lessons,
        lessons::create_lesson,
        lessons::update_lesson,
        lessons::delete_lesson,
        folders::get_folders,
        folders::create_folder,
        folders::update_folder,
        folders::delete_folder,
        snippets::get_snippets,
        snippets::snippets_by_language,
        snippets::create_snippet,
        snippets::update_snippet,
        snippets::delete_snippet,
        students::get_students,
        students::create_student,
        students::update_student,
        students::delete_student,
        groups::list_groups,
        groups::get_group,
        groups::create_group,
        groups::update_group,
        groups::delete_group,
        progress::mark_complete,
        progress::remove_progress,
        ai::generate_lesson,
    ),
    components(
        schemas(
            LessonPlan, LessonStep, LessonChallenge, LessonProject, LessonFolder, CodeSnippet,
            Student, StudentLanguage, StudentProgress, StudentGroup, Difficulty,
            ChallengeDifficulty, ProficiencyLevel, ProgressStatus, LessonPlanInput,
            LessonPlanPatch, FolderInput, FolderPatch, SnippetInput, SnippetPatch, StudentInput,
            StudentPatch, GroupInput, GroupPatch, ProgressRequest, ProgressAward,
            AiGenerateRequest, CreatedResponse, SuccessResponse, ApiErrorBody
        )
    ),
    tags(
        (name = "Lesson Planner API", description = "Lessons, folders, snippets, students, groups, progress and AI lesson drafts.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Responses
//=========================================================================================

/// A non-2xx response carrying an `ApiErrorBody`.
#[derive(Debug)]
pub struct RestError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl RestError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody::new(error),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body = self.body.with_message(message);
        self
    }
}

impl From<PortError> for RestError {
    fn from(e: PortError) -> Self {
        let (status, error) = match &e {
            PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            PortError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            PortError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
            PortError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"),
            PortError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        if status.is_server_error() {
            error!("Request failed: {}", e);
        }
        let mut rest = Self::new(status, error);
        rest.body.detail = Some(e.to_string());
        if let Some(message) = port_message(&e) {
            rest = rest.with_message(message);
        }
        rest
    }
}

/// The inner text of a client-facing port error.
fn port_message(e: &PortError) -> Option<&str> {
    match e {
        PortError::NotFound(m) | PortError::Conflict(m) | PortError::InvalidInput(m) => Some(m.as_str()),
        PortError::Unavailable(_) | PortError::Unexpected(_) => None,
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type RestResult<T> = Result<T, RestError>;

//=========================================================================================
// Shared Extractors and Checks
//=========================================================================================

/// A JSON request body. Malformed or mistyped bodies become a 400 `ApiErrorBody`.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            warn!("Rejected request body: {}", rejection.body_text());
            RestError::bad_request("Invalid request body").with_message(rejection.body_text())
        })?;
        Ok(Self(value))
    }
}

/// Query string parameters, rejected with a 400 `ApiErrorBody`.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await.map_err(|rejection| {
            warn!("Rejected query string: {}", rejection.body_text());
            RestError::bad_request("Invalid query parameters").with_message(rejection.body_text())
        })?;
        Ok(Self(value))
    }
}

/// Path segments, rejected with a 400 `ApiErrorBody`.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await.map_err(|rejection| {
            warn!("Rejected path: {}", rejection.body_text());
            RestError::bad_request("Invalid path parameter").with_message(rejection.body_text())
        })?;
        Ok(Self(value))
    }
}

/// The `?id=` parameter of the collection routes.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    /// Selects a single record; omit it to list the collection.
    pub id: Option<i64>,
}

impl IdQuery {
    /// The id, or a 400 when the route needs one and it is missing.
    pub fn required(&self) -> RestResult<i64> {
        self.id
            .ok_or_else(|| RestError::bad_request("Missing id").with_message("The id query parameter is required"))
    }
}

/// Rejects blank required text with a 400.
pub fn require_text(value: &str, field: &str) -> RestResult<()> {
    if value.trim().is_empty() {
        return Err(RestError::bad_request("Missing required field")
            .with_message(format!("{} is required", field)));
    }
    Ok(())
}
