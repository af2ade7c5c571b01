//! crates/lesson_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) at the edges of the application.
//!
//! The backend depends on `LessonPlannerRepository` and `LessonGenerationService`;
//! the client-side logic in this crate depends on `LessonPlannerApi`. Concrete
//! implementations live in the `api` service and the `lesson_planner_client` crate.

use crate::ai_draft::AiPayloadError;
use crate::domain::{CodeSnippet, LessonFolder, LessonPlan, Student, StudentGroup, StudentProgress};
use crate::payloads::{
    AiGenerateRequest, ApiErrorBody, CreatedResponse, FolderInput, FolderPatch, GroupInput,
    GroupPatch, LessonPlanInput, LessonPlanPatch, ProgressAward, SnippetInput, SnippetPatch,
    StudentInput, StudentPatch, SuccessResponse,
};
use async_trait::async_trait;

//=========================================================================================
// Backend Port Error and Result Types
//=========================================================================================

/// A generic error type for all backend port operations.
/// This abstracts away the specific errors from external services (e.g., database, LLM).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Client Error and Result Types
//=========================================================================================

/// Everything that can go wrong while a page talks to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("Request failed with status {status}: {}", .body.error)]
    Api { status: u16, body: ApiErrorBody },

    /// A 2xx body did not match the expected shape.
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// The AI generation endpoint returned something unusable.
    #[error(transparent)]
    AiPayload(#[from] AiPayloadError),

    /// The form was rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The text a page shows in its alert or inline banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { body, .. } => {
                let mut text = body.error.clone();
                if let Some(message) = &body.message {
                    text.push_str(&format!("\nMessage: {}", message));
                }
                if let Some(detail) = &body.detail {
                    text.push_str(&format!("\nDetail: {}", detail));
                }
                text
            }
            other => other.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

//=========================================================================================
// Backend Ports (Traits)
//=========================================================================================

/// Persistence for every aggregate. Implementations must replace child
/// collections atomically with their parent and must return students with
/// their derived counters filled in.
#[async_trait]
pub trait LessonPlannerRepository: Send + Sync {
    // --- Lesson Plans ---
    async fn list_lessons(&self) -> PortResult<Vec<LessonPlan>>;

    async fn get_lesson(&self, id: i64) -> PortResult<LessonPlan>;

    async fn create_lesson(&self, input: LessonPlanInput) -> PortResult<LessonPlan>;

    async fn update_lesson(&self, id: i64, patch: LessonPlanPatch) -> PortResult<LessonPlan>;

    async fn delete_lesson(&self, id: i64) -> PortResult<()>;

    // --- Folders ---
    async fn list_folders(&self) -> PortResult<Vec<LessonFolder>>;

    async fn get_folder(&self, id: i64) -> PortResult<LessonFolder>;

    async fn create_folder(&self, input: FolderInput) -> PortResult<LessonFolder>;

    async fn update_folder(&self, id: i64, patch: FolderPatch) -> PortResult<LessonFolder>;

    /// Deletes the folder and clears `folder_id` on every member lesson.
    async fn delete_folder(&self, id: i64) -> PortResult<()>;

    // --- Code Snippets ---
    async fn list_snippets(&self) -> PortResult<Vec<CodeSnippet>>;

    async fn get_snippet(&self, id: i64) -> PortResult<CodeSnippet>;

    async fn create_snippet(&self, input: SnippetInput) -> PortResult<CodeSnippet>;

    async fn update_snippet(&self, id: i64, patch: SnippetPatch) -> PortResult<CodeSnippet>;

    async fn delete_snippet(&self, id: i64) -> PortResult<()>;

    // --- Student Groups ---
    async fn list_groups(&self) -> PortResult<Vec<StudentGroup>>;

    async fn get_group(&self, id: i64) -> PortResult<StudentGroup>;

    async fn create_group(&self, input: GroupInput) -> PortResult<StudentGroup>;

    async fn update_group(&self, id: i64, patch: GroupPatch) -> PortResult<StudentGroup>;

    /// Deletes the group and clears `group_id` on every member student.
    async fn delete_group(&self, id: i64) -> PortResult<()>;

    // --- Students ---
    async fn list_students(&self) -> PortResult<Vec<Student>>;

    async fn get_student(&self, id: i64) -> PortResult<Student>;

    async fn create_student(&self, input: StudentInput) -> PortResult<Student>;

    async fn update_student(&self, id: i64, patch: StudentPatch) -> PortResult<Student>;

    async fn delete_student(&self, id: i64) -> PortResult<()>;

    // --- Progress ---
    /// Marks the lesson completed for the student and returns the stored record.
    /// Fails with `Conflict` if the lesson is already completed.
    async fn record_completion(&self, student_id: i64, lesson_id: i64)
        -> PortResult<StudentProgress>;

    async fn remove_progress(&self, student_id: i64, lesson_id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait LessonGenerationService: Send + Sync {
    /// Drafts a lesson for the request and returns the model's raw text,
    /// expected to be a JSON document.
    async fn generate_lesson(&self, request: &AiGenerateRequest) -> PortResult<String>;
}

//=========================================================================================
// Client Port
//=========================================================================================

/// One method per REST call. Implementations perform exactly one HTTP request
/// per call and do no validation or retrying of their own.
#[async_trait]
pub trait LessonPlannerApi: Send + Sync {
    // --- Lesson Plans ---
    async fn list_lessons(&self) -> ClientResult<Vec<LessonPlan>>;
    async fn get_lesson(&self, id: i64) -> ClientResult<LessonPlan>;
    async fn search_lessons(&self, query: &str) -> ClientResult<Vec<LessonPlan>>;
    async fn create_lesson(&self, input: &LessonPlanInput) -> ClientResult<CreatedResponse>;
    async fn update_lesson(&self, id: i64, patch: &LessonPlanPatch) -> ClientResult<SuccessResponse>;
    async fn delete_lesson(&self, id: i64) -> ClientResult<SuccessResponse>;

    // --- Code Snippets ---
    async fn list_snippets(&self) -> ClientResult<Vec<CodeSnippet>>;
    async fn get_snippet(&self, id: i64) -> ClientResult<CodeSnippet>;
    async fn snippets_by_language(&self, language: &str) -> ClientResult<Vec<CodeSnippet>>;
    async fn create_snippet(&self, input: &SnippetInput) -> ClientResult<CreatedResponse>;
    async fn update_snippet(&self, id: i64, patch: &SnippetPatch) -> ClientResult<SuccessResponse>;
    async fn delete_snippet(&self, id: i64) -> ClientResult<SuccessResponse>;

    // --- Students ---
    async fn list_students(&self) -> ClientResult<Vec<Student>>;
    async fn get_student(&self, id: i64) -> ClientResult<Student>;
    async fn create_student(&self, input: &StudentInput) -> ClientResult<CreatedResponse>;
    async fn update_student(&self, id: i64, patch: &StudentPatch) -> ClientResult<SuccessResponse>;
    async fn delete_student(&self, id: i64) -> ClientResult<SuccessResponse>;

    // --- Student Groups ---
    async fn list_groups(&self) -> ClientResult<Vec<StudentGroup>>;
    async fn get_group(&self, id: i64) -> ClientResult<StudentGroup>;
    async fn create_group(&self, input: &GroupInput) -> ClientResult<CreatedResponse>;
    async fn update_group(&self, id: i64, patch: &GroupPatch) -> ClientResult<SuccessResponse>;
    async fn delete_group(&self, id: i64) -> ClientResult<SuccessResponse>;

    // --- Folders ---
    async fn list_folders(&self) -> ClientResult<Vec<LessonFolder>>;
    async fn get_folder(&self, id: i64) -> ClientResult<LessonFolder>;
    async fn create_folder(&self, input: &FolderInput) -> ClientResult<CreatedResponse>;
    async fn update_folder(&self, id: i64, patch: &FolderPatch) -> ClientResult<SuccessResponse>;
    async fn delete_folder(&self, id: i64) -> ClientResult<SuccessResponse>;

    // --- Progress ---
    async fn mark_complete(&self, student_id: i64, lesson_id: i64) -> ClientResult<ProgressAward>;
    async fn remove_progress(&self, student_id: i64, lesson_id: i64) -> ClientResult<SuccessResponse>;

    // --- AI ---
    /// Returns the decoded body as-is; it may be an object or a JSON-encoded string.
    async fn generate_lesson(&self, request: &AiGenerateRequest) -> ClientResult<serde_json::Value>;
}
