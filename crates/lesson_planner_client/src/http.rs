//! crates/lesson_planner_client/src/http.rs
//!
//! The `reqwest` implementation of the `LessonPlannerApi` port.
//!
//! Every method is exactly one HTTP request. Reads by id, updates and deletes
//! carry the id as a query parameter, except groups which use a path segment.

use crate::config::ClientConfig;
use async_trait::async_trait;
use lesson_planner_core::domain::{CodeSnippet, LessonFolder, LessonPlan, Student, StudentGroup};
use lesson_planner_core::payloads::{
    AiGenerateRequest, ApiErrorBody, CreatedResponse, FolderInput, FolderPatch, GroupInput,
    GroupPatch, LessonPlanInput, LessonPlanPatch, ProgressAward, ProgressRequest, SnippetInput,
    SnippetPatch, StudentInput, StudentPatch, SuccessResponse,
};
use lesson_planner_core::ports::{ClientError, ClientResult, LessonPlannerApi};
use lesson_planner_core::proxy::rewrite_proxy_path;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

pub struct HttpClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self::with_client(config, http))
    }

    /// Reuses an existing `reqwest::Client` and its connection pool.
    pub fn with_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for an `/api/...` path, rewritten when a script extension is set.
    pub fn url(&self, path: &str) -> String {
        match &self.config.script_extension {
            Some(ext) => format!("{}{}", self.config.base_url, rewrite_proxy_path(path, ext)),
            None => format!("{}{}", self.config.base_url, path),
        }
    }

    fn request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = self.url(path);
        debug!("{} {}", method, url);
        (self.http.request(method, &url), url)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder, url: &str) -> ClientResult<T> {
        let response = builder.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ClientError::Transport(e.to_string())
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            let body = serde_json::from_str::<ApiErrorBody>(&text).unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    ApiErrorBody::new(status.canonical_reason().unwrap_or("Request failed"))
                } else {
                    ApiErrorBody::new(text.clone())
                }
            });
            error!("{} answered {}: {}", url, status, body.error);
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            error!("Unexpected response body from {}: {}", url, e);
            ClientError::Decode(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let (builder, url) = self.request(Method::GET, path);
        self.execute(builder, &url).await
    }

    async fn send<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let (builder, url) = self.request(method, path);
        self.execute(builder.json(body), &url).await
    }

    async fn delete(&self, path: &str) -> ClientResult<SuccessResponse> {
        let (builder, url) = self.request(Method::DELETE, path);
        self.execute(builder, &url).await
    }
}

fn by_id(collection: &str, id: i64) -> String {
    format!("/api/{}?id={}", collection, id)
}

#[async_trait]
impl LessonPlannerApi for HttpClient {
    // --- Lesson Plans ---
    async fn list_lessons(&self) -> ClientResult<Vec<LessonPlan>> {
        self.get("/api/lessons").await
    }

    async fn get_lesson(&self, id: i64) -> ClientResult<LessonPlan> {
        self.get(&by_id("lessons", id)).await
    }

    async fn search_lessons(&self, query: &str) -> ClientResult<Vec<LessonPlan>> {
        self.get(&format!("/api/lessons/search?q={}", urlencoding::encode(query)))
            .await
    }

    async fn create_lesson(&self, input: &LessonPlanInput) -> ClientResult<CreatedResponse> {
        self.send(Method::POST, "/api/lessons", input).await
    }

    async fn update_lesson(&self, id: i64, patch: &LessonPlanPatch) -> ClientResult<SuccessResponse> {
        self.send(Method::PUT, &by_id("lessons", id), patch).await
    }

    async fn delete_lesson(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.delete(&by_id("lessons", id)).await
    }

    // --- Code Snippets ---
    async fn list_snippets(&self) -> ClientResult<Vec<CodeSnippet>> {
        self.get("/api/snippets").await
    }

    async fn get_snippet(&self, id: i64) -> ClientResult<CodeSnippet> {
        self.get(&by_id("snippets", id)).await
    }

    async fn snippets_by_language(&self, language: &str) -> ClientResult<Vec<CodeSnippet>> {
        self.get(&format!("/api/snippets/language/{}", urlencoding::encode(language)))
            .await
    }

    async fn create_snippet(&self, input: &SnippetInput) -> ClientResult<CreatedResponse> {
        self.send(Method::POST, "/api/snippets", input).await
    }

    async fn update_snippet(&self, id: i64, patch: &SnippetPatch) -> ClientResult<SuccessResponse> {
        self.send(Method::PUT, &by_id("snippets", id), patch).await
    }

    async fn delete_snippet(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.delete(&by_id("snippets", id)).await
    }

    // --- Students ---
    async fn list_students(&self) -> ClientResult<Vec<Student>> {
        self.get("/api/students").await
    }

    async fn get_student(&self, id: i64) -> ClientResult<Student> {
        self.get(&by_id("students", id)).await
    }

    async fn create_student(&self, input: &StudentInput) -> ClientResult<CreatedResponse> {
        self.send(Method::POST, "/api/students", input).await
    }

    async fn update_student(&self, id: i64, patch: &StudentPatch) -> ClientResult<SuccessResponse> {
        self.send(Method::PUT, &by_id("students", id), patch).await
    }

    async fn delete_student(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.delete(&by_id("students", id)).await
    }

    // --- Student Groups ---
    async fn list_groups(&self) -> ClientResult<Vec<StudentGroup>> {
        self.get("/api/groups").await
    }

    async fn get_group(&self, id: i64) -> ClientResult<StudentGroup> {
        self.get(&format!("/api/groups/{}", id)).await
    }

    async fn create_group(&self, input: &GroupInput) -> ClientResult<CreatedResponse> {
        self.send(Method::POST, "/api/groups", input).await
    }

    async fn update_group(&self, id: i64, patch: &GroupPatch) -> ClientResult<SuccessResponse> {
        self.send(Method::PUT, &format!("/api/groups/{}", id), patch).await
    }

    async fn delete_group(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.delete(&format!("/api/groups/{}", id)).await
    }

    // --- Folders ---
    async fn list_folders(&self) -> ClientResult<Vec<LessonFolder>> {
        self.get("/api/folders").await
    }

    async fn get_folder(&self, id: i64) -> ClientResult<LessonFolder> {
        self.get(&by_id("folders", id)).await
    }

    async fn create_folder(&self, input: &FolderInput) -> ClientResult<CreatedResponse> {
        self.send(Method::POST, "/api/folders", input).await
    }

    async fn update_folder(&self, id: i64, patch: &FolderPatch) -> ClientResult<SuccessResponse> {
        self.send(Method::PUT, &by_id("folders", id), patch).await
    }

    async fn delete_folder(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.delete(&by_id("folders", id)).await
    }

    // --- Progress ---
    async fn mark_complete(&self, student_id: i64, lesson_id: i64) -> ClientResult<ProgressAward> {
        let body = ProgressRequest { student_id, lesson_id };
        self.send(Method::POST, "/api/progress", &body).await
    }

    async fn remove_progress(&self, student_id: i64, lesson_id: i64) -> ClientResult<SuccessResponse> {
        self.delete(&format!(
            "/api/progress?studentId={}&lessonId={}",
            student_id, lesson_id
        ))
        .await
    }

    // --- AI ---
    async fn generate_lesson(&self, request: &AiGenerateRequest) -> ClientResult<serde_json::Value> {
        self.send(Method::POST, "/api/ai/generate-lesson", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(config: ClientConfig) -> HttpClient {
        HttpClient::with_client(config, reqwest::Client::new())
    }

    #[test]
    fn plain_mode_prefixes_the_base_url() {
        let client = client(ClientConfig::new("http://localhost:3000"));
        assert_eq!(client.url(&by_id("lessons", 5)), "http://localhost:3000/api/lessons?id=5");
        assert_eq!(client.url("/api/groups/2"), "http://localhost:3000/api/groups/2");
    }

    #[test]
    fn script_mode_rewrites_paths() {
        let client = client(ClientConfig::new("http://localhost:8888").with_script_extension("cfm"));
        assert_eq!(
            client.url(&by_id("lessons", 5)),
            "http://localhost:8888/backend/api/lessons.cfm?id=5"
        );
        assert_eq!(
            client.url("/api/snippets/language/python"),
            "http://localhost:8888/backend/api/snippets.cfm"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = client(ClientConfig::new("http://127.0.0.1:9"));
        let err = client.list_lessons().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.status(), None);
    }
}
