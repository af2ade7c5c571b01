pub mod ai;
pub mod folders;
pub mod groups;
pub mod lessons;
pub mod progress;
pub mod rest;
pub mod snippets;
pub mod state;
pub mod students;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the `/api` router with CORS for the configured origin and request tracing.
pub fn router(app_state: Arc<AppState>) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);
    if let Ok(origin) = app_state.config.cors_origin.parse::<HeaderValue>() {
        cors = cors.allow_origin(origin);
    }

    Router::new()
        .route(
            "/api/lessons",
            get(lessons::get_lessons)
                .post(lessons::create_lesson)
                .put(lessons::update_lesson)
                .delete(lessons::delete_lesson),
        )
        .route("/api/lessons/search", get(lessons::search_lessons))
        .route(
            "/api/folders",
            get(folders::get_folders)
                .post(folders::create_folder)
                .put(folders::update_folder)
                .delete(folders::delete_folder),
        )
        .route(
            "/api/snippets",
            get(snippets::get_snippets)
                .post(snippets::create_snippet)
                .put(snippets::update_snippet)
                .delete(snippets::delete_snippet),
        )
        .route(
            "/api/snippets/language/{language}",
            get(snippets::snippets_by_language),
        )
        .route(
            "/api/students",
            get(students::get_students)
                .post(students::create_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/api/groups", get(groups::list_groups).post(groups::create_group))
        .route(
            "/api/groups/{id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/api/progress",
            post(progress::mark_complete).delete(progress::remove_progress),
        )
        .route("/api/ai/generate-lesson", post(ai::generate_lesson))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
