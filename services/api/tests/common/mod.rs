//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use api_lib::{
    adapters::MemoryAdapter,
    config::Config,
    web::{router, state::AppState},
};
use lesson_planner_client::{ClientConfig, HttpClient};
use lesson_planner_core::{
    domain::{Difficulty, LessonChallenge, LessonStep},
    payloads::LessonPlanInput,
    ports::LessonGenerationService,
};
use std::sync::Arc;

/// Serves the API on an ephemeral port backed by a fresh in-memory repository
/// and returns its base URL.
pub async fn spawn_server(generator: Option<Arc<dyn LessonGenerationService>>) -> String {
    let app_state = Arc::new(AppState {
        repo: Arc::new(MemoryAdapter::new()),
        generator,
        config: Arc::new(Config::default()),
    });
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server runs");
    });

    format!("http://{}", addr)
}

/// Like `spawn_server`, but returns a client pointed at the server.
pub async fn spawn_app(generator: Option<Arc<dyn LessonGenerationService>>) -> HttpClient {
    let base_url = spawn_server(generator).await;
    HttpClient::new(ClientConfig::new(base_url)).expect("client builds")
}

pub fn lesson_input(title: &str) -> LessonPlanInput {
    LessonPlanInput {
        title: title.to_string(),
        description: format!("All about {}", title),
        language: "python".to_string(),
        category: "Basics".to_string(),
        difficulty: Difficulty::Beginner,
        points: 10,
        duration: 45,
        ..LessonPlanInput::default()
    }
}

pub fn step(number: i32, title: &str) -> LessonStep {
    LessonStep {
        step_number: number,
        title: title.to_string(),
        instruction: format!("Do {}", title),
        ..LessonStep::default()
    }
}

pub fn challenge(order: i32, title: &str) -> LessonChallenge {
    LessonChallenge {
        order,
        title: title.to_string(),
        points: 10,
        ..LessonChallenge::default()
    }
}
