mod common;

use async_trait::async_trait;
use common::spawn_app;
use lesson_planner_core::{
    ai_draft::generate_draft,
    domain::Difficulty,
    editor::LessonEditor,
    payloads::AiGenerateRequest,
    ports::{ClientError, LessonGenerationService, LessonPlannerApi, PortResult},
};
use std::sync::Arc;

/// Answers every request with the same canned model output.
struct CannedGenerator(&'static str);

#[async_trait]
impl LessonGenerationService for CannedGenerator {
    async fn generate_lesson(&self, _request: &AiGenerateRequest) -> PortResult<String> {
        Ok(self.0.to_string())
    }
}

fn request(include_project: bool) -> AiGenerateRequest {
    AiGenerateRequest {
        topic: "Loops".into(),
        target_age: "10-12".into(),
        duration: 45,
        difficulty: Difficulty::Intermediate,
        additional_context: None,
        include_final_project: Some(include_project),
    }
}

const FENCED_LESSON: &str = "```json\n{\n  \"title\": \"Looping Fun\",\n  \"description\": \"Repeat things\",\n  \"objectives\": [\"Use for\", \"Use while\"],\n  \"activities\": [{\"title\": \"Count\", \"description\": \"Count to ten\", \"type\": \"Demo\", \"duration\": 10}],\n  \"challenges\": [],\n  \"materials\": [\"Laptop\"],\n  \"tips\": [\"Go slow\"],\n  \"project\": {\"title\": \"Times tables\", \"description\": \"Print them\"}\n}\n```";

#[tokio::test]
async fn generated_lesson_becomes_an_editor_draft() {
    let client = spawn_app(Some(Arc::new(CannedGenerator(FENCED_LESSON)))).await;

    let draft = generate_draft(&client, &request(true)).await.unwrap();
    assert_eq!(draft.title, "Looping Fun");
    assert_eq!(draft.objectives, vec!["Use for", "Use while"]);
    assert_eq!(draft.points, 20);
    assert_eq!(draft.steps.len(), 1);
    assert_eq!(draft.steps[0].explanation, "Demo - 10 minutes");
    assert_eq!(draft.challenges.len(), 1);
    assert_eq!(draft.challenges[0].title, "Practice Challenge");
    assert!(draft.has_project);

    let editor = LessonEditor::from_ai_draft(&draft);
    assert!(editor.validate().is_ok());
}

#[tokio::test]
async fn project_is_dropped_when_not_requested() {
    let client = spawn_app(Some(Arc::new(CannedGenerator(FENCED_LESSON)))).await;
    let draft = generate_draft(&client, &request(false)).await.unwrap();
    assert!(!draft.has_project);
    assert!(draft.project.is_none());
}

#[tokio::test]
async fn unusable_model_output_is_a_bad_gateway_with_the_raw_text() {
    let client = spawn_app(Some(Arc::new(CannedGenerator("Sorry, I cannot help with that.")))).await;

    let err = client.generate_lesson(&request(false)).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    match err {
        ClientError::Api { body, .. } => {
            assert_eq!(body.ai_content.as_deref(), Some("Sorry, I cannot help with that."));
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn generation_without_a_model_is_unavailable() {
    let client = spawn_app(None).await;
    let err = generate_draft(&client, &request(false)).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.user_message().contains("AI generation unavailable"));
}

#[tokio::test]
async fn blank_topic_is_rejected() {
    let client = spawn_app(Some(Arc::new(CannedGenerator(FENCED_LESSON)))).await;
    let err = client
        .generate_lesson(&AiGenerateRequest {
            topic: " ".into(),
            ..request(false)
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}
