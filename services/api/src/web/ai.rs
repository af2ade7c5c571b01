//! services/api/src/web/ai.rs
//!
//! The lesson generation endpoint. The model's text is decoded here so the
//! client always receives a JSON object or a structured error.

use crate::web::{
    rest::{require_text, ApiJson, RestError, RestResult},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use lesson_planner_core::{
    ai_draft::decode_ai_payload,
    payloads::{AiGenerateRequest, ApiErrorBody},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Draft a lesson with the configured language model.
#[utoipa::path(
    post,
    path = "/api/ai/generate-lesson",
    request_body = AiGenerateRequest,
    responses(
        (status = 200, description = "The drafted lesson as a JSON object", body = serde_json::Value),
        (status = 400, description = "Missing topic", body = ApiErrorBody),
        (status = 502, description = "The model answered with something that is not a lesson", body = ApiErrorBody),
        (status = 503, description = "Lesson generation is not configured", body = ApiErrorBody)
    )
)]
pub async fn generate_lesson(
    State(app_state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<AiGenerateRequest>,
) -> RestResult<impl IntoResponse> {
    require_text(&request.topic, "Topic")?;
    let generator = app_state.generator.as_ref().ok_or_else(|| {
        RestError::new(StatusCode::SERVICE_UNAVAILABLE, "AI generation unavailable")
            .with_message("No language model is configured on the server")
    })?;

    info!("Generating lesson draft for topic '{}'", request.topic);
    let content = generator.generate_lesson(&request).await?;

    match decode_ai_payload(Value::String(content.clone())) {
        Ok(payload) => Ok(Json(Value::Object(payload))),
        Err(e) => {
            error!("Unusable lesson draft from the model: {}", e);
            let mut rest = RestError::new(StatusCode::BAD_GATEWAY, "Failed to parse AI response")
                .with_message(e.to_string());
            rest.body.ai_content = Some(content);
            Err(rest)
        }
    }
}
