//! crates/lesson_planner_core/src/ai_draft.rs
//!
//! Turns the AI generation response into a lesson draft the editor can be
//! seeded with.
//!
//! The response is parsed permissively: it may be an object or a JSON-encoded
//! string, any list may be missing or of the wrong type, and any field of an
//! activity or challenge may be absent. Only a payload with no usable content
//! at all is rejected.

use crate::domain::{ChallengeDifficulty, Difficulty, LessonChallenge, LessonProject, LessonStep};
use crate::payloads::{AiGenerateRequest, ApiErrorBody};
use crate::ports::{ClientResult, LessonPlannerApi};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::{debug, error};

/// Why an AI response could not be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AiPayloadError {
    #[error("AI API returned an empty response")]
    Empty,
    #[error("Failed to parse AI response: {0}")]
    Unparsable(String),
    #[error("AI returned empty data")]
    EmptyObject,
    #[error("Backend error: {}", .0.error)]
    Backend(ApiErrorBody),
}

/// A lesson draft produced from an AI response, carried in memory to the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct AiDraft {
    pub title: String,
    pub description: String,
    pub language: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub target_age: String,
    pub duration: i32,
    pub points: i32,
    pub prerequisites: String,
    pub learning_outcomes: String,
    pub notes: String,
    pub topics: Vec<String>,
    pub objectives: Vec<String>,
    pub materials: Vec<String>,
    pub steps: Vec<LessonStep>,
    pub challenges: Vec<LessonChallenge>,
    pub has_project: bool,
    pub project: Option<LessonProject>,
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
    })
}

/// Decodes an AI generation body into a JSON object.
///
/// Accepts an object directly, or a string holding JSON (optionally wrapped in a
/// Markdown code fence) which is decoded a second time.
pub fn decode_ai_payload(body: Value) -> Result<Map<String, Value>, AiPayloadError> {
    let value = match body {
        Value::Null => return Err(AiPayloadError::Empty),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(AiPayloadError::Empty);
            }
            let unfenced = code_fence()
                .captures(trimmed)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .unwrap_or(trimmed);
            serde_json::from_str::<Value>(unfenced)
                .map_err(|e| AiPayloadError::Unparsable(e.to_string()))?
        }
        other => other,
    };

    match value {
        Value::Object(map) if map.contains_key("error") => {
            let body = serde_json::from_value::<ApiErrorBody>(Value::Object(map.clone()))
                .unwrap_or_else(|_| ApiErrorBody::new(render(map.get("error"))));
            Err(AiPayloadError::Backend(body))
        }
        Value::Object(map) if map.is_empty() => Err(AiPayloadError::EmptyObject),
        Value::Object(map) => Ok(map),
        _ => Err(AiPayloadError::EmptyObject),
    }
}

/// Renders a scalar JSON value as plain text; anything else becomes empty.
fn render(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    render(obj.get(key))
}

/// The field as text, or `fallback` when it is missing or blank.
fn text_or(obj: &Map<String, Value>, key: &str, fallback: impl Into<String>) -> String {
    let value = text(obj, key);
    if value.is_empty() {
        fallback.into()
    } else {
        value
    }
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| render(Some(item)))
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn object_list<'a>(obj: &'a Map<String, Value>, key: &str) -> Vec<Option<&'a Map<String, Value>>> {
    match obj.get(key) {
        Some(Value::Array(items)) => items.iter().map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Step used when the AI produced no activities.
pub fn placeholder_step() -> LessonStep {
    LessonStep {
        step_number: 1,
        title: "Getting Started".to_string(),
        instruction: "Follow along with the lesson".to_string(),
        ..LessonStep::default()
    }
}

/// Challenge used when the AI produced no challenges.
pub fn placeholder_challenge() -> LessonChallenge {
    LessonChallenge {
        order: 1,
        title: "Practice Challenge".to_string(),
        description: "Apply what you learned".to_string(),
        starter_code: Some("# Write your code here\n".to_string()),
        solution: "# Solution will be provided".to_string(),
        difficulty: ChallengeDifficulty::Easy,
        points: 10,
    }
}

impl AiDraft {
    /// Builds a draft from a decoded payload, filling every gap with a default.
    pub fn from_payload(request: &AiGenerateRequest, payload: &Map<String, Value>) -> Self {
        let empty = Map::new();
        let tips = string_list(payload, "tips");
        let objectives = string_list(payload, "objectives");

        let steps: Vec<LessonStep> = object_list(payload, "activities")
            .into_iter()
            .enumerate()
            .map(|(idx, activity)| {
                let activity = activity.unwrap_or(&empty);
                let number = idx as i32 + 1;
                LessonStep {
                    step_number: number,
                    title: text_or(activity, "title", format!("Step {}", number)),
                    instruction: text(activity, "description"),
                    code_example: non_empty(text(activity, "codeExample")),
                    expected_output: None,
                    explanation: format!(
                        "{} - {} minutes",
                        text_or(activity, "type", "Activity"),
                        text_or(activity, "duration", "15")
                    ),
                    hints: tips.get(idx).cloned(),
                }
            })
            .collect();

        let challenge_difficulty = request.challenge_difficulty();
        let challenge_points = request.difficulty.challenge_points();
        let challenges: Vec<LessonChallenge> = object_list(payload, "challenges")
            .into_iter()
            .enumerate()
            .map(|(idx, challenge)| {
                let challenge = challenge.unwrap_or(&empty);
                let order = idx as i32 + 1;
                LessonChallenge {
                    order,
                    title: text_or(challenge, "title", format!("Challenge {}", order)),
                    description: text_or(
                        challenge,
                        "description",
                        "Use what you learned to solve this problem",
                    ),
                    starter_code: Some(text_or(
                        challenge,
                        "starterCode",
                        "# Write your solution here",
                    )),
                    solution: text(challenge, "solution"),
                    difficulty: challenge_difficulty,
                    points: challenge_points,
                }
            })
            .collect();

        let project = if request.wants_project() {
            payload
                .get("project")
                .and_then(Value::as_object)
                .map(|p| LessonProject {
                    title: text_or(p, "title", "Final Project"),
                    description: text(p, "description"),
                    requirements: text(p, "requirements"),
                    starter_code: non_empty(text(p, "starterCode")),
                    solution_code: text_or(p, "solutionCode", text(p, "solution")),
                    extension_ideas: non_empty(text(p, "extensionIdeas")),
                })
        } else {
            None
        };

        AiDraft {
            title: text_or(payload, "title", format!("Introduction to {}", request.topic)),
            description: text(payload, "description"),
            language: "python".to_string(),
            category: request.topic.clone(),
            difficulty: request.difficulty,
            target_age: request.target_age.clone(),
            duration: request.duration,
            points: request.difficulty.suggested_points(),
            prerequisites: String::new(),
            learning_outcomes: objectives.join("\n"),
            notes: tips.join("\n"),
            topics: vec![request.topic.clone()],
            objectives,
            materials: string_list(payload, "materials"),
            steps: if steps.is_empty() { vec![placeholder_step()] } else { steps },
            challenges: if challenges.is_empty() {
                vec![placeholder_challenge()]
            } else {
                challenges
            },
            has_project: project.is_some(),
            project,
        }
    }
}

/// Asks the backend for a lesson and converts the answer into a draft.
pub async fn generate_draft(
    api: &dyn LessonPlannerApi,
    request: &AiGenerateRequest,
) -> ClientResult<AiDraft> {
    debug!("Requesting AI lesson draft for topic '{}'", request.topic);
    let body = api.generate_lesson(request).await?;
    let payload = decode_ai_payload(body).map_err(|e| {
        error!("Unusable AI payload: {}", e);
        e
    })?;
    Ok(AiDraft::from_payload(request, &payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(difficulty: Difficulty, project: bool) -> AiGenerateRequest {
        AiGenerateRequest {
            topic: "Loops".into(),
            target_age: "10-12".into(),
            duration: 45,
            difficulty,
            additional_context: None,
            include_final_project: Some(project),
        }
    }

    #[test]
    fn empty_objectives_and_missing_project_fall_back_to_placeholders() {
        let payload = decode_ai_payload(json!({
            "title": "Loop the Loop",
            "objectives": []
        }))
        .unwrap();

        let draft = AiDraft::from_payload(&request(Difficulty::Beginner, false), &payload);

        assert!(draft.objectives.is_empty());
        assert!(!draft.has_project);
        assert_eq!(draft.project, None);
        assert_eq!(draft.steps, vec![placeholder_step()]);
        assert_eq!(draft.challenges, vec![placeholder_challenge()]);
        assert_eq!(draft.title, "Loop the Loop");
        assert_eq!(draft.points, 10);
    }

    #[test]
    fn string_body_is_decoded_twice_and_fences_are_stripped() {
        let body = Value::String(
            "\n```json\n{\"title\": \"Fenced\", \"materials\": [\"laptop\"]}\n```\n".into(),
        );
        let payload = decode_ai_payload(body).unwrap();
        assert_eq!(payload["title"], json!("Fenced"));
    }

    #[test]
    fn unusable_bodies_are_classified() {
        assert_eq!(decode_ai_payload(json!("   ")), Err(AiPayloadError::Empty));
        assert_eq!(decode_ai_payload(json!({})), Err(AiPayloadError::EmptyObject));
        assert!(matches!(
            decode_ai_payload(json!("{not json")),
            Err(AiPayloadError::Unparsable(_))
        ));
        match decode_ai_payload(json!({"error": "quota", "message": "try later"})) {
            Err(AiPayloadError::Backend(body)) => {
                assert_eq!(body.error, "quota");
                assert_eq!(body.message.as_deref(), Some("try later"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn activities_and_challenges_map_with_defaults() {
        let payload = decode_ai_payload(json!({
            "objectives": ["count", "repeat"],
            "tips": ["use range"],
            "activities": [
                {"title": "Warm up", "description": "Count to ten", "type": "game", "duration": 10},
                {}
            ],
            "challenges": [{"description": "Print evens"}],
            "project": {"title": "Times tables", "solution": "print(...)"}
        }))
        .unwrap();

        let draft = AiDraft::from_payload(&request(Difficulty::Intermediate, true), &payload);

        assert_eq!(draft.learning_outcomes, "count\nrepeat");
        assert_eq!(draft.steps.len(), 2);
        assert_eq!(draft.steps[0].explanation, "game - 10 minutes");
        assert_eq!(draft.steps[0].hints.as_deref(), Some("use range"));
        assert_eq!(draft.steps[1].title, "Step 2");
        assert_eq!(draft.steps[1].explanation, "Activity - 15 minutes");
        assert_eq!(draft.challenges[0].title, "Challenge 1");
        assert_eq!(draft.challenges[0].difficulty, ChallengeDifficulty::Medium);
        assert_eq!(draft.challenges[0].points, 15);
        assert!(draft.has_project);
        assert_eq!(draft.project.unwrap().solution_code, "print(...)");
    }

    #[test]
    fn project_is_dropped_when_not_requested() {
        let payload = decode_ai_payload(json!({"project": {"title": "Snake"}})).unwrap();
        let draft = AiDraft::from_payload(&request(Difficulty::Advanced, false), &payload);
        assert!(!draft.has_project);
        assert_eq!(draft.title, "Introduction to Loops");
        assert_eq!(draft.points, 30);
    }
}
