//! services/api/src/adapters/lesson_llm.rs
//!
//! This module contains the adapter for the lesson-drafting LLM.
//! It implements the `LessonGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use lesson_planner_core::{
    payloads::AiGenerateRequest,
    ports::{LessonGenerationService, PortError, PortResult},
};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are an experienced programming teacher who writes lesson plans for children and teenagers. \
Respond with a single JSON object and nothing else. The object must have these keys: \
\"title\" (string), \"description\" (string), \"objectives\" (array of strings), \
\"activities\" (array of objects with \"title\", \"description\", \"type\", \"duration\" in minutes and \"codeExample\"), \
\"challenges\" (array of objects with \"title\", \"description\", \"starterCode\" and \"solution\"), \
\"materials\" (array of strings) and \"tips\" (array of strings, one per activity). \
When a final project is requested, also include \"project\" (object with \"title\", \"description\", \"requirements\", \"starterCode\", \"solutionCode\", \"extensionIdeas\"). \
Example of the expected shape:\n";

/// A complete answer in the shape the system prompt asks for.
const EXAMPLE_LESSON: &str = r##"{
  "title": "Counting with Loops",
  "description": "Students repeat actions with for loops.",
  "objectives": ["Write a for loop", "Use range()"],
  "activities": [
    {"title": "Count to ten", "description": "Print the numbers 1 to 10 with a loop.", "type": "Demo", "duration": 10, "codeExample": "for i in range(1, 11):\n    print(i)"}
  ],
  "challenges": [
    {"title": "Even numbers", "description": "Print every even number up to 20.", "starterCode": "# your loop here", "solution": "for i in range(2, 21, 2):\n    print(i)"}
  ],
  "materials": ["Laptop with Python"],
  "tips": ["Say each number out loud"],
  "project": {"title": "Times tables", "description": "Print a times table.", "requirements": "Ask for a number", "starterCode": "n = int(input())", "solutionCode": "for i in range(1, 11):\n    print(n * i)", "extensionIdeas": "Format as a grid"}
}"##;

fn system_prompt() -> String {
    format!("{}{}", SYSTEM_PROMPT, EXAMPLE_LESSON)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LessonGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiLessonAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiLessonAdapter {
    /// Creates a new `OpenAiLessonAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Builds the user prompt describing the lesson to draft.
pub fn lesson_prompt(request: &AiGenerateRequest) -> String {
    let mut prompt = format!(
        "Create a {} lesson about \"{}\" for students aged {}. The lesson should take about {} minutes.",
        request.difficulty, request.topic, request.target_age, request.duration
    );
    if let Some(context) = request.additional_context.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\n\nAdditional context from the teacher: {}", context));
    }
    if request.wants_project() {
        prompt.push_str("\n\nInclude a final project that brings the lesson together.");
    } else {
        prompt.push_str("\n\nDo not include a final project.");
    }
    prompt
}

//=========================================================================================
// `LessonGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LessonGenerationService for OpenAiLessonAdapter {
    /// Asks the model for a lesson draft and returns its raw text.
    async fn generate_lesson(&self, request: &AiGenerateRequest) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(lesson_prompt(request))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                PortError::Unexpected("Lesson LLM returned no choices in its response.".to_string())
            })?
            .message
            .content
            .ok_or_else(|| {
                PortError::Unexpected("Lesson LLM response contained no text content.".to_string())
            })?;
        debug!("Lesson LLM returned {} bytes", content.len());
        Ok(content)
    }
}
