//! crates/lesson_planner_core/src/payloads.rs
//!
//! Request and response bodies of the REST contract.
//!
//! `*Input` types are complete create bodies. `*Patch` types are update bodies
//! where every absent field keeps its stored value; a patch built from an input
//! carries every field and therefore replaces the whole aggregate.

use crate::domain::{
    ChallengeDifficulty, CodeSnippet, Difficulty, LessonChallenge, LessonFolder, LessonPlan,
    LessonProject, LessonStep, SkillLevel, Student, StudentGroup, StudentLanguage,
    DEFAULT_FOLDER_COLOR,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a field that distinguishes "absent" from `null`:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
/// Pair with `#[serde(default)]`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

//=========================================================================================
// Lesson Plans
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LessonPlanInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub target_age: String,
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub prerequisites: String,
    #[serde(default)]
    pub learning_outcomes: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub steps: Vec<LessonStep>,
    #[serde(default)]
    pub challenges: Vec<LessonChallenge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<LessonProject>,
    #[serde(default)]
    pub notes: String,
}

impl LessonPlanInput {
    /// Builds the stored aggregate, with children in their canonical order.
    pub fn into_lesson(self, id: i64, now: DateTime<Utc>) -> LessonPlan {
        let mut lesson = LessonPlan {
            id,
            title: self.title,
            description: self.description,
            language: self.language,
            category: self.category,
            target_age: self.target_age,
            duration: self.duration,
            difficulty: self.difficulty,
            points: self.points,
            folder_id: self.folder_id,
            prerequisites: self.prerequisites,
            learning_outcomes: self.learning_outcomes,
            topics: self.topics,
            objectives: self.objectives,
            materials: self.materials,
            steps: self.steps,
            challenges: self.challenges,
            project: self.project,
            notes: self.notes,
            created_at: Some(now),
            updated_at: Some(now),
        };
        lesson.sort_children();
        lesson
    }
}

impl From<&LessonPlan> for LessonPlanInput {
    fn from(lesson: &LessonPlan) -> Self {
        Self {
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            language: lesson.language.clone(),
            category: lesson.category.clone(),
            target_age: lesson.target_age.clone(),
            duration: lesson.duration,
            difficulty: lesson.difficulty,
            points: lesson.points,
            folder_id: lesson.folder_id,
            prerequisites: lesson.prerequisites.clone(),
            learning_outcomes: lesson.learning_outcomes.clone(),
            topics: lesson.topics.clone(),
            objectives: lesson.objectives.clone(),
            materials: lesson.materials.clone(),
            steps: lesson.steps.clone(),
            challenges: lesson.challenges.clone(),
            project: lesson.project.clone(),
            notes: lesson.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LessonPlanPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub folder_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_outcomes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectives: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<LessonStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenges: Option<Vec<LessonChallenge>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<LessonProject>))]
    pub project: Option<Option<LessonProject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LessonPlanPatch {
    /// A patch that only moves the lesson into `folder_id` (or out of any folder).
    pub fn move_to_folder(folder_id: Option<i64>) -> Self {
        Self {
            folder_id: Some(folder_id),
            ..Self::default()
        }
    }

    /// Applies the patch. Child collections present in the patch replace the
    /// stored ones wholesale and are re-sorted.
    pub fn apply_to(self, lesson: &mut LessonPlan, now: DateTime<Utc>) {
        if let Some(v) = self.title {
            lesson.title = v;
        }
        if let Some(v) = self.description {
            lesson.description = v;
        }
        if let Some(v) = self.language {
            lesson.language = v;
        }
        if let Some(v) = self.category {
            lesson.category = v;
        }
        if let Some(v) = self.target_age {
            lesson.target_age = v;
        }
        if let Some(v) = self.duration {
            lesson.duration = v;
        }
        if let Some(v) = self.difficulty {
            lesson.difficulty = v;
        }
        if let Some(v) = self.points {
            lesson.points = v;
        }
        if let Some(v) = self.folder_id {
            lesson.folder_id = v;
        }
        if let Some(v) = self.prerequisites {
            lesson.prerequisites = v;
        }
        if let Some(v) = self.learning_outcomes {
            lesson.learning_outcomes = v;
        }
        if let Some(v) = self.topics {
            lesson.topics = v;
        }
        if let Some(v) = self.objectives {
            lesson.objectives = v;
        }
        if let Some(v) = self.materials {
            lesson.materials = v;
        }
        if let Some(v) = self.steps {
            lesson.steps = v;
        }
        if let Some(v) = self.challenges {
            lesson.challenges = v;
        }
        if let Some(v) = self.project {
            lesson.project = v;
        }
        if let Some(v) = self.notes {
            lesson.notes = v;
        }
        lesson.sort_children();
        lesson.updated_at = Some(now);
    }
}

impl From<LessonPlanInput> for LessonPlanPatch {
    fn from(input: LessonPlanInput) -> Self {
        Self {
            title: Some(input.title),
            description: Some(input.description),
            language: Some(input.language),
            category: Some(input.category),
            target_age: Some(input.target_age),
            duration: Some(input.duration),
            difficulty: Some(input.difficulty),
            points: Some(input.points),
            folder_id: Some(input.folder_id),
            prerequisites: Some(input.prerequisites),
            learning_outcomes: Some(input.learning_outcomes),
            topics: Some(input.topics),
            objectives: Some(input.objectives),
            materials: Some(input.materials),
            steps: Some(input.steps),
            challenges: Some(input.challenges),
            project: Some(input.project),
            notes: Some(input.notes),
        }
    }
}

//=========================================================================================
// Folders
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FolderInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub order_index: i32,
}

fn default_color() -> String {
    DEFAULT_FOLDER_COLOR.to_string()
}

impl FolderInput {
    pub fn into_folder(self, id: i64, now: DateTime<Utc>) -> LessonFolder {
        LessonFolder {
            id,
            name: self.name,
            description: self.description,
            color: self.color,
            order_index: self.order_index,
            lesson_count: 0,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FolderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
}

impl FolderPatch {
    pub fn apply_to(self, folder: &mut LessonFolder, now: DateTime<Utc>) {
        if let Some(v) = self.name {
            folder.name = v;
        }
        if let Some(v) = self.description {
            folder.description = v;
        }
        if let Some(v) = self.color {
            folder.color = v;
        }
        if let Some(v) = self.order_index {
            folder.order_index = v;
        }
        folder.updated_at = Some(now);
    }
}

impl From<FolderInput> for FolderPatch {
    fn from(input: FolderInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            color: Some(input.color),
            order_index: Some(input.order_index),
        }
    }
}

//=========================================================================================
// Code Snippets
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SnippetInput {
    pub title: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl SnippetInput {
    pub fn into_snippet(self, id: i64) -> CodeSnippet {
        CodeSnippet {
            id,
            title: self.title,
            language: self.language,
            code: self.code,
            explanation: self.explanation,
            difficulty: self.difficulty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SnippetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl SnippetPatch {
    pub fn apply_to(self, snippet: &mut CodeSnippet) {
        if let Some(v) = self.title {
            snippet.title = v;
        }
        if let Some(v) = self.language {
            snippet.language = v;
        }
        if let Some(v) = self.code {
            snippet.code = v;
        }
        if let Some(v) = self.explanation {
            snippet.explanation = v;
        }
        if let Some(v) = self.difficulty {
            snippet.difficulty = v;
        }
    }
}

impl From<SnippetInput> for SnippetPatch {
    fn from(input: SnippetInput) -> Self {
        Self {
            title: Some(input.title),
            language: Some(input.language),
            code: Some(input.code),
            explanation: Some(input.explanation),
            difficulty: Some(input.difficulty),
        }
    }
}

//=========================================================================================
// Students
//=========================================================================================

/// Create body for a student. Progress and the derived counters are not
/// accepted here; they only change through the progress endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub name: String,
    #[serde(default)]
    pub age: i32,
    #[serde(default)]
    pub skill_level: SkillLevel,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub languages: Vec<StudentLanguage>,
}

impl StudentInput {
    pub fn into_student(self, id: i64, now: DateTime<Utc>) -> Student {
        let mut student = Student {
            id,
            name: self.name,
            age: self.age,
            skill_level: self.skill_level,
            group_id: self.group_id,
            group_name: None,
            email: self.email,
            parent_email: self.parent_email,
            notes: self.notes,
            is_active: self.is_active.unwrap_or(true),
            languages: self.languages,
            progress: Vec::new(),
            language_count: 0,
            total_lessons: 0,
            completed_lessons: 0,
            total_points_earned: 0,
            created_at: Some(now),
            updated_at: Some(now),
        };
        student.refresh_totals();
        student
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevel>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub group_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub parent_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<StudentLanguage>>,
}

impl StudentPatch {
    pub fn apply_to(self, student: &mut Student, now: DateTime<Utc>) {
        if let Some(v) = self.name {
            student.name = v;
        }
        if let Some(v) = self.age {
            student.age = v;
        }
        if let Some(v) = self.skill_level {
            student.skill_level = v;
        }
        if let Some(v) = self.group_id {
            student.group_id = v;
        }
        if let Some(v) = self.email {
            student.email = v;
        }
        if let Some(v) = self.parent_email {
            student.parent_email = v;
        }
        if let Some(v) = self.notes {
            student.notes = v;
        }
        if let Some(v) = self.is_active {
            student.is_active = v;
        }
        if let Some(v) = self.languages {
            student.languages = v;
        }
        student.updated_at = Some(now);
        student.refresh_totals();
    }
}

//=========================================================================================
// Student Groups
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GroupInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub average_age: i32,
    #[serde(default)]
    pub skill_level: SkillLevel,
}

impl GroupInput {
    pub fn into_group(self, id: i64) -> StudentGroup {
        StudentGroup {
            id,
            name: self.name,
            description: self.description,
            average_age: self.average_age,
            skill_level: self.skill_level,
            student_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevel>,
}

impl GroupPatch {
    pub fn apply_to(self, group: &mut StudentGroup) {
        if let Some(v) = self.name {
            group.name = v;
        }
        if let Some(v) = self.description {
            group.description = v;
        }
        if let Some(v) = self.average_age {
            group.average_age = v;
        }
        if let Some(v) = self.skill_level {
            group.skill_level = v;
        }
    }
}

//=========================================================================================
// Progress and AI
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub student_id: i64,
    pub lesson_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProgressAward {
    pub success: bool,
    pub points_awarded: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AiGenerateRequest {
    pub topic: String,
    #[serde(default)]
    pub target_age: String,
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_final_project: Option<bool>,
}

impl AiGenerateRequest {
    pub fn wants_project(&self) -> bool {
        self.include_final_project.unwrap_or(false)
    }

    /// Challenge difficulty implied by the requested lesson difficulty.
    pub fn challenge_difficulty(&self) -> ChallengeDifficulty {
        self.difficulty.challenge_difficulty()
    }
}

//=========================================================================================
// Generic Responses
//=========================================================================================

/// Returned by every create endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

/// Returned by update and delete endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SuccessResponse {
    pub success: bool,
}

/// The structured body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Raw model output, only present on AI generation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_content: Option<String>,
}

impl ApiErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_null_from_absent_folder() {
        let cleared: LessonPlanPatch = serde_json::from_value(json!({"folderId": null})).unwrap();
        assert_eq!(cleared.folder_id, Some(None));

        let untouched: LessonPlanPatch = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(untouched.folder_id, None);

        let moved = serde_json::to_value(LessonPlanPatch::move_to_folder(None)).unwrap();
        assert_eq!(moved, json!({"folderId": null}));
    }

    #[test]
    fn partial_patch_keeps_children() {
        let input = LessonPlanInput {
            title: "Loops".into(),
            steps: vec![LessonStep {
                step_number: 1,
                title: "for".into(),
                ..LessonStep::default()
            }],
            folder_id: Some(4),
            ..LessonPlanInput::default()
        };
        let mut lesson = input.into_lesson(1, Utc::now());

        LessonPlanPatch::move_to_folder(None).apply_to(&mut lesson, Utc::now());

        assert_eq!(lesson.folder_id, None);
        assert_eq!(lesson.steps.len(), 1);
        assert_eq!(lesson.title, "Loops");
    }

    #[test]
    fn full_patch_from_input_clears_project() {
        let mut lesson = LessonPlanInput {
            title: "Games".into(),
            project: Some(LessonProject {
                title: "Snake".into(),
                ..LessonProject::default()
            }),
            ..LessonPlanInput::default()
        }
        .into_lesson(2, Utc::now());

        let replacement = LessonPlanInput {
            title: "Games".into(),
            ..LessonPlanInput::default()
        };
        let patch = LessonPlanPatch::from(replacement);
        assert_eq!(serde_json::to_value(&patch).unwrap()["project"], json!(null));

        patch.apply_to(&mut lesson, Utc::now());
        assert_eq!(lesson.project, None);
    }

    #[test]
    fn student_patch_can_clear_contact_fields() {
        let mut student = StudentInput {
            name: "Ada".into(),
            email: Some("ada@example.com".into()),
            parent_email: Some("parent@example.com".into()),
            notes: Some("Likes turtles".into()),
            ..StudentInput::default()
        }
        .into_student(3, Utc::now());

        let patch: StudentPatch =
            serde_json::from_value(json!({"parentEmail": null, "notes": "Moved to Python"})).unwrap();
        assert_eq!(patch.email, None);
        assert_eq!(patch.parent_email, Some(None));
        assert_eq!(serde_json::to_value(&patch).unwrap()["parentEmail"], json!(null));

        patch.apply_to(&mut student, Utc::now());
        assert_eq!(student.email.as_deref(), Some("ada@example.com"));
        assert_eq!(student.parent_email, None);
        assert_eq!(student.notes.as_deref(), Some("Moved to Python"));
    }
}
