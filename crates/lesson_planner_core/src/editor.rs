//! crates/lesson_planner_core/src/editor.rs
//!
//! Form state for creating or editing one lesson plan.
//!
//! The aggregate is flattened into one editable slot per scalar field and one
//! row list per child collection. On submit it is reassembled, blank rows are
//! dropped, and the whole aggregate is sent in a single create or update call.

use crate::ai_draft::AiDraft;
use crate::domain::{ChallengeDifficulty, Difficulty, LessonChallenge, LessonPlan, LessonProject, LessonStep};
use crate::payloads::{LessonPlanInput, LessonPlanPatch};
use crate::ports::{ClientError, ClientResult, LessonPlannerApi};
use tracing::{debug, error, info};

const DEFAULT_LANGUAGE: &str = "python";
const DEFAULT_DURATION: i32 = 60;
const DEFAULT_POINTS: i32 = 10;

/// Whether the editor will create a new lesson or replace an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(i64),
}

/// What a successful submit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(i64),
    Updated(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// Carries the names of the blank fields.
    #[error("Please fill in all required fields (Title, Description, Language)")]
    MissingRequired(Vec<&'static str>),
}

/// Names the three plain string lists of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Topics,
    Objectives,
    Materials,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepRow {
    pub title: String,
    pub instruction: String,
    pub code_example: String,
    pub expected_output: String,
    pub explanation: String,
    pub hints: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeRow {
    pub title: String,
    pub description: String,
    pub starter_code: String,
    pub solution: String,
    pub difficulty: ChallengeDifficulty,
    pub points: i32,
}

impl Default for ChallengeRow {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            starter_code: String::new(),
            solution: String::new(),
            difficulty: ChallengeDifficulty::Easy,
            points: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectFields {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub starter_code: String,
    pub solution_code: String,
    pub extension_ideas: String,
}

/// Editable state of one lesson plan form.
///
/// Step numbers and challenge orders are not stored per row; they are the
/// row positions (1-based) at reassembly time.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonEditor {
    mode: EditorMode,
    pub title: String,
    pub description: String,
    pub language: String,
    pub category: String,
    difficulty: Difficulty,
    pub target_age: String,
    pub duration: i32,
    pub points: i32,
    pub prerequisites: String,
    pub learning_outcomes: String,
    pub notes: String,
    pub folder_id: Option<i64>,
    pub topics: Vec<String>,
    pub objectives: Vec<String>,
    pub materials: Vec<String>,
    pub steps: Vec<StepRow>,
    pub challenges: Vec<ChallengeRow>,
    pub has_project: bool,
    pub project: ProjectFields,
}

impl Default for LessonEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn rows_or_blank(values: &[String]) -> Vec<String> {
    if values.is_empty() {
        vec![String::new()]
    } else {
        values.to_vec()
    }
}

fn keep_filled(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .collect()
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl StepRow {
    fn from_step(step: &LessonStep) -> Self {
        Self {
            title: step.title.clone(),
            instruction: step.instruction.clone(),
            code_example: step.code_example.clone().unwrap_or_default(),
            expected_output: step.expected_output.clone().unwrap_or_default(),
            explanation: step.explanation.clone(),
            hints: step.hints.clone().unwrap_or_default(),
        }
    }

    fn to_step(&self, step_number: i32) -> LessonStep {
        LessonStep {
            step_number,
            title: self.title.clone(),
            instruction: self.instruction.clone(),
            code_example: optional(&self.code_example),
            expected_output: optional(&self.expected_output),
            explanation: self.explanation.clone(),
            hints: optional(&self.hints),
        }
    }
}

impl ChallengeRow {
    fn from_challenge(challenge: &LessonChallenge) -> Self {
        Self {
            title: challenge.title.clone(),
            description: challenge.description.clone(),
            starter_code: challenge.starter_code.clone().unwrap_or_default(),
            solution: challenge.solution.clone(),
            difficulty: challenge.difficulty,
            points: challenge.points,
        }
    }

    fn to_challenge(&self, order: i32) -> LessonChallenge {
        LessonChallenge {
            order,
            title: self.title.clone(),
            description: self.description.clone(),
            starter_code: optional(&self.starter_code),
            solution: self.solution.clone(),
            difficulty: self.difficulty,
            points: self.points,
        }
    }
}

impl ProjectFields {
    fn from_project(project: &LessonProject) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            requirements: project.requirements.clone(),
            starter_code: project.starter_code.clone().unwrap_or_default(),
            solution_code: project.solution_code.clone(),
            extension_ideas: project.extension_ideas.clone().unwrap_or_default(),
        }
    }

    fn to_project(&self) -> LessonProject {
        LessonProject {
            title: self.title.clone(),
            description: self.description.clone(),
            requirements: self.requirements.clone(),
            starter_code: optional(&self.starter_code),
            solution_code: self.solution_code.clone(),
            extension_ideas: optional(&self.extension_ideas),
        }
    }
}

impl LessonEditor {
    /// A blank form in create mode.
    pub fn new() -> Self {
        Self {
            mode: EditorMode::Create,
            title: String::new(),
            description: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            category: String::new(),
            difficulty: Difficulty::Beginner,
            target_age: String::new(),
            duration: DEFAULT_DURATION,
            points: DEFAULT_POINTS,
            prerequisites: String::new(),
            learning_outcomes: String::new(),
            notes: String::new(),
            folder_id: None,
            topics: vec![String::new()],
            objectives: vec![String::new()],
            materials: vec![String::new()],
            steps: vec![StepRow::default()],
            challenges: vec![ChallengeRow::default()],
            has_project: false,
            project: ProjectFields::default(),
        }
    }

    /// Flattens a stored lesson into an edit-mode form.
    pub fn from_lesson(lesson: &LessonPlan) -> Self {
        let mut editor = Self::new();
        editor.mode = EditorMode::Edit(lesson.id);
        editor.title = lesson.title.clone();
        editor.description = lesson.description.clone();
        if !lesson.language.is_empty() {
            editor.language = lesson.language.clone();
        }
        editor.category = lesson.category.clone();
        editor.difficulty = lesson.difficulty;
        editor.target_age = lesson.target_age.clone();
        if lesson.duration > 0 {
            editor.duration = lesson.duration;
        }
        if lesson.points > 0 {
            editor.points = lesson.points;
        }
        editor.prerequisites = lesson.prerequisites.clone();
        editor.learning_outcomes = lesson.learning_outcomes.clone();
        editor.notes = lesson.notes.clone();
        editor.folder_id = lesson.folder_id;
        editor.topics = rows_or_blank(&lesson.topics);
        editor.objectives = rows_or_blank(&lesson.objectives);
        editor.materials = rows_or_blank(&lesson.materials);

        let mut lesson = lesson.clone();
        lesson.sort_children();
        if !lesson.steps.is_empty() {
            editor.steps = lesson.steps.iter().map(StepRow::from_step).collect();
        }
        if !lesson.challenges.is_empty() {
            editor.challenges = lesson.challenges.iter().map(ChallengeRow::from_challenge).collect();
        }
        if let Some(project) = &lesson.project {
            editor.has_project = true;
            editor.project = ProjectFields::from_project(project);
        }
        editor
    }

    /// Seeds a create-mode form from an AI draft.
    pub fn from_ai_draft(draft: &AiDraft) -> Self {
        let mut editor = Self::new();
        editor.title = draft.title.clone();
        editor.description = draft.description.clone();
        if !draft.language.is_empty() {
            editor.language = draft.language.clone();
        }
        editor.category = draft.category.clone();
        editor.difficulty = draft.difficulty;
        editor.target_age = draft.target_age.clone();
        if draft.duration > 0 {
            editor.duration = draft.duration;
        }
        if draft.points > 0 {
            editor.points = draft.points;
        }
        editor.prerequisites = draft.prerequisites.clone();
        editor.learning_outcomes = draft.learning_outcomes.clone();
        editor.notes = draft.notes.clone();
        editor.topics = rows_or_blank(&draft.topics);
        editor.objectives = rows_or_blank(&draft.objectives);
        editor.materials = rows_or_blank(&draft.materials);
        if !draft.steps.is_empty() {
            editor.steps = draft.steps.iter().map(StepRow::from_step).collect();
        }
        if !draft.challenges.is_empty() {
            editor.challenges = draft.challenges.iter().map(ChallengeRow::from_challenge).collect();
        }
        match (&draft.project, draft.has_project) {
            (Some(project), true) => {
                editor.has_project = true;
                editor.project = ProjectFields::from_project(project);
            }
            _ => editor.has_project = false,
        }
        editor
    }

    /// Fetches a lesson and opens it for editing.
    pub async fn load(api: &dyn LessonPlannerApi, id: i64) -> ClientResult<Self> {
        let lesson = api.get_lesson(id).await.map_err(|e| {
            error!("Failed to load lesson plan {}: {}", id, e);
            e
        })?;
        Ok(Self::from_lesson(&lesson))
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Changes the difficulty. New lessons get the matching suggested points;
    /// an edited lesson keeps the points it already has.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        if self.mode == EditorMode::Create {
            self.points = difficulty.suggested_points();
        }
    }

    pub fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::Topics => &mut self.topics,
            ListField::Objectives => &mut self.objectives,
            ListField::Materials => &mut self.materials,
        }
    }

    pub fn add_entry(&mut self, field: ListField) {
        self.list_mut(field).push(String::new());
    }

    /// Removes one entry; the last remaining entry is blanked instead.
    pub fn remove_entry(&mut self, field: ListField, index: usize) {
        let list = self.list_mut(field);
        if index >= list.len() {
            return;
        }
        if list.len() == 1 {
            list[0].clear();
        } else {
            list.remove(index);
        }
    }

    pub fn add_step(&mut self) {
        self.steps.push(StepRow::default());
    }

    pub fn remove_step(&mut self, index: usize) {
        if index < self.steps.len() {
            self.steps.remove(index);
        }
        if self.steps.is_empty() {
            self.steps.push(StepRow::default());
        }
    }

    pub fn add_challenge(&mut self) {
        self.challenges.push(ChallengeRow::default());
    }

    pub fn remove_challenge(&mut self, index: usize) {
        if index < self.challenges.len() {
            self.challenges.remove(index);
        }
        if self.challenges.is_empty() {
            self.challenges.push(ChallengeRow::default());
        }
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("Title");
        }
        if self.description.trim().is_empty() {
            missing.push("Description");
        }
        if self.language.trim().is_empty() {
            missing.push("Language");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EditorError::MissingRequired(missing))
        }
    }

    /// Reassembles the aggregate. Rows without a title and blank list entries
    /// are dropped; the remaining rows are numbered by position.
    pub fn to_input(&self) -> LessonPlanInput {
        let steps = self
            .steps
            .iter()
            .filter(|row| !row.title.trim().is_empty())
            .enumerate()
            .map(|(idx, row)| row.to_step(idx as i32 + 1))
            .collect();
        let challenges = self
            .challenges
            .iter()
            .filter(|row| !row.title.trim().is_empty())
            .enumerate()
            .map(|(idx, row)| row.to_challenge(idx as i32 + 1))
            .collect();

        LessonPlanInput {
            title: self.title.clone(),
            description: self.description.clone(),
            language: self.language.clone(),
            category: self.category.clone(),
            target_age: self.target_age.clone(),
            duration: self.duration,
            difficulty: self.difficulty,
            points: self.points,
            folder_id: self.folder_id,
            prerequisites: self.prerequisites.clone(),
            learning_outcomes: self.learning_outcomes.clone(),
            topics: keep_filled(&self.topics),
            objectives: keep_filled(&self.objectives),
            materials: keep_filled(&self.materials),
            steps,
            challenges,
            project: self.has_project.then(|| self.project.to_project()),
            notes: self.notes.clone(),
        }
    }

    /// Validates, reassembles and sends the lesson: create in create mode,
    /// full replacement in edit mode.
    pub async fn submit(&self, api: &dyn LessonPlannerApi) -> ClientResult<SubmitOutcome> {
        self.validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let input = self.to_input();
        debug!(
            "Saving lesson '{}' with {} steps and {} challenges",
            input.title,
            input.steps.len(),
            input.challenges.len()
        );

        match self.mode {
            EditorMode::Create => {
                let created = api.create_lesson(&input).await?;
                info!("Created lesson plan {}", created.id);
                Ok(SubmitOutcome::Created(created.id))
            }
            EditorMode::Edit(id) => {
                api.update_lesson(id, &LessonPlanPatch::from(input)).await?;
                info!("Updated lesson plan {}", id);
                Ok(SubmitOutcome::Updated(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_draft::{placeholder_challenge, placeholder_step};
    use crate::testing::RecordingApi;

    fn stored_lesson() -> LessonPlan {
        serde_json::from_value(serde_json::json!({
            "id": 12,
            "title": "Functions",
            "description": "Defining and calling",
            "language": "javascript",
            "difficulty": "Intermediate",
            "points": 25,
            "folderId": 3,
            "topics": ["functions"],
            "steps": [
                {"stepNumber": 2, "title": "Call it"},
                {"stepNumber": 1, "title": "Define it", "codeExample": "function f() {}"}
            ],
            "project": {"title": "Calculator", "solutionCode": "..."}
        }))
        .unwrap()
    }

    #[test]
    fn blank_editor_has_one_placeholder_row_everywhere() {
        let editor = LessonEditor::new();
        assert_eq!(editor.mode(), EditorMode::Create);
        assert_eq!(editor.language, "python");
        assert_eq!(editor.duration, 60);
        assert_eq!(editor.topics, vec![String::new()]);
        assert_eq!(editor.steps.len(), 1);
        assert_eq!(editor.challenges[0].points, 10);
        assert!(!editor.has_project);
    }

    #[test]
    fn flattening_orders_steps_and_enables_project() {
        let editor = LessonEditor::from_lesson(&stored_lesson());
        assert_eq!(editor.mode(), EditorMode::Edit(12));
        assert_eq!(editor.steps[0].title, "Define it");
        assert_eq!(editor.steps[0].code_example, "function f() {}");
        assert_eq!(editor.objectives, vec![String::new()]);
        assert_eq!(editor.challenges, vec![ChallengeRow::default()]);
        assert!(editor.has_project);
        assert_eq!(editor.folder_id, Some(3));
    }

    #[test]
    fn reassembly_drops_blank_rows_and_renumbers() {
        let mut editor = LessonEditor::new();
        editor.title = "Lists".into();
        editor.description = "Working with lists".into();
        editor.topics = vec!["lists".into(), "  ".into()];
        editor.steps = vec![
            StepRow { title: "one".into(), ..StepRow::default() },
            StepRow::default(),
            StepRow { title: "two".into(), hints: "think".into(), ..StepRow::default() },
        ];

        let input = editor.to_input();

        assert_eq!(input.topics, vec!["lists".to_string()]);
        assert!(input.objectives.is_empty());
        let numbers: Vec<_> = input.steps.iter().map(|s| (s.step_number, s.title.as_str())).collect();
        assert_eq!(numbers, [(1, "one"), (2, "two")]);
        assert_eq!(input.steps[1].hints.as_deref(), Some("think"));
        assert!(input.challenges.is_empty());
        assert_eq!(input.project, None);
    }

    #[test]
    fn difficulty_resuggests_points_only_when_creating() {
        let mut creating = LessonEditor::new();
        creating.set_difficulty(Difficulty::Advanced);
        assert_eq!(creating.points, 30);

        let mut editing = LessonEditor::from_lesson(&stored_lesson());
        editing.set_difficulty(Difficulty::Advanced);
        assert_eq!(editing.points, 25);
    }

    #[test]
    fn removing_last_row_keeps_a_blank_one() {
        let mut editor = LessonEditor::new();
        editor.topics[0] = "io".into();
        editor.remove_entry(ListField::Topics, 0);
        assert_eq!(editor.topics, vec![String::new()]);

        editor.add_step();
        editor.remove_step(0);
        editor.remove_step(0);
        assert_eq!(editor.steps.len(), 1);
    }

    #[test]
    fn ai_draft_seeds_a_create_form() {
        let draft = AiDraft {
            title: "Intro".into(),
            description: String::new(),
            language: "python".into(),
            category: "Loops".into(),
            difficulty: Difficulty::Beginner,
            target_age: String::new(),
            duration: 0,
            points: 10,
            prerequisites: String::new(),
            learning_outcomes: String::new(),
            notes: String::new(),
            topics: vec!["Loops".into()],
            objectives: Vec::new(),
            materials: Vec::new(),
            steps: vec![placeholder_step()],
            challenges: vec![placeholder_challenge()],
            has_project: false,
            project: None,
        };

        let editor = LessonEditor::from_ai_draft(&draft);

        assert_eq!(editor.mode(), EditorMode::Create);
        assert_eq!(editor.duration, 60);
        assert_eq!(editor.objectives, vec![String::new()]);
        assert_eq!(editor.steps[0].title, "Getting Started");
        assert_eq!(editor.challenges[0].starter_code, "# Write your code here\n");
        assert!(!editor.has_project);
    }

    #[tokio::test]
    async fn submit_rejects_missing_fields_without_a_request() {
        let api = RecordingApi::default();
        let editor = LessonEditor::new();

        let err = editor.submit(&api).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(err.to_string().contains("Title, Description"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn submit_creates_or_replaces_by_mode() {
        let api = RecordingApi::default();

        let mut creating = LessonEditor::new();
        creating.title = "New".into();
        creating.description = "Fresh".into();
        assert_eq!(creating.submit(&api).await.unwrap(), SubmitOutcome::Created(100));

        let mut editing = LessonEditor::from_lesson(&stored_lesson());
        editing.has_project = false;
        assert_eq!(editing.submit(&api).await.unwrap(), SubmitOutcome::Updated(12));

        let calls = api.calls();
        assert_eq!(calls[0], "create_lesson");
        assert_eq!(calls[1], "update_lesson 12");
        let patch = api.last_lesson_patch().unwrap();
        assert_eq!(patch.project, Some(None));
        assert_eq!(patch.folder_id, Some(Some(3)));
    }
}
