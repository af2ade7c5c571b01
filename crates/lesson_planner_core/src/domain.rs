//! crates/lesson_planner_core/src/domain.rs
//!
//! Defines the core data structures shared by the backend and the client.
//! Every struct here is also the JSON wire shape (camelCase keys), so both
//! sides of the REST contract agree on one definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Enumerations
//=========================================================================================

/// Error returned when a stored or submitted label is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// Generates a string-labelled enum whose serde form, `Display` and `FromStr`
// all use the same label.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

labelled_enum!(
    /// Difficulty of a lesson or snippet, and the skill level of a student or group.
    Difficulty, default = Beginner, {
        Beginner => "Beginner",
        Intermediate => "Intermediate",
        Advanced => "Advanced",
    }
);

labelled_enum!(
    /// Difficulty of a single challenge inside a lesson.
    ChallengeDifficulty, default = Easy, {
        Easy => "Easy",
        Medium => "Medium",
        Hard => "Hard",
    }
);

labelled_enum!(
    /// How well a student knows one programming language.
    ProficiencyLevel, default = Beginner, {
        Beginner => "Beginner",
        Intermediate => "Intermediate",
        Advanced => "Advanced",
        Expert => "Expert",
    }
);

labelled_enum!(
    /// Completion state of one lesson for one student.
    ProgressStatus, default = NotStarted, {
        NotStarted => "Not Started",
        InProgress => "In Progress",
        Completed => "Completed",
        Mastered => "Mastered",
    }
);

/// Students and groups share the lesson difficulty scale.
pub type SkillLevel = Difficulty;

impl Difficulty {
    /// Points suggested for a lesson of this difficulty.
    pub fn suggested_points(self) -> i32 {
        match self {
            Difficulty::Beginner => 10,
            Difficulty::Intermediate => 20,
            Difficulty::Advanced => 30,
        }
    }

    /// Challenge difficulty matching a lesson of this difficulty.
    pub fn challenge_difficulty(self) -> ChallengeDifficulty {
        match self {
            Difficulty::Beginner => ChallengeDifficulty::Easy,
            Difficulty::Intermediate => ChallengeDifficulty::Medium,
            Difficulty::Advanced => ChallengeDifficulty::Hard,
        }
    }

    /// Points suggested for a challenge inside a lesson of this difficulty.
    pub fn challenge_points(self) -> i32 {
        match self {
            Difficulty::Beginner => 10,
            Difficulty::Intermediate => 15,
            Difficulty::Advanced => 20,
        }
    }
}

impl ProgressStatus {
    /// Completed and Mastered both count as a finished lesson.
    pub fn is_complete(self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Mastered)
    }
}

//=========================================================================================
// Lesson Plan Aggregate
//=========================================================================================

/// A lesson plan together with its owned steps, challenges and optional project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub id: i64,
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
    /// `None` means the lesson is uncategorized.
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
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LessonPlan {
    /// Restores the child ordering invariant: steps by `step_number`,
    /// challenges by `order`. The sort is stable, so ties keep submission order.
    pub fn sort_children(&mut self) {
        self.steps.sort_by_key(|s| s.step_number);
        self.challenges.sort_by_key(|c| c.order);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LessonStep {
    pub step_number: i32,
    pub title: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LessonChallenge {
    pub order: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub difficulty: ChallengeDifficulty,
    #[serde(default)]
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LessonProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
    #[serde(default)]
    pub solution_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_ideas: Option<String>,
}

//=========================================================================================
// Folders
//=========================================================================================

/// Colour applied to new folders.
pub const DEFAULT_FOLDER_COLOR: &str = "#1A237E";

/// The fixed folder palette as `(name, hex)` pairs.
pub const FOLDER_PALETTE: [(&str, &str); 8] = [
    ("Blue", "#1A237E"),
    ("Red", "#c62828"),
    ("Green", "#2e7d32"),
    ("Orange", "#ef6c00"),
    ("Purple", "#6a1b9a"),
    ("Teal", "#00695c"),
    ("Pink", "#ad1457"),
    ("Indigo", "#283593"),
];

/// A named group of lessons. Membership lives on `LessonPlan::folder_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LessonFolder {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_folder_color")]
    pub color: String,
    #[serde(default)]
    pub order_index: i32,
    /// Derived by the backend from lesson back-references.
    #[serde(default)]
    pub lesson_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_folder_color() -> String {
    DEFAULT_FOLDER_COLOR.to_string()
}

/// Returns true when `color` is one of the palette entries (case-insensitive).
pub fn is_palette_color(color: &str) -> bool {
    FOLDER_PALETTE
        .iter()
        .any(|(_, hex)| hex.eq_ignore_ascii_case(color))
}

//=========================================================================================
// Code Snippets
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub id: i64,
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

//=========================================================================================
// Students and Groups
//=========================================================================================

/// A student with owned language and progress records.
///
/// The counters at the bottom are computed by the backend from the owned
/// collections; the client reads them and never writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub age: i32,
    #[serde(default)]
    pub skill_level: SkillLevel,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub languages: Vec<StudentLanguage>,
    #[serde(default)]
    pub progress: Vec<StudentProgress>,
    #[serde(default)]
    pub language_count: i64,
    #[serde(default)]
    pub total_lessons: i64,
    #[serde(default)]
    pub completed_lessons: i64,
    #[serde(default)]
    pub total_points_earned: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Student {
    /// Recomputes the denormalized counters from the owned collections.
    /// Only the backend calls this before returning a student.
    pub fn refresh_totals(&mut self) {
        self.language_count = self.languages.len() as i64;
        self.total_lessons = self.progress.len() as i64;
        self.completed_lessons = self
            .progress
            .iter()
            .filter(|p| p.status.is_complete())
            .count() as i64;
        self.total_points_earned = self
            .progress
            .iter()
            .map(|p| i64::from(p.points_earned))
            .sum();
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudentLanguage {
    pub language: String,
    #[serde(default)]
    pub proficiency_level: ProficiencyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practiced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One student's record for one lesson.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub lesson_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_difficulty: Option<String>,
    #[serde(default)]
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(default)]
    pub points_earned: i32,
    #[serde(default)]
    pub time_spent_minutes: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A named cohort of students. Membership lives on `Student::group_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudentGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub average_age: i32,
    #[serde(default)]
    pub skill_level: SkillLevel,
    /// Derived by the backend from student back-references.
    #[serde(default)]
    pub student_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_status_uses_spaced_labels_on_the_wire() {
        let json = serde_json::to_string(&ProgressStatus::NotStarted).unwrap();
        assert_eq!(json, "\"Not Started\"");
        let parsed: ProgressStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(parsed, ProgressStatus::InProgress);
        assert_eq!("Mastered".parse::<ProgressStatus>(), Ok(ProgressStatus::Mastered));
        assert!("Done".parse::<ProgressStatus>().is_err());
    }

    #[test]
    fn sort_children_orders_steps_and_challenges() {
        let mut lesson: LessonPlan = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Loops",
            "steps": [
                {"stepNumber": 3, "title": "c"},
                {"stepNumber": 1, "title": "a"},
                {"stepNumber": 2, "title": "b"}
            ],
            "challenges": [
                {"order": 2, "title": "y"},
                {"order": 1, "title": "x"}
            ]
        }))
        .unwrap();

        lesson.sort_children();

        let titles: Vec<_> = lesson.steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
        assert_eq!(lesson.challenges[0].title, "x");
        assert_eq!(lesson.folder_id, None);
    }

    #[test]
    fn refresh_totals_counts_completed_and_mastered() {
        let mut student: Student = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Ada",
            "languages": [{"language": "python"}],
            "progress": [
                {"lessonId": 1, "status": "Completed", "pointsEarned": 10},
                {"lessonId": 2, "status": "Mastered", "pointsEarned": 20},
                {"lessonId": 3, "status": "In Progress"}
            ],
            "completedLessons": 99
        }))
        .unwrap();

        student.refresh_totals();

        assert_eq!(student.language_count, 1);
        assert_eq!(student.total_lessons, 3);
        assert_eq!(student.completed_lessons, 2);
        assert_eq!(student.total_points_earned, 30);
        assert!(student.is_active);
    }

    #[test]
    fn difficulty_drives_point_suggestions() {
        assert_eq!(Difficulty::Beginner.suggested_points(), 10);
        assert_eq!(Difficulty::Advanced.suggested_points(), 30);
        assert_eq!(Difficulty::Intermediate.challenge_difficulty(), ChallengeDifficulty::Medium);
        assert_eq!(Difficulty::Advanced.challenge_points(), 20);
        assert!(is_palette_color("#c62828"));
        assert!(!is_palette_color("#000000"));
    }
}
