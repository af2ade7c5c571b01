//! crates/lesson_planner_core/src/views.rs
//!
//! Per-page view state: what each page fetches when it mounts and the filters
//! it derives from those collections. Nothing here is cached between pages;
//! a page reloads its state after every mutation.

use crate::domain::{CodeSnippet, Difficulty, LessonFolder, LessonPlan, SkillLevel, Student, StudentGroup};
use crate::membership::{lessons_in_folder, uncategorized_folder, UNCATEGORIZED_FOLDER_ID};
use crate::ports::{ClientResult, LessonPlannerApi};
use crate::progress::{completion_percentage, is_lesson_completed};
use futures::try_join;
use tracing::{debug, warn};

/// Lessons whose title, description or category contains `query`,
/// ignoring case. A blank query matches everything.
pub fn search_lessons(lessons: &[LessonPlan], query: &str) -> Vec<LessonPlan> {
    let needle = query.trim().to_lowercase();
    lessons
        .iter()
        .filter(|l| {
            needle.is_empty()
                || l.title.to_lowercase().contains(&needle)
                || l.description.to_lowercase().contains(&needle)
                || l.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

//=========================================================================================
// Lesson Library
//=========================================================================================

/// The lesson list page: every lesson grouped by folder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonLibrary {
    pub lessons: Vec<LessonPlan>,
    pub folders: Vec<LessonFolder>,
}

impl LessonLibrary {
    /// Lessons are required. Folders are optional: if they cannot be loaded the
    /// page still works with everything shown as uncategorized.
    pub async fn load(api: &dyn LessonPlannerApi) -> ClientResult<Self> {
        let (lessons, folders) = futures::join!(api.list_lessons(), api.list_folders());
        let lessons = lessons?;
        let folders = folders.unwrap_or_else(|e| {
            warn!("Folders not available, showing all lessons as uncategorized: {}", e);
            Vec::new()
        });
        debug!("Loaded {} lessons in {} folders", lessons.len(), folders.len());
        Ok(Self { lessons, folders })
    }

    pub fn lessons_in(&self, folder_id: i64) -> Vec<LessonPlan> {
        lessons_in_folder(&self.lessons, folder_id)
    }

    pub fn uncategorized(&self) -> Vec<LessonPlan> {
        lessons_in_folder(&self.lessons, UNCATEGORIZED_FOLDER_ID)
    }

    /// Folders sorted by `order_index` then name, with counts taken from the
    /// loaded lessons, followed by the uncategorized pseudo-folder.
    pub fn folder_cards(&self) -> Vec<LessonFolder> {
        let mut cards: Vec<LessonFolder> = self
            .folders
            .iter()
            .map(|f| LessonFolder {
                lesson_count: self.lessons_in(f.id).len() as i64,
                ..f.clone()
            })
            .collect();
        cards.sort_by(|a, b| a.order_index.cmp(&b.order_index).then_with(|| a.name.cmp(&b.name)));
        cards.push(uncategorized_folder(self.uncategorized().len() as i64));
        cards
    }

    pub fn search(&self, query: &str) -> Vec<LessonPlan> {
        search_lessons(&self.lessons, query)
    }
}

//=========================================================================================
// Folder Detail
//=========================================================================================

/// Which folder a detail page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderRef {
    Uncategorized,
    Id(i64),
}

impl From<i64> for FolderRef {
    fn from(id: i64) -> Self {
        if id == UNCATEGORIZED_FOLDER_ID {
            FolderRef::Uncategorized
        } else {
            FolderRef::Id(id)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderPage {
    pub folder: LessonFolder,
    pub lessons: Vec<LessonPlan>,
}

impl FolderPage {
    pub async fn load(api: &dyn LessonPlannerApi, folder: FolderRef) -> ClientResult<Self> {
        match folder {
            FolderRef::Uncategorized => {
                let lessons = lessons_in_folder(&api.list_lessons().await?, UNCATEGORIZED_FOLDER_ID);
                Ok(Self {
                    folder: uncategorized_folder(lessons.len() as i64),
                    lessons,
                })
            }
            FolderRef::Id(id) => {
                let (folder, lessons) = try_join!(api.get_folder(id), api.list_lessons())?;
                Ok(Self {
                    folder,
                    lessons: lessons_in_folder(&lessons, id),
                })
            }
        }
    }
}

//=========================================================================================
// Students and Groups
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupAnalytics {
    pub student_count: usize,
    pub total_completed: i64,
    pub total_assigned: i64,
    pub total_languages: i64,
    /// Mean of the members' completion percentages, rounded.
    pub average_progress: i64,
    pub beginners: usize,
    pub intermediates: usize,
    pub advanced: usize,
}

impl GroupAnalytics {
    pub fn of(members: &[Student]) -> Self {
        let count_level = |level: SkillLevel| members.iter().filter(|s| s.skill_level == level).count();
        let average_progress = if members.is_empty() {
            0
        } else {
            let sum: i64 = members.iter().map(completion_percentage).sum();
            (sum as f64 / members.len() as f64).round() as i64
        };
        Self {
            student_count: members.len(),
            total_completed: members.iter().map(|s| s.completed_lessons).sum(),
            total_assigned: members.iter().map(|s| s.total_lessons).sum(),
            total_languages: members.iter().map(|s| s.language_count).sum(),
            average_progress,
            beginners: count_level(Difficulty::Beginner),
            intermediates: count_level(Difficulty::Intermediate),
            advanced: count_level(Difficulty::Advanced),
        }
    }
}

/// The groups page: all students and all groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentRoster {
    pub students: Vec<Student>,
    pub groups: Vec<StudentGroup>,
}

impl StudentRoster {
    pub async fn load(api: &dyn LessonPlannerApi) -> ClientResult<Self> {
        let (students, groups) = try_join!(api.list_students(), api.list_groups())?;
        Ok(Self { students, groups })
    }

    pub fn members(&self, group_id: i64) -> Vec<Student> {
        crate::membership::group_members(&self.students, group_id)
    }

    /// Members of the group whose name contains `search` (ignoring case) and,
    /// when given, whose skill level matches.
    pub fn filter_members(&self, group_id: i64, search: &str, level: Option<SkillLevel>) -> Vec<Student> {
        let needle = search.to_lowercase();
        self.members(group_id)
            .into_iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .filter(|s| level.map_or(true, |l| s.skill_level == l))
            .collect()
    }

    pub fn analytics(&self, group_id: i64) -> GroupAnalytics {
        GroupAnalytics::of(&self.members(group_id))
    }
}

//=========================================================================================
// Lesson Assignment
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionFilter {
    #[default]
    All,
    Completed,
    Pending,
}

/// One student's lesson assignment page.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentBoard {
    pub student: Student,
    pub lessons: Vec<LessonPlan>,
}

impl AssignmentBoard {
    pub async fn load(api: &dyn LessonPlannerApi, student_id: i64) -> ClientResult<Self> {
        let (student, lessons) = try_join!(api.get_student(student_id), api.list_lessons())?;
        Ok(Self { student, lessons })
    }

    /// Lessons matching the completion filter and, when given, the exact language.
    pub fn visible_lessons(&self, filter: CompletionFilter, language: Option<&str>) -> Vec<&LessonPlan> {
        self.lessons
            .iter()
            .filter(|lesson| {
                let completed = is_lesson_completed(&self.student, lesson.id);
                match filter {
                    CompletionFilter::All => true,
                    CompletionFilter::Completed => completed,
                    CompletionFilter::Pending => !completed,
                }
            })
            .filter(|lesson| language.map_or(true, |lang| lesson.language == lang))
            .collect()
    }

    /// Distinct lesson languages in first-seen order.
    pub fn languages(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for lesson in &self.lessons {
            if !seen.contains(&lesson.language) {
                seen.push(lesson.language.clone());
            }
        }
        seen
    }
}

//=========================================================================================
// Snippets
//=========================================================================================

/// Filters of the snippet library page. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetFilter {
    pub query: String,
    pub language: Option<String>,
    pub difficulty: Option<Difficulty>,
}

impl SnippetFilter {
    pub fn apply<'a>(&self, snippets: &'a [CodeSnippet]) -> Vec<&'a CodeSnippet> {
        let needle = self.query.trim().to_lowercase();
        snippets
            .iter()
            .filter(|s| {
                needle.is_empty()
                    || s.title.to_lowercase().contains(&needle)
                    || s.explanation.to_lowercase().contains(&needle)
                    || s.code.to_lowercase().contains(&needle)
            })
            .filter(|s| {
                self.language
                    .as_deref()
                    .map_or(true, |lang| s.language.eq_ignore_ascii_case(lang))
            })
            .filter(|s| self.difficulty.map_or(true, |d| s.difficulty == d))
            .collect()
    }
}

//=========================================================================================
// Dashboard
//=========================================================================================

const DASHBOARD_LIST_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_lessons: usize,
    pub total_snippets: usize,
    pub total_groups: usize,
    pub total_students: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub stats: DashboardStats,
    /// The first five lessons in backend order.
    pub recent_lessons: Vec<LessonPlan>,
    pub groups: Vec<StudentGroup>,
    /// The five students with the most completed lessons.
    pub top_students: Vec<Student>,
}

impl Dashboard {
    pub async fn load(api: &dyn LessonPlannerApi) -> ClientResult<Self> {
        let (lessons, snippets, groups, mut students) = try_join!(
            api.list_lessons(),
            api.list_snippets(),
            api.list_groups(),
            api.list_students()
        )?;
        let stats = DashboardStats {
            total_lessons: lessons.len(),
            total_snippets: snippets.len(),
            total_groups: groups.len(),
            total_students: students.len(),
        };
        students.sort_by(|a, b| b.completed_lessons.cmp(&a.completed_lessons));
        students.truncate(DASHBOARD_LIST_LEN);
        Ok(Self {
            stats,
            recent_lessons: lessons.into_iter().take(DASHBOARD_LIST_LEN).collect(),
            groups,
            top_students: students,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingApi;
    use serde_json::json;

    fn lesson(id: i64, title: &str, language: &str, folder_id: Option<i64>) -> LessonPlan {
        serde_json::from_value(json!({
            "id": id,
            "title": title,
            "language": language,
            "category": "Basics",
            "folderId": folder_id,
            "points": 10
        }))
        .unwrap()
    }

    fn student(id: i64, group_id: Option<i64>, completed: i64, level: &str) -> Student {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("Student {}", id),
            "groupId": group_id,
            "skillLevel": level,
            "completedLessons": completed,
            "totalLessons": 4,
            "languageCount": 1
        }))
        .unwrap()
    }

    fn folder(id: i64, name: &str, order_index: i32) -> LessonFolder {
        serde_json::from_value(json!({"id": id, "name": name, "orderIndex": order_index})).unwrap()
    }

    #[test]
    fn search_matches_title_description_or_category() {
        let lessons = vec![lesson(1, "Python Loops", "python", None), lesson(2, "Web pages", "html", None)];
        assert_eq!(search_lessons(&lessons, "LOOP").len(), 1);
        assert_eq!(search_lessons(&lessons, "basics").len(), 2);
        assert_eq!(search_lessons(&lessons, "  ").len(), 2);
        assert!(search_lessons(&lessons, "rust").is_empty());
    }

    #[tokio::test]
    async fn library_survives_missing_folders() {
        let api = RecordingApi::default()
            .with_lessons(vec![lesson(1, "A", "python", Some(3))])
            .failing("list_folders");

        let library = LessonLibrary::load(&api).await.unwrap();

        assert!(library.folders.is_empty());
        let cards = library.folder_cards();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, UNCATEGORIZED_FOLDER_ID);
    }

    #[tokio::test]
    async fn library_fails_without_lessons() {
        let api = RecordingApi::default().failing("list_lessons");
        assert!(LessonLibrary::load(&api).await.is_err());
    }

    #[tokio::test]
    async fn folder_cards_are_ordered_and_counted() {
        let api = RecordingApi::default()
            .with_lessons(vec![
                lesson(1, "A", "python", Some(2)),
                lesson(2, "B", "python", Some(2)),
                lesson(3, "C", "python", None),
            ])
            .with_folders(vec![folder(1, "Later", 5), folder(2, "First", 0)]);

        let cards = LessonLibrary::load(&api).await.unwrap().folder_cards();

        let summary: Vec<_> = cards.iter().map(|f| (f.name.as_str(), f.lesson_count)).collect();
        assert_eq!(summary, [("First", 2), ("Later", 0), ("Uncategorized", 1)]);
    }

    #[tokio::test]
    async fn folder_page_loads_members_or_orphans() {
        let api = RecordingApi::default()
            .with_lessons(vec![lesson(1, "A", "python", Some(2)), lesson(2, "B", "python", None)])
            .with_folders(vec![folder(2, "Games", 0)]);

        let page = FolderPage::load(&api, FolderRef::from(2)).await.unwrap();
        assert_eq!(page.folder.name, "Games");
        assert_eq!(page.lessons.len(), 1);

        let orphans = FolderPage::load(&api, FolderRef::from(0)).await.unwrap();
        assert_eq!(orphans.folder.name, "Uncategorized");
        assert_eq!(orphans.lessons[0].id, 2);

        assert!(FolderPage::load(&api, FolderRef::Id(9)).await.is_err());
    }

    #[tokio::test]
    async fn roster_filters_and_summarises_a_group() {
        let api = RecordingApi::default().with_students(vec![
            student(1, Some(1), 2, "Beginner"),
            student(2, Some(1), 4, "Advanced"),
            student(3, None, 4, "Advanced"),
        ]);

        let roster = StudentRoster::load(&api).await.unwrap();

        assert_eq!(roster.members(1).len(), 2);
        assert_eq!(roster.filter_members(1, "student", Some(Difficulty::Advanced)).len(), 1);
        let analytics = roster.analytics(1);
        assert_eq!(analytics.student_count, 2);
        assert_eq!(analytics.total_completed, 6);
        assert_eq!(analytics.total_assigned, 8);
        assert_eq!(analytics.average_progress, 75);
        assert_eq!(analytics.beginners, 1);
    }

    #[tokio::test]
    async fn assignment_board_filters_by_completion_and_language() {
        let mut ada = student(1, None, 0, "Beginner");
        ada.progress = serde_json::from_value(json!([{"lessonId": 1, "status": "Completed"}])).unwrap();
        let api = RecordingApi::default()
            .with_students(vec![ada])
            .with_lessons(vec![
                lesson(1, "A", "python", None),
                lesson(2, "B", "javascript", None),
                lesson(3, "C", "python", None),
            ]);

        let board = AssignmentBoard::load(&api, 1).await.unwrap();

        let ids = |lessons: Vec<&LessonPlan>| lessons.iter().map(|l| l.id).collect::<Vec<_>>();
        assert_eq!(ids(board.visible_lessons(CompletionFilter::Completed, None)), [1]);
        assert_eq!(ids(board.visible_lessons(CompletionFilter::Pending, Some("python"))), [3]);
        assert_eq!(board.languages(), ["python", "javascript"]);
    }

    #[test]
    fn snippet_filter_combines_all_criteria() {
        let snippets: Vec<CodeSnippet> = serde_json::from_value(json!([
            {"id": 1, "title": "Hello", "language": "Python", "code": "print('hi')", "difficulty": "Beginner"},
            {"id": 2, "title": "Fetch", "language": "javascript", "code": "fetch(url)", "difficulty": "Advanced"}
        ]))
        .unwrap();

        let filter = SnippetFilter {
            query: "PRINT".into(),
            language: Some("python".into()),
            difficulty: None,
        };
        assert_eq!(filter.apply(&snippets).len(), 1);

        let filter = SnippetFilter {
            difficulty: Some(Difficulty::Beginner),
            language: Some("javascript".into()),
            ..SnippetFilter::default()
        };
        assert!(filter.apply(&snippets).is_empty());
    }

    #[tokio::test]
    async fn dashboard_ranks_students_and_trims_lists() {
        let lessons = (1..=7).map(|i| lesson(i, "L", "python", None)).collect();
        let students = (1..=6).map(|i| student(i, None, i, "Beginner")).collect();
        let api = RecordingApi::default().with_lessons(lessons).with_students(students);

        let dashboard = Dashboard::load(&api).await.unwrap();

        assert_eq!(dashboard.stats.total_lessons, 7);
        assert_eq!(dashboard.stats.total_students, 6);
        assert_eq!(dashboard.recent_lessons.len(), 5);
        assert_eq!(dashboard.top_students[0].id, 6);
        assert_eq!(dashboard.top_students.len(), 5);
    }
}
