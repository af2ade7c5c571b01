//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `LessonPlannerRepository` port.
//!
//! Used by the integration tests and whenever the service starts without a
//! `DATABASE_URL`. It follows the same listing order and derived-field rules as
//! the Postgres adapter.

use async_trait::async_trait;
use chrono::Utc;
use lesson_planner_core::domain::{
    CodeSnippet, LessonFolder, LessonPlan, Student, StudentGroup, StudentProgress,
};
use lesson_planner_core::payloads::{
    FolderInput, FolderPatch, GroupInput, GroupPatch, LessonPlanInput, LessonPlanPatch,
    SnippetInput, SnippetPatch, StudentInput, StudentPatch,
};
use lesson_planner_core::ports::{LessonPlannerRepository, PortError, PortResult};
use lesson_planner_core::progress::complete_lesson;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    next_id: i64,
    lessons: BTreeMap<i64, LessonPlan>,
    folders: BTreeMap<i64, LessonFolder>,
    snippets: BTreeMap<i64, CodeSnippet>,
    groups: BTreeMap<i64, StudentGroup>,
    students: BTreeMap<i64, Student>,
}

impl Store {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_folder(&self, folder_id: Option<i64>) -> PortResult<()> {
        match folder_id {
            Some(id) if !self.folders.contains_key(&id) => {
                Err(PortError::InvalidInput(format!("Folder {} does not exist", id)))
            }
            _ => Ok(()),
        }
    }

    fn check_group(&self, group_id: Option<i64>) -> PortResult<()> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => {
                Err(PortError::InvalidInput(format!("Group {} does not exist", id)))
            }
            _ => Ok(()),
        }
    }

    fn folder_view(&self, folder: &LessonFolder) -> LessonFolder {
        LessonFolder {
            lesson_count: self
                .lessons
                .values()
                .filter(|l| l.folder_id == Some(folder.id))
                .count() as i64,
            ..folder.clone()
        }
    }

    fn group_view(&self, group: &StudentGroup) -> StudentGroup {
        StudentGroup {
            student_ids: self
                .students
                .values()
                .filter(|s| s.group_id == Some(group.id))
                .map(|s| s.id)
                .collect(),
            ..group.clone()
        }
    }

    /// Fills the joined and derived fields a stored student does not carry.
    fn student_view(&self, student: &Student) -> Student {
        let mut view = student.clone();
        view.group_name = student
            .group_id
            .and_then(|id| self.groups.get(&id))
            .map(|g| g.name.clone());
        for record in &mut view.progress {
            if let Some(lesson) = self.lessons.get(&record.lesson_id) {
                record.lesson_title = Some(lesson.title.clone());
                record.lesson_language = Some(lesson.language.clone());
                record.lesson_difficulty = Some(lesson.difficulty.to_string());
            }
        }
        view.refresh_totals();
        view
    }
}

fn not_found(kind: &str, id: i64) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind, id))
}

/// A `LessonPlannerRepository` that keeps everything in memory.
#[derive(Default)]
pub struct MemoryAdapter {
    store: RwLock<Store>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LessonPlannerRepository for MemoryAdapter {
    // --- Lesson Plans ---
    async fn list_lessons(&self) -> PortResult<Vec<LessonPlan>> {
        let store = self.store.read().await;
        Ok(store.lessons.values().rev().cloned().collect())
    }

    async fn get_lesson(&self, id: i64) -> PortResult<LessonPlan> {
        let store = self.store.read().await;
        store.lessons.get(&id).cloned().ok_or_else(|| not_found("Lesson", id))
    }

    async fn create_lesson(&self, input: LessonPlanInput) -> PortResult<LessonPlan> {
        let mut store = self.store.write().await;
        store.check_folder(input.folder_id)?;
        let id = store.allocate_id();
        let lesson = input.into_lesson(id, Utc::now());
        store.lessons.insert(id, lesson.clone());
        Ok(lesson)
    }

    async fn update_lesson(&self, id: i64, patch: LessonPlanPatch) -> PortResult<LessonPlan> {
        let mut store = self.store.write().await;
        if let Some(folder_id) = patch.folder_id {
            store.check_folder(folder_id)?;
        }
        let lesson = store.lessons.get_mut(&id).ok_or_else(|| not_found("Lesson", id))?;
        patch.apply_to(lesson, Utc::now());
        Ok(lesson.clone())
    }

    async fn delete_lesson(&self, id: i64) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.lessons.remove(&id).ok_or_else(|| not_found("Lesson", id))?;
        for student in store.students.values_mut() {
            student.progress.retain(|p| p.lesson_id != id);
        }
        Ok(())
    }

    // --- Folders ---
    async fn list_folders(&self) -> PortResult<Vec<LessonFolder>> {
        let store = self.store.read().await;
        let mut folders: Vec<LessonFolder> =
            store.folders.values().map(|f| store.folder_view(f)).collect();
        folders.sort_by(|a, b| a.order_index.cmp(&b.order_index).then_with(|| a.name.cmp(&b.name)));
        Ok(folders)
    }

    async fn get_folder(&self, id: i64) -> PortResult<LessonFolder> {
        let store = self.store.read().await;
        store
            .folders
            .get(&id)
            .map(|f| store.folder_view(f))
            .ok_or_else(|| not_found("Folder", id))
    }

    async fn create_folder(&self, input: FolderInput) -> PortResult<LessonFolder> {
        let mut store = self.store.write().await;
        let id = store.allocate_id();
        let folder = input.into_folder(id, Utc::now());
        store.folders.insert(id, folder.clone());
        Ok(folder)
    }

    async fn update_folder(&self, id: i64, patch: FolderPatch) -> PortResult<LessonFolder> {
        let mut store = self.store.write().await;
        let folder = store.folders.get_mut(&id).ok_or_else(|| not_found("Folder", id))?;
        patch.apply_to(folder, Utc::now());
        let folder = folder.clone();
        Ok(store.folder_view(&folder))
    }

    async fn delete_folder(&self, id: i64) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.folders.remove(&id).ok_or_else(|| not_found("Folder", id))?;
        for lesson in store.lessons.values_mut().filter(|l| l.folder_id == Some(id)) {
            lesson.folder_id = None;
        }
        Ok(())
    }

    // --- Code Snippets ---
    async fn list_snippets(&self) -> PortResult<Vec<CodeSnippet>> {
        let store = self.store.read().await;
        Ok(store.snippets.values().rev().cloned().collect())
    }

    async fn get_snippet(&self, id: i64) -> PortResult<CodeSnippet> {
        let store = self.store.read().await;
        store.snippets.get(&id).cloned().ok_or_else(|| not_found("Snippet", id))
    }

    async fn create_snippet(&self, input: SnippetInput) -> PortResult<CodeSnippet> {
        let mut store = self.store.write().await;
        let id = store.allocate_id();
        let snippet = input.into_snippet(id);
        store.snippets.insert(id, snippet.clone());
        Ok(snippet)
    }

    async fn update_snippet(&self, id: i64, patch: SnippetPatch) -> PortResult<CodeSnippet> {
        let mut store = self.store.write().await;
        let snippet = store.snippets.get_mut(&id).ok_or_else(|| not_found("Snippet", id))?;
        patch.apply_to(snippet);
        Ok(snippet.clone())
    }

    async fn delete_snippet(&self, id: i64) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.snippets.remove(&id).map(|_| ()).ok_or_else(|| not_found("Snippet", id))
    }

    // --- Student Groups ---
    async fn list_groups(&self) -> PortResult<Vec<StudentGroup>> {
        let store = self.store.read().await;
        let mut groups: Vec<StudentGroup> =
            store.groups.values().map(|g| store.group_view(g)).collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn get_group(&self, id: i64) -> PortResult<StudentGroup> {
        let store = self.store.read().await;
        store
            .groups
            .get(&id)
            .map(|g| store.group_view(g))
            .ok_or_else(|| not_found("Group", id))
    }

    async fn create_group(&self, input: GroupInput) -> PortResult<StudentGroup> {
        let mut store = self.store.write().await;
        let id = store.allocate_id();
        let group = input.into_group(id);
        store.groups.insert(id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, id: i64, patch: GroupPatch) -> PortResult<StudentGroup> {
        let mut store = self.store.write().await;
        let group = store.groups.get_mut(&id).ok_or_else(|| not_found("Group", id))?;
        patch.apply_to(group);
        let group = group.clone();
        Ok(store.group_view(&group))
    }

    async fn delete_group(&self, id: i64) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.groups.remove(&id).ok_or_else(|| not_found("Group", id))?;
        for student in store.students.values_mut().filter(|s| s.group_id == Some(id)) {
            student.group_id = None;
        }
        Ok(())
    }

    // --- Students ---
    async fn list_students(&self) -> PortResult<Vec<Student>> {
        let store = self.store.read().await;
        let mut students: Vec<Student> =
            store.students.values().map(|s| store.student_view(s)).collect();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn get_student(&self, id: i64) -> PortResult<Student> {
        let store = self.store.read().await;
        store
            .students
            .get(&id)
            .map(|s| store.student_view(s))
            .ok_or_else(|| not_found("Student", id))
    }

    async fn create_student(&self, input: StudentInput) -> PortResult<Student> {
        let mut store = self.store.write().await;
        store.check_group(input.group_id)?;
        let id = store.allocate_id();
        let student = input.into_student(id, Utc::now());
        store.students.insert(id, student.clone());
        Ok(store.student_view(&student))
    }

    async fn update_student(&self, id: i64, patch: StudentPatch) -> PortResult<Student> {
        let mut store = self.store.write().await;
        if let Some(group_id) = patch.group_id {
            store.check_group(group_id)?;
        }
        let student = store.students.get_mut(&id).ok_or_else(|| not_found("Student", id))?;
        patch.apply_to(student, Utc::now());
        let student = student.clone();
        Ok(store.student_view(&student))
    }

    async fn delete_student(&self, id: i64) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.students.remove(&id).map(|_| ()).ok_or_else(|| not_found("Student", id))
    }

    // --- Progress ---
    async fn record_completion(&self, student_id: i64, lesson_id: i64) -> PortResult<StudentProgress> {
        let mut store = self.store.write().await;
        let lesson = store
            .lessons
            .get(&lesson_id)
            .cloned()
            .ok_or_else(|| not_found("Lesson", lesson_id))?;
        let student = store
            .students
            .get_mut(&student_id)
            .ok_or_else(|| not_found("Student", student_id))?;

        let position = student.progress.iter().position(|p| p.lesson_id == lesson_id);
        let record = complete_lesson(position.map(|i| &student.progress[i]), &lesson, Utc::now())?;
        match position {
            Some(i) => student.progress[i] = record.clone(),
            None => student.progress.push(record.clone()),
        }
        student.updated_at = Some(Utc::now());
        Ok(record)
    }

    async fn remove_progress(&self, student_id: i64, lesson_id: i64) -> PortResult<()> {
        let mut store = self.store.write().await;
        let student = store
            .students
            .get_mut(&student_id)
            .ok_or_else(|| not_found("Student", student_id))?;
        let before = student.progress.len();
        student.progress.retain(|p| p.lesson_id != lesson_id);
        if student.progress.len() == before {
            return Err(PortError::NotFound(format!(
                "No progress for student {} on lesson {}",
                student_id, lesson_id
            )));
        }
        Ok(())
    }
}
