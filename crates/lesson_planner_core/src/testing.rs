//! In-process `LessonPlannerApi` used by the unit tests of this crate.
//!
//! It serves canned collections, records every call as a short string and
//! can be told to fail specific calls.

use crate::domain::{CodeSnippet, LessonFolder, LessonPlan, Student, StudentGroup, StudentProgress, ProgressStatus};
use crate::payloads::{
    AiGenerateRequest, ApiErrorBody, CreatedResponse, FolderInput, FolderPatch, GroupInput,
    GroupPatch, LessonPlanInput, LessonPlanPatch, ProgressAward, SnippetInput, SnippetPatch,
    StudentInput, StudentPatch, SuccessResponse,
};
use crate::ports::{ClientError, ClientResult, LessonPlannerApi};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    calls: Vec<String>,
    lessons: Vec<LessonPlan>,
    folders: Vec<LessonFolder>,
    students: Vec<Student>,
    groups: Vec<StudentGroup>,
    snippets: Vec<CodeSnippet>,
    lesson_patches: Vec<(i64, LessonPlanPatch)>,
    folder_inputs: Vec<FolderInput>,
    folder_patches: Vec<(i64, FolderPatch)>,
    failing: Vec<String>,
    created: i64,
    ai_body: Option<serde_json::Value>,
}

#[derive(Default)]
pub struct RecordingApi {
    state: Mutex<State>,
}

fn not_found(what: &str) -> ClientError {
    ClientError::Api {
        status: 404,
        body: ApiErrorBody::new(format!("{} not found", what)),
    }
}

fn ok() -> ClientResult<SuccessResponse> {
    Ok(SuccessResponse { success: true })
}

impl RecordingApi {
    pub fn with_lessons(self, lessons: Vec<LessonPlan>) -> Self {
        self.state.lock().unwrap().lessons = lessons;
        self
    }

    pub fn with_folders(self, folders: Vec<LessonFolder>) -> Self {
        self.state.lock().unwrap().folders = folders;
        self
    }

    pub fn with_students(self, students: Vec<Student>) -> Self {
        self.state.lock().unwrap().students = students;
        self
    }

    pub fn with_groups(self, groups: Vec<StudentGroup>) -> Self {
        self.state.lock().unwrap().groups = groups;
        self
    }

    pub fn with_snippets(self, snippets: Vec<CodeSnippet>) -> Self {
        self.state.lock().unwrap().snippets = snippets;
        self
    }

    pub fn with_ai_body(self, body: serde_json::Value) -> Self {
        self.state.lock().unwrap().ai_body = Some(body);
        self
    }

    /// Makes every call whose recorded form equals `call` fail with a 500.
    pub fn failing(self, call: &str) -> Self {
        self.state.lock().unwrap().failing.push(call.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn lesson_patches(&self) -> Vec<(i64, LessonPlanPatch)> {
        self.state.lock().unwrap().lesson_patches.clone()
    }

    pub fn last_lesson_patch(&self) -> Option<LessonPlanPatch> {
        self.lesson_patches().pop().map(|(_, patch)| patch)
    }

    pub fn folder_inputs(&self) -> Vec<FolderInput> {
        self.state.lock().unwrap().folder_inputs.clone()
    }

    pub fn folder_patches(&self) -> Vec<(i64, FolderPatch)> {
        self.state.lock().unwrap().folder_patches.clone()
    }

    fn record(&self, call: String) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        let fails = state.failing.contains(&call);
        state.calls.push(call.clone());
        if fails {
            return Err(ClientError::Api {
                status: 500,
                body: ApiErrorBody::new(format!("{} failed", call)),
            });
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        99 + state.created
    }
}

#[async_trait]
impl LessonPlannerApi for RecordingApi {
    async fn list_lessons(&self) -> ClientResult<Vec<LessonPlan>> {
        self.record("list_lessons".into())?;
        Ok(self.state.lock().unwrap().lessons.clone())
    }

    async fn get_lesson(&self, id: i64) -> ClientResult<LessonPlan> {
        self.record(format!("get_lesson {}", id))?;
        let state = self.state.lock().unwrap();
        state
            .lessons
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| not_found("Lesson"))
    }

    async fn search_lessons(&self, query: &str) -> ClientResult<Vec<LessonPlan>> {
        self.record(format!("search_lessons {}", query))?;
        let lessons = self.state.lock().unwrap().lessons.clone();
        Ok(crate::views::search_lessons(&lessons, query))
    }

    async fn create_lesson(&self, _input: &LessonPlanInput) -> ClientResult<CreatedResponse> {
        self.record("create_lesson".into())?;
        Ok(CreatedResponse { success: true, id: self.next_id() })
    }

    async fn update_lesson(&self, id: i64, patch: &LessonPlanPatch) -> ClientResult<SuccessResponse> {
        self.record(format!("update_lesson {}", id))?;
        self.state.lock().unwrap().lesson_patches.push((id, patch.clone()));
        ok()
    }

    async fn delete_lesson(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.record(format!("delete_lesson {}", id))?;
        ok()
    }

    async fn list_snippets(&self) -> ClientResult<Vec<CodeSnippet>> {
        self.record("list_snippets".into())?;
        Ok(self.state.lock().unwrap().snippets.clone())
    }

    async fn get_snippet(&self, id: i64) -> ClientResult<CodeSnippet> {
        self.record(format!("get_snippet {}", id))?;
        let state = self.state.lock().unwrap();
        state
            .snippets
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found("Snippet"))
    }

    async fn snippets_by_language(&self, language: &str) -> ClientResult<Vec<CodeSnippet>> {
        self.record(format!("snippets_by_language {}", language))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .snippets
            .iter()
            .filter(|s| s.language.eq_ignore_ascii_case(language))
            .cloned()
            .collect())
    }

    async fn create_snippet(&self, _input: &SnippetInput) -> ClientResult<CreatedResponse> {
        self.record("create_snippet".into())?;
        Ok(CreatedResponse { success: true, id: self.next_id() })
    }

    async fn update_snippet(&self, id: i64, _patch: &SnippetPatch) -> ClientResult<SuccessResponse> {
        self.record(format!("update_snippet {}", id))?;
        ok()
    }

    async fn delete_snippet(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.record(format!("delete_snippet {}", id))?;
        ok()
    }

    async fn list_students(&self) -> ClientResult<Vec<Student>> {
        self.record("list_students".into())?;
        Ok(self.state.lock().unwrap().students.clone())
    }

    async fn get_student(&self, id: i64) -> ClientResult<Student> {
        self.record(format!("get_student {}", id))?;
        let state = self.state.lock().unwrap();
        state
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found("Student"))
    }

    async fn create_student(&self, _input: &StudentInput) -> ClientResult<CreatedResponse> {
        self.record("create_student".into())?;
        Ok(CreatedResponse { success: true, id: self.next_id() })
    }

    async fn update_student(&self, id: i64, _patch: &StudentPatch) -> ClientResult<SuccessResponse> {
        self.record(format!("update_student {}", id))?;
        ok()
    }

    async fn delete_student(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.record(format!("delete_student {}", id))?;
        ok()
    }

    async fn list_groups(&self) -> ClientResult<Vec<StudentGroup>> {
        self.record("list_groups".into())?;
        Ok(self.state.lock().unwrap().groups.clone())
    }

    async fn get_group(&self, id: i64) -> ClientResult<StudentGroup> {
        self.record(format!("get_group {}", id))?;
        let state = self.state.lock().unwrap();
        state
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| not_found("Group"))
    }

    async fn create_group(&self, _input: &GroupInput) -> ClientResult<CreatedResponse> {
        self.record("create_group".into())?;
        Ok(CreatedResponse { success: true, id: self.next_id() })
    }

    async fn update_group(&self, id: i64, _patch: &GroupPatch) -> ClientResult<SuccessResponse> {
        self.record(format!("update_group {}", id))?;
        ok()
    }

    async fn delete_group(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.record(format!("delete_group {}", id))?;
        ok()
    }

    async fn list_folders(&self) -> ClientResult<Vec<LessonFolder>> {
        self.record("list_folders".into())?;
        Ok(self.state.lock().unwrap().folders.clone())
    }

    async fn get_folder(&self, id: i64) -> ClientResult<LessonFolder> {
        self.record(format!("get_folder {}", id))?;
        let state = self.state.lock().unwrap();
        state
            .folders
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| not_found("Folder"))
    }

    async fn create_folder(&self, input: &FolderInput) -> ClientResult<CreatedResponse> {
        self.record("create_folder".into())?;
        self.state.lock().unwrap().folder_inputs.push(input.clone());
        Ok(CreatedResponse { success: true, id: self.next_id() })
    }

    async fn update_folder(&self, id: i64, patch: &FolderPatch) -> ClientResult<SuccessResponse> {
        self.record(format!("update_folder {}", id))?;
        self.state.lock().unwrap().folder_patches.push((id, patch.clone()));
        ok()
    }

    async fn delete_folder(&self, id: i64) -> ClientResult<SuccessResponse> {
        self.record(format!("delete_folder {}", id))?;
        ok()
    }

    /// Appends a completed record to the canned student so a refetch sees it.
    async fn mark_complete(&self, student_id: i64, lesson_id: i64) -> ClientResult<ProgressAward> {
        self.record(format!("mark_complete {} {}", student_id, lesson_id))?;
        let mut state = self.state.lock().unwrap();
        let points = state
            .lessons
            .iter()
            .find(|l| l.id == lesson_id)
            .map(|l| l.points)
            .unwrap_or(0);
        if let Some(student) = state.students.iter_mut().find(|s| s.id == student_id) {
            student.progress.push(StudentProgress {
                lesson_id,
                status: ProgressStatus::Completed,
                points_earned: points,
                ..StudentProgress::default()
            });
            student.refresh_totals();
        }
        Ok(ProgressAward {
            success: true,
            points_awarded: points,
            message: format!("Lesson completed! {} points awarded.", points),
        })
    }

    async fn remove_progress(&self, student_id: i64, lesson_id: i64) -> ClientResult<SuccessResponse> {
        self.record(format!("remove_progress {} {}", student_id, lesson_id))?;
        let mut state = self.state.lock().unwrap();
        if let Some(student) = state.students.iter_mut().find(|s| s.id == student_id) {
            student.progress.retain(|p| p.lesson_id != lesson_id);
            student.refresh_totals();
        }
        ok()
    }

    async fn generate_lesson(&self, request: &AiGenerateRequest) -> ClientResult<serde_json::Value> {
        self.record(format!("generate_lesson {}", request.topic))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .ai_body
            .clone()
            .unwrap_or(serde_json::Value::Null))
    }
}
