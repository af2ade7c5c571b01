//! crates/lesson_planner_core/src/membership.rs
//!
//! Folder membership is never stored on the folder. A lesson belongs to a
//! folder when its `folder_id` points at it, so editing a folder's lesson
//! selection means patching the lessons that entered or left it.

use crate::domain::{is_palette_color, LessonFolder, LessonPlan, Student, DEFAULT_FOLDER_COLOR};
use crate::payloads::{FolderInput, FolderPatch, LessonPlanPatch};
use crate::ports::{ClientError, ClientResult, LessonPlannerApi};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// Id of the synthetic folder holding every lesson with no `folder_id`.
pub const UNCATEGORIZED_FOLDER_ID: i64 = 0;

pub const UNCATEGORIZED_COLOR: &str = "#757575";

/// The client-side pseudo-folder for orphaned lessons. It is never persisted.
pub fn uncategorized_folder(lesson_count: i64) -> LessonFolder {
    LessonFolder {
        id: UNCATEGORIZED_FOLDER_ID,
        name: "Uncategorized".to_string(),
        description: "Lessons not in any folder".to_string(),
        color: UNCATEGORIZED_COLOR.to_string(),
        order_index: 0,
        lesson_count,
        created_at: None,
        updated_at: None,
    }
}

/// Lessons whose back-reference points at `folder_id`. The uncategorized id
/// selects lessons with no folder.
pub fn lessons_in_folder(lessons: &[LessonPlan], folder_id: i64) -> Vec<LessonPlan> {
    let target = (folder_id != UNCATEGORIZED_FOLDER_ID).then_some(folder_id);
    lessons
        .iter()
        .filter(|l| l.folder_id == target)
        .cloned()
        .collect()
}

/// Students whose back-reference points at `group_id`.
pub fn group_members(students: &[Student], group_id: i64) -> Vec<Student> {
    students
        .iter()
        .filter(|s| s.group_id == Some(group_id))
        .cloned()
        .collect()
}

/// Lesson ids whose folder has to change. Both sides are sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub to_add: Vec<i64>,
    pub to_remove: Vec<i64>,
}

impl MembershipChange {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

pub fn diff_membership(current: &[i64], selected: &[i64]) -> MembershipChange {
    let current: BTreeSet<i64> = current.iter().copied().collect();
    let selected: BTreeSet<i64> = selected.iter().copied().collect();
    MembershipChange {
        to_add: selected.difference(&current).copied().collect(),
        to_remove: current.difference(&selected).copied().collect(),
    }
}

/// Moves one lesson into a folder, or out of any folder with `None`.
pub async fn move_lesson(
    api: &dyn LessonPlannerApi,
    lesson_id: i64,
    folder_id: Option<i64>,
) -> ClientResult<()> {
    api.update_lesson(lesson_id, &LessonPlanPatch::move_to_folder(folder_id))
        .await?;
    Ok(())
}

/// Makes the lessons in `selected` exactly the members of `folder_id`.
///
/// `lessons` is the caller's current lesson list; current members are read
/// from it. Additions are sent before removals, one request at a time. The
/// first failure stops the run and is returned; updates already sent stay
/// applied.
pub async fn reconcile_folder_membership(
    api: &dyn LessonPlannerApi,
    folder_id: i64,
    lessons: &[LessonPlan],
    selected: &[i64],
) -> ClientResult<MembershipChange> {
    let current: Vec<i64> = lessons
        .iter()
        .filter(|l| l.folder_id == Some(folder_id))
        .map(|l| l.id)
        .collect();
    let change = diff_membership(&current, selected);
    debug!(
        "Folder {}: {} lessons to add, {} to remove",
        folder_id,
        change.to_add.len(),
        change.to_remove.len()
    );

    for &lesson_id in &change.to_add {
        move_lesson(api, lesson_id, Some(folder_id)).await.map_err(|e| {
            error!("Failed to add lesson {} to folder {}: {}", lesson_id, folder_id, e);
            e
        })?;
    }
    for &lesson_id in &change.to_remove {
        move_lesson(api, lesson_id, None).await.map_err(|e| {
            error!("Failed to remove lesson {} from folder {}: {}", lesson_id, folder_id, e);
            e
        })?;
    }
    Ok(change)
}

//=========================================================================================
// Folder Form
//=========================================================================================

/// State of the create/edit folder dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderForm {
    editing: Option<LessonFolder>,
    pub name: String,
    pub description: String,
    pub color: String,
    pub selected_lessons: Vec<i64>,
}

impl Default for FolderForm {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderForm {
    pub fn new() -> Self {
        Self {
            editing: None,
            name: String::new(),
            description: String::new(),
            color: DEFAULT_FOLDER_COLOR.to_string(),
            selected_lessons: Vec::new(),
        }
    }

    /// Opens an existing folder with its current members preselected.
    pub fn edit(folder: &LessonFolder, lessons: &[LessonPlan]) -> Self {
        Self {
            editing: Some(folder.clone()),
            name: folder.name.clone(),
            description: folder.description.clone(),
            color: folder.color.clone(),
            selected_lessons: lessons
                .iter()
                .filter(|l| l.folder_id == Some(folder.id))
                .map(|l| l.id)
                .collect(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Flips one lesson in or out of the selection.
    pub fn toggle_lesson(&mut self, lesson_id: i64) {
        if let Some(pos) = self.selected_lessons.iter().position(|&id| id == lesson_id) {
            self.selected_lessons.remove(pos);
        } else {
            self.selected_lessons.push(lesson_id);
        }
    }

    pub fn to_input(&self) -> Result<FolderInput, ClientError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("Please enter a folder name".to_string()));
        }
        if !is_palette_color(&self.color) {
            return Err(ClientError::Validation(format!(
                "{} is not one of the folder colors",
                self.color
            )));
        }
        Ok(FolderInput {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            color: self.color.clone(),
            order_index: self.editing.as_ref().map(|f| f.order_index).unwrap_or(0),
        })
    }

    /// Persists the dialog and returns the folder id.
    ///
    /// Editing updates the metadata and then reconciles membership against
    /// `lessons`. Creating takes the new id and assigns every selected lesson.
    pub async fn save(&self, api: &dyn LessonPlannerApi, lessons: &[LessonPlan]) -> ClientResult<i64> {
        let input = self.to_input()?;
        match &self.editing {
            Some(folder) => {
                api.update_folder(folder.id, &FolderPatch::from(input)).await?;
                reconcile_folder_membership(api, folder.id, lessons, &self.selected_lessons).await?;
                info!("Updated folder {}", folder.id);
                Ok(folder.id)
            }
            None => {
                let created = api.create_folder(&input).await?;
                for &lesson_id in &self.selected_lessons {
                    move_lesson(api, lesson_id, Some(created.id)).await?;
                }
                info!(
                    "Created folder {} with {} lessons",
                    created.id,
                    self.selected_lessons.len()
                );
                Ok(created.id)
            }
        }
    }
}
