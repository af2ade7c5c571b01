//! crates/lesson_planner_core/src/progress.rs
//!
//! Recording lesson completion, on both sides of the wire.
//!
//! The backend applies `complete_lesson` inside its repository; the client calls
//! `mark_complete` and then refetches the student so every counter comes from
//! the server. The remaining functions are read-only helpers over a fetched
//! student.

use crate::domain::{LessonPlan, ProficiencyLevel, ProgressStatus, Student, StudentProgress};
use crate::payloads::ProgressAward;
use crate::ports::{ClientResult, LessonPlannerApi, PortError, PortResult};
use chrono::{DateTime, Utc};
use tracing::{error, info};

//=========================================================================================
// Server Rule
//=========================================================================================

/// Builds the progress record for a completion of `lesson`.
///
/// `existing` is the student's current record for the lesson, if any. A record
/// that is already complete is rejected so points are never counted twice; a
/// not-started or in-progress record is upgraded and keeps its score, time and
/// notes.
pub fn complete_lesson(
    existing: Option<&StudentProgress>,
    lesson: &LessonPlan,
    now: DateTime<Utc>,
) -> PortResult<StudentProgress> {
    if let Some(record) = existing {
        if record.status.is_complete() {
            return Err(PortError::Conflict(format!(
                "Lesson {} is already completed",
                lesson.id
            )));
        }
    }
    let mut record = existing.cloned().unwrap_or_default();
    record.lesson_id = lesson.id;
    record.status = ProgressStatus::Completed;
    record.completed_at = Some(now);
    record.points_earned = lesson.points;
    record.lesson_title = Some(lesson.title.clone());
    record.lesson_language = Some(lesson.language.clone());
    record.lesson_difficulty = Some(lesson.difficulty.to_string());
    Ok(record)
}

/// The success body for a freshly recorded completion.
pub fn award_for(record: &StudentProgress) -> ProgressAward {
    ProgressAward {
        success: true,
        points_awarded: record.points_earned,
        message: format!("Lesson completed! {} points awarded.", record.points_earned),
    }
}

//=========================================================================================
// Client Flow
//=========================================================================================

/// Marks the lesson complete, then refetches the student.
pub async fn mark_complete(
    api: &dyn LessonPlannerApi,
    student_id: i64,
    lesson_id: i64,
) -> ClientResult<(ProgressAward, Student)> {
    let award = api.mark_complete(student_id, lesson_id).await.map_err(|e| {
        error!("Error marking lesson {} complete for student {}: {}", lesson_id, student_id, e);
        e
    })?;
    info!(
        "Student {} completed lesson {} (+{} points)",
        student_id, lesson_id, award.points_awarded
    );
    let student = api.get_student(student_id).await?;
    Ok((award, student))
}

/// Deletes the student's record for the lesson, then refetches the student.
pub async fn remove_progress(
    api: &dyn LessonPlannerApi,
    student_id: i64,
    lesson_id: i64,
) -> ClientResult<Student> {
    api.remove_progress(student_id, lesson_id).await?;
    api.get_student(student_id).await
}

//=========================================================================================
// Derived Views
//=========================================================================================

pub fn is_lesson_completed(student: &Student, lesson_id: i64) -> bool {
    student
        .progress
        .iter()
        .any(|p| p.lesson_id == lesson_id && p.status.is_complete())
}

pub fn points_earned_for(student: &Student, lesson_id: i64) -> i32 {
    student
        .progress
        .iter()
        .find(|p| p.lesson_id == lesson_id)
        .map(|p| p.points_earned)
        .unwrap_or(0)
}

/// Points from completed lessons taught in `language` (case-insensitive).
pub fn language_points(student: &Student, language: &str) -> i64 {
    student
        .progress
        .iter()
        .filter(|p| p.status == ProgressStatus::Completed)
        .filter(|p| {
            p.lesson_language
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(language))
        })
        .map(|p| i64::from(p.points_earned))
        .sum()
}

/// `round(completed / total * 100)`, or 0 for a student with no records.
pub fn completion_percentage(student: &Student) -> i64 {
    if student.total_lessons <= 0 {
        return 0;
    }
    (student.completed_lessons as f64 / student.total_lessons as f64 * 100.0).round() as i64
}

/// Average points per completed lesson, rounded.
pub fn average_points(student: &Student) -> i64 {
    if student.completed_lessons <= 0 {
        return 0;
    }
    (student.total_points_earned as f64 / student.completed_lessons as f64).round() as i64
}

/// Where a student stands inside their recorded proficiency band.
///
/// Bands: Beginner 0-50, Intermediate 51-150, Advanced 151-300. The stored level
/// decides the band; points only position the student inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProficiencyProgress {
    pub level: ProficiencyLevel,
    pub next_level: Option<ProficiencyLevel>,
    /// Clamped to 0..=100.
    pub percentage: f64,
    pub points_to_next: i64,
}

impl ProficiencyProgress {
    pub fn compute(level: ProficiencyLevel, points: i64) -> Self {
        let band = |start: i64, width: i64, next_at: i64, next: ProficiencyLevel| {
            let percentage = ((points - start) as f64 / width as f64 * 100.0).clamp(0.0, 100.0);
            Self {
                level,
                next_level: Some(next),
                percentage,
                points_to_next: (next_at - points).max(0),
            }
        };
        match level {
            ProficiencyLevel::Beginner => band(0, 50, 51, ProficiencyLevel::Intermediate),
            ProficiencyLevel::Intermediate => band(51, 100, 151, ProficiencyLevel::Advanced),
            ProficiencyLevel::Advanced => band(151, 150, 301, ProficiencyLevel::Expert),
            ProficiencyLevel::Expert => Self {
                level,
                next_level: None,
                percentage: 100.0,
                points_to_next: 0,
            },
        }
    }
}
