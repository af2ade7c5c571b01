//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `LessonPlannerRepository` port from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.
//!
//! Aggregates are written inside one transaction: the parent row is updated and
//! its child rows are deleted and re-inserted, so readers never observe a
//! half-replaced lesson or student.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_planner_core::domain::{
    CodeSnippet, LessonChallenge, LessonFolder, LessonPlan, LessonProject, LessonStep, Student,
    StudentGroup, StudentLanguage, StudentProgress,
};
use lesson_planner_core::payloads::{
    FolderInput, FolderPatch, GroupInput, GroupPatch, LessonPlanInput, LessonPlanPatch,
    SnippetInput, SnippetPatch, StudentInput, StudentPatch,
};
use lesson_planner_core::ports::{LessonPlannerRepository, PortError, PortResult};
use lesson_planner_core::progress::complete_lesson;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `LessonPlannerRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps driver errors onto the port taxonomy. A foreign key violation means
/// the request referenced a folder, group, student or lesson that is gone.
fn db_err(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound("Row not found".to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
            PortError::InvalidInput(db.message().to_string())
        }
        _ => {
            error!("Database error: {}", e);
            PortError::Unexpected(e.to_string())
        }
    }
}

fn parse_label<T>(value: &str) -> PortResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| PortError::Unexpected(format!("Corrupt stored value: {}", e)))
}

fn not_found(kind: &str, id: i64) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind, id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const LESSON_COLUMNS: &str = "id, title, description, language, category, target_age, duration, \
    difficulty, points, folder_id, prerequisites, learning_outcomes, topics, objectives, \
    materials, notes, created_at, updated_at";

#[derive(FromRow)]
struct LessonRecord {
    id: i64,
    title: String,
    description: String,
    language: String,
    category: String,
    target_age: String,
    duration: i32,
    difficulty: String,
    points: i32,
    folder_id: Option<i64>,
    prerequisites: String,
    learning_outcomes: String,
    topics: Vec<String>,
    objectives: Vec<String>,
    materials: Vec<String>,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl LessonRecord {
    fn to_domain(self, children: &mut LessonChildren) -> PortResult<LessonPlan> {
        let steps = children
            .steps
            .remove(&self.id)
            .unwrap_or_default()
            .into_iter()
            .map(StepRecord::to_domain)
            .collect();
        let challenges = children
            .challenges
            .remove(&self.id)
            .unwrap_or_default()
            .into_iter()
            .map(ChallengeRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        let project = children.projects.remove(&self.id).map(ProjectRecord::to_domain);

        let mut lesson = LessonPlan {
            id: self.id,
            title: self.title,
            description: self.description,
            language: self.language,
            category: self.category,
            target_age: self.target_age,
            duration: self.duration,
            difficulty: parse_label(&self.difficulty)?,
            points: self.points,
            folder_id: self.folder_id,
            prerequisites: self.prerequisites,
            learning_outcomes: self.learning_outcomes,
            topics: self.topics,
            objectives: self.objectives,
            materials: self.materials,
            steps,
            challenges,
            project,
            notes: self.notes,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        };
        lesson.sort_children();
        Ok(lesson)
    }
}

#[derive(FromRow)]
struct StepRecord {
    lesson_id: i64,
    step_number: i32,
    title: String,
    instruction: String,
    code_example: Option<String>,
    expected_output: Option<String>,
    explanation: String,
    hints: Option<String>,
}
impl StepRecord {
    fn to_domain(self) -> LessonStep {
        LessonStep {
            step_number: self.step_number,
            title: self.title,
            instruction: self.instruction,
            code_example: self.code_example,
            expected_output: self.expected_output,
            explanation: self.explanation,
            hints: self.hints,
        }
    }
}

#[derive(FromRow)]
struct ChallengeRecord {
    lesson_id: i64,
    challenge_order: i32,
    title: String,
    description: String,
    starter_code: Option<String>,
    solution: String,
    difficulty: String,
    points: i32,
}
impl ChallengeRecord {
    fn to_domain(self) -> PortResult<LessonChallenge> {
        Ok(LessonChallenge {
            order: self.challenge_order,
            title: self.title,
            description: self.description,
            starter_code: self.starter_code,
            solution: self.solution,
            difficulty: parse_label(&self.difficulty)?,
            points: self.points,
        })
    }
}

#[derive(FromRow)]
struct ProjectRecord {
    lesson_id: i64,
    title: String,
    description: String,
    requirements: String,
    starter_code: Option<String>,
    solution_code: String,
    extension_ideas: Option<String>,
}
impl ProjectRecord {
    fn to_domain(self) -> LessonProject {
        LessonProject {
            title: self.title,
            description: self.description,
            requirements: self.requirements,
            starter_code: self.starter_code,
            solution_code: self.solution_code,
            extension_ideas: self.extension_ideas,
        }
    }
}

/// Child rows of a batch of lessons, keyed by lesson id.
#[derive(Default)]
struct LessonChildren {
    steps: HashMap<i64, Vec<StepRecord>>,
    challenges: HashMap<i64, Vec<ChallengeRecord>>,
    projects: HashMap<i64, ProjectRecord>,
}

const FOLDER_SELECT: &str = "SELECT f.id, f.name, f.description, f.color, f.order_index, \
    (SELECT COUNT(*) FROM lessons l WHERE l.folder_id = f.id) AS lesson_count, \
    f.created_at, f.updated_at FROM lesson_folders f";

#[derive(FromRow)]
struct FolderRecord {
    id: i64,
    name: String,
    description: String,
    color: String,
    order_index: i32,
    lesson_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl FolderRecord {
    fn to_domain(self) -> LessonFolder {
        LessonFolder {
            id: self.id,
            name: self.name,
            description: self.description,
            color: self.color,
            order_index: self.order_index,
            lesson_count: self.lesson_count,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

#[derive(FromRow)]
struct SnippetRecord {
    id: i64,
    title: String,
    language: String,
    code: String,
    explanation: String,
    difficulty: String,
}
impl SnippetRecord {
    fn to_domain(self) -> PortResult<CodeSnippet> {
        Ok(CodeSnippet {
            id: self.id,
            title: self.title,
            language: self.language,
            code: self.code,
            explanation: self.explanation,
            difficulty: parse_label(&self.difficulty)?,
        })
    }
}

const GROUP_SELECT: &str = "SELECT g.id, g.name, g.description, g.average_age, g.skill_level, \
    ARRAY(SELECT s.id FROM students s WHERE s.group_id = g.id ORDER BY s.id) AS student_ids \
    FROM student_groups g";

#[derive(FromRow)]
struct GroupRecord {
    id: i64,
    name: String,
    description: String,
    average_age: i32,
    skill_level: String,
    student_ids: Vec<i64>,
}
impl GroupRecord {
    fn to_domain(self) -> PortResult<StudentGroup> {
        Ok(StudentGroup {
            id: self.id,
            name: self.name,
            description: self.description,
            average_age: self.average_age,
            skill_level: parse_label(&self.skill_level)?,
            student_ids: self.student_ids,
        })
    }
}

const STUDENT_SELECT: &str = "SELECT s.id, s.name, s.age, s.skill_level, s.group_id, \
    g.name AS group_name, s.email, s.parent_email, s.notes, s.is_active, s.created_at, \
    s.updated_at FROM students s LEFT JOIN student_groups g ON g.id = s.group_id";

#[derive(FromRow)]
struct StudentRecord {
    id: i64,
    name: String,
    age: i32,
    skill_level: String,
    group_id: Option<i64>,
    group_name: Option<String>,
    email: Option<String>,
    parent_email: Option<String>,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl StudentRecord {
    fn to_domain(self, children: &mut StudentChildren) -> PortResult<Student> {
        let languages = children
            .languages
            .remove(&self.id)
            .unwrap_or_default()
            .into_iter()
            .map(LanguageRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        let progress = children
            .progress
            .remove(&self.id)
            .unwrap_or_default()
            .into_iter()
            .map(ProgressRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;

        let mut student = Student {
            id: self.id,
            name: self.name,
            age: self.age,
            skill_level: parse_label(&self.skill_level)?,
            group_id: self.group_id,
            group_name: self.group_name,
            email: self.email,
            parent_email: self.parent_email,
            notes: self.notes,
            is_active: self.is_active,
            languages,
            progress,
            language_count: 0,
            total_lessons: 0,
            completed_lessons: 0,
            total_points_earned: 0,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        };
        student.refresh_totals();
        Ok(student)
    }
}

#[derive(FromRow)]
struct LanguageRecord {
    student_id: i64,
    language: String,
    proficiency_level: String,
    started_at: Option<DateTime<Utc>>,
    last_practiced_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}
impl LanguageRecord {
    fn to_domain(self) -> PortResult<StudentLanguage> {
        Ok(StudentLanguage {
            language: self.language,
            proficiency_level: parse_label(&self.proficiency_level)?,
            started_at: self.started_at,
            last_practiced_at: self.last_practiced_at,
            notes: self.notes,
        })
    }
}

const PROGRESS_SELECT: &str = "SELECT p.student_id, p.lesson_id, l.title AS lesson_title, \
    l.language AS lesson_language, l.difficulty AS lesson_difficulty, p.status, p.completed_at, \
    p.score, p.points_earned, p.time_spent_minutes, p.notes \
    FROM student_progress p JOIN lessons l ON l.id = p.lesson_id";

#[derive(FromRow)]
struct ProgressRecord {
    student_id: i64,
    lesson_id: i64,
    lesson_title: Option<String>,
    lesson_language: Option<String>,
    lesson_difficulty: Option<String>,
    status: String,
    completed_at: Option<DateTime<Utc>>,
    score: Option<i32>,
    points_earned: i32,
    time_spent_minutes: i32,
    notes: Option<String>,
}
impl ProgressRecord {
    fn to_domain(self) -> PortResult<StudentProgress> {
        Ok(StudentProgress {
            lesson_id: self.lesson_id,
            lesson_title: self.lesson_title,
            lesson_language: self.lesson_language,
            lesson_difficulty: self.lesson_difficulty,
            status: parse_label(&self.status)?,
            completed_at: self.completed_at,
            score: self.score,
            points_earned: self.points_earned,
            time_spent_minutes: self.time_spent_minutes,
            notes: self.notes,
        })
    }
}

#[derive(Default)]
struct StudentChildren {
    languages: HashMap<i64, Vec<LanguageRecord>>,
    progress: HashMap<i64, Vec<ProgressRecord>>,
}

//=========================================================================================
// Aggregate Loading and Writing
//=========================================================================================

async fn load_lesson_children(conn: &mut PgConnection, ids: &[i64]) -> PortResult<LessonChildren> {
    let mut children = LessonChildren::default();
    if ids.is_empty() {
        return Ok(children);
    }

    let steps = sqlx::query_as::<_, StepRecord>(
        "SELECT lesson_id, step_number, title, instruction, code_example, expected_output, \
         explanation, hints FROM lesson_steps WHERE lesson_id = ANY($1) ORDER BY step_number, id",
    )
    .bind(ids.to_vec())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    for step in steps {
        children.steps.entry(step.lesson_id).or_default().push(step);
    }

    let challenges = sqlx::query_as::<_, ChallengeRecord>(
        "SELECT lesson_id, challenge_order, title, description, starter_code, solution, \
         difficulty, points FROM lesson_challenges WHERE lesson_id = ANY($1) \
         ORDER BY challenge_order, id",
    )
    .bind(ids.to_vec())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    for challenge in challenges {
        children.challenges.entry(challenge.lesson_id).or_default().push(challenge);
    }

    let projects = sqlx::query_as::<_, ProjectRecord>(
        "SELECT lesson_id, title, description, requirements, starter_code, solution_code, \
         extension_ideas FROM lesson_projects WHERE lesson_id = ANY($1)",
    )
    .bind(ids.to_vec())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    for project in projects {
        children.projects.insert(project.lesson_id, project);
    }

    Ok(children)
}

async fn fetch_lesson(conn: &mut PgConnection, id: i64) -> PortResult<LessonPlan> {
    let record = sqlx::query_as::<_, LessonRecord>(&format!(
        "SELECT {} FROM lessons WHERE id = $1",
        LESSON_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err)?
    .ok_or_else(|| not_found("Lesson", id))?;
    let mut children = load_lesson_children(conn, &[id]).await?;
    record.to_domain(&mut children)
}

/// Writes every scalar column of `lesson` and replaces its child rows.
async fn write_lesson(conn: &mut PgConnection, lesson: &LessonPlan) -> PortResult<()> {
    sqlx::query(
        "UPDATE lessons SET title = $2, description = $3, language = $4, category = $5, \
         target_age = $6, duration = $7, difficulty = $8, points = $9, folder_id = $10, \
         prerequisites = $11, learning_outcomes = $12, topics = $13, objectives = $14, \
         materials = $15, notes = $16, updated_at = $17 WHERE id = $1",
    )
    .bind(lesson.id)
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(&lesson.language)
    .bind(&lesson.category)
    .bind(&lesson.target_age)
    .bind(lesson.duration)
    .bind(lesson.difficulty.as_str())
    .bind(lesson.points)
    .bind(lesson.folder_id)
    .bind(&lesson.prerequisites)
    .bind(&lesson.learning_outcomes)
    .bind(&lesson.topics)
    .bind(&lesson.objectives)
    .bind(&lesson.materials)
    .bind(&lesson.notes)
    .bind(lesson.updated_at.unwrap_or_else(Utc::now))
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    for table in ["lesson_steps", "lesson_challenges", "lesson_projects"] {
        sqlx::query(&format!("DELETE FROM {} WHERE lesson_id = $1", table))
            .bind(lesson.id)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
    }

    for step in &lesson.steps {
        sqlx::query(
            "INSERT INTO lesson_steps (lesson_id, step_number, title, instruction, code_example, \
             expected_output, explanation, hints) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(lesson.id)
        .bind(step.step_number)
        .bind(&step.title)
        .bind(&step.instruction)
        .bind(&step.code_example)
        .bind(&step.expected_output)
        .bind(&step.explanation)
        .bind(&step.hints)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    }

    for challenge in &lesson.challenges {
        sqlx::query(
            "INSERT INTO lesson_challenges (lesson_id, challenge_order, title, description, \
             starter_code, solution, difficulty, points) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(lesson.id)
        .bind(challenge.order)
        .bind(&challenge.title)
        .bind(&challenge.description)
        .bind(&challenge.starter_code)
        .bind(&challenge.solution)
        .bind(challenge.difficulty.as_str())
        .bind(challenge.points)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    }

    if let Some(project) = &lesson.project {
        sqlx::query(
            "INSERT INTO lesson_projects (lesson_id, title, description, requirements, \
             starter_code, solution_code, extension_ideas) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(lesson.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.requirements)
        .bind(&project.starter_code)
        .bind(&project.solution_code)
        .bind(&project.extension_ideas)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

async fn load_student_children(conn: &mut PgConnection, ids: &[i64]) -> PortResult<StudentChildren> {
    let mut children = StudentChildren::default();
    if ids.is_empty() {
        return Ok(children);
    }

    let languages = sqlx::query_as::<_, LanguageRecord>(
        "SELECT student_id, language, proficiency_level, started_at, last_practiced_at, notes \
         FROM student_languages WHERE student_id = ANY($1) ORDER BY id",
    )
    .bind(ids.to_vec())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    for language in languages {
        children.languages.entry(language.student_id).or_default().push(language);
    }

    let progress = sqlx::query_as::<_, ProgressRecord>(&format!(
        "{} WHERE p.student_id = ANY($1) ORDER BY p.completed_at DESC NULLS LAST, p.lesson_id",
        PROGRESS_SELECT
    ))
    .bind(ids.to_vec())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    for record in progress {
        children.progress.entry(record.student_id).or_default().push(record);
    }

    Ok(children)
}

async fn fetch_student(conn: &mut PgConnection, id: i64) -> PortResult<Student> {
    let record = sqlx::query_as::<_, StudentRecord>(&format!("{} WHERE s.id = $1", STUDENT_SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| not_found("Student", id))?;
    let mut children = load_student_children(conn, &[id]).await?;
    record.to_domain(&mut children)
}

/// Writes the student's own columns and replaces its languages. Progress rows
/// are only touched by the progress operations.
async fn write_student(conn: &mut PgConnection, student: &Student) -> PortResult<()> {
    sqlx::query(
        "UPDATE students SET name = $2, age = $3, skill_level = $4, group_id = $5, email = $6, \
         parent_email = $7, notes = $8, is_active = $9, updated_at = $10 WHERE id = $1",
    )
    .bind(student.id)
    .bind(&student.name)
    .bind(student.age)
    .bind(student.skill_level.as_str())
    .bind(student.group_id)
    .bind(&student.email)
    .bind(&student.parent_email)
    .bind(&student.notes)
    .bind(student.is_active)
    .bind(student.updated_at.unwrap_or_else(Utc::now))
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    sqlx::query("DELETE FROM student_languages WHERE student_id = $1")
        .bind(student.id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    for language in &student.languages {
        sqlx::query(
            "INSERT INTO student_languages (student_id, language, proficiency_level, started_at, \
             last_practiced_at, notes) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(student.id)
        .bind(&language.language)
        .bind(language.proficiency_level.as_str())
        .bind(language.started_at)
        .bind(language.last_practiced_at)
        .bind(&language.notes)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

async fn fetch_folder(conn: &mut PgConnection, id: i64) -> PortResult<LessonFolder> {
    sqlx::query_as::<_, FolderRecord>(&format!("{} WHERE f.id = $1", FOLDER_SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .map(FolderRecord::to_domain)
        .ok_or_else(|| not_found("Folder", id))
}

async fn fetch_group(conn: &mut PgConnection, id: i64) -> PortResult<StudentGroup> {
    sqlx::query_as::<_, GroupRecord>(&format!("{} WHERE g.id = $1", GROUP_SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| not_found("Group", id))?
        .to_domain()
}

async fn fetch_snippet(conn: &mut PgConnection, id: i64) -> PortResult<CodeSnippet> {
    sqlx::query_as::<_, SnippetRecord>(
        "SELECT id, title, language, code, explanation, difficulty FROM snippets WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err)?
    .ok_or_else(|| not_found("Snippet", id))?
    .to_domain()
}

/// Runs a `DELETE ... WHERE id = $1` and reports a missing row as `NotFound`.
async fn delete_by_id(pool: &PgPool, table: &str, kind: &str, id: i64) -> PortResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_err)?;
    if result.rows_affected() == 0 {
        return Err(not_found(kind, id));
    }
    Ok(())
}

//=========================================================================================
// `LessonPlannerRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl LessonPlannerRepository for DbAdapter {
    // --- Lesson Plans ---
    async fn list_lessons(&self) -> PortResult<Vec<LessonPlan>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let records = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {} FROM lessons ORDER BY created_at DESC, id DESC",
            LESSON_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err)?;
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let mut children = load_lesson_children(&mut conn, &ids).await?;
        records
            .into_iter()
            .map(|r| r.to_domain(&mut children))
            .collect()
    }

    async fn get_lesson(&self, id: i64) -> PortResult<LessonPlan> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_lesson(&mut conn, id).await
    }

    async fn create_lesson(&self, input: LessonPlanInput) -> PortResult<LessonPlan> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let (id,): (i64,) = sqlx::query_as("INSERT INTO lessons (title) VALUES ($1) RETURNING id")
            .bind(&input.title)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
        let lesson = input.into_lesson(id, Utc::now());
        write_lesson(&mut tx, &lesson).await?;
        tx.commit().await.map_err(db_err)?;
        debug!("Inserted lesson {}", id);
        Ok(lesson)
    }

    async fn update_lesson(&self, id: i64, patch: LessonPlanPatch) -> PortResult<LessonPlan> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("SELECT id FROM lessons WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| not_found("Lesson", id))?;
        let mut lesson = fetch_lesson(&mut tx, id).await?;
        patch.apply_to(&mut lesson, Utc::now());
        write_lesson(&mut tx, &lesson).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(lesson)
    }

    async fn delete_lesson(&self, id: i64) -> PortResult<()> {
        delete_by_id(&self.pool, "lessons", "Lesson", id).await
    }

    // --- Folders ---
    async fn list_folders(&self) -> PortResult<Vec<LessonFolder>> {
        let records = sqlx::query_as::<_, FolderRecord>(&format!(
            "{} ORDER BY f.order_index, f.name",
            FOLDER_SELECT
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(records.into_iter().map(FolderRecord::to_domain).collect())
    }

    async fn get_folder(&self, id: i64) -> PortResult<LessonFolder> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_folder(&mut conn, id).await
    }

    async fn create_folder(&self, input: FolderInput) -> PortResult<LessonFolder> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO lesson_folders (name, description, color, order_index) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.color)
        .bind(input.order_index)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        self.get_folder(id).await
    }

    async fn update_folder(&self, id: i64, patch: FolderPatch) -> PortResult<LessonFolder> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut folder = fetch_folder(&mut tx, id).await?;
        patch.apply_to(&mut folder, Utc::now());
        sqlx::query(
            "UPDATE lesson_folders SET name = $2, description = $3, color = $4, order_index = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(id)
        .bind(&folder.name)
        .bind(&folder.description)
        .bind(&folder.color)
        .bind(folder.order_index)
        .bind(folder.updated_at.unwrap_or_else(Utc::now))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(folder)
    }

    async fn delete_folder(&self, id: i64) -> PortResult<()> {
        // Member lessons are released by `ON DELETE SET NULL`.
        delete_by_id(&self.pool, "lesson_folders", "Folder", id).await
    }

    // --- Code Snippets ---
    async fn list_snippets(&self) -> PortResult<Vec<CodeSnippet>> {
        sqlx::query_as::<_, SnippetRecord>(
            "SELECT id, title, language, code, explanation, difficulty FROM snippets ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(SnippetRecord::to_domain)
        .collect()
    }

    async fn get_snippet(&self, id: i64) -> PortResult<CodeSnippet> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_snippet(&mut conn, id).await
    }

    async fn create_snippet(&self, input: SnippetInput) -> PortResult<CodeSnippet> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO snippets (title, language, code, explanation, difficulty) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.language)
        .bind(&input.code)
        .bind(&input.explanation)
        .bind(input.difficulty.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(input.into_snippet(id))
    }

    async fn update_snippet(&self, id: i64, patch: SnippetPatch) -> PortResult<CodeSnippet> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut snippet = fetch_snippet(&mut tx, id).await?;
        patch.apply_to(&mut snippet);
        sqlx::query(
            "UPDATE snippets SET title = $2, language = $3, code = $4, explanation = $5, \
             difficulty = $6 WHERE id = $1",
        )
        .bind(id)
        .bind(&snippet.title)
        .bind(&snippet.language)
        .bind(&snippet.code)
        .bind(&snippet.explanation)
        .bind(snippet.difficulty.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(snippet)
    }

    async fn delete_snippet(&self, id: i64) -> PortResult<()> {
        delete_by_id(&self.pool, "snippets", "Snippet", id).await
    }

    // --- Student Groups ---
    async fn list_groups(&self) -> PortResult<Vec<StudentGroup>> {
        sqlx::query_as::<_, GroupRecord>(&format!("{} ORDER BY g.name", GROUP_SELECT))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(GroupRecord::to_domain)
            .collect()
    }

    async fn get_group(&self, id: i64) -> PortResult<StudentGroup> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_group(&mut conn, id).await
    }

    async fn create_group(&self, input: GroupInput) -> PortResult<StudentGroup> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO student_groups (name, description, average_age, skill_level) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.average_age)
        .bind(input.skill_level.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(input.into_group(id))
    }

    async fn update_group(&self, id: i64, patch: GroupPatch) -> PortResult<StudentGroup> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut group = fetch_group(&mut tx, id).await?;
        patch.apply_to(&mut group);
        sqlx::query(
            "UPDATE student_groups SET name = $2, description = $3, average_age = $4, \
             skill_level = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.average_age)
        .bind(group.skill_level.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(group)
    }

    async fn delete_group(&self, id: i64) -> PortResult<()> {
        // Members are released by `ON DELETE SET NULL`.
        delete_by_id(&self.pool, "student_groups", "Group", id).await
    }

    // --- Students ---
    async fn list_students(&self) -> PortResult<Vec<Student>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let records = sqlx::query_as::<_, StudentRecord>(&format!("{} ORDER BY s.name", STUDENT_SELECT))
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err)?;
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let mut children = load_student_children(&mut conn, &ids).await?;
        records
            .into_iter()
            .map(|r| r.to_domain(&mut children))
            .collect()
    }

    async fn get_student(&self, id: i64) -> PortResult<Student> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_student(&mut conn, id).await
    }

    async fn create_student(&self, input: StudentInput) -> PortResult<Student> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let (id,): (i64,) = sqlx::query_as("INSERT INTO students (name) VALUES ($1) RETURNING id")
            .bind(&input.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
        let student = input.into_student(id, Utc::now());
        write_student(&mut tx, &student).await?;
        let student = fetch_student(&mut tx, id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(student)
    }

    async fn update_student(&self, id: i64, patch: StudentPatch) -> PortResult<Student> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut student = fetch_student(&mut tx, id).await?;
        patch.apply_to(&mut student, Utc::now());
        write_student(&mut tx, &student).await?;
        let student = fetch_student(&mut tx, id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(student)
    }

    async fn delete_student(&self, id: i64) -> PortResult<()> {
        delete_by_id(&self.pool, "students", "Student", id).await
    }

    // --- Progress ---
    async fn record_completion(&self, student_id: i64, lesson_id: i64) -> PortResult<StudentProgress> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let lesson = fetch_lesson(&mut tx, lesson_id).await?;
        sqlx::query("SELECT id FROM students WHERE id = $1 FOR UPDATE")
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| not_found("Student", student_id))?;

        let existing = sqlx::query_as::<_, ProgressRecord>(&format!(
            "{} WHERE p.student_id = $1 AND p.lesson_id = $2",
            PROGRESS_SELECT
        ))
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .map(ProgressRecord::to_domain)
        .transpose()?;

        let record = complete_lesson(existing.as_ref(), &lesson, Utc::now())?;
        sqlx::query(
            "INSERT INTO student_progress (student_id, lesson_id, status, completed_at, score, \
             points_earned, time_spent_minutes, notes) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (student_id, lesson_id) DO UPDATE SET status = EXCLUDED.status, \
             completed_at = EXCLUDED.completed_at, points_earned = EXCLUDED.points_earned",
        )
        .bind(student_id)
        .bind(lesson_id)
        .bind(record.status.as_str())
        .bind(record.completed_at)
        .bind(record.score)
        .bind(record.points_earned)
        .bind(record.time_spent_minutes)
        .bind(&record.notes)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        sqlx::query("UPDATE students SET updated_at = NOW() WHERE id = $1")
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(record)
    }

    async fn remove_progress(&self, student_id: i64, lesson_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM student_progress WHERE student_id = $1 AND lesson_id = $2")
            .bind(student_id)
            .bind(lesson_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "No progress for student {} on lesson {}",
                student_id, lesson_id
            )));
        }
        Ok(())
    }
}
