mod common;

use common::{lesson_input, spawn_app};
use lesson_planner_core::{
    domain::ProgressStatus,
    payloads::{LessonPlanInput, StudentInput},
    ports::LessonPlannerApi,
    progress::{self, is_lesson_completed, language_points},
    views::{AssignmentBoard, CompletionFilter},
};

fn student(name: &str) -> StudentInput {
    StudentInput {
        name: name.to_string(),
        age: 11,
        ..StudentInput::default()
    }
}

#[tokio::test]
async fn completing_a_lesson_awards_its_points_once() {
    let client = spawn_app(None).await;
    let student_id = client.create_student(&student("Ada")).await.unwrap().id;
    let lesson_id = client.create_lesson(&lesson_input("Loops")).await.unwrap().id;

    let fresh = client.get_student(student_id).await.unwrap();
    assert_eq!(fresh.completed_lessons, 0);
    assert_eq!(fresh.total_points_earned, 0);

    let (award, student) = progress::mark_complete(&client, student_id, lesson_id)
        .await
        .unwrap();
    assert!(award.success);
    assert_eq!(award.points_awarded, 10);
    assert_eq!(award.message, "Lesson completed! 10 points awarded.");
    assert_eq!(student.completed_lessons, 1);
    assert_eq!(student.total_points_earned, 10);
    assert!(is_lesson_completed(&student, lesson_id));

    let record = &student.progress[0];
    assert_eq!(record.status, ProgressStatus::Completed);
    assert_eq!(record.lesson_title.as_deref(), Some("Loops"));
    assert_eq!(language_points(&student, "Python"), 10);

    let err = client.mark_complete(student_id, lesson_id).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    let again = client.get_student(student_id).await.unwrap();
    assert_eq!(again.completed_lessons, 1);
    assert_eq!(again.total_points_earned, 10);
}

#[tokio::test]
async fn removing_progress_resets_the_totals() {
    let client = spawn_app(None).await;
    let student_id = client.create_student(&student("Grace")).await.unwrap().id;
    let lesson_id = client
        .create_lesson(&LessonPlanInput {
            points: 25,
            ..lesson_input("Recursion")
        })
        .await
        .unwrap()
        .id;
    client.mark_complete(student_id, lesson_id).await.unwrap();

    let student = progress::remove_progress(&client, student_id, lesson_id)
        .await
        .unwrap();
    assert_eq!(student.completed_lessons, 0);
    assert_eq!(student.total_points_earned, 0);
    assert!(student.progress.is_empty());

    let err = client.remove_progress(student_id, lesson_id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    // Completing again after a removal is allowed.
    let award = client.mark_complete(student_id, lesson_id).await.unwrap();
    assert_eq!(award.points_awarded, 25);
}

#[tokio::test]
async fn unknown_student_or_lesson_is_not_found() {
    let client = spawn_app(None).await;
    let student_id = client.create_student(&student("Linus")).await.unwrap().id;
    let lesson_id = client.create_lesson(&lesson_input("Loops")).await.unwrap().id;

    assert_eq!(client.mark_complete(999, lesson_id).await.unwrap_err().status(), Some(404));
    assert_eq!(client.mark_complete(student_id, 999).await.unwrap_err().status(), Some(404));
}

#[tokio::test]
async fn assignment_board_splits_completed_and_pending_lessons() {
    let client = spawn_app(None).await;
    let student_id = client.create_student(&student("Ken")).await.unwrap().id;
    let done = client.create_lesson(&lesson_input("Loops")).await.unwrap().id;
    client
        .create_lesson(&LessonPlanInput {
            language: "javascript".into(),
            ..lesson_input("Events")
        })
        .await
        .unwrap();
    client.mark_complete(student_id, done).await.unwrap();

    let board = AssignmentBoard::load(&client, student_id).await.unwrap();
    let completed = board.visible_lessons(CompletionFilter::Completed, None);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, done);
    let pending = board.visible_lessons(CompletionFilter::Pending, None);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].title, "Events");
    assert!(board
        .visible_lessons(CompletionFilter::All, Some("javascript"))
        .iter()
        .all(|l| l.language == "javascript"));
}
