mod common;

use common::spawn_app;
use lesson_planner_core::{
    domain::{Difficulty, ProficiencyLevel, StudentLanguage},
    payloads::{GroupInput, GroupPatch, StudentInput, StudentPatch},
    ports::LessonPlannerApi,
    views::{Dashboard, StudentRoster},
};

fn group(name: &str) -> GroupInput {
    GroupInput {
        name: name.to_string(),
        description: String::new(),
        average_age: 10,
        skill_level: Difficulty::Beginner,
    }
}

fn student(name: &str, group_id: Option<i64>, level: Difficulty) -> StudentInput {
    StudentInput {
        name: name.to_string(),
        age: 10,
        skill_level: level,
        group_id,
        ..StudentInput::default()
    }
}

#[tokio::test]
async fn group_members_and_names_are_derived() {
    let client = spawn_app(None).await;
    let group_id = client.create_group(&group("Robots")).await.unwrap().id;
    let a = client
        .create_student(&student("Ada", Some(group_id), Difficulty::Beginner))
        .await
        .unwrap()
        .id;
    let b = client
        .create_student(&student("Bo", Some(group_id), Difficulty::Advanced))
        .await
        .unwrap()
        .id;
    client
        .create_student(&student("Cy", None, Difficulty::Beginner))
        .await
        .unwrap();

    let fetched = client.get_group(group_id).await.unwrap();
    let mut member_ids = fetched.student_ids.clone();
    member_ids.sort();
    assert_eq!(member_ids, vec![a, b]);
    assert_eq!(
        client.get_student(a).await.unwrap().group_name.as_deref(),
        Some("Robots")
    );

    let roster = StudentRoster::load(&client).await.unwrap();
    assert_eq!(roster.members(group_id).len(), 2);
    let analytics = roster.analytics(group_id);
    assert_eq!(analytics.student_count, 2);
    assert_eq!(analytics.beginners, 1);
    assert_eq!(analytics.advanced, 1);

    client
        .update_group(
            group_id,
            &GroupPatch {
                name: Some("Rockets".into()),
                ..GroupPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        client.get_student(b).await.unwrap().group_name.as_deref(),
        Some("Rockets")
    );
}

#[tokio::test]
async fn deleting_a_group_keeps_its_students() {
    let client = spawn_app(None).await;
    let group_id = client.create_group(&group("Pythons")).await.unwrap().id;
    let id = client
        .create_student(&student("Ada", Some(group_id), Difficulty::Beginner))
        .await
        .unwrap()
        .id;

    client.delete_group(group_id).await.unwrap();

    let student = client.get_student(id).await.unwrap();
    assert_eq!(student.group_id, None);
    assert_eq!(student.group_name, None);
    assert_eq!(client.get_group(group_id).await.unwrap_err().status(), Some(404));
}

#[tokio::test]
async fn student_languages_are_replaced_on_update() {
    let client = spawn_app(None).await;
    let id = client
        .create_student(&StudentInput {
            languages: vec![StudentLanguage {
                language: "Scratch".into(),
                proficiency_level: ProficiencyLevel::Advanced,
                ..StudentLanguage::default()
            }],
            ..student("Ada", None, Difficulty::Beginner)
        })
        .await
        .unwrap()
        .id;
    assert_eq!(client.get_student(id).await.unwrap().language_count, 1);

    let patch = StudentPatch {
        languages: Some(vec![
            StudentLanguage {
                language: "Python".into(),
                ..StudentLanguage::default()
            },
            StudentLanguage {
                language: "JavaScript".into(),
                ..StudentLanguage::default()
            },
        ]),
        ..StudentPatch::default()
    };
    client.update_student(id, &patch).await.unwrap();

    let student = client.get_student(id).await.unwrap();
    assert_eq!(student.language_count, 2);
    assert!(student.languages.iter().all(|l| l.language != "Scratch"));
    assert_eq!(student.name, "Ada");
}

#[tokio::test]
async fn unknown_group_is_rejected_and_dashboard_counts_everything() {
    let client = spawn_app(None).await;
    let err = client
        .create_student(&student("Ghost", Some(77), Difficulty::Beginner))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    let group_id = client.create_group(&group("Crew")).await.unwrap().id;
    for name in ["A", "B"] {
        client
            .create_student(&student(name, Some(group_id), Difficulty::Intermediate))
            .await
            .unwrap();
    }

    let dashboard = Dashboard::load(&client).await.unwrap();
    assert_eq!(dashboard.stats.total_students, 2);
    assert_eq!(dashboard.stats.total_groups, 1);
    assert_eq!(dashboard.stats.total_lessons, 0);
    assert_eq!(dashboard.top_students.len(), 2);
}

#[tokio::test]
async fn parent_email_can_be_cleared() {
    let client = spawn_app(None).await;
    let id = client
        .create_student(&StudentInput {
            email: Some("ada@example.com".into()),
            parent_email: Some("parent@example.com".into()),
            ..student("Ada", None, Difficulty::Beginner)
        })
        .await
        .unwrap()
        .id;

    let patch = StudentPatch {
        parent_email: Some(None),
        ..StudentPatch::default()
    };
    client.update_student(id, &patch).await.unwrap();

    let stored = client.get_student(id).await.unwrap();
    assert_eq!(stored.parent_email, None);
    assert_eq!(stored.email.as_deref(), Some("ada@example.com"));
}
