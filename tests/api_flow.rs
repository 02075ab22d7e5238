//! End-to-end API tests against a real Postgres.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_register_create_room_and_join(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let slug = app.create_room(&alice, "Demo", false).await;
    assert!(slug.starts_with("demo_"));
    assert_eq!(slug.len(), "demo_".len() + 4);

    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);

    let (status, room) = app.get(&format!("/api/room/{}/", slug), &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["total_users"], 2);
    assert!(room["users"].as_array().unwrap().iter().any(|u| u == "bob"));
    assert!(room["admins"].as_array().unwrap().iter().any(|u| u == "alice"));
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_joining_public_room_twice_is_idempotent(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let slug = app.create_room(&alice, "Open house", false).await;

    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);
    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);

    let (_, room) = app.get(&format!("/api/room/{}", slug), &alice).await;
    assert_eq!(room["total_users"], 2);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_private_room_rejects_strangers(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let mallory = app.signup("mallory").await;
    let slug = app.create_room(&alice, "Secret", true).await;

    assert_eq!(app.join(&mallory, &slug).await, StatusCode::FORBIDDEN);
    assert_eq!(app.join(&alice, &slug).await, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/room/{}", slug), &mallory).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_task_assignment_and_notification(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let _carol = app.signup("carol").await;
    let slug = app.create_room(&alice, "Sprint", false).await;
    let tasks = format!("/api/room/{}/tasks", slug);

    let (status, body) = app
        .json(
            Method::POST,
            &tasks,
            Some(&alice),
            json!({"title": "Write docs", "due_date": "2030-01-01", "assigned_to": "carol"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "assigned_to");

    let (status, task) = app
        .json(
            Method::POST,
            &tasks,
            Some(&alice),
            json!({"title": "Write docs", "due_date": "2030-01-01", "assigned_to": "alice"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "pending");

    let (status, notifications) = app.get("/api/notifications", &alice).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = notifications.as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0]["message"],
        "Task 'Write docs' assigned to you in room 'Sprint'"
    );
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_staging_add_and_remove(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let slug = app.create_room(&alice, "Files", false).await;

    let (status, kept) = app
        .upload(&format!("/api/room/{}/upload", slug), &alice, "plan.txt", "the plan")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(kept["is_staged"], true);
    let (_, dropped) = app
        .upload(&format!("/api/room/{}/upload", slug), &alice, "draft.txt", "scratch")
        .await;

    let decide = |id: &str, decision: &str| {
        (
            format!("/api/room/{}/stage/{}/decision", slug, id),
            json!({ "decision": decision }),
        )
    };

    let (uri, body) = decide(kept["id"].as_str().unwrap(), "add");
    let (status, outcome) = app.json(Method::POST, &uri, Some(&alice), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, "File added to room");

    let (uri, body) = decide(dropped["id"].as_str().unwrap(), "remove");
    let (status, outcome) = app.json(Method::POST, &uri, Some(&alice), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, "File removed from staging area");

    let (_, staged) = app.get(&format!("/api/room/{}/staged", slug), &alice).await;
    let (_, room_files) = app.get(&format!("/api/room/{}/room-files", slug), &alice).await;
    assert!(staged.as_array().unwrap().is_empty());
    let room_files = room_files.as_array().unwrap();
    assert_eq!(room_files.len(), 1);
    assert_eq!(room_files[0]["name"], "plan.txt");
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_only_uploader_decides(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let slug = app.create_room(&alice, "Review", false).await;
    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);

    let (_, file) = app
        .upload(&format!("/api/room/{}/upload", slug), &alice, "spec.txt", "v1")
        .await;
    let uri = format!("/api/room/{}/stage/{}/decision", slug, file["id"].as_str().unwrap());

    for decision in ["add", "remove", "bogus"] {
        let (status, _) = app
            .json(Method::POST, &uri, Some(&bob), json!({ "decision": decision }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, body) = app
        .json(Method::POST, &uri, Some(&alice), json!({ "decision": "bogus" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid decision");
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_search_pages_room_names(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    app.create_room(&alice, "Alpha team", false).await;
    app.create_room(&alice, "alphabet soup", false).await;
    app.create_room(&alice, "Beta", false).await;

    let (status, body) = app.get("/api/search?q=ALPHA&page=7", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["page"], 1);
    let mut names: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Room name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["Alpha team", "alphabet soup"]);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_task_can_be_assigned_to_joined_member(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let slug = app.create_room(&alice, "Sprint", false).await;
    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);

    let (status, task) = app
        .json(
            Method::POST,
            &format!("/api/room/{}/tasks", slug),
            Some(&alice),
            json!({"title": "Review PR", "due_date": "2030-01-01", "assigned_to": "bob"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["assigned_to"], "bob");
    assert_eq!(task["created_by"], "alice");

    let (_, notifications) = app.get("/api/notifications", &bob).await;
    assert_eq!(
        notifications[0]["message"],
        "Task 'Review PR' assigned to you in room 'Sprint'"
    );
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_remove_user_is_creator_only(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let carol = app.signup("carol").await;
    let _dave = app.signup("dave").await;
    let slug = app.create_room(&alice, "Crew", false).await;
    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);
    assert_eq!(app.join(&carol, &slug).await, StatusCode::OK);

    let remove = |username: &str| json!({"action": "remove_user", "room_slug": slug, "username": username});

    let (status, _) = app.room_action(&bob, remove("carol")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Registered, but never joined.
    let (status, body) = app.room_action(&alice, remove("dave")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found in the room.");

    let (status, _) = app.room_action(&alice, remove("alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.room_action(&alice, remove("carol")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "User carol removed from the room.");

    let (_, room) = app.get(&format!("/api/room/{}", slug), &alice).await;
    assert_eq!(room["total_users"], 2);
    assert!(!room["users"].as_array().unwrap().iter().any(|u| u == "carol"));
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_make_admin_is_creator_only(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let _dave = app.signup("dave").await;
    let slug = app.create_room(&alice, "Crew", false).await;
    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);

    let promote = |username: &str| json!({"action": "make_admin", "room_slug": slug, "username": username});

    let (status, _) = app.room_action(&bob, promote("bob")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.room_action(&alice, promote("dave")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.room_action(&alice, promote("bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "User bob is now an admin of the room.");

    let (_, room) = app.get(&format!("/api/room/{}", slug), &bob).await;
    let mut admins: Vec<&str> = room["admins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_str().unwrap())
        .collect();
    admins.sort();
    assert_eq!(admins, ["alice", "bob"]);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_deleted_room_disappears(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let slug = app.create_room(&alice, "Doomed", false).await;
    assert_eq!(app.join(&bob, &slug).await, StatusCode::OK);

    let delete = json!({"action": "delete", "room_slug": slug});

    let (status, _) = app.room_action(&bob, delete.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.room_action(&alice, delete.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Room deleted successfully.");

    let (status, body) = app.get(&format!("/api/room/{}", slug), &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Room does not exist!");
    assert_eq!(app.join(&bob, &slug).await, StatusCode::NOT_FOUND);

    let (status, _) = app.room_action(&alice, delete).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, found) = app.get("/api/search?q=doomed", &alice).await;
    assert_eq!(found["count"], 0);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_media_follows_room_access(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let mallory = app.signup("mallory").await;
    let slug = app.create_room(&alice, "Vault", true).await;

    let (status, file) = app
        .upload(&format!("/api/room/{}/upload", slug), &alice, "secret.txt", "launch codes")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let url = file["url"].as_str().unwrap();

    let (status, content) = app.get(url, &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content, "launch codes");

    let (status, _) = app.get(url, &mallory).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/media/room_files/unknown_file.txt", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_long_upload_name_is_truncated(pool: PgPool) {
    let app = TestApp::new(pool);
    let alice = app.signup("alice").await;
    let slug = app.create_room(&alice, "Files", false).await;
    let long_name = format!("{}.txt", "a".repeat(300));

    let (status, file) = app
        .upload(&format!("/api/room/{}/upload", slug), &alice, &long_name, "x")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(file["name"].as_str().unwrap().len(), 255);
}
