// Router-level behaviour: identity gates, status codes and error bodies

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{admin, app, member, send, user, ANON};

#[tokio::test]
async fn test_anonymous_cannot_write() {
    let app = app().await;
    let res = send(&app, "POST", "/api/posts", ANON, Some(json!({"title": "t", "content": "c"}))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["kind"], "unauthorized");
}

#[tokio::test]
async fn test_flags_without_user_are_ignored() {
    let app = app().await;
    let res = send(
        &app,
        "GET",
        "/api/admin/flagged/posts",
        common::As {
            user: None,
            verified: true,
            admin: true,
        },
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_comment_thread_over_http() {
    let app = app().await;
    let post = send(&app, "POST", "/api/posts", user("alice"), Some(json!({"title": "Exam tips", "content": "Share"}))).await;
    assert_eq!(post.status, StatusCode::CREATED);
    let post_id = post.json()["id"].as_str().unwrap().to_string();

    let top = send(
        &app,
        "POST",
        &format!("/api/posts/{}/comments", post_id),
        user("bob"),
        Some(json!({"content": "sleep well"})),
    )
    .await
    .json();
    let top_id = top["id"].as_str().unwrap().to_string();

    let reply = send(
        &app,
        "POST",
        &format!("/api/posts/{}/comments", post_id),
        user("carol"),
        Some(json!({"content": "agreed", "parent_id": top_id})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let orphan = send(
        &app,
        "POST",
        &format!("/api/posts/{}/comments", post_id),
        user("carol"),
        Some(json!({"content": "lost", "parent_id": "ghost"})),
    )
    .await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
    assert_eq!(orphan.json()["kind"], "parent_not_found");

    let comments = send(&app, "GET", &format!("/api/posts/{}/comments", post_id), ANON, None).await.json();
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["replies"][0]["content"], "agreed");
}

#[tokio::test]
async fn test_duplicate_like_is_conflict() {
    let app = app().await;
    let post = send(&app, "POST", "/api/posts", user("alice"), Some(json!({"title": "t", "content": "c"}))).await.json();
    let like = format!("/api/posts/{}/like", post["id"].as_str().unwrap());

    let unverified = send(&app, "POST", &like, user("bob"), None).await;
    assert_eq!(unverified.status, StatusCode::FORBIDDEN);

    let first = send(&app, "POST", &like, member("bob"), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json()["likes_count"], 1);

    let second = send(&app, "POST", &like, member("bob"), None).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.json()["kind"], "already_liked");
}

#[tokio::test]
async fn test_course_review_requires_membership() {
    let app = app().await;
    let course = send(&app, "POST", "/api/courses", user("alice"), Some(json!({"title": "CSC209"}))).await.json();
    let uri = format!("/api/courses/{}/reviews", course["id"].as_str().unwrap());
    let review = json!({"content": "good", "difficulty": 3, "usefulness": 4, "workload": 3});

    let denied = send(&app, "POST", &uri, user("bob"), Some(review.clone())).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let accepted = send(&app, "POST", &uri, member("bob"), Some(review)).await;
    assert_eq!(accepted.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_professor_review_routes() {
    let app = app().await;
    send(&app, "POST", "/api/courses", member("alice"), Some(json!({"title": "MAT223"}))).await;
    let prof = send(
        &app,
        "POST",
        "/api/professors",
        member("alice"),
        Some(json!({"name": "Ada Lovelace", "department": "Mathematics", "current_courses": ["MAT223"]})),
    )
    .await;
    assert_eq!(prof.status, StatusCode::CREATED);
    let prof_id = prof.json()["id"].as_str().unwrap().to_string();

    let review = send(
        &app,
        "POST",
        &format!("/api/professors/{}/reviews", prof_id),
        member("bob"),
        Some(json!({"content": "inspiring", "overall_rating": 5, "clarity": 9})),
    )
    .await;
    assert_eq!(review.status, StatusCode::CREATED);
    let review_id = review.json()["id"].as_str().unwrap().to_string();

    let like = send(&app, "POST", &format!("/api/professors/reviews/{}/like", review_id), member("carol"), None).await;
    assert_eq!(like.status, StatusCode::OK);

    let page = send(&app, "GET", &format!("/api/professors/{}/page", prof_id), ANON, None).await.json();
    assert_eq!(page["professor"]["ratings"]["total_reviews"], 1);
    assert_eq!(page["reviews"][0]["likes_count"], 1);
    assert_eq!(page["current_courses"][0]["title"], "MAT223");
    assert_eq!(page["past_courses"].as_array().unwrap().len(), 0);

    let delete = send(&app, "DELETE", &format!("/api/professors/reviews/{}", review_id), member("carol"), None).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
    let delete = send(&app, "DELETE", &format!("/api/professors/reviews/{}", review_id), member("bob"), None).await;
    assert_eq!(delete.status, StatusCode::OK);

    let prof = send(&app, "GET", &format!("/api/professors/{}", prof_id), ANON, None).await.json();
    assert_eq!(prof["ratings"]["total_reviews"], 0);
}

#[tokio::test]
async fn test_admin_rename_over_http() {
    let app = app().await;
    send(&app, "POST", "/api/posts", user("alice"), Some(json!({"title": "t", "content": "c"}))).await;

    let body = json!({"username": "alice2"});
    let denied = send(&app, "POST", "/api/admin/users/alice/rename", user("alice"), Some(body.clone())).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let summary = send(&app, "POST", "/api/admin/users/alice/rename", admin("root"), Some(body)).await.json();
    assert_eq!(summary["posts"], 1);

    let posts = send(&app, "GET", "/api/posts", ANON, None).await.json();
    assert_eq!(posts[0]["author_name"], "alice2");
}
