// Admin handlers: flagged listings, unflagging and author rename

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::services::admin_service::{FlaggedComment, FlaggedCourseReview, RenameSummary};
use crate::services::post_service::PostSummary;
use crate::services::professor_service::ProfessorReviewView;

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(alias = "new_name")]
    pub username: String,
}

pub async fn flagged_posts_handler(
    State(state): State<AppState>,
    vc: Vc,
) -> AppResult<Json<Vec<PostSummary>>> {
    Ok(Json(state.admin.flagged_posts(&vc).await?))
}

pub async fn flagged_comments_handler(
    State(state): State<AppState>,
    vc: Vc,
) -> AppResult<Json<Vec<FlaggedComment>>> {
    Ok(Json(state.admin.flagged_comments(&vc).await?))
}

pub async fn flagged_course_reviews_handler(
    State(state): State<AppState>,
    vc: Vc,
) -> AppResult<Json<Vec<FlaggedCourseReview>>> {
    Ok(Json(state.admin.flagged_course_reviews(&vc).await?))
}

pub async fn flagged_professor_reviews_handler(
    State(state): State<AppState>,
    vc: Vc,
) -> AppResult<Json<Vec<ProfessorReviewView>>> {
    Ok(Json(state.admin.flagged_professor_reviews(&vc).await?))
}

pub async fn unflag_post_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.admin.unflag_post(&vc, &post_id).await?;
    Ok(Json(json!({"id": post_id, "flagged": false})))
}

pub async fn unflag_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    state.admin.unflag_comment(&vc, &post_id, &comment_id).await?;
    Ok(Json(json!({"id": comment_id, "flagged": false})))
}

pub async fn unflag_course_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((course_id, review_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    state
        .admin
        .unflag_course_review(&vc, &course_id, &review_id)
        .await?;
    Ok(Json(json!({"id": review_id, "flagged": false})))
}

pub async fn unflag_professor_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(review_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.admin.unflag_professor_review(&vc, &review_id).await?;
    Ok(Json(json!({"id": review_id, "flagged": false})))
}

pub async fn rename_author_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(user_id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> AppResult<Json<RenameSummary>> {
    Ok(Json(state.admin.rename_author(&vc, &user_id, &req.username).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/flagged/posts", get(flagged_posts_handler))
        .route("/admin/flagged/comments", get(flagged_comments_handler))
        .route("/admin/flagged/course-reviews", get(flagged_course_reviews_handler))
        .route("/admin/flagged/professor-reviews", get(flagged_professor_reviews_handler))
        .route("/admin/posts/{id}/unflag", post(unflag_post_handler))
        .route(
            "/admin/posts/{id}/comments/{comment_id}/unflag",
            post(unflag_comment_handler),
        )
        .route(
            "/admin/courses/{id}/reviews/{review_id}/unflag",
            post(unflag_course_review_handler),
        )
        .route(
            "/admin/professors/reviews/{review_id}/unflag",
            post(unflag_professor_review_handler),
        )
        .route("/admin/users/{user_id}/rename", post(rename_author_handler))
}
