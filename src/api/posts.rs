// Post, comment and post-engagement handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ReportRequest;
use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::database::PageRequest;
use crate::infrastructure::middleware::Vc;
use crate::moderation::{CommentView, ReportOutcome, VoteAction, VoteOutcome};
use crate::services::post_service::{PostDetail, PostSummary};

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<Vec<PostSummary>>> {
    Ok(Json(state.posts.list_posts(page).await?))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    vc: Vc,
    Json(req): Json<NewPostRequest>,
) -> AppResult<(StatusCode, Json<PostSummary>)> {
    let post = state.posts.create_post(&vc, req.title, req.content).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<PostDetail>> {
    Ok(Json(state.posts.get_post(&post_id).await?))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.posts.delete_post(&vc, &post_id).await?;
    Ok(Json(json!({"id": post_id, "deleted": true})))
}

pub async fn view_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Value>> {
    let views = state.posts.record_view(&post_id).await?;
    Ok(Json(json!({"id": post_id, "views": views})))
}

pub async fn like_post_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Json<VoteOutcome>> {
    Ok(Json(state.posts.vote(&vc, &post_id, None, VoteAction::Like).await?))
}

pub async fn unlike_post_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Json<VoteOutcome>> {
    Ok(Json(state.posts.vote(&vc, &post_id, None, VoteAction::Unlike).await?))
}

pub async fn report_post_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
    Json(req): Json<ReportRequest>,
) -> AppResult<Json<ReportOutcome>> {
    Ok(Json(state.posts.report(&vc, &post_id, None, &req.reason).await?))
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(state.posts.list_comments(&post_id).await?))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
    Json(req): Json<NewCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    let comment = state
        .posts
        .add_comment(&vc, &post_id, req.content, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let removed = state.posts.delete_comment(&vc, &post_id, &comment_id).await?;
    Ok(Json(json!({"id": comment_id, "deleted": true, "removed": removed})))
}

pub async fn like_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<VoteOutcome>> {
    let outcome = state
        .posts
        .vote(&vc, &post_id, Some(comment_id.as_str()), VoteAction::Like)
        .await?;
    Ok(Json(outcome))
}

pub async fn unlike_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<VoteOutcome>> {
    let outcome = state
        .posts
        .vote(&vc, &post_id, Some(comment_id.as_str()), VoteAction::Unlike)
        .await?;
    Ok(Json(outcome))
}

pub async fn report_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, comment_id)): Path<(String, String)>,
    Json(req): Json<ReportRequest>,
) -> AppResult<Json<ReportOutcome>> {
    let outcome = state
        .posts
        .report(&vc, &post_id, Some(comment_id.as_str()), &req.reason)
        .await?;
    Ok(Json(outcome))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route("/posts/{id}", get(get_post_handler).delete(delete_post_handler))
        .route("/posts/{id}/view", post(view_post_handler))
        .route("/posts/{id}/like", post(like_post_handler))
        .route("/posts/{id}/unlike", post(unlike_post_handler))
        .route("/posts/{id}/report", post(report_post_handler))
        .route(
            "/posts/{id}/comments",
            get(list_comments_handler).post(add_comment_handler),
        )
        .route("/posts/{id}/comments/{comment_id}", delete(delete_comment_handler))
        .route("/posts/{id}/comments/{comment_id}/like", post(like_comment_handler))
        .route("/posts/{id}/comments/{comment_id}/unlike", post(unlike_comment_handler))
        .route("/posts/{id}/comments/{comment_id}/report", post(report_comment_handler))
}
