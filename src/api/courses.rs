// Course and course-review handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::ReportRequest;
use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::database::PageRequest;
use crate::infrastructure::middleware::Vc;
use crate::moderation::{ReportOutcome, VoteAction, VoteOutcome};
use crate::services::course_service::{CourseReviewView, CourseView, NewCourse, NewCourseReview};

pub async fn list_courses_handler(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<Vec<CourseView>>> {
    Ok(Json(state.courses.list_courses(page).await?))
}

pub async fn create_course_handler(
    State(state): State<AppState>,
    vc: Vc,
    Json(req): Json<NewCourse>,
) -> AppResult<(StatusCode, Json<CourseView>)> {
    let course = state.courses.create_course(&vc, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn get_course_handler(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<Json<CourseView>> {
    Ok(Json(state.courses.get_course(&course_id).await?))
}

pub async fn delete_course_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(course_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.courses.delete_course(&vc, &course_id).await?;
    Ok(Json(json!({"id": course_id, "deleted": true})))
}

pub async fn add_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(course_id): Path<String>,
    Json(req): Json<NewCourseReview>,
) -> AppResult<(StatusCode, Json<CourseReviewView>)> {
    let review = state.courses.add_review(&vc, &course_id, req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((course_id, review_id)): Path<(String, String)>,
) -> AppResult<Json<CourseView>> {
    Ok(Json(state.courses.delete_review(&vc, &course_id, &review_id).await?))
}

pub async fn like_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((course_id, review_id)): Path<(String, String)>,
) -> AppResult<Json<VoteOutcome>> {
    let outcome = state
        .courses
        .vote(&vc, &course_id, &review_id, VoteAction::Like)
        .await?;
    Ok(Json(outcome))
}

pub async fn unlike_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((course_id, review_id)): Path<(String, String)>,
) -> AppResult<Json<VoteOutcome>> {
    let outcome = state
        .courses
        .vote(&vc, &course_id, &review_id, VoteAction::Unlike)
        .await?;
    Ok(Json(outcome))
}

pub async fn report_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((course_id, review_id)): Path<(String, String)>,
    Json(req): Json<ReportRequest>,
) -> AppResult<Json<ReportOutcome>> {
    let outcome = state
        .courses
        .report(&vc, &course_id, &review_id, &req.reason)
        .await?;
    Ok(Json(outcome))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses_handler).post(create_course_handler))
        .route("/courses/{id}", get(get_course_handler).delete(delete_course_handler))
        .route("/courses/{id}/reviews", post(add_review_handler))
        .route("/courses/{id}/reviews/{review_id}", delete(delete_review_handler))
        .route("/courses/{id}/reviews/{review_id}/like", post(like_review_handler))
        .route("/courses/{id}/reviews/{review_id}/unlike", post(unlike_review_handler))
        .route("/courses/{id}/reviews/{review_id}/report", post(report_review_handler))
}
