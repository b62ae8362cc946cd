// Professor and professor-review handlers

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
use crate::models::Professor;
use crate::moderation::{ReportOutcome, VoteAction, VoteOutcome};
use crate::services::professor_service::{
    NewProfessor, NewProfessorReview, ProfessorPage, ProfessorReviewView,
};

pub async fn list_professors_handler(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<Vec<Professor>>> {
    Ok(Json(state.professors.list_professors(page).await?))
}

pub async fn create_professor_handler(
    State(state): State<AppState>,
    vc: Vc,
    Json(req): Json<NewProfessor>,
) -> AppResult<(StatusCode, Json<Professor>)> {
    let professor = state.professors.create_professor(&vc, req).await?;
    Ok((StatusCode::CREATED, Json(professor)))
}

pub async fn get_professor_handler(
    State(state): State<AppState>,
    Path(professor_id): Path<String>,
) -> AppResult<Json<Professor>> {
    Ok(Json(state.professors.get_professor(&professor_id).await?))
}

pub async fn delete_professor_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(professor_id): Path<String>,
) -> AppResult<Json<Value>> {
    let reviews = state.professors.delete_professor(&vc, &professor_id).await?;
    Ok(Json(json!({"id": professor_id, "deleted": true, "reviews_deleted": reviews})))
}

pub async fn professor_page_handler(
    State(state): State<AppState>,
    Path(professor_id): Path<String>,
) -> AppResult<Json<ProfessorPage>> {
    Ok(Json(state.professors.professor_page(&professor_id).await?))
}

pub async fn list_reviews_handler(
    State(state): State<AppState>,
    Path(professor_id): Path<String>,
) -> AppResult<Json<Vec<ProfessorReviewView>>> {
    Ok(Json(state.professors.list_reviews(&professor_id).await?))
}

pub async fn add_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(professor_id): Path<String>,
    Json(req): Json<NewProfessorReview>,
) -> AppResult<(StatusCode, Json<ProfessorReviewView>)> {
    let review = state.professors.add_review(&vc, &professor_id, req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(review_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.professors.delete_review(&vc, &review_id).await?;
    Ok(Json(json!({"id": review_id, "deleted": true})))
}

pub async fn like_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(review_id): Path<String>,
) -> AppResult<Json<VoteOutcome>> {
    Ok(Json(state.professors.vote(&vc, &review_id, VoteAction::Like).await?))
}

pub async fn unlike_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(review_id): Path<String>,
) -> AppResult<Json<VoteOutcome>> {
    Ok(Json(state.professors.vote(&vc, &review_id, VoteAction::Unlike).await?))
}

pub async fn report_review_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(review_id): Path<String>,
    Json(req): Json<ReportRequest>,
) -> AppResult<Json<ReportOutcome>> {
    Ok(Json(state.professors.report(&vc, &review_id, &req.reason).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/professors", get(list_professors_handler).post(create_professor_handler))
        .route(
            "/professors/{id}",
            get(get_professor_handler).delete(delete_professor_handler),
        )
        .route("/professors/{id}/page", get(professor_page_handler))
        .route(
            "/professors/{id}/reviews",
            get(list_reviews_handler).post(add_review_handler),
        )
        .route("/professors/reviews/{review_id}", delete(delete_review_handler))
        .route("/professors/reviews/{review_id}/like", post(like_review_handler))
        .route("/professors/reviews/{review_id}/unlike", post(unlike_review_handler))
        .route("/professors/reviews/{review_id}/report", post(report_review_handler))
}
