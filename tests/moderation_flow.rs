// Moderation workflows driven through the application services

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use campus_forum::app_state::AppState;
use campus_forum::config::Config;
use campus_forum::infrastructure::cache_layer::ResponseCache;
use campus_forum::infrastructure::database::{DocumentFilter, DocumentRepository, EntityStore};
use campus_forum::infrastructure::sqlite_database::SqliteEntityStore;
use campus_forum::infrastructure::viewer::ViewerContext;
use campus_forum::moderation::VoteAction;
use campus_forum::services::course_service::{NewCourse, NewCourseReview};
use campus_forum::services::professor_service::{NewProfessor, NewProfessorReview};
use campus_forum::models::{Professor, ProfessorReview, ProfessorScores};
use campus_forum::{AppError, AppResult};

async fn state(threshold: usize) -> AppState {
    let mut config = Config::in_memory();
    config.moderation.report_threshold = threshold;
    let store = SqliteEntityStore::new_in_memory().await.unwrap();
    AppState::from_parts(config, Arc::new(store), ResponseCache::disabled())
}

/// Store whose professor writes can be switched off.
struct ProfessorWritesFail {
    inner: SqliteEntityStore,
    failing: AtomicBool,
}

#[async_trait]
impl EntityStore for ProfessorWritesFail {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn save_whole(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
        if collection == "professors" && self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Database("professors is read-only".into()));
        }
        self.inner.save_whole(collection, id, document).await
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        self.inner.delete(collection, id).await
    }

    async fn find_all(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        skip: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<Value>> {
        self.inner.find_all(collection, filter, skip, limit).await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

fn new_professor(name: &str) -> NewProfessor {
    NewProfessor {
        name: name.into(),
        department: "Computer Science".into(),
        profile_link: None,
        current_courses: Vec::new(),
        past_courses: Vec::new(),
    }
}

fn professor_review(overall: f64, strictness: f64) -> NewProfessorReview {
    NewProfessorReview {
        content: "fine".into(),
        course_id: None,
        scores: ProfessorScores {
            overall_rating: overall,
            strictness: Some(strictness),
            clarity: None,
            engagement: None,
        },
    }
}

fn member(id: &str) -> ViewerContext {
    ViewerContext::authenticated_user(id.into(), Some(id.into()), format!("req-{}", id)).verified(true)
}

fn admin() -> ViewerContext {
    member("root").admin(true)
}

#[tokio::test]
async fn test_reported_reply_then_thread_deletion() {
    let state = state(1).await;
    let posts = &state.posts;

    let post = posts.create_post(&member("p"), "Midterm".into(), "How was it?".into()).await.unwrap();
    assert!(posts.list_comments(&post.id).await.unwrap().is_empty());

    let c1 = posts.add_comment(&member("a"), &post.id, "Brutal".into(), None).await.unwrap();
    let c2 = posts
        .add_comment(&member("b"), &post.id, "Agreed".into(), Some(c1.id.clone()))
        .await
        .unwrap();

    let outcome = posts.report(&member("v"), &post.id, Some(c2.id.as_str()), "rude").await.unwrap();
    assert!(outcome.flagged);

    let rendered = posts.list_comments(&post.id).await.unwrap();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].id, c1.id);
    assert_eq!(rendered[0].replies.len(), 1);
    assert_eq!(rendered[0].replies[0].id, c2.id);
    assert!(rendered[0].replies[0].flagged);

    let removed = posts.delete_comment(&member("a"), &post.id, &c1.id).await.unwrap();
    assert_eq!(removed, 2);
    assert!(posts.list_comments(&post.id).await.unwrap().is_empty());
    assert_eq!(posts.get_post(&post.id).await.unwrap().post.comments_count, 0);
}

#[tokio::test]
async fn test_threshold_controls_flagging() {
    let state = state(2).await;
    let posts = &state.posts;
    let post = posts.create_post(&member("p"), "t".into(), "c".into()).await.unwrap();

    let first = posts.report(&member("a"), &post.id, None, "spam").await.unwrap();
    assert_eq!(first.reports_count, 1);
    assert!(!first.flagged);

    let dup = posts.report(&member("a"), &post.id, None, "spam again").await.unwrap_err();
    assert!(matches!(dup, AppError::DuplicateReport(_)));

    let second = posts.report(&member("b"), &post.id, None, "spam").await.unwrap();
    assert!(second.flagged);

    state.admin.unflag_post(&admin(), &post.id).await.unwrap();
    let summary = posts.get_post(&post.id).await.unwrap().post;
    assert!(!summary.flagged);
    assert_eq!(summary.reports_count, 0);

    // Reports were cleared, so the same voter may report again
    let again = posts.report(&member("a"), &post.id, None, "still spam").await.unwrap();
    assert_eq!(again.reports_count, 1);
}

#[tokio::test]
async fn test_like_unlike_is_idempotent_per_voter() {
    let state = state(1).await;
    let posts = &state.posts;
    let post = posts.create_post(&member("p"), "t".into(), "c".into()).await.unwrap();

    assert_eq!(posts.vote(&member("a"), &post.id, None, VoteAction::Like).await.unwrap().likes_count, 1);
    assert!(matches!(
        posts.vote(&member("a"), &post.id, None, VoteAction::Like).await,
        Err(AppError::AlreadyLiked(_))
    ));
    assert_eq!(posts.vote(&member("a"), &post.id, None, VoteAction::Unlike).await.unwrap().likes_count, 0);
    assert!(matches!(
        posts.vote(&member("a"), &post.id, None, VoteAction::Unlike).await,
        Err(AppError::NotLiked(_))
    ));
}

#[tokio::test]
async fn test_professor_aggregate_after_review_deletion() {
    let state = state(1).await;
    let profs = &state.professors;
    let prof = profs
        .create_professor(
            &member("a"),
            NewProfessor {
                name: "Alan Turing".into(),
                department: "Computer Science".into(),
                profile_link: None,
                current_courses: Vec::new(),
                past_courses: Vec::new(),
            },
        )
        .await
        .unwrap();

    let mut ids = Vec::new();
    for (who, strictness) in [("a", 4.0), ("b", 6.0), ("c", 8.0)] {
        let review = profs
            .add_review(
                &member(who),
                &prof.id,
                NewProfessorReview {
                    content: "fine".into(),
                    course_id: None,
                    scores: ProfessorScores {
                        overall_rating: 4.0,
                        strictness: Some(strictness),
                        clarity: None,
                        engagement: None,
                    },
                },
            )
            .await
            .unwrap();
        ids.push(review.id);
    }
    assert_eq!(profs.get_professor(&prof.id).await.unwrap().ratings.strictness, 6.0);

    profs.delete_review(&member("b"), &ids[1]).await.unwrap();
    let after = profs.get_professor(&prof.id).await.unwrap();
    assert_eq!(after.ratings.strictness, 6.0);
    assert_eq!(after.ratings.total_reviews, 2);
}

#[tokio::test]
async fn test_course_review_moderation_and_rename() {
    let state = state(1).await;
    let course = state
        .courses
        .create_course(
            &member("a"),
            NewCourse {
                title: "STA247".into(),
                description: "Probability".into(),
                prerequisites: String::new(),
                exclusions: String::new(),
                distribution: String::new(),
                professors: Vec::new(),
            },
        )
        .await
        .unwrap();
    let review = state
        .courses
        .add_review(
            &member("b"),
            &course.id,
            NewCourseReview {
                content: "useful".into(),
                difficulty: 3.0,
                usefulness: 5.0,
                workload: 2.0,
            },
        )
        .await
        .unwrap();

    state.courses.report(&member("c"), &course.id, &review.id, "spoilers").await.unwrap();
    let flagged = state.admin.flagged_course_reviews(&admin()).await.unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].review.id, review.id);

    state.admin.unflag_course_review(&admin(), &course.id, &review.id).await.unwrap();
    assert!(state.admin.flagged_course_reviews(&admin()).await.unwrap().is_empty());

    let summary = state.admin.rename_author(&admin(), "b", "bee").await.unwrap();
    assert_eq!(summary.course_reviews, 1);
    let detail = state.courses.get_course(&course.id).await.unwrap();
    assert_eq!(detail.reviews.unwrap()[0].author_name, "bee");
}

#[tokio::test]
async fn test_review_deletion_recomputes_from_stored_reviews() {
    let state = state(1).await;
    let profs = &state.professors;
    let prof = profs.create_professor(&member("a"), new_professor("Barbara Liskov")).await.unwrap();

    let mut ids = Vec::new();
    for (who, strictness) in [("a", 2.0), ("b", 4.0), ("c", 9.0)] {
        ids.push(profs.add_review(&member(who), &prof.id, professor_review(3.0, strictness)).await.unwrap().id);
    }

    // Corrupt the stored aggregate; only a full recompute recovers from it.
    let repo = DocumentRepository::new(state.store.clone());
    let mut stored: Professor = repo.get(&prof.id).await.unwrap();
    stored.ratings.overall = 1.0;
    stored.ratings.strictness = 1.0;
    stored.ratings.total_reviews = 40;
    repo.save(&stored).await.unwrap();

    profs.delete_review(&member("c"), &ids[2]).await.unwrap();
    let after = profs.get_professor(&prof.id).await.unwrap();
    assert_eq!(after.ratings.overall, 3.0);
    assert_eq!(after.ratings.strictness, 3.0);
    assert_eq!(after.ratings.total_reviews, 2);
}

#[tokio::test]
async fn test_professor_review_writes_roll_back_on_failure() {
    let store = Arc::new(ProfessorWritesFail {
        inner: SqliteEntityStore::new_in_memory().await.unwrap(),
        failing: AtomicBool::new(false),
    });
    let state = AppState::from_parts(Config::in_memory(), store.clone(), ResponseCache::disabled());
    let profs = &state.professors;
    let repo = DocumentRepository::new(state.store.clone());

    let prof = profs.create_professor(&member("a"), new_professor("Edsger Dijkstra")).await.unwrap();
    let kept = profs.add_review(&member("a"), &prof.id, professor_review(4.0, 6.0)).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);

    let err = profs.add_review(&member("b"), &prof.id, professor_review(2.0, 2.0)).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    let reviews = profs.list_reviews(&prof.id).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].id, kept.id);

    let err = profs.delete_review(&member("a"), &kept.id).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    assert!(repo.find::<ProfessorReview>(&kept.id).await.unwrap().is_some());

    let unchanged = profs.get_professor(&prof.id).await.unwrap();
    assert_eq!(unchanged.ratings.total_reviews, 1);
    assert_eq!(unchanged.ratings.strictness, 6.0);
}
