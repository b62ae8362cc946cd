// ProfessorService - professors and their standalone reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::AppResult;
use crate::infrastructure::database::{DocumentFilter, DocumentRepository, PageRequest};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Course, Professor, ProfessorReview, ProfessorScores};
use crate::moderation::{on_insert, ModerationWorkflow, NodeRef, ReportOutcome, VoteAction, VoteOutcome};
use crate::services::course_service::CourseView;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProfessor {
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub profile_link: Option<String>,
    #[serde(default)]
    pub current_courses: Vec<String>,
    #[serde(default)]
    pub past_courses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProfessorReview {
    pub content: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(flatten)]
    pub scores: ProfessorScores,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfessorReviewView {
    pub id: String,
    pub professor_id: String,
    pub course_id: Option<String>,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(flatten)]
    pub scores: ProfessorScores,
    pub created_at: DateTime<Utc>,
    pub likes_count: usize,
    pub flagged: bool,
}

impl From<&ProfessorReview> for ProfessorReviewView {
    fn from(review: &ProfessorReview) -> Self {
        Self {
            id: review.id.clone(),
            professor_id: review.professor_id.clone(),
            course_id: review.course_id.clone(),
            content: review.content.clone(),
            author_id: review.author_id.clone(),
            author_name: review.author_name.clone(),
            scores: review.scores,
            created_at: review.created_at,
            likes_count: review.moderation.likes_count(),
            flagged: review.moderation.flagged,
        }
    }
}

/// A professor together with every review of them. Course titles on the
/// professor are resolved to the stored courses; titles with no matching
/// course are left out.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessorPage {
    pub professor: Professor,
    pub current_courses: Vec<CourseView>,
    pub past_courses: Vec<CourseView>,
    pub reviews: Vec<ProfessorReviewView>,
}

#[derive(Clone)]
pub struct ProfessorService {
    workflow: ModerationWorkflow,
}

impl ProfessorService {
    pub fn new(workflow: ModerationWorkflow) -> Self {
        Self { workflow }
    }

    fn repo(&self) -> &DocumentRepository {
        self.workflow.repository()
    }

    pub async fn list_professors(&self, page: PageRequest) -> AppResult<Vec<Professor>> {
        self.repo().page(&DocumentFilter::all(), page).await
    }

    pub async fn get_professor(&self, professor_id: &str) -> AppResult<Professor> {
        self.repo().get(professor_id).await
    }

    #[instrument(skip(self, vc, input), fields(request_id = %vc.request_id))]
    pub async fn create_professor(&self, vc: &ViewerContext, input: NewProfessor) -> AppResult<Professor> {
        vc.require_user()?;
        let mut professor = Professor::new(input.name, input.department)?;
        professor.profile_link = input.profile_link;
        professor.current_courses = input.current_courses;
        professor.past_courses = input.past_courses;
        self.repo().save(&professor).await?;

        info!("Created professor {} ({})", professor.id, professor.name);
        Ok(professor)
    }

    /// Admin only. Every review referencing the professor is deleted first.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn delete_professor(&self, vc: &ViewerContext, professor_id: &str) -> AppResult<usize> {
        vc.require_admin()?;
        let professor: Professor = self.repo().get(professor_id).await?;

        let reviews = self.reviews_of(&professor.id).await?;
        for review in &reviews {
            self.repo().delete::<ProfessorReview>(&review.id).await?;
        }
        self.repo().delete::<Professor>(&professor.id).await?;

        info!("Deleted professor {} and {} reviews", professor.id, reviews.len());
        Ok(reviews.len())
    }

    async fn reviews_of(&self, professor_id: &str) -> AppResult<Vec<ProfessorReview>> {
        self.repo()
            .find_all(&DocumentFilter::all().eq("professor_id", professor_id), 0, None)
            .await
    }

    pub async fn list_reviews(&self, professor_id: &str) -> AppResult<Vec<ProfessorReviewView>> {
        let reviews = self.reviews_of(professor_id).await?;
        Ok(reviews.iter().map(ProfessorReviewView::from).collect())
    }

    pub async fn professor_page(&self, professor_id: &str) -> AppResult<ProfessorPage> {
        let professor: Professor = self.repo().get(professor_id).await?;
        let current_courses = self.courses_titled(&professor.current_courses).await?;
        let past_courses = self.courses_titled(&professor.past_courses).await?;
        let reviews = self.list_reviews(&professor.id).await?;
        Ok(ProfessorPage {
            professor,
            current_courses,
            past_courses,
            reviews,
        })
    }

    async fn courses_titled(&self, titles: &[String]) -> AppResult<Vec<CourseView>> {
        let mut courses = Vec::new();
        for title in titles {
            let found: Vec<Course> = self
                .repo()
                .find_all(&DocumentFilter::all().eq("title", title.as_str()), 0, None)
                .await?;
            courses.extend(found.iter().map(CourseView::summary));
        }
        Ok(courses)
    }

    /// Store the review, then fold it into the professor's running ratings.
    /// If the professor cannot be saved the review is removed again.
    #[instrument(skip(self, vc, input), fields(request_id = %vc.request_id))]
    pub async fn add_review(
        &self,
        vc: &ViewerContext,
        professor_id: &str,
        input: NewProfessorReview,
    ) -> AppResult<ProfessorReviewView> {
        let author_id = vc.require_verified_member()?.to_string();
        let review = ProfessorReview::new(
            professor_id.to_string(),
            input.course_id,
            input.content,
            author_id,
            vc.display_name(),
            input.scores,
        )?;

        let mut professor: Professor = self.repo().get(professor_id).await?;
        self.repo().save(&review).await?;
        on_insert(&mut professor.ratings, &review);
        if let Err(err) = self.repo().save(&professor).await {
            if let Err(undo) = self.repo().delete::<ProfessorReview>(&review.id).await {
                warn!("Review {} left without ratings update: {}", review.id, undo);
            }
            return Err(err);
        }

        info!("Added review {} for professor {}", review.id, professor_id);
        Ok(ProfessorReviewView::from(&review))
    }

    pub async fn delete_review(&self, vc: &ViewerContext, review_id: &str) -> AppResult<()> {
        self.workflow.delete_professor_review(vc, review_id).await
    }

    pub async fn vote(
        &self,
        vc: &ViewerContext,
        review_id: &str,
        action: VoteAction,
    ) -> AppResult<VoteOutcome> {
        self.workflow
            .vote::<ProfessorReview>(vc, review_id, NodeRef::Root, action)
            .await
    }

    pub async fn report(
        &self,
        vc: &ViewerContext,
        review_id: &str,
        reason: &str,
    ) -> AppResult<ReportOutcome> {
        self.workflow
            .report::<ProfessorReview>(vc, review_id, NodeRef::Root, reason)
            .await
    }
}
