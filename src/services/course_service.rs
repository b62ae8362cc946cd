// CourseService - course catalog and inline course reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentFilter, DocumentRepository, PageRequest};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Course, CourseRatings, CourseReview};
use crate::moderation::{on_insert, ModerationWorkflow, NodeRef, ReportOutcome, VoteAction, VoteOutcome};

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisites: String,
    #[serde(default)]
    pub exclusions: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub professors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourseReview {
    pub content: String,
    pub difficulty: f64,
    pub usefulness: f64,
    pub workload: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseReviewView {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub difficulty: f64,
    pub usefulness: f64,
    pub workload: f64,
    pub created_at: DateTime<Utc>,
    pub likes_count: usize,
    pub flagged: bool,
}

impl From<&CourseReview> for CourseReviewView {
    fn from(review: &CourseReview) -> Self {
        Self {
            id: review.id.clone(),
            content: review.content.clone(),
            author_id: review.author_id.clone(),
            author_name: review.author_name.clone(),
            difficulty: review.difficulty,
            usefulness: review.usefulness,
            workload: review.workload,
            created_at: review.created_at,
            likes_count: review.moderation.likes_count(),
            flagged: review.moderation.flagged,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub prerequisites: String,
    pub exclusions: String,
    pub distribution: String,
    pub professors: Vec<String>,
    pub ratings: CourseRatings,
    pub created_at: DateTime<Utc>,
    /// Omitted in listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<CourseReviewView>>,
}

impl CourseView {
    pub(crate) fn summary(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            prerequisites: course.prerequisites.clone(),
            exclusions: course.exclusions.clone(),
            distribution: course.distribution.clone(),
            professors: course.professors.clone(),
            ratings: course.ratings.clone(),
            created_at: course.created_at,
            reviews: None,
        }
    }

    fn detail(course: &Course) -> Self {
        Self {
            reviews: Some(course.reviews.iter().map(CourseReviewView::from).collect()),
            ..Self::summary(course)
        }
    }
}

#[derive(Clone)]
pub struct CourseService {
    workflow: ModerationWorkflow,
}

impl CourseService {
    pub fn new(workflow: ModerationWorkflow) -> Self {
        Self { workflow }
    }

    fn repo(&self) -> &DocumentRepository {
        self.workflow.repository()
    }

    pub async fn list_courses(&self, page: PageRequest) -> AppResult<Vec<CourseView>> {
        let courses: Vec<Course> = self.repo().page(&DocumentFilter::all(), page).await?;
        Ok(courses.iter().map(CourseView::summary).collect())
    }

    pub async fn get_course(&self, course_id: &str) -> AppResult<CourseView> {
        let course: Course = self.repo().get(course_id).await?;
        Ok(CourseView::detail(&course))
    }

    #[instrument(skip(self, vc, input), fields(request_id = %vc.request_id))]
    pub async fn create_course(&self, vc: &ViewerContext, input: NewCourse) -> AppResult<CourseView> {
        vc.require_user()?;
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("course title cannot be empty".to_string()));
        }

        let mut course = Course::new(input.title, input.description);
        course.prerequisites = input.prerequisites;
        course.exclusions = input.exclusions;
        course.distribution = input.distribution;
        course.professors = input.professors;
        self.repo().save(&course).await?;

        info!("Created course {} ({})", course.id, course.title);
        Ok(CourseView::detail(&course))
    }

    /// Admin only. The inline reviews go with the course.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn delete_course(&self, vc: &ViewerContext, course_id: &str) -> AppResult<()> {
        vc.require_admin()?;
        self.repo().delete::<Course>(course_id).await?;
        info!("Deleted course {}", course_id);
        Ok(())
    }

    /// Submit a review and fold it into the course ratings in the same save.
    #[instrument(skip(self, vc, input), fields(request_id = %vc.request_id))]
    pub async fn add_review(
        &self,
        vc: &ViewerContext,
        course_id: &str,
        input: NewCourseReview,
    ) -> AppResult<CourseReviewView> {
        let author_id = vc.require_verified_member()?.to_string();
        // Validated before the course is touched
        let review = CourseReview::new(
            input.content,
            author_id,
            vc.display_name(),
            input.difficulty,
            input.usefulness,
            input.workload,
        )?;

        let mut course: Course = self.repo().get(course_id).await?;
        on_insert(&mut course.ratings, &review);
        let view = CourseReviewView::from(&review);
        course.reviews.push(review);
        self.repo().save(&course).await?;

        info!("Added review {} to course {}", view.id, course_id);
        Ok(view)
    }

    pub async fn delete_review(
        &self,
        vc: &ViewerContext,
        course_id: &str,
        review_id: &str,
    ) -> AppResult<CourseView> {
        let course = self
            .workflow
            .delete_course_review(vc, course_id, review_id)
            .await?;
        Ok(CourseView::detail(&course))
    }

    pub async fn vote(
        &self,
        vc: &ViewerContext,
        course_id: &str,
        review_id: &str,
        action: VoteAction,
    ) -> AppResult<VoteOutcome> {
        self.workflow
            .vote::<Course>(vc, course_id, NodeRef::Nested(review_id), action)
            .await
    }

    pub async fn report(
        &self,
        vc: &ViewerContext,
        course_id: &str,
        review_id: &str,
        reason: &str,
    ) -> AppResult<ReportOutcome> {
        self.workflow
            .report::<Course>(vc, course_id, NodeRef::Nested(review_id), reason)
            .await
    }
}
