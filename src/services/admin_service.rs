// AdminService - flagged content review, unflagging and the bulk author rename

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::AppResult;
use crate::infrastructure::database::{DocumentFilter, DocumentRepository};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Course, Post, ProfessorReview};
use crate::moderation::{CommentView, ModerationWorkflow, NodeRef};
use crate::services::course_service::CourseReviewView;
use crate::services::post_service::PostSummary;
use crate::services::professor_service::ProfessorReviewView;

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedComment {
    pub post_id: String,
    pub post_title: String,
    pub comment: CommentView,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedCourseReview {
    pub course_id: String,
    pub course_title: String,
    pub review: CourseReviewView,
}

/// Counts of nodes whose author name was rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenameSummary {
    pub posts: usize,
    pub comments: usize,
    pub course_reviews: usize,
    pub professor_reviews: usize,
}

#[derive(Clone)]
pub struct AdminService {
    workflow: ModerationWorkflow,
}

impl AdminService {
    pub fn new(workflow: ModerationWorkflow) -> Self {
        Self { workflow }
    }

    fn repo(&self) -> &DocumentRepository {
        self.workflow.repository()
    }

    fn flagged() -> DocumentFilter {
        DocumentFilter::all().eq("flagged", true)
    }

    pub async fn flagged_posts(&self, vc: &ViewerContext) -> AppResult<Vec<PostSummary>> {
        vc.require_admin()?;
        let posts: Vec<Post> = self.repo().find_all(&Self::flagged(), 0, None).await?;
        Ok(posts.iter().map(PostSummary::from).collect())
    }

    /// Flagged comments at any depth, with the post that owns them.
    pub async fn flagged_comments(&self, vc: &ViewerContext) -> AppResult<Vec<FlaggedComment>> {
        vc.require_admin()?;
        let posts: Vec<Post> = self.repo().find_all(&DocumentFilter::all(), 0, None).await?;

        let mut flagged = Vec::new();
        for post in &posts {
            for comment in post.comments.flagged() {
                flagged.push(FlaggedComment {
                    post_id: post.id.clone(),
                    post_title: post.title.clone(),
                    comment: CommentView::from(comment),
                });
            }
        }
        Ok(flagged)
    }

    pub async fn flagged_course_reviews(&self, vc: &ViewerContext) -> AppResult<Vec<FlaggedCourseReview>> {
        vc.require_admin()?;
        let courses: Vec<Course> = self.repo().find_all(&DocumentFilter::all(), 0, None).await?;

        Ok(courses
            .iter()
            .flat_map(|course| {
                course
                    .reviews
                    .iter()
                    .filter(|r| r.moderation.flagged)
                    .map(move |review| FlaggedCourseReview {
                        course_id: course.id.clone(),
                        course_title: course.title.clone(),
                        review: CourseReviewView::from(review),
                    })
            })
            .collect())
    }

    pub async fn flagged_professor_reviews(&self, vc: &ViewerContext) -> AppResult<Vec<ProfessorReviewView>> {
        vc.require_admin()?;
        let reviews: Vec<ProfessorReview> = self.repo().find_all(&Self::flagged(), 0, None).await?;
        Ok(reviews.iter().map(ProfessorReviewView::from).collect())
    }

    pub async fn unflag_post(&self, vc: &ViewerContext, post_id: &str) -> AppResult<()> {
        self.workflow.unflag::<Post>(vc, post_id, NodeRef::Root).await
    }

    pub async fn unflag_comment(&self, vc: &ViewerContext, post_id: &str, comment_id: &str) -> AppResult<()> {
        self.workflow
            .unflag::<Post>(vc, post_id, NodeRef::Nested(comment_id))
            .await
    }

    pub async fn unflag_course_review(&self, vc: &ViewerContext, course_id: &str, review_id: &str) -> AppResult<()> {
        self.workflow
            .unflag::<Course>(vc, course_id, NodeRef::Nested(review_id))
            .await
    }

    pub async fn unflag_professor_review(&self, vc: &ViewerContext, review_id: &str) -> AppResult<()> {
        self.workflow
            .unflag::<ProfessorReview>(vc, review_id, NodeRef::Root)
            .await
    }

    /// Rewrite the denormalized author name on everything `user_id` wrote.
    ///
    /// This is the only path by which a username change reaches stored content.
    /// Documents without a match are not rewritten.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn rename_author(
        &self,
        vc: &ViewerContext,
        user_id: &str,
        new_name: &str,
    ) -> AppResult<RenameSummary> {
        vc.require_admin()?;
        let mut summary = RenameSummary::default();

        let posts: Vec<Post> = self.repo().find_all(&DocumentFilter::all(), 0, None).await?;
        for mut post in posts {
            let mut changed = post.comments.rename_author(user_id, new_name);
            summary.comments += changed;
            if post.author_id == user_id && post.author_name != new_name {
                post.author_name = new_name.to_string();
                summary.posts += 1;
                changed += 1;
            }
            if changed > 0 {
                self.repo().save(&post).await?;
            }
        }

        let courses: Vec<Course> = self.repo().find_all(&DocumentFilter::all(), 0, None).await?;
        for mut course in courses {
            let mut changed = 0;
            for review in course.reviews.iter_mut() {
                if review.author_id == user_id && review.author_name != new_name {
                    review.author_name = new_name.to_string();
                    changed += 1;
                }
            }
            if changed > 0 {
                summary.course_reviews += changed;
                self.repo().save(&course).await?;
            }
        }

        let reviews: Vec<ProfessorReview> = self
            .repo()
            .find_all(&DocumentFilter::all().eq("author_id", user_id), 0, None)
            .await?;
        for mut review in reviews {
            if review.author_name != new_name {
                review.author_name = new_name.to_string();
                self.repo().save(&review).await?;
                summary.professor_reviews += 1;
            }
        }

        info!(?summary, "Renamed author {}", user_id);
        Ok(summary)
    }
}
