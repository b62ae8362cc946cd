// Moderation Workflow - like, report, unflag and delete across every resource
//
// Each operation follows the same unit of work: load the owning document,
// locate the node, mutate it in memory, then save the whole owning document.
// Any error before the save leaves the store untouched.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::core::VoterId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Document, DocumentFilter, DocumentRepository};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::engagement::Engageable;
use crate::models::{Course, Post, Professor, ProfessorReview};
use crate::moderation::ratings::on_delete;
use crate::moderation::reports::ReportLedger;
use crate::moderation::votes::{toggle, VoteAction, VoteOutcome};

/// Address of an engageable node inside its owning document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    /// The document itself.
    Root,
    /// A node embedded in the document, by id.
    Nested(&'a str),
}

/// A stored document that owns one or more engageable nodes.
///
/// Saving the document is how a mutated node is persisted: a post rewrites its
/// whole comment tree, a course its inline reviews, a professor review itself.
pub trait Moderated: Document {
    /// Kind reported when a nested node is missing.
    const NESTED_KIND: &'static str;

    fn node_mut(&mut self, node: NodeRef<'_>) -> Option<&mut dyn Engageable>;
}

impl Moderated for Post {
    const NESTED_KIND: &'static str = "comment";

    fn node_mut(&mut self, node: NodeRef<'_>) -> Option<&mut dyn Engageable> {
        match node {
            NodeRef::Root => Some(self),
            NodeRef::Nested(id) => self
                .comments
                .locate_mut(id)
                .map(|c| c as &mut dyn Engageable),
        }
    }
}

impl Moderated for Course {
    const NESTED_KIND: &'static str = "course review";

    fn node_mut(&mut self, node: NodeRef<'_>) -> Option<&mut dyn Engageable> {
        match node {
            NodeRef::Root => None,
            NodeRef::Nested(id) => self.review_mut(id).map(|r| r as &mut dyn Engageable),
        }
    }
}

impl Moderated for ProfessorReview {
    const NESTED_KIND: &'static str = "professor review";

    fn node_mut(&mut self, node: NodeRef<'_>) -> Option<&mut dyn Engageable> {
        match node {
            NodeRef::Root => Some(self),
            NodeRef::Nested(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportOutcome {
    pub reports_count: usize,
    pub flagged: bool,
}

#[derive(Clone)]
pub struct ModerationWorkflow {
    repo: DocumentRepository,
    ledger: ReportLedger,
}

impl ModerationWorkflow {
    pub fn new(repo: DocumentRepository, ledger: ReportLedger) -> Self {
        Self { repo, ledger }
    }

    pub fn repository(&self) -> &DocumentRepository {
        &self.repo
    }

    /// Load, mutate one node, save the owning document.
    async fn mutate_node<D, T, F>(&self, doc_id: &str, node: NodeRef<'_>, mutate: F) -> AppResult<T>
    where
        D: Moderated,
        F: FnOnce(&mut dyn Engageable) -> AppResult<T> + Send,
    {
        let mut document: D = self.repo.get(doc_id).await?;
        let outcome = {
            let target = document.node_mut(node).ok_or_else(|| missing::<D>(node))?;
            mutate(target)?
        };
        self.repo.save(&document).await?;
        Ok(outcome)
    }

    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn vote<D: Moderated>(
        &self,
        vc: &ViewerContext,
        doc_id: &str,
        node: NodeRef<'_>,
        action: VoteAction,
    ) -> AppResult<VoteOutcome> {
        let voter = VoterId::new(vc.require_verified_member()?);

        self.mutate_node::<D, _, _>(doc_id, node, |target| toggle(target, &voter, action))
            .await
    }

    #[instrument(skip(self, vc, reason), fields(request_id = %vc.request_id))]
    pub async fn report<D: Moderated>(
        &self,
        vc: &ViewerContext,
        doc_id: &str,
        node: NodeRef<'_>,
        reason: &str,
    ) -> AppResult<ReportOutcome> {
        let voter = vc.voter()?;
        let voter_name = vc.display_name();
        let ledger = self.ledger;

        let outcome = self
            .mutate_node::<D, _, _>(doc_id, node, |target| {
                let reports_count = ledger.file(target, &voter, &voter_name, reason)?;
                Ok(ReportOutcome {
                    reports_count,
                    flagged: target.is_flagged(),
                })
            })
            .await?;

        if outcome.flagged {
            info!(reports = outcome.reports_count, "{} {} is flagged", D::KIND, doc_id);
        }
        Ok(outcome)
    }

    /// Admin reset: clears every report and the flag.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn unflag<D: Moderated>(
        &self,
        vc: &ViewerContext,
        doc_id: &str,
        node: NodeRef<'_>,
    ) -> AppResult<()> {
        vc.require_admin()?;
        let ledger = self.ledger;
        self.mutate_node::<D, _, _>(doc_id, node, |target| {
            ledger.clear(target);
            Ok(())
        })
        .await
    }

    /// Remove a comment and its whole reply subtree. Returns how many nodes were removed.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn delete_comment(
        &self,
        vc: &ViewerContext,
        post_id: &str,
        comment_id: &str,
    ) -> AppResult<usize> {
        let mut post: Post = self.repo.get(post_id).await?;
        let owner = post
            .comments
            .locate(comment_id)
            .map(|c| c.author_id.clone())
            .ok_or_else(|| AppError::NotFound("comment".to_string()))?;
        vc.require_owner_or_admin(&owner)?;

        let removed = post.comments.remove(comment_id)?;
        self.repo.save(&post).await?;

        let count = removed.subtree_len();
        info!("Deleted comment {} from post {} ({} nodes)", comment_id, post_id, count);
        Ok(count)
    }

    /// Remove an inline course review and recompute the course ratings in the same save.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn delete_course_review(
        &self,
        vc: &ViewerContext,
        course_id: &str,
        review_id: &str,
    ) -> AppResult<Course> {
        let mut course: Course = self.repo.get(course_id).await?;
        let owner = course
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .map(|r| r.author_id.clone())
            .ok_or_else(|| AppError::NotFound("course review".to_string()))?;
        vc.require_owner_or_admin(&owner)?;

        course
            .take_review(review_id)
            .ok_or_else(|| AppError::NotFound("course review".to_string()))?;
        on_delete(&mut course.ratings, &course.reviews);
        self.repo.save(&course).await?;

        info!("Deleted review {} from course {}", review_id, course_id);
        Ok(course)
    }

    /// Delete a standalone professor review, then recompute the professor's
    /// ratings from the reviews that remain. The review is restored when the
    /// recompute fails.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn delete_professor_review(&self, vc: &ViewerContext, review_id: &str) -> AppResult<()> {
        let review: ProfessorReview = self.repo.get(review_id).await?;
        vc.require_owner_or_admin(&review.author_id)?;

        self.repo.delete::<ProfessorReview>(review_id).await?;
        if let Err(err) = self.recompute_professor(&review.professor_id).await {
            if let Err(undo) = self.repo.save(&review).await {
                warn!("Review {} deleted but ratings not recomputed: {}", review_id, undo);
            }
            return Err(err);
        }

        info!("Deleted professor review {}", review_id);
        Ok(())
    }

    /// Rebuild a professor's ratings from scratch. A missing professor is skipped.
    pub async fn recompute_professor(&self, professor_id: &str) -> AppResult<Option<Professor>> {
        let Some(mut professor) = self.repo.find::<Professor>(professor_id).await? else {
            warn!("Professor {} no longer exists, skipping rating recompute", professor_id);
            return Ok(None);
        };

        let remaining: Vec<ProfessorReview> = self
            .repo
            .find_all(&DocumentFilter::all().eq("professor_id", professor_id), 0, None)
            .await?;
        on_delete(&mut professor.ratings, &remaining);
        self.repo.save(&professor).await?;
        Ok(Some(professor))
    }
}

fn missing<D: Moderated>(node: NodeRef<'_>) -> AppError {
    match node {
        NodeRef::Root => AppError::NotFound(D::KIND.to_string()),
        NodeRef::Nested(_) => AppError::NotFound(D::NESTED_KIND.to_string()),
    }
}
