// PostService - posts, their comment trees and engagement on both

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentFilter, DocumentRepository, PageRequest};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Comment, Post};
use crate::moderation::{CommentView, ModerationWorkflow, NodeRef, ReportOutcome, VoteAction, VoteOutcome};

/// Post without its comment tree, as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub views: u64,
    pub likes_count: usize,
    pub reports_count: usize,
    pub flagged: bool,
    pub comments_count: usize,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            author_id: post.author_id.clone(),
            author_name: post.author_name.clone(),
            created_at: post.created_at,
            views: post.views,
            likes_count: post.moderation.likes_count(),
            reports_count: post.moderation.reports.len(),
            flagged: post.moderation.flagged,
            comments_count: post.comments.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostSummary,
    pub comments: Vec<CommentView>,
}

#[derive(Clone)]
pub struct PostService {
    workflow: ModerationWorkflow,
}

impl PostService {
    pub fn new(workflow: ModerationWorkflow) -> Self {
        Self { workflow }
    }

    fn repo(&self) -> &DocumentRepository {
        self.workflow.repository()
    }

    pub async fn list_posts(&self, page: PageRequest) -> AppResult<Vec<PostSummary>> {
        let posts: Vec<Post> = self.repo().page(&DocumentFilter::all(), page).await?;
        Ok(posts.iter().map(PostSummary::from).collect())
    }

    #[instrument(skip(self, vc, content), fields(request_id = %vc.request_id))]
    pub async fn create_post(
        &self,
        vc: &ViewerContext,
        title: String,
        content: String,
    ) -> AppResult<PostSummary> {
        let author_id = vc.require_user()?.to_string();
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(AppError::Validation(
                "title and content cannot be empty".to_string(),
            ));
        }

        let post = Post::new(title, content, author_id, vc.display_name());
        self.repo().save(&post).await?;
        info!("Created post {}", post.id);
        Ok(PostSummary::from(&post))
    }

    pub async fn get_post(&self, post_id: &str) -> AppResult<PostDetail> {
        let post: Post = self.repo().get(post_id).await?;
        Ok(PostDetail {
            post: PostSummary::from(&post),
            comments: post.comments.render(),
        })
    }

    /// Deleting a post drops its whole comment tree with it.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn delete_post(&self, vc: &ViewerContext, post_id: &str) -> AppResult<()> {
        let post: Post = self.repo().get(post_id).await?;
        vc.require_owner_or_admin(&post.author_id)?;
        self.repo().delete::<Post>(post_id).await?;
        info!("Deleted post {} with {} comments", post_id, post.comments.len());
        Ok(())
    }

    pub async fn record_view(&self, post_id: &str) -> AppResult<u64> {
        let mut post: Post = self.repo().get(post_id).await?;
        let views = post.record_view();
        self.repo().save(&post).await?;
        Ok(views)
    }

    pub async fn list_comments(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let post: Post = self.repo().get(post_id).await?;
        Ok(post.comments.render())
    }

    /// Add a top-level comment, or a reply when `parent_id` is given.
    #[instrument(skip(self, vc, content), fields(request_id = %vc.request_id))]
    pub async fn add_comment(
        &self,
        vc: &ViewerContext,
        post_id: &str,
        content: String,
        parent_id: Option<String>,
    ) -> AppResult<CommentView> {
        let author_id = vc.require_user()?.to_string();
        if content.trim().is_empty() {
            return Err(AppError::Validation("comment cannot be empty".to_string()));
        }

        let mut post: Post = self.repo().get(post_id).await?;
        let comment = Comment::new(content, author_id, vc.display_name(), parent_id.clone());
        let view = CommentView::from(&comment);
        post.comments.insert_reply(parent_id.as_deref(), comment)?;
        self.repo().save(&post).await?;
        Ok(view)
    }

    pub async fn delete_comment(
        &self,
        vc: &ViewerContext,
        post_id: &str,
        comment_id: &str,
    ) -> AppResult<usize> {
        self.workflow.delete_comment(vc, post_id, comment_id).await
    }

    /// Like or unlike the post itself (`comment_id == None`) or one of its comments.
    pub async fn vote(
        &self,
        vc: &ViewerContext,
        post_id: &str,
        comment_id: Option<&str>,
        action: VoteAction,
    ) -> AppResult<VoteOutcome> {
        self.workflow
            .vote::<Post>(vc, post_id, node(comment_id), action)
            .await
    }

    pub async fn report(
        &self,
        vc: &ViewerContext,
        post_id: &str,
        comment_id: Option<&str>,
        reason: &str,
    ) -> AppResult<ReportOutcome> {
        self.workflow
            .report::<Post>(vc, post_id, node(comment_id), reason)
            .await
    }
}

fn node(comment_id: Option<&str>) -> NodeRef<'_> {
    match comment_id {
        Some(id) => NodeRef::Nested(id),
        None => NodeRef::Root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteEntityStore;
    use crate::moderation::ReportLedger;
    use std::sync::Arc;

    async fn service() -> PostService {
        let store = SqliteEntityStore::new_in_memory().await.unwrap();
        let repo = DocumentRepository::new(Arc::new(store));
        PostService::new(ModerationWorkflow::new(repo, ReportLedger::default()))
    }

    fn user(id: &str) -> ViewerContext {
        ViewerContext::authenticated_user(id.into(), Some(id.to_uppercase()), "req".into())
    }

    #[tokio::test]
    async fn test_post_and_comment_flow() {
        let svc = service().await;
        let post = svc.create_post(&user("alice"), "Hello".into(), "World".into()).await.unwrap();
        assert_eq!(post.author_name, "ALICE");

        let top = svc.add_comment(&user("bob"), &post.id, "first".into(), None).await.unwrap();
        let reply = svc
            .add_comment(&user("carol"), &post.id, "reply".into(), Some(top.id.clone()))
            .await
            .unwrap();
        assert_eq!(reply.parent_id.as_deref(), Some(top.id.as_str()));

        let err = svc
            .add_comment(&user("carol"), &post.id, "lost".into(), Some("ghost".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParentNotFound(_)));

        let detail = svc.get_post(&post.id).await.unwrap();
        assert_eq!(detail.post.comments_count, 2);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].replies[0].id, reply.id);
    }

    #[tokio::test]
    async fn test_views_are_monotonic() {
        let svc = service().await;
        let post = svc.create_post(&user("alice"), "t".into(), "c".into()).await.unwrap();
        assert_eq!(svc.record_view(&post.id).await.unwrap(), 1);
        assert_eq!(svc.record_view(&post.id).await.unwrap(), 2);
        assert_eq!(svc.get_post(&post.id).await.unwrap().post.views, 2);
    }

    #[tokio::test]
    async fn test_only_author_deletes_post() {
        let svc = service().await;
        let post = svc.create_post(&user("alice"), "t".into(), "c".into()).await.unwrap();
        assert!(svc.delete_post(&user("bob"), &post.id).await.is_err());
        svc.delete_post(&user("alice"), &post.id).await.unwrap();
        assert!(matches!(svc.get_post(&post.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_post_rejected() {
        let svc = service().await;
        let err = svc.create_post(&user("alice"), " ".into(), "c".into()).await.unwrap_err();
        assert_eq!(err.kind(), "validation_failed");
    }

    #[tokio::test]
    async fn test_deepest_reply_chain_stays_readable_and_deletable() {
        use crate::moderation::MAX_REPLY_DEPTH;

        let svc = service().await;
        let post = svc.create_post(&user("alice"), "deep".into(), "thread".into()).await.unwrap();
        let mut parent: Option<String> = None;
        for _ in 0..MAX_REPLY_DEPTH {
            let view = svc
                .add_comment(&user("bob"), &post.id, "again".into(), parent.clone())
                .await
                .unwrap();
            parent = Some(view.id);
        }

        let err = svc
            .add_comment(&user("bob"), &post.id, "one more".into(), parent.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let detail = svc.get_post(&post.id).await.unwrap();
        assert_eq!(detail.post.comments_count, MAX_REPLY_DEPTH);
        let body = serde_json::to_vec(&detail).unwrap();
        let reparsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(reparsed["comments_count"], MAX_REPLY_DEPTH);

        svc.delete_post(&user("alice"), &post.id).await.unwrap();
        assert!(matches!(svc.get_post(&post.id).await, Err(AppError::NotFound(_))));
    }
}
