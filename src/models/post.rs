// Post and Comment documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::generate_id;
use crate::infrastructure::database::Document;
use crate::models::engagement::{Engageable, ModerationState};
use crate::moderation::comment_tree::CommentTree;

/// A discussion post. Owns its whole comment tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
    #[serde(flatten)]
    pub moderation: ModerationState,
    #[serde(default)]
    pub comments: CommentTree,
}

impl Post {
    pub fn new(title: String, content: String, author_id: String, author_name: String) -> Self {
        Self {
            id: generate_id(),
            title,
            content,
            author_id,
            author_name,
            created_at: Utc::now(),
            views: 0,
            moderation: ModerationState::default(),
            comments: CommentTree::default(),
        }
    }

    /// Increments the view counter and returns the new value.
    pub fn record_view(&mut self) -> u64 {
        self.views = self.views.saturating_add(1);
        self.views
    }
}

impl Document for Post {
    const COLLECTION: &'static str = "posts";
    const KIND: &'static str = "post";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Engageable for Post {
    fn node_kind(&self) -> &'static str {
        "post"
    }

    fn node_id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.author_id
    }

    fn moderation(&self) -> &ModerationState {
        &self.moderation
    }

    fn moderation_mut(&mut self) -> &mut ModerationState {
        &mut self.moderation
    }
}

/// A comment or reply. Nesting is structural: a reply lives in its parent's
/// `replies`; `parent_id` is metadata only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: String,
    /// Denormalized at creation time; only the bulk rename rewrites it.
    #[serde(default)]
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    #[serde(flatten)]
    pub moderation: ModerationState,
}

impl Comment {
    pub fn new(
        content: String,
        author_id: String,
        author_name: String,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            content,
            author_id,
            author_name,
            created_at: Utc::now(),
            parent_id,
            replies: Vec::new(),
            moderation: ModerationState::default(),
        }
    }

    /// Number of nodes in this comment's subtree, itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(Comment::subtree_len).sum::<usize>()
    }
}

impl Engageable for Comment {
    fn node_kind(&self) -> &'static str {
        "comment"
    }

    fn node_id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.author_id
    }

    fn moderation(&self) -> &ModerationState {
        &self.moderation
    }

    fn moderation_mut(&mut self) -> &mut ModerationState {
        &mut self.moderation
    }
}
