// CommentTree - the reply tree embedded in a post
//
// The tree is an owned recursive structure: a reply lives inside its parent's
// `replies`, so a subtree is dropped with its root and cycles cannot be
// expressed. Every walk is pre-order by containment; `parent_id` is metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Comment;

/// Deepest level a reply may sit at. Each level costs two levels of JSON
/// nesting in the stored post, and the store's JSON reader stops at 128.
pub const MAX_REPLY_DEPTH: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentTree(Vec<Comment>);

impl CommentTree {
    /// Top-level comments in insertion order.
    pub fn roots(&self) -> &[Comment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.0.iter().map(Comment::subtree_len).sum()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![self.0.iter()],
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    /// First node with `id` in pre-order.
    pub fn locate(&self, id: &str) -> Option<&Comment> {
        self.iter().find(|c| c.id == id)
    }

    pub fn locate_mut(&mut self, id: &str) -> Option<&mut Comment> {
        find_mut(&mut self.0, id)
    }

    /// Like `locate_mut`, but absence is an error.
    pub fn get_mut(&mut self, id: &str) -> AppResult<&mut Comment> {
        self.locate_mut(id)
            .ok_or_else(|| AppError::NotFound("comment".to_string()))
    }

    /// Nesting level of the node with `id`; top-level comments are at depth 1.
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        depth_in(&self.0, id, 1)
    }

    /// Attach `comment` under `parent_id`, or at the top level when there is no parent.
    ///
    /// On error the tree is unchanged.
    pub fn insert_reply(&mut self, parent_id: Option<&str>, mut comment: Comment) -> AppResult<()> {
        if self.contains(&comment.id) {
            return Err(AppError::DuplicateId(comment.id));
        }

        match parent_id {
            Some(parent_id) => {
                let depth = self
                    .depth_of(parent_id)
                    .ok_or_else(|| AppError::ParentNotFound(parent_id.to_string()))?;
                if depth >= MAX_REPLY_DEPTH {
                    return Err(AppError::Validation(format!(
                        "replies cannot be nested more than {} levels deep",
                        MAX_REPLY_DEPTH
                    )));
                }
                let parent = self
                    .locate_mut(parent_id)
                    .ok_or_else(|| AppError::ParentNotFound(parent_id.to_string()))?;
                comment.parent_id = Some(parent.id.clone());
                parent.replies.push(comment);
            }
            None => {
                comment.parent_id = None;
                self.0.push(comment);
            }
        }
        Ok(())
    }

    /// Detach the node with `id` together with its whole reply subtree.
    pub fn remove(&mut self, id: &str) -> AppResult<Comment> {
        remove_from(&mut self.0, id).ok_or_else(|| AppError::NotFound("comment".to_string()))
    }

    /// Flagged nodes at any depth, pre-order.
    pub fn flagged(&self) -> Vec<&Comment> {
        self.iter().filter(|c| c.moderation.flagged).collect()
    }

    /// Rewrite the denormalized author name on every node written by `author_id`.
    /// Returns how many nodes changed.
    pub fn rename_author(&mut self, author_id: &str, author_name: &str) -> usize {
        rename_in(&mut self.0, author_id, author_name)
    }

    /// Read view of the whole tree. Only top-level comments appear at the top;
    /// replies are nested under their parent.
    pub fn render(&self) -> Vec<CommentView> {
        self.roots()
            .iter()
            .filter(|c| c.parent_id.is_none())
            .map(CommentView::from)
            .collect()
    }
}

fn depth_in(list: &[Comment], id: &str, depth: usize) -> Option<usize> {
    list.iter().find_map(|comment| {
        if comment.id == id {
            Some(depth)
        } else {
            depth_in(&comment.replies, id, depth + 1)
        }
    })
}

fn find_mut<'a>(list: &'a mut [Comment], id: &str) -> Option<&'a mut Comment> {
    for comment in list.iter_mut() {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn remove_from(list: &mut Vec<Comment>, id: &str) -> Option<Comment> {
    for index in 0..list.len() {
        if list[index].id == id {
            return Some(list.remove(index));
        }
        if let Some(removed) = remove_from(&mut list[index].replies, id) {
            return Some(removed);
        }
    }
    None
}

fn rename_in(list: &mut [Comment], author_id: &str, author_name: &str) -> usize {
    let mut changed = 0;
    for comment in list.iter_mut() {
        if comment.author_id == author_id && comment.author_name != author_name {
            comment.author_name = author_name.to_string();
            changed += 1;
        }
        changed += rename_in(&mut comment.replies, author_id, author_name);
    }
    changed
}

/// Pre-order iterator over every node in the tree.
pub struct Iter<'a> {
    stack: Vec<std::slice::Iter<'a, Comment>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Comment;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(comment) => {
                    self.stack.push(comment.replies.iter());
                    return Some(comment);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Public shape of a comment with its replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: Option<String>,
    pub likes_count: usize,
    pub flagged: bool,
    pub replies: Vec<CommentView>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.clone(),
            content: comment.content.clone(),
            author_id: comment.author_id.clone(),
            author_name: comment.author_name.clone(),
            created_at: comment.created_at,
            parent_id: comment.parent_id.clone(),
            likes_count: comment.moderation.likes_count(),
            flagged: comment.moderation.flagged,
            replies: comment.replies.iter().map(CommentView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VoterId;
    use crate::models::Post;
    use crate::moderation::reports::ReportLedger;

    fn comment(content: &str) -> Comment {
        Comment::new(content.to_string(), "u1".into(), "alice".into(), None)
    }

    /// c1 -> (c2 -> c3), c4
    fn sample() -> (CommentTree, Vec<String>) {
        let mut tree = CommentTree::default();
        let c1 = comment("one");
        let c2 = comment("two");
        let c3 = comment("three");
        let c4 = comment("four");
        let ids = vec![c1.id.clone(), c2.id.clone(), c3.id.clone(), c4.id.clone()];

        tree.insert_reply(None, c1).unwrap();
        tree.insert_reply(Some(ids[0].as_str()), c2).unwrap();
        tree.insert_reply(Some(ids[1].as_str()), c3).unwrap();
        tree.insert_reply(None, c4).unwrap();
        (tree, ids)
    }

    #[test]
    fn test_pre_order_walk() {
        let (tree, ids) = sample();
        let walked: Vec<&str> = tree.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(walked, ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn test_insert_sets_parent_id() {
        let (tree, ids) = sample();
        assert_eq!(tree.locate(&ids[2]).unwrap().parent_id.as_deref(), Some(ids[1].as_str()));
        assert!(tree.locate(&ids[3]).unwrap().parent_id.is_none());
    }

    #[test]
    fn test_missing_parent_is_a_no_op() {
        let (mut tree, _) = sample();
        let before = serde_json::to_value(&tree).unwrap();

        let err = tree.insert_reply(Some("nope"), comment("orphan")).unwrap_err();
        assert!(matches!(err, AppError::ParentNotFound(_)));
        assert_eq!(serde_json::to_value(&tree).unwrap(), before);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (mut tree, ids) = sample();
        let mut dup = comment("dup");
        dup.id = ids[2].clone();
        let err = tree.insert_reply(None, dup).unwrap_err();
        assert!(matches!(err, AppError::DuplicateId(_)));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_remove_drops_whole_subtree() {
        let (mut tree, ids) = sample();
        let removed = tree.remove(&ids[1]).unwrap();
        assert_eq!(removed.subtree_len(), 2);

        assert!(tree.locate(&ids[1]).is_none());
        assert!(tree.locate(&ids[2]).is_none());
        assert!(tree.locate(&ids[0]).unwrap().replies.is_empty());
        assert_eq!(tree.len(), 2);

        assert!(matches!(tree.remove(&ids[1]), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_mutation_leaves_siblings_untouched() {
        let (mut tree, ids) = sample();
        tree.get_mut(&ids[2]).unwrap().content = "edited".to_string();
        assert_eq!(tree.locate(&ids[2]).unwrap().content, "edited");
        assert_eq!(tree.locate(&ids[3]).unwrap().content, "four");
        assert_eq!(tree.locate(&ids[1]).unwrap().content, "two");
    }

    #[test]
    fn test_render_nests_replies_only_once() {
        let (tree, ids) = sample();
        let view = tree.render();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].id, ids[0]);
        assert_eq!(view[0].replies.len(), 1);
        assert_eq!(view[0].replies[0].replies[0].id, ids[2]);

        let json = serde_json::to_string(&view).unwrap();
        assert_eq!(json.matches(&ids[2]).count(), 1);
    }

    #[test]
    fn test_rename_author_reaches_every_depth() {
        let (mut tree, ids) = sample();
        tree.get_mut(&ids[3]).unwrap().author_id = "u2".to_string();
        assert_eq!(tree.rename_author("u1", "alicia"), 3);
        assert_eq!(tree.locate(&ids[2]).unwrap().author_name, "alicia");
        assert_eq!(tree.locate(&ids[3]).unwrap().author_name, "alice");
        assert_eq!(tree.rename_author("u1", "alicia"), 0);
    }

    #[test]
    fn test_post_comment_lifecycle() {
        let mut post = Post::new("P".into(), "body".into(), "author".into(), "alice".into());
        assert!(post.comments.is_empty());

        let c1 = comment("top");
        let c1_id = c1.id.clone();
        post.comments.insert_reply(None, c1).unwrap();

        let c2 = comment("reply");
        let c2_id = c2.id.clone();
        post.comments.insert_reply(Some(c1_id.as_str()), c2).unwrap();

        let ledger = ReportLedger::new(1);
        let node = post.comments.get_mut(&c2_id).unwrap();
        ledger.file(node, &VoterId::new("v"), "vic", "off topic").unwrap();
        assert!(post.comments.locate(&c2_id).unwrap().moderation.flagged);

        let view = post.comments.render();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, c1_id);
        assert_eq!(view[0].replies.len(), 1);
        assert_eq!(view[0].replies[0].id, c2_id);
        assert!(view[0].replies[0].flagged);
        assert_eq!(post.comments.flagged().len(), 1);

        post.comments.remove(&c1_id).unwrap();
        assert!(post.comments.locate(&c1_id).is_none());
        assert!(post.comments.locate(&c2_id).is_none());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_reply_depth_is_capped() {
        let mut tree = CommentTree::default();
        let mut parent: Option<String> = None;
        for _ in 0..MAX_REPLY_DEPTH {
            let c = comment("deeper");
            let id = c.id.clone();
            tree.insert_reply(parent.as_deref(), c).unwrap();
            parent = Some(id);
        }
        let deepest = parent.unwrap();
        assert_eq!(tree.depth_of(&deepest), Some(MAX_REPLY_DEPTH));

        let before = serde_json::to_value(&tree).unwrap();
        let err = tree.insert_reply(Some(deepest.as_str()), comment("too deep")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(serde_json::to_value(&tree).unwrap(), before);

        // The capped tree survives a trip through the stored JSON form.
        let text = serde_json::to_string(&tree).unwrap();
        let back: CommentTree = serde_json::from_str(&text).unwrap();
        assert_eq!(back.len(), MAX_REPLY_DEPTH);
    }
}
