// Moderation and engagement over posts, nested comments and reviews.

pub mod comment_tree;
pub mod ratings;
pub mod reports;
pub mod votes;
pub mod workflow;

pub use comment_tree::{CommentTree, CommentView, MAX_REPLY_DEPTH};
pub use ratings::{on_delete, on_insert, RatedReview, RatingAggregate};
pub use reports::ReportLedger;
pub use votes::{VoteAction, VoteOutcome};
pub use workflow::{Moderated, ModerationWorkflow, NodeRef, ReportOutcome};
