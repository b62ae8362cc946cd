// VoteSet - deduplicated voter identities per engageable node

use serde::{Deserialize, Serialize};

use crate::core::VoterId;
use crate::error::{AppError, AppResult};
use crate::models::engagement::Engageable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Like,
    Unlike,
}

/// Result of a vote; `likes_count` is taken after the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub action: VoteAction,
    pub likes_count: usize,
}

/// Apply a like or unlike for `voter`.
///
/// Liking twice fails with `AlreadyLiked`, unliking without a like fails with
/// `NotLiked`. The node is untouched on failure.
pub fn toggle<N>(node: &mut N, voter: &VoterId, action: VoteAction) -> AppResult<VoteOutcome>
where
    N: Engageable + ?Sized,
{
    let kind = node.node_kind();
    let likes = &mut node.moderation_mut().likes;

    match action {
        VoteAction::Like => {
            if !likes.insert(voter.clone()) {
                return Err(AppError::AlreadyLiked(kind.to_string()));
            }
        }
        VoteAction::Unlike => {
            if !likes.remove(voter) {
                return Err(AppError::NotLiked(kind.to_string()));
            }
        }
    }

    Ok(VoteOutcome {
        action,
        likes_count: likes.len(),
    })
}

pub fn like<N: Engageable + ?Sized>(node: &mut N, voter: &VoterId) -> AppResult<VoteOutcome> {
    toggle(node, voter, VoteAction::Like)
}

pub fn unlike<N: Engageable + ?Sized>(node: &mut N, voter: &VoterId) -> AppResult<VoteOutcome> {
    toggle(node, voter, VoteAction::Unlike)
}
