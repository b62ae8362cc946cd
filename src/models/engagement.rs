// Engagement - the likeable/reportable/flaggable capability shared by posts, comments and reviews

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::VoterId;

/// A single report filed against a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub user_id: VoterId,
    pub user_name: String,
    pub reason: String,
}

/// Moderation and engagement state embedded in every engageable node.
///
/// Serialized flat into the owning node, so a stored post carries `likes`,
/// `reports` and `flagged` next to its own fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationState {
    /// Unique voters; a voter appears at most once.
    #[serde(default)]
    pub likes: BTreeSet<VoterId>,
    /// Insertion order is report order.
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub flagged: bool,
}

impl ModerationState {
    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn has_reported(&self, voter: &VoterId) -> bool {
        self.reports.iter().any(|r| &r.user_id == voter)
    }
}

/// Any content node that can be liked and reported.
pub trait Engageable {
    /// Human-readable node kind used in error messages ("post", "comment", ...).
    fn node_kind(&self) -> &'static str;

    fn node_id(&self) -> &str;

    /// Identity of the user who authored the node.
    fn owner_id(&self) -> &str;

    fn moderation(&self) -> &ModerationState;

    fn moderation_mut(&mut self) -> &mut ModerationState;

    fn is_flagged(&self) -> bool {
        self.moderation().flagged
    }
}
