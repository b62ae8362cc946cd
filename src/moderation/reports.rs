// ReportLedger - per-node reports and the flagged transition
//
// Flagging is one-way and automatic once the threshold is reached; only an
// admin `clear` brings a node back to unflagged, and it drops every report.

use tracing::debug;

use crate::core::VoterId;
use crate::error::{AppError, AppResult};
use crate::models::engagement::{Engageable, Report};

#[derive(Debug, Clone, Copy)]
pub struct ReportLedger {
    threshold: usize,
}

impl Default for ReportLedger {
    fn default() -> Self {
        Self { threshold: 1 }
    }
}

impl ReportLedger {
    /// A threshold of 0 is treated as 1.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    /// File a report and return the resulting report count.
    pub fn file<N>(
        &self,
        node: &mut N,
        voter: &VoterId,
        voter_name: &str,
        reason: &str,
    ) -> AppResult<usize>
    where
        N: Engageable + ?Sized,
    {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("a report needs a reason".to_string()));
        }

        let kind = node.node_kind();
        let state = node.moderation_mut();
        if state.has_reported(voter) {
            return Err(AppError::DuplicateReport(kind.to_string()));
        }

        state.reports.push(Report {
            user_id: voter.clone(),
            user_name: voter_name.to_string(),
            reason: reason.to_string(),
        });

        let count = state.reports.len();
        if count >= self.threshold && !state.flagged {
            state.flagged = true;
            debug!(count, threshold = self.threshold, "{} flagged", kind);
        }
        Ok(count)
    }

    /// Admin unflag: drop every report and clear the flag, regardless of count.
    pub fn clear<N: Engageable + ?Sized>(&self, node: &mut N) {
        let state = node.moderation_mut();
        state.reports.clear();
        state.flagged = false;
    }
}
