//! State transitions for outpass requests.
//!
//! ```text
//! Pending ──approve──> Approved   (terminal)
//!    │
//!    └──────reject───> Rejected   (terminal)
//! ```
//!
//! Exactly one forward transition is ever applied to a record. The transition
//! is written as a single compare-and-swap against the store: the new status
//! is only stored if the stored status is still `Pending` at write time.
//! Concurrent deciders therefore race on the write itself, and every loser
//! observes [`OutpassError::AlreadyDecided`] carrying the winner's status.

use metrics::counter;

use crate::error::{OutpassError, Result};
use crate::storage::{CasOutcome, RecordStore};

use super::state::{Decision, OutpassStatus};

impl Decision {
    /// The terminal status this decision moves a pending request into.
    pub fn target_status(&self) -> OutpassStatus {
        match self {
            Decision::Approve => OutpassStatus::Approved,
            Decision::Reject => OutpassStatus::Rejected,
        }
    }
}

impl OutpassStatus {
    /// Pure transition rule: only `Pending` accepts a decision.
    pub fn apply(self, decision: Decision) -> Result<OutpassStatus> {
        match self {
            OutpassStatus::Pending => Ok(decision.target_status()),
            terminal => Err(OutpassError::AlreadyDecided(terminal)),
        }
    }
}

/// Apply `decision` to the record `id` with a compare-and-swap on its status.
///
/// Returns the new status when this call won the write. A lost race is
/// reported exactly like a request that was already decided before the read.
#[tracing::instrument(skip(store, decision), fields(decision = decision.as_str()))]
pub async fn transition<S: RecordStore + ?Sized>(
    id: &str,
    decision: Decision,
    store: &S,
) -> Result<OutpassStatus> {
    let target = OutpassStatus::Pending.apply(decision)?;

    match store
        .compare_and_set_status(id, OutpassStatus::Pending, target)
        .await?
    {
        CasOutcome::Applied => {
            counter!("outpass_decisions_total", "decision" => decision.as_str()).increment(1);
            tracing::info!(id = %id, status = %target, "Outpass request decided");
            Ok(target)
        }
        CasOutcome::Conflict(Some(current)) if current.is_terminal() => {
            counter!("outpass_decision_conflicts_total").increment(1);
            tracing::warn!(
                id = %id,
                current = %current,
                attempted = %target,
                "Decision lost the compare-and-swap"
            );
            Err(OutpassError::AlreadyDecided(current))
        }
        CasOutcome::Conflict(Some(current)) => Err(OutpassError::Internal(format!(
            "Compare-and-swap on {} failed while status is still {}",
            id, current
        ))),
        CasOutcome::Conflict(None) => Err(OutpassError::NotFound(id.to_string())),
    }
}
