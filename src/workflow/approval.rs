//! The approval state machine.
//!
//! `decide` runs these steps in order:
//!
//! 1. Validate `id` and `decision` (case-insensitive `approve` / `reject`).
//! 2. Read the current status; an absent record is `NotFound`.
//! 3. Reject a terminal status with `AlreadyDecided`. This read is only an
//!    early exit. It cannot guard against a concurrent decider.
//! 4. Write the new status with a compare-and-swap that requires the stored
//!    status to still be `Pending`. This write is the race guard.
//! 5. On approval, issue the credential. Issuance failure fails the call with
//!    `Internal` even though the status change is already durable.

use serde::Serialize;

use super::OutpassWorkflow;
use crate::domain::credential::Credential;
use crate::domain::request::{Decision, OutpassStatus, transition};
use crate::error::{OutpassError, Result};

/// Unvalidated decision input, as decoded from a request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionRequest {
    pub id: Option<String>,
    pub decision: Option<String>,
}

impl DecisionRequest {
    pub fn new(id: impl Into<String>, decision: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            decision: Some(decision.into()),
        }
    }

    /// Validate presence of both fields and normalize the decision.
    pub fn parse(self) -> Result<(String, Decision)> {
        let id = self.id.filter(|v| !v.trim().is_empty());
        let decision = self.decision.filter(|v| !v.trim().is_empty());

        match (id, decision) {
            (Some(id), Some(decision)) => Ok((id, Decision::parse(&decision)?)),
            _ => Err(OutpassError::ValidationError(
                "Missing parameters. Both id and decision are required.".to_string(),
            )),
        }
    }
}

/// Acknowledgement of an applied decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub id: String,
    pub decision: Decision,
    pub status: OutpassStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}

impl OutpassWorkflow {
    /// Validate raw input and apply the decision.
    pub async fn decide_request(&self, request: DecisionRequest) -> Result<DecisionOutcome> {
        let (id, decision) = request.parse()?;
        self.decide(&id, decision).await
    }

    /// Apply `decision` to the request `id`.
    #[tracing::instrument(skip(self, decision), fields(decision = decision.as_str()))]
    pub async fn decide(&self, id: &str, decision: Decision) -> Result<DecisionOutcome> {
        let current = self
            .store
            .get_status(id)
            .await?
            .ok_or_else(|| OutpassError::NotFound(id.to_string()))?;

        current.apply(decision)?;

        let status = transition(id, decision, self.store.as_ref()).await?;

        match decision {
            Decision::Reject => Ok(DecisionOutcome {
                id: id.to_string(),
                decision,
                status,
                message: "Outpass has been rejected.".to_string(),
                credential: None,
            }),
            Decision::Approve => {
                let credential = self.issue_after_approval(id).await.map_err(|e| {
                    tracing::error!(
                        id = %id,
                        error = %e,
                        "Status committed as Approved but credential issuance failed"
                    );
                    OutpassError::Internal(e.to_string())
                })?;

                Ok(DecisionOutcome {
                    id: id.to_string(),
                    decision,
                    status,
                    message: format!(
                        "Outpass has been approved successfully. The credential link will expire in {} hours.",
                        credential.validity_hours()
                    ),
                    credential: Some(credential),
                })
            }
        }
    }

    async fn issue_after_approval(&self, id: &str) -> Result<Credential> {
        let record = self
            .store
            .get_record(id)
            .await?
            .ok_or_else(|| OutpassError::Internal(format!("Record not found: {}", id)))?;
        self.issuer.issue(&record).await
    }
}
