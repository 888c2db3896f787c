//! Read-only access checks.
//!
//! Only the current status is consulted. The credential's advertised validity
//! window is not enforced here.

use super::OutpassWorkflow;
use crate::domain::request::{OutpassRequest, OutpassStatus};
use crate::error::{OutpassError, Result};

/// Result of an exit-point check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

impl OutpassWorkflow {
    /// Granted iff the stored status is exactly `Approved`.
    ///
    /// Pending, rejected and unknown ids are all denied without distinction.
    #[tracing::instrument(skip(self))]
    pub async fn check_access(&self, id: &str) -> Result<Access> {
        let access = match self.store.get_status(id).await? {
            Some(OutpassStatus::Approved) => Access::Granted,
            _ => Access::Denied,
        };
        tracing::debug!(id = %id, access = ?access, "Access checked");
        Ok(access)
    }

    /// Fetch the full record for a roll number.
    pub async fn lookup(&self, roll_number: &str) -> Result<OutpassRequest> {
        if roll_number.trim().is_empty() {
            return Err(OutpassError::ValidationError(
                "Roll number is required".to_string(),
            ));
        }
        self.store
            .get_record(roll_number)
            .await?
            .ok_or_else(|| OutpassError::NotFound(roll_number.to_string()))
    }
}
