//! Request intake.

use metrics::counter;
use serde::Serialize;

use super::OutpassWorkflow;
use crate::domain::request::{NewOutpassRequest, OutpassRequest, RequestSummary};
use crate::error::Result;
use crate::notify::messages;

/// A stored request together with its summary view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub record: OutpassRequest,
    #[serde(rename = "requestDetails")]
    pub summary: RequestSummary,
}

impl OutpassWorkflow {
    /// Create a Pending request and notify staff, student and parent.
    ///
    /// Validation runs before any write. The record is stored before any
    /// notification is attempted, and the notifications use the strict
    /// fan-out: if one fails this returns the error even though the record
    /// already exists. Callers must treat a failure here as "record may
    /// exist, notifications may be partial".
    #[tracing::instrument(skip(self, request))]
    pub async fn submit(&self, request: NewOutpassRequest) -> Result<Submission> {
        let new_record = request.validate()?;
        let record = self.store.insert(new_record).await?;
        counter!("outpass_requests_submitted_total").increment(1);
        tracing::info!(id = %record.id, "Outpass request created");

        let notifications = vec![
            messages::decision_request(&self.config.staff_email, &self.config.api_endpoint, &record),
            messages::student_acknowledgement(&record),
            messages::parent_acknowledgement(&record),
        ];

        if let Err(e) = self.dispatcher.dispatch_strict(notifications).await {
            tracing::error!(
                id = %record.id,
                error = %e,
                "Outpass request stored but intake notifications failed"
            );
            return Err(e);
        }

        let summary = record.summary();
        Ok(Submission { record, summary })
    }
}
