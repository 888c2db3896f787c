//! Credential issuance for approved requests.
//!
//! Issuance renders the canonical payload through a [`CredentialRenderer`],
//! which returns a time-limited retrieval link, then notifies the parent on a
//! best-effort basis. Render failure is an [`OutpassError::IssuanceError`];
//! failure of the parent notice never is.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics::counter;

use crate::domain::credential::{Credential, payload_for};
use crate::domain::request::OutpassRequest;
use crate::error::{OutpassError, Result};
use crate::notify::{NotificationDispatcher, messages};

mod renderer;

pub use renderer::{MockRenderer, SignedLinkRenderer};

/// Renders a credential artifact and returns a retrieval link for it.
#[async_trait]
pub trait CredentialRenderer: Send + Sync {
    /// Render `payload` as `filename` and return a time-limited URL.
    async fn render(&self, payload: &str, filename: &str) -> Result<String>;
}

/// Synthesizes credentials for ids that were just approved.
#[derive(Clone)]
pub struct CredentialIssuer {
    renderer: Arc<dyn CredentialRenderer>,
    dispatcher: NotificationDispatcher,
    validity: Duration,
    signing_secret: String,
}

impl CredentialIssuer {
    pub fn new(
        renderer: Arc<dyn CredentialRenderer>,
        dispatcher: NotificationDispatcher,
        validity: Duration,
        signing_secret: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            dispatcher,
            validity,
            signing_secret: signing_secret.into(),
        }
    }

    /// Issue the credential for `record` and notify the parent.
    ///
    /// # Errors
    /// Returns `IssuanceError` if rendering or link creation fails. Parent
    /// notification failures are logged and never returned.
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    pub async fn issue(&self, record: &OutpassRequest) -> Result<Credential> {
        let payload = payload_for(&record.id);
        let filename = format!("{}.png", record.id);

        let retrieval_url = self
            .renderer
            .render(&payload, &filename)
            .await
            .map_err(|e| match e {
                OutpassError::IssuanceError(_) => e,
                other => OutpassError::IssuanceError(other.to_string()),
            })?;

        let credential = Credential::new(
            &record.id,
            retrieval_url,
            Utc::now(),
            self.validity,
            &self.signing_secret,
        )
        .map_err(|e| OutpassError::IssuanceError(e.to_string()))?;
        counter!("outpass_credentials_issued_total").increment(1);
        tracing::info!(id = %record.id, valid_until = %credential.valid_until, "Credential issued");

        if record.parent_mobile.trim().is_empty() {
            tracing::warn!(id = %record.id, "No parent mobile on record, skipping approval notice");
        } else {
            let report = self
                .dispatcher
                .dispatch_best_effort(vec![messages::approval_notice(record, &credential)])
                .await;
            if report.failed > 0 {
                tracing::warn!(id = %record.id, "Approval notice not delivered to parent");
            }
        }

        Ok(credential)
    }
}
