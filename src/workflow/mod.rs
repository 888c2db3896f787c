//! The outpass approval workflow.
//!
//! [`OutpassWorkflow`] ties the record store, the notification dispatcher and
//! the credential issuer together. It holds no per-request state: every
//! operation reads and writes through the store by id, so any number of
//! independent workflow instances can serve the same records.
//!
//! - [`intake`]: create a Pending record and fan out the initial notices
//! - [`approval`]: apply a decision with compare-and-swap, issue credentials
//! - [`access`]: read-only authorization checks and lookups

use std::sync::Arc;

use crate::config::WorkflowConfig;
use crate::credential::CredentialIssuer;
use crate::notify::NotificationDispatcher;
use crate::storage::RecordStore;

pub mod access;
pub mod approval;
pub mod intake;

pub use access::Access;
pub use approval::{DecisionOutcome, DecisionRequest};
pub use intake::Submission;

/// Entry point for every workflow operation.
#[derive(Clone)]
pub struct OutpassWorkflow {
    store: Arc<dyn RecordStore>,
    dispatcher: NotificationDispatcher,
    issuer: CredentialIssuer,
    config: WorkflowConfig,
}

impl OutpassWorkflow {
    pub fn new(
        store: Arc<dyn RecordStore>,
        dispatcher: NotificationDispatcher,
        issuer: CredentialIssuer,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            issuer,
            config,
        }
    }
}
