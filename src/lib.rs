//! Campus exit (outpass) approval workflow.
//!
//! A student submits a request, staff approve or reject it exactly once, and
//! an approval yields a signed, time-limited credential that is delivered to
//! the parent and checked at the exit point.
//!
//! Every operation goes through the [`OutpassWorkflow`], which coordinates
//! solely through a [`RecordStore`]. Concurrent deciders on the same request
//! are serialized by a status compare-and-swap in the store, so exactly one
//! decision commits and every other decider sees
//! [`OutpassError::AlreadyDecided`].
//!
//! Storage is PostgreSQL behind the `postgres` feature, with an in-memory
//! store for tests and embedding.

pub mod api;
pub mod config;
pub mod credential;
pub mod domain;
pub mod error;
pub mod notify;
pub mod storage;
pub mod workflow;

// Re-export commonly used types
pub use config::{Config, WorkflowConfig};
pub use credential::{CredentialIssuer, CredentialRenderer, MockRenderer, SignedLinkRenderer};
pub use domain::credential::Credential;
pub use domain::request::{Decision, NewOutpassRequest, OutpassRequest, OutpassStatus};
pub use error::{OutpassError, Result};
pub use notify::{
    FanOutPolicy, FanOutReport, MockTransport, Notification, NotificationDispatcher,
    NotificationTransport, ReqwestTransport,
};
pub use storage::{CasOutcome, InMemoryRecordStore, RecordStore};
pub use workflow::{Access, DecisionOutcome, DecisionRequest, OutpassWorkflow, Submission};

#[cfg(feature = "postgres")]
pub use storage::postgres::PostgresRecordStore;

/// Get the outpass database migrator
///
/// Returns a migrator that can be run against a connection pool.
#[cfg(feature = "postgres")]
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}
