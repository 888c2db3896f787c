//! Persistence seam for outpass records.
//!
//! This module defines the `RecordStore` trait. All coordination between
//! independently invoked operations goes through the store; the status
//! compare-and-swap is the only mutation of an existing record.

use async_trait::async_trait;

use crate::domain::request::{NewRecord, OutpassRequest, OutpassStatus};
use crate::error::Result;

mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryRecordStore;

/// Outcome of a conditional status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored status matched the expectation and was replaced.
    Applied,
    /// The stored status did not match. Carries the status observed by the
    /// store, or `None` if no record exists for the id.
    Conflict(Option<OutpassStatus>),
}

/// Durable keyed storage for outpass records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record with status `Pending`.
    ///
    /// # Errors
    /// Fails with `DuplicateRequest` if a record with the same id exists.
    async fn insert(&self, record: NewRecord) -> Result<OutpassRequest>;

    /// Current status of a record, or `None` if it does not exist.
    async fn get_status(&self, id: &str) -> Result<Option<OutpassStatus>>;

    /// Atomically replace the status with `new` only if it currently equals
    /// `expected`. Implementations must evaluate the precondition as part of
    /// the write itself, never as a separate read.
    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OutpassStatus,
        new: OutpassStatus,
    ) -> Result<CasOutcome>;

    /// Full record, or `None` if it does not exist.
    async fn get_record(&self, id: &str) -> Result<Option<OutpassRequest>>;
}
