//! In-process record store backed by a sharded concurrent map.
//!
//! Each entry is locked for the duration of a compare-and-swap, which gives
//! the same single-winner semantics as the conditional `UPDATE` in Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{CasOutcome, RecordStore};
use crate::domain::request::{NewRecord, OutpassRequest, OutpassStatus};
use crate::error::{OutpassError, Result};

/// Record store kept in memory. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<DashMap<String, OutpassRequest>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: NewRecord) -> Result<OutpassRequest> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(OutpassError::DuplicateRequest(record.id)),
            Entry::Vacant(slot) => {
                let stored = record.into_pending(Utc::now());
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn get_status(&self, id: &str) -> Result<Option<OutpassStatus>> {
        Ok(self.records.get(id).map(|r| r.status))
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OutpassStatus,
        new: OutpassStatus,
    ) -> Result<CasOutcome> {
        // get_mut holds the shard write lock until the guard drops
        let Some(mut record) = self.records.get_mut(id) else {
            return Ok(CasOutcome::Conflict(None));
        };

        if record.status != expected {
            return Ok(CasOutcome::Conflict(Some(record.status)));
        }

        record.status = new;
        record.decided_at = Some(Utc::now());
        Ok(CasOutcome::Applied)
    }

    async fn get_record(&self, id: &str) -> Result<Option<OutpassRequest>> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }
}
