//! PostgreSQL implementation of `RecordStore`.
//!
//! The status compare-and-swap is a single conditional `UPDATE`, so the
//! database row lock decides the winner between concurrent deciders that may
//! run in different processes.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use super::{CasOutcome, RecordStore};
use crate::domain::request::{NewRecord, OutpassRequest, OutpassStatus};
use crate::error::{OutpassError, Result};

/// PostgreSQL-backed record store.
///
/// # Example
/// ```ignore
/// use outpass::storage::postgres::PostgresRecordStore;
/// use sqlx::PgPool;
///
/// let pool = PgPool::connect("postgresql://localhost/outpass").await?;
/// outpass::migrator().run(&pool).await?;
/// let store = PostgresRecordStore::new(pool);
/// ```
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &PgRow) -> Result<OutpassRequest> {
    let status: String = row
        .try_get("status")
        .map_err(|e| OutpassError::Other(anyhow!("Failed to read status column: {}", e)))?;

    let read = |e: sqlx::Error| OutpassError::Other(anyhow!("Failed to read record row: {}", e));

    Ok(OutpassRequest {
        id: row.try_get("id").map_err(read)?,
        student_name: row.try_get("student_name").map_err(read)?,
        student_mobile: row.try_get("student_mobile").map_err(read)?,
        parent_mobile: row.try_get("parent_mobile").map_err(read)?,
        reason: row.try_get("reason").map_err(read)?,
        status: status.parse()?,
        created_at: row.try_get("created_at").map_err(read)?,
        decided_at: row.try_get("decided_at").map_err(read)?,
    })
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    async fn insert(&self, record: NewRecord) -> Result<OutpassRequest> {
        let row = sqlx::query(
            r#"
            INSERT INTO outpass_requests
                (id, student_name, student_mobile, parent_mobile, reason, status)
            VALUES ($1, $2, $3, $4, $5, 'Pending')
            ON CONFLICT (id) DO NOTHING
            RETURNING id, student_name, student_mobile, parent_mobile, reason,
                      status, created_at, decided_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.student_name)
        .bind(&record.student_mobile)
        .bind(&record.parent_mobile)
        .bind(&record.reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OutpassError::Other(anyhow!("Failed to insert outpass request: {}", e)))?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(OutpassError::DuplicateRequest(record.id)),
        }
    }

    async fn get_status(&self, id: &str) -> Result<Option<OutpassStatus>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM outpass_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| OutpassError::Other(anyhow!("Failed to read status: {}", e)))?;

        status.map(|s| s.parse::<OutpassStatus>()).transpose()
    }

    #[tracing::instrument(skip(self, expected, new), fields(expected = %expected, new = %new))]
    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: OutpassStatus,
        new: OutpassStatus,
    ) -> Result<CasOutcome> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE outpass_requests
            SET status = $3, decided_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(new.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| OutpassError::Other(anyhow!("Failed to update status: {}", e)))?
        .rows_affected();

        if rows_affected == 1 {
            return Ok(CasOutcome::Applied);
        }

        let current = self.get_status(id).await?;
        tracing::debug!(id = %id, current = ?current, "Conditional status update matched no row");
        Ok(CasOutcome::Conflict(current))
    }

    async fn get_record(&self, id: &str) -> Result<Option<OutpassRequest>> {
        let row = sqlx::query(
            r#"
            SELECT id, student_name, student_mobile, parent_mobile, reason,
                   status, created_at, decided_at
            FROM outpass_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OutpassError::Other(anyhow!("Failed to fetch record: {}", e)))?;

        row.as_ref().map(row_to_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(id: &str) -> NewRecord {
        NewRecord {
            id: id.to_string(),
            student_name: "A".to_string(),
            student_mobile: "+15550000001".to_string(),
            parent_mobile: "+15550000002".to_string(),
            reason: "home visit".to_string(),
        }
    }

    #[sqlx::test]
    async fn test_insert_and_lookup(pool: sqlx::PgPool) {
        let store = PostgresRecordStore::new(pool);

        let record = store.insert(new_record("R1")).await.unwrap();
        assert_eq!(record.status, OutpassStatus::Pending);
        assert!(record.decided_at.is_none());

        let fetched = store.get_record("R1").await.unwrap().unwrap();
        assert_eq!(fetched.student_name, "A");
        assert_eq!(store.get_record("missing").await.unwrap(), None);
    }

    #[sqlx::test]
    async fn test_duplicate_insert(pool: sqlx::PgPool) {
        let store = PostgresRecordStore::new(pool);
        store.insert(new_record("R1")).await.unwrap();

        let result = store.insert(new_record("R1")).await;
        assert!(matches!(result, Err(OutpassError::DuplicateRequest(_))));
    }

    #[sqlx::test]
    async fn test_conditional_update(pool: sqlx::PgPool) {
        let store = PostgresRecordStore::new(pool);
        store.insert(new_record("R1")).await.unwrap();

        let outcome = store
            .compare_and_set_status("R1", OutpassStatus::Pending, OutpassStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Applied);

        let outcome = store
            .compare_and_set_status("R1", OutpassStatus::Pending, OutpassStatus::Approved)
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Conflict(Some(OutpassStatus::Rejected)));

        let outcome = store
            .compare_and_set_status("R9", OutpassStatus::Pending, OutpassStatus::Approved)
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Conflict(None));

        let record = store.get_record("R1").await.unwrap().unwrap();
        assert_eq!(record.status, OutpassStatus::Rejected);
        assert!(record.decided_at.is_some());
    }

    #[sqlx::test]
    async fn test_racing_updates_single_winner(pool: sqlx::PgPool) {
        let store = PostgresRecordStore::new(pool);
        store.insert(new_record("R1")).await.unwrap();

        let (a, b) = tokio::join!(
            store.compare_and_set_status("R1", OutpassStatus::Pending, OutpassStatus::Approved),
            store.compare_and_set_status("R1", OutpassStatus::Pending, OutpassStatus::Rejected),
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        let applied = outcomes
            .iter()
            .filter(|o| **o == CasOutcome::Applied)
            .count();
        assert_eq!(applied, 1);
    }
}
