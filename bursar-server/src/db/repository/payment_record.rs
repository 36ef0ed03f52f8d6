//! Payment Record Repository
//!
//! Ledger entries are append-only: create, read and delete, never update.
//! The student aggregate (`paid_amount`) is maintained by the ledger
//! service, not here.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::PaymentRecord;
use serde::Deserialize;
use shared::error::ErrorCode;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Debug, Deserialize)]
struct SumRow {
    total: f64,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: i64,
}

#[derive(Clone)]
pub struct PaymentRecordRepository {
    base: BaseRepository,
}

impl PaymentRecordRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a ledger entry
    pub async fn create(&self, data: PaymentRecord) -> RepoResult<PaymentRecord> {
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE payment_record SET
                    student_id       = $student_id,
                    amount           = $amount,
                    payment_date     = $payment_date,
                    description      = $description,
                    receipt_number   = $receipt_number,
                    recorded_by      = $recorded_by,
                    recorded_by_name = $recorded_by_name,
                    created_at       = $created_at
                RETURN AFTER"#,
            )
            .bind(("student_id", data.student_id))
            .bind(("amount", data.amount))
            .bind(("payment_date", data.payment_date))
            .bind(("description", data.description))
            .bind(("receipt_number", data.receipt_number))
            .bind(("recorded_by", data.recorded_by))
            .bind(("recorded_by_name", data.recorded_by_name))
            .bind(("created_at", data.created_at))
            .await?;

        let created: Option<PaymentRecord> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create payment record".to_string()))
    }

    /// All ledger entries across all students (global trend input)
    pub async fn find_all(&self) -> RepoResult<Vec<PaymentRecord>> {
        let records: Vec<PaymentRecord> = self
            .base
            .db()
            .query("SELECT * FROM payment_record ORDER BY payment_date ASC")
            .await?
            .take(0)?;
        Ok(records)
    }

    /// Find payment record by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<PaymentRecord>> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        let record: Option<PaymentRecord> = self.base.db().select(thing).await?;
        Ok(record)
    }

    /// All ledger entries for one student, newest payment date first
    pub async fn find_by_student(&self, student_id: &str) -> RepoResult<Vec<PaymentRecord>> {
        let records: Vec<PaymentRecord> = self
            .base
            .db()
            .query(
                "SELECT * FROM payment_record WHERE student_id = $student_id \
                 ORDER BY payment_date DESC, created_at DESC",
            )
            .bind(("student_id", student_id.to_string()))
            .await?
            .take(0)?;
        Ok(records)
    }

    /// Sum of all ledger entries for one student
    pub async fn sum_by_student(&self, student_id: &str) -> RepoResult<f64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT math::sum(amount) AS total FROM payment_record \
                 WHERE student_id = $student_id GROUP ALL",
            )
            .bind(("student_id", student_id.to_string()))
            .await?;
        let row: Option<SumRow> = result.take(0)?;
        Ok(row.map(|r| r.total).unwrap_or(0.0))
    }

    /// Number of ledger entries for one student
    pub async fn count_by_student(&self, student_id: &str) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS total FROM payment_record \
                 WHERE student_id = $student_id GROUP ALL",
            )
            .bind(("student_id", student_id.to_string()))
            .await?;
        let row: Option<CountRow> = result.take(0)?;
        Ok(row.map(|r| r.total).unwrap_or(0))
    }

    /// Hard delete a ledger entry
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        self.find_by_id(id).await?.ok_or_else(|| {
            RepoError::NotFound(
                ErrorCode::PaymentRecordNotFound,
                format!("Payment record {} not found", id),
            )
        })?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
