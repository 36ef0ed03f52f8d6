//! Ledger Reconciliation
//!
//! Mediates every operation that changes a student's `paid_amount` aggregate
//! and the payment ledger together. There is no transaction spanning the two
//! tables: the aggregate is moved first with a compare-and-set, the ledger
//! entry is written second, and a failed second write is logged and surfaced
//! rather than rolled back.
//!
//! # Write Flow
//!
//! ```text
//! record_payment(data)
//!     ├─ 1. Validate amount / description / receipt / date
//!     ├─ 2. Read student, check overpayment (reject, never clamp)
//!     ├─ 3. CAS paid_amount (bounded retries on concurrent change)
//!     └─ 4. Append ledger entry (failure logged, not rolled back)
//!
//! delete_payment(record_id)
//!     ├─ 1. Read record and owning student
//!     ├─ 2. CAS paid_amount - record.amount, clamped at zero
//!     └─ 3. Delete ledger entry
//! ```
//!
//! Students whose `paid_amount` predates ledger tracking have money but no
//! entries; [`LedgerService::ledger_view`] synthesizes a single read-only
//! virtual entry for that case instead of backfilling the table.

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    PaymentRecord, PaymentRecordCreate, PaymentStatus, Student, StudentCreate,
};
use crate::db::repository::{PaymentRecordRepository, StudentRepository};
use crate::money;
use crate::stats::{self, MonthlyPayment};
use crate::utils::time;
use crate::utils::validation;
use shared::error::{AppError, AppResult, ErrorCode};

/// Fixed id of the synthesized initial-payment entry. Never a real store id,
/// so the frontend can recognize the entry and disable deletion.
pub const VIRTUAL_RECORD_ID: &str = "virtual-initial-payment";

/// Receipt number stamped on initial payments, real and synthesized.
pub const INITIAL_RECEIPT_NUMBER: &str = "INITIAL";

/// Description stamped on initial payments, real and synthesized.
pub const INITIAL_PAYMENT_DESCRIPTION: &str = "initial payment";

/// Attribution of synthesized entries (no real user performed them).
pub const SYSTEM_USER_ID: &str = "user:system";
pub const SYSTEM_USER_NAME: &str = "System";

/// CAS 冲突重试上限 / Retry cap for compare-and-set conflicts
const MAX_CAS_RETRIES: usize = 3;

/// Ledger view entry (for frontend)
///
/// Same shape as a stored record, but the id is a plain string so the
/// synthesized entry can carry [`VIRTUAL_RECORD_ID`] instead of a store id.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: String,
    pub student_id: String,
    pub amount: f64,
    pub payment_date: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    pub recorded_by: String,
    pub recorded_by_name: String,
    pub created_at: i64,
}

impl From<PaymentRecord> for LedgerEntry {
    fn from(record: PaymentRecord) -> Self {
        Self {
            id: record
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            student_id: record.student_id,
            amount: record.amount,
            payment_date: record.payment_date,
            description: record.description,
            receipt_number: record.receipt_number,
            recorded_by: record.recorded_by,
            recorded_by_name: record.recorded_by_name,
            created_at: record.created_at,
        }
    }
}

/// Per-student financial summary (for frontend)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLedgerSummary {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub remaining_debt: f64,
    pub payment_status: PaymentStatus,
    pub payment_progress: f64,
    /// Number of real ledger entries
    pub record_count: i64,
    /// Sum of real ledger entries; differs from `paid_amount` for
    /// pre-ledger students and after a partial dual write
    pub records_total: f64,
    pub monthly_payments: Vec<MonthlyPayment>,
}

#[derive(Clone)]
pub struct LedgerService {
    students: StudentRepository,
    payments: PaymentRecordRepository,
}

impl LedgerService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            students: StudentRepository::new(db.clone()),
            payments: PaymentRecordRepository::new(db),
        }
    }

    /// Record a payment against a student
    ///
    /// Rejects any amount that would push `paid_amount` past `total_amount`;
    /// overpayment is never clamped. The aggregate moves before the entry is
    /// appended, so a crash between the two leaves `paid_amount` ahead of the
    /// ledger sum, which is the tolerated direction of drift.
    pub async fn record_payment(
        &self,
        data: PaymentRecordCreate,
        recorded_by: &str,
        recorded_by_name: &str,
    ) -> AppResult<PaymentRecord> {
        money::validate_payment_amount(data.amount)?;
        validation::validate_optional_text(
            &data.description,
            "description",
            validation::MAX_DESCRIPTION_LEN,
        )?;
        validation::validate_optional_text(
            &data.receipt_number,
            "receipt_number",
            validation::MAX_RECEIPT_LEN,
        )?;

        // 省略日期时记为提交时刻 / Omitted date means "now"
        let payment_date = match &data.payment_date {
            Some(raw) => time::day_start_millis(time::parse_date(raw)?),
            None => shared::util::now_millis(),
        };

        let mut student = self
            .students
            .find_by_id(&data.student_id)
            .await?
            .ok_or_else(|| AppError::student_not_found(&data.student_id))?;

        let mut attempt = 0;
        let updated = loop {
            if money::would_overpay(student.paid_amount, data.amount, student.total_amount) {
                let remaining = money::remaining_debt(student.total_amount, student.paid_amount);
                return Err(AppError::overpayment(data.amount, remaining));
            }
            let new_paid = money::add_payment(student.paid_amount, data.amount);
            match self
                .students
                .update_paid_amount_cas(&data.student_id, student.paid_amount, new_paid)
                .await?
            {
                Some(updated) => break updated,
                None => {
                    attempt += 1;
                    if attempt >= MAX_CAS_RETRIES {
                        return Err(AppError::database(format!(
                            "paid_amount for {} kept changing concurrently, giving up after {} attempts",
                            data.student_id, MAX_CAS_RETRIES
                        )));
                    }
                    tracing::debug!(
                        student_id = %data.student_id,
                        attempt = attempt,
                        "Concurrent paid_amount change, re-reading"
                    );
                    student = self
                        .students
                        .find_by_id(&data.student_id)
                        .await?
                        .ok_or_else(|| AppError::student_not_found(&data.student_id))?;
                }
            }
        };

        let student_ref = student_key(&updated, &data.student_id);
        let record = PaymentRecord {
            id: None,
            student_id: student_ref.clone(),
            amount: data.amount,
            payment_date,
            description: data.description.unwrap_or_default(),
            receipt_number: data.receipt_number,
            recorded_by: recorded_by.to_string(),
            recorded_by_name: recorded_by_name.to_string(),
            created_at: shared::util::now_millis(),
        };

        match self.payments.create(record).await {
            Ok(created) => {
                tracing::info!(
                    student_id = %student_ref,
                    amount = data.amount,
                    paid_amount = updated.paid_amount,
                    "Payment recorded"
                );
                Ok(created)
            }
            Err(e) => {
                // 聚合已更新，流水写入失败,不回滚 / Aggregate already moved,
                // the entry write failed and is not rolled back
                tracing::error!(
                    student_id = %student_ref,
                    amount = data.amount,
                    error = %e,
                    "Ledger entry write failed after aggregate update, ledger is behind"
                );
                Err(AppError::with_message(
                    ErrorCode::DatabaseError,
                    "Payment was applied to the student but the ledger entry could not be written",
                ))
            }
        }
    }

    /// Delete a payment record and decrement the owning student's aggregate
    ///
    /// The decrement is clamped at zero, unlike recording which rejects
    /// overflow. The student is updated first, then the entry is deleted.
    pub async fn delete_payment(&self, record_id: &str) -> AppResult<()> {
        let record = self
            .payments
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| AppError::payment_record_not_found(record_id))?;

        let mut student = self
            .students
            .find_by_id(&record.student_id)
            .await?
            .ok_or_else(|| AppError::student_not_found(&record.student_id))?;

        let mut attempt = 0;
        loop {
            let new_paid = money::subtract_payment(student.paid_amount, record.amount);
            match self
                .students
                .update_paid_amount_cas(&record.student_id, student.paid_amount, new_paid)
                .await?
            {
                Some(_) => break,
                None => {
                    attempt += 1;
                    if attempt >= MAX_CAS_RETRIES {
                        return Err(AppError::database(format!(
                            "paid_amount for {} kept changing concurrently, giving up after {} attempts",
                            record.student_id, MAX_CAS_RETRIES
                        )));
                    }
                    tracing::debug!(
                        student_id = %record.student_id,
                        attempt = attempt,
                        "Concurrent paid_amount change, re-reading"
                    );
                    student = self
                        .students
                        .find_by_id(&record.student_id)
                        .await?
                        .ok_or_else(|| AppError::student_not_found(&record.student_id))?;
                }
            }
        }

        if let Err(e) = self.payments.delete(record_id).await {
            tracing::error!(
                record_id = %record_id,
                student_id = %record.student_id,
                error = %e,
                "Ledger entry delete failed after aggregate update, ledger is ahead"
            );
            return Err(e.into());
        }

        tracing::info!(
            record_id = %record_id,
            student_id = %record.student_id,
            amount = record.amount,
            "Payment record deleted"
        );
        Ok(())
    }

    /// Create a student together with their initial payment entry
    ///
    /// The student write is authoritative: when the follow-up ledger write
    /// fails the enrollment still succeeds, and the missing entry is covered
    /// by the virtual record in [`LedgerService::ledger_view`].
    pub async fn enroll_student(
        &self,
        data: StudentCreate,
        recorded_by: &str,
        recorded_by_name: &str,
    ) -> AppResult<Student> {
        let student = self.students.create(data).await?;
        let student_ref = student_key(&student, "");

        if student.paid_amount > 0.0 {
            let record = PaymentRecord {
                id: None,
                student_id: student_ref.clone(),
                amount: student.paid_amount,
                payment_date: student.created_at,
                description: INITIAL_PAYMENT_DESCRIPTION.to_string(),
                receipt_number: Some(INITIAL_RECEIPT_NUMBER.to_string()),
                recorded_by: recorded_by.to_string(),
                recorded_by_name: recorded_by_name.to_string(),
                created_at: student.created_at,
            };
            if let Err(e) = self.payments.create(record).await {
                tracing::error!(
                    student_id = %student_ref,
                    amount = student.paid_amount,
                    error = %e,
                    "Initial payment ledger write failed, ledger view will synthesize it"
                );
            }
        }

        tracing::info!(
            student_id = %student_ref,
            student_code = %student.student_code,
            paid_amount = student.paid_amount,
            "Student enrolled"
        );
        Ok(student)
    }

    /// Delete a student
    ///
    /// Refused while ledger entries exist, otherwise the entries would be
    /// orphaned with no owning aggregate to reconcile against.
    pub async fn delete_student(&self, id: &str) -> AppResult<()> {
        let student = self
            .students
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::student_not_found(id))?;
        let student_ref = student_key(&student, id);

        let count = self.payments.count_by_student(&student_ref).await?;
        if count > 0 {
            return Err(AppError::with_message(
                ErrorCode::StudentHasPayments,
                format!(
                    "Student has {} payment records, delete those first",
                    count
                ),
            ));
        }

        self.students.delete(id).await?;
        tracing::info!(student_id = %student_ref, "Student deleted");
        Ok(())
    }

    /// Payment history for one student, newest first
    ///
    /// When no real entries exist but the student has money on the books,
    /// returns exactly one synthesized entry dated at the student's creation.
    /// Read-only: the synthesized entry is never written back. The result is
    /// either the real list or the single virtual entry, never both.
    pub async fn ledger_view(&self, student_id: &str) -> AppResult<Vec<LedgerEntry>> {
        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or_else(|| AppError::student_not_found(student_id))?;
        let student_ref = student_key(&student, student_id);

        let records = self.payments.find_by_student(&student_ref).await?;
        if records.is_empty() && student.paid_amount > 0.0 {
            return Ok(vec![LedgerEntry {
                id: VIRTUAL_RECORD_ID.to_string(),
                student_id: student_ref,
                amount: student.paid_amount,
                payment_date: student.created_at,
                description: INITIAL_PAYMENT_DESCRIPTION.to_string(),
                receipt_number: Some(INITIAL_RECEIPT_NUMBER.to_string()),
                recorded_by: SYSTEM_USER_ID.to_string(),
                recorded_by_name: SYSTEM_USER_NAME.to_string(),
                created_at: student.created_at,
            }]);
        }

        Ok(records.into_iter().map(LedgerEntry::from).collect())
    }

    /// Financial summary for one student
    ///
    /// `records_total` sums real entries only, so it sits beside
    /// `paid_amount` as the consistency check the two-table design needs.
    pub async fn student_summary(&self, student_id: &str) -> AppResult<StudentLedgerSummary> {
        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or_else(|| AppError::student_not_found(student_id))?;
        let student_ref = student_key(&student, student_id);

        let records = self.payments.find_by_student(&student_ref).await?;
        let records_total = self.payments.sum_by_student(&student_ref).await?;
        let monthly_payments = stats::monthly_payments(&records, shared::util::now_millis());

        // 账面与流水对不上只告警，修复交给人工。无流水的存量学生不算漂移。
        if !records.is_empty() && !money::money_eq(records_total, student.paid_amount) {
            tracing::warn!(
                student_id = %student_ref,
                paid_amount = student.paid_amount,
                records_total,
                "Ledger sum disagrees with stored aggregate"
            );
        }

        Ok(StudentLedgerSummary {
            total_amount: student.total_amount,
            paid_amount: student.paid_amount,
            remaining_debt: money::remaining_debt(student.total_amount, student.paid_amount),
            payment_status: PaymentStatus::from_amounts(student.total_amount, student.paid_amount),
            payment_progress: money::payment_progress(student.total_amount, student.paid_amount),
            record_count: records.len() as i64,
            records_total,
            monthly_payments,
        })
    }

    /// Direct access to the student store, for reads that bypass the ledger
    pub fn students(&self) -> &StudentRepository {
        &self.students
    }

    /// Direct access to the ledger store
    pub fn payments(&self) -> &PaymentRecordRepository {
        &self.payments
    }
}

/// Canonical "student:id" string for ledger references
fn student_key(student: &Student, fallback: &str) -> String {
    student
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| fallback.to_string())
}
