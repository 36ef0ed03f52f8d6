//! Student Model
//!
//! Financial fields follow the ledger invariant: `paid_amount` never exceeds
//! `total_amount`. Derived fields (`remaining_debt`, `payment_status`,
//! `payment_progress`) are computed on the way out, never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;
use crate::money;

/// Student ID type
pub type StudentId = RecordId;

/// Gender as recorded on the enrollment form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

/// Derived payment status of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Unpaid,
}

impl PaymentStatus {
    /// Compute the status from the stored aggregates
    ///
    /// `paid` takes precedence when both checks apply: a student with zero
    /// tuition owes nothing.
    pub fn from_amounts(total_amount: f64, paid_amount: f64) -> Self {
        if money::is_payment_sufficient(paid_amount, total_amount) {
            PaymentStatus::Paid
        } else if paid_amount == 0.0 {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Unpaid => "unpaid",
        }
    }
}

/// Student model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<StudentId>,
    /// Human-readable code `NN/NNN/NN` (region/sequence/year)
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub guardian_name: String,
    pub gender: Gender,
    /// Stored as "YYYY-MM-DD"
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    pub program: String,
    /// Academic year string "YYYY-YYYY"
    pub academic_year: String,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Create student payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentCreate {
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub guardian_name: String,
    pub gender: Gender,
    /// "YYYY-MM-DD", validated as strictly in the past
    pub date_of_birth: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    pub program: String,
    pub academic_year: String,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub paid_amount: f64,
}

/// Update student payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
}

// =============================================================================
// 出参类型，含派生财务字段
// =============================================================================

/// Student plus the derived financial fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentResponse {
    #[serde(flatten)]
    pub student: Student,
    pub remaining_debt: f64,
    pub payment_status: PaymentStatus,
    pub payment_progress: f64,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        let remaining_debt = money::remaining_debt(student.total_amount, student.paid_amount);
        let payment_status = PaymentStatus::from_amounts(student.total_amount, student.paid_amount);
        let payment_progress = money::payment_progress(student.total_amount, student.paid_amount);
        Self {
            student,
            remaining_debt,
            payment_status,
            payment_progress,
        }
    }
}
