//! Payment Record Model
//!
//! Append-only ledger entries. Records are only ever created or deleted,
//! never updated in place; corrections are delete + re-record.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Payment record ID type
pub type PaymentRecordId = RecordId;

/// Payment record matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<PaymentRecordId>,
    /// Owning student as "student:id" string
    pub student_id: String,
    pub amount: f64,
    /// Unix millis of the stated payment day (00:00 UTC)
    pub payment_date: i64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    /// Recording user as "user:id" string
    pub recorded_by: String,
    pub recorded_by_name: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Create payment record payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecordCreate {
    /// Owning student as "student:id" string
    pub student_id: String,
    pub amount: f64,
    /// "YYYY-MM-DD"; defaults to today (UTC) when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
}
