//! Payment Record API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{PaymentRecord, PaymentRecordCreate};
use crate::db::repository::PaymentRecordRepository;
use crate::ledger::{LedgerEntry, LedgerService, StudentLedgerSummary};
use shared::error::{AppError, AppResult};

/// Ledger view for one student, newest first
///
/// A student with no stored entries but a positive paid_amount gets one
/// synthesized initial entry; it is never persisted.
pub async fn list_by_student(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let ledger = LedgerService::new(state.db.clone());
    let entries = ledger.ledger_view(&id).await?;
    Ok(Json(entries))
}

/// Financial summary for one student
pub async fn student_stats(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<StudentLedgerSummary>> {
    let ledger = LedgerService::new(state.db.clone());
    let summary = ledger.student_summary(&id).await?;
    Ok(Json(summary))
}

/// Get a single stored payment record by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<PaymentRecord>> {
    let repo = PaymentRecordRepository::new(state.db.clone());
    let record = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::payment_record_not_found(&id))?;
    Ok(Json(record))
}

/// Record a payment against a student
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PaymentRecordCreate>,
) -> AppResult<Json<PaymentRecord>> {
    let ledger = LedgerService::new(state.db.clone());
    let record = ledger
        .record_payment(payload, &user.id, &user.username)
        .await?;
    Ok(Json(record))
}

/// Delete a payment record and roll its amount out of the aggregate
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let ledger = LedgerService::new(state.db.clone());
    ledger.delete_payment(&id).await?;
    Ok(Json(true))
}
