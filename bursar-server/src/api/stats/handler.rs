//! 财务统计接口

use axum::{Json, extract::State};
use chrono::Utc;

use crate::core::ServerState;
use crate::db::repository::{PaymentRecordRepository, StudentRepository};
use crate::stats::{self, GlobalStats};
use shared::error::AppResult;

/// Dashboard aggregation over every student
///
/// Computed from a full scan on each request. Runs concurrently with
/// payment mutations, so totals may trail an in-flight dual write by
/// one entry.
pub async fn global(State(state): State<ServerState>) -> AppResult<Json<GlobalStats>> {
    let students = StudentRepository::new(state.db.clone()).find_all().await?;
    let records = PaymentRecordRepository::new(state.db.clone())
        .find_all()
        .await?;

    let stats = stats::global_stats(
        &students,
        &records,
        Utc::now().date_naive(),
        shared::util::now_millis(),
    );
    Ok(Json(stats))
}
