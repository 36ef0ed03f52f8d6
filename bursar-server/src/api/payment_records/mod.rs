//! 缴费流水路由
//!
//! 读取端走 [`LedgerService`](crate::ledger::LedgerService)，空账本的
//! 学生会看到合成的 virtual 初始记录；写入端要求 staff 以上。

mod handler;

use axum::routing::{delete, get, post};
use axum::{Router, middleware};

use crate::auth::require_staff;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payment-records", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/student/{id}", get(handler::list_by_student))
        .route("/student/{id}/stats", get(handler::student_stats))
        .route("/{id}", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_staff));

    read_routes.merge(manage_routes)
}
