//! 认证路由

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// 认证路由组
///
/// `/api/auth/login` 是唯一的公共 API 路由（`require_auth` 放行），
/// me / logout 走全局认证。
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/me", get(handler::me))
        .route("/api/auth/logout", post(handler::logout))
}
