//! 学生档案路由
//!
//! 读取对全部登录角色开放，增删改要求 staff 以上。

mod handler;

use axum::routing::{get, post, put};
use axum::{Router, middleware};

use crate::auth::require_staff;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/students", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_staff));

    read_routes.merge(manage_routes)
}
