//! 探活接口
//!
//! `/health` 与 `/health/detailed` 都是公共路由，负载均衡和运维探针
//! 不带令牌访问。detailed 版本额外汇报进程运行时长和嵌入式存储状态。

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;

use crate::core::ServerState;

/// 探针路由，不经过认证中间件
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// healthy | degraded
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    checks: Checks,
}

#[derive(Serialize)]
struct Checks {
    database: ComponentCheck,
}

/// 单个组件的探测结果
#[derive(Serialize)]
struct ComponentCheck {
    /// ok | error
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// 进程启动时调用一次，固定 uptime 起点
pub fn mark_started() {
    STARTED_AT.get_or_init(Instant::now);
}

fn uptime_seconds() -> u64 {
    STARTED_AT.get_or_init(Instant::now).elapsed().as_secs()
}

/// 探测嵌入式存储是否可查询
async fn probe_database(state: &ServerState) -> ComponentCheck {
    let started = Instant::now();
    match state.db.query("RETURN 1").await {
        Ok(_) => ComponentCheck {
            status: "ok",
            latency_ms: Some(started.elapsed().as_millis() as u64),
            message: None,
        },
        Err(e) => ComponentCheck {
            status: "error",
            latency_ms: None,
            message: Some(format!("Database error: {}", e)),
        },
    }
}

/// 轻量探针，仅确认进程在响应
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 含组件状态的详细健康检查
pub async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let database = probe_database(&state).await;
    let status = if database.status == "ok" {
        "healthy"
    } else {
        "degraded"
    };

    Json(DetailedHealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime_seconds(),
        checks: Checks { database },
    })
}
