//! HTTP 服务
//!
//! 路由在 [`HttpService::initialize`] 时构建一次并缓存，之后既可以
//! 绑定端口对外服务，也可以通过 [`HttpService::oneshot`] 在进程内
//! 走完整的中间件栈（集成测试用）。

use crate::auth::require_auth;
use crate::core::{Config, ServerState};
use axum::{Router, middleware};
use shared::error::AppError;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower::Service;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

pub type OneshotResult =
    Result<http::Response<axum::body::Body>, Box<dyn std::error::Error + Send + Sync>>;

/// 访问日志中间件，记录方法、URI、状态码与耗时
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        target: "http_access",
        "{} {} {} {}ms",
        method,
        uri,
        response.status(),
        started.elapsed().as_millis()
    );

    response
}

/// 汇总全部业务路由（不带 state）
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        // 认证与探活
        .merge(crate::api::auth::router())
        .merge(crate::api::health::router())
        // 档案与财务
        .merge(crate::api::students::router())
        .merge(crate::api::payment_records::router())
        .merge(crate::api::stats::router())
        .merge(crate::api::users::router())
}

#[derive(Clone, Debug)]
pub struct HttpService {
    config: Config,
    router: Arc<RwLock<Option<Router>>>,
}

impl HttpService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            router: Arc::new(RwLock::new(None)),
        }
    }

    /// 注入 state 并构建最终路由
    ///
    /// ServerState 持有 HttpService，而路由又需要 state，因此路由
    /// 只能在 state 完全建好之后补建，调用顺序由 [`ServerState::initialize`]
    /// 保证。
    pub fn initialize(&self, state: ServerState) {
        let app = build_app()
            // 认证在 state 层，require_auth 自行放行公共路由
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
            // 出站层：CORS、压缩、访问日志
            .layer(CorsLayer::permissive())
            .layer(CompressionLayer::new())
            .layer(middleware::from_fn(log_request));

        *self.router.write().expect("router lock poisoned") = Some(app);
    }

    fn router(&self) -> Option<Router> {
        self.router.read().expect("router lock poisoned").clone()
    }

    /// 进程内驱动一次请求，走与真实端口完全相同的中间件栈
    pub async fn oneshot(&self, request: http::Request<axum::body::Body>) -> OneshotResult {
        let Some(mut router) = self.router() else {
            return Err(AppError::internal("HTTP service not initialized").into());
        };

        match router.call(request).await {
            Ok(response) => Ok(response),
            Err(infallible) => match infallible {},
        }
    }

    /// 绑定端口对外服务，直到 shutdown_signal 触发并完成 graceful drain
    pub async fn start_server<F>(&self, shutdown_signal: F) -> Result<(), AppError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = self
            .router()
            .ok_or_else(|| AppError::internal("HTTP service started before initialize"))?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let handle = axum_server::Handle::new();

        // 收到关停信号后进入 graceful drain，超时则强制断开
        let drain = std::time::Duration::from_millis(self.config.shutdown_timeout_ms);
        let watcher = handle.clone();
        tokio::spawn(async move {
            shutdown_signal.await;
            watcher.graceful_shutdown(Some(drain));
        });

        tracing::info!(%addr, "HTTP server listening");

        axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;

        Ok(())
    }
}
