//! 认证与角色中间件
//!
//! `require_auth` 全局挂载；`require_staff` / `require_admin` 按路由组挂载。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use shared::error::{AppError, ErrorCode};

/// 预检、非 API 路径和登录接口不做认证
fn skips_auth(req: &Request) -> bool {
    req.method() == http::Method::OPTIONS
        || !req.uri().path().starts_with("/api/")
        || req.uri().path() == "/api/auth/login"
}

/// 认证中间件，要求 `/api/*` 请求携带有效的 Bearer JWT
///
/// 验证通过后将 [`CurrentUser`] 注入请求 extensions，下游 handler 和
/// 角色中间件直接取用。失败分三种：无 Authorization 头 (1001)、令牌
/// 过期 (1003)、令牌无效 (1004)，都映射 401。
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if skips_auth(&req) {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let Some(header) = header else {
        security_log!("WARN", "auth_missing", uri = req.uri().to_string());
        return Err(AppError::not_authenticated());
    };
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let claims = state.get_jwt_service().validate_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.to_string(),
            uri = req.uri().to_string(),
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    req.extensions_mut().insert(CurrentUser::from(claims));

    Ok(next.run(req).await)
}

/// 职员中间件 - 要求 staff 或 admin 角色
///
/// 账务写接口（登记缴费、删除流水、学生增删改）挂载此中间件，
/// student 角色只能访问读接口。角色不足返回 403。
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_authenticated)?;
    if !user.is_staff() {
        security_log!(
            "WARN",
            "staff_required",
            user_id = user.id.clone(),
            username = user.username.clone(),
            user_role = user.role.clone()
        );
        return Err(AppError::with_message(
            ErrorCode::RoleRequired,
            "Staff role required",
        ));
    }

    Ok(next.run(req).await)
}

/// 管理员中间件 - 账号管理接口仅限 admin，其余角色返回 403
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_authenticated)?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.clone(),
            username = user.username.clone(),
            user_role = user.role.clone()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}
