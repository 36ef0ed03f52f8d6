//! CurrentUser 提取器
//!
//! 绝大多数请求在 `require_auth` 中间件里就完成了验证，CurrentUser 已在
//! 请求 extensions 中，这里直接复用；对不经过该中间件挂载的路由则退回
//! 到自行解析 Bearer 令牌。

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use shared::error::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // 中间件已经放进 extensions 的直接取用
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let Some(header) = header else {
            security_log!("WARN", "auth_missing", uri = parts.uri.to_string());
            return Err(AppError::not_authenticated());
        };
        let token = JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

        let claims = state.get_jwt_service().validate_token(token).map_err(|e| {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = parts.uri.to_string(),
            );
            match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            }
        })?;

        let user = CurrentUser::from(claims);
        parts.extensions.insert(user.clone());

        Ok(user)
    }
}
