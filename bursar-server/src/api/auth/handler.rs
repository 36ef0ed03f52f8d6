//! 登录 / 登出 / 当前用户接口
//!
//! 登录失败一律收敛为 invalid_credentials，不向客户端区分原因。

use std::time::Duration;

use axum::{Extension, Json, extract::State};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::UserRepository;
use crate::security_log;
use shared::client::{LoginRequest, LoginResponse, UserInfo};
use shared::error::{AppError, AppResult, ErrorCode};

/// Every login attempt waits this long, whatever the outcome
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Check credentials against the stored argon2 hash and issue a JWT
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo.find_by_username(&req.username).await?;

    // 先睡满固定时长再看结果，响应耗时不暴露用户是否存在
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let user = match user {
        Some(u) => {
            if !u.is_active {
                return Err(AppError::with_message(
                    ErrorCode::PermissionDenied,
                    "Account has been disabled",
                ));
            }

            let password_valid = u
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password hash unreadable: {e}")))?;

            if !password_valid {
                security_log!(
                    "WARN",
                    "login_failed",
                    username = req.username.clone(),
                    reason = "invalid_credentials"
                );
                tracing::warn!(username = %req.username, reason = "bad_password", "Login rejected");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            security_log!(
                "WARN",
                "login_failed",
                username = req.username.clone(),
                reason = "user_not_found"
            );
            tracing::warn!(username = %req.username, reason = "unknown_user", "Login rejected");
            return Err(AppError::invalid_credentials());
        }
    };

    let jwt_service = state.get_jwt_service();
    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();

    let token = jwt_service
        .generate_token(&user_id, &user.username, user.role.as_str())
        .map_err(|e| AppError::internal(format!("Token signing failed: {e}")))?;

    tracing::info!(
        user_id = %user_id,
        username = %user.username,
        role = user.role.as_str(),
        "Login successful"
    );

    let response = LoginResponse {
        token,
        user: UserInfo {
            id: user_id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
        },
    };

    Ok(Json(response))
}

/// Stateless logout, only leaves a trace in the security log
pub async fn logout(Extension(user): Extension<CurrentUser>) -> AppResult<Json<()>> {
    security_log!(
        "INFO",
        "logout",
        user_id = user.id.clone(),
        username = user.username.clone()
    );
    tracing::info!(user_id = %user.id, username = %user.username, "User logged out");

    Ok(Json(()))
}

/// Current account info, re-read from the store so a freshly disabled
/// user is cut off right away instead of at token expiry
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<UserInfo>> {
    let repo = UserRepository::new(state.db.clone());
    let account = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    Ok(Json(UserInfo {
        id: user.id,
        username: account.username,
        display_name: account.display_name,
        role: account.role.as_str().to_string(),
        is_active: account.is_active,
    }))
}
