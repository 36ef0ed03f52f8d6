//! 认证接口的请求/响应 DTO
//!
//! 放在 shared 里，后续的前端或脚本客户端可以直接复用，保证两侧
//! 序列化结构一致。

use serde::{Deserialize, Serialize};

/// POST /api/auth/login 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// 面向客户端的账号信息，永不携带密码哈希
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
}
