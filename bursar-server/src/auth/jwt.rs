//! JWT 签发与校验
//!
//! Access token 为无状态 HS256，身份信息全部编码在 claims 中，
//! 服务端不保存会话。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
#[cfg(debug_assertions)]
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN_SECRET_LEN: usize = 32;

/// 令牌参数，全部可由 JWT_* 环境变量覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 签名密钥，最少 32 字节
    pub secret: String,
    /// 有效期 (分钟)
    pub expiration_minutes: i64,
    /// iss 声明
    pub issuer: String,
    /// aud 声明
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: resolve_secret(),
            expiration_minutes: env_i64("JWT_EXPIRATION_MINUTES", 24 * 60),
            issuer: env_or("JWT_ISSUER", "bursar-server"),
            audience: env_or("JWT_AUDIENCE", "bursar-clients"),
        }
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn env_i64(key: &str, fallback: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// 解析 JWT_SECRET
///
/// debug 构建缺失或过短时生成临时密钥并告警，release 构建直接终止。
fn resolve_secret() -> String {
    match std::env::var("JWT_SECRET") {
        Ok(secret) if secret.len() >= MIN_SECRET_LEN => secret,
        Ok(_) => temporary_secret("JWT_SECRET is shorter than 32 characters"),
        Err(_) => temporary_secret("JWT_SECRET is not set"),
    }
}

#[cfg(debug_assertions)]
fn temporary_secret(reason: &str) -> String {
    tracing::warn!("{reason}, generating a temporary development key");
    random_printable_secret()
}

#[cfg(not(debug_assertions))]
fn temporary_secret(reason: &str) -> String {
    panic!("JWT configuration error: {reason}");
}

/// 生成 64 字符的临时密钥 (仅开发环境)
#[cfg(debug_assertions)]
fn random_printable_secret() -> String {
    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    if rng.fill(&mut bytes).is_err() {
        // 随机源不可用时退回固定开发密钥
        return "bursar-development-only-fixed-secret-2024!!".to_string();
    }

    bytes
        .iter()
        .map(|b| CHARSET[(*b as usize) % CHARSET.len()] as char)
        .collect()
}

/// JWT 负载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户记录 id
    pub sub: String,
    /// 登录名
    pub username: String,
    /// admin / staff / student
    pub role: String,
    /// 固定为 "access"
    pub token_type: String,
    /// 过期时间 (Unix 秒)
    pub exp: i64,
    /// 签发时间 (Unix 秒)
    pub iat: i64,
    /// 签发方标识
    pub iss: String,
    /// 预期受众标识
    pub aud: String,
}

/// 令牌签发与校验错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// 令牌签发与校验入口
///
/// 编码/解码密钥在构造时从配置派生一次，之后只读共享。
#[derive(Debug, Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为登录成功的用户签发 access token
    pub fn generate_token(
        &self,
        user_id: &str,
        username: &str,
        role: &str,
    ) -> Result<String, JwtError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            token_type: "access".to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation
    }

    /// 校验签名、iss、aud、过期时间，返回解码后的 claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation()).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }

    /// 从 `Authorization: Bearer <token>` 头中取出令牌部分
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// 当前请求的已认证用户，由认证中间件写入请求扩展
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

impl CurrentUser {
    /// 是否管理员 (`role == "admin"`)
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// 是否职员或管理员
    ///
    /// 账务写操作要求此角色；student 角色只读
    pub fn is_staff(&self) -> bool {
        self.role == "admin" || self.role == "staff"
    }
}
