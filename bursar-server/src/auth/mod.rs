//! 认证与授权
//!
//! [`JwtService`] 负责签发与校验，[`require_auth`] 在路由层拦截未
//! 认证请求并把 [`CurrentUser`] 写进请求扩展，[`require_staff`] 和
//! [`require_admin`] 在其上做角色收紧。

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth, require_staff};
